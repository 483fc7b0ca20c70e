//! Textual type names as used by custom attribute blobs.
//!
//! Enum arguments of custom attributes do not reference their type through a coded index but
//! through its reflection name, for example
//! `System.Collections.Generic.Dictionary`2+Enumerator[], mscorlib, Version=4.0.0.0`.
//! [`TypeNameLexer`] splits such a string into terminals and [`TypeName::parse`] builds the
//! structured form, which formats back to the same text.

use std::{fmt, iter::Peekable, str::CharIndices};

use crate::Result;

const RESERVED_CHARS: &[char] = &['*', '+', '=', '.', ',', '&', '[', ']', '…'];

/// Terminal symbols of the type name syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeNameTerminal {
    /// End of input
    Eof,
    /// Any run of non reserved characters that is not purely numeric
    Identifier,
    /// A run of decimal digits
    Number,
    /// `*`
    Star,
    /// `+`
    Plus,
    /// `=`
    Equals,
    /// `.`
    Dot,
    /// `..`
    DoubleDot,
    /// `,`
    Comma,
    /// `&`
    Ampersand,
    /// `[`
    OpenBracket,
    /// `]`
    CloseBracket,
    /// `…`
    Ellipsis,
}

/// One lexed terminal with its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNameToken {
    /// Kind of the terminal
    pub terminal: TypeNameTerminal,
    /// The characters it was lexed from
    pub text: String,
}

/// Lexer for type name strings, with one token of lookahead.
pub struct TypeNameLexer<'a> {
    chars: Peekable<CharIndices<'a>>,
    buffered: Option<TypeNameToken>,
}

impl<'a> TypeNameLexer<'a> {
    /// Create a lexer over `input`.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        TypeNameLexer {
            chars: input.char_indices().peekable(),
            buffered: None,
        }
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self) -> &TypeNameToken {
        let token = match self.buffered.take() {
            Some(token) => token,
            None => self.read_next_token(),
        };
        self.buffered.insert(token)
    }

    /// Consume the next token. Returns an [`TypeNameTerminal::Eof`] token at the end.
    pub fn next_token(&mut self) -> TypeNameToken {
        match self.buffered.take() {
            Some(token) => token,
            None => self.read_next_token(),
        }
    }

    fn read_next_token(&mut self) -> TypeNameToken {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}

        let Some(&(_, current)) = self.chars.peek() else {
            return TypeNameToken {
                terminal: TypeNameTerminal::Eof,
                text: String::new(),
            };
        };

        let terminal = match current {
            '*' => TypeNameTerminal::Star,
            '+' => TypeNameTerminal::Plus,
            '=' => TypeNameTerminal::Equals,
            ',' => TypeNameTerminal::Comma,
            '&' => TypeNameTerminal::Ampersand,
            '[' => TypeNameTerminal::OpenBracket,
            ']' => TypeNameTerminal::CloseBracket,
            '…' => TypeNameTerminal::Ellipsis,
            '.' => return self.read_dot_token(),
            _ => return self.read_word_token(),
        };

        self.chars.next();
        TypeNameToken {
            terminal,
            text: current.to_string(),
        }
    }

    fn read_dot_token(&mut self) -> TypeNameToken {
        self.chars.next();
        if self.chars.next_if(|(_, c)| *c == '.').is_some() {
            return TypeNameToken {
                terminal: TypeNameTerminal::DoubleDot,
                text: "..".to_string(),
            };
        }

        TypeNameToken {
            terminal: TypeNameTerminal::Dot,
            text: ".".to_string(),
        }
    }

    fn read_word_token(&mut self) -> TypeNameToken {
        let mut text = String::new();
        while let Some((_, c)) = self
            .chars
            .next_if(|(_, c)| !c.is_whitespace() && !RESERVED_CHARS.contains(c))
        {
            text.push(c);
        }

        let terminal = if text.chars().all(|c| c.is_ascii_digit()) {
            TypeNameTerminal::Number
        } else {
            TypeNameTerminal::Identifier
        };
        TypeNameToken { terminal, text }
    }
}

/// A type constructor applied after the element name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeNameSuffix {
    /// `*`
    Pointer,
    /// `&`
    ByRef,
    /// `[]`
    SzArray,
    /// `[,]` and friends, with the rank
    Array(u32),
}

/// An assembly reference in an assembly qualified type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyName {
    /// Simple name of the assembly
    pub name: String,
    /// `Key=Value` properties such as `Version` or `PublicKeyToken`, in source order
    pub properties: Vec<(String, String)>,
}

/// A parsed reflection type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    /// Namespace, if the top level type has one
    pub namespace: Option<String>,
    /// Name of the top level type
    pub name: String,
    /// Names of nested types, outermost first
    pub nested: Vec<String>,
    /// Pointer, by-ref and array constructors, in application order
    pub suffixes: Vec<TypeNameSuffix>,
    /// The defining assembly, when the name is assembly qualified
    pub assembly: Option<AssemblyName>,
}

impl TypeName {
    /// Parse a type name string.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the string does not follow the type name syntax.
    pub fn parse(input: &str) -> Result<TypeName> {
        let mut lexer = TypeNameLexer::new(input);
        let type_name = Self::parse_type_name(&mut lexer)?;

        let trailing = lexer.next_token();
        if trailing.terminal != TypeNameTerminal::Eof {
            return Err(malformed_error!(
                "Unexpected '{}' after type name '{}'",
                trailing.text,
                input
            ));
        }
        Ok(type_name)
    }

    fn parse_type_name(lexer: &mut TypeNameLexer<'_>) -> Result<TypeName> {
        let mut segments = vec![expect_word(lexer)?];
        while lexer.peek().terminal == TypeNameTerminal::Dot {
            lexer.next_token();
            segments.push(expect_word(lexer)?);
        }

        let name = segments.pop().unwrap_or_default();
        let namespace = (!segments.is_empty()).then(|| segments.join("."));

        let mut nested = Vec::new();
        while lexer.peek().terminal == TypeNameTerminal::Plus {
            lexer.next_token();
            nested.push(expect_word(lexer)?);
        }

        let mut suffixes = Vec::new();
        loop {
            match lexer.peek().terminal {
                TypeNameTerminal::Star => {
                    lexer.next_token();
                    suffixes.push(TypeNameSuffix::Pointer);
                }
                TypeNameTerminal::Ampersand => {
                    lexer.next_token();
                    suffixes.push(TypeNameSuffix::ByRef);
                }
                TypeNameTerminal::OpenBracket => {
                    lexer.next_token();
                    suffixes.push(parse_array_suffix(lexer)?);
                }
                _ => break,
            }
        }

        let assembly = if lexer.peek().terminal == TypeNameTerminal::Comma {
            lexer.next_token();
            Some(parse_assembly_name(lexer)?)
        } else {
            None
        };

        Ok(TypeName {
            namespace,
            name,
            nested,
            suffixes,
            assembly,
        })
    }

    /// The namespace qualified name of the top level type, without nesting or suffixes.
    #[must_use]
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

fn expect_word(lexer: &mut TypeNameLexer<'_>) -> Result<String> {
    let token = lexer.next_token();
    match token.terminal {
        TypeNameTerminal::Identifier | TypeNameTerminal::Number => Ok(token.text),
        _ => Err(malformed_error!(
            "Expected an identifier, found '{}'",
            token.text
        )),
    }
}

fn parse_array_suffix(lexer: &mut TypeNameLexer<'_>) -> Result<TypeNameSuffix> {
    let mut rank = 1;
    let mut bounded = false;
    loop {
        let token = lexer.next_token();
        match token.terminal {
            TypeNameTerminal::CloseBracket => break,
            TypeNameTerminal::Comma => rank += 1,
            TypeNameTerminal::Star => bounded = true,
            _ => {
                return Err(malformed_error!(
                    "Unexpected '{}' in array specifier",
                    token.text
                ))
            }
        }
    }

    if rank == 1 && !bounded {
        Ok(TypeNameSuffix::SzArray)
    } else {
        Ok(TypeNameSuffix::Array(rank))
    }
}

fn parse_assembly_name(lexer: &mut TypeNameLexer<'_>) -> Result<AssemblyName> {
    let name = read_until_comma(lexer);
    if name.is_empty() {
        return Err(malformed_error!("Expected an assembly name"));
    }

    let mut properties = Vec::new();
    while lexer.peek().terminal == TypeNameTerminal::Comma {
        lexer.next_token();
        let key = expect_word(lexer)?;
        let token = lexer.next_token();
        if token.terminal != TypeNameTerminal::Equals {
            return Err(malformed_error!(
                "Expected '=' after assembly property '{}'",
                key
            ));
        }
        properties.push((key, read_until_comma(lexer)));
    }

    Ok(AssemblyName { name, properties })
}

fn read_until_comma(lexer: &mut TypeNameLexer<'_>) -> String {
    let mut text = String::new();
    while !matches!(
        lexer.peek().terminal,
        TypeNameTerminal::Comma | TypeNameTerminal::Eof | TypeNameTerminal::CloseBracket
    ) {
        text.push_str(&lexer.next_token().text);
    }
    text
}

impl fmt::Display for TypeNameSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeNameSuffix::Pointer => write!(f, "*"),
            TypeNameSuffix::ByRef => write!(f, "&"),
            TypeNameSuffix::SzArray => write!(f, "[]"),
            TypeNameSuffix::Array(1) => write!(f, "[*]"),
            TypeNameSuffix::Array(rank) => {
                write!(f, "[{}]", ",".repeat(rank.saturating_sub(1) as usize))
            }
        }
    }
}

impl fmt::Display for AssemblyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (key, value) in &self.properties {
            write!(f, ", {key}={value}")?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())?;
        for nested in &self.nested {
            write!(f, "+{nested}")?;
        }
        for suffix in &self.suffixes {
            write!(f, "{suffix}")?;
        }
        if let Some(assembly) = &self.assembly {
            write!(f, ", {assembly}")?;
        }
        Ok(())
    }
}
