//! Instruction-level method bodies.
//!
//! [`CilMethodBody`] is the editable form of a body: decoded instructions with absolute branch
//! targets, exception handlers, local variable types and header settings. It is read from raw
//! bytes through [`RawMethodBody`] and written back with [`CilMethodBody::build`].
//!
//! # Examples
//!
//! ```rust
//! use cilgraph::{
//!     assembly::{opcodes::*, CilInstruction},
//!     metadata::method::CilMethodBody,
//! };
//!
//! let mut body = CilMethodBody::new();
//! body.instructions = vec![
//!     CilInstruction::simple(LDARG_0),
//!     CilInstruction::simple(LDARG_1),
//!     CilInstruction::simple(ADD),
//!     CilInstruction::simple(RET),
//! ];
//!
//! let raw = body.build()?;
//! assert!(!raw.is_fat);
//! assert_eq!(body.max_stack, 2);
//! assert_eq!(raw.write()?, [0x12, 0x02, 0x03, 0x58, 0x2A]);
//! # Ok::<(), cilgraph::Error>(())
//! ```

use crate::{
    assembly::{
        calculate_offsets, decode_stream, encode_stream, opcodes, CilInstruction, StackEffect,
    },
    config::LoaderConfig,
    metadata::{
        graph::{Member, MemberRefSignature, ModuleGraph, StandAloneSignatureKind},
        method::{
            stack::{compute_max_stack, instruction_at},
            types::{TINY_MAX_CODE_SIZE, TINY_MAX_STACK},
            CilExceptionHandler, RawMethodBody,
        },
        signatures::{MethodSignature, TypeSignature},
        tables::TableId,
        token::{Token, USER_STRING_TAG},
    },
    Error, Result,
};

/// Which boundary of an exception handler an [`InvalidLabel`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerBoundary {
    /// Start of the protected region
    TryStart,
    /// End of the protected region
    TryEnd,
    /// Start of the handler
    HandlerStart,
    /// End of the handler
    HandlerEnd,
    /// Start of the filter block
    Filter,
}

/// A branch target or handler boundary that does not start an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidLabel {
    /// A branch or switch target
    Branch {
        /// Offset of the branching instruction
        offset: u32,
        /// The offending target
        target: u32,
    },
    /// An exception handler boundary
    Handler {
        /// Position of the handler in the body's handler list
        index: usize,
        /// The offending boundary
        boundary: HandlerBoundary,
        /// The offending offset
        target: u32,
    },
}

/// A method body as a list of instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct CilMethodBody {
    /// The instructions, in layout order
    pub instructions: Vec<CilInstruction>,
    /// Exception handlers, innermost first
    pub exception_handlers: Vec<CilExceptionHandler>,
    /// Local variable types, in slot order
    pub locals: Vec<TypeSignature>,
    /// `StandAloneSig` token of the locals signature
    pub local_var_sig_token: Token,
    /// Max stack, replaced on build when [`CilMethodBody::compute_max_stack`] is set
    pub max_stack: u16,
    /// Zero initialize locals
    pub init_locals: bool,
    /// Compute the max stack on build
    pub compute_max_stack: bool,
    /// Verify labels on build
    pub verify_labels: bool,
}

impl Default for CilMethodBody {
    fn default() -> Self {
        Self::with_config(&LoaderConfig::default())
    }
}

impl CilMethodBody {
    /// An empty body with the default build flags.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty body taking its build flags from `config`.
    #[must_use]
    pub fn with_config(config: &LoaderConfig) -> Self {
        CilMethodBody {
            instructions: Vec::new(),
            exception_handlers: Vec::new(),
            locals: Vec::new(),
            local_var_sig_token: Token::new(0),
            max_stack: TINY_MAX_STACK,
            init_locals: false,
            compute_max_stack: config.compute_max_stack_on_build,
            verify_labels: config.verify_labels_on_build,
        }
    }

    /// Parse and decode the body at the start of `data`.
    ///
    /// # Errors
    /// See [`RawMethodBody::read`] and [`CilMethodBody::from_raw`].
    pub fn read(data: &[u8], graph: Option<&ModuleGraph>) -> Result<Self> {
        Self::from_raw(&RawMethodBody::read(data)?, graph)
    }

    /// Decode a raw body.
    ///
    /// With a graph, the locals signature is resolved into [`CilMethodBody::locals`], token
    /// operands are checked against the graph and call sites get their stack effect from the
    /// callee signature, as far as the graph's [`LoaderConfig`] asks for it. Unresolvable
    /// references are logged and left as they are.
    ///
    /// Decoded bodies keep their declared max stack; set
    /// [`CilMethodBody::compute_max_stack`] to recompute it on build.
    ///
    /// # Errors
    /// Returns [`Error::InvalidOpcode`] or [`Error::OutOfBounds`] if the code does not decode.
    pub fn from_raw(raw: &RawMethodBody, graph: Option<&ModuleGraph>) -> Result<Self> {
        let config = graph.map(|graph| *graph.config()).unwrap_or_default();

        let mut body = CilMethodBody {
            instructions: decode_stream(&raw.code)?,
            exception_handlers: raw.exception_handlers.clone(),
            locals: Vec::new(),
            local_var_sig_token: raw.local_var_sig_token,
            max_stack: raw.max_stack,
            init_locals: raw.init_locals,
            compute_max_stack: false,
            verify_labels: config.verify_labels_on_build,
        };

        if let Some(graph) = graph {
            if config.read_locals && !raw.local_var_sig_token.is_null() {
                body.locals = resolve_locals(graph, raw.local_var_sig_token);
            }
            if config.resolve_operands {
                for instruction in &mut body.instructions {
                    resolve_operand(graph, instruction);
                }
            }
        }

        Ok(body)
    }

    /// Whether the body needs a fat header: it has exception handlers or locals, a max stack
    /// above 8, or at least 64 bytes of code.
    #[must_use]
    pub fn is_fat(&self) -> bool {
        !self.exception_handlers.is_empty()
            || !self.locals.is_empty()
            || self.max_stack > TINY_MAX_STACK
            || self.code_size() > TINY_MAX_CODE_SIZE as u32
    }

    /// Encoded length of the instruction stream, from the current offsets.
    #[must_use]
    pub fn code_size(&self) -> u32 {
        self.instructions
            .last()
            .map_or(0, CilInstruction::next_offset)
    }

    /// Lay the instructions out back to back from offset 0 and return the code size.
    ///
    /// Needed after any edit, since instruction sizes depend on opcodes and operands.
    pub fn calculate_offsets(&mut self) -> u32 {
        calculate_offsets(&mut self.instructions)
    }

    /// Check that every branch target and every handler boundary starts an instruction.
    ///
    /// Offsets are recalculated first. Handler end offsets may also equal the code size.
    ///
    /// # Errors
    /// Returns [`Error::InvalidLabels`] with every violation found.
    pub fn verify_labels(&mut self) -> Result<()> {
        let code_size = self.calculate_offsets();
        let starts = |offset: u32| instruction_at(&self.instructions, offset).is_some();

        let mut invalid = Vec::new();
        for instruction in &self.instructions {
            for target in instruction.branch_targets() {
                if !starts(target) {
                    invalid.push(InvalidLabel::Branch {
                        offset: instruction.offset,
                        target,
                    });
                }
            }
        }

        for (index, handler) in self.exception_handlers.iter().enumerate() {
            let mut boundaries = vec![
                (HandlerBoundary::TryStart, handler.try_offset, false),
                (HandlerBoundary::TryEnd, handler.try_end(), true),
                (HandlerBoundary::HandlerStart, handler.handler_offset, false),
                (HandlerBoundary::HandlerEnd, handler.handler_end(), true),
            ];
            if let Some(filter) = handler.filter_offset() {
                boundaries.push((HandlerBoundary::Filter, filter, false));
            }

            for (boundary, target, may_end_body) in boundaries {
                if !(starts(target) || (may_end_body && target == code_size)) {
                    invalid.push(InvalidLabel::Handler {
                        index,
                        boundary,
                        target,
                    });
                }
            }
        }

        if invalid.is_empty() {
            Ok(())
        } else {
            log::warn!("method body has {} invalid label(s)", invalid.len());
            Err(Error::InvalidLabels(invalid))
        }
    }

    /// Maximum evaluation stack depth over every path through the body.
    ///
    /// Offsets are recalculated first. Call sites without a known stack effect count as
    /// neither popping nor pushing.
    ///
    /// # Errors
    /// Returns [`Error::StackImbalance`] if two paths reach an instruction with different
    /// depths, [`Error::StackUnderflow`] if an instruction pops from an empty stack, and
    /// [`Error::Malformed`] for branch targets that do not start an instruction.
    pub fn compute_max_stack(&mut self) -> Result<u16> {
        self.calculate_offsets();
        let depth = compute_max_stack(&self.instructions, &self.exception_handlers)
            .inspect_err(|error| log::warn!("max stack computation failed: {error}"))?;
        u16::try_from(depth).map_err(|_| malformed_error!("Max stack {} exceeds u16", depth))
    }

    /// Encode the body, recomputing max stack and verifying labels as the flags ask.
    ///
    /// A computed max stack is stored back into [`CilMethodBody::max_stack`].
    ///
    /// # Errors
    /// Fails if label verification or max stack computation fails, or an instruction cannot be
    /// encoded.
    pub fn build(&mut self) -> Result<RawMethodBody> {
        self.calculate_offsets();
        if self.verify_labels {
            self.verify_labels()?;
        }
        if self.compute_max_stack {
            self.max_stack = self.compute_max_stack()?;
        }

        // a tiny header has no room for the init locals flag or a locals token
        let is_fat = self.is_fat();
        if !is_fat && !self.local_var_sig_token.is_null() {
            log::debug!(
                "dropping locals token {} of a body without locals",
                self.local_var_sig_token
            );
        }
        Ok(RawMethodBody {
            is_fat,
            max_stack: self.max_stack,
            init_locals: self.init_locals && is_fat,
            local_var_sig_token: if is_fat {
                self.local_var_sig_token
            } else {
                Token::default()
            },
            code: encode_stream(&self.instructions)?,
            exception_handlers: self.exception_handlers.clone(),
        })
    }
}

fn resolve_locals(graph: &ModuleGraph, token: Token) -> Vec<TypeSignature> {
    let Some(signature) = graph.try_lookup(token).and_then(|member| match member {
        Member::StandAloneSignature(signature) => Some(signature),
        _ => None,
    }) else {
        log::warn!("locals signature {} does not resolve", token);
        return Vec::new();
    };

    match signature.signature(graph) {
        Ok(kind) => match kind.as_ref() {
            StandAloneSignatureKind::Locals(locals) => locals.locals.clone(),
            StandAloneSignatureKind::Method(_) => {
                log::warn!("locals token {} names a call site signature", token);
                Vec::new()
            }
        },
        Err(error) => {
            log::warn!("locals signature {} failed to decode: {}", token, error);
            Vec::new()
        }
    }
}

fn resolve_operand(graph: &ModuleGraph, instruction: &mut CilInstruction) {
    let Some(token) = instruction.token() else {
        return;
    };

    if token.table() == USER_STRING_TAG {
        if graph.heaps().user_strings.get(token.row()).is_err() {
            log::warn!(
                "IL_{:04x}: user string {} is outside the heap",
                instruction.offset,
                token
            );
        }
        return;
    }

    let Some(member) = graph.try_lookup(token) else {
        log::warn!("IL_{:04x}: operand {} does not resolve", instruction.offset, token);
        return;
    };

    let opcode = instruction.opcode;
    if opcode == opcodes::CALL || opcode == opcodes::CALLVIRT || opcode == opcodes::NEWOBJ {
        instruction.call_effect = callee_signature(graph, &member)
            .map(|signature| call_effect(&signature, opcode == opcodes::NEWOBJ));
    } else if opcode == opcodes::CALLI {
        if let Member::StandAloneSignature(site) = &member {
            if let Ok(kind) = site.signature(graph) {
                if let StandAloneSignatureKind::Method(signature) = kind.as_ref() {
                    let effect = call_effect(signature, false);
                    // the function pointer sits on top of the arguments
                    instruction.call_effect = Some(StackEffect {
                        pops: effect.pops + 1,
                        pushes: effect.pushes,
                    });
                }
            }
        }
    }

    if instruction.call_effect.is_none() && instruction.stack_effect().is_none() {
        log::warn!(
            "IL_{:04x}: no signature for call site {}",
            instruction.offset,
            token
        );
    }
}

fn callee_signature(graph: &ModuleGraph, member: &Member) -> Option<MethodSignature> {
    match member {
        Member::MethodDefinition(method) => {
            method.signature(graph).ok().map(|sig| sig.as_ref().clone())
        }
        Member::MemberReference(reference) => match reference.signature(graph).ok()?.as_ref() {
            MemberRefSignature::Method(signature) => {
                Some(signature.clone())
            }
            MemberRefSignature::Field(_) => None,
        },
        Member::MethodSpecification(spec) => {
            let method = spec.method(graph).ok()??;
            if method.token().is_table(TableId::MethodSpec) {
                return None;
            }
            callee_signature(graph, &method)
        }
        _ => None,
    }
}

fn call_effect(signature: &MethodSignature, constructs: bool) -> StackEffect {
    if constructs {
        // newobj supplies `this` itself and pushes the new object
        StackEffect {
            pops: signature.stack_pops() - u32::from(signature.has_this && !signature.explicit_this),
            pushes: 1,
        }
    } else {
        StackEffect {
            pops: signature.stack_pops(),
            pushes: u32::from(signature.returns_value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{opcodes::*, CilOperand};

    fn ten_nops() -> CilMethodBody {
        let mut body = CilMethodBody::new();
        body.instructions = (0..9).map(|_| CilInstruction::simple(NOP)).collect();
        body.instructions.push(CilInstruction::simple(RET));
        body
    }

    #[test]
    fn tiny_eligible_body() {
        let mut body = ten_nops();
        let raw = body.build().unwrap();
        assert!(!body.is_fat());
        assert_eq!(body.max_stack, 0);

        let bytes = raw.write().unwrap();
        assert_eq!(bytes[0], (10 << 2) | 0b10);
        assert_eq!(bytes.len(), 11);
    }

    #[test]
    fn fat_conditions() {
        let mut body = ten_nops();
        body.calculate_offsets();
        assert!(!body.is_fat());

        body.locals.push(TypeSignature::I4);
        assert!(body.is_fat());
        body.locals.clear();

        body.max_stack = 9;
        assert!(body.is_fat());
        body.max_stack = 8;

        // an unresolved locals token alone does not force a fat header
        body.local_var_sig_token = Token::new(0x1100_0001);
        assert!(!body.is_fat());
        let raw = body.build().unwrap();
        assert!(!raw.is_fat);
        assert!(raw.local_var_sig_token.is_null());
        assert_eq!(raw.write().unwrap()[0], (10 << 2) | 0b10);
        body.local_var_sig_token = Token::default();
        body.max_stack = 8;

        body.exception_handlers
            .push(CilExceptionHandler::finally((0, 1), (1, 1)));
        assert!(body.is_fat());
        body.exception_handlers.clear();

        body.instructions = (0..63).map(|_| CilInstruction::simple(NOP)).collect();
        body.instructions.push(CilInstruction::simple(RET));
        body.calculate_offsets();
        assert_eq!(body.code_size(), 64);
        assert!(body.is_fat());
    }

    #[test]
    fn verify_labels_reports_every_violation() {
        let mut body = CilMethodBody::new();
        body.instructions = vec![
            CilInstruction::new(LDC_I4, CilOperand::Int32(1)),
            CilInstruction::new(BRTRUE_S, CilOperand::Target(3)),
            CilInstruction::new(BR_S, CilOperand::Target(9)),
            CilInstruction::simple(RET),
        ];
        body.exception_handlers
            .push(CilExceptionHandler::finally((0, 2), (9, 2)));

        match body.verify_labels() {
            Err(Error::InvalidLabels(labels)) => {
                assert_eq!(labels.len(), 3);
                assert_eq!(labels[0], InvalidLabel::Branch { offset: 5, target: 3 });
                assert_eq!(labels[1], InvalidLabel::Handler {
                    index: 0,
                    boundary: HandlerBoundary::TryEnd,
                    target: 2
                });
                assert_eq!(labels[2], InvalidLabel::Handler {
                    index: 0,
                    boundary: HandlerBoundary::HandlerEnd,
                    target: 11
                });
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn labels_follow_edits() {
        let mut body = CilMethodBody::new();
        body.instructions = vec![
            CilInstruction::new(BR_S, CilOperand::Target(2)),
            CilInstruction::simple(RET),
        ];
        assert!(body.verify_labels().is_ok());

        // growing the first instruction moves `ret`
        body.instructions[0] = CilInstruction::new(BR, CilOperand::Target(2));
        assert!(body.verify_labels().is_err());
        body.instructions[0].operand = CilOperand::Target(5);
        assert!(body.verify_labels().is_ok());
    }

    #[test]
    fn decoded_body_keeps_max_stack() {
        let raw = RawMethodBody::read(&[0x0A, 0x02, 0x2A]).unwrap();
        let mut body = CilMethodBody::from_raw(&raw, None).unwrap();
        assert_eq!(body.instructions.len(), 2);
        assert_eq!(body.max_stack, 8);
        assert!(!body.compute_max_stack);

        let rebuilt = body.build().unwrap();
        assert_eq!(rebuilt, raw);
    }

    #[test]
    fn build_computes_max_stack() {
        let mut body = CilMethodBody::new();
        body.instructions = (0..9)
            .map(|_| CilInstruction::simple(LDC_I4_0))
            .chain((0..9).map(|_| CilInstruction::simple(POP)))
            .chain(std::iter::once(CilInstruction::simple(RET)))
            .collect();

        let raw = body.build().unwrap();
        assert_eq!(body.max_stack, 9);
        assert!(raw.is_fat);
        assert_eq!(raw.max_stack, 9);
    }

    #[test]
    fn newobj_effect() {
        let ctor = MethodSignature {
            has_this: true,
            params: vec![TypeSignature::I4, TypeSignature::String],
            ..MethodSignature::default()
        };
        assert_eq!(call_effect(&ctor, true), StackEffect { pops: 2, pushes: 1 });
        assert_eq!(call_effect(&ctor, false), StackEffect { pops: 3, pushes: 0 });
    }
}
