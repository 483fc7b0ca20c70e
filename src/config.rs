//! Loader configuration.
//!
//! [`LoaderConfig`] controls how much work [`crate::metadata::graph::ModuleGraph`] does while
//! materializing members and method bodies, and which defaults new
//! [`crate::metadata::method::CilMethodBody`] values start from.

use crate::metadata::signatures::MAX_RECURSION_DEPTH;

/// Knobs for graph loading and method-body construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct LoaderConfig {
    /// Resolve instruction token operands through the graph while reading bodies, and derive the
    /// stack effect of call sites from the callee signatures
    pub resolve_operands: bool,

    /// Resolve the local variable signature of fat bodies
    pub read_locals: bool,

    /// Hard nesting limit for signature parsing (default: 64)
    pub max_signature_depth: usize,

    /// Check every coded-index column against the row counts when the graph is created
    pub strict_coded_indices: bool,

    /// Whether new method bodies compute their max stack when built
    pub compute_max_stack_on_build: bool,

    /// Whether new method bodies verify branch targets and handler boundaries when built
    pub verify_labels_on_build: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            resolve_operands: true,
            read_locals: true,
            max_signature_depth: MAX_RECURSION_DEPTH,
            strict_coded_indices: false,
            compute_max_stack_on_build: true,
            verify_labels_on_build: true,
        }
    }
}

impl LoaderConfig {
    /// Every check enabled, including the up-front coded-index validation.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict_coded_indices: true,
            ..Self::default()
        }
    }

    /// The default configuration; broken references degrade to placeholders.
    #[must_use]
    pub fn lenient() -> Self {
        Self::default()
    }

    /// Reads bodies as plain instruction streams without touching the rest of the graph.
    ///
    /// Call sites keep an unknown stack effect, so max stack is not recomputed on build.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            resolve_operands: false,
            read_locals: false,
            max_signature_depth: MAX_RECURSION_DEPTH,
            strict_coded_indices: false,
            compute_max_stack_on_build: false,
            verify_labels_on_build: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let strict = LoaderConfig::strict();
        assert!(strict.strict_coded_indices);
        assert!(strict.resolve_operands);
        assert_eq!(strict.max_signature_depth, 64);

        assert_eq!(LoaderConfig::lenient(), LoaderConfig::default());
        assert!(!LoaderConfig::default().strict_coded_indices);

        let minimal = LoaderConfig::minimal();
        assert!(!minimal.resolve_operands);
        assert!(!minimal.read_locals);
        assert!(!minimal.compute_max_stack_on_build);
        assert!(!minimal.verify_labels_on_build);
    }
}
