//! # Primitives
//!
//! Fixed constants of the textual grammar, the pattern language and the
//! snapshot format. Compiled in and immutable at runtime.

/// Matches any single entity.
pub const WILDCARD_ANY: &str = "*";

/// Matches any atom.
pub const WILDCARD_ATOM: &str = "@";

/// Matches any edge.
pub const WILDCARD_EDGE: &str = "&";

/// Final child of an open-ended pattern.
pub const OPEN_ENDED: &str = "...";

/// Separator between root, type and namespace inside an atom token.
pub const ATOM_SEPARATOR: char = '/';

/// Magic bytes for the snapshot header ("SMHG").
pub const MAGIC_BYTES: &[u8; 4] = b"SMHG";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot layout.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum nesting depth accepted by the parser.
///
/// Bounds parser recursion on hostile input.
pub const MAX_PARSE_DEPTH: usize = 256;

/// Maximum length of textual entity or pattern input, in bytes.
pub const MAX_ENTITY_TEXT_LENGTH: usize = 1024 * 1024;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards_are_distinct() {
        let all = [WILDCARD_ANY, WILDCARD_ATOM, WILDCARD_EDGE, OPEN_ENDED];
        for (i, a) in all.iter().enumerate() {
            for b in all.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"SMHG");
    }
}
