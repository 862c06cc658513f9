//! Canonical name derivation
//!
//! Every entity name maps to a canonical form used for uniqueness checks and
//! cross-document matching: lowercase, with every run of non-alphanumeric
//! characters collapsed to a single `-` separator and leading/trailing
//! separators stripped. The function is deterministic and idempotent, so a
//! canonical name can itself be re-canonicalized without changing.

/// Derive the canonical form of an entity name.
///
/// # Examples
///
/// ```
/// use lorekeeper_domain::canonicalize;
///
/// assert_eq!(canonicalize("Grok the Bold"), "grok-the-bold");
/// assert_eq!(canonicalize("  Sable  /  Keep  "), "sable-keep");
/// assert_eq!(canonicalize("grok-the-bold"), "grok-the-bold");
/// ```
pub fn canonicalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('-');
            }
            pending_separator = false;
            for lower in c.to_lowercase() {
                out.push(lower);
            }
        } else {
            // Runs of punctuation/whitespace collapse to one separator,
            // and a leading run produces none at all.
            pending_separator = true;
        }
    }

    out
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: canonicalization is idempotent
        #[test]
        fn test_canonicalize_idempotent(name in ".{0,64}") {
            let once = canonicalize(&name);
            let twice = canonicalize(&once);
            prop_assert_eq!(once, twice);
        }

        /// Property: output never starts or ends with the separator
        #[test]
        fn test_no_edge_separators(name in ".{0,64}") {
            let canonical = canonicalize(&name);
            prop_assert!(!canonical.starts_with('-'));
            prop_assert!(!canonical.ends_with('-'));
        }

        /// Property: output never contains a separator run
        #[test]
        fn test_no_separator_runs(name in ".{0,64}") {
            let canonical = canonicalize(&name);
            prop_assert!(!canonical.contains("--"));
        }

        /// Property: output contains no uppercase characters
        #[test]
        fn test_all_lowercase(name in ".{0,64}") {
            let canonical = canonicalize(&name);
            prop_assert!(!canonical.chars().any(|c| c.is_uppercase()));
        }
    }
}
