use crate::finalize::EmitOptions;
use sha2::{Digest, Sha256};

pub const SOURCE_HASH_PREFIX: &str = "// source-hash: ";

/// SHA-256 over every source document plus the emit options, so a changed
/// option invalidates the output as well as a changed template.
pub fn source_hash(sources: &[&str], options: &EmitOptions) -> String {
    let mut hasher = Sha256::new();
    for source in sources {
        hasher.update((source.len() as u64).to_le_bytes());
        hasher.update(source.as_bytes());
    }
    if let Ok(options) = serde_json::to_string(options) {
        hasher.update(options.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Hash recorded in the banner of a previously generated output.
pub fn recorded_hash(existing_output: &str) -> Option<&str> {
    existing_output
        .lines()
        .take_while(|line| line.is_empty() || line.starts_with("//") || line.starts_with('\''))
        .find_map(|line| line.strip_prefix(SOURCE_HASH_PREFIX))
        .map(str::trim)
}

pub fn is_up_to_date(existing_output: &str, hash: &str) -> bool {
    recorded_hash(existing_output) == Some(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_and_sensitive() {
        let options = EmitOptions::default();
        let a = source_hash(&["<template id=\"a\"></template>"], &options);
        assert_eq!(a, source_hash(&["<template id=\"a\"></template>"], &options));
        assert_ne!(a, source_hash(&["<template id=\"b\"></template>"], &options));

        let other = EmitOptions {
            builder_param: "builder".to_string(),
            ..EmitOptions::default()
        };
        assert_ne!(a, source_hash(&["<template id=\"a\"></template>"], &other));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_split_between_sources_matters() {
        let options = EmitOptions::default();
        assert_ne!(
            source_hash(&["ab", "c"], &options),
            source_hash(&["a", "bc"], &options)
        );
    }

    #[test]
    fn test_recorded_hash_read_from_banner() {
        let output = concat!(
            "'use strict';\n\n",
            "// auto-generated by build-components\n",
            "// source-hash: abc123\n\n",
            "function f() {}\n",
        );
        assert_eq!(recorded_hash(output), Some("abc123"));
        assert!(is_up_to_date(output, "abc123"));
        assert!(!is_up_to_date(output, "def456"));
        assert!(!is_up_to_date("function f() {}\n// source-hash: abc123", "abc123"));
    }
}
