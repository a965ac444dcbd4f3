use std::fmt;

use serde::Serialize;

use crate::error::ResolveError;

pub const DELIMITER: &str = "::";
pub const DEFAULT_ABBREV_LENGTH: usize = 7;
const MIN_ABBREV_LENGTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub repository: String,
    pub revision: String,
    pub file_path: String,
    pub search_option: Option<String>,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}",
            self.repository, self.revision, self.file_path
        )?;
        if let Some(search) = &self.search_option {
            write!(f, "{DELIMITER}{search}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub abbreviate_revision: bool,
    pub abbrev_length: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            abbreviate_revision: false,
            abbrev_length: DEFAULT_ABBREV_LENGTH,
        }
    }
}

/// Joins repository, revision and file path into a stored address.
///
/// Search options are never written here; they only ever show up on
/// addresses coming back in through [`decode`]. A field containing the
/// delimiter would decode as a different address, so it is rejected.
pub fn encode(
    repository: &str,
    revision: &str,
    file_path: &str,
    options: EncodeOptions,
) -> Result<String, ResolveError> {
    for (field, value) in [
        ("repository", repository),
        ("revision", revision),
        ("file path", file_path),
    ] {
        if value.contains(DELIMITER) {
            return Err(ResolveError::DelimiterInField {
                field,
                value: value.to_string(),
            });
        }
    }

    let revision = if options.abbreviate_revision {
        abbreviate_revision(revision, options.abbrev_length)
    } else {
        revision
    };

    Ok([repository, revision, file_path].join(DELIMITER))
}

/// Splits a stored address back into its fields.
///
/// Empty leading/trailing segments are dropped and anything past the fourth
/// segment is ignored. Fewer than three segments is rejected.
pub fn decode(raw: &str) -> Result<Address, ResolveError> {
    let mut segments: Vec<&str> = raw.split(DELIMITER).collect();
    while segments.first().is_some_and(|segment| segment.is_empty()) {
        segments.remove(0);
    }
    while segments.last().is_some_and(|segment| segment.is_empty()) {
        segments.pop();
    }

    let [repository, revision, file_path, rest @ ..] = segments.as_slice() else {
        return Err(ResolveError::MalformedAddress(raw.to_string()));
    };

    let search_option = rest
        .first()
        .filter(|search| !search.is_empty())
        .map(|search| search.to_string());

    Ok(Address {
        repository: repository.to_string(),
        revision: revision.to_string(),
        file_path: file_path.to_string(),
        search_option,
    })
}

/// Shortens full hex object ids; branch names, tags and already-short ids
/// pass through untouched.
pub fn abbreviate_revision(revision: &str, length: usize) -> &str {
    let length = length.max(MIN_ABBREV_LENGTH);
    if is_full_object_id(revision) && length < revision.len() {
        &revision[..length]
    } else {
        revision
    }
}

fn is_full_object_id(revision: &str) -> bool {
    matches!(revision.len(), 40 | 64) && revision.bytes().all(|byte| byte.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_SHA1: &str = "0123456789abcdef0123456789abcdef01234567";

    #[test]
    fn encode_then_decode_returns_fields_without_search() {
        let encoded = encode("~/src/app", "main", "src/lib.rs", EncodeOptions::default())
            .expect("fields without delimiter should encode");
        assert_eq!(encoded, "~/src/app::main::src/lib.rs");

        let address = decode(&encoded).expect("encoded address should decode");
        assert_eq!(address.repository, "~/src/app");
        assert_eq!(address.revision, "main");
        assert_eq!(address.file_path, "src/lib.rs");
        assert_eq!(address.search_option, None);
    }

    #[test]
    fn decode_reads_fourth_segment_as_search_option() {
        let address = decode("r::v::f::s").expect("four segments should decode");
        assert_eq!(
            address,
            Address {
                repository: "r".to_string(),
                revision: "v".to_string(),
                file_path: "f".to_string(),
                search_option: Some("s".to_string()),
            }
        );
    }

    #[test]
    fn decode_drops_empty_edges_and_extra_segments() {
        let address = decode("::r::v::f::").expect("edge delimiters should be ignored");
        assert_eq!(address.repository, "r");
        assert_eq!(address.file_path, "f");
        assert_eq!(address.search_option, None);

        let address = decode("r::v::f::s::ignored").expect("extra segments are discarded");
        assert_eq!(address.search_option.as_deref(), Some("s"));
    }

    #[test]
    fn decode_keeps_interior_empty_segments() {
        let address = decode("r::::f").expect("three segments with empty revision");
        assert_eq!(address.revision, "");
        assert_eq!(address.file_path, "f");
    }

    #[test]
    fn decode_rejects_addresses_with_fewer_than_three_segments() {
        for raw in ["", "repo", "repo::rev", "::repo::rev::"] {
            let err = decode(raw).expect_err("short address should fail");
            assert_eq!(err, ResolveError::MalformedAddress(raw.to_string()));
        }
    }

    #[test]
    fn display_matches_wire_format() {
        let address = decode("r::v::f::/fn main/").expect("decode");
        assert_eq!(address.to_string(), "r::v::f::/fn main/");
    }

    #[test]
    fn encode_abbreviates_full_ids_only_when_asked() {
        let options = EncodeOptions {
            abbreviate_revision: true,
            abbrev_length: 10,
        };
        assert_eq!(
            encode("r", FULL_SHA1, "f", options).expect("encode"),
            "r::0123456789::f"
        );
        assert_eq!(
            encode("r", "v1.2.0", "f", options).expect("encode"),
            "r::v1.2.0::f"
        );
        assert_eq!(
            encode("r", FULL_SHA1, "f", EncodeOptions::default()).expect("encode"),
            format!("r::{FULL_SHA1}::f")
        );
    }

    #[test]
    fn encode_rejects_fields_containing_delimiter() {
        let err = encode("~/app", "v1", "docs/a::b.md", EncodeOptions::default())
            .expect_err("delimiter in file path should fail");
        assert_eq!(
            err,
            ResolveError::DelimiterInField {
                field: "file path",
                value: "docs/a::b.md".to_string(),
            }
        );

        let err = encode("~/a::b", "v1", "f", EncodeOptions::default())
            .expect_err("delimiter in repository should fail");
        assert!(matches!(
            err,
            ResolveError::DelimiterInField {
                field: "repository",
                ..
            }
        ));

        let address = encode("~/app", "v1", "docs/a:b.md", EncodeOptions::default())
            .expect("single colon is fine");
        assert_eq!(
            decode(&address).expect("decode").file_path,
            "docs/a:b.md"
        );
    }

    #[test]
    fn abbreviation_clamps_to_minimum_length() {
        assert_eq!(abbreviate_revision(FULL_SHA1, 1), "0123");
        assert_eq!(abbreviate_revision("deadbeef", 4), "deadbeef");
    }
}
