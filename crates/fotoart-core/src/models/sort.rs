use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Ordering applied to a collection's photo listing.
///
/// Parsing is permissive: anything outside the known keys (including the empty
/// string) resolves to [`PhotoSort::UploadedNew`]. Callers report the resolved
/// key back to clients so the fallback is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PhotoSort {
    /// Upload time, newest first
    #[default]
    UploadedNew,
    /// Upload time, oldest first
    UploadedOld,
    /// Original file name, ascending
    NameAz,
    /// Original file name, descending
    NameZa,
    /// Fresh permutation on every call
    Random,
}

impl PhotoSort {
    pub const ALL: [PhotoSort; 5] = [
        PhotoSort::UploadedNew,
        PhotoSort::UploadedOld,
        PhotoSort::NameAz,
        PhotoSort::NameZa,
        PhotoSort::Random,
    ];

    pub fn resolve(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("uploaded_old") => PhotoSort::UploadedOld,
            Some("name_az") => PhotoSort::NameAz,
            Some("name_za") => PhotoSort::NameZa,
            Some("random") => PhotoSort::Random,
            _ => PhotoSort::UploadedNew,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoSort::UploadedNew => "uploaded_new",
            PhotoSort::UploadedOld => "uploaded_old",
            PhotoSort::NameAz => "name_az",
            PhotoSort::NameZa => "name_za",
            PhotoSort::Random => "random",
        }
    }
}

impl fmt::Display for PhotoSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_keys_resolve() {
        for sort in PhotoSort::ALL {
            assert_eq!(PhotoSort::resolve(Some(sort.as_str())), sort);
        }
    }

    #[test]
    fn test_unknown_and_empty_fall_back_to_uploaded_new() {
        assert_eq!(PhotoSort::resolve(None), PhotoSort::UploadedNew);
        assert_eq!(PhotoSort::resolve(Some("")), PhotoSort::UploadedNew);
        assert_eq!(PhotoSort::resolve(Some("size_desc")), PhotoSort::UploadedNew);
    }

    #[test]
    fn test_resolution_ignores_case_and_whitespace() {
        assert_eq!(PhotoSort::resolve(Some(" NAME_ZA ")), PhotoSort::NameZa);
    }

    #[test]
    fn test_serializes_as_snake_case() {
        let json = serde_json::to_string(&PhotoSort::NameAz).unwrap();
        assert_eq!(json, "\"name_az\"");
    }
}
