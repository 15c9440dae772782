//! Normalized archive rows: one submitted source file per `SourceRecord`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Solution size-class, decoded from the raw archive tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Small,
    Large,
    Other,
}

impl SizeClass {
    pub const ALL: [SizeClass; 3] = [SizeClass::Small, SizeClass::Large, SizeClass::Other];

    /// `'0'` is small, `'1'` is large, anything else (empty included) is other.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "0" => SizeClass::Small,
            "1" => SizeClass::Large,
            _ => SizeClass::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeClass::Small => "small",
            SizeClass::Large => "large",
            SizeClass::Other => "other",
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output language family. C, C++ and headers all land in `Native`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    #[serde(rename = "c")]
    Native,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Java, Language::Native];

    /// Directory prefix used on the output sink (`java-small`, `c-large`, ...).
    pub fn dir_name(&self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::Native => "c",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// One row of the archive export.
///
/// Column names follow the archive CSV header. `file` and `full_path` are
/// populated differently depending on the archive era; either may be empty.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceRecord {
    #[serde(default)]
    pub full_path: String,
    #[serde(default)]
    pub file: String,
    pub username: String,
    pub flines: String,
    #[serde(default)]
    pub year: String,
    pub task: String,
    pub round: String,
    /// Raw solution tag as found in the archive (`0`, `1`, ...).
    pub solution: String,
}

impl SourceRecord {
    #[inline]
    pub fn size_class(&self) -> SizeClass {
        SizeClass::from_tag(&self.solution)
    }

    /// Trimmed raw tag; used to tell solution variants apart.
    #[inline]
    pub fn variant_tag(&self) -> &str {
        self.solution.trim()
    }

    /// True if either filename field ends with one of `exts` (case-insensitive).
    pub fn has_extension(&self, exts: &[&str]) -> bool {
        let full = self.full_path.to_lowercase();
        let short = self.file.to_lowercase();
        exts.iter().any(|e| full.ends_with(e) || short.ends_with(e))
    }

    /// Base name of `full_path`, or of the lower-cased `file` when `full_path` is empty.
    pub fn base_name(&self) -> String {
        let source = if self.full_path.is_empty() {
            self.file.to_lowercase()
        } else {
            self.full_path.clone()
        };
        source
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .unwrap_or_default()
            .to_string()
    }
}
