//! Language slots and their deterministic default content.
//!
//! A document multiplexes one record across several independent language
//! slots. Every slot has a fixed default so that opening a slot that was
//! never written still shows something runnable.

use serde::{Deserialize, Serialize};

/// Default content for a fresh python slot.
const PYTHON_DEFAULT: &str = "print(\"hello world\")";

/// Default content for a fresh java slot.
const JAVA_DEFAULT: &str = "import java.util.*;
import java.io.*;
public class Main {
    public static void main(String[] args) {
        System.out.println(\"Hello from java!\");
    }
}
";

/// A language slot within a document.
///
/// The enumeration is closed: the store schema, the editor, and the
/// execution registry all agree on exactly these slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Java,
    /// Free-form slot with no executable backend.
    Other,
}

impl Language {
    /// All slots, in display order.
    pub const ALL: [Language; 3] = [Language::Python, Language::Java, Language::Other];

    /// Deterministic content for a slot that has never been written.
    pub fn default_content(self) -> &'static str {
        match self {
            Language::Python => PYTHON_DEFAULT,
            Language::Java => JAVA_DEFAULT,
            Language::Other => "",
        }
    }

    /// Lower-case wire name, as stored in the document row.
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
            Language::Other => "other",
        }
    }

    /// Whether an execution backend exists for this slot.
    ///
    /// `other` must never be dispatched; callers block it client-side.
    pub fn is_executable(self) -> bool {
        !matches!(self, Language::Other)
    }
}

/// The fallback slot selected when a document has no active language.
impl Default for Language {
    fn default() -> Self {
        Language::Python
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "python" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "other" => Ok(Language::Other),
            _ => Err(UnknownLanguage(s.to_string())),
        }
    }
}

/// A language name outside the closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language: {0}")]
pub struct UnknownLanguage(pub String);
