//! Shared enum types.

use serde::{Deserialize, Serialize};

/// Discriminator for the two resource content representations.
///
/// The service does not inspect content beyond this tag; it only selects
/// the content setter at commit time and the content-type label reported
/// with download chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Raw binary content.
    #[default]
    #[serde(rename = "BINARY")]
    Binary,
    /// XML text content (UTF-8).
    #[serde(rename = "XML")]
    Xml,
}

impl ResourceKind {
    /// Returns the string value of this enum variant.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binary => "BINARY",
            Self::Xml => "XML",
        }
    }

    /// The content-type label reported for resources of this kind.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Binary => "application/octet-stream",
            Self::Xml => "application/xml",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ResourceKind {
    fn from(s: &str) -> Self {
        match s {
            "XML" => Self::Xml,
            _ => Self::Binary,
        }
    }
}
