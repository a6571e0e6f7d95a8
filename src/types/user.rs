//! Chat user identity

use serde::{Deserialize, Serialize};

/// A chat participant as announced by a client.
///
/// Two users are interchangeable when both `name` and `id` are equal, which is
/// what the derived `Eq`/`Hash`/`Ord` compare. Ordering is by name first, so a
/// sorted roster reads alphabetically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
}

impl User {
    /// Create a user with only a display name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
        }
    }

    /// Create a user carrying an opaque client-chosen id
    pub fn with_id(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: Some(id.into()),
        }
    }

    /// A name made only of whitespace counts as missing
    pub fn has_valid_name(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{} ({})", self.name, id),
            None => f.write_str(&self.name),
        }
    }
}
