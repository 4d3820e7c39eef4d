//! Template identifiers and operation outcomes.
//!
//! Templates are identified by a monotonic sortID plus the encoded id of the
//! author, rendered as `"{sortID} {authorID}"`.

use std::fmt;
use std::str::FromStr;

use crate::error::{MarbleError, Result};

/// A unique identifier for a template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey {
    pub sort_id: u64,
    pub author_id: String,
}

impl StorageKey {
    /// Create a new storage key.
    pub fn new(sort_id: u64, author_id: impl Into<String>) -> Self {
        Self {
            sort_id,
            author_id: author_id.into(),
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.sort_id, self.author_id)
    }
}

impl FromStr for StorageKey {
    type Err = MarbleError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || MarbleError::Parse {
            message: format!("Invalid storage key '{}'", s),
            help: Some("Storage keys look like \"3 !\": a sort id, a space, an author id".to_string()),
        };

        let (sort, author) = s.split_once(' ').ok_or_else(invalid)?;
        if author.is_empty() || author.contains(char::is_whitespace) {
            return Err(invalid());
        }
        let sort_id = sort.parse().map_err(|_| invalid())?;
        Ok(Self::new(sort_id, author))
    }
}

/// Result of deleting a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Result of importing a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Keys of the templates added, in import order.
    Imported(Vec<StorageKey>),
    /// The payload had no recognisable shape; nothing changed.
    Unrecognized,
}

impl ImportOutcome {
    /// Number of templates added.
    pub fn count(&self) -> usize {
        match self {
            ImportOutcome::Imported(keys) => keys.len(),
            ImportOutcome::Unrecognized => 0,
        }
    }
}
