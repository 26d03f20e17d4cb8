use crate::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_COMMENT_CHARS: usize = 200;
pub const MAX_AUTHOR_CHARS: usize = 50;
pub const DEFAULT_AUTHOR: &str = "Anonymous";

/// A comment attached to a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub report_id: String,
    #[serde(default = "default_author")]
    pub author: String,
    pub text: String,
    #[serde(with = "crate::model::report::timestamp")]
    pub created_at: DateTime<Utc>,
}

fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

/// Body of `POST /api/reports/{id}/comments`, already validated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewComment {
    text: String,
    author: String,
}

impl NewComment {
    /// Trim and check both fields; a blank author becomes `Anonymous`
    pub fn new(text: &str, author: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyComment);
        }
        let len = text.chars().count();
        if len > MAX_COMMENT_CHARS {
            return Err(ValidationError::CommentTooLong {
                len,
                max: MAX_COMMENT_CHARS,
            });
        }

        let author = match author.trim() {
            "" => DEFAULT_AUTHOR,
            name => name,
        };
        let len = author.chars().count();
        if len > MAX_AUTHOR_CHARS {
            return Err(ValidationError::AuthorTooLong {
                len,
                max: MAX_AUTHOR_CHARS,
            });
        }

        Ok(Self {
            text: text.to_string(),
            author: author.to_string(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn author(&self) -> &str {
        &self.author
    }
}

/// Comment input fields as the user is editing them.
///
/// The text survives a failed submission so the user can retry; it is only
/// cleared once the backend has accepted the comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDraft {
    pub text: String,
    pub author: String,
}

impl CommentDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: String::new(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn to_new_comment(&self) -> Result<NewComment, ValidationError> {
        NewComment::new(&self.text, &self.author)
    }

    /// Clear the text after a successful post; the author name is kept
    pub fn clear_text(&mut self) {
        self.text.clear();
    }
}
