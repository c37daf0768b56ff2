use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{PageRequest, SortOrder, VoteState};

pub const DELETED_PLACEHOLDER: &str = "[deleted]";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub deleted: bool,
    pub score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment joined with its author and the viewer's vote, as read from the store.
#[derive(Debug, Clone)]
pub struct CommentRow {
    pub comment: Comment,
    pub author_username: String,
    pub author_avatar_url: Option<String>,
    pub user_vote: Option<VoteState>,
}

// Create comment request
#[derive(Debug, Validate, Deserialize)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
}

// Update comment request
#[derive(Debug, Validate, Deserialize)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentAuthor {
    pub id: Option<Uuid>,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl CommentAuthor {
    /// Identity shown in place of the author of a deleted comment.
    pub fn anonymous() -> Self {
        Self {
            id: None,
            username: DELETED_PLACEHOLDER.to_string(),
            avatar_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "visibility", rename_all = "lowercase")]
pub enum CommentView {
    Visible {
        content: String,
        author: CommentAuthor,
    },
    Redacted {
        content: &'static str,
        author: CommentAuthor,
    },
}

impl CommentView {
    pub fn redacted() -> Self {
        CommentView::Redacted {
            content: DELETED_PLACEHOLDER,
            author: CommentAuthor::anonymous(),
        }
    }

    pub fn is_redacted(&self) -> bool {
        matches!(self, CommentView::Redacted { .. })
    }

    pub fn content(&self) -> &str {
        match self {
            CommentView::Visible { content, .. } => content,
            CommentView::Redacted { content, .. } => content,
        }
    }

    pub fn author(&self) -> &CommentAuthor {
        match self {
            CommentView::Visible { author, .. } | CommentView::Redacted { author, .. } => author,
        }
    }
}

// Comment response with nested structure
#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    pub id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub view: CommentView,
    pub user_vote: Option<VoteState>,
    /// Set when replies exist but were not materialized.
    pub has_more_replies: bool,
    pub children: Vec<CommentNode>,
}

#[derive(Debug, Clone, Copy)]
pub struct ThreadQuery {
    pub page: PageRequest,
    pub max_depth: usize,
}

#[derive(Debug, Serialize)]
pub struct ThreadPage {
    pub post_id: Uuid,
    pub comments: Vec<CommentNode>,
    pub next_cursor: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct GetCommentsQuery {
    pub cursor: Option<Uuid>,
    pub limit: Option<u32>,
    pub sort: Option<SortOrder>,
}
