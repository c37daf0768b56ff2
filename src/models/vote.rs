use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// A recorded vote. Absence of a row means "no vote".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteState {
    Upvote,
    Downvote,
}

impl VoteState {
    /// Column value in `post_votes.vote_type` / `comment_votes.vote_type`.
    pub fn as_i16(self) -> i16 {
        match self {
            VoteState::Upvote => 1,
            VoteState::Downvote => -1,
        }
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(VoteState::Upvote),
            -1 => Some(VoteState::Downvote),
            _ => None,
        }
    }
}

/// What the voter asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteIntent {
    Upvote,
    Downvote,
    Remove,
}

impl TryFrom<i16> for VoteIntent {
    type Error = AppError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteIntent::Upvote),
            -1 => Ok(VoteIntent::Downvote),
            0 => Ok(VoteIntent::Remove),
            other => Err(AppError::InvalidState(format!(
                "vote_type must be -1, 0 or 1, got {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Post,
    Comment,
}

impl TargetKind {
    pub(crate) fn table(self) -> &'static str {
        match self {
            TargetKind::Post => "posts",
            TargetKind::Comment => "comments",
        }
    }

    pub(crate) fn vote_table(self) -> &'static str {
        match self {
            TargetKind::Post => "post_votes",
            TargetKind::Comment => "comment_votes",
        }
    }

    pub(crate) fn vote_column(self) -> &'static str {
        match self {
            TargetKind::Post => "post_id",
            TargetKind::Comment => "comment_id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoteTarget {
    pub kind: TargetKind,
    pub id: Uuid,
}

impl VoteTarget {
    pub fn post(id: Uuid) -> Self {
        Self {
            kind: TargetKind::Post,
            id,
        }
    }

    pub fn comment(id: Uuid) -> Self {
        Self {
            kind: TargetKind::Comment,
            id,
        }
    }
}

/// The score-carrying part of a post or comment.
#[derive(Debug, Clone)]
pub struct Votable {
    pub target: VoteTarget,
    pub score: i32,
    pub author_id: Uuid,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutation applied to the (user, target) vote row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteAction {
    Create(VoteState),
    Update(VoteState),
    Delete,
    Keep,
}

// Vote request
/// Result of a guarded vote write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteCommit {
    /// Both writes landed; carries the new score.
    Applied(i32),
    /// The recorded state no longer matched the caller's. Nothing was written.
    Stale(Option<VoteState>),
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub vote_type: i16, // -1 for downvote, 0 for remove vote, 1 for upvote
}

// Vote response
#[derive(Debug, Clone, Serialize)]
pub struct VoteOutcome {
    pub target: VoteTarget,
    pub user_vote: Option<VoteState>,
    pub score: i32,
}
