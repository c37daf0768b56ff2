use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{VoteAction, VoteCommit, VoteIntent, VoteOutcome, VoteState, VoteTarget},
    store::ForumStore,
};

/// Row mutation plus score delta for one vote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub action: VoteAction,
    pub delta: i32,
}

impl Transition {
    fn new(action: VoteAction, delta: i32) -> Self {
        Self { action, delta }
    }

    /// Vote state recorded once this transition is applied.
    pub fn resulting_state(&self, previous: Option<VoteState>) -> Option<VoteState> {
        match self.action {
            VoteAction::Create(state) | VoteAction::Update(state) => Some(state),
            VoteAction::Delete => None,
            VoteAction::Keep => previous,
        }
    }
}

/// Asking for the state already recorded toggles the vote off.
pub fn transition(previous: Option<VoteState>, requested: VoteIntent) -> Transition {
    use VoteIntent as I;
    use VoteState as S;

    match (previous, requested) {
        (None, I::Upvote) => Transition::new(VoteAction::Create(S::Upvote), 1),
        (None, I::Downvote) => Transition::new(VoteAction::Create(S::Downvote), -1),
        (None, I::Remove) => Transition::new(VoteAction::Keep, 0),
        (Some(S::Upvote), I::Upvote) => Transition::new(VoteAction::Delete, -1),
        (Some(S::Downvote), I::Downvote) => Transition::new(VoteAction::Delete, 1),
        (Some(S::Upvote), I::Downvote) => Transition::new(VoteAction::Update(S::Downvote), -2),
        (Some(S::Downvote), I::Upvote) => Transition::new(VoteAction::Update(S::Upvote), 2),
        (Some(S::Upvote), I::Remove) => Transition::new(VoteAction::Delete, -1),
        (Some(S::Downvote), I::Remove) => Transition::new(VoteAction::Delete, 1),
    }
}

/// Attempts before a vote that keeps racing the same user's other requests
/// gives up with a conflict.
const MAX_VOTE_ATTEMPTS: usize = 3;

/// Applies a user's vote intent to a post or comment.
///
/// The transition is computed from the state last seen for the user and the
/// store only commits it if that state is still recorded. A stale read is
/// retried against the state the store reports. The score change itself is a
/// relative increment, so votes from different users always compose.
#[instrument(skip(store))]
pub async fn set_vote(
    store: &dyn ForumStore,
    user_id: Uuid,
    target: VoteTarget,
    intent: VoteIntent,
) -> Result<VoteOutcome> {
    let votable = store
        .find_votable(target)
        .await?
        .filter(|votable| !votable.deleted)
        .ok_or_else(|| AppError::NotFound(format!("{:?} not found", target.kind)))?;

    let mut previous = store.find_vote(user_id, target).await?;

    for _ in 0..MAX_VOTE_ATTEMPTS {
        let step = transition(previous, intent);

        if step.action == VoteAction::Keep {
            return Ok(VoteOutcome {
                target,
                user_vote: previous,
                score: votable.score,
            });
        }

        match store
            .commit_vote(user_id, target, previous, step.action, step.delta)
            .await?
        {
            VoteCommit::Applied(score) => {
                debug!(?previous, action = ?step.action, delta = step.delta, score, "vote applied");
                return Ok(VoteOutcome {
                    target,
                    user_vote: step.resulting_state(previous),
                    score,
                });
            }
            VoteCommit::Stale(current) => {
                debug!(?previous, ?current, "vote state changed underneath, retrying");
                previous = current;
            }
        }
    }

    warn!(%user_id, ?target, "vote kept racing concurrent requests");
    Err(AppError::Conflict(
        "Vote changed concurrently, please retry".to_string(),
    ))
}

pub async fn find_vote_state(
    store: &dyn ForumStore,
    user_id: Uuid,
    target: VoteTarget,
) -> Result<Option<VoteState>> {
    store.find_vote(user_id, target).await
}
