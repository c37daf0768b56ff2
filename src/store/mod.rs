//! Persistence seams.
//!
//! Services only talk to [`ForumStore`]. [`postgres::PgStore`] is the
//! production backend; [`memory::MemoryStore`] keeps the same tables in
//! process and backs the test suite.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{
        Comment, CommentRow, Community, CommunityRole, PageRequest, Post, PostFilter, PostRow,
        SortOrder, Votable, VoteAction, VoteCommit, VoteState, VoteTarget,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Local mirror of upstream identities, needed for author joins.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Records the user if unseen. Existing rows are left as they are.
    async fn upsert_user(&self, user_id: Uuid, username: &str) -> Result<()>;
}

/// Vote rows and the score counters they feed.
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Score-carrying view of a post or comment, deleted rows included.
    async fn find_votable(&self, target: VoteTarget) -> Result<Option<Votable>>;

    async fn find_vote(&self, user_id: Uuid, target: VoteTarget) -> Result<Option<VoteState>>;

    /// Applies `action` to the vote row and adds `delta` to the target's score
    /// as one all-or-nothing unit, provided the user's recorded vote still
    /// equals `expected`. Writes on one target are serialized.
    async fn commit_vote(
        &self,
        user_id: Uuid,
        target: VoteTarget,
        expected: Option<VoteState>,
        action: VoteAction,
        delta: i32,
    ) -> Result<VoteCommit>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert_comment(&self, comment: &Comment) -> Result<()>;

    async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>>;

    async fn find_comment_row(
        &self,
        comment_id: Uuid,
        viewer_id: Option<Uuid>,
    ) -> Result<Option<CommentRow>>;

    /// One page of top-level comments of a post. Fails with a validation
    /// error when the cursor does not name a comment of that post.
    async fn root_comments(
        &self,
        post_id: Uuid,
        viewer_id: Option<Uuid>,
        page: &PageRequest,
    ) -> Result<Vec<CommentRow>>;

    /// Every direct child of every comment in `parent_ids`, in one round trip.
    async fn child_comments(
        &self,
        parent_ids: &[Uuid],
        viewer_id: Option<Uuid>,
        order: SortOrder,
    ) -> Result<Vec<CommentRow>>;

    async fn has_children(&self, comment_id: Uuid) -> Result<bool>;

    async fn update_comment_content(&self, comment_id: Uuid, content: &str) -> Result<()>;

    async fn soft_delete_comment(&self, comment_id: Uuid) -> Result<()>;

    /// Marks every comment of a post deleted. Returns the number of rows touched.
    async fn soft_delete_post_comments(&self, post_id: Uuid) -> Result<u64>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_post(&self, post: &Post) -> Result<()>;

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>>;

    /// Non-deleted posts matching `filter`, cursor-paginated.
    async fn list_posts(
        &self,
        filter: &PostFilter,
        viewer_id: Option<Uuid>,
        page: &PageRequest,
    ) -> Result<Vec<PostRow>>;

    async fn update_post_content(&self, post_id: Uuid, content: &str) -> Result<()>;

    async fn soft_delete_post(&self, post_id: Uuid) -> Result<()>;

    /// Marks every post of a community deleted, leaving their comments alone.
    async fn soft_delete_community_posts(&self, community_id: Uuid) -> Result<u64>;
}

#[async_trait]
pub trait CommunityStore: Send + Sync {
    /// Inserts the community and makes its creator an admin member.
    async fn insert_community(&self, community: &Community) -> Result<()>;

    async fn find_community(&self, community_id: Uuid) -> Result<Option<Community>>;

    async fn find_community_by_name(&self, name: &str) -> Result<Option<Community>>;

    async fn community_role(
        &self,
        user_id: Uuid,
        community_id: Uuid,
    ) -> Result<Option<CommunityRole>>;

    /// Adds a membership. An existing one is a conflict.
    async fn insert_membership(
        &self,
        user_id: Uuid,
        community_id: Uuid,
        role: CommunityRole,
    ) -> Result<()>;

    /// Changes the role of an existing member. Returns `false` when the user
    /// holds no membership.
    async fn update_membership_role(
        &self,
        user_id: Uuid,
        community_id: Uuid,
        role: CommunityRole,
    ) -> Result<bool>;

    async fn soft_delete_community(&self, community_id: Uuid) -> Result<()>;
}

/// Everything the services need from persistence.
pub trait ForumStore: UserStore + VoteStore + CommentStore + PostStore + CommunityStore {}

impl<T> ForumStore for T where
    T: UserStore + VoteStore + CommentStore + PostStore + CommunityStore
{
}
