use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        Comment, CommentRow, Community, CommunityRole, PageRequest, Post, PostFilter, PostRow,
        SortOrder, TargetKind, Votable, VoteAction, VoteCommit, VoteState, VoteTarget,
    },
    store::{CommentStore, CommunityStore, PostStore, UserStore, VoteStore},
};

type SortKey = (i32, DateTime<Utc>, Uuid);

fn sort_key(order: SortOrder, score: i32, created_at: DateTime<Utc>, id: Uuid) -> SortKey {
    match order {
        SortOrder::New => (0, created_at, id),
        SortOrder::Top => (score, created_at, id),
    }
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, (String, Option<String>)>,
    communities: HashMap<Uuid, Community>,
    memberships: HashMap<(Uuid, Uuid), CommunityRole>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
    votes: HashMap<(Uuid, VoteTarget), VoteState>,
}

impl Tables {
    fn score_mut(&mut self, target: VoteTarget) -> Option<&mut i32> {
        match target.kind {
            TargetKind::Post => self.posts.get_mut(&target.id).map(|post| &mut post.score),
            TargetKind::Comment => self
                .comments
                .get_mut(&target.id)
                .map(|comment| &mut comment.score),
        }
    }

    fn author(&self, user_id: Uuid) -> (String, Option<String>) {
        self.users
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| (user_id.to_string(), None))
    }

    fn comment_row(&self, comment: &Comment, viewer_id: Option<Uuid>) -> CommentRow {
        let (author_username, author_avatar_url) = self.author(comment.author_id);
        CommentRow {
            comment: comment.clone(),
            author_username,
            author_avatar_url,
            user_vote: viewer_id
                .and_then(|user| self.votes.get(&(user, VoteTarget::comment(comment.id))))
                .copied(),
        }
    }

    fn post_row(&self, post: &Post, viewer_id: Option<Uuid>) -> PostRow {
        let comment_count = self
            .comments
            .values()
            .filter(|comment| comment.post_id == post.id && !comment.deleted)
            .count() as i64;
        PostRow {
            post: post.clone(),
            author_username: self.author(post.author_id).0,
            comment_count,
            user_vote: viewer_id
                .and_then(|user| self.votes.get(&(user, VoteTarget::post(post.id))))
                .copied(),
        }
    }
}

/// In-process [`ForumStore`](crate::store::ForumStore). A single lock guards
/// all tables, so every trait call is atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded vote rows on a target.
    pub async fn vote_count(&self, target: VoteTarget) -> usize {
        self.tables
            .read()
            .await
            .votes
            .keys()
            .filter(|(_, voted)| *voted == target)
            .count()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn upsert_user(&self, user_id: Uuid, username: &str) -> Result<()> {
        self.tables
            .write()
            .await
            .users
            .entry(user_id)
            .or_insert_with(|| (username.to_string(), None));
        Ok(())
    }
}

#[async_trait]
impl VoteStore for MemoryStore {
    async fn find_votable(&self, target: VoteTarget) -> Result<Option<Votable>> {
        let tables = self.tables.read().await;
        let votable = match target.kind {
            TargetKind::Post => tables.posts.get(&target.id).map(|post| Votable {
                target,
                score: post.score,
                author_id: post.author_id,
                deleted: post.deleted,
                created_at: post.created_at,
                updated_at: post.updated_at,
            }),
            TargetKind::Comment => tables.comments.get(&target.id).map(|comment| Votable {
                target,
                score: comment.score,
                author_id: comment.author_id,
                deleted: comment.deleted,
                created_at: comment.created_at,
                updated_at: comment.updated_at,
            }),
        };
        Ok(votable)
    }

    async fn find_vote(&self, user_id: Uuid, target: VoteTarget) -> Result<Option<VoteState>> {
        Ok(self.tables.read().await.votes.get(&(user_id, target)).copied())
    }

    async fn commit_vote(
        &self,
        user_id: Uuid,
        target: VoteTarget,
        expected: Option<VoteState>,
        action: VoteAction,
        delta: i32,
    ) -> Result<VoteCommit> {
        let mut tables = self.tables.write().await;

        // Resolve the target first so a missing row leaves the votes untouched.
        if tables.score_mut(target).is_none() {
            return Err(AppError::NotFound(format!("{:?} not found", target.kind)));
        }

        let current = tables.votes.get(&(user_id, target)).copied();
        if current != expected {
            return Ok(VoteCommit::Stale(current));
        }

        match action {
            VoteAction::Create(state) | VoteAction::Update(state) => {
                tables.votes.insert((user_id, target), state);
            }
            VoteAction::Delete => {
                tables.votes.remove(&(user_id, target));
            }
            VoteAction::Keep => {}
        }

        let score = tables
            .score_mut(target)
            .ok_or_else(|| AppError::NotFound(format!("{:?} not found", target.kind)))?;
        *score += delta;
        Ok(VoteCommit::Applied(*score))
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.comments.contains_key(&comment.id) {
            return Err(AppError::Conflict("Comment already exists".to_string()));
        }
        tables.comments.insert(comment.id, comment.clone());
        Ok(())
    }

    async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        Ok(self.tables.read().await.comments.get(&comment_id).cloned())
    }

    async fn find_comment_row(
        &self,
        comment_id: Uuid,
        viewer_id: Option<Uuid>,
    ) -> Result<Option<CommentRow>> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .get(&comment_id)
            .map(|comment| tables.comment_row(comment, viewer_id)))
    }

    async fn root_comments(
        &self,
        post_id: Uuid,
        viewer_id: Option<Uuid>,
        page: &PageRequest,
    ) -> Result<Vec<CommentRow>> {
        let tables = self.tables.read().await;
        let key = |c: &Comment| sort_key(page.order, c.score, c.created_at, c.id);

        let cursor_key = match page.cursor {
            Some(cursor) => Some(
                tables
                    .comments
                    .get(&cursor)
                    .filter(|c| c.post_id == post_id && c.parent_id.is_none())
                    .map(key)
                    .ok_or_else(|| AppError::Validation("Unknown cursor".to_string()))?,
            ),
            None => None,
        };

        let mut roots: Vec<&Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id && c.parent_id.is_none())
            .filter(|c| cursor_key.is_none_or(|cursor| key(*c) < cursor))
            .collect();
        roots.sort_by_key(|c| std::cmp::Reverse(key(*c)));

        Ok(roots
            .into_iter()
            .take(page.limit as usize)
            .map(|c| tables.comment_row(c, viewer_id))
            .collect())
    }

    async fn child_comments(
        &self,
        parent_ids: &[Uuid],
        viewer_id: Option<Uuid>,
        order: SortOrder,
    ) -> Result<Vec<CommentRow>> {
        let tables = self.tables.read().await;

        let mut children: Vec<&Comment> = tables
            .comments
            .values()
            .filter(|c| c.parent_id.is_some_and(|parent| parent_ids.contains(&parent)))
            .collect();
        children.sort_by_key(|c| std::cmp::Reverse(sort_key(order, c.score, c.created_at, c.id)));

        Ok(children
            .into_iter()
            .map(|c| tables.comment_row(c, viewer_id))
            .collect())
    }

    async fn has_children(&self, comment_id: Uuid) -> Result<bool> {
        Ok(self
            .tables
            .read()
            .await
            .comments
            .values()
            .any(|c| c.parent_id == Some(comment_id)))
    }

    async fn update_comment_content(&self, comment_id: Uuid, content: &str) -> Result<()> {
        if let Some(comment) = self.tables.write().await.comments.get_mut(&comment_id) {
            comment.content = content.to_string();
            comment.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn soft_delete_comment(&self, comment_id: Uuid) -> Result<()> {
        if let Some(comment) = self.tables.write().await.comments.get_mut(&comment_id) {
            comment.deleted = true;
            comment.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn soft_delete_post_comments(&self, post_id: Uuid) -> Result<u64> {
        let now = Utc::now();
        let mut touched = 0;
        for comment in self.tables.write().await.comments.values_mut() {
            if comment.post_id == post_id && !comment.deleted {
                comment.deleted = true;
                comment.updated_at = now;
                touched += 1;
            }
        }
        Ok(touched)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert_post(&self, post: &Post) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.posts.contains_key(&post.id) {
            return Err(AppError::Conflict("Post already exists".to_string()));
        }
        tables.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        Ok(self.tables.read().await.posts.get(&post_id).cloned())
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        viewer_id: Option<Uuid>,
        page: &PageRequest,
    ) -> Result<Vec<PostRow>> {
        let tables = self.tables.read().await;
        let key = |p: &Post| sort_key(page.order, p.score, p.created_at, p.id);

        let cursor_key = match page.cursor {
            Some(cursor) => Some(
                tables
                    .posts
                    .get(&cursor)
                    .map(key)
                    .ok_or_else(|| AppError::Validation("Unknown cursor".to_string()))?,
            ),
            None => None,
        };

        let mut posts: Vec<&Post> = tables
            .posts
            .values()
            .filter(|p| !p.deleted)
            .filter(|p| filter.community_id.is_none_or(|id| p.community_id == id))
            .filter(|p| filter.author_id.is_none_or(|id| p.author_id == id))
            .filter(|p| cursor_key.is_none_or(|cursor| key(*p) < cursor))
            .collect();
        posts.sort_by_key(|p| std::cmp::Reverse(key(*p)));

        Ok(posts
            .into_iter()
            .take(page.limit as usize)
            .map(|p| tables.post_row(p, viewer_id))
            .collect())
    }

    async fn update_post_content(&self, post_id: Uuid, content: &str) -> Result<()> {
        if let Some(post) = self.tables.write().await.posts.get_mut(&post_id) {
            post.content = content.to_string();
            post.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn soft_delete_post(&self, post_id: Uuid) -> Result<()> {
        if let Some(post) = self.tables.write().await.posts.get_mut(&post_id) {
            post.deleted = true;
            post.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn soft_delete_community_posts(&self, community_id: Uuid) -> Result<u64> {
        let now = Utc::now();
        let mut touched = 0;
        for post in self.tables.write().await.posts.values_mut() {
            if post.community_id == community_id && !post.deleted {
                post.deleted = true;
                post.updated_at = now;
                touched += 1;
            }
        }
        Ok(touched)
    }
}

#[async_trait]
impl CommunityStore for MemoryStore {
    async fn insert_community(&self, community: &Community) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables
            .communities
            .values()
            .any(|existing| existing.name == community.name)
        {
            return Err(AppError::Conflict(
                "Community name already taken".to_string(),
            ));
        }
        tables.communities.insert(community.id, community.clone());
        tables
            .memberships
            .insert((community.created_by, community.id), CommunityRole::Admin);
        Ok(())
    }

    async fn find_community(&self, community_id: Uuid) -> Result<Option<Community>> {
        Ok(self
            .tables
            .read()
            .await
            .communities
            .get(&community_id)
            .cloned())
    }

    async fn find_community_by_name(&self, name: &str) -> Result<Option<Community>> {
        Ok(self
            .tables
            .read()
            .await
            .communities
            .values()
            .find(|community| community.name == name)
            .cloned())
    }

    async fn community_role(
        &self,
        user_id: Uuid,
        community_id: Uuid,
    ) -> Result<Option<CommunityRole>> {
        Ok(self
            .tables
            .read()
            .await
            .memberships
            .get(&(user_id, community_id))
            .copied())
    }

    async fn insert_membership(
        &self,
        user_id: Uuid,
        community_id: Uuid,
        role: CommunityRole,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.memberships.contains_key(&(user_id, community_id)) {
            return Err(AppError::Conflict(
                "User is already a member of this community".to_string(),
            ));
        }
        tables.memberships.insert((user_id, community_id), role);
        Ok(())
    }

    async fn update_membership_role(
        &self,
        user_id: Uuid,
        community_id: Uuid,
        role: CommunityRole,
    ) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(match tables.memberships.get_mut(&(user_id, community_id)) {
            Some(current) => {
                *current = role;
                true
            }
            None => false,
        })
    }

    async fn soft_delete_community(&self, community_id: Uuid) -> Result<()> {
        if let Some(community) = self
            .tables
            .write()
            .await
            .communities
            .get_mut(&community_id)
        {
            community.deleted = true;
            community.updated_at = Utc::now();
        }
        Ok(())
    }
}
