use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{SortOrder, VoteState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "post_type", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum PostType {
    Text,
    Link,
    Media,
}

impl FromStr for PostType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" | "TEXT" => Ok(PostType::Text),
            "link" | "LINK" => Ok(PostType::Link),
            "media" | "MEDIA" => Ok(PostType::Media),
            _ => Err(format!("Unknown PostType: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub post_type: PostType,
    pub media_urls: Vec<String>,
    pub author_id: Uuid,
    pub community_id: Uuid,
    pub score: i32,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post joined with listing data, as read from the store.
#[derive(Debug, Clone)]
pub struct PostRow {
    pub post: Post,
    pub author_username: String,
    pub comment_count: i64,
    pub user_vote: Option<VoteState>,
}

// Create post request
#[derive(Debug, Validate, Deserialize)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub post_type: PostType,
    pub community_id: Uuid,
    /// References to files the upload layer already stored.
    #[serde(default)]
    pub media_urls: Vec<String>,
}

// Update post request
#[derive(Debug, Validate, Deserialize)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 40000))]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetPostsQuery {
    pub community_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub cursor: Option<Uuid>,
    pub limit: Option<u32>,
    pub sort: Option<SortOrder>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostFilter {
    pub community_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub post_type: PostType,
    pub media_urls: Vec<String>,
    pub author_id: Uuid,
    pub author_username: String,
    pub community_id: Uuid,
    pub score: i32,
    pub comment_count: i64,
    pub user_vote: Option<VoteState>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PostRow> for PostResponse {
    fn from(row: PostRow) -> Self {
        let PostRow {
            post,
            author_username,
            comment_count,
            user_vote,
        } = row;
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            post_type: post.post_type,
            media_urls: post.media_urls,
            author_id: post.author_id,
            author_username,
            community_id: post.community_id,
            score: post.score,
            comment_count,
            user_vote,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostPage {
    pub posts: Vec<PostResponse>,
    pub next_cursor: Option<Uuid>,
}
