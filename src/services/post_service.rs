use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, Result},
    identity::Actor,
    models::{
        CreatePostRequest, PageRequest, Post, PostFilter, PostPage, PostResponse, PostType,
        UpdatePostRequest,
    },
    store::ForumStore,
};

pub async fn create_post(
    store: &dyn ForumStore,
    actor: &Actor,
    request: &CreatePostRequest,
) -> Result<Post> {
    request.validate()?;

    // Validate post content based on type
    let (content, media_urls) = match request.post_type {
        PostType::Text | PostType::Link => {
            if request.content.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "{:?} posts must have content",
                    request.post_type
                )));
            }
            (request.content.clone(), Vec::new())
        }
        PostType::Media => {
            if request.media_urls.is_empty() {
                return Err(AppError::Validation(
                    "Media posts must reference at least one uploaded file".to_string(),
                ));
            }
            (String::new(), request.media_urls.clone())
        }
    };

    store
        .find_community(request.community_id)
        .await?
        .filter(|community| !community.deleted)
        .ok_or_else(|| AppError::NotFound("Community not found".to_string()))?;

    let now = Utc::now();
    let post = Post {
        id: Uuid::new_v4(),
        title: request.title.clone(),
        content,
        post_type: request.post_type,
        media_urls,
        author_id: actor.user_id,
        community_id: request.community_id,
        score: 0,
        deleted: false,
        created_at: now,
        updated_at: now,
    };

    store.insert_post(&post).await?;
    info!(post_id = %post.id, community_id = %post.community_id, "post created");

    Ok(post)
}

pub async fn get_post(store: &dyn ForumStore, post_id: Uuid) -> Result<Post> {
    store
        .find_post(post_id)
        .await?
        .filter(|post| !post.deleted)
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
}

pub async fn edit_post_content(
    store: &dyn ForumStore,
    actor: &Actor,
    post_id: Uuid,
    request: &UpdatePostRequest,
) -> Result<Post> {
    if request.content.trim().is_empty() {
        return Err(AppError::Validation("Content cannot be empty".to_string()));
    }
    request.validate()?;

    let post = get_post(store, post_id).await?;

    if post.post_type == PostType::Media {
        return Err(AppError::Validation(
            "Editing media posts is not supported".to_string(),
        ));
    }

    if post.author_id != actor.user_id {
        return Err(AppError::Forbidden(
            "You can only edit your own posts".to_string(),
        ));
    }

    store.update_post_content(post_id, &request.content).await?;

    get_post(store, post_id).await
}

#[instrument(skip(store))]
pub async fn list_posts(
    store: &dyn ForumStore,
    filter: PostFilter,
    requester_id: Option<Uuid>,
    page: PageRequest,
) -> Result<PostPage> {
    let rows = store.list_posts(&filter, requester_id, &page).await?;
    let ids: Vec<Uuid> = rows.iter().map(|row| row.post.id).collect();

    Ok(PostPage {
        next_cursor: page.next_cursor(&ids),
        posts: rows.into_iter().map(PostResponse::from).collect(),
    })
}
