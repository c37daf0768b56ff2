use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    identity::Actor,
    models::CommunityRole,
    services::community_service,
    store::ForumStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    Post(Uuid),
    Comment(Uuid),
    Community(Uuid),
}

/// Author, community moderator/admin, or site admin.
async fn can_remove_content(
    store: &dyn ForumStore,
    actor: &Actor,
    author_id: Uuid,
    community_id: Uuid,
) -> Result<bool> {
    if actor.user_id == author_id || actor.is_site_admin() {
        return Ok(true);
    }

    let role = community_service::community_role(store, actor.user_id, community_id).await?;
    Ok(role.is_some_and(CommunityRole::can_moderate))
}

/// Soft-deletes a post, comment or community on behalf of `actor`.
///
/// Deleting a post also marks its comments; deleting a community marks its
/// posts but leaves their comments for the caller to cascade explicitly.
#[instrument(skip(store, actor), fields(actor = %actor.user_id))]
pub async fn delete_target(
    store: &dyn ForumStore,
    actor: &Actor,
    target: DeleteTarget,
) -> Result<()> {
    match target {
        DeleteTarget::Post(post_id) => delete_post(store, actor, post_id).await,
        DeleteTarget::Comment(comment_id) => delete_comment(store, actor, comment_id).await,
        DeleteTarget::Community(community_id) => {
            delete_community(store, actor, community_id).await
        }
    }
}

async fn delete_post(store: &dyn ForumStore, actor: &Actor, post_id: Uuid) -> Result<()> {
    let post = store
        .find_post(post_id)
        .await?
        .filter(|post| !post.deleted)
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    if !can_remove_content(store, actor, post.author_id, post.community_id).await? {
        return Err(AppError::Forbidden("Cannot delete this post".to_string()));
    }

    store.soft_delete_post(post_id).await?;
    let comments = store.soft_delete_post_comments(post_id).await?;

    info!(%post_id, comments, "post deleted");
    Ok(())
}

async fn delete_comment(store: &dyn ForumStore, actor: &Actor, comment_id: Uuid) -> Result<()> {
    let comment = store
        .find_comment(comment_id)
        .await?
        .filter(|comment| !comment.deleted)
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    let post = store
        .find_post(comment.post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    if !can_remove_content(store, actor, comment.author_id, post.community_id).await? {
        return Err(AppError::Forbidden(
            "You cannot delete this comment".to_string(),
        ));
    }

    store.soft_delete_comment(comment_id).await?;

    info!(%comment_id, "comment deleted");
    Ok(())
}

async fn delete_community(
    store: &dyn ForumStore,
    actor: &Actor,
    community_id: Uuid,
) -> Result<()> {
    community_service::get_community(store, community_id).await?;

    let role = community_service::community_role(store, actor.user_id, community_id).await?;
    if !actor.is_site_admin() && role != Some(CommunityRole::Admin) {
        return Err(AppError::Forbidden(
            "Cannot delete this community".to_string(),
        ));
    }

    store.soft_delete_community(community_id).await?;
    let posts = store.soft_delete_community_posts(community_id).await?;

    info!(%community_id, posts, "community deleted");
    Ok(())
}
