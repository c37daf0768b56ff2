use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, Result},
    identity::Actor,
    models::{
        Comment, CommentAuthor, CommentNode, CommentRow, CommentView, CreateCommentRequest,
        ThreadPage, ThreadQuery, UpdateCommentRequest,
    },
    store::ForumStore,
};

/// What a reader is allowed to see of a comment. Deleted comments keep their
/// row, but content and author never leave the store.
pub fn comment_view(row: &CommentRow) -> CommentView {
    if row.comment.deleted {
        return CommentView::redacted();
    }

    CommentView::Visible {
        content: row.comment.content.clone(),
        author: CommentAuthor {
            id: Some(row.comment.author_id),
            username: row.author_username.clone(),
            avatar_url: row.author_avatar_url.clone(),
        },
    }
}

fn into_node(row: CommentRow, children: Vec<CommentNode>, has_more_replies: bool) -> CommentNode {
    let view = comment_view(&row);
    let comment = row.comment;
    CommentNode {
        id: comment.id,
        post_id: comment.post_id,
        parent_id: comment.parent_id,
        score: comment.score,
        created_at: comment.created_at,
        updated_at: comment.updated_at,
        view,
        user_vote: row.user_vote,
        has_more_replies,
        children,
    }
}

/// Nests level-ordered rows under their parents. `levels[0]` holds the roots;
/// every row in `levels[n + 1]` has its parent in `levels[n]`. Sibling order
/// within each level is preserved.
fn assemble(levels: Vec<Vec<CommentRow>>, truncated: &HashSet<Uuid>) -> Vec<CommentNode> {
    let mut pending: HashMap<Uuid, Vec<CommentNode>> = HashMap::new();
    let mut roots = Vec::new();

    for level in levels.into_iter().rev() {
        let mut parents: HashMap<Uuid, Vec<CommentNode>> = HashMap::new();

        for row in level {
            let id = row.comment.id;
            let children = pending.remove(&id).unwrap_or_default();
            let node = into_node(row, children, truncated.contains(&id));

            match node.parent_id {
                Some(parent_id) => parents.entry(parent_id).or_default().push(node),
                None => roots.push(node),
            }
        }

        pending = parents;
    }

    roots
}

/// Loads one page of a post's comment forest, nested to at most
/// `query.max_depth` levels below the roots.
///
/// Issues one query for the roots and then one per tree level, sequentially.
/// Nodes whose replies fall past the depth bound come back with
/// `has_more_replies` set instead of failing the read.
#[instrument(skip(store))]
pub async fn get_thread(
    store: &dyn ForumStore,
    post_id: Uuid,
    requester_id: Option<Uuid>,
    query: ThreadQuery,
) -> Result<ThreadPage> {
    store
        .find_post(post_id)
        .await?
        .filter(|post| !post.deleted)
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let page = query.page;
    let roots = store.root_comments(post_id, requester_id, &page).await?;
    let root_ids: Vec<Uuid> = roots.iter().map(|row| row.comment.id).collect();
    let next_cursor = page.next_cursor(&root_ids);

    let mut levels = vec![roots];
    let mut truncated = HashSet::new();

    loop {
        let frontier: Vec<Uuid> = levels
            .last()
            .map(|level| level.iter().map(|row| row.comment.id).collect())
            .unwrap_or_default();
        if frontier.is_empty() {
            break;
        }

        let children = store
            .child_comments(&frontier, requester_id, page.order)
            .await?;
        if children.is_empty() {
            break;
        }

        if levels.len() > query.max_depth {
            truncated.extend(children.iter().filter_map(|row| row.comment.parent_id));
            warn!(
                %post_id,
                max_depth = query.max_depth,
                "comment thread truncated at depth bound"
            );
            break;
        }

        levels.push(children);
    }

    Ok(ThreadPage {
        post_id,
        comments: assemble(levels, &truncated),
        next_cursor,
    })
}

/// Single comment, without descending into its replies.
#[instrument(skip(store))]
pub async fn get_comment(
    store: &dyn ForumStore,
    comment_id: Uuid,
    requester_id: Option<Uuid>,
) -> Result<CommentNode> {
    let row = store
        .find_comment_row(comment_id, requester_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    let has_replies = store.has_children(comment_id).await?;

    Ok(into_node(row, Vec::new(), has_replies))
}

pub async fn create_comment(
    store: &dyn ForumStore,
    actor: &Actor,
    request: &CreateCommentRequest,
) -> Result<CommentNode> {
    request.validate()?;

    store
        .find_post(request.post_id)
        .await?
        .filter(|post| !post.deleted)
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    // A parent must already exist on the same post, which keeps the forest acyclic.
    if let Some(parent_id) = request.parent_id {
        let parent = store
            .find_comment(parent_id)
            .await?
            .filter(|parent| !parent.deleted)
            .ok_or_else(|| AppError::NotFound("Parent comment not found".to_string()))?;

        if parent.post_id != request.post_id {
            return Err(AppError::Validation(
                "Parent comment is not on the same post".to_string(),
            ));
        }
    }

    let now = Utc::now();
    let comment = Comment {
        id: Uuid::new_v4(),
        content: request.content.clone(),
        post_id: request.post_id,
        author_id: actor.user_id,
        parent_id: request.parent_id,
        deleted: false,
        score: 0,
        created_at: now,
        updated_at: now,
    };

    store.insert_comment(&comment).await?;
    info!(comment_id = %comment.id, post_id = %comment.post_id, "comment created");

    get_comment(store, comment.id, Some(actor.user_id)).await
}

pub async fn edit_comment(
    store: &dyn ForumStore,
    actor: &Actor,
    comment_id: Uuid,
    request: &UpdateCommentRequest,
) -> Result<CommentNode> {
    if request.content.trim().is_empty() {
        return Err(AppError::Validation("Content cannot be empty".to_string()));
    }
    request.validate()?;

    let comment = store
        .find_comment(comment_id)
        .await?
        .filter(|comment| !comment.deleted)
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    if comment.author_id != actor.user_id {
        return Err(AppError::Forbidden(
            "You can only edit your own comments".to_string(),
        ));
    }

    store
        .update_comment_content(comment_id, &request.content)
        .await?;

    get_comment(store, comment_id, Some(actor.user_id)).await
}
