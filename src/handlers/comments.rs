use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    AppState,
    error::Result,
    identity::{Actor, OptionalActor},
    models::{
        CommentNode, CreateCommentRequest, GetCommentsQuery, PageRequest, ThreadPage,
        ThreadQuery, UpdateCommentRequest, VoteIntent, VoteOutcome, VoteRequest, VoteTarget,
    },
    services::{
        comment_service,
        deletion_service::{self, DeleteTarget},
        vote_service,
    },
};

pub async fn create_comment(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<CommentNode>> {
    let comment = comment_service::create_comment(state.store.as_ref(), &actor, &payload).await?;

    Ok(Json(comment))
}

pub async fn get_post_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Query(params): Query<GetCommentsQuery>,
    actor: OptionalActor,
) -> Result<Json<ThreadPage>> {
    let query = ThreadQuery {
        page: PageRequest::new(
            params.cursor,
            Some(params.limit.unwrap_or(state.config.thread_page_size)),
            params.sort,
        ),
        max_depth: state.config.max_thread_depth,
    };

    let thread =
        comment_service::get_thread(state.store.as_ref(), post_id, actor.user_id(), query).await?;

    Ok(Json(thread))
}

pub async fn get_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    actor: OptionalActor,
) -> Result<Json<CommentNode>> {
    let comment =
        comment_service::get_comment(state.store.as_ref(), comment_id, actor.user_id()).await?;

    Ok(Json(comment))
}

pub async fn update_comment(
    State(state): State<AppState>,
    actor: Actor,
    Path(comment_id): Path<Uuid>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<Json<CommentNode>> {
    let comment =
        comment_service::edit_comment(state.store.as_ref(), &actor, comment_id, &payload).await?;

    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    actor: Actor,
    Path(comment_id): Path<Uuid>,
) -> Result<Json<Value>> {
    deletion_service::delete_target(
        state.store.as_ref(),
        &actor,
        DeleteTarget::Comment(comment_id),
    )
    .await?;

    Ok(Json(json!({
        "message": "Comment deleted successfully"
    })))
}

pub async fn vote_comment(
    State(state): State<AppState>,
    actor: Actor,
    Path(comment_id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<VoteOutcome>> {
    // Validate vote type
    let intent = VoteIntent::try_from(payload.vote_type)?;

    let outcome = vote_service::set_vote(
        state.store.as_ref(),
        actor.user_id,
        VoteTarget::comment(comment_id),
        intent,
    )
    .await?;

    Ok(Json(outcome))
}
