use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    AppState,
    error::Result,
    identity::{Actor, OptionalActor},
    models::{
        CreatePostRequest, GetPostsQuery, PageRequest, Post, PostFilter, PostPage,
        UpdatePostRequest, VoteIntent, VoteOutcome, VoteRequest, VoteTarget,
    },
    services::{
        deletion_service::{self, DeleteTarget},
        post_service, vote_service,
    },
};

pub async fn create_post(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let post = post_service::create_post(state.store.as_ref(), &actor, &payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Post created successfully",
            "post_id": post.id
        })),
    ))
}

pub async fn get_posts(
    State(state): State<AppState>,
    Query(params): Query<GetPostsQuery>,
    actor: OptionalActor,
) -> Result<Json<PostPage>> {
    let filter = PostFilter {
        community_id: params.community_id,
        author_id: params.author_id,
    };
    let page = PageRequest::new(params.cursor, params.limit, params.sort);

    let posts =
        post_service::list_posts(state.store.as_ref(), filter, actor.user_id(), page).await?;

    Ok(Json(posts))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Post>> {
    let post = post_service::get_post(state.store.as_ref(), post_id).await?;

    Ok(Json(post))
}

pub async fn update_post(
    State(state): State<AppState>,
    actor: Actor,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<Post>> {
    let post =
        post_service::edit_post_content(state.store.as_ref(), &actor, post_id, &payload).await?;

    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    actor: Actor,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Value>> {
    deletion_service::delete_target(state.store.as_ref(), &actor, DeleteTarget::Post(post_id))
        .await?;

    Ok(Json(json!({
        "message": "Post deleted successfully"
    })))
}

pub async fn vote_post(
    State(state): State<AppState>,
    actor: Actor,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<VoteOutcome>> {
    // Validate vote type
    let intent = VoteIntent::try_from(payload.vote_type)?;

    let outcome = vote_service::set_vote(
        state.store.as_ref(),
        actor.user_id,
        VoteTarget::post(post_id),
        intent,
    )
    .await?;

    Ok(Json(outcome))
}
