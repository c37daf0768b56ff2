use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    AppState,
    error::Result,
    identity::Actor,
    models::{Community, CreateCommunityRequest, Membership, SetMemberRoleRequest},
    services::{
        community_service,
        deletion_service::{self, DeleteTarget},
    },
};

pub async fn create_community(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreateCommunityRequest>,
) -> Result<(StatusCode, Json<Community>)> {
    let community =
        community_service::create_community(state.store.as_ref(), &actor, &payload).await?;

    Ok((StatusCode::CREATED, Json(community)))
}

pub async fn get_community(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
) -> Result<Json<Community>> {
    let community = community_service::get_community(state.store.as_ref(), community_id).await?;

    Ok(Json(community))
}

pub async fn get_community_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Community>> {
    let community = community_service::get_community_by_name(state.store.as_ref(), &name).await?;

    Ok(Json(community))
}

pub async fn join_community(
    State(state): State<AppState>,
    actor: Actor,
    Path(community_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Membership>)> {
    let membership =
        community_service::join_community(state.store.as_ref(), &actor, community_id).await?;

    Ok((StatusCode::CREATED, Json(membership)))
}

pub async fn set_member_role(
    State(state): State<AppState>,
    actor: Actor,
    Path((community_id, user_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SetMemberRoleRequest>,
) -> Result<Json<Membership>> {
    let membership = community_service::set_member_role(
        state.store.as_ref(),
        &actor,
        community_id,
        user_id,
        payload.role,
    )
    .await?;

    Ok(Json(membership))
}

pub async fn delete_community(
    State(state): State<AppState>,
    actor: Actor,
    Path(community_id): Path<Uuid>,
) -> Result<Json<Value>> {
    deletion_service::delete_target(
        state.store.as_ref(),
        &actor,
        DeleteTarget::Community(community_id),
    )
    .await?;

    Ok(Json(json!({
        "message": "Community deleted successfully"
    })))
}
