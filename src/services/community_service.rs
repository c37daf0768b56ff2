use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, Result},
    identity::Actor,
    models::{Community, CommunityRole, CreateCommunityRequest, Membership},
    store::ForumStore,
};

pub async fn create_community(
    store: &dyn ForumStore,
    actor: &Actor,
    request: &CreateCommunityRequest,
) -> Result<Community> {
    request.validate()?;

    if store.find_community_by_name(&request.name).await?.is_some() {
        return Err(AppError::Conflict(
            "This community name is already taken".to_string(),
        ));
    }

    let now = Utc::now();
    let community = Community {
        id: Uuid::new_v4(),
        name: request.name.clone(),
        description: request.description.clone(),
        created_by: actor.user_id,
        deleted: false,
        created_at: now,
        updated_at: now,
    };

    store.insert_community(&community).await?;
    info!(community_id = %community.id, name = %community.name, "community created");

    Ok(community)
}

pub async fn get_community(store: &dyn ForumStore, community_id: Uuid) -> Result<Community> {
    store
        .find_community(community_id)
        .await?
        .filter(|community| !community.deleted)
        .ok_or_else(|| AppError::NotFound("Community not found".to_string()))
}

pub async fn get_community_by_name(store: &dyn ForumStore, name: &str) -> Result<Community> {
    store
        .find_community_by_name(name)
        .await?
        .filter(|community| !community.deleted)
        .ok_or_else(|| AppError::NotFound("Community not found".to_string()))
}

/// Adds the actor to a community as a plain member.
pub async fn join_community(
    store: &dyn ForumStore,
    actor: &Actor,
    community_id: Uuid,
) -> Result<Membership> {
    get_community(store, community_id).await?;

    store
        .insert_membership(actor.user_id, community_id, CommunityRole::Member)
        .await?;
    info!(%community_id, user_id = %actor.user_id, "community joined");

    Ok(Membership {
        user_id: actor.user_id,
        community_id,
        role: CommunityRole::Member,
    })
}

/// Grants `role` to an existing member. Only community admins and site
/// admins may change roles.
#[instrument(skip(store, actor), fields(actor = %actor.user_id))]
pub async fn set_member_role(
    store: &dyn ForumStore,
    actor: &Actor,
    community_id: Uuid,
    user_id: Uuid,
    role: CommunityRole,
) -> Result<Membership> {
    get_community(store, community_id).await?;

    let actor_role = store.community_role(actor.user_id, community_id).await?;
    if !actor.is_site_admin() && actor_role != Some(CommunityRole::Admin) {
        return Err(AppError::Forbidden(
            "Only community admins can change member roles".to_string(),
        ));
    }

    if !store
        .update_membership_role(user_id, community_id, role)
        .await?
    {
        return Err(AppError::NotFound(
            "User is not a member of this community".to_string(),
        ));
    }
    info!(%community_id, %user_id, ?role, "member role changed");

    Ok(Membership {
        user_id,
        community_id,
        role,
    })
}

pub async fn community_role(
    store: &dyn ForumStore,
    user_id: Uuid,
    community_id: Uuid,
) -> Result<Option<CommunityRole>> {
    store.community_role(user_id, community_id).await
}
