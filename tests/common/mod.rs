#![allow(dead_code)]

use forum_engine::{
    identity::{Actor, SiteRole},
    models::{
        Community, CreateCommentRequest, CreateCommunityRequest, CreatePostRequest, Post,
        PostType,
    },
    services::{comment_service, community_service, post_service},
    store::{MemoryStore, UserStore},
};
use uuid::Uuid;

/// A store seeded with one community and one text post, both owned by `owner`.
pub struct Forum {
    pub store: MemoryStore,
    pub owner: Actor,
    pub community: Community,
    pub post: Post,
}

pub async fn user(store: &MemoryStore, username: &str) -> Actor {
    let actor = Actor::new(Uuid::new_v4(), username, SiteRole::Member);
    store
        .upsert_user(actor.user_id, username)
        .await
        .expect("Failed to register user");
    actor
}

pub async fn forum() -> Forum {
    let store = MemoryStore::new();
    let owner = user(&store, "owner").await;

    let community = community_service::create_community(
        &store,
        &owner,
        &CreateCommunityRequest {
            name: "rustaceans".to_string(),
            description: Some("Everything Rust".to_string()),
        },
    )
    .await
    .expect("Failed to create community");

    let post = post_service::create_post(
        &store,
        &owner,
        &CreatePostRequest {
            title: "Borrow checker tips".to_string(),
            content: "Share yours".to_string(),
            post_type: PostType::Text,
            community_id: community.id,
            media_urls: Vec::new(),
        },
    )
    .await
    .expect("Failed to create post");

    Forum {
        store,
        owner,
        community,
        post,
    }
}

pub async fn reply(
    store: &MemoryStore,
    actor: &Actor,
    post_id: Uuid,
    parent_id: Option<Uuid>,
    content: &str,
) -> Uuid {
    comment_service::create_comment(
        store,
        actor,
        &CreateCommentRequest {
            content: content.to_string(),
            post_id,
            parent_id,
        },
    )
    .await
    .expect("Failed to create comment")
    .id
}
