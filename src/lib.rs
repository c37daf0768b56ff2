pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod services;
pub mod store;

use axum::{
    Router,
    http::{
        HeaderName, HeaderValue, Method,
        header::{ACCEPT, CONTENT_TYPE},
    },
    routing::{get, post, put},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::Config, store::ForumStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ForumStore>,
    pub config: Arc<Config>,
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            ACCEPT,
            CONTENT_TYPE,
            HeaderName::from_static(identity::USER_ID_HEADER),
            HeaderName::from_static(identity::USERNAME_HEADER),
            HeaderName::from_static(identity::USER_ROLE_HEADER),
        ]);

    let routes = Router::new()
        // Community routes
        .route(
            "/api/communities",
            post(handlers::communities::create_community),
        )
        .route(
            "/api/communities/{community_id}",
            get(handlers::communities::get_community)
                .delete(handlers::communities::delete_community),
        )
        .route(
            "/api/communities/name/{name}",
            get(handlers::communities::get_community_by_name),
        )
        .route(
            "/api/communities/{community_id}/join",
            post(handlers::communities::join_community),
        )
        .route(
            "/api/communities/{community_id}/members/{user_id}",
            put(handlers::communities::set_member_role),
        )
        // Post routes
        .route(
            "/api/posts",
            get(handlers::posts::get_posts).post(handlers::posts::create_post),
        )
        .route(
            "/api/posts/{post_id}",
            get(handlers::posts::get_post)
                .put(handlers::posts::update_post)
                .delete(handlers::posts::delete_post),
        )
        .route(
            "/api/posts/{post_id}/vote",
            post(handlers::posts::vote_post),
        )
        .route(
            "/api/posts/{post_id}/comments",
            get(handlers::comments::get_post_comments),
        )
        // Comment routes
        .route("/api/comments", post(handlers::comments::create_comment))
        .route(
            "/api/comments/{comment_id}",
            get(handlers::comments::get_comment)
                .put(handlers::comments::update_comment)
                .delete(handlers::comments::delete_comment),
        )
        .route(
            "/api/comments/{comment_id}/vote",
            post(handlers::comments::vote_comment),
        );

    routes
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
