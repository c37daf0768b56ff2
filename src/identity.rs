use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AppState,
    error::{AppError, Result},
};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USERNAME_HEADER: &str = "x-username";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Width of the local `users.username` column.
pub const MAX_USERNAME_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SiteRole {
    #[default]
    Member,
    Moderator,
    Admin,
}

impl std::str::FromStr for SiteRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "member" => Ok(SiteRole::Member),
            "moderator" => Ok(SiteRole::Moderator),
            "admin" => Ok(SiteRole::Admin),
            _ => Err(AppError::Authentication(format!("Unknown role: {}", s))),
        }
    }
}

/// Identity resolved by the upstream authentication layer.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    pub username: String,
    pub role: SiteRole,
}

impl Actor {
    pub fn new(user_id: Uuid, username: impl Into<String>, role: SiteRole) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
        }
    }

    pub fn is_site_admin(&self) -> bool {
        self.role == SiteRole::Admin
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|value| value.to_str().ok())
}

fn actor_from_headers(parts: &Parts) -> Result<Actor> {
    let user_id = header(parts, USER_ID_HEADER)
        .ok_or_else(|| AppError::Authentication("Missing user identity".to_string()))?;
    let user_id = Uuid::parse_str(user_id)
        .map_err(|_| AppError::Authentication("Invalid user ID".to_string()))?;

    let username = match header(parts, USERNAME_HEADER) {
        Some(name) if !name.trim().is_empty() => {
            name.trim().chars().take(MAX_USERNAME_CHARS).collect()
        }
        _ => user_id.to_string(),
    };
    let role = match header(parts, USER_ROLE_HEADER) {
        Some(role) => role.parse()?,
        None => SiteRole::default(),
    };

    Ok(Actor {
        user_id,
        username,
        role,
    })
}

/// Write endpoints: the identity is mirrored into the store before the
/// handler runs so authored rows can reference it.
impl FromRequestParts<AppState> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let actor = actor_from_headers(parts)?;
        state
            .store
            .upsert_user(actor.user_id, &actor.username)
            .await?;

        Ok(actor)
    }
}

// Optional actor (for endpoints that work with or without identity)
#[derive(Debug)]
pub struct OptionalActor(pub Option<Actor>);

impl OptionalActor {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|actor| actor.user_id)
    }
}

impl FromRequestParts<AppState> for OptionalActor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self> {
        Ok(OptionalActor(actor_from_headers(parts).ok()))
    }
}
