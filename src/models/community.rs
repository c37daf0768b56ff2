use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "community_role", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum CommunityRole {
    Member,
    Moderator,
    Admin,
}

impl CommunityRole {
    /// Moderators and admins may remove other people's posts and comments.
    pub fn can_moderate(self) -> bool {
        matches!(self, CommunityRole::Moderator | CommunityRole::Admin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Community {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn validate_community_name(name: &str) -> Result<(), ValidationError> {
    let mut chars = name.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let allowed = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if starts_with_letter && allowed {
        Ok(())
    } else {
        let mut error = ValidationError::new("community_name");
        error.message = Some(
            "must start with a letter and contain only letters, numbers, underscores, or hyphens"
                .into(),
        );
        Err(error)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Membership {
    pub user_id: Uuid,
    pub community_id: Uuid,
    pub role: CommunityRole,
}

#[derive(Debug, Deserialize)]
pub struct SetMemberRoleRequest {
    pub role: CommunityRole,
}

// Create community request
#[derive(Debug, Validate, Deserialize)]
pub struct CreateCommunityRequest {
    #[validate(
        length(min = 3, max = 50),
        custom(function = "validate_community_name")
    )]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str) -> CreateCommunityRequest {
        CreateCommunityRequest {
            name: name.to_string(),
            description: None,
        }
    }

    #[test]
    fn community_names() {
        assert!(request("rustaceans").validate().is_ok());
        assert!(request("r_u-s7").validate().is_ok());
        assert!(request("7rust").validate().is_err());
        assert!(request("ru").validate().is_err());
        assert!(request("has space").validate().is_err());
    }

    #[test]
    fn only_moderators_and_admins_moderate() {
        assert!(!CommunityRole::Member.can_moderate());
        assert!(CommunityRole::Moderator.can_moderate());
        assert!(CommunityRole::Admin.can_moderate());
    }
}
