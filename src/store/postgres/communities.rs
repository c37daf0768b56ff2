use async_trait::async_trait;
use uuid::Uuid;

use super::PgStore;
use crate::{
    error::Result,
    models::{Community, CommunityRole},
    store::CommunityStore,
};

#[async_trait]
impl CommunityStore for PgStore {
    async fn insert_community(&self, community: &Community) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO communities (id, name, description, created_by, deleted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(community.id)
        .bind(&community.name)
        .bind(&community.description)
        .bind(community.created_by)
        .bind(community.deleted)
        .bind(community.created_at)
        .bind(community.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO community_memberships (id, user_id, community_id, role, joined_at)
            VALUES ($1, $2, $3, $4, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(community.created_by)
        .bind(community.id)
        .bind(CommunityRole::Admin)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn find_community(&self, community_id: Uuid) -> Result<Option<Community>> {
        let community = sqlx::query_as::<_, Community>(
            "SELECT id, name, description, created_by, deleted, created_at, updated_at FROM communities WHERE id = $1",
        )
        .bind(community_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(community)
    }

    async fn find_community_by_name(&self, name: &str) -> Result<Option<Community>> {
        let community = sqlx::query_as::<_, Community>(
            "SELECT id, name, description, created_by, deleted, created_at, updated_at FROM communities WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(community)
    }

    async fn community_role(
        &self,
        user_id: Uuid,
        community_id: Uuid,
    ) -> Result<Option<CommunityRole>> {
        let role = sqlx::query_scalar::<_, CommunityRole>(
            "SELECT role FROM community_memberships WHERE user_id = $1 AND community_id = $2",
        )
        .bind(user_id)
        .bind(community_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    async fn insert_membership(
        &self,
        user_id: Uuid,
        community_id: Uuid,
        role: CommunityRole,
    ) -> Result<()> {
        // A duplicate trips the (user_id, community_id) unique key and surfaces as Conflict.
        sqlx::query(
            r#"
            INSERT INTO community_memberships (id, user_id, community_id, role, joined_at)
            VALUES ($1, $2, $3, $4, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(community_id)
        .bind(role)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_membership_role(
        &self,
        user_id: Uuid,
        community_id: Uuid,
        role: CommunityRole,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE community_memberships SET role = $1 WHERE user_id = $2 AND community_id = $3",
        )
        .bind(role)
        .bind(user_id)
        .bind(community_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete_community(&self, community_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE communities SET deleted = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(community_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
