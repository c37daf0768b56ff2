use async_trait::async_trait;
use uuid::Uuid;

use super::PgStore;
use crate::{error::Result, store::UserStore};

#[async_trait]
impl UserStore for PgStore {
    async fn upsert_user(&self, user_id: Uuid, username: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, created_at) VALUES ($1, $2, NOW()) ON CONFLICT (id) DO NOTHING",
        )
        .bind(user_id)
        .bind(username)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
