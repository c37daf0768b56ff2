use async_trait::async_trait;
use sqlx::{PgConnection, Row};
use uuid::Uuid;

use super::{PgStore, score_ledger};
use crate::{
    error::Result,
    models::{Votable, VoteAction, VoteCommit, VoteState, VoteTarget},
    store::VoteStore,
};

async fn write_vote_row(
    conn: &mut PgConnection,
    user_id: Uuid,
    target: VoteTarget,
    action: VoteAction,
) -> Result<()> {
    let kind = target.kind;
    match action {
        VoteAction::Create(state) | VoteAction::Update(state) => {
            let query = format!(
                r#"
                INSERT INTO {table} (id, user_id, {column}, vote_type, created_at, updated_at)
                VALUES ($1, $2, $3, $4, NOW(), NOW())
                ON CONFLICT (user_id, {column})
                DO UPDATE SET vote_type = EXCLUDED.vote_type, updated_at = NOW()
                "#,
                table = kind.vote_table(),
                column = kind.vote_column()
            );
            sqlx::query(&query)
                .bind(Uuid::new_v4())
                .bind(user_id)
                .bind(target.id)
                .bind(state.as_i16())
                .execute(&mut *conn)
                .await?;
        }
        VoteAction::Delete => {
            let query = format!(
                "DELETE FROM {} WHERE user_id = $1 AND {} = $2",
                kind.vote_table(),
                kind.vote_column()
            );
            sqlx::query(&query)
                .bind(user_id)
                .bind(target.id)
                .execute(&mut *conn)
                .await?;
        }
        VoteAction::Keep => {}
    }

    Ok(())
}

async fn read_vote(
    conn: &mut PgConnection,
    user_id: Uuid,
    target: VoteTarget,
) -> Result<Option<VoteState>> {
    let query = format!(
        "SELECT vote_type FROM {} WHERE user_id = $1 AND {} = $2",
        target.kind.vote_table(),
        target.kind.vote_column()
    );

    let vote_type: Option<i16> = sqlx::query_scalar(&query)
        .bind(user_id)
        .bind(target.id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(vote_type.and_then(VoteState::from_i16))
}

#[async_trait]
impl VoteStore for PgStore {
    async fn find_votable(&self, target: VoteTarget) -> Result<Option<Votable>> {
        let query = format!(
            "SELECT score, author_id, deleted, created_at, updated_at FROM {} WHERE id = $1",
            target.kind.table()
        );

        let row = sqlx::query(&query)
            .bind(target.id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Votable {
            target,
            score: row.try_get("score")?,
            author_id: row.try_get("author_id")?,
            deleted: row.try_get("deleted")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }

    async fn find_vote(&self, user_id: Uuid, target: VoteTarget) -> Result<Option<VoteState>> {
        let mut conn = self.pool.acquire().await?;
        read_vote(&mut *conn, user_id, target).await
    }

    async fn commit_vote(
        &self,
        user_id: Uuid,
        target: VoteTarget,
        expected: Option<VoteState>,
        action: VoteAction,
        delta: i32,
    ) -> Result<VoteCommit> {
        // Dropping `tx` on any early return rolls every write back.
        let mut tx = self.pool.begin().await?;

        score_ledger::lock_target(&mut *tx, target).await?;

        let current = read_vote(&mut *tx, user_id, target).await?;
        if current != expected {
            return Ok(VoteCommit::Stale(current));
        }

        write_vote_row(&mut *tx, user_id, target, action).await?;
        let score = score_ledger::adjust_score(&mut *tx, target, delta).await?;

        tx.commit().await?;

        Ok(VoteCommit::Applied(score))
    }
}
