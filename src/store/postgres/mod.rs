mod comments;
mod communities;
mod posts;
mod score_ledger;
mod users;
mod votes;

use sqlx::PgPool;

/// PostgreSQL-backed [`ForumStore`](crate::store::ForumStore).
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
