use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::VoteTarget,
};

/// Takes the row lock on the vote target for the rest of the transaction.
/// Concurrent votes on the same target queue here, and every statement after
/// it sees the vote rows they committed. `NO KEY` leaves foreign-key checks
/// from new comments on the target unblocked.
pub(super) async fn lock_target(conn: &mut PgConnection, target: VoteTarget) -> Result<()> {
    let query = format!(
        "SELECT id FROM {} WHERE id = $1 FOR NO KEY UPDATE",
        target.kind.table()
    );

    let locked: Option<Uuid> = sqlx::query_scalar(&query)
        .bind(target.id)
        .fetch_optional(&mut *conn)
        .await?;

    locked
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(format!("{:?} not found", target.kind)))
}

/// Adds `delta` to the target's score with a server-side increment, so
/// concurrent adjustments compose no matter when their callers read the score.
pub(super) async fn adjust_score(
    conn: &mut PgConnection,
    target: VoteTarget,
    delta: i32,
) -> Result<i32> {
    let query = format!(
        "UPDATE {} SET score = score + $1 WHERE id = $2 RETURNING score",
        target.kind.table()
    );

    let score: Option<i32> = sqlx::query_scalar(&query)
        .bind(delta)
        .bind(target.id)
        .fetch_optional(&mut *conn)
        .await?;

    score.ok_or_else(|| AppError::NotFound(format!("{:?} not found", target.kind)))
}
