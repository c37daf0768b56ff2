use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

use super::PgStore;
use crate::{
    error::{AppError, Result},
    models::{Comment, CommentRow, PageRequest, SortOrder, VoteState},
    store::CommentStore,
};

const COMMENT_SELECT: &str = r#"
    SELECT
        c.id, c.content, c.post_id, c.author_id, c.parent_id, c.deleted, c.score,
        c.created_at, c.updated_at,
        u.username AS author_username, u.avatar_url AS author_avatar_url,
        cv.vote_type AS user_vote
    FROM comments c
    JOIN users u ON c.author_id = u.id
    LEFT JOIN comment_votes cv ON c.id = cv.comment_id AND cv.user_id = $1
"#;

fn order_clause(order: SortOrder) -> &'static str {
    match order {
        SortOrder::New => "c.created_at DESC, c.id DESC",
        SortOrder::Top => "c.score DESC, c.created_at DESC, c.id DESC",
    }
}

fn comment_from_row(row: &PgRow) -> Result<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        post_id: row.try_get("post_id")?,
        author_id: row.try_get("author_id")?,
        parent_id: row.try_get("parent_id")?,
        deleted: row.try_get("deleted")?,
        score: row.try_get("score")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn comment_row(row: &PgRow) -> Result<CommentRow> {
    let user_vote: Option<i16> = row.try_get("user_vote")?;
    Ok(CommentRow {
        comment: comment_from_row(row)?,
        author_username: row.try_get("author_username")?,
        author_avatar_url: row.try_get("author_avatar_url")?,
        user_vote: user_vote.and_then(VoteState::from_i16),
    })
}

struct CursorKey {
    id: Uuid,
    score: i32,
    created_at: DateTime<Utc>,
}

impl PgStore {
    async fn root_cursor_key(&self, post_id: Uuid, cursor: Uuid) -> Result<CursorKey> {
        let row = sqlx::query(
            "SELECT score, created_at FROM comments WHERE id = $1 AND post_id = $2 AND parent_id IS NULL",
        )
        .bind(cursor)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Validation("Unknown cursor".to_string()))?;

        Ok(CursorKey {
            id: cursor,
            score: row.try_get("score")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl CommentStore for PgStore {
    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO comments (
                id, content, post_id, author_id, parent_id,
                deleted, score, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(comment.id)
        .bind(&comment.content)
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(comment.parent_id)
        .bind(comment.deleted)
        .bind(comment.score)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        let row = sqlx::query(
            r#"
            SELECT id, content, post_id, author_id, parent_id, deleted, score, created_at, updated_at
            FROM comments WHERE id = $1
            "#,
        )
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(comment_from_row).transpose()
    }

    async fn find_comment_row(
        &self,
        comment_id: Uuid,
        viewer_id: Option<Uuid>,
    ) -> Result<Option<CommentRow>> {
        let query = format!("{} WHERE c.id = $2", COMMENT_SELECT);

        let row = sqlx::query(&query)
            .bind(viewer_id)
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(comment_row).transpose()
    }

    async fn root_comments(
        &self,
        post_id: Uuid,
        viewer_id: Option<Uuid>,
        page: &PageRequest,
    ) -> Result<Vec<CommentRow>> {
        let cursor = match page.cursor {
            Some(cursor) => Some(self.root_cursor_key(post_id, cursor).await?),
            None => None,
        };

        let mut query = format!(
            "{} WHERE c.post_id = $2 AND c.parent_id IS NULL",
            COMMENT_SELECT
        );
        let mut param_count = 2;

        if cursor.is_some() {
            match page.order {
                SortOrder::New => {
                    query.push_str(" AND (c.created_at, c.id) < ($3, $4)");
                    param_count = 4;
                }
                SortOrder::Top => {
                    query.push_str(" AND (c.score, c.created_at, c.id) < ($3, $4, $5)");
                    param_count = 5;
                }
            }
        }

        query.push_str(&format!(
            " ORDER BY {} LIMIT ${}",
            order_clause(page.order),
            param_count + 1
        ));

        let mut query_builder = sqlx::query(&query).bind(viewer_id).bind(post_id);

        if let Some(key) = cursor {
            if page.order == SortOrder::Top {
                query_builder = query_builder.bind(key.score);
            }
            query_builder = query_builder.bind(key.created_at).bind(key.id);
        }

        let rows = query_builder
            .bind(page.limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(comment_row).collect()
    }

    async fn child_comments(
        &self,
        parent_ids: &[Uuid],
        viewer_id: Option<Uuid>,
        order: SortOrder,
    ) -> Result<Vec<CommentRow>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "{} WHERE c.parent_id = ANY($2) ORDER BY {}",
            COMMENT_SELECT,
            order_clause(order)
        );

        let rows = sqlx::query(&query)
            .bind(viewer_id)
            .bind(parent_ids)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(comment_row).collect()
    }

    async fn has_children(&self, comment_id: Uuid) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM comments WHERE parent_id = $1)")
                .bind(comment_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn update_comment_content(&self, comment_id: Uuid, content: &str) -> Result<()> {
        sqlx::query("UPDATE comments SET content = $1, updated_at = NOW() WHERE id = $2")
            .bind(content)
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn soft_delete_comment(&self, comment_id: Uuid) -> Result<()> {
        // Content stays at rest; readers redact it.
        sqlx::query("UPDATE comments SET deleted = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn soft_delete_post_comments(&self, post_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE comments SET deleted = TRUE, updated_at = NOW() WHERE post_id = $1 AND NOT deleted",
        )
        .bind(post_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
