use async_trait::async_trait;
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

use super::PgStore;
use crate::{
    error::{AppError, Result},
    models::{PageRequest, Post, PostFilter, PostRow, SortOrder, VoteState},
    store::PostStore,
};

const POST_COLUMNS: &str = r#"
    p.id, p.title, p.content, p.post_type::TEXT AS post_type_str, p.media_urls,
    p.author_id, p.community_id, p.score, p.deleted, p.created_at, p.updated_at
"#;

fn post_from_row(row: &PgRow) -> Result<Post> {
    let post_type: String = row.try_get("post_type_str")?;
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        post_type: post_type
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid post_type: {}", e)))?,
        media_urls: row.try_get("media_urls")?,
        author_id: row.try_get("author_id")?,
        community_id: row.try_get("community_id")?,
        score: row.try_get("score")?,
        deleted: row.try_get("deleted")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn post_row(row: &PgRow) -> Result<PostRow> {
    let user_vote: Option<i16> = row.try_get("user_vote")?;
    Ok(PostRow {
        post: post_from_row(row)?,
        author_username: row.try_get("author_username")?,
        comment_count: row.try_get("comment_count")?,
        user_vote: user_vote.and_then(VoteState::from_i16),
    })
}

#[async_trait]
impl PostStore for PgStore {
    async fn insert_post(&self, post: &Post) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (
                id, title, content, post_type, media_urls, author_id, community_id,
                score, deleted, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.post_type)
        .bind(&post.media_urls)
        .bind(post.author_id)
        .bind(post.community_id)
        .bind(post.score)
        .bind(post.deleted)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let query = format!("SELECT {} FROM posts p WHERE p.id = $1", POST_COLUMNS);

        let row = sqlx::query(&query)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(post_from_row).transpose()
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        viewer_id: Option<Uuid>,
        page: &PageRequest,
    ) -> Result<Vec<PostRow>> {
        let mut query = format!(
            r#"
            SELECT {},
                u.username AS author_username,
                (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id AND NOT cm.deleted) AS comment_count,
                pv.vote_type AS user_vote
            FROM posts p
            JOIN users u ON p.author_id = u.id
            LEFT JOIN post_votes pv ON p.id = pv.post_id AND pv.user_id = $1
            WHERE NOT p.deleted
            "#,
            POST_COLUMNS
        );

        let mut param_count = 1;

        if filter.community_id.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND p.community_id = ${}", param_count));
        }

        if filter.author_id.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND p.author_id = ${}", param_count));
        }

        // Rows strictly after the cursor post in the requested order
        if page.cursor.is_some() {
            param_count += 1;
            let cursor_filter = match page.order {
                SortOrder::New => format!(
                    " AND (p.created_at, p.id) < (SELECT created_at, id FROM posts WHERE id = ${})",
                    param_count
                ),
                SortOrder::Top => format!(
                    " AND (p.score, p.created_at, p.id) < (SELECT score, created_at, id FROM posts WHERE id = ${})",
                    param_count
                ),
            };
            query.push_str(&cursor_filter);
        }

        let order_clause = match page.order {
            SortOrder::New => "p.created_at DESC, p.id DESC",
            SortOrder::Top => "p.score DESC, p.created_at DESC, p.id DESC",
        };

        query.push_str(&format!(
            " ORDER BY {} LIMIT ${}",
            order_clause,
            param_count + 1
        ));

        if let Some(cursor) = page.cursor {
            if self.find_post(cursor).await?.is_none() {
                return Err(AppError::Validation("Unknown cursor".to_string()));
            }
        }

        let mut query_builder = sqlx::query(&query).bind(viewer_id);

        if let Some(community_id) = filter.community_id {
            query_builder = query_builder.bind(community_id);
        }

        if let Some(author_id) = filter.author_id {
            query_builder = query_builder.bind(author_id);
        }

        if let Some(cursor) = page.cursor {
            query_builder = query_builder.bind(cursor);
        }

        let rows = query_builder
            .bind(page.limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(post_row).collect()
    }

    async fn update_post_content(&self, post_id: Uuid, content: &str) -> Result<()> {
        sqlx::query("UPDATE posts SET content = $1, updated_at = NOW() WHERE id = $2")
            .bind(content)
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn soft_delete_post(&self, post_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE posts SET deleted = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn soft_delete_community_posts(&self, community_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE posts SET deleted = TRUE, updated_at = NOW() WHERE community_id = $1 AND NOT deleted",
        )
        .bind(community_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
