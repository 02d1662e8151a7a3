use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::posts::repo_types::{Comment, NewComment, NewPost, Post};

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Posts ordered newest first.
    async fn list(&self, published_only: bool) -> Result<Vec<Post>, StoreError>;
    async fn count(&self, published_only: bool) -> Result<i64, StoreError>;
    async fn find(&self, id: Uuid) -> Result<Option<Post>, StoreError>;
    async fn create(&self, post: &NewPost) -> Result<Post, StoreError>;
    /// Marks a post published. `None` if no such post.
    async fn publish(&self, id: Uuid) -> Result<Option<Post>, StoreError>;
    async fn add_comment(&self, comment: &NewComment) -> Result<Comment, StoreError>;
    /// Comments of a post, oldest first.
    async fn comments_for(&self, post_id: Uuid) -> Result<Vec<Comment>, StoreError>;
}

#[derive(Clone)]
pub struct PgPostStore {
    db: PgPool,
}

impl PgPostStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn list(&self, published_only: bool) -> Result<Vec<Post>, StoreError> {
        let rows = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author, title, content, created, published
            FROM posts
            WHERE published OR NOT $1
            ORDER BY created DESC
            "#,
        )
        .bind(published_only)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn count(&self, published_only: bool) -> Result<i64, StoreError> {
        let (count,) = sqlx::query_as::<_, (i64,)>(
            r#"SELECT COUNT(*) FROM posts WHERE published OR NOT $1"#,
        )
        .bind(published_only)
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author, title, content, created, published
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(post)
    }

    async fn create(&self, post: &NewPost) -> Result<Post, StoreError> {
        let row = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, author, title, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, author, title, content, created, published
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&post.author)
        .bind(&post.title)
        .bind(&post.content)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn publish(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let row = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts SET published = TRUE
            WHERE id = $1
            RETURNING id, author, title, content, created, published
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn add_comment(&self, comment: &NewComment) -> Result<Comment, StoreError> {
        let row = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, post_id, username, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, post_id, username, content, created
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(comment.post_id)
        .bind(&comment.username)
        .bind(&comment.content)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn comments_for(&self, post_id: Uuid) -> Result<Vec<Comment>, StoreError> {
        let rows = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, username, content, created
            FROM comments
            WHERE post_id = $1
            ORDER BY created ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
