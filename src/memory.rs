//! In-memory stores backing `AppState::fake()` in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    auth::{repo::UserStore, repo_types::User},
    error::StoreError,
    posts::{
        repo::PostStore,
        repo_types::{Comment, NewComment, NewPost, Post},
    },
};

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().await.get(username).cloned())
    }

    async fn find_by_active_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().await;
        Ok(users
            .values()
            .find(|u| u.active_token.as_deref() == Some(token))
            .cloned())
    }

    async fn create(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut users = self.users.lock().await;
        if users.contains_key(username) {
            return Err(StoreError::Duplicate);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            active_token: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<User, StoreError> {
        let mut users = self.users.lock().await;
        let stored = users.get_mut(&user.username).ok_or_else(|| {
            StoreError::Backend(anyhow::anyhow!("user {} no longer exists", user.username))
        })?;
        stored.password_hash = user.password_hash.clone();
        stored.active_token = user.active_token.clone();
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(stored.clone())
    }
}

/// [`MemoryUserStore`] with switchable backend failures.
#[derive(Debug, Default)]
pub struct FailingUserStore {
    pub inner: MemoryUserStore,
    pub fail_save: bool,
    pub fail_token_lookup: bool,
}

fn backend_down() -> StoreError {
    StoreError::Backend(anyhow::anyhow!("connection refused"))
}

#[async_trait]
impl UserStore for FailingUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.inner.find_by_username(username).await
    }

    async fn find_by_active_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        if self.fail_token_lookup {
            return Err(backend_down());
        }
        self.inner.find_by_active_token(token).await
    }

    async fn create(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        self.inner.create(username, password_hash).await
    }

    async fn save(&self, user: &User) -> Result<User, StoreError> {
        if self.fail_save {
            return Err(backend_down());
        }
        self.inner.save(user).await
    }
}

#[derive(Debug, Default)]
struct PostTables {
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

#[derive(Debug, Default)]
pub struct MemoryPostStore {
    tables: Mutex<PostTables>,
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn list(&self, published_only: bool) -> Result<Vec<Post>, StoreError> {
        let tables = self.tables.lock().await;
        // inserted in creation order
        Ok(tables
            .posts
            .iter()
            .rev()
            .filter(|p| p.published || !published_only)
            .cloned()
            .collect())
    }

    async fn count(&self, published_only: bool) -> Result<i64, StoreError> {
        Ok(self.list(published_only).await?.len() as i64)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, post: &NewPost) -> Result<Post, StoreError> {
        let row = Post {
            id: Uuid::new_v4(),
            author: post.author.clone(),
            title: post.title.clone(),
            content: post.content.clone(),
            created: OffsetDateTime::now_utc(),
            published: false,
        };
        self.tables.lock().await.posts.push(row.clone());
        Ok(row)
    }

    async fn publish(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.posts.iter_mut().find(|p| p.id == id).map(|p| {
            p.published = true;
            p.clone()
        }))
    }

    async fn add_comment(&self, comment: &NewComment) -> Result<Comment, StoreError> {
        let mut tables = self.tables.lock().await;
        if !tables.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "post {} does not exist",
                comment.post_id
            )));
        }
        let row = Comment {
            id: Uuid::new_v4(),
            post_id: comment.post_id,
            username: comment.username.clone(),
            content: comment.content.clone(),
            created: OffsetDateTime::now_utc(),
        };
        tables.comments.push(row.clone());
        Ok(row)
    }

    async fn comments_for(&self, post_id: Uuid) -> Result<Vec<Comment>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }
}
