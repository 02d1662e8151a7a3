use serde::{Deserialize, Serialize};

use crate::posts::repo_types::{Comment, Post};

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    /// Defaults to the caller's username.
    pub author: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct PublishQuery {
    #[serde(rename = "_id")]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub post_id: String,
}

#[derive(Debug, Serialize)]
pub struct PostList {
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize)]
pub struct PostCount {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct PostEnvelope {
    pub post: Post,
}

#[derive(Debug, Serialize)]
pub struct PostDetails {
    pub post: Post,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Serialize)]
pub struct CommentEnvelope {
    pub comment: Comment,
}
