use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    json::JsonBody,
    posts::{
        dto::{
            CommentEnvelope, CommentRequest, CreatePostRequest, PostCount, PostDetails,
            PostEnvelope, PostList, PublishQuery,
        },
        repo_types::{NewComment, NewPost},
    },
    state::AppState,
};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/post/list/public", get(list_public))
        .route("/post/count", get(count_posts))
        .route("/post/postDetails/:id", get(post_details))
        .route("/post/comment", post(add_comment))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/post/list/protected", get(list_all))
        .route("/post/create", post(create_post))
        .route("/post/publish", put(publish_post))
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_public(State(state): State<AppState>) -> Result<Json<PostList>, AppError> {
    let posts = state.posts.list(true).await?;
    Ok(Json(PostList { posts }))
}

#[instrument(skip_all, fields(username = %claims.username))]
pub async fn list_all(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<PostList>, AppError> {
    let posts = state.posts.list(false).await?;
    Ok(Json(PostList { posts }))
}

#[instrument(skip(state))]
pub async fn count_posts(State(state): State<AppState>) -> Result<Json<PostCount>, AppError> {
    let count = state.posts.count(true).await?;
    Ok(Json(PostCount { count }))
}

#[instrument(skip_all, fields(username = %claims.username))]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    JsonBody(body): JsonBody<CreatePostRequest>,
) -> Result<Json<PostEnvelope>, AppError> {
    let title = body.title.trim();
    let content = body.content.trim();
    if title.is_empty() || content.is_empty() {
        return Err(AppError::Validation("Title and content are required".into()));
    }
    let author = body
        .author
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(claims.username.as_str());

    let post = state
        .posts
        .create(&NewPost {
            author: author.to_string(),
            title: title.to_string(),
            content: content.to_string(),
        })
        .await?;

    info!(post_id = %post.id, "post created");
    Ok(Json(PostEnvelope { post }))
}

/// PUT /post/publish?_id=<id>
#[instrument(skip_all, fields(username = %claims.username))]
pub async fn publish_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(q): Query<PublishQuery>,
) -> Result<Json<PostEnvelope>, AppError> {
    let raw = q
        .id
        .ok_or_else(|| AppError::Validation("_id is required".into()))?;
    let id = parse_post_id(&raw)?;
    let post = state
        .posts
        .publish(id)
        .await?
        .ok_or(AppError::NotFound("Post not found"))?;

    info!(post_id = %post.id, "post published");
    Ok(Json(PostEnvelope { post }))
}

#[instrument(skip(state, body))]
pub async fn add_comment(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CommentRequest>,
) -> Result<Json<CommentEnvelope>, AppError> {
    let username = body.username.trim();
    let content = body.content.trim();
    if username.is_empty() || content.is_empty() {
        return Err(AppError::Validation("Username and content are required".into()));
    }
    let post_id = parse_post_id(&body.post_id)?;
    if state.posts.find(post_id).await?.is_none() {
        return Err(AppError::NotFound("Post not found"));
    }

    let comment = state
        .posts
        .add_comment(&NewComment {
            post_id,
            username: username.to_string(),
            content: content.to_string(),
        })
        .await?;
    Ok(Json(CommentEnvelope { comment }))
}

#[instrument(skip(state))]
pub async fn post_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostDetails>, AppError> {
    let id = parse_post_id(&id)?;
    let post = state
        .posts
        .find(id)
        .await?
        .ok_or(AppError::NotFound("Post not found"))?;
    let comments = state.posts.comments_for(id).await?;
    Ok(Json(PostDetails { post, comments }))
}

/// Malformed ids cannot name a post, so they are reported as not found.
fn parse_post_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound("Post not found"))
}
