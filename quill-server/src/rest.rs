use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use quill_posts::{
    schema, BlogLifecycle, CommentView, PostDetail, PostSummary,
};
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::ApiError;

type ApiResult<T> = Result<T, ApiError>;

/// Routes for `/health`, `/posts` and `/posts/{id}/comments`.
///
/// `body_limit` caps request bodies; photos travel base64-encoded in JSON,
/// so it has to leave room for the largest accepted photo.
pub fn router(blog: BlogLifecycle, body_limit: usize) -> Router<()> {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route(
            "/posts/{id}/comments",
            get(list_comments).post(add_comment),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(blog)
}

async fn list_posts(State(blog): State<BlogLifecycle>) -> ApiResult<Json<Vec<PostSummary>>> {
    Ok(Json(blog.get_all().await?))
}

async fn create_post(
    State(blog): State<BlogLifecycle>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PostSummary>)> {
    let Json(body) = body?;
    let cmd = schema::parse_create(&body)?;
    let post = blog.create(cmd).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn get_post(
    State(blog): State<BlogLifecycle>,
    Path(id): Path<String>,
) -> ApiResult<Json<PostDetail>> {
    Ok(Json(blog.get_by_id(&id).await?))
}

async fn update_post(
    State(blog): State<BlogLifecycle>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<PostSummary>> {
    let Json(body) = body?;
    let cmd = schema::parse_update(&body)?;
    Ok(Json(blog.update(&id, cmd).await?))
}

async fn delete_post(
    State(blog): State<BlogLifecycle>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    blog.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_comment(
    State(blog): State<BlogLifecycle>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CommentView>)> {
    let Json(body) = body?;
    let cmd = schema::parse_comment(&body)?;
    let comment = blog.add_comment(&id, cmd).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn list_comments(
    State(blog): State<BlogLifecycle>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<CommentView>>> {
    Ok(Json(blog.comments(&id).await?))
}
