//! Post handlers and the live feed stream.

use actix_web::{
    HttpResponse,
    http::header,
    web::{self, Bytes},
};
use serde::Deserialize;
use std::convert::Infallible;
use tokio::sync::watch;

use blogify_core::DomainError;
use blogify_core::domain::{Post, PostPatch};
use blogify_shared::dto::{CreatePostRequest, CreatedResponse, PostResponse, UpdatePostRequest};

use crate::middleware::auth::{Authenticated, CurrentSession};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::views::editor::{NOT_LOGGED_IN, SAVE_FAILED, validate_submission};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

pub(crate) fn post_response(post: Post) -> PostResponse {
    PostResponse {
        id: post.id,
        title: post.title,
        content: post.content,
        author_id: post.author_id,
        author_email: post.author_email,
        author_name: post.author_name,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

/// Failed write: field errors are reported as they are, backend failures
/// with the generic save message.
fn save_error(err: DomainError) -> AppError {
    match err {
        DomainError::Validation(msg) => AppError::BadRequest(msg),
        DomainError::NotAuthenticated => AppError::Unauthorized(NOT_LOGGED_IN.to_string()),
        not_found @ DomainError::NotFound { .. } => not_found.into(),
        DomainError::Unavailable(detail) => {
            tracing::warn!(detail = %detail, "Post write failed");
            AppError::Unavailable(SAVE_FAILED.to_string())
        }
        other => {
            tracing::error!(error = %other, "Post write failed");
            AppError::Internal(SAVE_FAILED.to_string())
        }
    }
}

fn post_not_found(post_id: &str) -> AppError {
    AppError::NotFound(format!("Post {post_id} not found"))
}

/// GET /api/posts - newest first; `?limit=n` keeps the n newest.
///
/// Without `limit` the configured recent-posts limit applies, if any.
/// `limit=0` is rejected.
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    if query.limit == Some(0) {
        return Err(AppError::BadRequest("limit must be at least 1".to_string()));
    }
    let limit = query.limit.or(state.config.recent_posts_limit);
    let posts = state.posts.snapshot_recent(limit).await;

    Ok(HttpResponse::Ok().json(posts.into_iter().map(post_response).collect::<Vec<_>>()))
}

/// POST /api/posts
pub async fn create_post(
    state: web::Data<AppState>,
    session: CurrentSession,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let author = session.identity();

    validate_submission(&req.title, &req.content, author.as_ref()).map_err(|msg| {
        if msg == NOT_LOGGED_IN {
            AppError::Unauthorized(msg.to_string())
        } else {
            AppError::BadRequest(msg.to_string())
        }
    })?;

    let id = state
        .posts
        .create(author.as_ref(), &req.title, &req.content)
        .await
        .map_err(save_error)?;

    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

/// GET /api/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let post = state
        .posts
        .get(&post_id)
        .await
        .ok_or_else(|| post_not_found(&post_id))?;

    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// PUT /api/posts/{id} - author only.
pub async fn update_post(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<String>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let post = state
        .posts
        .get(&post_id)
        .await
        .ok_or_else(|| post_not_found(&post_id))?;
    if !post.is_authored_by(&auth.identity) {
        return Err(AppError::Forbidden);
    }

    let req = body.into_inner();
    let patch = PostPatch {
        title: req.title,
        content: req.content,
    };
    state
        .posts
        .update(&post_id, patch)
        .await
        .map_err(save_error)?;

    let updated = state
        .posts
        .get(&post_id)
        .await
        .ok_or_else(|| post_not_found(&post_id))?;
    Ok(HttpResponse::Ok().json(post_response(updated)))
}

/// DELETE /api/posts/{id} - author only; deleting a missing post succeeds.
pub async fn delete_post(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    match state.posts.get(&post_id).await {
        Some(post) if !post.is_authored_by(&auth.identity) => return Err(AppError::Forbidden),
        Some(_) => state.posts.delete(&post_id).await.map_err(save_error)?,
        None => tracing::debug!(post_id = %post_id, "Delete of a missing post"),
    }

    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/posts/stream - Server-Sent Events, one `posts` event carrying
/// the whole newest-first list per snapshot.
///
/// The subscription lives inside the response stream and is cancelled when
/// the client disconnects.
pub async fn stream_posts(state: web::Data<AppState>) -> HttpResponse {
    // Latest snapshot wins; a slow client skips intermediate ones.
    let (tx, rx) = watch::channel(None);
    let subscription = state
        .posts
        .subscribe_all(move |posts| {
            let _ = tx.send(Some(posts));
        })
        .await;
    tracing::debug!("Feed stream opened");

    let events = futures::stream::unfold((rx, subscription), |(mut rx, subscription)| {
        async move {
            rx.changed().await.ok()?;
            let posts = rx.borrow_and_update().clone().unwrap_or_default();
            Some((Ok::<_, Infallible>(sse_event(posts)), (rx, subscription)))
        }
    });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(events)
}

fn sse_event(posts: Vec<Post>) -> Bytes {
    let posts: Vec<PostResponse> = posts.into_iter().map(post_response).collect();
    let data = serde_json::to_string(&posts).unwrap_or_else(|_| "[]".to_string());
    Bytes::from(format!("event: posts\ndata: {data}\n\n"))
}
