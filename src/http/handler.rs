use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use url::Url;

use crate::{domain::NextOutcome, reader::ReaderError};

use super::{
    types::{FeedRequest, NextRequest, NextResponse},
    ApiState,
};

pub async fn next(State(state): State<ApiState>, Json(req): Json<NextRequest>) -> impl IntoResponse {
    match state.reader.next(req.liked).await {
        NextOutcome::Entry(entry) => (
            StatusCode::OK,
            Json(NextResponse {
                entry: Some(entry),
                exhausted: false,
            }),
        ),
        NextOutcome::Exhausted => (
            StatusCode::OK,
            Json(NextResponse {
                entry: None,
                exhausted: true,
            }),
        ),
    }
}

pub async fn add_feed(
    State(state): State<ApiState>,
    Json(req): Json<FeedRequest>,
) -> impl IntoResponse {
    match Url::parse(&req.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "not a valid http(s) url" })),
            )
                .into_response();
        }
    }

    let id = match state.reader.subscribe(&req.url).await {
        Ok(id) => id,
        Err(err @ ReaderError::DuplicateSource(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response();
        }
    };

    if let Err(err) = state.feeds.save(&[(id, req.url.clone())]).await {
        tracing::error!(target: "http", error = %err, url = %req.url, "failed to persist feed");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response();
    }

    let report = state.reader.sync().await;
    (
        StatusCode::ACCEPTED,
        Json(json!({ "message": "feed subscribed", "sync": report })),
    )
        .into_response()
}

pub async fn delete_feed(
    State(state): State<ApiState>,
    Json(req): Json<FeedRequest>,
) -> impl IntoResponse {
    if let Err(err) = state.feeds.purge(&req.url).await {
        tracing::error!(target: "http", error = %err, url = %req.url, "failed to purge feed");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response();
    }

    let removed = state.reader.unsubscribe(&req.url).await;
    let report = state.reader.sync().await;
    (
        StatusCode::ACCEPTED,
        Json(json!({ "removed": removed, "sync": report })),
    )
        .into_response()
}

pub async fn list_feeds(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.reader.feeds().await)
}

pub async fn sync(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.reader.sync().await)
}

pub async fn status(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.reader.stats().await)
}
