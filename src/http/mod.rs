mod handler;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    db::feeds::FeedRepository, infrastructure::shutdown::ShutdownListener, reader::ReaderService,
};

#[derive(Clone)]
pub struct ApiState {
    pub reader: Arc<ReaderService>,
    pub feeds: FeedRepository,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/next", post(handler::next))
        .route(
            "/feeds",
            get(handler::list_feeds)
                .post(handler::add_feed)
                .delete(handler::delete_feed),
        )
        .route("/sync", post(handler::sync))
        .route("/status", get(handler::status))
        .with_state(state)
}

pub async fn serve(state: ApiState, bind_addr: &str, mut shutdown: ShutdownListener) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!(target: "http", addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.notified().await })
        .await?;
    Ok(())
}
