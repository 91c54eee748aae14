use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

use crate::api::{self, SharedNavigator};
use crate::forecast::{ForecastSource, fetch_all};
use crate::navigator::RetrievalSummary;

pub fn app(navigator: SharedNavigator) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router(navigator))
        .layer(cors)
}

/// Fetch every forecast in the background.
///
/// Each completion takes the write lock only while it is recorded.
pub fn spawn_retrieval(
    navigator: SharedNavigator,
    source: Arc<dyn ForecastSource>,
) -> JoinHandle<RetrievalSummary> {
    tokio::spawn(async move {
        let requests = navigator.write().await.forecast_requests();
        let mut pending = fetch_all(source.as_ref(), requests);

        let mut summary = RetrievalSummary::default();
        while let Some((mountain, result)) = pending.next().await {
            summary.tally(&result);
            navigator
                .write()
                .await
                .record_forecast(mountain.name(), result);
        }

        tracing::info!(
            "Background forecast round finished: {} loaded, {} failed",
            summary.loaded,
            summary.failed
        );
        summary
    })
}

pub async fn run(navigator: SharedNavigator, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://localhost:{}", port);
    axum::serve(listener, app(navigator))
        .await
        .context("Web server stopped with an error")?;
    Ok(())
}
