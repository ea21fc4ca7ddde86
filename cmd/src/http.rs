use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use color_eyre::eyre::Result;
use tower_http::trace::{self, TraceLayer};
use tracing::Level;

use super::api::{self, SharedStore};

pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/ping", get(api::ping))
        .route("/installations", post(api::create_installation))
        .route(
            "/installations/:id/deactivate",
            post(api::deactivate_installation),
        )
        .route(
            "/installations/:id/reports",
            post(api::create_report).get(api::report_sum),
        )
        .route("/installations/:id/timeline", get(api::timeline))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(store)
}

pub async fn server(addr: SocketAddr, store: SharedStore) -> Result<()> {
    let app = router(store);

    tracing::info!("start http server: {:?}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
