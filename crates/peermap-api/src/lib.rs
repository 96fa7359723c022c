pub mod handlers;

use std::net::SocketAddr;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub use handlers::{ApiState, CLIENTS_PAGE_KEY};

/// Build the `/api` router.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/clients", get(handlers::handle_clients))
        .route("/clients/topology", get(handlers::handle_topology))
        .route(
            "/clients/{name}",
            axum::routing::put(handlers::handle_client_report)
                .delete(handlers::handle_client_remove),
        )
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(cors)
}

/// Serve the API on an already-bound listener.
pub async fn serve_on(listener: TcpListener, state: ApiState) -> anyhow::Result<()> {
    let app = router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

pub async fn serve(state: ApiState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API listening");
    serve_on(listener, state).await
}
