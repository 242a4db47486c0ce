use crate::config::ServerConfig;
use crate::error::Result;
use axum::http::StatusCode;
use axum::{response::IntoResponse, routing::get, Router};
use futures::FutureExt;
use tracing::{debug, info};
use watchlist_app::state::AppState;

pub async fn run(args: ServerConfig) -> Result<()> {
    let state = build_state(&args).await?;
    let shutdown = tokio::signal::ctrl_c().map(|_| ());
    run_graceful_with_state(args, state, shutdown).await
}

/// Serves requests until `shutdown_signal` resolves, then closes database pool
pub async fn run_graceful_with_state<S>(
    args: ServerConfig,
    state: AppState,
    shutdown_signal: S,
) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let pool = state.pool().clone();
    let mut app = main_router(state);

    if !args.no_cors {
        app = app.layer(tower_http::cors::CorsLayer::very_permissive());
    }

    let ip: std::net::IpAddr = args.listen_address.parse()?;
    let addr = std::net::SocketAddr::from((ip, args.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    let res = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await;

    pool.close().await;
    info!("Server stopped");
    res.map_err(|e| e.into())
}

#[cfg(feature = "openapi")]
fn api_docs() -> utoipa::openapi::OpenApi {
    #[derive(utoipa::OpenApi)]
    #[openapi(info(title = "Watch List API"))]
    struct OpenApi;

    use utoipa::OpenApi as _;
    OpenApi::openapi().nest("/watchlist", watchlist_app::rest_api::watchlist::api_docs())
}

fn main_router(state: AppState) -> Router<()> {
    #[allow(unused_mut)]
    let mut router = Router::new()
        .nest("/watchlist", watchlist_app::rest_api::watchlist::router())
        .with_state(state)
        .route("/health", get(health));

    #[cfg(feature = "openapi")]
    {
        let docs = api_docs();
        router = router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs),
        );
    }
    router
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    if config.uses_default_database() {
        let data_dir = config.data_dir();
        if !data_dir.is_dir() {
            tokio::fs::create_dir_all(&data_dir).await?;
            info!("Created data directory {}", data_dir.display());
        }
    }

    let database_url = config.database_url();
    let pool = watchlist_dal::new_pool(&database_url).await?;
    debug!("Connected to database {database_url}");

    Ok(AppState::new(pool))
}
