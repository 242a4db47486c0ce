use axum::{
    extract::{rejection::PathRejection, Path},
    response::IntoResponse,
    routing::{get, put},
    Json,
};
use http::StatusCode;
use serde_json::{Map, Value};
use tracing::debug;
use watchlist_dal::{
    schema::validate_create,
    watchlist::{WatchlistEntry, WatchlistRepository},
};

use crate::{
    error::{ApiError, ApiResult, NOT_FOUND_MESSAGE},
    repository_from_request,
    rest_api::Message,
    state::AppState,
};

pub const CREATED_MESSAGE: &str = "New movie added to Watch List succesfully";
pub const UPDATED_MESSAGE: &str = "Customer details updated succesfully";

repository_from_request!(WatchlistRepository);

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(paths(list, create, update))]
struct ModuleDocs;

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    ModuleDocs::openapi()
}

#[cfg_attr(feature = "openapi",  utoipa::path(get, path = "", tag = "Watchlist", operation_id = "listWatchlist",
    responses((status = StatusCode::OK, description = "All saved movies", body = Vec<WatchlistEntry>))))]
pub async fn list(repository: WatchlistRepository) -> ApiResult<impl IntoResponse> {
    let entries: Vec<WatchlistEntry> = repository.list().await?;
    Ok((StatusCode::OK, Json(entries)))
}

#[cfg_attr(feature = "openapi",  utoipa::path(post, path = "", tag = "Watchlist", operation_id = "createWatchlistEntry",
    request_body = watchlist_dal::schema::NewWatchlistEntry,
    responses((status = StatusCode::CREATED, description = "Movie added", body = Message),
        (status = StatusCode::BAD_REQUEST, description = "Invalid fields, reasons grouped by field name"))))]
pub async fn create(
    repository: WatchlistRepository,
    Json(payload): Json<Map<String, Value>>,
) -> ApiResult<impl IntoResponse> {
    let new_entry = validate_create(&payload).map_err(|errors| {
        debug!("Invalid new entry: {errors}");
        ApiError::ValidationFailed(errors)
    })?;
    let record = repository.create(new_entry).await?;
    debug!("Added movie {} as {}", record.original_title, record.id);

    Ok((StatusCode::CREATED, Json(Message::new(CREATED_MESSAGE))))
}

#[cfg_attr(feature = "openapi",  utoipa::path(put, path = "/{id}", tag = "Watchlist", operation_id = "updateWatchlistEntry",
    params(("id" = i64, Path, description = "Entry id")),
    responses((status = StatusCode::OK, description = "Entry updated", body = Message),
        (status = StatusCode::NOT_FOUND, description = "No such entry"),
        (status = StatusCode::BAD_REQUEST, description = "Invalid fields, reasons grouped by field name"))))]
pub async fn update(
    id: Result<Path<i64>, PathRejection>,
    repository: WatchlistRepository,
    Json(changes): Json<Map<String, Value>>,
) -> ApiResult<impl IntoResponse> {
    // id which is not a number cannot match any entry
    let Path(id) = id.map_err(|e| {
        debug!("Invalid entry id: {e}");
        ApiError::ResourceNotFound(NOT_FOUND_MESSAGE.to_string())
    })?;
    repository.update(id, &changes).await?;

    Ok((StatusCode::OK, Json(Message::new(UPDATED_MESSAGE))))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", put(update))
}
