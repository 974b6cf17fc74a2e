//! Router configuration for the Bookshelf web service.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::dto::BookResponse;
use super::handlers::{
    book_list_page, delete_book, download_book, list_books, raw_metadata, upload_book,
    upload_page, AppState,
};
use super::middleware::{create_cors_layer, security_headers};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// OpenAPI document for the book endpoints.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::handlers::books::upload_book,
        crate::web::handlers::books::list_books,
        crate::web::handlers::books::download_book,
        crate::web::handlers::books::delete_book,
        crate::web::handlers::books::raw_metadata,
    ),
    components(schemas(BookResponse)),
    tags((name = "books", description = "Upload, list, download and delete files"))
)]
pub struct ApiDoc;

/// Create the main router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let body_limit = usize::try_from(app_state.max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/", get(upload_page))
        .route("/upload", post(upload_book))
        .route("/books", get(book_list_page))
        .route("/api/books", get(list_books))
        .route("/download/:id", get(download_book))
        .route("/delete/:id", get(delete_book))
        .route("/metadata", get(raw_metadata))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(security_headers)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Create the Swagger UI router serving the OpenAPI document.
pub fn create_swagger_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
