//! Catalog handlers.
//!
//! - `GET /products`       – every product on sale
//! - `GET /products/{id}`  – one product
//! - `GET /assets`         – payment asset options for the crypto checkout

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use wpay_core::stores::{asset_options, find_product, products};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/assets", get(list_assets))
}

async fn list_products() -> impl IntoResponse {
    Json(products())
}

async fn get_product(Path(id): Path<String>) -> Result<impl IntoResponse, CatalogApiError> {
    find_product(&id)
        .map(Json)
        .ok_or(CatalogApiError::ProductNotFound)
}

/// Testnet options are listed only while the settings enable them.
async fn list_assets(state: State<AppState>) -> impl IntoResponse {
    let settings = state.orchestrator.settings().current().await;
    Json(asset_options(settings.enable_testnet))
}

enum CatalogApiError {
    ProductNotFound,
}

impl IntoResponse for CatalogApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            CatalogApiError::ProductNotFound => {
                (StatusCode::NOT_FOUND, "product not found").into_response()
            }
        }
    }
}
