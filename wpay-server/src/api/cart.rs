//! Cart handlers.
//!
//! - `GET    /cart`        – current contents and totals
//! - `POST   /cart/items`  – add a product in a size
//! - `PATCH  /cart/items`  – set the quantity of a line (≤ 0 removes it)
//! - `DELETE /cart/items`  – remove a line
//! - `DELETE /cart`        – empty the cart

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use kanau::processor::Processor;
use wpay_core::storage::StorageError;
use wpay_core::stores::{CartAction, find_product};
use wpay_sdk::objects::{AddCartItem, RemoveCartItem, UpdateCartItem};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cart", get(get_cart).delete(clear_cart))
        .route(
            "/cart/items",
            delete(remove_item).post(add_item).patch(update_item),
        )
}

async fn get_cart(state: State<AppState>) -> impl IntoResponse {
    Json(state.orchestrator.cart().view().await)
}

async fn add_item(
    state: State<AppState>,
    Json(body): Json<AddCartItem>,
) -> Result<impl IntoResponse, CartApiError> {
    let product = find_product(&body.product_id).ok_or(CartApiError::UnknownProduct)?;
    if !product.sizes.contains(&body.size) {
        return Err(CartApiError::UnknownSize);
    }
    if body.quantity == 0 {
        return Err(CartApiError::ZeroQuantity);
    }

    let view = state
        .orchestrator
        .cart()
        .process(CartAction::Add {
            product: product.clone(),
            size: body.size,
            quantity: body.quantity,
        })
        .await?;
    Ok(Json(view))
}

async fn update_item(
    state: State<AppState>,
    Json(body): Json<UpdateCartItem>,
) -> Result<impl IntoResponse, CartApiError> {
    let view = state
        .orchestrator
        .cart()
        .process(CartAction::UpdateQuantity {
            product_id: body.product_id,
            size: body.size,
            quantity: body.quantity,
        })
        .await?;
    Ok(Json(view))
}

async fn remove_item(
    state: State<AppState>,
    Json(body): Json<RemoveCartItem>,
) -> Result<impl IntoResponse, CartApiError> {
    let view = state
        .orchestrator
        .cart()
        .process(CartAction::Remove {
            product_id: body.product_id,
            size: body.size,
        })
        .await?;
    Ok(Json(view))
}

async fn clear_cart(state: State<AppState>) -> Result<impl IntoResponse, CartApiError> {
    let view = state.orchestrator.cart().process(CartAction::Clear).await?;
    Ok(Json(view))
}

enum CartApiError {
    UnknownProduct,
    UnknownSize,
    ZeroQuantity,
    /// Persisting the cart failed; the in-memory cart is unchanged.
    Storage(StorageError),
}

impl From<StorageError> for CartApiError {
    fn from(e: StorageError) -> Self {
        CartApiError::Storage(e)
    }
}

impl IntoResponse for CartApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            CartApiError::UnknownProduct => {
                (StatusCode::NOT_FOUND, "product not found").into_response()
            }
            CartApiError::UnknownSize => {
                (StatusCode::BAD_REQUEST, "size not offered for this product").into_response()
            }
            CartApiError::ZeroQuantity => {
                (StatusCode::BAD_REQUEST, "quantity must be positive").into_response()
            }
            CartApiError::Storage(e) => {
                tracing::error!(error = %e, "Cart API storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
