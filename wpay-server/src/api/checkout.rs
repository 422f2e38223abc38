//! Checkout handlers.
//!
//! - `POST /checkout`               – start an attempt for the current cart
//! - `GET  /checkout/{attempt_id}`  – status and outcome of an attempt
//! - `POST /checkout/dismiss`       – the buyer closed the wallet modal
//! - `GET  /checkout/ws`            – session event stream (see [`ws`])

mod ws;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;
use wpay_core::checkout::CheckoutAttempt;
use wpay_sdk::objects::{AttemptStatus, CheckoutAccepted, CheckoutRequest};

use crate::state::AppState;
use ws::session_ws;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(start_checkout))
        .route("/checkout/dismiss", post(dismiss_modal))
        .route("/checkout/ws", get(session_ws))
        .route("/checkout/{attempt_id}", get(get_attempt))
}

/// `POST /checkout` – start a checkout attempt.
///
/// Snapshots the cart and runs the attempt in the background. Only one
/// attempt runs at a time; progress is reported on the session stream and
/// through `GET /checkout/{attempt_id}`.
async fn start_checkout(
    state: State<AppState>,
    Json(body): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    let slot = state
        .try_begin_attempt()
        .ok_or(CheckoutApiError::AttemptInFlight)?;

    let cart = state.orchestrator.cart().snapshot().await;
    if cart.is_empty() {
        return Err(CheckoutApiError::EmptyCart);
    }

    let attempt = CheckoutAttempt::new(
        cart,
        body.shipping,
        body.payment_method,
        body.payment_asset,
    );
    let attempt_id = attempt.id;
    state
        .record_attempt(AttemptStatus {
            attempt_id,
            payment_method: body.payment_method,
            outcome: None,
            started_at: state.clock.now().unix_timestamp(),
        })
        .await;

    let task_state = state.0.clone();
    tokio::spawn(async move {
        let _slot = slot;
        let outcome = task_state.orchestrator.checkout(attempt).await;
        task_state.finish_attempt(attempt_id, outcome.view()).await;
    });

    Ok((StatusCode::ACCEPTED, Json(CheckoutAccepted { attempt_id })))
}

async fn get_attempt(
    state: State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    let status = state
        .attempt(&attempt_id)
        .await
        .ok_or(CheckoutApiError::NotFound)?;
    Ok(Json(status))
}

/// `POST /checkout/dismiss` – hide the wallet modal.
///
/// Before a wallet session exists this cancels the running attempt.
async fn dismiss_modal(state: State<AppState>) -> impl IntoResponse {
    let was_open = state.modal.dismiss();
    tracing::debug!(
        was_open,
        in_flight = state.attempt_in_flight(),
        "Modal dismissed by buyer"
    );
    StatusCode::NO_CONTENT
}

enum CheckoutApiError {
    EmptyCart,
    AttemptInFlight,
    NotFound,
}

impl IntoResponse for CheckoutApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            CheckoutApiError::EmptyCart => (StatusCode::BAD_REQUEST, "cart is empty").into_response(),
            CheckoutApiError::AttemptInFlight => {
                (StatusCode::CONFLICT, "a checkout attempt is already running").into_response()
            }
            CheckoutApiError::NotFound => {
                (StatusCode::NOT_FOUND, "attempt not found").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::server::build_router;
    use crate::testing::{UNUSED_RATE_URL, send, test_state, wait_for_modal, wait_for_outcome};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let state = test_state(UNUSED_RATE_URL).await;
        let router = build_router(state.clone());

        let (status, _) = send(
            &router,
            Method::POST,
            "/api/v1/checkout",
            Some(json!({ "payment_method": "crypto" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!state.attempt_in_flight());
    }

    #[tokio::test]
    async fn test_card_checkout_clears_cart() {
        let router = build_router(test_state(UNUSED_RATE_URL).await);
        send(
            &router,
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({ "product_id": "1", "size": "M" })),
        )
        .await;

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/v1/checkout",
            Some(json!({ "payment_method": "credit-card" })),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let attempt_id = body["attempt_id"].as_str().unwrap().to_string();

        let status = wait_for_outcome(&router, &attempt_id).await;
        assert_eq!(status["payment_method"], "credit-card");
        assert_eq!(status["outcome"]["status"], "success");
        assert!(
            status["outcome"]["transaction_ref"]
                .as_str()
                .unwrap()
                .starts_with("card_")
        );
        assert_eq!(status["started_at"], 1_700_000_000);

        let (_, cart) = send(&router, Method::GET, "/api/v1/cart", None).await;
        assert_eq!(cart["total_items"], 0);
    }

    #[tokio::test]
    async fn test_second_attempt_conflicts_until_dismissed() {
        let state = test_state(UNUSED_RATE_URL).await;
        let router = build_router(state.clone());
        send(
            &router,
            Method::PATCH,
            "/api/v1/settings",
            Some(json!({ "recipientAddress": "0xabc" })),
        )
        .await;
        send(
            &router,
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({ "product_id": "2", "size": "One Size" })),
        )
        .await;

        let crypto = json!({ "payment_method": "crypto" });
        let (status, body) =
            send(&router, Method::POST, "/api/v1/checkout", Some(crypto.clone())).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let attempt_id = body["attempt_id"].as_str().unwrap().to_string();

        wait_for_modal(&state).await;
        let (status, _) = send(&router, Method::POST, "/api/v1/checkout", Some(crypto)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(&router, Method::POST, "/api/v1/checkout/dismiss", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let status = wait_for_outcome(&router, &attempt_id).await;
        assert_eq!(status["outcome"]["status"], "cancelled");

        let (_, cart) = send(&router, Method::GET, "/api/v1/cart", None).await;
        assert_eq!(cart["total_items"], 1);
    }

    #[tokio::test]
    async fn test_unknown_attempt() {
        let router = build_router(test_state(UNUSED_RATE_URL).await);

        let (status, _) = send(
            &router,
            Method::GET,
            "/api/v1/checkout/0190f0e4-0000-7000-8000-000000000000",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&router, Method::GET, "/api/v1/checkout/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
