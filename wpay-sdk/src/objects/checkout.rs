//! Checkout attempt objects.

use super::asset::PaymentAsset;
use super::catalog::{PaymentMethod, ShippingInfo};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `POST /api/v1/checkout`
///
/// The cart is snapshotted server-side when the attempt starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub shipping: ShippingInfo,
    /// Falls back to the settings' asset when absent.
    #[serde(default)]
    pub payment_asset: Option<PaymentAsset>,
}

/// Response of `POST /api/v1/checkout` (202 Accepted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutAccepted {
    pub attempt_id: Uuid,
}

/// Lifecycle of one wallet session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Initializing,
    AwaitingApproval,
    Approved,
    Extracting,
    Closed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed)
    }
}

/// Machine-readable failure reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    EmptyCart,
    MissingRecipient,
    UnsupportedAsset,
    RateUnavailable,
    UserCancelled,
    NoSession,
    RequestNotProcessed,
    HandleSpent,
    InvalidAmount,
    ProviderError,
}

/// Terminal outcome of a checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckoutOutcomeView {
    Success { transaction_ref: String },
    Failure { code: FailureCode, reason: String },
    Cancelled,
}

/// Response of `GET /api/v1/checkout/{attempt_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptStatus {
    pub attempt_id: Uuid,
    pub payment_method: PaymentMethod,
    /// `None` while the attempt is still running.
    pub outcome: Option<CheckoutOutcomeView>,
    /// Unix timestamp of when the attempt started.
    pub started_at: i64,
}
