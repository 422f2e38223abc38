use thiserror::Error;
use wpay_sdk::objects::{CheckoutOutcomeView, FailureCode};

/// Why a checkout attempt did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("your cart is empty")]
    EmptyCart,

    #[error("no recipient address configured, set one in settings")]
    MissingRecipient,

    #[error("unsupported asset: {0}")]
    UnsupportedAsset(String),

    #[error("exchange rate unavailable: {0}")]
    RateUnavailable(String),

    /// The buyer dismissed the modal before a wallet connected.
    #[error("connection request reset, please try again")]
    UserCancelled,

    #[error("no wallet session was established")]
    NoSession,

    /// The wallet connected but did not act on the payment request.
    #[error("payment request was not processed by the wallet")]
    RequestNotProcessed,

    /// `send` was called on a handle that already ran a negotiation.
    #[error("wallet session handle has already been used")]
    HandleSpent,

    #[error("invalid payment amount: {0}")]
    InvalidAmount(String),

    #[error("{message}")]
    ProviderError { message: String },
}

impl CheckoutError {
    pub fn provider(message: impl Into<String>) -> Self {
        CheckoutError::ProviderError {
            message: message.into(),
        }
    }

    pub fn code(&self) -> FailureCode {
        match self {
            CheckoutError::EmptyCart => FailureCode::EmptyCart,
            CheckoutError::MissingRecipient => FailureCode::MissingRecipient,
            CheckoutError::UnsupportedAsset(_) => FailureCode::UnsupportedAsset,
            CheckoutError::RateUnavailable(_) => FailureCode::RateUnavailable,
            CheckoutError::UserCancelled => FailureCode::UserCancelled,
            CheckoutError::NoSession => FailureCode::NoSession,
            CheckoutError::RequestNotProcessed => FailureCode::RequestNotProcessed,
            CheckoutError::HandleSpent => FailureCode::HandleSpent,
            CheckoutError::InvalidAmount(_) => FailureCode::InvalidAmount,
            CheckoutError::ProviderError { .. } => FailureCode::ProviderError,
        }
    }
}

/// Terminal result of one checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Success { transaction_ref: String },
    Failure { reason: CheckoutError },
    /// The buyer backed out. Reported without an error.
    Cancelled,
}

impl CheckoutOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CheckoutOutcome::Success { .. })
    }

    pub fn view(&self) -> CheckoutOutcomeView {
        match self {
            CheckoutOutcome::Success { transaction_ref } => CheckoutOutcomeView::Success {
                transaction_ref: transaction_ref.clone(),
            },
            CheckoutOutcome::Failure { reason } => CheckoutOutcomeView::Failure {
                code: reason.code(),
                reason: reason.to_string(),
            },
            CheckoutOutcome::Cancelled => CheckoutOutcomeView::Cancelled,
        }
    }
}

impl From<CheckoutError> for CheckoutOutcome {
    fn from(reason: CheckoutError) -> Self {
        match reason {
            CheckoutError::UserCancelled => CheckoutOutcome::Cancelled,
            reason => CheckoutOutcome::Failure { reason },
        }
    }
}
