pub mod asset;
pub mod catalog;
pub mod checkout;
pub mod networks;
pub mod price;
pub mod settings;
pub mod wallet_pay;
pub mod ws;

pub use asset::{AssetMetadata, PaymentAsset, PaymentAssetOption, Stablecoin};
pub use catalog::{
    AddCartItem, CartItem, CartView, PaymentMethod, Product, RemoveCartItem, ShippingInfo,
    UpdateCartItem,
};
pub use checkout::{
    AttemptStatus, CheckoutAccepted, CheckoutOutcomeView, CheckoutRequest, FailureCode,
    SessionState,
};
pub use networks::Network;
pub use price::{QuoteLine, QuoteResponse, SimplePriceResponse, UsdQuote};
pub use settings::{Settings, SettingsPatch};
pub use wallet_pay::{
    AcceptedPayment, AppMetadata, NamespaceConfig, PendingRequest, Session, WALLET_PAY_METHOD,
    WALLET_PAY_VERSION, WalletPayRequest,
};
pub use ws::{WsClientMessage, WsServerMessage};
