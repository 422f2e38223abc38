//! Storefront API client (checkout frontend → storefront server).

use futures_util::{SinkExt, Stream, StreamExt};
use reqwest::Client;
use rust_decimal::Decimal;
use std::pin::Pin;
use tokio_tungstenite::tungstenite::Message;
use url::Url;
use uuid::Uuid;

use super::ClientError;
use crate::objects::{
    AddCartItem, AttemptStatus, CartView, CheckoutAccepted, CheckoutRequest, PaymentAssetOption,
    Product, QuoteResponse, RemoveCartItem, Settings, SettingsPatch, UpdateCartItem,
    WsClientMessage, WsServerMessage,
};

/// Typed HTTP client for the storefront API.
#[derive(Debug, Clone)]
pub struct StorefrontClient {
    http: Client,
    base_url: Url,
}

/// Stream of checkout session events read from the WebSocket.
pub type SessionStream = Pin<Box<dyn Stream<Item = Result<WsServerMessage, ClientError>> + Send>>;

impl StorefrontClient {
    /// Create a new client for the server rooted at `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `GET /api/v1/products`
    pub async fn list_products(&self) -> Result<Vec<Product>, ClientError> {
        let url = self.base_url.join("/api/v1/products")?;
        parse_response(self.http.get(url).send().await?).await
    }

    /// `GET /api/v1/products/{id}`
    pub async fn get_product(&self, id: &str) -> Result<Product, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/products/{}", urlencoding::encode(id)))?;
        parse_response(self.http.get(url).send().await?).await
    }

    /// `GET /api/v1/assets`
    pub async fn list_assets(&self) -> Result<Vec<PaymentAssetOption>, ClientError> {
        let url = self.base_url.join("/api/v1/assets")?;
        parse_response(self.http.get(url).send().await?).await
    }

    /// `GET /api/v1/cart`
    pub async fn get_cart(&self) -> Result<CartView, ClientError> {
        let url = self.base_url.join("/api/v1/cart")?;
        parse_response(self.http.get(url).send().await?).await
    }

    /// `POST /api/v1/cart/items`
    pub async fn add_item(&self, item: &AddCartItem) -> Result<CartView, ClientError> {
        let url = self.base_url.join("/api/v1/cart/items")?;
        parse_response(self.http.post(url).json(item).send().await?).await
    }

    /// `PATCH /api/v1/cart/items`
    pub async fn update_item(&self, item: &UpdateCartItem) -> Result<CartView, ClientError> {
        let url = self.base_url.join("/api/v1/cart/items")?;
        parse_response(self.http.patch(url).json(item).send().await?).await
    }

    /// `DELETE /api/v1/cart/items`
    pub async fn remove_item(&self, item: &RemoveCartItem) -> Result<CartView, ClientError> {
        let url = self.base_url.join("/api/v1/cart/items")?;
        parse_response(self.http.delete(url).json(item).send().await?).await
    }

    /// `DELETE /api/v1/cart`
    pub async fn clear_cart(&self) -> Result<CartView, ClientError> {
        let url = self.base_url.join("/api/v1/cart")?;
        parse_response(self.http.delete(url).send().await?).await
    }

    /// `GET /api/v1/settings`
    pub async fn get_settings(&self) -> Result<Settings, ClientError> {
        let url = self.base_url.join("/api/v1/settings")?;
        parse_response(self.http.get(url).send().await?).await
    }

    /// `PATCH /api/v1/settings`
    pub async fn update_settings(&self, patch: &SettingsPatch) -> Result<Settings, ClientError> {
        let url = self.base_url.join("/api/v1/settings")?;
        parse_response(self.http.patch(url).json(patch).send().await?).await
    }

    /// `DELETE /api/v1/settings` – restore defaults.
    pub async fn reset_settings(&self) -> Result<Settings, ClientError> {
        let url = self.base_url.join("/api/v1/settings")?;
        parse_response(self.http.delete(url).send().await?).await
    }

    /// `GET /api/v1/quote?amount=…&symbols=…`
    pub async fn quote(
        &self,
        usd_amount: Decimal,
        symbols: &[&str],
    ) -> Result<QuoteResponse, ClientError> {
        let url = self.base_url.join("/api/v1/quote")?;
        let amount = usd_amount.to_string();
        let symbols = symbols.join(",");
        let resp = self
            .http
            .get(url)
            .query(&[("amount", amount.as_str()), ("symbols", symbols.as_str())])
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/checkout` – start an attempt for the current cart.
    pub async fn start_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutAccepted, ClientError> {
        let url = self.base_url.join("/api/v1/checkout")?;
        parse_response(self.http.post(url).json(request).send().await?).await
    }

    /// `GET /api/v1/checkout/{attempt_id}`
    pub async fn attempt_status(&self, attempt_id: Uuid) -> Result<AttemptStatus, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/checkout/{attempt_id}"))?;
        parse_response(self.http.get(url).send().await?).await
    }

    /// `POST /api/v1/checkout/dismiss` – close the wallet modal.
    pub async fn dismiss(&self) -> Result<(), ClientError> {
        let url = self.base_url.join("/api/v1/checkout/dismiss")?;
        let resp = self.http.post(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }
        Ok(())
    }

    /// `GET /api/v1/checkout/ws` – subscribe to session events.
    ///
    /// Returns the event stream and a sender that dismisses the modal when
    /// called.
    pub async fn session_stream(&self) -> Result<(SessionStream, DismissHandle), ClientError> {
        let mut url = self.base_url.join("/api/v1/checkout/ws")?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        // Switching between special schemes always succeeds.
        let _ = url.set_scheme(scheme);

        let (socket, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
        let (sink, stream) = socket.split();

        let events = stream.filter_map(|frame| async move {
            match frame {
                Ok(Message::Text(text)) => Some(
                    serde_json::from_str::<WsServerMessage>(&text).map_err(ClientError::Json),
                ),
                Ok(_) => None,
                Err(e) => Some(Err(ClientError::WebSocket(e))),
            }
        });

        Ok((Box::pin(events), DismissHandle { sink }))
    }
}

type WsSink = futures_util::stream::SplitSink<
    tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    Message,
>;

/// Write half of the session WebSocket.
pub struct DismissHandle {
    sink: WsSink,
}

impl DismissHandle {
    /// Tell the server the buyer closed the modal.
    pub async fn dismiss(&mut self) -> Result<(), ClientError> {
        let json = serde_json::to_string(&WsClientMessage::Dismiss)?;
        self.sink.send(Message::Text(json.into())).await?;
        Ok(())
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}
