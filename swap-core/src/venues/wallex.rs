//! Typed client for the Wallex REST API.
//!
//! Responses follow a `{result, message, success}` envelope; when
//! `success != true` the error is enriched with the message. Depth
//! levels are typed `{price, quantity}` objects. Authenticated endpoints
//! require an `x-api-key` header.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use swap_common::depth::{BookLevel, MarketDepth};
use swap_common::markets::Venue;
use swap_common::orders::OrderSide;
use swap_common::venue::{PlacedOrder, VenueClient, VenueError, VenueMarketListing, VenueResult};

use super::transport_error;

/// Wallex REST client.
pub struct WallexClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WallexClient {
    /// Create a client for the given base URL with an API key.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> VenueResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VenueError::Configuration(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> VenueResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(transport_error)?;
        Self::decode_envelope(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> VenueResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        Self::decode_envelope(response).await
    }

    async fn decode_envelope<T: DeserializeOwned>(response: reqwest::Response) -> VenueResult<T> {
        let status = response.status();
        let envelope: Envelope<T> = response.json().await.map_err(transport_error)?;

        if !status.is_success() || !envelope.success {
            return Err(VenueError::api(Some(status.as_u16()), envelope.message));
        }
        envelope
            .result
            .ok_or_else(|| VenueError::Parse("missing result field".to_string()))
    }
}

#[async_trait]
impl VenueClient for WallexClient {
    fn venue(&self) -> Venue {
        Venue::Wallex
    }

    async fn list_markets(&self) -> VenueResult<Vec<VenueMarketListing>> {
        let result: MarketsResult = self.get_json("/hector/web/v1/markets").await?;
        debug!(count = result.markets.len(), "wallex markets listed");

        Ok(result
            .markets
            .into_iter()
            .map(|m| VenueMarketListing {
                venue_symbol: m.symbol,
                base_asset: m.en_base_asset,
                quote_asset: m.en_quote_asset,
                fee_percentage: Decimal::ZERO,
            })
            .collect())
    }

    async fn get_depth(&self, venue_symbol: &str) -> VenueResult<MarketDepth> {
        let book: OrderBook = self
            .get_json(&format!("/v1/depth?symbol={venue_symbol}"))
            .await?;

        Ok(MarketDepth::new(
            book.ask.into_iter().map(BookLevel::from).collect(),
            book.bid.into_iter().map(BookLevel::from).collect(),
        ))
    }

    async fn place_market_order(
        &self,
        venue_symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> VenueResult<PlacedOrder> {
        if quantity <= Decimal::ZERO {
            return Err(VenueError::order_rejected("quantity must be positive"));
        }

        let request = PlaceMarketOrderRequest {
            symbol: venue_symbol,
            side: match side {
                OrderSide::Buy => "BUY",
                OrderSide::Sell => "SELL",
            },
            order_type: "market",
            quantity,
            from: "otc",
        };

        let placed: OrderResponse = self
            .post_json("/v1/account/easy-trade/orders", &request)
            .await?;

        Ok(PlacedOrder {
            venue_order_ref: placed.client_order_id,
        })
    }
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: Option<T>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Deserialize)]
struct MarketsResult {
    markets: Vec<Market>,
}

#[derive(Debug, Deserialize)]
struct Market {
    symbol: String,
    en_base_asset: String,
    en_quote_asset: String,
}

#[derive(Debug, Deserialize)]
struct OrderBookEntry {
    price: Decimal,
    quantity: Decimal,
}

impl From<OrderBookEntry> for BookLevel {
    fn from(entry: OrderBookEntry) -> Self {
        BookLevel::new(entry.price, entry.quantity)
    }
}

#[derive(Debug, Deserialize)]
struct OrderBook {
    #[serde(default)]
    ask: Vec<OrderBookEntry>,
    #[serde(default)]
    bid: Vec<OrderBookEntry>,
}

#[derive(Debug, Serialize)]
struct PlaceMarketOrderRequest<'a> {
    symbol: &'a str,
    side: &'static str,
    #[serde(rename = "type")]
    order_type: &'static str,
    quantity: Decimal,
    from: &'static str,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    #[serde(rename = "clientOrderId")]
    client_order_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use swap_common::depth::BookSide;

    #[test]
    fn test_depth_envelope_deserialization() {
        let json = r#"{
            "result": {
                "ask": [{"price": "101", "quantity": "1.0", "sum": "101"}],
                "bid": [{"price": "100", "quantity": "2.0", "sum": "200"}]
            },
            "message": "",
            "success": true
        }"#;

        let envelope: Envelope<OrderBook> = serde_json::from_str(json).unwrap();
        assert!(envelope.success);
        let book = envelope.result.unwrap();
        let depth = MarketDepth::new(
            book.ask.into_iter().map(BookLevel::from).collect(),
            book.bid.into_iter().map(BookLevel::from).collect(),
        );
        assert_eq!(depth.best(BookSide::Asks).unwrap().price, dec!(101));
        assert_eq!(depth.best(BookSide::Bids).unwrap().quantity, dec!(2.0));
    }

    #[test]
    fn test_failed_envelope_carries_message() {
        let json = r#"{"result": null, "message": "invalid symbol", "success": false}"#;
        let envelope: Envelope<OrderBook> = serde_json::from_str(json).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.message, "invalid symbol");
    }

    #[test]
    fn test_markets_deserialization() {
        let json = r#"{
            "result": {"markets": [{
                "symbol": "ETHUSDT",
                "base_asset": "ETH",
                "quote_asset": "USDT",
                "en_base_asset": "ETH",
                "en_quote_asset": "USDT",
                "price": "2000"
            }]},
            "message": "",
            "success": true
        }"#;

        let envelope: Envelope<MarketsResult> = serde_json::from_str(json).unwrap();
        let markets = envelope.result.unwrap().markets;
        assert_eq!(markets[0].symbol, "ETHUSDT");
        assert_eq!(markets[0].en_base_asset, "ETH");
    }
}
