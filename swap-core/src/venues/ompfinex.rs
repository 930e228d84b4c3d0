//! Typed client for the OMPFinex REST API.
//!
//! Responses arrive in a `{status, data, message}` envelope; any status
//! other than `"OK"` is surfaced as a [`VenueError::Api`] enriched with
//! the message. Depth levels arrive as `[price, quantity]` string pairs;
//! malformed pairs are dropped during normalization.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use swap_common::depth::{BookLevel, MarketDepth};
use swap_common::markets::Venue;
use swap_common::orders::OrderSide;
use swap_common::venue::{PlacedOrder, VenueClient, VenueError, VenueMarketListing, VenueResult};

use super::transport_error;

/// OMPFinex REST client.
pub struct OmpfinexClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl OmpfinexClient {
    /// Create a client for the given base URL with a bearer token.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> VenueResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VenueError::Configuration(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> VenueResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
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
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        Self::decode_envelope(response).await
    }

    async fn decode_envelope<T: DeserializeOwned>(response: reqwest::Response) -> VenueResult<T> {
        let status = response.status();
        let envelope: Envelope<T> = response.json().await.map_err(transport_error)?;

        if !status.is_success() || envelope.status != "OK" {
            return Err(VenueError::api(
                Some(status.as_u16()),
                envelope
                    .message
                    .unwrap_or_else(|| format!("status {}", envelope.status)),
            ));
        }
        envelope
            .data
            .ok_or_else(|| VenueError::Parse("missing data field".to_string()))
    }
}

#[async_trait]
impl VenueClient for OmpfinexClient {
    fn venue(&self) -> Venue {
        Venue::Ompfinex
    }

    async fn list_markets(&self) -> VenueResult<Vec<VenueMarketListing>> {
        let markets: Vec<Market> = self.get_json("/v1/market").await?;
        debug!(count = markets.len(), "ompfinex markets listed");

        Ok(markets
            .into_iter()
            .map(|m| VenueMarketListing {
                venue_symbol: m.id.to_string(),
                base_asset: m.base_currency.id,
                quote_asset: m.quote_currency.id,
                fee_percentage: Decimal::ZERO,
            })
            .collect())
    }

    async fn get_depth(&self, venue_symbol: &str) -> VenueResult<MarketDepth> {
        let book: OrderBook = self
            .get_json(&format!("/v1/market/{venue_symbol}/depth?limit=200"))
            .await?;

        Ok(MarketDepth::new(
            parse_levels(&book.asks),
            parse_levels(&book.bids),
        ))
    }

    async fn place_market_order(
        &self,
        venue_symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> VenueResult<PlacedOrder> {
        let market_id: i64 = venue_symbol
            .parse()
            .map_err(|_| VenueError::Parse(format!("non-numeric market id: {venue_symbol}")))?;

        let request = PlaceOrderRequest {
            market_id,
            side: match side {
                OrderSide::Buy => "buy",
                OrderSide::Sell => "sell",
            },
            order_type: "market",
            amount: quantity,
        };

        let placed: OrderAck = self
            .post_json(&format!("/v1/market/{market_id}/order"), &request)
            .await?;

        Ok(PlacedOrder {
            venue_order_ref: placed.id.to_string(),
        })
    }
}

/// Parse `[price, quantity]` string pairs, skipping malformed entries.
fn parse_levels(raw: &[Vec<String>]) -> Vec<BookLevel> {
    raw.iter()
        .filter_map(|pair| {
            if pair.len() != 2 {
                return None;
            }
            let price = pair[0].parse::<Decimal>().ok()?;
            let quantity = pair[1].parse::<Decimal>().ok()?;
            Some(BookLevel::new(price, quantity))
        })
        .collect()
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    data: Option<T>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CurrencyInfo {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Market {
    id: i64,
    base_currency: CurrencyInfo,
    quote_currency: CurrencyInfo,
}

#[derive(Debug, Deserialize)]
struct OrderBook {
    #[serde(default)]
    asks: Vec<Vec<String>>,
    #[serde(default)]
    bids: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct PlaceOrderRequest {
    market_id: i64,
    side: &'static str,
    #[serde(rename = "type")]
    order_type: &'static str,
    amount: Decimal,
}

#[derive(Debug, Deserialize)]
struct OrderAck {
    id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use swap_common::depth::BookSide;

    #[test]
    fn test_parse_levels_skips_malformed() {
        let raw = vec![
            vec!["100.5".to_string(), "2".to_string()],
            vec!["oops".to_string(), "2".to_string()],
            vec!["101".to_string()],
            vec!["102".to_string(), "1.5".to_string()],
        ];

        let levels = parse_levels(&raw);
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0], BookLevel::new(dec!(100.5), dec!(2)));
        assert_eq!(levels[1], BookLevel::new(dec!(102), dec!(1.5)));
    }

    #[test]
    fn test_envelope_deserialization() {
        let json = r#"{
            "status": "OK",
            "data": {"lastUpdateId": 1, "asks": [["100", "1"]], "bids": [["99", "2"]]},
            "time": "12:00"
        }"#;

        let envelope: Envelope<OrderBook> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.status, "OK");
        let book = envelope.data.unwrap();
        let depth = MarketDepth::new(parse_levels(&book.asks), parse_levels(&book.bids));
        assert_eq!(depth.best(BookSide::Asks).unwrap().price, dec!(100));
        assert_eq!(depth.best(BookSide::Bids).unwrap().price, dec!(99));
    }

    #[test]
    fn test_market_listing_deserialization() {
        let json = r#"{
            "status": "OK",
            "data": [{
                "id": 7,
                "base_currency": {"id": "ETH", "icon_path": "", "name": "Ethereum"},
                "quote_currency": {"id": "USDT", "icon_path": "", "name": "Tether"},
                "name": "ETH/USDT"
            }]
        }"#;

        let envelope: Envelope<Vec<Market>> = serde_json::from_str(json).unwrap();
        let markets = envelope.data.unwrap();
        assert_eq!(markets[0].id, 7);
        assert_eq!(markets[0].base_currency.id, "ETH");
    }
}
