//! Alpaca REST broker client.
//!
//! Trading endpoints live on the paper or live API host, quotes on the
//! market data host. Orders are market orders; submission polls the order
//! until it reaches a terminal status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{Duration, Instant};

use super::broker::OrderSizing;
use crate::domain::error::SilkroadError;
use crate::domain::execution::OrderSide;
use crate::ports::broker_port::{BrokerClient, BrokerFill};

pub const NAME: &str = "alpaca";

const PAPER_URL: &str = "https://paper-api.alpaca.markets";
const LIVE_URL: &str = "https://api.alpaca.markets";
const DATA_URL: &str = "https://data.alpaca.markets";
const KEY_ENV: &str = "APCA_API_KEY_ID";
const SECRET_ENV: &str = "APCA_API_SECRET_KEY";
const POLL_EVERY: Duration = Duration::from_millis(500);

/// `execution.parameters` for the alpaca engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlpacaParameters {
    pub key_id: Option<String>,
    pub secret_key: Option<String>,
    pub paper: bool,
    pub base_url: Option<String>,
    pub data_url: Option<String>,
    pub timeout_secs: u64,
    pub fill_timeout_secs: u64,
    pub quantity_precision: u32,
}

impl Default for AlpacaParameters {
    fn default() -> Self {
        AlpacaParameters {
            key_id: None,
            secret_key: None,
            paper: true,
            base_url: None,
            data_url: None,
            timeout_secs: 10,
            fill_timeout_secs: 30,
            quantity_precision: 0,
        }
    }
}

impl AlpacaParameters {
    pub fn from_parameters(params: &Map<String, Value>) -> Result<Self, SilkroadError> {
        serde_json::from_value(Value::Object(params.clone())).map_err(|e| {
            SilkroadError::InvalidParameters {
                component: "execution engine 'alpaca'".to_string(),
                reason: e.to_string(),
            }
        })
    }

    pub fn sizing(&self) -> OrderSizing {
        OrderSizing {
            quantity_precision: self.quantity_precision,
        }
    }

    fn trading_url(&self) -> &str {
        match &self.base_url {
            Some(url) => url,
            None if self.paper => PAPER_URL,
            None => LIVE_URL,
        }
    }
}

#[derive(Debug, Serialize)]
struct OrderRequest<'a> {
    symbol: &'a str,
    qty: String,
    side: &'a str,
    #[serde(rename = "type")]
    order_type: &'a str,
    time_in_force: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
    pub filled_avg_price: Option<String>,
    pub filled_qty: Option<String>,
    pub filled_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Account {
    equity: String,
}

#[derive(Debug, Deserialize)]
struct PositionResponse {
    qty: String,
    side: String,
}

/// Where an order stands after a status poll.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderState {
    Pending,
    Filled(BrokerFill),
    Failed(String),
}

pub struct AlpacaClient {
    http: reqwest::blocking::Client,
    key_id: String,
    secret_key: String,
    trading_url: String,
    data_url: String,
    fill_timeout: Duration,
}

impl AlpacaClient {
    pub fn new(params: &AlpacaParameters) -> Result<Self, SilkroadError> {
        let credential = |value: &Option<String>, env: &str| {
            value
                .clone()
                .or_else(|| std::env::var(env).ok())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| SilkroadError::InvalidParameters {
                    component: "execution engine 'alpaca'".to_string(),
                    reason: format!("missing credentials: set parameters or {env}"),
                })
        };
        let key_id = credential(&params.key_id, KEY_ENV)?;
        let secret_key = credential(&params.secret_key, SECRET_ENV)?;

        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(params.timeout_secs))
            .build()
            .map_err(|e| broker_error(format!("failed to build HTTP client: {e}")))?;

        let trading_url = params.trading_url().trim_end_matches('/').to_string();
        tracing::info!(url = %trading_url, paper = params.paper, "alpaca client ready");
        Ok(Self {
            http,
            key_id,
            secret_key,
            trading_url,
            data_url: params
                .data_url
                .as_deref()
                .unwrap_or(DATA_URL)
                .trim_end_matches('/')
                .to_string(),
            fill_timeout: Duration::from_secs(params.fill_timeout_secs),
        })
    }

    fn get(&self, url: &str) -> Result<Option<reqwest::blocking::Response>, SilkroadError> {
        let response = self
            .http
            .get(url)
            .header("APCA-API-KEY-ID", &self.key_id)
            .header("APCA-API-SECRET-KEY", &self.secret_key)
            .send()
            .map_err(|e| broker_error(format!("request failed: {e}")))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        check_status(response).map(Some)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<Option<T>, SilkroadError> {
        match self.get(url)? {
            Some(response) => response
                .json()
                .map(Some)
                .map_err(|e| broker_error(format!("invalid response from {url}: {e}"))),
            None => Ok(None),
        }
    }

    fn order_status(&self, id: &str) -> Result<OrderResponse, SilkroadError> {
        let url = format!("{}/v2/orders/{id}", self.trading_url);
        self.get_json(&url)?
            .ok_or_else(|| broker_error(format!("order {id} not found")))
    }
}

fn broker_error(reason: impl Into<String>) -> SilkroadError {
    SilkroadError::Broker {
        broker: NAME.to_string(),
        reason: reason.into(),
    }
}

fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, SilkroadError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(broker_error(format!("HTTP {status}: {body}")))
}

/// Crypto pairs are written with a slash, e.g. `BTC/USD`.
pub fn is_crypto(symbol: &str) -> bool {
    symbol.contains('/')
}

/// Position endpoints drop the slash from crypto pairs.
pub fn position_symbol(symbol: &str) -> String {
    symbol.replace('/', "")
}

pub fn time_in_force(symbol: &str) -> &'static str {
    if is_crypto(symbol) { "gtc" } else { "day" }
}

fn parse_decimal(raw: &str, field: &str) -> Result<f64, SilkroadError> {
    raw.parse()
        .map_err(|_| broker_error(format!("invalid {field} '{raw}'")))
}

/// Signed quantity from a position payload.
fn signed_quantity(position: &PositionResponse) -> Result<f64, SilkroadError> {
    let qty = parse_decimal(&position.qty, "qty")?.abs();
    Ok(if position.side == "short" { -qty } else { qty })
}

/// Trade price from a latest-trade payload.
pub fn latest_trade_price(symbol: &str, payload: &Value) -> Option<f64> {
    let trade = if is_crypto(symbol) {
        payload.get("trades")?.get(symbol)?
    } else {
        payload.get("trade")?
    };
    trade.get("p")?.as_f64()
}

pub fn order_state(order: &OrderResponse, side: OrderSide) -> Result<OrderState, SilkroadError> {
    match order.status.as_str() {
        "filled" => {
            let price = order
                .filled_avg_price
                .as_deref()
                .ok_or_else(|| broker_error(format!("order {} filled without a price", order.id)))?;
            let quantity = order.filled_qty.as_deref().unwrap_or("0");
            let timestamp = order
                .filled_at
                .as_deref()
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map_or_else(Utc::now, |t| t.with_timezone(&Utc));
            Ok(OrderState::Filled(BrokerFill {
                timestamp,
                side,
                quantity: parse_decimal(quantity, "filled_qty")?,
                price: parse_decimal(price, "filled_avg_price")?,
            }))
        }
        "canceled" | "expired" | "rejected" | "done_for_day" | "suspended" => Ok(
            OrderState::Failed(format!("order {} ended as {}", order.id, order.status)),
        ),
        _ => Ok(OrderState::Pending),
    }
}

impl BrokerClient for AlpacaClient {
    fn name(&self) -> &str {
        NAME
    }

    fn account_equity(&mut self) -> Result<f64, SilkroadError> {
        let url = format!("{}/v2/account", self.trading_url);
        let account: Account = self
            .get_json(&url)?
            .ok_or_else(|| broker_error("account not found"))?;
        parse_decimal(&account.equity, "equity")
    }

    fn position(&mut self, symbol: &str) -> Result<f64, SilkroadError> {
        let url = format!("{}/v2/positions/{}", self.trading_url, position_symbol(symbol));
        match self.get_json::<PositionResponse>(&url)? {
            Some(position) => signed_quantity(&position),
            None => Ok(0.0),
        }
    }

    fn last_price(&mut self, symbol: &str) -> Result<Option<f64>, SilkroadError> {
        let url = if is_crypto(symbol) {
            format!("{}/v1beta3/crypto/us/latest/trades?symbols={symbol}", self.data_url)
        } else {
            format!("{}/v2/stocks/{symbol}/trades/latest", self.data_url)
        };
        let payload: Option<Value> = self.get_json(&url)?;
        Ok(payload.and_then(|p| latest_trade_price(symbol, &p)))
    }

    fn submit_market_order(
        &mut self,
        symbol: &str,
        side: OrderSide,
        quantity: f64,
    ) -> Result<Vec<BrokerFill>, SilkroadError> {
        let request = OrderRequest {
            symbol,
            qty: quantity.to_string(),
            side: side.as_str(),
            order_type: "market",
            time_in_force: time_in_force(symbol),
        };
        let response = self
            .http
            .post(format!("{}/v2/orders", self.trading_url))
            .header("APCA-API-KEY-ID", &self.key_id)
            .header("APCA-API-SECRET-KEY", &self.secret_key)
            .json(&request)
            .send()
            .map_err(|e| broker_error(format!("order submission failed: {e}")))?;
        let mut order: OrderResponse = check_status(response)?
            .json()
            .map_err(|e| broker_error(format!("invalid order response: {e}")))?;
        tracing::info!(id = %order.id, symbol, side = side.as_str(), quantity, "order submitted");

        let deadline = Instant::now() + self.fill_timeout;
        loop {
            match order_state(&order, side)? {
                OrderState::Filled(fill) => return Ok(vec![fill]),
                OrderState::Failed(reason) => return Err(broker_error(reason)),
                OrderState::Pending if Instant::now() >= deadline => {
                    return Err(broker_error(format!(
                        "order {} not filled within {}s (status {})",
                        order.id,
                        self.fill_timeout.as_secs(),
                        order.status
                    )));
                }
                OrderState::Pending => {
                    std::thread::sleep(POLL_EVERY);
                    order = self.order_status(&order.id)?;
                }
            }
        }
    }
}
