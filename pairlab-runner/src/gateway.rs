//! Trading gateway: the live-execution collaborator.
//!
//! The backtest core never calls this module. A ledger produced by a run can
//! be mirrored into any `TradingGateway`; the bundled `PaperGateway` records
//! orders in memory and fills them at the ledger prices.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use pairlab_core::domain::{LegDirection, PositionSide, Trade, TradeKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::BacktestConfig;

/// Errors from the gateway layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    #[error("please fill in all fields: '{0}' is empty")]
    MissingField(&'static str),

    #[error("unknown exchange '{0}' (expected binance, bybit or okx)")]
    UnknownExchange(String),

    #[error("gateway is not connected")]
    NotConnected,

    #[error("exit at {0} has no open position to close")]
    UnmatchedExit(DateTime<Utc>),
}

/// Supported exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exchange {
    #[default]
    Binance,
    Bybit,
    Okx,
}

impl Exchange {
    pub fn as_str(self) -> &'static str {
        match self {
            Exchange::Binance => "binance",
            Exchange::Bybit => "bybit",
            Exchange::Okx => "okx",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binance" => Ok(Exchange::Binance),
            "bybit" => Ok(Exchange::Bybit),
            "okx" => Ok(Exchange::Okx),
            other => Err(GatewayError::UnknownExchange(other.to_string())),
        }
    }
}

/// API credentials. Every field is required.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    api_key: String,
    secret_key: String,
    exchange: Exchange,
}

impl Credentials {
    pub fn new(api_key: &str, secret_key: &str, exchange: &str) -> Result<Self, GatewayError> {
        let api_key = api_key.trim();
        let secret_key = secret_key.trim();
        if api_key.is_empty() {
            return Err(GatewayError::MissingField("api_key"));
        }
        if secret_key.is_empty() {
            return Err(GatewayError::MissingField("secret_key"));
        }
        if exchange.trim().is_empty() {
            return Err(GatewayError::MissingField("exchange"));
        }
        Ok(Self {
            api_key: api_key.to_string(),
            secret_key: secret_key.to_string(),
            exchange: exchange.parse()?,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn exchange(&self) -> Exchange {
        self.exchange
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &"***")
            .field("exchange", &self.exchange)
            .finish()
    }
}

/// An authenticated connection handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub exchange: Exchange,
    pub session_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    fn from_sign(sign: f64) -> Self {
        if sign > 0.0 {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        }
    }

    fn reversed(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

/// A market order for one leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
    /// Ledger price the order is expected to fill near.
    pub reference_price: f64,
}

/// Exchange acknowledgement of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
    pub fill_price: f64,
    pub request: OrderRequest,
}

/// Order-execution interface.
pub trait TradingGateway {
    /// Authenticate and open a session.
    fn connect(&mut self, credentials: &Credentials) -> Result<Session, GatewayError>;

    /// Submit one order on an open session.
    fn place_order(&mut self, session: &Session, order: &OrderRequest) -> Result<OrderAck, GatewayError>;
}

/// In-memory gateway that fills every order at its reference price.
#[derive(Debug, Default)]
pub struct PaperGateway {
    session: Option<Session>,
    fills: Vec<OrderAck>,
}

impl PaperGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fills(&self) -> &[OrderAck] {
        &self.fills
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }
}

impl TradingGateway for PaperGateway {
    fn connect(&mut self, credentials: &Credentials) -> Result<Session, GatewayError> {
        let key_hash = blake3::hash(credentials.api_key().as_bytes()).to_hex();
        let session = Session {
            exchange: credentials.exchange(),
            session_id: format!("paper-{}-{}", credentials.exchange(), &key_hash.as_str()[..8]),
        };
        info!(exchange = %session.exchange, session = %session.session_id, "paper session opened");
        self.session = Some(session.clone());
        Ok(session)
    }

    fn place_order(&mut self, session: &Session, order: &OrderRequest) -> Result<OrderAck, GatewayError> {
        if self.session.as_ref() != Some(session) {
            return Err(GatewayError::NotConnected);
        }
        let ack = OrderAck {
            order_id: format!("{}-{}", session.session_id, self.fills.len() + 1),
            fill_price: order.reference_price,
            request: order.clone(),
        };
        debug!(order_id = %ack.order_id, symbol = %order.symbol, side = ?order.side, "paper fill");
        self.fills.push(ack.clone());
        Ok(ack)
    }
}

/// Symbols and sizes of the two legs.
#[derive(Debug, Clone, PartialEq)]
pub struct LegSpec {
    pub symbol_a: String,
    pub symbol_b: String,
    pub unit_size_a: f64,
    pub unit_size_b: f64,
    pub leg_b_direction: LegDirection,
}

impl From<&BacktestConfig> for LegSpec {
    fn from(config: &BacktestConfig) -> Self {
        Self {
            symbol_a: config.pair.symbol_a.clone(),
            symbol_b: config.pair.symbol_b.clone(),
            unit_size_a: config.strategy.unit_size_a,
            unit_size_b: config.strategy.unit_size_b,
            leg_b_direction: config.strategy.leg_b_direction,
        }
    }
}

/// Leg orders for one ledger trade, given the side currently held.
///
/// Entries open both legs; an exit reverses the legs of `open_side`. Legs
/// with zero size produce no order.
pub fn orders_for_trade(
    trade: &Trade,
    open_side: PositionSide,
    legs: &LegSpec,
) -> Result<Vec<OrderRequest>, GatewayError> {
    let (side_a, reverse) = match trade.kind {
        TradeKind::Long => (PositionSide::Long, false),
        TradeKind::Short => (PositionSide::Short, false),
        TradeKind::Exit if open_side.is_flat() => {
            return Err(GatewayError::UnmatchedExit(trade.timestamp));
        }
        TradeKind::Exit => (open_side, true),
    };

    let sign_a = side_a.sign();
    let sign_b = sign_a * legs.leg_b_direction.multiplier();
    let orient = |side: OrderSide| if reverse { side.reversed() } else { side };

    let candidates = [
        (&legs.symbol_a, sign_a, legs.unit_size_a, trade.price_a),
        (&legs.symbol_b, sign_b, legs.unit_size_b, trade.price_b),
    ];
    Ok(candidates
        .into_iter()
        .filter(|(_, _, size, _)| *size > 0.0)
        .map(|(symbol, sign, quantity, price)| OrderRequest {
            timestamp: trade.timestamp,
            symbol: symbol.clone(),
            side: orient(OrderSide::from_sign(sign)),
            quantity,
            reference_price: price,
        })
        .collect())
}

/// Replay a ledger into a gateway, in order. Returns every acknowledgement.
pub fn mirror_ledger<G: TradingGateway>(
    gateway: &mut G,
    session: &Session,
    trades: &[Trade],
    legs: &LegSpec,
) -> Result<Vec<OrderAck>, GatewayError> {
    let mut open_side = PositionSide::Flat;
    let mut acks = Vec::with_capacity(trades.len() * 2);

    for trade in trades {
        for order in orders_for_trade(trade, open_side, legs)? {
            acks.push(gateway.place_order(session, &order)?);
        }
        open_side = match trade.kind {
            TradeKind::Long => PositionSide::Long,
            TradeKind::Short => PositionSide::Short,
            TradeKind::Exit => PositionSide::Flat,
        };
    }

    info!(trades = trades.len(), orders = acks.len(), "ledger mirrored");
    Ok(acks)
}
