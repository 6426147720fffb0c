//! Trade: one ledger entry per state transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeKind {
    Long,
    Short,
    Exit,
}

impl TradeKind {
    pub fn is_entry(self) -> bool {
        matches!(self, TradeKind::Long | TradeKind::Short)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TradeKind::Long => "long",
            TradeKind::Short => "short",
            TradeKind::Exit => "exit",
        }
    }
}

/// Immutable ledger record.
///
/// Entries carry the entry closes; exits carry the exit closes plus the
/// realized P&L of both legs and the capital after booking it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub timestamp: DateTime<Utc>,
    pub kind: TradeKind,
    pub price_a: f64,
    pub price_b: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realized_pnl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital_after: Option<f64>,
    /// Set on the exit synthesized when the data runs out with a position open.
    #[serde(default)]
    pub end_of_data: bool,
}

impl Trade {
    pub fn entry(timestamp: DateTime<Utc>, kind: TradeKind, price_a: f64, price_b: f64) -> Self {
        Self {
            timestamp,
            kind,
            price_a,
            price_b,
            realized_pnl: None,
            capital_after: None,
            end_of_data: false,
        }
    }

    pub fn exit(
        timestamp: DateTime<Utc>,
        price_a: f64,
        price_b: f64,
        realized_pnl: f64,
        capital_after: f64,
    ) -> Self {
        Self {
            timestamp,
            kind: TradeKind::Exit,
            price_a,
            price_b,
            realized_pnl: Some(realized_pnl),
            capital_after: Some(capital_after),
            end_of_data: false,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.realized_pnl.is_some_and(|p| p > 0.0)
    }
}
