//! Domain types for PairLab

pub mod bar;
pub mod position;
pub mod row;
pub mod trade;

pub use bar::{Bar, Series};
pub use position::{LegDirection, PositionSide, PositionState};
pub use row::{AlignedRow, SignaledRow};
pub use trade::{Trade, TradeKind};
