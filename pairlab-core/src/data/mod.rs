//! Pair alignment

pub mod align;

pub use align::align_series;
