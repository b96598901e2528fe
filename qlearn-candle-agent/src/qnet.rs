//! Action-value network implemented with candle.
mod base;
mod config;
pub use base::CandleQNet;
pub use config::CandleQNetConfig;
