//! Historical OHLCV sources implementing [`analysis_core::MarketDataFetcher`].

pub mod polygon;
pub mod yahoo;

pub use polygon::PolygonClient;
pub use yahoo::YahooFinanceClient;
