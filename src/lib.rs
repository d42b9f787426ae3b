//! # equity-analytics
//!
//! $$
//! \text{OHLCV} \xrightarrow{\ \text{indicators}\ } \text{frame} \xrightarrow{\ \text{score}\ } \text{rank},\qquad
//! r_t \xrightarrow{\ \text{risk}\ } \text{metrics},\qquad
//! R \xrightarrow{\ \max SR\ } \mathbf w^\*
//! $$
//!
//! Quantitative signals from daily price/volume series: technical indicators,
//! risk statistics, mean-variance portfolio optimization and a ranked
//! recommendation list.
//!
//! | Module | Purpose |
//! |---|---|
//! | [`indicators`] | RSI, MACD, Bollinger, SMA/EMA, stochastic, ATR, volume indicators and signals |
//! | [`processor`] | Cleaning, indicator frames, scoring, price sources |
//! | [`risk`] | Volatility, Sharpe/Sortino, VaR/CVaR, drawdown, beta/alpha, rating |
//! | [`portfolio`] | Max-Sharpe weights, frontier, rebalancing, realized performance |
//! | [`recommender`] | Ranking, text report, CSV persistence |
//!
//! The crate emits `tracing` events and never installs a subscriber.

pub mod config;
pub mod error;
pub mod indicators;
pub mod portfolio;
pub mod processor;
pub mod recommender;
pub mod risk;
pub mod series;
pub mod stats;

pub use config::AnalyticsConfig;
pub use error::AnalyticsError;
pub use error::Result;
pub use portfolio::PortfolioAllocation;
pub use portfolio::PortfolioOptimizer;
pub use processor::CsvPriceStore;
pub use processor::DataProcessor;
pub use processor::FrameCache;
pub use processor::IndicatorFrame;
pub use processor::MarketIndicatorsSnapshot;
pub use processor::PriceSource;
pub use recommender::Recommendation;
pub use recommender::RecommendationStore;
pub use recommender::Recommender;
pub use risk::RiskAnalyzer;
pub use risk::RiskMetrics;
pub use risk::RiskRating;
pub use series::PriceRecord;
pub use series::PriceSeries;
pub use series::RawPriceRow;
