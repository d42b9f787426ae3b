//! # Portfolio
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Max-Sharpe allocation, efficient-frontier sampling, rebalancing and
//! realized performance of fixed weights.

pub mod data;
pub mod optimizer;
pub mod performance;

pub use data::align_return_series;
pub use data::common_dates;
pub use data::ReturnsMatrix;
pub use optimizer::FrontierPoint;
pub use optimizer::PortfolioAllocation;
pub use optimizer::PortfolioOptimizer;
pub use performance::cumulative_drawdown;
pub use performance::monthly_sums;
pub use performance::rebalance;
pub use performance::PortfolioPerformance;
