pub mod gbm;
pub mod market;

pub use gbm::Gbm;
pub use market::MarketParams;
