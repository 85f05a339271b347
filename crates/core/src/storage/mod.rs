pub mod cache;
pub mod portfolio_store;
pub mod store;
