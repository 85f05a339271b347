pub mod analytics;
pub mod fund;
pub mod holding;
pub mod portfolio;
pub mod settings;
