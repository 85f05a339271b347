pub mod aggregator_service;
pub mod export_service;
pub mod matcher_service;
pub mod registry_service;
