pub mod traits;

// Registry API implementations
pub mod mfapi;
