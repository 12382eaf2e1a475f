pub mod export;
pub mod snapshot;
