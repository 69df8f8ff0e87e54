pub mod error;
pub mod partition;
