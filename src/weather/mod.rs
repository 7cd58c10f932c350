pub mod client;
pub mod error;
pub mod fetcher;
pub mod types;
