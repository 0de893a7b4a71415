pub mod aggregator;
pub mod cache;
pub mod config;
pub mod departments;
pub mod error;
pub mod feed;
pub mod global;
pub mod http;
