pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod retry;
pub mod scheduler;
pub mod store;
pub mod view;
