pub mod cli;
pub mod error;
pub mod gateway;
pub mod logs;
pub mod models;
pub mod server;
pub mod store;
pub mod utils;
pub mod validate;
