//! anekdot-relay: scrape jokes from a paginated site and relay unseen ones
//! to a chat webhook on a fixed timer.

pub mod commands;
pub mod config;
pub mod crawl;
pub mod delivery;
pub mod error;
pub mod models;
pub mod notify;
pub mod parse;
pub mod retry;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
