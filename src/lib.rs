pub mod board;
pub mod browser;
pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod output;
pub mod standings;
pub mod store;
pub mod timing;
pub mod tui;
pub mod watch;
