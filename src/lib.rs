pub mod config;
pub mod db;
pub mod model;
pub mod ops;
pub mod output;
pub mod paths;
pub mod protocol;
pub mod reminder;
pub mod serve;
pub mod sort;
pub mod store;
pub mod tui;
pub mod validate;
pub mod watch;
