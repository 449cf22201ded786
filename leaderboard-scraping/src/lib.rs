pub mod api;
pub mod chrono_util;
pub mod config;
pub mod cookie_store;
pub mod data_collector;
pub mod describe;
pub mod logger;
pub mod parser;
pub mod schema;
pub mod tracking;
