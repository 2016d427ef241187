pub mod config;
pub mod error;
pub mod extractors;
pub mod graph;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod rejection;
pub mod response;
pub mod time;
