pub mod config;
pub mod logging;
pub mod retry;
pub mod sanitize;
pub mod session;
pub mod ttl_cache;
