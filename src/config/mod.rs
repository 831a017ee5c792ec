pub mod database;
pub mod email;
pub mod jwt;
pub mod platform;
pub mod rate_limit;
