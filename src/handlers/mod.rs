pub mod auth;
pub mod platform;
pub mod question;
pub mod user;
