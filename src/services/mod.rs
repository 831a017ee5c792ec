pub mod auth;
pub mod email;
pub mod platform;
pub mod question;
pub mod user;
