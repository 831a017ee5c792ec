pub mod jwt;
pub mod otp;
pub mod password;

pub use jwt::encode_token;
pub use otp::generate_otp;
pub use password::{hash_password, verify_password};
