pub mod cookies;
pub mod error;
pub mod response;
pub mod time;
