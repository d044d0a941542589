//! 运行前校验

pub mod cookie;

pub use cookie::{CookieStatus, CookieValidator};
