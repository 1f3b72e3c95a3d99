// src/core/mod.rs

pub mod cookies;
pub mod sanitize;
pub mod webdriver;

pub use cookies::Cookie;
pub use webdriver::Driver;
