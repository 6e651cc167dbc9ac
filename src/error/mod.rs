//! 统一错误类型定义

mod app_error;

pub use app_error::*;
