//! 用户与 BPJS 数据模块

pub mod models;
pub mod service;

pub use models::{Attributes, BpjsRecord, User};
pub use service::AccountService;
