pub mod account;
pub mod catalog;
pub mod client;
pub mod db;
pub mod error;
pub mod gateway;
pub mod listener;
pub mod message;
pub mod registration;
pub mod remote;
pub mod storage;
#[cfg(test)]
mod stub_server;
pub mod types;

// 重新导出常用类型
pub use client::{ClientConfig, DashboardStats, HospitalClient};
pub use error::ApiError;
pub use listener::{EmptyFallbackListener, FallbackListener};
