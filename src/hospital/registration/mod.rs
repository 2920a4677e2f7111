//! 挂号模块
//!
//! 患者挂号、NIK 登录与管理员的挂号 / 支付状态维护

pub mod models;
pub mod service;

// 重新导出主要类型
pub use models::{
    LoginResult, NewRegistration, PaymentMethod, PaymentStatus, Registration, RegistrationPatch,
    RegistrationStatus,
};
pub use service::{generate_booking_code, RegistrationService};
