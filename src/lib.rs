pub mod hospital;

// 重新导出常用类型，方便外部使用
pub use hospital::{
    client::{ClientConfig, DashboardStats, HospitalClient},
    error::ApiError,
    gateway::Gateway,
    listener::{EmptyFallbackListener, FallbackListener},
    registration::{LoginResult, NewRegistration, PaymentMethod, Registration},
};
