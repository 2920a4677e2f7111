//! 业务错误定义
//!
//! 远端失败与本地存储失败都不会以错误形式暴露（前者触发降级，后者记录日志），
//! 只有业务层面的错误才会返回给调用方。调用方可通过
//! `anyhow::Error::downcast_ref::<ApiError>()` 区分具体类型。

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// 登录时 NIK 不存在且长度不足
    #[error("NIK tidak ditemukan: {0}")]
    NationalIdNotFound(String),

    /// 本地降级存储中找不到指定记录
    #[error("record {id} not found in {table}")]
    RecordNotFound { table: &'static str, id: i64 },

    /// 调用方传入的数据不合法
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
