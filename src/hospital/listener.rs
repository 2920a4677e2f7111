//! 降级监听器回调接口

use async_trait::async_trait;

/// 每当某个操作改用本地存储时回调（可用于界面上的“离线模式”提示）
#[async_trait]
pub trait FallbackListener: Send + Sync {
    /// `operation` 为操作名，`reason` 为降级原因（禁用 / 错误信息 / 无数据）
    async fn on_fallback(&self, operation: String, reason: String);
}

/// 默认空实现（无操作）
pub struct EmptyFallbackListener;

#[async_trait]
impl FallbackListener for EmptyFallbackListener {
    async fn on_fallback(&self, _operation: String, _reason: String) {
        // 默认不做任何处理
    }
}
