//! 留言模块
//!
//! 患者向医院留言，管理员查看、标记已读和删除

pub mod models;
pub mod service;

pub use models::{Message, NewMessage};
pub use service::MessageService;
