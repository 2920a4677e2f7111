//! 留言模型定义

use crate::hospital::types::{table, Record};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 留言记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    /// 发送人的 NIK（未登录的访客可以为空）
    #[serde(default)]
    pub nik: Option<String>,
    pub sender_name: String,
    /// 电话或邮箱
    #[serde(default)]
    pub sender_contact: Option<String>,
    pub content: String,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Record for Message {
    const TABLE: &'static str = table::MESSAGES;

    fn id(&self) -> i64 {
        self.id
    }
}

/// 患者提交的新留言
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    #[serde(default)]
    pub nik: Option<String>,
    pub sender_name: String,
    #[serde(default)]
    pub sender_contact: Option<String>,
    pub content: String,
}

/// 实际写入存储的行
#[derive(Debug, Serialize)]
pub(crate) struct MessageInsert<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nik: Option<&'a str>,
    pub sender_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_contact: Option<&'a str>,
    pub content: &'a str,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MessageReadPatch {
    pub is_read: bool,
}
