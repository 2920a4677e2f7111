//! 留言服务层

use crate::hospital::error::ApiError;
use crate::hospital::gateway::Gateway;
use crate::hospital::message::models::{Message, MessageInsert, MessageReadPatch, NewMessage};
use crate::hospital::types::Order;
use anyhow::Result;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub struct MessageService {
    gateway: Arc<Gateway>,
}

impl MessageService {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// 患者发送留言，新留言默认未读
    pub async fn send_message(&self, message: NewMessage) -> Result<Message> {
        let content = message.content.trim();
        if content.is_empty() {
            return Err(ApiError::InvalidInput("pesan tidak boleh kosong".into()).into());
        }
        let sender_name = message.sender_name.trim();
        if sender_name.is_empty() {
            return Err(ApiError::InvalidInput("nama pengirim wajib diisi".into()).into());
        }

        info!("[MessageService] 新留言，发送人: {}", sender_name);
        let row = MessageInsert {
            nik: message.nik.as_deref().map(str::trim).filter(|n| !n.is_empty()),
            sender_name,
            sender_contact: message.sender_contact.as_deref(),
            content,
            is_read: false,
            created_at: Utc::now(),
        };
        self.gateway.insert(&row).await
    }

    /// 全部留言（最新在前）
    pub async fn get_messages(&self) -> Result<Vec<Message>> {
        self.gateway.list(Some(Order::desc("created_at"))).await
    }

    pub async fn get_messages_by_nik(&self, nik: &str) -> Result<Vec<Message>> {
        self.gateway
            .list_where("nik", json!(nik.trim()), Some(Order::desc("created_at")))
            .await
    }

    pub async fn mark_message_read(&self, id: i64) -> Result<Message> {
        self.gateway
            .update(id, &MessageReadPatch { is_read: true })
            .await
    }

    pub async fn delete_message(&self, id: i64) -> Result<()> {
        info!("[MessageService] 删除留言 {}", id);
        self.gateway.delete::<Message>(id).await
    }
}
