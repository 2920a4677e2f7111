//! 用户与 BPJS 数据服务层

use crate::hospital::account::models::{Attributes, BpjsRecord, User};
use crate::hospital::error::ApiError;
use crate::hospital::gateway::Gateway;
use crate::hospital::types::Order;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

pub struct AccountService {
    gateway: Arc<Gateway>,
}

impl AccountService {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub async fn get_users(&self) -> Result<Vec<User>> {
        self.gateway.list(Some(Order::desc("id"))).await
    }

    pub async fn add_user(&self, attributes: Attributes) -> Result<User> {
        let attributes = strip_identity(attributes)?;
        info!("[AccountService] 新增用户，字段数: {}", attributes.len());
        self.gateway.insert(&attributes).await
    }

    pub async fn update_user(&self, id: i64, patch: Attributes) -> Result<User> {
        let patch = strip_identity(patch)?;
        self.gateway.update(id, &patch).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<()> {
        info!("[AccountService] 删除用户 {}", id);
        self.gateway.delete::<User>(id).await
    }

    pub async fn get_bpjs_data(&self) -> Result<Vec<BpjsRecord>> {
        self.gateway.list(Some(Order::desc("id"))).await
    }

    pub async fn add_bpjs_data(&self, attributes: Attributes) -> Result<BpjsRecord> {
        let attributes = strip_identity(attributes)?;
        info!("[AccountService] 新增 BPJS 数据，字段数: {}", attributes.len());
        self.gateway.insert(&attributes).await
    }

    pub async fn update_bpjs_data(&self, id: i64, patch: Attributes) -> Result<BpjsRecord> {
        let patch = strip_identity(patch)?;
        self.gateway.update(id, &patch).await
    }

    pub async fn delete_bpjs_data(&self, id: i64) -> Result<()> {
        info!("[AccountService] 删除 BPJS 数据 {}", id);
        self.gateway.delete::<BpjsRecord>(id).await
    }
}

/// id 由存储分配，调用方不能通过自由字段改写
fn strip_identity(mut attributes: Attributes) -> Result<Attributes, ApiError> {
    attributes.remove("id");
    if attributes.is_empty() {
        return Err(ApiError::InvalidInput("data kosong".into()));
    }
    Ok(attributes)
}
