//! 远端优先、本地降级的数据网关
//!
//! 每个操作都由“一次远端查询 + 一个本地闭包”组成：
//! 远端启用且成功返回数据时直接使用远端结果，否则执行本地闭包。
//! 两个存储之间不做任何合并，一次写入只会落到其中一个存储。

use crate::hospital::error::ApiError;
use crate::hospital::listener::{EmptyFallbackListener, FallbackListener};
use crate::hospital::remote::RemoteClient;
use crate::hospital::storage::FallbackStore;
use crate::hospital::types::{
    compare_json, merge_patch, next_local_id, parse_rows, row_id, Order, Record,
};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Gateway {
    remote: RemoteClient,
    store: FallbackStore,
    listener: Arc<dyn FallbackListener>,
}

impl Gateway {
    pub fn new(remote: RemoteClient, store: FallbackStore) -> Self {
        Self::with_listener(remote, store, Arc::new(EmptyFallbackListener))
    }

    pub fn with_listener(
        remote: RemoteClient,
        store: FallbackStore,
        listener: Arc<dyn FallbackListener>,
    ) -> Self {
        Self {
            remote,
            store,
            listener,
        }
    }

    pub fn remote(&self) -> &RemoteClient {
        &self.remote
    }

    pub fn store(&self) -> &FallbackStore {
        &self.store
    }

    /// 远端优先执行，失败 / 无数据 / 禁用时执行本地闭包
    ///
    /// 远端禁用时 `remote` 不会被调用；每次调用最多尝试远端一次。
    pub async fn with_fallback<T, R, RFut, F, FFut>(
        &self,
        operation: &str,
        remote: R,
        fallback: F,
    ) -> Result<T>
    where
        R: FnOnce() -> RFut,
        RFut: Future<Output = Result<Option<T>>>,
        F: FnOnce() -> FFut,
        FFut: Future<Output = Result<T>>,
    {
        let reason = if !self.remote.is_enabled() {
            debug!("[Gateway] {} 远端已禁用，使用本地存储", operation);
            "remote disabled".to_string()
        } else {
            match remote().await {
                Ok(Some(data)) => {
                    debug!("[Gateway] {} 使用远端结果", operation);
                    return Ok(data);
                }
                Ok(None) => {
                    debug!("[Gateway] {} 远端无数据，使用本地存储", operation);
                    "remote returned no data".to_string()
                }
                Err(e) => {
                    warn!("[Gateway] {} 远端失败，改用本地存储: {:#}", operation, e);
                    format!("{:#}", e)
                }
            }
        };

        self.listener
            .on_fallback(operation.to_string(), reason)
            .await;
        fallback().await
    }

    /// 存在性检查（`column = value`）
    pub async fn exists(&self, table: &'static str, column: &str, value: Value) -> Result<bool> {
        let operation = format!("exists {}.{}", table, column);
        self.with_fallback(
            &operation,
            || self.remote_exists(table, column, &value),
            || self.local_exists(table, column, &value),
        )
        .await
    }

    /// 全表列表
    pub async fn list<T: Record>(&self, order: Option<Order>) -> Result<Vec<T>> {
        self.list_filtered(None, order).await
    }

    /// 等值过滤列表
    pub async fn list_where<T: Record>(
        &self,
        column: &str,
        value: Value,
        order: Option<Order>,
    ) -> Result<Vec<T>> {
        self.list_filtered(Some((column, &value)), order).await
    }

    async fn list_filtered<T: Record>(
        &self,
        filter: Option<(&str, &Value)>,
        order: Option<Order>,
    ) -> Result<Vec<T>> {
        let operation = format!("list {}", T::TABLE);
        let remote_order = order.clone();
        self.with_fallback(
            &operation,
            move || {
                let mut query = self.remote.from(T::TABLE).order(remote_order);
                if let Some((column, value)) = filter {
                    query = query.eq(column, value);
                }
                query.select::<T>()
            },
            move || self.local_list::<T>(filter, order),
        )
        .await
    }

    /// 新增记录；本地模式下生成时间戳 id 与 created_at
    pub async fn insert<N, T>(&self, new: &N) -> Result<T>
    where
        N: Serialize + Sync,
        T: Record,
    {
        let operation = format!("insert {}", T::TABLE);
        let record: T = self
            .with_fallback(
                &operation,
                || self.remote.from(T::TABLE).insert::<N, T>(new),
                || self.local_insert::<N, T>(new),
            )
            .await?;
        info!("[Gateway] ✅ {} 新增记录 #{}", T::TABLE, record.id());
        Ok(record)
    }

    /// 字段级部分更新，补丁中未出现的字段保持原值
    pub async fn update<P, T>(&self, id: i64, patch: &P) -> Result<T>
    where
        P: Serialize + Sync,
        T: Record,
    {
        let operation = format!("update {}#{}", T::TABLE, id);
        let id_value = Value::from(id);
        self.with_fallback(
            &operation,
            || {
                self.remote
                    .from(T::TABLE)
                    .eq("id", &id_value)
                    .update::<P, T>(patch)
            },
            || self.local_update::<P, T>(id, patch),
        )
        .await
    }

    /// 按 id 删除；本地不存在该 id 时不做任何修改
    pub async fn delete<T: Record>(&self, id: i64) -> Result<()> {
        let operation = format!("delete {}#{}", T::TABLE, id);
        self.with_fallback(
            &operation,
            || self.remote_delete(T::TABLE, id),
            || self.local_delete(T::TABLE, id),
        )
        .await
    }

    async fn remote_exists(
        &self,
        table: &str,
        column: &str,
        value: &Value,
    ) -> Result<Option<bool>> {
        let rows = self
            .remote
            .from(table)
            .eq(column, value)
            .limit(1)
            .select::<Value>()
            .await?;
        Ok(rows.map(|rows| !rows.is_empty()))
    }

    async fn remote_delete(&self, table: &str, id: i64) -> Result<Option<()>> {
        let deleted = self
            .remote
            .from(table)
            .eq("id", &Value::from(id))
            .delete()
            .await?;
        Ok(deleted.map(|count| debug!("[Gateway] 远端删除 {} 行", count)))
    }

    async fn local_rows(&self, table: &str) -> Vec<Value> {
        self.store.read_key(table, Vec::new()).await
    }

    async fn local_exists(&self, table: &str, column: &str, value: &Value) -> Result<bool> {
        let rows = self.local_rows(table).await;
        Ok(rows.iter().any(|row| row.get(column) == Some(value)))
    }

    async fn local_list<T: Record>(
        &self,
        filter: Option<(&str, &Value)>,
        order: Option<Order>,
    ) -> Result<Vec<T>> {
        let mut rows = self.local_rows(T::TABLE).await;
        if let Some((column, value)) = filter {
            rows.retain(|row| row.get(column) == Some(value));
        }
        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let ordering = compare_json(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }
        Ok(parse_rows(rows, T::TABLE))
    }

    async fn local_insert<N, T>(&self, new: &N) -> Result<T>
    where
        N: Serialize + Sync,
        T: Record,
    {
        let mut object = into_object(new, T::TABLE)?;
        let mut rows = self.local_rows(T::TABLE).await;

        let now = Utc::now();
        let id = next_local_id(&rows, now.timestamp_millis())?;
        object.insert("id".to_string(), Value::from(id));
        // 与 chrono 的 serde 格式保持一致，保证本地按 created_at 排序正确
        let created_at = serde_json::to_value(now).context("序列化 created_at 失败")?;
        object.entry("created_at").or_insert(created_at);

        let row = Value::Object(object);
        let record: T = serde_json::from_value(row.clone())
            .with_context(|| format!("构造本地 {} 记录失败", T::TABLE))?;
        rows.push(row);
        self.store.write_key(T::TABLE, &rows).await;

        debug!("[Gateway] 本地新增 {}#{}", T::TABLE, id);
        Ok(record)
    }

    async fn local_update<P, T>(&self, id: i64, patch: &P) -> Result<T>
    where
        P: Serialize + Sync,
        T: Record,
    {
        let patch = into_object(patch, T::TABLE)?;
        let mut rows = self.local_rows(T::TABLE).await;

        let row = rows
            .iter_mut()
            .find(|row| row_id(row) == Some(id))
            .ok_or(ApiError::RecordNotFound {
                table: T::TABLE,
                id,
            })?;
        if let Some(existing) = row.as_object_mut() {
            merge_patch(existing, patch);
        }
        let record: T = serde_json::from_value(row.clone())
            .with_context(|| format!("更新后的本地 {} 记录无法解析", T::TABLE))?;
        self.store.write_key(T::TABLE, &rows).await;

        debug!("[Gateway] 本地更新 {}#{}", T::TABLE, id);
        Ok(record)
    }

    async fn local_delete(&self, table: &str, id: i64) -> Result<()> {
        let mut rows = self.local_rows(table).await;
        let before = rows.len();
        rows.retain(|row| row_id(row) != Some(id));

        if rows.len() == before {
            debug!("[Gateway] 本地 {} 中不存在 id {}，无需删除", table, id);
            return Ok(());
        }
        self.store.write_key(table, &rows).await;
        Ok(())
    }
}

fn into_object<S: Serialize>(value: &S, table: &str) -> Result<Map<String, Value>> {
    match serde_json::to_value(value).with_context(|| format!("序列化 {} 数据失败", table))? {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::InvalidInput(format!(
            "{} 需要 JSON 对象，实际为 {}",
            table, other
        ))
        .into()),
    }
}
