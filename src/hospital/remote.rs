//! Supabase（PostgREST）HTTP API 客户端
//!
//! 负责所有远端表的 select / insert / update / delete 请求。
//! 每个方法返回 `Ok(None)` 表示远端没有给出数据，由上层决定是否降级。

use crate::hospital::client::ClientConfig;
use crate::hospital::types::{eq_filter_value, handle_rest_response, Order};
use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

/// 远端 REST 客户端
#[derive(Clone)]
pub struct RemoteClient {
    client: reqwest::Client,
    rest_url: String,
    enabled: bool,
}

impl RemoteClient {
    /// 根据配置创建客户端；缺少 URL 或 key 时返回禁用状态的客户端
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let (url, key) = match (config.supabase_url(), config.supabase_anon_key()) {
            (Some(url), Some(key)) => (url, key),
            _ => {
                info!("[RemoteAPI] 未配置 Supabase URL/Key，使用本地降级存储");
                return Ok(Self::disabled());
            }
        };

        // apikey 与 Authorization 通过 default_headers 自动添加
        let client = reqwest::ClientBuilder::new()
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::HeaderName::from_static("apikey"),
                    reqwest::header::HeaderValue::from_str(key).context("无效的 anon key")?,
                );
                headers.insert(
                    reqwest::header::AUTHORIZATION,
                    reqwest::header::HeaderValue::from_str(&format!("Bearer {}", key))
                        .context("无效的 anon key")?,
                );
                headers
            })
            .timeout(config.request_timeout)
            .build()
            .context("创建 HTTP 客户端失败")?;

        let rest_url = format!("{}/rest/v1", url.trim_end_matches('/'));
        info!("[RemoteAPI] Supabase 已启用: {}", rest_url);

        Ok(Self {
            client,
            rest_url,
            enabled: true,
        })
    }

    /// 禁用状态的客户端，永远不会发起网络请求
    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            rest_url: String::new(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 针对某张表构建查询
    pub fn from(&self, table: &str) -> TableQuery<'_> {
        TableQuery {
            remote: self,
            table: table.to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }
}

/// 单表查询构建器（等值过滤 + 排序 + 限制条数）
pub struct TableQuery<'a> {
    remote: &'a RemoteClient,
    table: String,
    filters: Vec<(String, String)>,
    order: Option<Order>,
    limit: Option<usize>,
}

impl<'a> TableQuery<'a> {
    pub fn eq(mut self, column: &str, value: &Value) -> Self {
        self.filters
            .push((column.to_string(), eq_filter_value(value)));
        self
    }

    pub fn order(mut self, order: Option<Order>) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn url(&self) -> String {
        format!("{}/{}", self.remote.rest_url, self.table)
    }

    fn query_params(&self, with_select: bool) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.filters.len() + 3);
        if with_select {
            params.push(("select".to_string(), "*".to_string()));
        }
        params.extend(self.filters.iter().cloned());
        if let Some(order) = &self.order {
            params.push(("order".to_string(), order.to_query_value()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    fn log_request(&self, method: &str, operation_id: &str) {
        debug!(
            "[RemoteAPI] 📡 {} {} 过滤: {:?}, 操作ID: {}",
            method,
            self.url(),
            self.filters,
            operation_id
        );
    }

    /// SELECT：`null` 主体视为无数据，空数组属于有效结果
    pub async fn select<T: DeserializeOwned>(self) -> Result<Option<Vec<T>>> {
        let operation_id = Uuid::new_v4().to_string();
        self.log_request("GET", &operation_id);

        let response = self
            .remote
            .client
            .get(self.url())
            .query(&self.query_params(true))
            .send()
            .await
            .context("请求失败")?;

        handle_rest_response(response, &format!("查询 {} ", self.table)).await
    }

    /// INSERT：返回远端生成的完整记录
    pub async fn insert<B, T>(self, body: &B) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let operation_id = Uuid::new_v4().to_string();
        self.log_request("POST", &operation_id);

        let response = self
            .remote
            .client
            .post(self.url())
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .context("请求失败")?;

        let rows: Option<Vec<T>> =
            handle_rest_response(response, &format!("新增 {} ", self.table)).await?;
        Ok(rows.and_then(|rows| rows.into_iter().next()))
    }

    /// UPDATE：只发送补丁中存在的字段；没有命中任何行时返回 `None`
    pub async fn update<B, T>(self, patch: &B) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let operation_id = Uuid::new_v4().to_string();
        self.log_request("PATCH", &operation_id);

        let response = self
            .remote
            .client
            .patch(self.url())
            .query(&self.query_params(false))
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await
            .context("请求失败")?;

        let rows: Option<Vec<T>> =
            handle_rest_response(response, &format!("更新 {} ", self.table)).await?;
        Ok(rows.and_then(|rows| rows.into_iter().next()))
    }

    /// DELETE：返回被删除的行数，没有删除任何行时返回 `None`
    pub async fn delete(self) -> Result<Option<usize>> {
        let operation_id = Uuid::new_v4().to_string();
        self.log_request("DELETE", &operation_id);

        let response = self
            .remote
            .client
            .delete(self.url())
            .query(&self.query_params(false))
            .header("Prefer", "return=representation")
            .send()
            .await
            .context("请求失败")?;

        let rows: Option<Vec<Value>> =
            handle_rest_response(response, &format!("删除 {} ", self.table)).await?;
        Ok(rows.filter(|rows| !rows.is_empty()).map(|rows| rows.len()))
    }
}
