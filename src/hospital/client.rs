//! 医院挂号客户端核心实现模块
//!
//! 负责读取配置、创建远端客户端和本地降级存储，并对外暴露各个服务。

use crate::hospital::account::AccountService;
use crate::hospital::catalog::CatalogService;
use crate::hospital::db::create_sqlite_pool_with_migration;
use crate::hospital::gateway::Gateway;
use crate::hospital::listener::{EmptyFallbackListener, FallbackListener};
use crate::hospital::message::MessageService;
use crate::hospital::registration::{PaymentStatus, RegistrationService, RegistrationStatus};
use crate::hospital::remote::RemoteClient;
use crate::hospital::storage::FallbackStore;
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 前端共用的环境变量名
pub const ENV_SUPABASE_URL: &str = "VITE_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "VITE_SUPABASE_ANON_KEY";
pub const ENV_FALLBACK_DB_URL: &str = "HOSPITAL_FALLBACK_DB_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "HOSPITAL_REQUEST_TIMEOUT_SECS";

const DEFAULT_FALLBACK_DB_URL: &str = "sqlite://hospital_fallback.db?mode=rwc";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Supabase 项目地址，例如 `https://xyz.supabase.co`
    pub supabase_url: Option<String>,
    /// Supabase anon key
    pub supabase_anon_key: Option<String>,
    /// 本地降级存储使用的 SQLite 数据库 URL
    ///
    /// 例如：`sqlite://hospital_fallback.db?mode=rwc`，测试时可用 `sqlite::memory:`
    pub fallback_db_url: String,
    /// 单次远端请求超时
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// 创建默认配置
    pub fn new(supabase_url: Option<String>, supabase_anon_key: Option<String>) -> Self {
        Self {
            supabase_url,
            supabase_anon_key,
            fallback_db_url: DEFAULT_FALLBACK_DB_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// 纯本地模式（远端禁用）
    pub fn offline() -> Self {
        Self::new(None, None)
    }

    /// 从环境变量（以及当前目录下的 `.env`）读取配置
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("[Config] 未加载 .env: {}", e);
        }
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new(get(ENV_SUPABASE_URL), get(ENV_SUPABASE_ANON_KEY));
        if let Some(url) = get(ENV_FALLBACK_DB_URL).filter(|v| !v.trim().is_empty()) {
            config.fallback_db_url = url;
        }
        if let Some(raw) = get(ENV_REQUEST_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => warn!(
                    "[Config] {} 无效: {}，使用默认值",
                    ENV_REQUEST_TIMEOUT_SECS, raw
                ),
            }
        }
        config
    }

    pub fn with_fallback_db_url(mut self, url: impl Into<String>) -> Self {
        self.fallback_db_url = url.into();
        self
    }

    /// 去掉空白后的 Supabase URL，空字符串视为未配置
    pub fn supabase_url(&self) -> Option<&str> {
        non_blank(self.supabase_url.as_deref())
    }

    pub fn supabase_anon_key(&self) -> Option<&str> {
        non_blank(self.supabase_anon_key.as_deref())
    }

    /// URL 和 key 都存在时才启用远端
    pub fn remote_enabled(&self) -> bool {
        self.supabase_url().is_some() && self.supabase_anon_key().is_some()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// 管理后台首页统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_registrations: usize,
    pub waiting_registrations: usize,
    /// 未付款或待核对
    pub outstanding_payments: usize,
    pub unread_messages: usize,
    pub available_doctors: usize,
    pub available_beds: i64,
}

/// 医院挂号客户端
#[derive(Clone)]
pub struct HospitalClient {
    config: ClientConfig,
    gateway: Arc<Gateway>,
    registrations: Arc<RegistrationService>,
    messages: Arc<MessageService>,
    catalog: Arc<CatalogService>,
    accounts: Arc<AccountService>,
}

impl HospitalClient {
    /// 创建客户端（使用默认空监听器）
    pub async fn new(config: ClientConfig) -> Result<Self> {
        Self::with_listener(config, Arc::new(EmptyFallbackListener)).await
    }

    /// 创建客户端（带自定义降级监听器）
    pub async fn with_listener(
        config: ClientConfig,
        listener: Arc<dyn FallbackListener>,
    ) -> Result<Self> {
        info!(
            "[Client] 创建客户端，远端: {}, 本地存储: {}",
            if config.remote_enabled() { "启用" } else { "禁用" },
            config.fallback_db_url
        );

        let pool = create_sqlite_pool_with_migration(&config.fallback_db_url).await?;
        let remote = RemoteClient::new(&config)?;
        let gateway = Arc::new(Gateway::with_listener(
            remote,
            FallbackStore::new(pool),
            listener,
        ));

        Ok(Self {
            registrations: Arc::new(RegistrationService::new(gateway.clone())),
            messages: Arc::new(MessageService::new(gateway.clone())),
            catalog: Arc::new(CatalogService::new(gateway.clone())),
            accounts: Arc::new(AccountService::new(gateway.clone())),
            gateway,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// 远端是否启用（界面据此显示离线提示）
    pub fn is_remote_enabled(&self) -> bool {
        self.gateway.remote().is_enabled()
    }

    pub fn registrations(&self) -> &RegistrationService {
        &self.registrations
    }

    pub fn messages(&self) -> &MessageService {
        &self.messages
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    pub fn accounts(&self) -> &AccountService {
        &self.accounts
    }

    /// 汇总管理后台统计数据
    pub async fn get_dashboard_stats(&self) -> Result<DashboardStats> {
        let (registrations, messages, doctors, rooms) = tokio::try_join!(
            self.registrations.get_all_registrations(),
            self.messages.get_messages(),
            self.catalog.get_available_doctors(),
            self.catalog.get_rooms(),
        )?;

        Ok(DashboardStats {
            total_registrations: registrations.len(),
            waiting_registrations: registrations
                .iter()
                .filter(|r| r.status == RegistrationStatus::Waiting)
                .count(),
            outstanding_payments: registrations
                .iter()
                .filter(|r| {
                    matches!(
                        r.payment_status,
                        PaymentStatus::Unpaid | PaymentStatus::Pending
                    )
                })
                .count(),
            unread_messages: messages.iter().filter(|m| !m.is_read).count(),
            available_doctors: doctors.len(),
            available_beds: rooms.iter().map(|r| i64::from(r.available_beds())).sum(),
        })
    }
}
