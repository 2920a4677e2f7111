use crate::hospital::error::ApiError;
use chrono::DateTime;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use tracing::{debug, error};

/// 远端表与本地降级存储共用的记录约束
///
/// `TABLE` 同时是 Supabase 表名和本地存储 key。
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: &'static str;

    fn id(&self) -> i64;
}

/// 远端与本地存储的表名 / key
pub mod table {
    pub const REGISTRATIONS: &str = "registrations";
    pub const DOCTORS: &str = "doctors";
    pub const MESSAGES: &str = "messages";
    pub const USERS: &str = "users";
    pub const BPJS_DATA: &str = "bpjs_data";
    pub const FACILITIES: &str = "facilities";
    pub const ROOMS: &str = "rooms";
    pub const BANK_ACCOUNTS: &str = "bank_accounts";
}

/// 排序条件（对应 PostgREST 的 `order=column.asc|desc`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ascending: true,
        }
    }

    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ascending: false,
        }
    }

    /// 转换为 PostgREST 查询参数值
    pub fn to_query_value(&self) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        format!("{}.{}", self.column, direction)
    }
}

/// PostgREST 等值过滤的参数值（`eq.<value>`）
///
/// 字符串直接使用原文，避免 JSON 序列化带上引号。
pub fn eq_filter_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("eq.{}", s),
        Value::Null => "is.null".to_string(),
        other => format!("eq.{}", other),
    }
}

/// 读取 JSON 行的 id 字段
pub fn row_id(row: &Value) -> Option<i64> {
    row.get("id").and_then(Value::as_i64)
}

/// 本地模式下生成新 id：取当前毫秒时间戳，若已被占用则顺延
///
/// 已有 id 达到 `i64::MAX` 时无法再顺延，返回 `InvalidInput`。
pub fn next_local_id(rows: &[Value], now_millis: i64) -> Result<i64, ApiError> {
    let max_existing = rows.iter().filter_map(row_id).max().unwrap_or(i64::MIN);
    if now_millis > max_existing {
        return Ok(now_millis);
    }
    max_existing
        .checked_add(1)
        .ok_or_else(|| ApiError::InvalidInput(format!("本地 id 已用尽: {}", max_existing)))
}

/// 将补丁对象的字段覆盖到已有行上，补丁中不存在的字段保持不变
pub fn merge_patch(row: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        row.insert(key, value);
    }
}

/// 本地排序用的 JSON 值比较（数字按数值、字符串按字典序，null 排最前）
///
/// 两边都是 RFC 3339 时间戳时按时间点比较，小数秒位数不同也不影响顺序。
pub fn compare_json(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// 把 JSON 行解析为具体记录，解析失败的行记录日志后跳过
pub fn parse_rows<T: DeserializeOwned>(rows: Vec<Value>, table: &str) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<T>(row) {
            Ok(record) => Some(record),
            Err(e) => {
                error!("[Types] {} 中存在无法解析的本地记录: {}", table, e);
                None
            }
        })
        .collect()
}

/// 通用 PostgREST 响应处理函数
///
/// PostgREST 直接返回 JSON 主体（没有 errCode 包装），
/// 空主体（例如 204）按 `null` 处理，由调用方决定是否视为“无数据”。
pub async fn handle_rest_response<T: DeserializeOwned>(
    response: reqwest::Response,
    operation_name: &str,
) -> anyhow::Result<T> {
    use anyhow::Context;

    let status = response.status();

    // body 只能读取一次
    let body_bytes = response.bytes().await.context("读取响应 body 失败")?;
    let body_str = String::from_utf8_lossy(&body_bytes);
    debug!("[HTTP] {}响应 Body: {}", operation_name, body_str);

    if !status.is_success() {
        error!(
            "[HTTP] {}请求失败，HTTP状态: {}, 响应: {}",
            operation_name, status, body_str
        );
        return Err(anyhow::anyhow!("HTTP 错误 {}: {}", status, body_str));
    }
    debug!("[HTTP] {}请求成功，HTTP状态: {}", operation_name, status);

    let payload: &[u8] = if body_bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &body_bytes
    };

    serde_json::from_slice(payload).map_err(|e| {
        error!(
            "[HTTP] {}反序列化失败: {:?}\n原始响应: {}",
            operation_name, e, body_str
        );
        anyhow::anyhow!("反序列化响应失败: {:?}", e)
    })
}
