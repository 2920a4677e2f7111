//! 本地降级存储（DAO）
//!
//! 以 key/value 的形式在 SQLite `local_storage` 表中保存 JSON，
//! key 与远端表名一致。读写失败只记录日志，不向上层返回错误。

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{Pool, Sqlite};
use tracing::{debug, error, warn};

/// 本地降级存储
#[derive(Clone)]
pub struct FallbackStore {
    db: Pool<Sqlite>,
}

impl FallbackStore {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// 读取 key 下的值；不存在或内容损坏时返回 `default`
    pub async fn read_key<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let raw = match self.read_raw(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(e) => {
                warn!("[FallbackStore] 读取 {} 失败，使用默认值: {:?}", key, e);
                return default;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("[FallbackStore] 解析 {} 失败，使用默认值: {}", key, e);
                default
            }
        }
    }

    /// 序列化并写入 key；失败时只记录日志
    pub async fn write_key<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                error!("[FallbackStore] 序列化 {} 失败，放弃写入: {}", key, e);
                return;
            }
        };

        let result = sqlx::query(
            r#"
            INSERT INTO local_storage (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(&raw)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.db)
        .await;

        match result {
            Ok(_) => debug!("[FallbackStore] 已写入 {}，{} 字节", key, raw.len()),
            Err(e) => error!("[FallbackStore] 写入 {} 失败: {}", key, e),
        }
    }

    /// 读取原始 JSON 文本
    pub async fn read_raw(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT value FROM local_storage WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hospital::db::create_sqlite_pool_with_migration;
    use serde_json::{json, Value};

    async fn memory_store() -> FallbackStore {
        let pool = create_sqlite_pool_with_migration("sqlite::memory:")
            .await
            .unwrap();
        FallbackStore::new(pool)
    }

    #[tokio::test]
    async fn missing_key_returns_default() {
        let store = memory_store().await;
        let rows: Vec<Value> = store.read_key("doctors", Vec::new()).await;
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let store = memory_store().await;
        let rows = vec![json!({"id": 1, "name": "dr. Budi", "is_available": true})];
        store.write_key("doctors", &rows).await;

        let read: Vec<Value> = store.read_key("doctors", Vec::new()).await;
        assert_eq!(read, rows);

        // 覆盖写入
        store.write_key("doctors", &Vec::<Value>::new()).await;
        let read: Vec<Value> = store.read_key("doctors", vec![json!(1)]).await;
        assert!(read.is_empty());
    }

    #[tokio::test]
    async fn corrupt_value_falls_back_to_default() {
        let store = memory_store().await;
        sqlx::query("INSERT INTO local_storage (key, value) VALUES ('rooms', '{not json')")
            .execute(&store.db)
            .await
            .unwrap();

        let rows: Vec<Value> = store.read_key("rooms", vec![json!("default")]).await;
        assert_eq!(rows, vec![json!("default")]);
    }

    #[tokio::test]
    async fn data_survives_reopening_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("fallback.db").display()
        );

        {
            let store = FallbackStore::new(create_sqlite_pool_with_migration(&url).await.unwrap());
            store.write_key("messages", &vec![json!({"id": 1})]).await;
            store.db.close().await;
        }

        let store = FallbackStore::new(create_sqlite_pool_with_migration(&url).await.unwrap());
        let rows: Vec<Value> = store.read_key("messages", Vec::new()).await;
        assert_eq!(rows, vec![json!({"id": 1})]);
    }
}
