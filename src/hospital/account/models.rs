//! 用户与 BPJS 数据模型
//!
//! 这两类数据没有固定结构，除 `id` 外的字段原样保存。

use crate::hospital::types::{table, Record};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 自由字段集合
pub type Attributes = Map<String, Value>;

/// 系统用户（管理员 / 前台）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl User {
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

impl Record for User {
    const TABLE: &'static str = table::USERS;

    fn id(&self) -> i64 {
        self.id
    }
}

/// BPJS 参保数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BpjsRecord {
    pub id: i64,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl BpjsRecord {
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

impl Record for BpjsRecord {
    const TABLE: &'static str = table::BPJS_DATA;

    fn id(&self) -> i64 {
        self.id
    }
}
