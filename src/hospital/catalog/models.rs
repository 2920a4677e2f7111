//! 医院基础数据模型：医生、病房、设施、收款账户

use crate::hospital::types::{table, Record};
use serde::{Deserialize, Serialize};

/// 医生
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub specialty: String,
    /// 出诊时间，例如 "Senin - Jumat, 08:00 - 14:00"
    #[serde(default)]
    pub schedule: String,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

impl Record for Doctor {
    const TABLE: &'static str = table::DOCTORS;

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDoctor {
    pub name: String,
    pub specialty: String,
    #[serde(default)]
    pub schedule: String,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

/// 病房（按等级统计床位）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub class_type: String,
    pub total_beds: i32,
    #[serde(default)]
    pub occupied_beds: i32,
    /// 每晚价格（印尼盾）
    pub price: i64,
}

impl Room {
    /// 空余床位，数据异常（已占用大于总数）时按 0 计
    pub fn available_beds(&self) -> i32 {
        (self.total_beds - self.occupied_beds).max(0)
    }
}

impl Record for Room {
    const TABLE: &'static str = table::ROOMS;

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRoom {
    pub class_type: String,
    pub total_beds: i32,
    #[serde(default)]
    pub occupied_beds: i32,
    pub price: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_beds: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupied_beds: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
}

/// 医院设施 / 服务项目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: i64,
    #[serde(default)]
    pub description: Option<String>,
}

impl Record for Facility {
    const TABLE: &'static str = table::FACILITIES;

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFacility {
    pub name: String,
    pub category: String,
    pub price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacilityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// 收款账户类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Transfer,
    #[serde(rename = "VA")]
    VirtualAccount,
}

/// 医院收款账户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: i64,
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
    pub account_type: AccountType,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Record for BankAccount {
    const TABLE: &'static str = table::BANK_ACCOUNTS;

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBankAccount {
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
    pub account_type: AccountType,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BankAccountPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

fn default_true() -> bool {
    true
}
