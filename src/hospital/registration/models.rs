//! 挂号（registrations）模型定义

use crate::hospital::types::{table, Record};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 支付方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// 到院现金支付
    Cash,
    /// 银行转账
    Transfer,
    /// 虚拟账户
    #[serde(rename = "va")]
    VirtualAccount,
    /// BPJS 医保
    Bpjs,
}

/// 支付状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    /// 已提交付款凭证，等待管理员核对
    Pending,
    Paid,
    /// BPJS 覆盖，无需支付
    Covered,
}

/// 挂号状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Waiting,
    Confirmed,
    CheckedIn,
    Completed,
    Cancelled,
}

/// 挂号记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub id: i64,
    /// 身份证号（NIK）
    pub nik: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub doctor_id: Option<i64>,
    /// 病房等级（VIP / Kelas 1 / Kelas 2 / Kelas 3 ...）
    pub class_type: String,
    pub booking_code: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_detail: Option<String>,
    /// 费用（印尼盾）
    pub cost: i64,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Registration {
    const TABLE: &'static str = table::REGISTRATIONS;

    fn id(&self) -> i64 {
        self.id
    }
}

/// 患者提交的挂号请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRegistration {
    pub nik: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub doctor_id: Option<i64>,
    pub class_type: String,
    pub payment_method: PaymentMethod,
    pub cost: i64,
    /// BPJS 卡号，仅在 `payment_method = bpjs` 时必填
    #[serde(default)]
    pub bpjs_number: Option<String>,
}

/// 实际写入存储的行（请求字段 + 派生字段）
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RegistrationInsert {
    pub nik: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<i64>,
    pub class_type: String,
    pub booking_code: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_detail: Option<String>,
    pub cost: i64,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
}

/// 挂号记录的部分更新
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistrationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RegistrationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// 患者用 NIK 登录的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResult {
    pub found: bool,
    pub registrations: Vec<Registration>,
}
