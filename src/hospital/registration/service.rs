//! 挂号服务层
//!
//! 患者挂号、NIK 登录 / 状态查询，以及管理员对挂号状态与支付状态的维护。

use crate::hospital::error::ApiError;
use crate::hospital::gateway::Gateway;
use crate::hospital::registration::models::{
    LoginResult, NewRegistration, PaymentMethod, PaymentStatus, Registration,
    RegistrationInsert, RegistrationPatch, RegistrationStatus,
};
use crate::hospital::types::{table, Order};
use anyhow::Result;
use chrono::Utc;
use rand::Rng;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// 挂号编号前缀
pub const BOOKING_CODE_PREFIX: &str = "REG-";

/// 未登记过的 NIK 至少需要这么长才视为新患者
pub const MIN_NEW_NIK_LEN: usize = 10;

/// 生成挂号编号：`REG-` + 4 位随机数（不保证全局唯一）
pub fn generate_booking_code() -> String {
    let suffix: u16 = rand::thread_rng().gen_range(1000..=9999);
    format!("{}{}", BOOKING_CODE_PREFIX, suffix)
}

/// 按支付方式推导初始支付状态、挂号状态和支付详情
fn initial_state(
    request: &NewRegistration,
) -> Result<(PaymentStatus, RegistrationStatus, Option<String>), ApiError> {
    match request.payment_method {
        PaymentMethod::Bpjs => {
            let number = request
                .bpjs_number
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| {
                    ApiError::InvalidInput("nomor BPJS wajib diisi untuk pembayaran BPJS".into())
                })?;
            Ok((
                PaymentStatus::Covered,
                RegistrationStatus::Confirmed,
                Some(format!("BPJS: {}", number)),
            ))
        }
        PaymentMethod::Cash | PaymentMethod::Transfer | PaymentMethod::VirtualAccount => {
            Ok((PaymentStatus::Unpaid, RegistrationStatus::Waiting, None))
        }
    }
}

fn validate(request: &NewRegistration) -> Result<(), ApiError> {
    if request.nik.trim().is_empty() {
        return Err(ApiError::InvalidInput("NIK wajib diisi".into()));
    }
    if request.full_name.trim().is_empty() {
        return Err(ApiError::InvalidInput("nama lengkap wajib diisi".into()));
    }
    if request.cost < 0 {
        return Err(ApiError::InvalidInput(format!(
            "biaya tidak boleh negatif: {}",
            request.cost
        )));
    }
    Ok(())
}

/// 挂号服务
pub struct RegistrationService {
    gateway: Arc<Gateway>,
}

impl RegistrationService {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// 患者挂号
    pub async fn register_patient(&self, request: NewRegistration) -> Result<Registration> {
        validate(&request)?;
        let (payment_status, status, payment_detail) = initial_state(&request)?;
        let booking_code = generate_booking_code();

        info!(
            "[RegistrationService] 新挂号，NIK: {}, 编号: {}, 支付方式: {:?}",
            request.nik, booking_code, request.payment_method
        );

        let row = RegistrationInsert {
            nik: request.nik.trim().to_string(),
            full_name: request.full_name.trim().to_string(),
            phone: request.phone,
            address: request.address,
            birth_date: request.birth_date,
            doctor_id: request.doctor_id,
            class_type: request.class_type,
            booking_code,
            payment_method: request.payment_method,
            payment_status,
            payment_detail,
            cost: request.cost,
            status,
            created_at: Utc::now(),
        };
        self.gateway.insert(&row).await
    }

    /// 患者用 NIK 登录
    ///
    /// 有挂号记录时返回这些记录；没有记录但 NIK 足够长时视为新患者；
    /// 否则返回 [`ApiError::NationalIdNotFound`]。
    pub async fn login_by_nik(&self, nik: &str) -> Result<LoginResult> {
        let nik = nik.trim();
        let registrations = self.get_registrations_by_nik(nik).await?;

        if !registrations.is_empty() {
            info!(
                "[RegistrationService] NIK {} 登录成功，{} 条挂号记录",
                nik,
                registrations.len()
            );
            return Ok(LoginResult {
                found: true,
                registrations,
            });
        }

        if nik.chars().count() >= MIN_NEW_NIK_LEN {
            debug!("[RegistrationService] NIK {} 暂无挂号记录，按新患者处理", nik);
            return Ok(LoginResult {
                found: true,
                registrations: Vec::new(),
            });
        }

        Err(ApiError::NationalIdNotFound(nik.to_string()).into())
    }

    /// NIK 是否已有挂号记录
    pub async fn check_nik_registered(&self, nik: &str) -> Result<bool> {
        self.gateway
            .exists(table::REGISTRATIONS, "nik", json!(nik.trim()))
            .await
    }

    /// 某个 NIK 的全部挂号记录（最新在前）
    pub async fn get_registrations_by_nik(&self, nik: &str) -> Result<Vec<Registration>> {
        self.gateway
            .list_where("nik", json!(nik.trim()), Some(Order::desc("created_at")))
            .await
    }

    pub async fn get_registration_by_booking_code(
        &self,
        booking_code: &str,
    ) -> Result<Option<Registration>> {
        let matches: Vec<Registration> = self
            .gateway
            .list_where("booking_code", json!(booking_code.trim()), None)
            .await?;
        Ok(matches.into_iter().next())
    }

    /// 管理员查看全部挂号（最新在前）
    pub async fn get_all_registrations(&self) -> Result<Vec<Registration>> {
        self.gateway.list(Some(Order::desc("created_at"))).await
    }

    pub async fn update_registration_status(
        &self,
        id: i64,
        status: RegistrationStatus,
    ) -> Result<Registration> {
        info!("[RegistrationService] 更新挂号 {} 状态为 {:?}", id, status);
        let patch = RegistrationPatch {
            status: Some(status),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        self.gateway.update(id, &patch).await
    }

    pub async fn update_payment_status(
        &self,
        id: i64,
        payment_status: PaymentStatus,
    ) -> Result<Registration> {
        info!(
            "[RegistrationService] 更新挂号 {} 支付状态为 {:?}",
            id, payment_status
        );
        let patch = RegistrationPatch {
            payment_status: Some(payment_status),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        self.gateway.update(id, &patch).await
    }

    /// 患者提交付款凭证，支付状态变为待核对
    pub async fn submit_payment_detail(&self, id: i64, detail: &str) -> Result<Registration> {
        let detail = detail.trim();
        if detail.is_empty() {
            return Err(ApiError::InvalidInput("detail pembayaran kosong".into()).into());
        }
        let patch = RegistrationPatch {
            payment_status: Some(PaymentStatus::Pending),
            payment_detail: Some(detail.to_string()),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        self.gateway.update(id, &patch).await
    }

    pub async fn delete_registration(&self, id: i64) -> Result<()> {
        info!("[RegistrationService] 删除挂号 {}", id);
        self.gateway.delete::<Registration>(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hospital::db::create_sqlite_pool_with_migration;
    use crate::hospital::remote::RemoteClient;
    use crate::hospital::storage::FallbackStore;

    async fn offline_service() -> RegistrationService {
        let pool = create_sqlite_pool_with_migration("sqlite::memory:")
            .await
            .unwrap();
        let gateway = Gateway::new(RemoteClient::disabled(), FallbackStore::new(pool));
        RegistrationService::new(Arc::new(gateway))
    }

    fn request(nik: &str, method: PaymentMethod) -> NewRegistration {
        NewRegistration {
            nik: nik.to_string(),
            full_name: "Siti Aminah".to_string(),
            phone: Some("081234567890".to_string()),
            address: None,
            birth_date: None,
            doctor_id: Some(3),
            class_type: "Kelas 2".to_string(),
            payment_method: method,
            cost: 150_000,
            bpjs_number: None,
        }
    }

    fn is_booking_code(code: &str) -> bool {
        code.len() == 8
            && code.starts_with(BOOKING_CODE_PREFIX)
            && code[4..].chars().all(|c| c.is_ascii_digit())
    }

    #[test]
    fn booking_codes_have_four_digit_suffix() {
        for _ in 0..200 {
            let code = generate_booking_code();
            assert!(is_booking_code(&code), "unexpected code {}", code);
            assert_ne!(&code[4..5], "0");
        }
    }

    #[tokio::test]
    async fn registering_twice_creates_two_records() {
        let service = offline_service().await;
        let nik = "3201010101010001";
        let first = service
            .register_patient(request(nik, PaymentMethod::Cash))
            .await
            .unwrap();
        let second = service
            .register_patient(request(nik, PaymentMethod::Transfer))
            .await
            .unwrap();

        assert!(is_booking_code(&first.booking_code));
        assert!(is_booking_code(&second.booking_code));
        assert_ne!(first.id, second.id);
        assert_eq!(first.payment_status, PaymentStatus::Unpaid);
        assert_eq!(first.status, RegistrationStatus::Waiting);

        let records = service.get_registrations_by_nik(nik).await.unwrap();
        assert_eq!(records.len(), 2);
        // 最新在前
        assert_eq!(records[0].id, second.id);
    }

    #[tokio::test]
    async fn bpjs_registration_is_covered_and_requires_card_number() {
        let service = offline_service().await;

        let err = service
            .register_patient(request("3201010101010002", PaymentMethod::Bpjs))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::InvalidInput(_))
        ));

        let mut bpjs = request("3201010101010002", PaymentMethod::Bpjs);
        bpjs.bpjs_number = Some("0001234567890".to_string());
        let registration = service.register_patient(bpjs).await.unwrap();
        assert_eq!(registration.payment_status, PaymentStatus::Covered);
        assert_eq!(registration.status, RegistrationStatus::Confirmed);
        assert_eq!(
            registration.payment_detail.as_deref(),
            Some("BPJS: 0001234567890")
        );
    }

    #[tokio::test]
    async fn login_rules_for_known_new_and_short_ids() {
        let service = offline_service().await;
        let known = service
            .register_patient(request("3201010101010003", PaymentMethod::Cash))
            .await
            .unwrap();

        let login = service.login_by_nik("3201010101010003").await.unwrap();
        assert!(login.found);
        assert_eq!(login.registrations, vec![known]);

        let fresh = service.login_by_nik("9999999999").await.unwrap();
        assert_eq!(
            fresh,
            LoginResult {
                found: true,
                registrations: Vec::new()
            }
        );

        let err = service.login_by_nik("12345").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ApiError>(),
            Some(&ApiError::NationalIdNotFound("12345".to_string()))
        );
    }

    #[tokio::test]
    async fn status_updates_keep_other_fields() {
        let service = offline_service().await;
        let created = service
            .register_patient(request("3201010101010004", PaymentMethod::VirtualAccount))
            .await
            .unwrap();

        let paid = service
            .submit_payment_detail(created.id, "VA 8808 1234 5678")
            .await
            .unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Pending);

        let confirmed = service
            .update_registration_status(created.id, RegistrationStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(confirmed.status, RegistrationStatus::Confirmed);
        assert_eq!(confirmed.payment_status, PaymentStatus::Pending);
        assert_eq!(confirmed.payment_detail.as_deref(), Some("VA 8808 1234 5678"));
        assert_eq!(confirmed.booking_code, created.booking_code);
        assert!(confirmed.updated_at.is_some());

        let found = service
            .get_registration_by_booking_code(&created.booking_code)
            .await
            .unwrap();
        assert_eq!(found.map(|r| r.id), Some(created.id));
    }

    #[tokio::test]
    async fn existence_check_and_delete() {
        let service = offline_service().await;
        let created = service
            .register_patient(request("3201010101010005", PaymentMethod::Cash))
            .await
            .unwrap();

        assert!(service.check_nik_registered("3201010101010005").await.unwrap());
        service.delete_registration(created.id).await.unwrap();
        assert!(!service.check_nik_registered("3201010101010005").await.unwrap());
        // 重复删除不报错
        service.delete_registration(created.id).await.unwrap();
    }
}
