//! 基础数据服务层（管理员维护，患者端只读）

use crate::hospital::catalog::models::{
    BankAccount, BankAccountPatch, Doctor, DoctorPatch, Facility, FacilityPatch, NewBankAccount,
    NewDoctor, NewFacility, NewRoom, Room, RoomPatch,
};
use crate::hospital::error::ApiError;
use crate::hospital::gateway::Gateway;
use crate::hospital::types::Order;
use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub struct CatalogService {
    gateway: Arc<Gateway>,
}

impl CatalogService {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    // ---------- 医生 ----------

    pub async fn get_doctors(&self) -> Result<Vec<Doctor>> {
        self.gateway.list(Some(Order::asc("name"))).await
    }

    /// 当前可预约的医生
    pub async fn get_available_doctors(&self) -> Result<Vec<Doctor>> {
        self.gateway
            .list_where("is_available", json!(true), Some(Order::asc("name")))
            .await
    }

    pub async fn add_doctor(&self, doctor: NewDoctor) -> Result<Doctor> {
        require_text("nama dokter", &doctor.name)?;
        require_text("spesialis", &doctor.specialty)?;
        info!("[CatalogService] 新增医生: {}", doctor.name);
        self.gateway.insert(&doctor).await
    }

    pub async fn update_doctor(&self, id: i64, patch: DoctorPatch) -> Result<Doctor> {
        self.gateway.update(id, &patch).await
    }

    pub async fn delete_doctor(&self, id: i64) -> Result<()> {
        info!("[CatalogService] 删除医生 {}", id);
        self.gateway.delete::<Doctor>(id).await
    }

    // ---------- 病房 ----------

    pub async fn get_rooms(&self) -> Result<Vec<Room>> {
        self.gateway.list(Some(Order::asc("class_type"))).await
    }

    pub async fn add_room(&self, room: NewRoom) -> Result<Room> {
        require_text("kelas kamar", &room.class_type)?;
        if room.total_beds < 0 || room.occupied_beds < 0 || room.occupied_beds > room.total_beds {
            return Err(ApiError::InvalidInput(format!(
                "jumlah tempat tidur tidak valid: {}/{}",
                room.occupied_beds, room.total_beds
            ))
            .into());
        }
        info!("[CatalogService] 新增病房: {}", room.class_type);
        self.gateway.insert(&room).await
    }

    pub async fn update_room(&self, id: i64, patch: RoomPatch) -> Result<Room> {
        self.gateway.update(id, &patch).await
    }

    pub async fn delete_room(&self, id: i64) -> Result<()> {
        info!("[CatalogService] 删除病房 {}", id);
        self.gateway.delete::<Room>(id).await
    }

    // ---------- 设施 ----------

    pub async fn get_facilities(&self) -> Result<Vec<Facility>> {
        self.gateway.list(Some(Order::asc("name"))).await
    }

    pub async fn add_facility(&self, facility: NewFacility) -> Result<Facility> {
        require_text("nama fasilitas", &facility.name)?;
        info!("[CatalogService] 新增设施: {}", facility.name);
        self.gateway.insert(&facility).await
    }

    pub async fn update_facility(&self, id: i64, patch: FacilityPatch) -> Result<Facility> {
        self.gateway.update(id, &patch).await
    }

    pub async fn delete_facility(&self, id: i64) -> Result<()> {
        info!("[CatalogService] 删除设施 {}", id);
        self.gateway.delete::<Facility>(id).await
    }

    // ---------- 收款账户 ----------

    pub async fn get_bank_accounts(&self) -> Result<Vec<BankAccount>> {
        self.gateway.list(Some(Order::asc("bank_name"))).await
    }

    /// 患者付款页面展示的启用账户
    pub async fn get_active_bank_accounts(&self) -> Result<Vec<BankAccount>> {
        self.gateway
            .list_where("is_active", json!(true), Some(Order::asc("bank_name")))
            .await
    }

    pub async fn add_bank_account(&self, account: NewBankAccount) -> Result<BankAccount> {
        require_text("nama bank", &account.bank_name)?;
        require_text("nomor rekening", &account.account_number)?;
        info!(
            "[CatalogService] 新增收款账户: {} {}",
            account.bank_name, account.account_number
        );
        self.gateway.insert(&account).await
    }

    pub async fn update_bank_account(
        &self,
        id: i64,
        patch: BankAccountPatch,
    ) -> Result<BankAccount> {
        self.gateway.update(id, &patch).await
    }

    pub async fn delete_bank_account(&self, id: i64) -> Result<()> {
        info!("[CatalogService] 删除收款账户 {}", id);
        self.gateway.delete::<BankAccount>(id).await
    }
}

fn require_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{} wajib diisi", field)));
    }
    Ok(())
}
