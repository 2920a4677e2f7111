//! 基础数据模块
//!
//! 医生、病房、设施和收款账户的维护与查询

pub mod models;
pub mod service;

pub use models::{
    AccountType, BankAccount, BankAccountPatch, Doctor, DoctorPatch, Facility, FacilityPatch,
    NewBankAccount, NewDoctor, NewFacility, NewRoom, Room, RoomPatch,
};
pub use service::CatalogService;
