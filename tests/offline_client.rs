//! 端到端：通过 HospitalClient 在本地降级存储上走完整流程

use hospital_registration_core::hospital::catalog::{NewDoctor, NewRoom};
use hospital_registration_core::hospital::message::NewMessage;
use hospital_registration_core::hospital::registration::{PaymentStatus, RegistrationStatus};
use hospital_registration_core::{
    ApiError, ClientConfig, DashboardStats, FallbackListener, HospitalClient, NewRegistration,
    PaymentMethod,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct CountingListener {
    fallbacks: AtomicUsize,
}

#[async_trait::async_trait]
impl FallbackListener for CountingListener {
    async fn on_fallback(&self, _operation: String, _reason: String) {
        self.fallbacks.fetch_add(1, Ordering::SeqCst);
    }
}

fn registration(nik: &str, method: PaymentMethod) -> NewRegistration {
    NewRegistration {
        nik: nik.to_string(),
        full_name: "Rina Kartika".to_string(),
        phone: Some("081298765432".to_string()),
        address: Some("Jl. Merdeka No. 10".to_string()),
        birth_date: Some("1990-04-12".to_string()),
        doctor_id: None,
        class_type: "Kelas 1".to_string(),
        payment_method: method,
        cost: 350_000,
        bpjs_number: Some("0009876543210".to_string()),
    }
}

async fn offline_client() -> HospitalClient {
    let config = ClientConfig::offline().with_fallback_db_url("sqlite::memory:");
    HospitalClient::new(config).await.unwrap()
}

#[tokio::test]
async fn patient_and_admin_flow_without_remote() {
    let client = offline_client().await;
    assert!(!client.is_remote_enabled());

    let nik = "3174012345678901";
    let reg = client
        .registrations()
        .register_patient(registration(nik, PaymentMethod::Transfer))
        .await
        .unwrap();
    assert!(reg.booking_code.starts_with("REG-"));

    let login = client.registrations().login_by_nik(nik).await.unwrap();
    assert!(login.found);
    assert_eq!(login.registrations.len(), 1);

    client
        .registrations()
        .submit_payment_detail(reg.id, "Transfer BCA a.n. Rina")
        .await
        .unwrap();
    let paid = client
        .registrations()
        .update_payment_status(reg.id, PaymentStatus::Paid)
        .await
        .unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(
        paid.payment_detail.as_deref(),
        Some("Transfer BCA a.n. Rina")
    );
    assert_eq!(paid.status, RegistrationStatus::Waiting);

    let sent = client
        .messages()
        .send_message(NewMessage {
            nik: Some(nik.to_string()),
            sender_name: "Rina Kartika".to_string(),
            sender_contact: None,
            content: "Apakah bisa pindah jadwal?".to_string(),
        })
        .await
        .unwrap();
    let inbox = client.messages().get_messages_by_nik(nik).await.unwrap();
    assert_eq!(inbox, vec![sent]);
}

#[tokio::test]
async fn short_unknown_nik_is_rejected() {
    let client = offline_client().await;
    let err = client.registrations().login_by_nik("123").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::NationalIdNotFound(_))
    ));
}

#[tokio::test]
async fn dashboard_stats_summarise_local_data() {
    let client = offline_client().await;
    let registrations = client.registrations();
    registrations
        .register_patient(registration("3174012345678902", PaymentMethod::Cash))
        .await
        .unwrap();
    let bpjs = registrations
        .register_patient(registration("3174012345678903", PaymentMethod::Bpjs))
        .await
        .unwrap();
    assert_eq!(bpjs.payment_status, PaymentStatus::Covered);

    client
        .catalog()
        .add_doctor(NewDoctor {
            name: "dr. Lestari, Sp.A".to_string(),
            specialty: "Anak".to_string(),
            schedule: String::new(),
            is_available: true,
        })
        .await
        .unwrap();
    client
        .catalog()
        .add_room(NewRoom {
            class_type: "Kelas 3".to_string(),
            total_beds: 20,
            occupied_beds: 15,
            price: 150_000,
        })
        .await
        .unwrap();
    client
        .messages()
        .send_message(NewMessage {
            nik: None,
            sender_name: "Tamu".to_string(),
            sender_contact: None,
            content: "Jam besuk?".to_string(),
        })
        .await
        .unwrap();

    let stats = client.get_dashboard_stats().await.unwrap();
    assert_eq!(
        stats,
        DashboardStats {
            total_registrations: 2,
            waiting_registrations: 1,
            outstanding_payments: 1,
            unread_messages: 1,
            available_doctors: 1,
            available_beds: 5,
        }
    );
}

#[tokio::test]
async fn unreachable_remote_degrades_to_local_store() {
    let listener = Arc::new(CountingListener::default());
    let config = ClientConfig::new(
        Some("http://127.0.0.1:9".to_string()),
        Some("anon-key".to_string()),
    )
    .with_fallback_db_url("sqlite::memory:");
    let client = HospitalClient::with_listener(config, listener.clone())
        .await
        .unwrap();
    assert!(client.is_remote_enabled());

    let reg = client
        .registrations()
        .register_patient(registration("3174012345678904", PaymentMethod::Cash))
        .await
        .unwrap();
    let found = client
        .registrations()
        .get_registration_by_booking_code(&reg.booking_code)
        .await
        .unwrap();
    assert_eq!(found, Some(reg));
    assert_eq!(listener.fallbacks.load(Ordering::SeqCst), 2);
}
