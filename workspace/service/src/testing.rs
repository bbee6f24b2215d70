//! Shared fixtures for the workflow tests.

use argon2::Params;
use chrono::{DateTime, Utc};
use migration::{Migrator, MigratorTrait};
use model::entities::{delivery, user_address, user_pickup_address};
use model::DeliveryStatus;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use uuid::Uuid;

use crate::content_store::Upload;
use crate::password::PasswordService;
use crate::registration::{AddressFields, RegistrationForm};

/// In-memory SQLite database with all migrations applied.
pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Argon2id with the smallest allowed cost, so tests stay fast in debug builds.
pub fn fast_passwords() -> PasswordService {
    let params = Params::new(Params::MIN_M_COST, 1, 1, None).expect("valid argon2 params");
    PasswordService::with_params(params)
}

pub fn png(name: &str) -> Upload {
    Upload::new(name, vec![0x89, b'P', b'N', b'G'])
}

pub fn user_form(phone: &str, password: &str) -> RegistrationForm {
    RegistrationForm {
        phone_number: Some(phone.to_string()),
        password: Some(password.to_string()),
        firstname: Some("Malee".to_string()),
        lastname: Some("Srisuk".to_string()),
        role: Some("User".to_string()),
        avatar: Some(png("avatar.png")),
        address: AddressFields {
            label: Some("Home".to_string()),
            text: Some("99 Sukhumvit Rd".to_string()),
            latitude: Some("13.7367".to_string()),
            longitude: Some("100.5605".to_string()),
            ..Default::default()
        },
        pickup_address: AddressFields {
            text: Some("1 Rama IV Rd".to_string()),
            latitude: Some("13.7300".to_string()),
            longitude: Some("100.5400".to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn rider_form(phone: &str, password: &str) -> RegistrationForm {
    RegistrationForm {
        phone_number: Some(phone.to_string()),
        password: Some(password.to_string()),
        firstname: Some("Anan".to_string()),
        lastname: None,
        role: Some("rider".to_string()),
        avatar: Some(png("rider.png")),
        vehicle_plate: Some("2กค 5678".to_string()),
        vehicle_photo: Some(png("bike.jpg")),
        ..Default::default()
    }
}

/// Inserts a delivery between existing accounts and addresses.
pub async fn insert_delivery(
    db: &DatabaseConnection,
    sender: Uuid,
    receiver: Uuid,
    pickup: &user_pickup_address::Model,
    dropoff: &user_address::Model,
    rider: Option<Uuid>,
    status: DeliveryStatus,
    created_at: DateTime<Utc>,
) -> delivery::Model {
    delivery::ActiveModel {
        id: Set(Uuid::new_v4()),
        sender_id: Set(sender),
        receiver_id: Set(receiver),
        pickup_address_id: Set(pickup.id),
        dropoff_address_id: Set(dropoff.id),
        rider_id: Set(rider),
        base_status: Set(status),
        created_at: Set(created_at),
        updated_at: Set(created_at),
    }
    .insert(db)
    .await
    .expect("Failed to insert delivery")
}
