//! SeaORM entities for accounts, their role-specific data and deliveries.
//! Table and column names follow the relational schema created by the
//! `migration` crate.

pub mod account;
pub mod delivery;
pub mod rider_profile;
pub mod user_address;
pub mod user_pickup_address;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::account::Entity as Account;
    pub use super::delivery::Entity as Delivery;
    pub use super::rider_profile::Entity as RiderProfile;
    pub use super::user_address::Entity as UserAddress;
    pub use super::user_pickup_address::Entity as UserPickupAddress;
}

#[cfg(test)]
mod test {
    use chrono::{Duration, Utc};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, DbErr, EntityTrait,
        ModelTrait, QueryFilter, Set,
    };
    use uuid::Uuid;

    use super::*;
    use account::Role;
    use delivery::DeliveryStatus;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    fn new_account(phone: &str, role: Role) -> account::ActiveModel {
        let now = Utc::now();
        account::ActiveModel {
            id: Set(Uuid::new_v4()),
            phone_number: Set(phone.to_string()),
            password_hash: Set("$argon2id$placeholder".to_string()),
            firstname: Set("Somchai".to_string()),
            lastname: Set(None),
            avatar_url: Set("http://localhost/image/a.png".to_string()),
            role: Set(role),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let now = Utc::now();

        let sender = new_account("0811111111", Role::User).insert(&db).await?;
        let receiver = new_account("0822222222", Role::User).insert(&db).await?;
        let rider = new_account("0811111111", Role::Rider).insert(&db).await?;

        rider_profile::ActiveModel {
            rider_id: Set(rider.id),
            vehicle_plate: Set("1กข 1234".to_string()),
            vehicle_photo_url: Set("http://localhost/image/v.png".to_string()),
        }
        .insert(&db)
        .await?;

        let pickup = user_pickup_address::ActiveModel {
            user_id: Set(sender.id),
            label: Set("Home 1".to_string()),
            address_text: Set("Siam Square".to_string()),
            latitude: Set(13.7456),
            longitude: Set(100.5341),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let dropoff = user_address::ActiveModel {
            user_id: Set(receiver.id),
            label: Set("Office".to_string()),
            address_text: Set("Silom Road".to_string()),
            latitude: Set(13.7279),
            longitude: Set(100.5241),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        delivery::ActiveModel {
            id: Set(Uuid::new_v4()),
            sender_id: Set(sender.id),
            receiver_id: Set(receiver.id),
            pickup_address_id: Set(pickup.id),
            dropoff_address_id: Set(dropoff.id),
            rider_id: Set(Some(rider.id)),
            base_status: Set(DeliveryStatus::PickedUp),
            created_at: Set(now - Duration::minutes(5)),
            updated_at: Set(now),
        }
        .insert(&db)
        .await?;

        // Same phone number, two roles
        let same_phone = Account::find()
            .filter(account::Column::PhoneNumber.eq("0811111111"))
            .all(&db)
            .await?;
        assert_eq!(same_phone.len(), 2);

        // Relations
        let profile = rider.find_related(RiderProfile).one(&db).await?;
        assert_eq!(profile.map(|p| p.vehicle_plate), Some("1กข 1234".to_string()));

        let pickups = sender.find_related(UserPickupAddress).all(&db).await?;
        assert_eq!(pickups.len(), 1);
        assert_eq!(pickups[0].latitude, 13.7456);
        assert_eq!(pickups[0].longitude, 100.5341);

        let addresses = receiver.find_related(UserAddress).all(&db).await?;
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].label, "Office");

        let stored = Delivery::find().one(&db).await?.expect("delivery exists");
        assert_eq!(stored.base_status, DeliveryStatus::PickedUp);
        assert_eq!(stored.rider_id, Some(rider.id));

        let via_relation = stored.find_related(UserPickupAddress).one(&db).await?;
        assert_eq!(via_relation.map(|p| p.id), Some(pickup.id));

        Ok(())
    }

    #[tokio::test]
    async fn test_phone_unique_per_role() -> Result<(), DbErr> {
        let db = setup_db().await?;

        new_account("0833333333", Role::Rider).insert(&db).await?;
        let duplicate = new_account("0833333333", Role::Rider).insert(&db).await;

        assert!(duplicate.is_err());
        Ok(())
    }

    #[test]
    fn test_role_parsing_is_case_insensitive() {
        assert_eq!("rider".parse::<Role>(), Ok(Role::Rider));
        assert_eq!(" User ".parse::<Role>(), Ok(Role::User));
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_delivery_status_parsing() {
        assert_eq!("picked_up".parse::<DeliveryStatus>(), Ok(DeliveryStatus::PickedUp));
        assert_eq!("Delivered".parse::<DeliveryStatus>(), Ok(DeliveryStatus::Delivered));
        assert!("lost".parse::<DeliveryStatus>().is_err());
    }
}
