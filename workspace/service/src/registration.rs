//! Account registration: validation of the submitted form, upload storage,
//! password hashing and the transactional insert of the account together
//! with its role-specific rows.

use chrono::Utc;
use model::entities::{account, rider_profile, user_address, user_pickup_address};
use model::Role;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set, SqlErr, TransactionTrait,
};
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;
use validator::Validate;

use crate::accounts::is_phone_available;
use crate::content_store::{ContentStore, StoredContent, Upload};
use crate::error::{Result, ServiceError};
use crate::password::PasswordService;

const MAX_LABEL_LEN: usize = 60;
const MAX_ADDRESS_TEXT_LEN: usize = 400;
const MAX_VEHICLE_PLATE_LEN: usize = 50;

/// Raw address input for one group (main or pickup).
///
/// Either the single legacy fields or the parallel arrays are used; the
/// arrays win whenever any of them is non-empty.
#[derive(Debug, Clone, Default)]
pub struct AddressFields {
    pub label: Option<String>,
    pub text: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub labels: Vec<String>,
    pub texts: Vec<String>,
    pub latitudes: Vec<String>,
    pub longitudes: Vec<String>,
}

impl AddressFields {
    fn uses_arrays(&self) -> bool {
        !(self.labels.is_empty()
            && self.texts.is_empty()
            && self.latitudes.is_empty()
            && self.longitudes.is_empty())
    }
}

/// The registration form exactly as submitted. Every field is optional here;
/// `validate` decides what the chosen role requires.
#[derive(Clone, Default)]
pub struct RegistrationForm {
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub role: Option<String>,
    pub avatar: Option<Upload>,
    pub vehicle_plate: Option<String>,
    pub vehicle_photo: Option<Upload>,
    pub address: AddressFields,
    pub pickup_address: AddressFields,
}

/// A geocoded address ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressDraft {
    pub label: String,
    pub address_text: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug)]
pub enum RoleProfile {
    Rider {
        vehicle_plate: String,
        vehicle_photo: Upload,
    },
    User {
        addresses: Vec<AddressDraft>,
        pickup_addresses: Vec<AddressDraft>,
    },
}

#[derive(Validate)]
pub struct IdentityFields {
    #[validate(length(min = 1, max = 10))]
    pub phone_number: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(length(min = 1, max = 30))]
    pub firstname: String,
    #[validate(length(max = 30))]
    pub lastname: Option<String>,
}

/// A form that passed validation. Nothing has been written yet.
pub struct ValidatedRegistration {
    pub identity: IdentityFields,
    pub role: Role,
    pub avatar: Upload,
    pub profile: RoleProfile,
}

/// Field names of one address group, as they appear in the form.
struct AddressGroup {
    name: &'static str,
    text: &'static str,
    latitude: &'static str,
    longitude: &'static str,
    texts: &'static str,
    latitudes: &'static str,
    longitudes: &'static str,
}

const MAIN_ADDRESS: AddressGroup = AddressGroup {
    name: "addresses",
    text: "addressText",
    latitude: "addressLatitude",
    longitude: "addressLongitude",
    texts: "addressTexts",
    latitudes: "addressLatitudes",
    longitudes: "addressLongitudes",
};

const PICKUP_ADDRESS: AddressGroup = AddressGroup {
    name: "pickupAddresses",
    text: "pickupAddressText",
    latitude: "pickupAddressLatitude",
    longitude: "pickupAddressLongitude",
    texts: "pickupAddressTexts",
    latitudes: "pickupAddressLatitudes",
    longitudes: "pickupAddressLongitudes",
};

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, field: &'static str) -> Result<String> {
    non_blank(value).ok_or(ServiceError::MissingField(field))
}

fn parse_coordinate(raw: &str, field: &str, limit: f64) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ServiceError::invalid(field, format!("'{}' is not a number", raw.trim())))?;

    if !value.is_finite() || value.abs() > limit {
        return Err(ServiceError::invalid(
            field,
            format!("must be between -{} and {}", limit, limit),
        ));
    }
    Ok(value)
}

fn address_draft(
    index: usize,
    label: Option<String>,
    text: String,
    latitude: f64,
    longitude: f64,
    text_field: &str,
) -> Result<AddressDraft> {
    let label = non_blank(label).unwrap_or_else(|| format!("Home {}", index + 1));
    if label.chars().count() > MAX_LABEL_LEN {
        return Err(ServiceError::invalid(
            "label",
            format!("must be at most {} characters", MAX_LABEL_LEN),
        ));
    }
    if text.chars().count() > MAX_ADDRESS_TEXT_LEN {
        return Err(ServiceError::invalid(
            text_field,
            format!("must be at most {} characters", MAX_ADDRESS_TEXT_LEN),
        ));
    }

    Ok(AddressDraft {
        label,
        address_text: text,
        latitude,
        longitude,
    })
}

/// Turns one address group into drafts. Always yields at least one entry.
fn collect_addresses(group: &AddressGroup, fields: AddressFields) -> Result<Vec<AddressDraft>> {
    if !fields.uses_arrays() {
        trace!("Using single-address fields for {}", group.name);
        let text = required(fields.text, group.text)?;
        let latitude = required(fields.latitude, group.latitude)?;
        let longitude = required(fields.longitude, group.longitude)?;

        let draft = address_draft(
            0,
            fields.label,
            text,
            parse_coordinate(&latitude, group.latitude, 90.0)?,
            parse_coordinate(&longitude, group.longitude, 180.0)?,
            group.text,
        )?;
        return Ok(vec![draft]);
    }

    let count = fields.texts.len();
    let labels_match = fields.labels.is_empty() || fields.labels.len() == count;
    if fields.latitudes.len() != count || fields.longitudes.len() != count || !labels_match {
        return Err(ServiceError::invalid(
            group.name,
            format!(
                "address arrays must have equal length (texts: {}, latitudes: {}, longitudes: {}, labels: {})",
                count,
                fields.latitudes.len(),
                fields.longitudes.len(),
                fields.labels.len()
            ),
        ));
    }
    debug!("Collecting {} entries for {}", count, group.name);

    let mut labels = fields.labels.into_iter();
    fields
        .texts
        .into_iter()
        .zip(fields.latitudes)
        .zip(fields.longitudes)
        .enumerate()
        .map(|(index, ((text, latitude), longitude))| {
            let text_field = format!("{}[{}]", group.texts, index);
            let text = non_blank(Some(text)).ok_or_else(|| ServiceError::invalid(&text_field, "must not be empty"))?;
            address_draft(
                index,
                labels.next(),
                text,
                parse_coordinate(&latitude, &format!("{}[{}]", group.latitudes, index), 90.0)?,
                parse_coordinate(&longitude, &format!("{}[{}]", group.longitudes, index), 180.0)?,
                &text_field,
            )
        })
        .collect()
}

/// Checks the form without touching storage.
pub fn validate(form: RegistrationForm) -> Result<ValidatedRegistration> {
    let identity = IdentityFields {
        phone_number: required(form.phone_number, "phoneNumber")?,
        password: form
            .password
            .filter(|p| !p.is_empty())
            .ok_or(ServiceError::MissingField("password"))?,
        firstname: required(form.firstname, "firstname")?,
        lastname: non_blank(form.lastname),
    };
    identity.validate()?;

    let role: Role = required(form.role, "role")?
        .parse()
        .map_err(|e| ServiceError::invalid("role", format!("{}; expected USER or RIDER", e)))?;

    let avatar = form
        .avatar
        .ok_or(ServiceError::MissingField("avatarFileData"))?;
    if avatar.bytes.is_empty() {
        return Err(ServiceError::invalid("avatarFileData", "file is empty"));
    }

    let profile = match role {
        Role::Rider => {
            let vehicle_plate = required(form.vehicle_plate, "vehiclePlate")?;
            if vehicle_plate.chars().count() > MAX_VEHICLE_PLATE_LEN {
                return Err(ServiceError::invalid(
                    "vehiclePlate",
                    format!("must be at most {} characters", MAX_VEHICLE_PLATE_LEN),
                ));
            }
            let vehicle_photo = form
                .vehicle_photo
                .filter(|photo| !photo.bytes.is_empty())
                .ok_or(ServiceError::MissingField("vehiclePhotoData"))?;
            RoleProfile::Rider {
                vehicle_plate,
                vehicle_photo,
            }
        }
        Role::User => RoleProfile::User {
            addresses: collect_addresses(&MAIN_ADDRESS, form.address)?,
            pickup_addresses: collect_addresses(&PICKUP_ADDRESS, form.pickup_address)?,
        },
    };

    Ok(ValidatedRegistration {
        identity,
        role,
        avatar,
        profile,
    })
}

/// Role-specific rows once uploads are stored.
enum PreparedProfile<'r> {
    Rider {
        vehicle_plate: &'r str,
        vehicle_photo_url: String,
    },
    User {
        addresses: &'r [AddressDraft],
        pickup_addresses: &'r [AddressDraft],
    },
}

fn conflict_or_database(err: DbErr, phone_number: &str, role: Role) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => ServiceError::PhoneTaken {
            phone_number: phone_number.to_string(),
            role,
        },
        _ => ServiceError::Database(err),
    }
}

/// Creates accounts.
pub struct Registrar<'a> {
    db: &'a DatabaseConnection,
    store: &'a dyn ContentStore,
    passwords: &'a PasswordService,
}

impl<'a> Registrar<'a> {
    pub fn new(
        db: &'a DatabaseConnection,
        store: &'a dyn ContentStore,
        passwords: &'a PasswordService,
    ) -> Self {
        Self {
            db,
            store,
            passwords,
        }
    }

    /// Validates and persists a new account, returning its id.
    ///
    /// Either the account and all of its role rows are committed, or
    /// nothing is: uploads stored along the way are removed again.
    #[instrument(skip_all)]
    pub async fn register(&self, form: RegistrationForm) -> Result<Uuid> {
        trace!("Entering register function");
        let registration = validate(form)?;
        let phone_number = registration.identity.phone_number.as_str();
        debug!("Registration form valid for role {}", registration.role);

        if !is_phone_available(self.db, phone_number, registration.role).await? {
            warn!(
                "Phone number already registered for role {}",
                registration.role
            );
            return Err(ServiceError::PhoneTaken {
                phone_number: phone_number.to_string(),
                role: registration.role,
            });
        }

        let mut stored = Vec::new();
        let result = self.persist(&registration, &mut stored).await;

        match &result {
            Ok(id) => info!("Created {} account {}", registration.role, id),
            Err(e) => {
                error!("Registration failed, discarding {} upload(s): {}", stored.len(), e);
                self.discard(&stored).await;
            }
        }
        result
    }

    async fn store_upload(&self, upload: &Upload, stored: &mut Vec<StoredContent>) -> Result<String> {
        let content = self.store.store(&upload.file_name, &upload.bytes).await?;
        let url = content.url.clone();
        stored.push(content);
        Ok(url)
    }

    async fn discard(&self, stored: &[StoredContent]) {
        for content in stored {
            if let Err(e) = self.store.remove(&content.key).await {
                warn!("Failed to remove orphaned upload {}: {}", content.key, e);
            }
        }
    }

    async fn persist(
        &self,
        registration: &ValidatedRegistration,
        stored: &mut Vec<StoredContent>,
    ) -> Result<Uuid> {
        let identity = &registration.identity;
        let role = registration.role;

        let avatar_url = self.store_upload(&registration.avatar, stored).await?;
        let profile = match &registration.profile {
            RoleProfile::Rider {
                vehicle_plate,
                vehicle_photo,
            } => PreparedProfile::Rider {
                vehicle_plate,
                vehicle_photo_url: self.store_upload(vehicle_photo, stored).await?,
            },
            RoleProfile::User {
                addresses,
                pickup_addresses,
            } => PreparedProfile::User {
                addresses,
                pickup_addresses,
            },
        };

        let password_hash = self.passwords.hash(&identity.password).await?;

        let id = Uuid::new_v4();
        let now = Utc::now();

        trace!("Opening registration transaction");
        let txn = self.db.begin().await?;

        account::ActiveModel {
            id: Set(id),
            phone_number: Set(identity.phone_number.clone()),
            password_hash: Set(password_hash),
            firstname: Set(identity.firstname.clone()),
            lastname: Set(identity.lastname.clone()),
            avatar_url: Set(avatar_url),
            role: Set(role),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| conflict_or_database(e, &identity.phone_number, role))?;

        match profile {
            PreparedProfile::Rider {
                vehicle_plate,
                vehicle_photo_url,
            } => {
                rider_profile::ActiveModel {
                    rider_id: Set(id),
                    vehicle_plate: Set(vehicle_plate.to_string()),
                    vehicle_photo_url: Set(vehicle_photo_url),
                }
                .insert(&txn)
                .await?;
            }
            PreparedProfile::User {
                addresses,
                pickup_addresses,
            } => {
                user_address::Entity::insert_many(addresses.iter().map(|draft| {
                    user_address::ActiveModel {
                        user_id: Set(id),
                        label: Set(draft.label.clone()),
                        address_text: Set(draft.address_text.clone()),
                        latitude: Set(draft.latitude),
                        longitude: Set(draft.longitude),
                        created_at: Set(now),
                        ..Default::default()
                    }
                }))
                .exec(&txn)
                .await?;

                user_pickup_address::Entity::insert_many(pickup_addresses.iter().map(|draft| {
                    user_pickup_address::ActiveModel {
                        user_id: Set(id),
                        label: Set(draft.label.clone()),
                        address_text: Set(draft.address_text.clone()),
                        latitude: Set(draft.latitude),
                        longitude: Set(draft.longitude),
                        created_at: Set(now),
                        ..Default::default()
                    }
                }))
                .exec(&txn)
                .await?;

                debug!(
                    "Inserted {} address(es) and {} pickup address(es)",
                    addresses.len(),
                    pickup_addresses.len()
                );
            }
        }

        txn.commit().await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use model::entities::prelude::*;
    use sea_orm::{ColumnTrait, PaginatorTrait, QueryFilter};

    use super::*;
    use crate::content_store::{MemoryContentStore, StoreError};
    use crate::testing::{fast_passwords, png, rider_form, setup_db, user_form};

    fn expect_missing(result: Result<ValidatedRegistration>, field: &str) {
        match result {
            Err(ServiceError::MissingField(name)) => assert_eq!(name, field),
            Err(other) => panic!("expected missing {}, got {}", field, other),
            Ok(_) => panic!("expected missing {}, got success", field),
        }
    }

    fn expect_invalid(result: Result<ValidatedRegistration>, expected_field: &str) {
        match result {
            Err(ServiceError::InvalidField { field, .. }) => assert_eq!(field, expected_field),
            Err(other) => panic!("expected invalid {}, got {}", expected_field, other),
            Ok(_) => panic!("expected invalid {}, got success", expected_field),
        }
    }

    #[test]
    fn test_validate_rider_requires_vehicle_photo() {
        let mut form = rider_form("0810000001", "pw123456");
        form.vehicle_photo = None;

        expect_missing(validate(form), "vehiclePhotoData");
    }

    #[test]
    fn test_validate_rider_requires_vehicle_plate() {
        let mut form = rider_form("0810000001", "pw123456");
        form.vehicle_plate = Some("   ".to_string());

        expect_missing(validate(form), "vehiclePlate");
    }

    #[test]
    fn test_validate_unknown_role() {
        let mut form = user_form("0810000001", "pw123456");
        form.role = Some("admin".to_string());

        expect_invalid(validate(form), "role");
    }

    #[test]
    fn test_validate_phone_length() {
        let form = user_form("08100000011234", "pw123456");

        expect_invalid(validate(form), "phoneNumber");
    }

    #[test]
    fn test_validate_legacy_user_address_requires_pickup() {
        let mut form = user_form("0810000001", "pw123456");
        form.pickup_address = AddressFields::default();

        expect_missing(validate(form), "pickupAddressText");
    }

    #[test]
    fn test_validate_legacy_default_label() {
        let mut form = user_form("0810000001", "pw123456");
        form.address.label = None;

        let validated = validate(form).unwrap();
        match validated.profile {
            RoleProfile::User {
                addresses,
                pickup_addresses,
            } => {
                assert_eq!(addresses.len(), 1);
                assert_eq!(addresses[0].label, "Home 1");
                assert_eq!(addresses[0].latitude, 13.7367);
                assert_eq!(addresses[0].longitude, 100.5605);
                assert_eq!(pickup_addresses[0].label, "Home 1");
            }
            RoleProfile::Rider { .. } => panic!("expected user profile"),
        }
    }

    #[test]
    fn test_validate_array_addresses() {
        let mut form = user_form("0810000001", "pw123456");
        form.address = AddressFields {
            labels: vec!["Home".into(), "".into()],
            texts: vec!["A street".into(), "B street".into()],
            latitudes: vec!["13.1".into(), "13.2".into()],
            longitudes: vec!["100.1".into(), "100.2".into()],
            ..Default::default()
        };

        let validated = validate(form).unwrap();
        let RoleProfile::User { addresses, .. } = validated.profile else {
            panic!("expected user profile");
        };
        assert_eq!(addresses.len(), 2);
        assert_eq!(addresses[0].label, "Home");
        assert_eq!(addresses[1].label, "Home 2");
        assert_eq!((addresses[1].latitude, addresses[1].longitude), (13.2, 100.2));
    }

    #[test]
    fn test_validate_mismatched_array_lengths() {
        let mut form = user_form("0810000001", "pw123456");
        form.address = AddressFields {
            texts: vec!["A street".into(), "B street".into()],
            latitudes: vec!["13.1".into()],
            longitudes: vec!["100.1".into(), "100.2".into()],
            ..Default::default()
        };

        expect_invalid(validate(form), "addresses");
    }

    #[test]
    fn test_validate_mismatched_pickup_labels() {
        let mut form = user_form("0810000001", "pw123456");
        form.pickup_address = AddressFields {
            labels: vec!["a".into(), "b".into(), "c".into()],
            texts: vec!["A street".into()],
            latitudes: vec!["13.1".into()],
            longitudes: vec!["100.1".into()],
            ..Default::default()
        };

        expect_invalid(validate(form), "pickupAddresses");
    }

    #[test]
    fn test_validate_coordinate_range() {
        let mut form = user_form("0810000001", "pw123456");
        form.address.latitude = Some("100.5".to_string());

        expect_invalid(validate(form), "addressLatitude");

        let mut form = user_form("0810000001", "pw123456");
        form.pickup_address.longitude = Some("east".to_string());

        expect_invalid(validate(form), "pickupAddressLongitude");
    }

    #[tokio::test]
    async fn test_register_user_persists_all_rows() {
        let db = setup_db().await;
        let store = MemoryContentStore::new("http://localhost:3000");
        let passwords = fast_passwords();

        let mut form = user_form("0810000002", "pw123456");
        form.pickup_address = AddressFields {
            texts: vec!["P1".into(), "P2".into()],
            latitudes: vec!["13.5".into(), "13.6".into()],
            longitudes: vec!["100.5".into(), "100.6".into()],
            ..Default::default()
        };

        let id = Registrar::new(&db, &store, &passwords)
            .register(form)
            .await
            .unwrap();

        let stored = Account::find_by_id(id).one(&db).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::User);
        assert!(stored.avatar_url.starts_with("http://localhost:3000/image/"));
        assert_ne!(stored.password_hash, "pw123456");
        assert!(passwords.verify_blocking("pw123456", &stored.password_hash));

        let addresses = UserAddress::find()
            .filter(user_address::Column::UserId.eq(id))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(addresses.len(), 1);
        assert_eq!((addresses[0].latitude, addresses[0].longitude), (13.7367, 100.5605));

        let pickups = UserPickupAddress::find()
            .filter(user_pickup_address::Column::UserId.eq(id))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(pickups.len(), 2);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_register_with_long_file_names_fits_url_columns() {
        let db = setup_db().await;
        let store = MemoryContentStore::new("http://localhost:3000");
        let passwords = fast_passwords();

        let mut form = rider_form("0810000009", "pw123456");
        form.avatar = Some(png(&format!("{}.png", "a".repeat(240))));
        form.vehicle_photo = Some(png(&format!("{}.jpg", "ร".repeat(240))));

        let id = Registrar::new(&db, &store, &passwords)
            .register(form)
            .await
            .unwrap();

        let stored = Account::find_by_id(id).one(&db).await.unwrap().unwrap();
        assert!(stored.avatar_url.chars().count() <= 255);
        assert!(stored.avatar_url.ends_with(".png"));

        let profile = RiderProfile::find_by_id(id).one(&db).await.unwrap().unwrap();
        assert!(profile.vehicle_photo_url.chars().count() <= 255);
        assert!(profile.vehicle_photo_url.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_register_rider_persists_profile() {
        let db = setup_db().await;
        let store = MemoryContentStore::new("http://localhost:3000");
        let passwords = fast_passwords();

        let id = Registrar::new(&db, &store, &passwords)
            .register(rider_form("0810000003", "pw123456"))
            .await
            .unwrap();

        let profile = RiderProfile::find_by_id(id).one(&db).await.unwrap().unwrap();
        assert_eq!(profile.vehicle_plate, "2กค 5678");
        assert!(profile.vehicle_photo_url.ends_with("_bike.jpg"));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_register_rider_without_photo_creates_nothing() {
        let db = setup_db().await;
        let store = MemoryContentStore::new("http://localhost:3000");
        let passwords = fast_passwords();

        let mut form = rider_form("0810000004", "pw123456");
        form.vehicle_photo = None;

        let result = Registrar::new(&db, &store, &passwords).register(form).await;

        assert!(matches!(result, Err(ServiceError::MissingField("vehiclePhotoData"))));
        assert_eq!(Account::find().count(&db).await.unwrap(), 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_register_phone_unique_per_role() {
        let db = setup_db().await;
        let store = MemoryContentStore::new("http://localhost:3000");
        let passwords = fast_passwords();
        let registrar = Registrar::new(&db, &store, &passwords);

        registrar
            .register(user_form("0810000005", "pw123456"))
            .await
            .unwrap();

        let duplicate = registrar.register(user_form("0810000005", "other")).await;
        assert!(matches!(duplicate, Err(ServiceError::PhoneTaken { role: Role::User, .. })));

        registrar
            .register(rider_form("0810000005", "pw123456"))
            .await
            .expect("same phone with a different role is allowed");

        assert_eq!(Account::find().count(&db).await.unwrap(), 2);
    }

    #[derive(Debug)]
    struct BrokenStore;

    #[async_trait]
    impl ContentStore for BrokenStore {
        async fn store(&self, _: &str, _: &[u8]) -> std::result::Result<StoredContent, StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }

        async fn load(&self, _: &str) -> std::result::Result<Option<Vec<u8>>, StoreError> {
            Ok(None)
        }

        async fn remove(&self, _: &str) -> std::result::Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_register_store_failure_is_fatal() {
        let db = setup_db().await;
        let passwords = fast_passwords();

        let result = Registrar::new(&db, &BrokenStore, &passwords)
            .register(user_form("0810000006", "pw123456"))
            .await;

        assert!(matches!(result, Err(ServiceError::ContentStore(_))));
        assert_eq!(Account::find().count(&db).await.unwrap(), 0);
    }

    /// Slips a competing account in after the availability check, the way a
    /// concurrent registration would.
    #[derive(Debug)]
    struct RacingStore {
        inner: MemoryContentStore,
        db: DatabaseConnection,
        phone_number: String,
    }

    #[async_trait]
    impl ContentStore for RacingStore {
        async fn store(&self, file_name: &str, bytes: &[u8]) -> std::result::Result<StoredContent, StoreError> {
            let now = Utc::now();
            let exists = Account::find()
                .filter(account::Column::PhoneNumber.eq(self.phone_number.as_str()))
                .count(&self.db)
                .await
                .unwrap_or(0);
            if exists == 0 {
                account::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    phone_number: Set(self.phone_number.clone()),
                    password_hash: Set("x".to_string()),
                    firstname: Set("Racer".to_string()),
                    lastname: Set(None),
                    avatar_url: Set("x".to_string()),
                    role: Set(Role::User),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&self.db)
                .await
                .expect("insert competing account");
            }
            self.inner.store(file_name, bytes).await
        }

        async fn load(&self, key: &str) -> std::result::Result<Option<Vec<u8>>, StoreError> {
            self.inner.load(key).await
        }

        async fn remove(&self, key: &str) -> std::result::Result<(), StoreError> {
            self.inner.remove(key).await
        }
    }

    #[tokio::test]
    async fn test_register_insert_conflict_rolls_back_and_discards_uploads() {
        let db = setup_db().await;
        let passwords = fast_passwords();
        let store = RacingStore {
            inner: MemoryContentStore::new("http://localhost:3000"),
            db: db.clone(),
            phone_number: "0810000007".to_string(),
        };

        let result = Registrar::new(&db, &store, &passwords)
            .register(user_form("0810000007", "pw123456"))
            .await;

        assert!(matches!(result, Err(ServiceError::PhoneTaken { .. })));
        assert_eq!(Account::find().count(&db).await.unwrap(), 1);
        assert_eq!(UserAddress::find().count(&db).await.unwrap(), 0);
        assert!(store.inner.is_empty().await);
    }
}
