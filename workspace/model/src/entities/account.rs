use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{rider_profile, user_address, user_pickup_address};

/// The kind of account.
///
/// A phone number may be registered once per role, so the same person can
/// hold both a `User` and a `Rider` account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Sender or receiver of deliveries.
    #[sea_orm(string_value = "USER")]
    User,
    /// Courier.
    #[sea_orm(string_value = "RIDER")]
    Rider,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Rider => "RIDER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role name is neither `USER` nor `RIDER`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("user") {
            Ok(Role::User)
        } else if trimmed.eq_ignore_ascii_case("rider") {
            Ok(Role::Rider)
        } else {
            Err(UnknownRole(s.to_string()))
        }
    }
}

/// An identity record. Role-specific data lives in `rider_profile` for
/// riders and in the two address tables for users.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "account")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub phone_number: String,
    /// Argon2 PHC string. Never serialized into responses.
    pub password_hash: String,
    pub firstname: String,
    pub lastname: Option<String>,
    pub avatar_url: String,
    pub role: Role,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// First and last name joined, or the first name alone.
    pub fn full_name(&self) -> String {
        match self.lastname.as_deref() {
            Some(lastname) if !lastname.is_empty() => format!("{} {}", self.firstname, lastname),
            _ => self.firstname.clone(),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::rider_profile::Entity")]
    RiderProfile,
    #[sea_orm(has_many = "super::user_address::Entity")]
    UserAddress,
    #[sea_orm(has_many = "super::user_pickup_address::Entity")]
    UserPickupAddress,
}

impl Related<rider_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RiderProfile.def()
    }
}

impl Related<user_address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserAddress.def()
    }
}

impl Related<user_pickup_address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserPickupAddress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
