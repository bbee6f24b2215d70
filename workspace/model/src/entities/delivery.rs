use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{account, user_address, user_pickup_address};

/// Lifecycle status of a delivery.
///
/// Stored as a plain column; this service never transitions it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(15))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    #[sea_orm(string_value = "WAITING")]
    Waiting,
    #[sea_orm(string_value = "ACCEPTED")]
    Accepted,
    #[sea_orm(string_value = "PICKED_UP")]
    PickedUp,
    #[sea_orm(string_value = "DELIVERED")]
    Delivered,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Waiting => "WAITING",
            DeliveryStatus::Accepted => "ACCEPTED",
            DeliveryStatus::PickedUp => "PICKED_UP",
            DeliveryStatus::Delivered => "DELIVERED",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    /// Case-insensitive match against the stored names (`picked_up`, `PICKED_UP`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        [
            DeliveryStatus::Waiting,
            DeliveryStatus::Accepted,
            DeliveryStatus::PickedUp,
            DeliveryStatus::Delivered,
        ]
        .into_iter()
        .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
        .ok_or_else(|| format!("unknown delivery status '{}'", s))
    }
}

/// A parcel sent from one user to another, optionally carried by a rider.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "delivery")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    /// Points into `user_pickup_address`.
    pub pickup_address_id: i32,
    /// Points into `user_address`.
    pub dropoff_address_id: i32,
    /// Unset until a rider accepts the delivery.
    pub rider_id: Option<Uuid>,
    pub base_status: DeliveryStatus,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "account::Entity",
        from = "Column::SenderId",
        to = "account::Column::Id"
    )]
    Sender,
    #[sea_orm(
        belongs_to = "account::Entity",
        from = "Column::ReceiverId",
        to = "account::Column::Id"
    )]
    Receiver,
    #[sea_orm(
        belongs_to = "account::Entity",
        from = "Column::RiderId",
        to = "account::Column::Id"
    )]
    Rider,
    #[sea_orm(
        belongs_to = "user_pickup_address::Entity",
        from = "Column::PickupAddressId",
        to = "user_pickup_address::Column::Id"
    )]
    PickupAddress,
    #[sea_orm(
        belongs_to = "user_address::Entity",
        from = "Column::DropoffAddressId",
        to = "user_address::Column::Id"
    )]
    DropoffAddress,
}

impl Related<user_pickup_address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PickupAddress.def()
    }
}

impl Related<user_address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DropoffAddress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
