use std::collections::{BTreeSet, HashMap};

use model::entities::prelude::*;
use model::entities::{account, delivery, user_address, user_pickup_address};
use model::DeliveryStatus;
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use crate::error::Result;

/// Which side of a delivery the user has to be on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryScope {
    /// Sender or receiver.
    Involving,
    Sent,
    Received,
}

/// A delivery with its addresses and parties resolved.
///
/// Related rows are optional only because the foreign keys could point at
/// rows removed outside this service.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryView {
    pub delivery: delivery::Model,
    pub pickup_address: Option<user_pickup_address::Model>,
    pub dropoff_address: Option<user_address::Model>,
    pub sender: Option<account::Model>,
    pub receiver: Option<account::Model>,
    pub rider: Option<account::Model>,
}

/// Deliveries for `user_id`, newest first.
///
/// `status` is matched case-insensitively. A status name that does not
/// exist matches nothing.
#[instrument(skip(db))]
pub async fn list_deliveries<C>(
    db: &C,
    user_id: Uuid,
    scope: DeliveryScope,
    status: Option<&str>,
) -> Result<Vec<DeliveryView>>
where
    C: ConnectionTrait,
{
    let condition = match scope {
        DeliveryScope::Involving => Condition::any()
            .add(delivery::Column::SenderId.eq(user_id))
            .add(delivery::Column::ReceiverId.eq(user_id)),
        DeliveryScope::Sent => Condition::all().add(delivery::Column::SenderId.eq(user_id)),
        DeliveryScope::Received => Condition::all().add(delivery::Column::ReceiverId.eq(user_id)),
    };

    let mut query = Delivery::find().filter(condition);
    if let Some(raw) = status {
        match raw.parse::<DeliveryStatus>() {
            Ok(status) => query = query.filter(delivery::Column::BaseStatus.eq(status)),
            Err(e) => {
                debug!("{}, returning no deliveries", e);
                return Ok(Vec::new());
            }
        }
    }

    let deliveries = query
        .order_by_desc(delivery::Column::CreatedAt)
        .all(db)
        .await?;
    debug!("Found {} deliveries", deliveries.len());

    enrich(db, deliveries).await
}

async fn enrich<C>(db: &C, deliveries: Vec<delivery::Model>) -> Result<Vec<DeliveryView>>
where
    C: ConnectionTrait,
{
    if deliveries.is_empty() {
        return Ok(Vec::new());
    }

    let pickup_ids: BTreeSet<i32> = deliveries.iter().map(|d| d.pickup_address_id).collect();
    let dropoff_ids: BTreeSet<i32> = deliveries.iter().map(|d| d.dropoff_address_id).collect();
    let account_ids: BTreeSet<Uuid> = deliveries
        .iter()
        .flat_map(|d| [Some(d.sender_id), Some(d.receiver_id), d.rider_id])
        .flatten()
        .collect();
    trace!(
        "Resolving {} pickup, {} dropoff and {} account row(s)",
        pickup_ids.len(),
        dropoff_ids.len(),
        account_ids.len()
    );

    let pickups: HashMap<i32, user_pickup_address::Model> = UserPickupAddress::find()
        .filter(user_pickup_address::Column::Id.is_in(pickup_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();
    let dropoffs: HashMap<i32, user_address::Model> = UserAddress::find()
        .filter(user_address::Column::Id.is_in(dropoff_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();
    let accounts: HashMap<Uuid, account::Model> = Account::find()
        .filter(account::Column::Id.is_in(account_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    Ok(deliveries
        .into_iter()
        .map(|delivery| DeliveryView {
            pickup_address: pickups.get(&delivery.pickup_address_id).cloned(),
            dropoff_address: dropoffs.get(&delivery.dropoff_address_id).cloned(),
            sender: accounts.get(&delivery.sender_id).cloned(),
            receiver: accounts.get(&delivery.receiver_id).cloned(),
            rider: delivery.rider_id.and_then(|id| accounts.get(&id).cloned()),
            delivery,
        })
        .collect())
}
