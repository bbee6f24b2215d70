use model::entities::prelude::*;
use model::entities::{account, rider_profile, user_address, user_pickup_address};
use model::Role;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use crate::error::{Result, ServiceError};

/// An account with everything hanging off it.
#[derive(Debug, Clone)]
pub struct AccountDetail {
    pub account: account::Model,
    pub rider_profile: Option<rider_profile::Model>,
    pub addresses: Vec<user_address::Model>,
    pub pickup_addresses: Vec<user_pickup_address::Model>,
}

/// True when no account holds `phone_number` for `role` yet.
pub async fn is_phone_available<C>(db: &C, phone_number: &str, role: Role) -> Result<bool>
where
    C: ConnectionTrait,
{
    let taken = Account::find()
        .filter(account::Column::PhoneNumber.eq(phone_number.trim()))
        .filter(account::Column::Role.eq(role))
        .count(db)
        .await?;
    Ok(taken == 0)
}

/// Fails with `PhoneTaken` when the pair is already registered.
#[instrument(skip(db))]
pub async fn check_phone<C>(db: &C, phone_number: &str, role: Role) -> Result<()>
where
    C: ConnectionTrait,
{
    if is_phone_available(db, phone_number, role).await? {
        debug!("Phone number available");
        Ok(())
    } else {
        Err(ServiceError::PhoneTaken {
            phone_number: phone_number.trim().to_string(),
            role,
        })
    }
}

#[instrument(skip(db))]
pub async fn find_detail<C>(db: &C, id: Uuid) -> Result<AccountDetail>
where
    C: ConnectionTrait,
{
    trace!("Loading account detail");
    let account = Account::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::AccountNotFound(id))?;

    let detail = match account.role {
        Role::Rider => AccountDetail {
            rider_profile: RiderProfile::find_by_id(id).one(db).await?,
            addresses: Vec::new(),
            pickup_addresses: Vec::new(),
            account,
        },
        Role::User => AccountDetail {
            rider_profile: None,
            addresses: UserAddress::find()
                .filter(user_address::Column::UserId.eq(id))
                .order_by_asc(user_address::Column::Id)
                .all(db)
                .await?,
            pickup_addresses: UserPickupAddress::find()
                .filter(user_pickup_address::Column::UserId.eq(id))
                .order_by_asc(user_pickup_address::Column::Id)
                .all(db)
                .await?,
            account,
        },
    };

    debug!(
        "Found {} account with {} address(es)",
        detail.account.role,
        detail.addresses.len()
    );
    Ok(detail)
}
