use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250601_000001_create_accounts::{Account, UserAddress, UserPickupAddress};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Delivery::Table)
                    .if_not_exists()
                    .col(uuid(Delivery::Id).primary_key())
                    .col(uuid(Delivery::SenderId))
                    .col(uuid(Delivery::ReceiverId))
                    .col(integer(Delivery::PickupAddressId))
                    .col(integer(Delivery::DropoffAddressId))
                    .col(uuid_null(Delivery::RiderId))
                    .col(string_len(Delivery::BaseStatus, 15).default("WAITING"))
                    .col(timestamp_with_time_zone(Delivery::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Delivery::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_delivery_sender")
                            .from(Delivery::Table, Delivery::SenderId)
                            .to(Account::Table, Account::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_delivery_receiver")
                            .from(Delivery::Table, Delivery::ReceiverId)
                            .to(Account::Table, Account::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_delivery_rider")
                            .from(Delivery::Table, Delivery::RiderId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_delivery_pickup")
                            .from(Delivery::Table, Delivery::PickupAddressId)
                            .to(UserPickupAddress::Table, UserPickupAddress::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_delivery_dropoff")
                            .from(Delivery::Table, Delivery::DropoffAddressId)
                            .to(UserAddress::Table, UserAddress::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Listing queries filter by party and sort by creation time
        manager
            .create_index(
                Index::create()
                    .name("idx_delivery_sender")
                    .table(Delivery::Table)
                    .col(Delivery::SenderId)
                    .col(Delivery::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_delivery_receiver")
                    .table(Delivery::Table)
                    .col(Delivery::ReceiverId)
                    .col(Delivery::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Delivery::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Delivery {
    Table,
    Id,
    SenderId,
    ReceiverId,
    PickupAddressId,
    DropoffAddressId,
    RiderId,
    BaseStatus,
    CreatedAt,
    UpdatedAt,
}
