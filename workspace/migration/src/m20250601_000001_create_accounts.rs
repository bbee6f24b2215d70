use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create account table
        manager
            .create_table(
                Table::create()
                    .table(Account::Table)
                    .if_not_exists()
                    .col(uuid(Account::Id).primary_key())
                    .col(string_len(Account::PhoneNumber, 10))
                    .col(text(Account::PasswordHash))
                    .col(string_len(Account::Firstname, 30))
                    .col(string_len_null(Account::Lastname, 30))
                    .col(string_len(Account::AvatarUrl, 255))
                    .col(string_len(Account::Role, 10))
                    .col(timestamp_with_time_zone(Account::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Account::UpdatedAt).default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        // One account per phone number and role
        manager
            .create_index(
                Index::create()
                    .name("uq_account_phone_role")
                    .table(Account::Table)
                    .col(Account::PhoneNumber)
                    .col(Account::Role)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create rider_profile table
        manager
            .create_table(
                Table::create()
                    .table(RiderProfile::Table)
                    .if_not_exists()
                    .col(uuid(RiderProfile::RiderId).primary_key())
                    .col(string_len(RiderProfile::VehiclePlate, 50))
                    .col(string_len(RiderProfile::VehiclePhotoUrl, 255))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_riderprofile_account")
                            .from(RiderProfile::Table, RiderProfile::RiderId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create user_address table
        manager
            .create_table(
                Table::create()
                    .table(UserAddress::Table)
                    .if_not_exists()
                    .col(pk_auto(UserAddress::Id))
                    .col(uuid(UserAddress::UserId))
                    .col(string_len(UserAddress::Label, 60))
                    .col(string_len(UserAddress::AddressText, 400))
                    .col(double(UserAddress::Latitude))
                    .col(double(UserAddress::Longitude))
                    .col(timestamp_with_time_zone(UserAddress::CreatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_useraddr_user")
                            .from(UserAddress::Table, UserAddress::UserId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create user_pickup_address table
        manager
            .create_table(
                Table::create()
                    .table(UserPickupAddress::Table)
                    .if_not_exists()
                    .col(pk_auto(UserPickupAddress::Id))
                    .col(uuid(UserPickupAddress::UserId))
                    .col(string_len(UserPickupAddress::Label, 60))
                    .col(string_len(UserPickupAddress::AddressText, 400))
                    .col(double(UserPickupAddress::Latitude))
                    .col(double(UserPickupAddress::Longitude))
                    .col(timestamp_with_time_zone(UserPickupAddress::CreatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_userpickup_user")
                            .from(UserPickupAddress::Table, UserPickupAddress::UserId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(UserPickupAddress::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserAddress::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(RiderProfile::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Account::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Account {
    Table,
    Id,
    PhoneNumber,
    PasswordHash,
    Firstname,
    Lastname,
    AvatarUrl,
    Role,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RiderProfile {
    Table,
    RiderId,
    VehiclePlate,
    VehiclePhotoUrl,
}

#[derive(DeriveIden)]
pub(crate) enum UserAddress {
    Table,
    Id,
    UserId,
    Label,
    AddressText,
    Latitude,
    Longitude,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum UserPickupAddress {
    Table,
    Id,
    UserId,
    Label,
    AddressText,
    Latitude,
    Longitude,
    CreatedAt,
}
