use sea_orm::entity::prelude::*;

use super::account;

/// Vehicle details of a rider. Created in the same transaction as the
/// rider's account and never modified afterwards.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "rider_profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub rider_id: Uuid,
    pub vehicle_plate: String,
    pub vehicle_photo_url: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "account::Entity",
        from = "Column::RiderId",
        to = "account::Column::Id",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
