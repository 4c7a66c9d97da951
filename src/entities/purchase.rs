use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoucherType {
    Factura,
    Boleta,
}

impl VoucherType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoucherType::Factura => "FACTURA",
            VoucherType::Boleta => "BOLETA",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "FACTURA" => Some(VoucherType::Factura),
            "BOLETA" => Some(VoucherType::Boleta),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    Pen,
    Usd,
    Eur,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Pen => "PEN",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PEN" => Some(Currency::Pen),
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub voucher_type: String,
    pub voucher_number: String,
    pub supplier_id: Option<i32>,
    pub currency: String,
    pub purchase_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Model {
    /// Human-readable voucher reference, e.g. `FACTURA F001-1234`
    pub fn voucher_label(&self) -> String {
        format!("{} {}", self.voucher_type, self.voucher_number)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
    #[sea_orm(has_many = "super::purchase_line::Entity")]
    PurchaseLines,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::purchase_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseLines.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}
