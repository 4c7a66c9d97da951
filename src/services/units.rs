use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    entities::{
        dimension::Entity as Dimension,
        unit_of_measure::{self, Entity as UnitOfMeasure},
        unit_relation::{self, Entity as UnitRelation},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Decimal places the auto-derived inverse factor is rounded to.
const INVERSE_SCALE: u32 = 6;
/// Storage bounds of the factor column: 30 digits, 12 of them decimals.
const FACTOR_MAX_SCALE: u32 = 12;
const FACTOR_MAX_DIGITS: usize = 30;

/// Unit conversion graph: direct edges plus auto-maintained inverses.
///
/// The graph deliberately does no multi-hop resolution; a conversion either
/// has a registered edge or fails.
#[derive(Clone)]
pub struct UnitConversionService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl UnitConversionService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Returns the factor converting a quantity in `from_unit` into
    /// `to_unit`.
    #[instrument(skip(self))]
    pub async fn get_factor(
        &self,
        from_unit_id: i32,
        to_unit_id: i32,
    ) -> Result<Decimal, ServiceError> {
        conversion_factor_on(&*self.db, from_unit_id, to_unit_id).await
    }

    /// Creates or updates the edge base → related and its inverse, as one
    /// atomic write. Returns `(relation, inverse_relation)`.
    #[instrument(skip(self))]
    pub async fn upsert_relation(
        &self,
        dimension_id: i32,
        base_unit_id: i32,
        related_unit_id: i32,
        factor: Decimal,
        active: bool,
    ) -> Result<(unit_relation::Model, unit_relation::Model), ServiceError> {
        if base_unit_id == related_unit_id {
            return Err(ServiceError::validation(
                "base and related unit must differ",
            ));
        }
        if factor.is_zero() {
            return Err(ServiceError::validation("conversion factor must not be zero"));
        }
        if exceeds_storage(&factor) {
            return Err(ServiceError::PrecisionOverflow(format!(
                "factor {} does not fit {} digits / {} decimals",
                factor, FACTOR_MAX_DIGITS, FACTOR_MAX_SCALE
            )));
        }

        let inverse = inverse_factor(factor)?;

        let db = &*self.db;

        Dimension::find_by_id(dimension_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::not_found(format!("Dimension {} not found", dimension_id))
            })?;

        let base = find_unit(db, base_unit_id).await?;
        let related = find_unit(db, related_unit_id).await?;

        if base.dimension_id != dimension_id || related.dimension_id != dimension_id {
            return Err(ServiceError::validation(format!(
                "units {} and {} must both belong to dimension {}",
                base.name, related.name, dimension_id
            )));
        }

        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let relation =
            upsert_edge(&txn, dimension_id, base_unit_id, related_unit_id, factor, active).await?;
        let inverse_relation =
            upsert_edge(&txn, dimension_id, related_unit_id, base_unit_id, inverse, active).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::UnitRelationUpserted {
                    relation_id: relation.id,
                    inverse_relation_id: inverse_relation.id,
                    dimension_id,
                })
                .await;
        }

        info!(
            "Unit relation upserted: {} -> {} factor {} (inverse {})",
            base.name, related.name, factor, inverse
        );

        Ok((relation, inverse_relation))
    }
}

/// Transaction-friendly lookup used by the stock calculator and intake.
pub(crate) async fn conversion_factor_on<C: ConnectionTrait>(
    conn: &C,
    from_unit_id: i32,
    to_unit_id: i32,
) -> Result<Decimal, ServiceError> {
    if from_unit_id == to_unit_id {
        return Ok(Decimal::ONE);
    }

    let from = find_unit(conn, from_unit_id).await?;
    let to = find_unit(conn, to_unit_id).await?;

    if from.dimension_id != to.dimension_id {
        return Err(ServiceError::IncompatibleDimension(format!(
            "cannot convert {} to {}: different dimensions",
            from.name, to.name
        )));
    }

    let relation = UnitRelation::find()
        .filter(unit_relation::Column::BaseUnitId.eq(from_unit_id))
        .filter(unit_relation::Column::RelatedUnitId.eq(to_unit_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| {
            ServiceError::NoConversionPath(format!(
                "no conversion registered from {} to {}",
                from.name, to.name
            ))
        })?;

    if relation.factor.is_zero() {
        return Err(ServiceError::ZeroFactor(format!(
            "conversion from {} to {} has a zero factor",
            from.name, to.name
        )));
    }

    Ok(relation.factor)
}

async fn find_unit<C: ConnectionTrait>(
    conn: &C,
    unit_id: i32,
) -> Result<unit_of_measure::Model, ServiceError> {
    UnitOfMeasure::find_by_id(unit_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::not_found(format!("Unit of measure {} not found", unit_id)))
}

async fn upsert_edge<C: ConnectionTrait>(
    conn: &C,
    dimension_id: i32,
    base_unit_id: i32,
    related_unit_id: i32,
    factor: Decimal,
    active: bool,
) -> Result<unit_relation::Model, ServiceError> {
    let existing = UnitRelation::find()
        .filter(unit_relation::Column::BaseUnitId.eq(base_unit_id))
        .filter(unit_relation::Column::RelatedUnitId.eq(related_unit_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let model = match existing {
        Some(found) => {
            let mut active_model: unit_relation::ActiveModel = found.into();
            active_model.dimension_id = Set(dimension_id);
            active_model.factor = Set(factor);
            active_model.active = Set(active);
            active_model
                .update(conn)
                .await
                .map_err(ServiceError::db_error)?
        }
        None => {
            let active_model = unit_relation::ActiveModel {
                dimension_id: Set(dimension_id),
                base_unit_id: Set(base_unit_id),
                related_unit_id: Set(related_unit_id),
                factor: Set(factor),
                active: Set(active),
                ..Default::default()
            };
            active_model
                .insert(conn)
                .await
                .map_err(ServiceError::db_error)?
        }
    };

    Ok(model)
}

/// Derives the inverse factor: round(1/f, 6, half-up). An inverse that
/// rounds to zero or overflows the column is rejected, failing the whole
/// upsert.
fn inverse_factor(factor: Decimal) -> Result<Decimal, ServiceError> {
    let inverse = (Decimal::ONE / factor)
        .round_dp_with_strategy(INVERSE_SCALE, RoundingStrategy::MidpointAwayFromZero);

    if inverse.is_zero() {
        return Err(ServiceError::PrecisionOverflow(format!(
            "inverse of factor {} rounds to zero at {} decimals",
            factor, INVERSE_SCALE
        )));
    }
    if exceeds_storage(&inverse) {
        return Err(ServiceError::PrecisionOverflow(format!(
            "inverse of factor {} does not fit {} digits / {} decimals",
            factor, FACTOR_MAX_DIGITS, FACTOR_MAX_SCALE
        )));
    }

    Ok(inverse)
}

fn exceeds_storage(value: &Decimal) -> bool {
    let normalized = value.normalize();
    let digits = normalized.mantissa().unsigned_abs().to_string().len();
    normalized.scale() > FACTOR_MAX_SCALE || digits > FACTOR_MAX_DIGITS
}
