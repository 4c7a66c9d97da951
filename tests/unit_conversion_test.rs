mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use common::{seed_dimension, seed_unit, setup_state};
use fleetmaint_api::{
    entities::unit_relation::{self, Entity as UnitRelation},
    errors::ServiceError,
};

#[tokio::test]
async fn upsert_creates_inverse_edge() {
    let state = setup_state("units_inverse").await;
    let db = state.db.as_ref();

    let cantidad = seed_dimension(db, "CANTIDAD", "Cantidad").await;
    let unidad = seed_unit(db, cantidad.id, "UNIDAD", true).await;
    let docena = seed_unit(db, cantidad.id, "DOCENA", false).await;

    let (relation, inverse) = state
        .units
        .upsert_relation(cantidad.id, unidad.id, docena.id, dec!(12), true)
        .await
        .expect("upsert should succeed");

    assert_eq!(relation.base_unit_id, unidad.id);
    assert_eq!(relation.related_unit_id, docena.id);
    assert_eq!(relation.factor.round_dp(6), dec!(12));

    // Inverse auto-derived: 1/12 rounded half-up to 6 decimals.
    assert_eq!(inverse.base_unit_id, docena.id);
    assert_eq!(inverse.related_unit_id, unidad.id);
    assert_eq!(inverse.factor.round_dp(6), dec!(0.083333));

    let stored = UnitRelation::find()
        .count(db)
        .await
        .expect("count relations");
    assert_eq!(stored, 2);
}

#[tokio::test]
async fn convert_uses_direct_edge_and_inverse() {
    let state = setup_state("units_convert").await;
    let db = state.db.as_ref();

    let volumen = seed_dimension(db, "VOLUMEN", "Volumen").await;
    let litro = seed_unit(db, volumen.id, "LITRO", true).await;
    let galon = seed_unit(db, volumen.id, "GALON", false).await;

    state
        .units
        .upsert_relation(volumen.id, galon.id, litro.id, dec!(3.785412), true)
        .await
        .expect("upsert should succeed");

    let forward = state
        .units
        .get_factor(galon.id, litro.id)
        .await
        .expect("forward conversion");
    assert_eq!(forward.round_dp(6), dec!(3.785412));

    let backward = state
        .units
        .get_factor(litro.id, galon.id)
        .await
        .expect("backward conversion");
    // round(1/3.785412, 6)
    assert_eq!(backward.round_dp(6), dec!(0.264172));

    // Round trip stays within 6-decimal rounding of identity.
    let product = forward * backward;
    assert!((product - Decimal::ONE).abs() < dec!(0.00001));
}

#[tokio::test]
async fn same_unit_converts_to_one_without_an_edge() {
    let state = setup_state("units_identity").await;
    let db = state.db.as_ref();

    let cantidad = seed_dimension(db, "CANTIDAD", "Cantidad").await;
    let unidad = seed_unit(db, cantidad.id, "UNIDAD", true).await;

    let factor = state
        .units
        .get_factor(unidad.id, unidad.id)
        .await
        .expect("identity conversion");
    assert_eq!(factor, Decimal::ONE);
}

#[tokio::test]
async fn cross_dimension_conversion_is_rejected() {
    let state = setup_state("units_cross_dim").await;
    let db = state.db.as_ref();

    let cantidad = seed_dimension(db, "CANTIDAD", "Cantidad").await;
    let volumen = seed_dimension(db, "VOLUMEN", "Volumen").await;
    let unidad = seed_unit(db, cantidad.id, "UNIDAD", true).await;
    let litro = seed_unit(db, volumen.id, "LITRO", true).await;

    let err = state
        .units
        .get_factor(unidad.id, litro.id)
        .await
        .expect_err("conversion across dimensions must fail");
    assert!(matches!(err, ServiceError::IncompatibleDimension(_)));
}

#[tokio::test]
async fn missing_edge_is_no_conversion_path() {
    let state = setup_state("units_no_edge").await;
    let db = state.db.as_ref();

    let volumen = seed_dimension(db, "VOLUMEN", "Volumen").await;
    let litro = seed_unit(db, volumen.id, "LITRO", true).await;
    let galon = seed_unit(db, volumen.id, "GALON", false).await;

    let err = state
        .units
        .get_factor(litro.id, galon.id)
        .await
        .expect_err("no registered edge must fail");
    assert!(matches!(err, ServiceError::NoConversionPath(_)));
}

#[tokio::test]
async fn updating_a_relation_refreshes_its_inverse() {
    let state = setup_state("units_update").await;
    let db = state.db.as_ref();

    let cantidad = seed_dimension(db, "CANTIDAD", "Cantidad").await;
    let unidad = seed_unit(db, cantidad.id, "UNIDAD", true).await;
    let caja = seed_unit(db, cantidad.id, "CAJA", false).await;

    state
        .units
        .upsert_relation(cantidad.id, unidad.id, caja.id, dec!(24), true)
        .await
        .expect("initial upsert");

    let (relation, inverse) = state
        .units
        .upsert_relation(cantidad.id, unidad.id, caja.id, dec!(48), false)
        .await
        .expect("update upsert");

    assert_eq!(relation.factor.round_dp(6), dec!(48));
    assert_eq!(inverse.factor.round_dp(6), dec!(0.020833));
    // The active flag travels to the inverse as well.
    assert!(!relation.active);
    assert!(!inverse.active);

    // Still exactly two rows: the update reused both edges.
    let stored = UnitRelation::find()
        .count(db)
        .await
        .expect("count relations");
    assert_eq!(stored, 2);
}

#[tokio::test]
async fn unrepresentable_inverse_rejects_both_edges() {
    let state = setup_state("units_overflow").await;
    let db = state.db.as_ref();

    let cantidad = seed_dimension(db, "CANTIDAD", "Cantidad").await;
    let unidad = seed_unit(db, cantidad.id, "UNIDAD", true).await;
    let lote = seed_unit(db, cantidad.id, "LOTE", false).await;

    // 1/5000000 rounds to zero at six decimals.
    let err = state
        .units
        .upsert_relation(cantidad.id, unidad.id, lote.id, dec!(5000000), true)
        .await
        .expect_err("inverse rounding to zero must fail");
    assert!(matches!(err, ServiceError::PrecisionOverflow(_)));

    // No partial state: neither direction was written.
    let stored = UnitRelation::find()
        .filter(unit_relation::Column::DimensionId.eq(cantidad.id))
        .count(db)
        .await
        .expect("count relations");
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn zero_factor_and_self_relation_are_invalid() {
    let state = setup_state("units_invalid").await;
    let db = state.db.as_ref();

    let cantidad = seed_dimension(db, "CANTIDAD", "Cantidad").await;
    let unidad = seed_unit(db, cantidad.id, "UNIDAD", true).await;
    let caja = seed_unit(db, cantidad.id, "CAJA", false).await;

    let err = state
        .units
        .upsert_relation(cantidad.id, unidad.id, caja.id, Decimal::ZERO, true)
        .await
        .expect_err("zero factor must fail");
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let err = state
        .units
        .upsert_relation(cantidad.id, unidad.id, unidad.id, dec!(2), true)
        .await
        .expect_err("self relation must fail");
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn relation_units_must_match_declared_dimension() {
    let state = setup_state("units_wrong_dim").await;
    let db = state.db.as_ref();

    let cantidad = seed_dimension(db, "CANTIDAD", "Cantidad").await;
    let volumen = seed_dimension(db, "VOLUMEN", "Volumen").await;
    let unidad = seed_unit(db, cantidad.id, "UNIDAD", true).await;
    let litro = seed_unit(db, volumen.id, "LITRO", true).await;

    let err = state
        .units
        .upsert_relation(cantidad.id, unidad.id, litro.id, dec!(2), true)
        .await
        .expect_err("mixed-dimension relation must fail");
    assert!(matches!(err, ServiceError::ValidationError(_)));
}
