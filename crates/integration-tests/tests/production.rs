//! Recipe costing and batch production workflows against the in-memory store.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use solid_ops::error::OpsError;
use solid_ops::models::{
    BatchFilter, CreateBatchInput, MovementFilter, ProduceBatchInput, UpdateIngredientInput,
};
use solid_ops::services::{BatchService, IngredientService, InventoryService, RecipeService};
use solid_ops_core::{BatchStatus, MovementType, Unit};
use solid_ops_integration_tests::{
    TEST_ACTOR, balance, ingredient, memory_store, receive, recipe,
};

fn plan(recipe_id: solid_ops_core::RecipeId, units: Decimal) -> CreateBatchInput {
    CreateBatchInput {
        recipe_id,
        planned_units: units,
    }
}

#[tokio::test]
async fn test_produce_single_unit_snapshots_cost() {
    let store = memory_store();
    let flour = ingredient(&store, "Rice flour", Unit::Gram, dec!(0.005))
        .await
        .unwrap();
    let sugar = ingredient(&store, "Sugar", Unit::Gram, dec!(0.002))
        .await
        .unwrap();
    receive(&store, flour, dec!(1000), dec!(0.005)).await.unwrap();
    receive(&store, sugar, dec!(1000), dec!(0.002)).await.unwrap();
    let scrub = recipe(
        &store,
        "Sugar scrub bar",
        dec!(1),
        &[
            (flour, dec!(500), Decimal::ZERO),
            (sugar, dec!(200), Decimal::ZERO),
        ],
    )
    .await
    .unwrap();

    let batches = BatchService::new(&store);
    let batch = batches.create(&plan(scrub, dec!(1)), TEST_ACTOR).await.unwrap();
    let produced = batches
        .produce(batch.id, &ProduceBatchInput::default(), TEST_ACTOR)
        .await
        .unwrap();

    assert_eq!(produced.status, BatchStatus::Produced);
    assert_eq!(produced.cost_snapshot_total, Some(dec!(2.9)));
    assert_eq!(produced.cost_snapshot_per_unit, Some(dec!(2.9)));
    assert_eq!(balance(&store, flour).await.unwrap(), dec!(500));
    assert_eq!(balance(&store, sugar).await.unwrap(), dec!(800));

    let detail = batches.get(batch.id).await.unwrap();
    assert_eq!(detail.consumptions.len(), 2);
}

#[tokio::test]
async fn test_produce_without_stock_leaves_batch_planned() {
    let store = memory_store();
    let flour = ingredient(&store, "Oat flour", Unit::Gram, dec!(0.005))
        .await
        .unwrap();
    let bar = recipe(&store, "Oat bar", dec!(1), &[(flour, dec!(5000), Decimal::ZERO)])
        .await
        .unwrap();

    let batches = BatchService::new(&store);
    let batch = batches.create(&plan(bar, dec!(1)), TEST_ACTOR).await.unwrap();
    let err = batches
        .produce(batch.id, &ProduceBatchInput::default(), TEST_ACTOR)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OpsError::InsufficientStock { required, available, .. }
            if required == dec!(5000) && available == Decimal::ZERO
    ));
    let detail = batches.get(batch.id).await.unwrap();
    assert_eq!(detail.batch.status, BatchStatus::Planned);
    assert!(detail.batch.cost_snapshot_total.is_none());
    assert!(detail.consumptions.is_empty());
}

#[tokio::test]
async fn test_cost_sheet_ignores_waste() {
    let store = memory_store();
    let flour = ingredient(&store, "Flour", Unit::Gram, dec!(0.005))
        .await
        .unwrap();
    let sugar = ingredient(&store, "Sugar", Unit::Gram, dec!(0.002))
        .await
        .unwrap();
    let eggs = ingredient(&store, "Egg", Unit::Count, dec!(0.50))
        .await
        .unwrap();
    let id = recipe(
        &store,
        "Egg yolk soap",
        dec!(2),
        &[
            (flour, dec!(500), dec!(0.2)),
            (sugar, dec!(200), Decimal::ZERO),
            (eggs, dec!(3), dec!(0.5)),
        ],
    )
    .await
    .unwrap();

    let cost = RecipeService::new(&store).calculate_cost(id).await.unwrap();

    assert_eq!(cost.total_cost, dec!(4.40));
    assert_eq!(cost.cost_per_unit, dec!(2.20));
    assert_eq!(cost.breakdown.len(), 3);
}

#[tokio::test]
async fn test_partial_shortage_writes_nothing() {
    let store = memory_store();
    let oil = ingredient(&store, "Coconut oil", Unit::Gram, dec!(0.01))
        .await
        .unwrap();
    let lye = ingredient(&store, "Lye", Unit::Gram, dec!(0.02))
        .await
        .unwrap();
    receive(&store, oil, dec!(2000), dec!(0.01)).await.unwrap();
    receive(&store, lye, dec!(10), dec!(0.02)).await.unwrap();
    let soap = recipe(
        &store,
        "Coconut soap",
        dec!(10),
        &[(oil, dec!(1000), Decimal::ZERO), (lye, dec!(140), Decimal::ZERO)],
    )
    .await
    .unwrap();

    let batches = BatchService::new(&store);
    let batch = batches.create(&plan(soap, dec!(10)), TEST_ACTOR).await.unwrap();
    let err = batches
        .produce(batch.id, &ProduceBatchInput::default(), TEST_ACTOR)
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::InsufficientStock { .. }));

    assert_eq!(balance(&store, oil).await.unwrap(), dec!(2000));
    assert_eq!(balance(&store, lye).await.unwrap(), dec!(10));
    let outs = InventoryService::new(&store)
        .movements(&MovementFilter::default())
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.movement_type == MovementType::Out)
        .count();
    assert_eq!(outs, 0);
}

#[tokio::test]
async fn test_snapshot_survives_cost_change() {
    let store = memory_store();
    let butter = ingredient(&store, "Shea butter", Unit::Gram, dec!(0.04))
        .await
        .unwrap();
    receive(&store, butter, dec!(1000), dec!(0.04)).await.unwrap();
    let balm = recipe(&store, "Lip balm", dec!(4), &[(butter, dec!(100), dec!(0.1))])
        .await
        .unwrap();

    let batches = BatchService::new(&store);
    let batch = batches.create(&plan(balm, dec!(8)), TEST_ACTOR).await.unwrap();
    let produced = batches
        .produce(batch.id, &ProduceBatchInput::default(), TEST_ACTOR)
        .await
        .unwrap();
    // 100 * (8 / 4) * 1.1 = 220 g at 0.04
    assert_eq!(produced.cost_snapshot_total, Some(dec!(8.8)));
    assert_eq!(balance(&store, butter).await.unwrap(), dec!(780));

    IngredientService::new(&store)
        .update(
            butter,
            &UpdateIngredientInput {
                cost_per_unit: Some(dec!(0.09)),
                ..UpdateIngredientInput::default()
            },
        )
        .await
        .unwrap();

    let detail = batches.get(batch.id).await.unwrap();
    assert_eq!(detail.batch.cost_snapshot_total, Some(dec!(8.8)));
    assert_eq!(detail.batch.cost_snapshot_per_unit, Some(dec!(1.1)));
    assert_eq!(detail.consumptions[0].unit_cost_at_time, dec!(0.04));

    let cost = RecipeService::new(&store).calculate_cost(balm).await.unwrap();
    assert_eq!(cost.total_cost, dec!(9));
}

#[tokio::test]
async fn test_canceled_batch_cannot_be_produced() {
    let store = memory_store();
    let wax = ingredient(&store, "Beeswax", Unit::Gram, dec!(0.03))
        .await
        .unwrap();
    receive(&store, wax, dec!(500), dec!(0.03)).await.unwrap();
    let bar = recipe(&store, "Lotion bar", dec!(5), &[(wax, dec!(100), Decimal::ZERO)])
        .await
        .unwrap();

    let batches = BatchService::new(&store);
    let batch = batches.create(&plan(bar, dec!(5)), TEST_ACTOR).await.unwrap();
    let canceled = batches.cancel(batch.id).await.unwrap();
    assert_eq!(canceled.status, BatchStatus::Canceled);

    let err = batches
        .produce(batch.id, &ProduceBatchInput::default(), TEST_ACTOR)
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::InvalidState(BatchStatus::Canceled)));
    assert_eq!(balance(&store, wax).await.unwrap(), dec!(500));

    let planned = batches
        .list(&BatchFilter {
            status: Some(BatchStatus::Planned),
            ..BatchFilter::default()
        })
        .await
        .unwrap();
    assert!(planned.is_empty());
}
