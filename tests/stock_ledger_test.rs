//! Stock ledger tests: the pending-approval gate and the running-balance
//! arithmetic the cached balances must agree with.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{DatabaseBackend, MockDatabase};
use std::sync::Arc;
use stockroom_api::{
    entities::stock_movement::{self, MovementStatus, MovementType},
    errors::ServiceError,
    services::stock_ledger::{MovementFilter, MovementInput, StockLedgerService},
};
use uuid::Uuid;

fn movement(
    status: MovementStatus,
    movement_type: MovementType,
    quantity: Decimal,
) -> stock_movement::Model {
    let now = Utc::now();
    stock_movement::Model {
        id: Uuid::new_v4(),
        transaction_no: "STK-20240101-00001".into(),
        item_code: "BLT-001".into(),
        warehouse_id: Uuid::new_v4(),
        movement_type,
        quantity,
        reference_type: None,
        reference_name: None,
        status,
        notes: None,
        rejection_reason: None,
        created_at: now,
        created_by: None,
        approved_at: None,
        approved_by: None,
    }
}

fn service(db: sea_orm::DatabaseConnection) -> StockLedgerService {
    StockLedgerService::new(Arc::new(db), None)
}

#[tokio::test]
async fn non_positive_quantity_is_refused_before_touching_the_database() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let svc = service(db);

    for quantity in [dec!(0), dec!(-5)] {
        let err = svc
            .post_movement(MovementInput {
                item_code: "BLT-001".into(),
                warehouse_id: Uuid::new_v4(),
                movement_type: MovementType::In,
                quantity,
                reference_type: None,
                reference_name: None,
                notes: None,
                created_by: None,
                valuation_rate: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }
}

#[tokio::test]
async fn listing_with_page_zero_is_a_validation_error() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let svc = service(db);

    let err = svc
        .list_movements(MovementFilter::default(), 0, 20)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn only_pending_movements_can_be_rejected() {
    let completed = movement(MovementStatus::Completed, MovementType::In, dec!(40));
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![completed.clone()]])
        .into_connection();
    let svc = service(db);

    let err = svc
        .reject_movement(completed.id, "wrong batch".into(), None)
        .await
        .unwrap_err();
    match err {
        ServiceError::InvalidStatus(msg) => {
            assert!(msg.contains("only Pending movements can be rejected"));
        }
        other => panic!("Expected InvalidStatus, got {:?}", other),
    }
}

#[tokio::test]
async fn approving_a_missing_movement_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<stock_movement::Model>::new()])
        .into_connection();
    let svc = service(db);

    let err = svc
        .approve_movement(Uuid::new_v4(), Some("inv-1".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn approving_a_cancelled_movement_is_invalid() {
    let cancelled = movement(MovementStatus::Cancelled, MovementType::Out, dec!(10));
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![cancelled.clone()]])
        .into_connection();
    let svc = service(db);

    let err = svc.approve_movement(cancelled.id, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidStatus(_)));
}

// The cached balance must equal cumulative IN minus cumulative OUT over
// completed movements; pending and cancelled rows are inert.
#[test]
fn balance_effect_sums_to_in_minus_out_over_completed_movements() {
    let history = vec![
        movement(MovementStatus::Completed, MovementType::In, dec!(100)),
        movement(MovementStatus::Completed, MovementType::Out, dec!(30)),
        movement(MovementStatus::Completed, MovementType::In, dec!(12.5)),
        movement(MovementStatus::Pending, MovementType::In, dec!(999)),
        movement(MovementStatus::Cancelled, MovementType::Out, dec!(50)),
    ];

    let derived: Decimal = history.iter().map(|m| m.balance_effect()).sum();
    assert_eq!(derived, dec!(82.5));
}

#[test]
fn rederiving_from_an_empty_history_yields_zero() {
    let history: Vec<stock_movement::Model> = Vec::new();
    let derived: Decimal = history.iter().map(|m| m.balance_effect()).sum();
    assert_eq!(derived, Decimal::ZERO);
}

#[test]
fn out_movements_can_drive_the_derived_balance_negative() {
    // The rebuild reports whatever the history says; the negative-stock guard
    // lives on the approval path, not in the re-derivation.
    let history = vec![
        movement(MovementStatus::Completed, MovementType::In, dec!(10)),
        movement(MovementStatus::Completed, MovementType::Out, dec!(25)),
    ];
    let derived: Decimal = history.iter().map(|m| m.balance_effect()).sum();
    assert_eq!(derived, dec!(-15));
}
