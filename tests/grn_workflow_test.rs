//! Workflow tests for the goods-receipt QC lifecycle.
//!
//! Covers the transition table, the inspection preconditions, and the
//! approval side effects, using MockDatabase where a command needs
//! persistence.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use std::collections::BTreeMap;
use std::sync::Arc;
use stockroom_api::{
    commands::goodsreceipt::{
        approve_grn_command::ApproveGrnCommand,
        complete_inspection_command::CompleteInspectionCommand,
        start_inspection_command::StartInspectionCommand,
    },
    commands::Command,
    entities::{
        grn::{self, GrnStatus},
        grn_item::{self, GrnItemStatus},
        item, stock_balance, stock_ledger, stock_movement, warehouse,
    },
    errors::ServiceError,
    events,
};
use uuid::Uuid;

fn test_grn(status: GrnStatus) -> grn::Model {
    let now = Utc::now();
    grn::Model {
        id: Uuid::new_v4(),
        grn_no: "GRN-20240101-0001".into(),
        po_no: Some("PO-20231228-0042".into()),
        supplier_id: Uuid::new_v4(),
        supplier_name: "Sharma Alloys".into(),
        receipt_date: now,
        status,
        notes: None,
        rejection_reason: None,
        created_at: now,
        created_by: Some("receiving-clerk".into()),
        updated_at: now,
        updated_by: None,
        version: 1,
    }
}

fn test_item(grn_id: Uuid, accepted: Decimal, rejected: Decimal) -> grn_item::Model {
    let received = accepted + rejected;
    let item_status = if accepted == Decimal::ZERO {
        GrnItemStatus::Rejected
    } else if rejected == Decimal::ZERO {
        GrnItemStatus::Accepted
    } else {
        GrnItemStatus::PartiallyAccepted
    };
    grn_item::Model {
        id: Uuid::new_v4(),
        grn_id,
        item_code: "BLT-001".into(),
        item_name: "M8 hex bolt".into(),
        po_qty: received,
        received_qty: received,
        accepted_qty: accepted,
        rejected_qty: rejected,
        batch_no: Some("B-77".into()),
        warehouse_name: "Main Warehouse".into(),
        item_status,
        qc_checks: serde_json::json!({"dimension": true}),
        inspection_notes: None,
        inspected_at: Some(Utc::now()),
    }
}

fn test_warehouse() -> warehouse::Model {
    let now = Utc::now();
    warehouse::Model {
        id: Uuid::new_v4(),
        warehouse_code: "WH-MAIN".into(),
        warehouse_name: "Main Warehouse".into(),
        department: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn event_sender() -> (Arc<events::EventSender>, tokio::sync::mpsc::Receiver<events::Event>) {
    let (sender, rx) = events::channel(16);
    (Arc::new(sender), rx)
}

#[tokio::test]
async fn start_inspection_moves_pending_grn_to_inspecting() {
    let grn = test_grn(GrnStatus::Pending);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![grn.clone()]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();

    let (sender, mut rx) = event_sender();
    let command = StartInspectionCommand {
        grn_no: grn.grn_no.clone(),
        version: 1,
        actor: Some("qc-1".into()),
    };

    let updated = command.execute(Arc::new(db), sender).await.unwrap();
    assert_eq!(updated.status, GrnStatus::Inspecting);
    assert_eq!(updated.version, 2);
    assert_eq!(updated.updated_by.as_deref(), Some("qc-1"));

    assert!(matches!(
        rx.recv().await,
        Some(events::Event::GrnInspectionStarted(_))
    ));
}

#[tokio::test]
async fn start_inspection_refuses_terminal_grn() {
    let grn = test_grn(GrnStatus::Approved);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![grn.clone()]])
        .into_connection();

    let (sender, _rx) = event_sender();
    let command = StartInspectionCommand {
        grn_no: grn.grn_no,
        version: 1,
        actor: None,
    };

    let err = command.execute(Arc::new(db), sender).await.unwrap_err();
    match err {
        ServiceError::InvalidStatus(msg) => {
            assert!(msg.contains("illegal transition from approved to inspecting"));
        }
        other => panic!("Expected InvalidStatus, got {:?}", other),
    }
}

#[tokio::test]
async fn stale_version_is_a_conflict() {
    let grn = test_grn(GrnStatus::Pending);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![grn.clone()]])
        .into_connection();

    let (sender, _rx) = event_sender();
    let command = StartInspectionCommand {
        grn_no: grn.grn_no,
        version: 7,
        actor: None,
    };

    let err = command.execute(Arc::new(db), sender).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn unknown_grn_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<grn::Model>::new()])
        .into_connection();

    let (sender, _rx) = event_sender();
    let command = StartInspectionCommand {
        grn_no: "GRN-19990101-0001".into(),
        version: 1,
        actor: None,
    };

    let err = command.execute(Arc::new(db), sender).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

// A fully rejected GRN cannot reach awaiting_inventory_approval.
#[tokio::test]
async fn complete_inspection_refuses_fully_rejected_grn() {
    let grn = test_grn(GrnStatus::Inspecting);
    let rejected_line = test_item(grn.id, dec!(0), dec!(100));
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![grn.clone()]])
        .append_query_results([vec![rejected_line]])
        .into_connection();

    let (sender, _rx) = event_sender();
    let command = CompleteInspectionCommand {
        grn_no: grn.grn_no,
        version: 1,
        actor: None,
    };

    let err = command.execute(Arc::new(db), sender).await.unwrap_err();
    match err {
        ServiceError::InvalidOperation(msg) => assert!(msg.contains("no accepted items")),
        other => panic!("Expected InvalidOperation, got {:?}", other),
    }
}

#[tokio::test]
async fn complete_inspection_requires_every_line_inspected() {
    let grn = test_grn(GrnStatus::Inspecting);
    let mut uninspected = test_item(grn.id, dec!(0), dec!(0));
    uninspected.item_status = GrnItemStatus::Pending;
    uninspected.received_qty = dec!(50);
    uninspected.inspected_at = None;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![grn.clone()]])
        .append_query_results([vec![uninspected]])
        .into_connection();

    let (sender, _rx) = event_sender();
    let command = CompleteInspectionCommand {
        grn_no: grn.grn_no,
        version: 1,
        actor: None,
    };

    let err = command.execute(Arc::new(db), sender).await.unwrap_err();
    match err {
        ServiceError::InvalidOperation(msg) => assert!(msg.contains("not been inspected")),
        other => panic!("Expected InvalidOperation, got {:?}", other),
    }
}

// Approving with zero accepted quantity fails before any movement is
// written.
#[tokio::test]
async fn approve_with_zero_accepted_items_fails_and_posts_nothing() {
    let grn = test_grn(GrnStatus::AwaitingInventoryApproval);
    let rejected_line = test_item(grn.id, dec!(0), dec!(100));
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![grn.clone()]])
        .append_query_results([vec![rejected_line]])
        .into_connection();

    let (sender, _rx) = event_sender();
    let command = ApproveGrnCommand {
        grn_no: grn.grn_no,
        version: 1,
        actor: Some("inv-1".into()),
    };

    let db = Arc::new(db);
    let err = command.execute(db.clone(), sender).await.unwrap_err();
    match err {
        ServiceError::InvalidOperation(msg) => assert!(msg.contains("no accepted items")),
        other => panic!("Expected InvalidOperation, got {:?}", other),
    }

    // No insert was attempted: the mock recorded no exec statements.
    let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
    let flattened = format!("{:?}", log);
    assert!(!flattened.contains("INSERT"));
}

// One item, 100 received, accepted in full; approval posts exactly one
// completed IN movement of quantity 100.
#[tokio::test]
async fn approving_fully_accepted_grn_posts_one_completed_in_movement() {
    let grn = test_grn(GrnStatus::AwaitingInventoryApproval);
    let accepted_line = test_item(grn.id, dec!(100), dec!(0));
    let warehouse = test_warehouse();
    let now = Utc::now();

    let posted_movement = stock_movement::Model {
        id: Uuid::new_v4(),
        transaction_no: "STK-20240101-00001".into(),
        item_code: "BLT-001".into(),
        warehouse_id: warehouse.id,
        movement_type: stock_movement::MovementType::In,
        quantity: dec!(100),
        reference_type: Some("GRN Request".into()),
        reference_name: Some(grn.grn_no.clone()),
        status: stock_movement::MovementStatus::Completed,
        notes: None,
        rejection_reason: None,
        created_at: now,
        created_by: Some("inv-1".into()),
        approved_at: Some(now),
        approved_by: Some("inv-1".into()),
    };
    let ledger_row = stock_ledger::Model {
        id: Uuid::new_v4(),
        item_code: "BLT-001".into(),
        warehouse_id: warehouse.id,
        transaction_date: now,
        qty_in: dec!(100),
        qty_out: dec!(0),
        reference_type: Some("Stock Movement".into()),
        reference_name: Some("STK-20240101-00001".into()),
        remarks: None,
        created_by: Some("inv-1".into()),
        created_at: now,
    };
    let new_balance = stock_balance::Model {
        id: Uuid::new_v4(),
        item_code: "BLT-001".into(),
        warehouse_id: warehouse.id,
        current_qty: dec!(100),
        reserved_qty: dec!(0),
        available_qty: dec!(100),
        valuation_rate: dec!(0),
        total_value: dec!(0),
        last_receipt_date: Some(now),
        last_issue_date: None,
        created_at: now,
        updated_at: now,
    };

    let count_row = BTreeMap::from([("num_items", sea_orm::Value::from(0i64))]);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![grn.clone()]])
        .append_query_results([vec![accepted_line]])
        .append_query_results([vec![warehouse.clone()]])
        .append_query_results([Vec::<item::Model>::new()])
        .append_query_results([vec![count_row]])
        .append_query_results([vec![posted_movement]])
        .append_query_results([vec![ledger_row]])
        .append_query_results([Vec::<stock_balance::Model>::new()])
        .append_query_results([vec![new_balance]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();

    let (sender, mut rx) = event_sender();
    let command = ApproveGrnCommand {
        grn_no: grn.grn_no.clone(),
        version: 1,
        actor: Some("inv-1".into()),
    };

    let result = command.execute(Arc::new(db), sender).await.unwrap();

    assert_eq!(result.grn.status, GrnStatus::Approved);
    assert_eq!(result.movements.len(), 1);
    assert_eq!(result.posted_quantity, dec!(100));
    let movement = &result.movements[0];
    assert_eq!(movement.movement_type, stock_movement::MovementType::In);
    assert_eq!(movement.status, stock_movement::MovementStatus::Completed);
    assert_eq!(movement.quantity, dec!(100));
    assert_eq!(movement.item_code, "BLT-001");
    assert_eq!(movement.reference_name.as_deref(), Some("GRN-20240101-0001"));

    assert!(matches!(
        rx.recv().await,
        Some(events::Event::GrnApproved { posted_quantity, .. }) if posted_quantity == dec!(100)
    ));
}

// At the model level the transition table is the whole story.
#[test]
fn every_non_edge_transition_is_rejected_and_leaves_the_model_unchanged() {
    use GrnStatus::*;
    let all = [
        Pending,
        Inspecting,
        AwaitingInventoryApproval,
        Approved,
        Rejected,
        SentBack,
    ];
    let edges = [
        (Pending, Inspecting),
        (Inspecting, AwaitingInventoryApproval),
        (Inspecting, Rejected),
        (AwaitingInventoryApproval, Approved),
        (AwaitingInventoryApproval, SentBack),
        (SentBack, Inspecting),
    ];

    for from in all {
        for to in all {
            let mut model = test_grn(from);
            let result = model.transition(to, Some("tester"));
            if edges.contains(&(from, to)) {
                result.unwrap();
                assert_eq!(model.status, to);
                assert_eq!(model.version, 2);
            } else {
                result.unwrap_err();
                assert_eq!(model.status, from, "{from} -> {to} must not change status");
                assert_eq!(model.version, 1);
            }
        }
    }
}

// Partial acceptance: only the accepted portion is posted.
#[test]
fn partially_accepted_line_reports_the_accepted_portion() {
    let mut line = test_item(Uuid::new_v4(), dec!(0), dec!(0));
    line.received_qty = dec!(100);
    line.accepted_qty = dec!(0);
    line.rejected_qty = dec!(0);
    line.item_status = GrnItemStatus::Pending;

    line.record_inspection(
        dec!(80),
        dec!(20),
        BTreeMap::from([("dimension".to_string(), false)]),
        Some("20 out of tolerance".into()),
    )
    .unwrap();

    assert_eq!(line.item_status, GrnItemStatus::PartiallyAccepted);
    assert!(line.has_accepted_quantity());
    assert_eq!(line.accepted_qty, dec!(80));
}
