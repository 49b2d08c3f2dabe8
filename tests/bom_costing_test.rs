//! Cost roll-up tests: arithmetic aggregation over components and
//! operations, margin before GST, missing rates treated as zero.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stockroom_api::{
    entities::{bom_component, bom_operation},
    services::bom::{roll_up_cost, scale_components},
};
use uuid::Uuid;

fn component(
    component_type: bom_component::ComponentType,
    item_code: &str,
    qty: Decimal,
    rate: Decimal,
) -> bom_component::Model {
    bom_component::Model {
        id: Uuid::new_v4(),
        bom_id: Uuid::new_v4(),
        component_type,
        item_code: item_code.into(),
        item_name: item_code.into(),
        qty,
        rate,
        uom: "Nos".into(),
    }
}

fn operation(
    name: &str,
    time_mins: Decimal,
    hourly_rate: Decimal,
    operating_cost: Decimal,
) -> bom_operation::Model {
    bom_operation::Model {
        id: Uuid::new_v4(),
        bom_id: Uuid::new_v4(),
        operation_name: name.into(),
        workstation: None,
        time_mins,
        hourly_rate,
        operating_cost,
    }
}

#[test]
fn full_roll_up_applies_margin_before_gst() {
    use bom_component::ComponentType::*;

    let components = [
        component(RawMaterial, "STL-RD-12", dec!(4), dec!(50)), // 200
        component(SubAssembly, "SUB-BRKT", dec!(1), dec!(120)), // 120
        component(FinishedGood, "FG-HOUSING", dec!(1), dec!(80)), // 80
    ];
    // 30 min at 600/hr = 300; explicit 150
    let operations = [
        operation("Milling", dec!(30), dec!(600), dec!(0)),
        operation("Deburr", dec!(10), dec!(0), dec!(150)),
    ];

    // Per assembly: material 400, operations 450. Quantity 2:
    // base 1700, 10% margin -> 1870, 9% + 9% GST -> 2206.60
    let breakdown = roll_up_cost(&components, &operations, dec!(2), dec!(10), dec!(9), dec!(9));

    assert_eq!(breakdown.material_cost, dec!(800));
    assert_eq!(breakdown.operation_cost, dec!(900));
    assert_eq!(breakdown.base_cost, dec!(1700));
    assert_eq!(breakdown.profit, dec!(170));
    assert_eq!(breakdown.cgst_amount, dec!(168.30));
    assert_eq!(breakdown.sgst_amount, dec!(168.30));
    assert_eq!(breakdown.grand_total, dec!(2206.60));
}

#[test]
fn missing_rates_contribute_zero_rather_than_failing() {
    use bom_component::ComponentType::*;

    let components = [
        component(RawMaterial, "STL-RD-12", dec!(3), dec!(0)),
        component(RawMaterial, "PAINT-BLK", dec!(1), dec!(40)),
    ];
    let operations = [operation("Assembly", dec!(0), dec!(0), dec!(0))];

    let breakdown = roll_up_cost(&components, &operations, dec!(1), dec!(0), dec!(0), dec!(0));
    assert_eq!(breakdown.material_cost, dec!(40));
    assert_eq!(breakdown.operation_cost, Decimal::ZERO);
    assert_eq!(breakdown.grand_total, dec!(40));
}

#[test]
fn empty_bom_rolls_up_to_zero() {
    let breakdown = roll_up_cost(&[], &[], dec!(10), dec!(15), dec!(9), dec!(9));
    assert_eq!(breakdown.base_cost, Decimal::ZERO);
    assert_eq!(breakdown.profit, Decimal::ZERO);
    assert_eq!(breakdown.grand_total, Decimal::ZERO);
}

#[test]
fn scrap_is_tracked_but_never_priced() {
    use bom_component::ComponentType::*;

    let components = [
        component(RawMaterial, "STL-RD-12", dec!(2), dec!(100)),
        component(Scrap, "SCRAP-STL", dec!(1), dec!(100)),
    ];

    let breakdown = roll_up_cost(&components, &[], dec!(1), dec!(0), dec!(0), dec!(0));
    assert_eq!(breakdown.material_cost, dec!(200));

    // Scrap still shows up in the requirements listing.
    let reqs = scale_components(&components, dec!(1));
    assert_eq!(reqs.len(), 2);
}

#[test]
fn explicit_operating_cost_overrides_the_derived_rate() {
    let operations = [operation("Turning", dec!(60), dec!(500), dec!(350))];
    let breakdown = roll_up_cost(&[], &operations, dec!(1), dec!(0), dec!(0), dec!(0));
    assert_eq!(breakdown.operation_cost, dec!(350));
}

#[test]
fn requirements_multiply_per_assembly_quantities() {
    use bom_component::ComponentType::*;

    let components = [
        component(RawMaterial, "STL-RD-12", dec!(2), dec!(50)),
        component(RawMaterial, "PAINT-BLK", dec!(0.25), dec!(40)),
    ];

    let reqs = scale_components(&components, dec!(10));
    assert_eq!(reqs[0].required_qty, dec!(20));
    assert_eq!(reqs[1].required_qty, dec!(2.50));
    assert_eq!(reqs[0].item_code, "STL-RD-12");
}

#[test]
fn gst_rates_apply_to_the_margined_subtotal_independently() {
    let components = [component(
        bom_component::ComponentType::RawMaterial,
        "STL-RD-12",
        dec!(1),
        dec!(1000),
    )];

    // base 1000, 20% margin -> 1200; CGST 6% = 72, SGST 3% = 36
    let breakdown = roll_up_cost(&components, &[], dec!(1), dec!(20), dec!(6), dec!(3));
    assert_eq!(breakdown.cgst_amount, dec!(72));
    assert_eq!(breakdown.sgst_amount, dec!(36));
    assert_eq!(breakdown.grand_total, dec!(1308));
}
