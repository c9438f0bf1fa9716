// ==========================================
// End to end planning scenarios
// ==========================================
// Every scenario writes its planning data as csv files, runs the whole
// pipeline and checks the plan together with the written report.
// ==========================================

mod helpers;

use std::fs;

use aggregate_planning::config::ConfigError;
use aggregate_planning::data::{schema::Table, DataError, PlanningData};
use aggregate_planning::models::aggregate_planning::{min_delivery, Parameters, Sets};
use aggregate_planning::models::{AggregatePlanning, PlanResult};
use aggregate_planning::report::project;
use aggregate_planning::solver::{GoodLpSolver, Status};
use aggregate_planning::utils::EPSILON;
use aggregate_planning::{run, Error};

use helpers::{single_lane, FixtureBuilder, Workspace};

fn amount(value: Option<f64>) -> f64 {
    value.expect("the plan should have a value")
}

fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = amount(actual);
    assert!(
        (actual - expected).abs() < EPSILON,
        "expected {}, got {}",
        expected,
        actual
    );
}

// ==========================================
// Scenarios with a unique optimum
// ==========================================

#[test]
fn free_outsourcing_covers_all_demand() {
    // shipping loses money while buying from the supplier is free
    let ws = Workspace::new(&single_lane(10.0, 4.0, 12.0, 0.0));
    let outcome = run(&ws.config("outsourcing", 1.0, 5)).unwrap();
    let result = &outcome.result;

    assert_eq!(result.status, Status::Optimal);
    assert_close(result.objective, 0.0);
    for t in 1..=2 {
        assert_close(result.production[&(1, 1, t)], 0.0);
        assert_close(result.shipment[&(1, 1, 1, t)], 0.0);
        assert_close(result.outsource[&(1, 1, 1, t)], 10.0);
    }
    for t in 0..=2 {
        assert_close(result.inventory[&(1, 1, t)], 5.0);
    }

    let dir = ws.report_dir().join("outsourcing");
    assert_eq!(outcome.report_dir, dir);
    assert_eq!(
        fs::read_to_string(dir.join("outsource.csv")).unwrap(),
        "product_id,supplier_id,client_id,period,amount\n1,1,1,1,10\n1,1,1,2,10\n"
    );
    assert_eq!(
        fs::read_to_string(dir.join("inventory.csv")).unwrap(),
        "product_id,center_id,period,amount\n1,1,0,5\n1,1,1,5\n1,1,2,5\n"
    );
    assert!(dir.join("production.csv").is_file());
    assert!(dir.join("shipment.csv").is_file());
    assert!(dir.join("solver.log").is_file());

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["name"], "outsourcing");
    assert_eq!(summary["solver"], "microlp");
    assert_eq!(summary["status"], "Optimal");
    assert_eq!(summary["variables"], 9);
    assert_eq!(summary["constraints"], 8);
}

#[test]
fn profitable_production_uses_initial_inventory_first() {
    // inventory costs 1 per unit and period, so nothing is held beyond what is needed
    let fixture = FixtureBuilder::new()
        .center(1, 1, 4.0, 100, 100, 1.0)
        .demand(1, 1, 1, 10, 20.0)
        .demand(1, 1, 2, 10, 20.0)
        .lane(1, 1, 1, 1.0)
        .offer(1, 1, 1, 30.0)
        .supplier_cap(1, 1, 100);
    let ws = Workspace::new(&fixture);
    let outcome = run(&ws.config("production", 1.0, 5)).unwrap();
    let result = &outcome.result;

    assert_eq!(result.status, Status::Optimal);
    assert_close(result.production[&(1, 1, 1)], 5.0);
    assert_close(result.production[&(1, 1, 2)], 10.0);
    for t in 1..=2 {
        assert_close(result.shipment[&(1, 1, 1, t)], 10.0);
        assert_close(result.outsource[&(1, 1, 1, t)], 0.0);
        assert_close(result.inventory[&(1, 1, t)], 0.0);
    }

    // 20 units sold at 20, 15 produced at 4, 20 shipped at 1
    assert_close(result.objective, 320.0);
    assert_close(result.breakdown.revenue, 400.0);
    assert_close(result.breakdown.production_cost, 60.0);
    assert_close(result.breakdown.shipment_cost, 20.0);
    assert_close(result.breakdown.outsourcing_cost, 0.0);
    assert_close(result.breakdown.inventory_cost, 0.0);
}

#[test]
fn unprofitable_demand_is_only_met_down_to_the_letdown_tolerance() {
    let fixture = FixtureBuilder::new()
        .center(1, 1, 4.0, 100, 100, 0.0)
        .demand(1, 1, 1, 9, 1.0)
        .demand(1, 1, 2, 9, 1.0)
        .lane(1, 1, 1, 10.0)
        .offer(1, 1, 1, 5.0)
        .supplier_cap(1, 1, 100);
    let ws = Workspace::new(&fixture);
    let outcome = run(&ws.config("letdown", 0.5, 0)).unwrap();
    let result = &outcome.result;

    assert_eq!(min_delivery(9, 0.5), 4);
    assert_eq!(result.status, Status::Optimal);
    for t in 1..=2 {
        assert_close(result.outsource[&(1, 1, 1, t)], 4.0);
        assert_close(result.shipment[&(1, 1, 1, t)], 0.0);
    }
    assert_close(result.objective, -40.0);
}

// ==========================================
// Infeasible plans
// ==========================================

#[test]
fn infeasible_plan_is_reported_without_amounts() {
    // at most 10 produced and 5 bought per period against a demand of 50
    let fixture = FixtureBuilder::new()
        .center(1, 1, 1.0, 10, 100, 0.0)
        .demand(1, 1, 1, 50, 10.0)
        .demand(1, 1, 2, 50, 10.0)
        .lane(1, 1, 1, 1.0)
        .offer(1, 1, 1, 1.0)
        .supplier_cap(1, 1, 5);
    let ws = Workspace::new(&fixture);
    let outcome = run(&ws.config("infeasible", 1.0, 0)).unwrap();

    assert_eq!(outcome.result.status, Status::Infeasible);
    assert_eq!(outcome.result.objective, None);
    assert!(outcome.result.production.values().all(|v| v.is_none()));
    assert!(outcome.result.inventory.values().all(|v| v.is_none()));

    let dir = ws.report_dir().join("infeasible");
    assert_eq!(
        fs::read_to_string(dir.join("production.csv")).unwrap(),
        "product_id,center_id,period,amount\n1,1,1,\n1,1,2,\n"
    );
    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["status"], "Infeasible");
    assert!(summary["objective"].is_null());
    assert!(summary["revenue"].is_null());
}

// ==========================================
// Properties of a larger plan
// ==========================================

/// Two of everything over three periods. Client 2 cannot be served from center 2 and
/// supplier 2 has no offer for product 2.
fn network() -> FixtureBuilder {
    let mut fixture = FixtureBuilder::new();
    for (product, center) in [(1, 1), (1, 2), (2, 1), (2, 2)] {
        fixture = fixture.center(product, center, 2.0 + center as f64, 15, 10, 0.5);
    }
    for (client, product, period) in itertools::iproduct!(1..=2, 1..=2, 1..=3) {
        let demand = 6 + 2 * (client + product + period) as u64 % 7;
        fixture = fixture.demand(client, product, period, demand, 12.0 + product as f64);
    }
    for (product, center, client) in itertools::iproduct!(1..=2, 1..=2, 1..=2) {
        if center == 2 && client == 2 {
            continue;
        }
        fixture = fixture.lane(product, center, client, 1.0 + client as f64);
    }
    for (product, supplier, client) in itertools::iproduct!(1..=2, 1..=2, 1..=2) {
        if product == 2 && supplier == 2 {
            continue;
        }
        fixture = fixture.offer(product, supplier, client, 9.0 + supplier as f64);
    }
    for (product, supplier) in itertools::iproduct!(1..=2, 1..=2) {
        fixture = fixture.supplier_cap(product, supplier, 4);
    }
    fixture
}

#[test]
fn solved_plans_keep_every_invariant() {
    let ws = Workspace::new(&network());
    let tol = 0.9;
    let data = PlanningData::load(&ws.data()).unwrap();
    let sets = Sets::new(&data).unwrap();
    let parameters = Parameters::new(&data).unwrap();
    let settings = ws.config("network", tol, 3).settings;

    let (formulation, solution) = AggregatePlanning::solve(
        &sets,
        &parameters,
        &settings,
        &GoodLpSolver::default(),
        None,
    )
    .unwrap();
    assert!(solution.status().has_solution());
    let values = solution.values().unwrap();
    assert!(formulation.model.violations(values, 1e-4).is_empty());

    let result = PlanResult::new(&formulation, &solution);
    let value = |x: Option<f64>| x.unwrap().round() as i64;

    for (&i, &j) in itertools::iproduct!(&sets.P, &sets.J) {
        assert_eq!(value(result.inventory[&(i, j, 0)]), 3);
        for &t in &sets.T {
            let shipped: i64 = sets
                .K
                .iter()
                .map(|&k| value(result.shipment[&(i, j, k, t)]))
                .sum();
            assert_eq!(
                value(result.inventory[&(i, j, t - 1)]) + value(result.production[&(i, j, t)]),
                shipped + value(result.inventory[&(i, j, t)]),
                "inventory balance of {:?}",
                (i, j, t)
            );
        }
    }

    for (&i, &k, &t) in itertools::iproduct!(&sets.P, &sets.K, &sets.T) {
        let demand = parameters.demand(i, k, t).unwrap().quantity as i64;
        let shipped: i64 = sets
            .J
            .iter()
            .map(|&j| value(result.shipment[&(i, j, k, t)]))
            .sum();
        let outsourced: i64 = sets
            .Q
            .iter()
            .map(|&q| value(result.outsource[&(i, q, k, t)]))
            .sum();
        let sent = shipped + outsourced;
        assert!(sent <= demand);
        assert!(sent >= min_delivery(demand as u64, tol) as i64);
    }

    for (&i, &q, &t) in itertools::iproduct!(&sets.P, &sets.Q, &sets.T) {
        let bought: i64 = sets
            .K
            .iter()
            .map(|&k| value(result.outsource[&(i, q, k, t)]))
            .sum();
        assert!(bought <= parameters.max_quantity(i, q).unwrap() as i64);
    }

    // closed lanes and offers stay unused
    for &t in &sets.T {
        for i in 1..=2 {
            assert_eq!(value(result.shipment[&(i, 2, 2, t)]), 0);
            assert_eq!(value(result.outsource[&(2, 2, i, t)]), 0);
        }
    }

    // reading the same solve back a second time gives the same tables
    let tables = project(&result);
    let again = PlanResult::new(&formulation, &solution);
    assert_eq!(again, result);
    assert_eq!(project(&again), tables);
    assert_eq!(tables.len(), 4);
    assert_eq!(
        tables.iter().map(|t| t.rows.len()).collect::<Vec<_>>(),
        vec![
            result.production.len(),
            result.shipment.len(),
            result.outsource.len(),
            result.inventory.len()
        ]
    );
    assert!(tables
        .iter()
        .all(|t| t.rows.iter().all(|(_, amount)| amount.is_some())));
}

// ==========================================
// Invalid planning data
// ==========================================

#[test]
fn duplicate_lanes_fail_the_run() {
    let fixture = single_lane(10.0, 4.0, 12.0, 0.0).lane(1, 1, 1, 3.0);
    let ws = Workspace::new(&fixture);

    match run(&ws.config("duplicate", 1.0, 5)) {
        Err(Error::Data(DataError::DuplicateKey { key, .. })) => assert_eq!(key, "(1, 1, 1)"),
        Err(other) => panic!("expected a duplicate key, got {}", other),
        Ok(_) => panic!("expected a duplicate key"),
    }
}

#[test]
fn missing_table_file_fails_the_run() {
    let ws = Workspace::new(&single_lane(10.0, 4.0, 12.0, 0.0));
    fs::remove_file(ws.data().join("max_suppliers.csv")).unwrap();

    assert!(matches!(
        run(&ws.config("missing", 1.0, 5)),
        Err(Error::Data(DataError::MissingTableFile(_)))
    ));
    // nothing is written before the data is valid
    assert!(!ws.report_dir().exists());
}

#[test]
fn demand_table_without_rows_is_a_configuration_error() {
    let ws = Workspace::new(&single_lane(10.0, 4.0, 12.0, 0.0));
    let header = Table::Demand
        .columns()
        .iter()
        .map(|(raw, _)| *raw)
        .collect::<Vec<_>>()
        .join(",");
    fs::write(ws.data().join("demand.csv"), header + "\n").unwrap();

    assert!(matches!(
        run(&ws.config("empty", 1.0, 5)),
        Err(Error::Config(ConfigError::EmptyTable(Table::Demand)))
    ));
    assert!(!ws.report_dir().exists());
}
