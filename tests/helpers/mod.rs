// ==========================================
// Planning data fixtures for the integration tests
// ==========================================

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use aggregate_planning::config::{Args, Config};
use aggregate_planning::data::schema::Table;
use clap::Parser;

/// Rows of the five input tables, written as csv files with the workbook headers
#[derive(Default, Clone)]
pub struct FixtureBuilder {
    centers: Vec<String>,
    demand: Vec<String>,
    transport: Vec<String>,
    suppliers: Vec<String>,
    max_suppliers: Vec<String>,
}

impl FixtureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn center(
        mut self,
        product: usize,
        center: usize,
        production_cost: f64,
        max_production: u64,
        max_storage: u64,
        inventory_cost: f64,
    ) -> Self {
        self.centers.push(format!(
            "{},{},{},{},{},{}",
            product, center, production_cost, max_production, max_storage, inventory_cost
        ));
        self
    }

    pub fn demand(
        mut self,
        client: usize,
        product: usize,
        period: usize,
        demand: u64,
        purchase_price: f64,
    ) -> Self {
        self.demand.push(format!(
            "{},{},{},{},{}",
            client, product, period, demand, purchase_price
        ));
        self
    }

    pub fn lane(mut self, product: usize, center: usize, client: usize, cost: f64) -> Self {
        self.transport
            .push(format!("{},{},{},{}", product, center, client, cost));
        self
    }

    pub fn offer(mut self, product: usize, supplier: usize, client: usize, cost: f64) -> Self {
        self.suppliers
            .push(format!("{},{},{},{}", product, supplier, client, cost));
        self
    }

    pub fn supplier_cap(mut self, product: usize, supplier: usize, quantity: u64) -> Self {
        self.max_suppliers
            .push(format!("{},{},{}", product, supplier, quantity));
        self
    }

    fn rows(&self, table: Table) -> &[String] {
        match table {
            Table::Centers => &self.centers,
            Table::Demand => &self.demand,
            Table::Transport => &self.transport,
            Table::Suppliers => &self.suppliers,
            Table::MaxSuppliers => &self.max_suppliers,
        }
    }

    /// Writes one csv file per table into `dir`
    pub fn write(&self, dir: &Path) {
        for table in Table::ALL {
            let header = table
                .columns()
                .iter()
                .map(|(raw, _)| *raw)
                .collect::<Vec<_>>()
                .join(",");
            let mut content = header + "\n";
            for row in self.rows(table) {
                content.push_str(row);
                content.push('\n');
            }
            std::fs::write(dir.join(table.file_name()), content).unwrap();
        }
    }
}

/// One product, center, client and supplier over two periods, demand 10 per period
pub fn single_lane(
    price: f64,
    production_cost: f64,
    transport: f64,
    outsource: f64,
) -> FixtureBuilder {
    FixtureBuilder::new()
        .center(1, 1, production_cost, 100, 100, 0.0)
        .demand(1, 1, 1, 10, price)
        .demand(1, 1, 2, 10, price)
        .lane(1, 1, 1, transport)
        .offer(1, 1, 1, outsource)
        .supplier_cap(1, 1, 100)
}

/// The data directory and report directory of a run
pub struct Workspace {
    pub root: tempfile::TempDir,
}

impl Workspace {
    pub fn new(fixture: &FixtureBuilder) -> Self {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("data")).unwrap();
        fixture.write(&root.path().join("data"));
        Self { root }
    }

    pub fn data(&self) -> PathBuf {
        self.root.path().join("data")
    }

    pub fn report_dir(&self) -> PathBuf {
        self.root.path().join("report")
    }

    /// Parses a command line for this workspace
    pub fn config(&self, name: &str, let_down_tol: f64, init_inventory: u64) -> Config {
        let data = self.data().to_string_lossy().to_string();
        let report = self.report_dir().to_string_lossy().to_string();
        let letdown = let_down_tol.to_string();
        let inventory = init_inventory.to_string();

        let args = Args::try_parse_from([
            "aggregate-planning",
            "-n",
            name,
            "-d",
            &data,
            "-r",
            &report,
            "-l",
            &letdown,
            "-i",
            &inventory,
        ])
        .unwrap();

        Config::try_from(args).unwrap()
    }
}
