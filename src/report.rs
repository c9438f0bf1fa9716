//! Projects solved plans into tables and writes them, with a run summary, to the report directory.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

use derive_more::{Display, From};
use log::{debug, info};
use serde::Serialize;

use crate::data::Index;
use crate::models::{aggregate_planning::ProfitBreakdown, Formulation, PlanResult};
use crate::solver::Status;
use crate::utils::as_integral;

/// File name of the solver log within the report directory
pub const SOLVER_LOG: &str = "solver.log";
/// File name of the run summary within the report directory
pub const SUMMARY: &str = "summary.json";

#[derive(Debug, Display, From)]
pub enum ReportError {
    #[display(fmt = "could not write report: {}", _0)]
    Io(std::io::Error),
    #[display(fmt = "could not write report table: {}", _0)]
    Csv(csv::Error),
    #[display(fmt = "could not write summary: {}", _0)]
    Json(serde_json::Error),
}

impl std::error::Error for ReportError {}

/// Index tuples that can be laid out as table columns
pub trait IndexKey {
    fn indices(&self) -> Vec<Index>;
}

impl IndexKey for (Index, Index, Index) {
    fn indices(&self) -> Vec<Index> {
        vec![self.0, self.1, self.2]
    }
}

impl IndexKey for (Index, Index, Index, Index) {
    fn indices(&self) -> Vec<Index> {
        vec![self.0, self.1, self.2, self.3]
    }
}

/// The solved amounts of one variable family, one row per variable in lexicographic index order
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub name: &'static str,
    /// The index columns, followed by `amount`
    pub columns: Vec<&'static str>,
    pub rows: Vec<(Vec<Index>, Option<f64>)>,
}

impl ResultTable {
    pub fn new<K: IndexKey>(
        name: &'static str,
        index_columns: &[&'static str],
        amounts: &BTreeMap<K, Option<f64>>,
    ) -> ResultTable {
        let mut columns = index_columns.to_vec();
        columns.push("amount");

        ResultTable {
            name,
            columns,
            rows: amounts
                .iter()
                .map(|(key, amount)| (key.indices(), *amount))
                .collect(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name)
    }

    /// Writes the table as csv. Integral amounts are written as integers and missing amounts as empty cells.
    pub fn write(&self, path: &Path) -> Result<(), ReportError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.columns)?;
        for (indices, amount) in &self.rows {
            let mut record = indices.iter().map(|i| i.to_string()).collect::<Vec<_>>();
            record.push(format_amount(*amount));
            writer.write_record(&record)?;
        }
        writer.flush()?;

        debug!("Wrote {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }
}

fn format_amount(amount: Option<f64>) -> String {
    match amount {
        None => String::new(),
        Some(x) => match as_integral(x) {
            Some(int) => int.to_string(),
            None => x.to_string(),
        },
    }
}

/// Index columns of the production and inventory tables
pub const CENTER_COLUMNS: [&str; 3] = ["product_id", "center_id", "period"];
/// Index columns of the shipment table
pub const SHIPMENT_COLUMNS: [&str; 4] = ["product_id", "center_id", "client_id", "period"];
/// Index columns of the outsource table
pub const OUTSOURCE_COLUMNS: [&str; 4] = ["product_id", "supplier_id", "client_id", "period"];

/// One table per variable family of the plan. Index columns carry the field names of the input tables.
pub fn project(result: &PlanResult) -> Vec<ResultTable> {
    vec![
        ResultTable::new("production", &CENTER_COLUMNS, &result.production),
        ResultTable::new("shipment", &SHIPMENT_COLUMNS, &result.shipment),
        ResultTable::new("outsource", &OUTSOURCE_COLUMNS, &result.outsource),
        ResultTable::new("inventory", &CENTER_COLUMNS, &result.inventory),
    ]
}

/// Summary of a run, written as json
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub name: String,
    pub solver: String,
    pub status: Status,
    pub objective: Option<f64>,
    #[serde(flatten)]
    pub breakdown: ProfitBreakdown,
    pub variables: usize,
    pub constraints: usize,
}

impl RunSummary {
    pub fn new(solver: &str, formulation: &Formulation, result: &PlanResult) -> RunSummary {
        RunSummary {
            name: formulation.model.name().to_string(),
            solver: solver.to_string(),
            status: result.status,
            objective: result.objective,
            breakdown: result.breakdown.clone(),
            variables: formulation.model.variables().len(),
            constraints: formulation.model.constraints().len(),
        }
    }
}

/// The report directory of a single run
pub struct Report {
    dir: PathBuf,
}

impl Report {
    /// Creates the directory (and its parents) if it does not exist
    pub fn create(dir: &Path) -> Result<Report, ReportError> {
        fs::create_dir_all(dir)?;
        Ok(Report {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn solver_log(&self) -> PathBuf {
        self.dir.join(SOLVER_LOG)
    }

    pub fn write(&self, tables: &[ResultTable], summary: &RunSummary) -> Result<(), ReportError> {
        for table in tables {
            table.write(&self.dir.join(table.file_name()))?;
        }

        let file = BufWriter::new(File::create(self.dir.join(SUMMARY))?);
        serde_json::to_writer_pretty(file, summary)?;

        info!("Wrote report of {} to {}", summary.name, self.dir.display());
        Ok(())
    }
}
