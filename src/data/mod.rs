//! Planning data: the five input tables, parsed into typed rows.

pub mod reader;
pub mod schema;

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use derive_more::{Display, From};
use log::info;

use self::schema::Table;

/// Index of a product, center, client, supplier or period. Indices are 1-based.
pub type Index = usize;
/// The type used for quantities of product
pub type Quantity = u64;
/// The type used for costs and prices
pub type Cost = f64;

#[derive(Debug, Display, From)]
pub enum DataError {
    #[display(fmt = "could not read workbook: {}", _0)]
    Workbook(calamine::Error),
    #[display(fmt = "could not read csv: {}", _0)]
    Csv(csv::Error),
    #[display(fmt = "unsupported planning data format: {}", "_0.display()")]
    #[from(ignore)]
    UnsupportedFormat(PathBuf),
    #[display(fmt = "workbook has no sheet named '{}'", _0)]
    #[from(ignore)]
    MissingSheet(String),
    #[display(fmt = "missing table file {}", "_0.display()")]
    #[from(ignore)]
    MissingTableFile(PathBuf),
    #[display(fmt = "table {} has no column '{}'", table, column)]
    #[from(ignore)]
    MissingColumn { table: Table, column: String },
    #[display(
        fmt = "table {}, row {}: invalid value '{}' for {}",
        table,
        row,
        value,
        field
    )]
    #[from(ignore)]
    InvalidValue {
        table: Table,
        row: usize,
        field: &'static str,
        value: String,
    },
    #[display(fmt = "table {}, row {}: {} must be at least 1", table, row, field)]
    #[from(ignore)]
    ZeroIndex {
        table: Table,
        row: usize,
        field: &'static str,
    },
    #[display(fmt = "table {} has more than one row for {}", table, key)]
    #[from(ignore)]
    DuplicateKey { table: Table, key: String },
}

impl std::error::Error for DataError {}

/// A row of one of the input tables, keyed by canonical field name
#[derive(Debug, Clone)]
pub struct Record {
    table: Table,
    row: usize,
    values: HashMap<&'static str, String>,
}

impl Record {
    pub fn new(table: Table, row: usize, values: HashMap<&'static str, String>) -> Record {
        Record { table, row, values }
    }

    /// The row of the record in its sheet/file, counting the header as row 1
    pub fn row(&self) -> usize {
        self.row
    }

    fn raw(&self, field: &'static str) -> Result<&str, DataError> {
        self.values
            .get(field)
            .map(|v| v.as_str())
            .ok_or_else(|| DataError::MissingColumn {
                table: self.table,
                column: self.table.header(field).unwrap_or(field).to_string(),
            })
    }

    fn invalid(&self, field: &'static str, value: &str) -> DataError {
        DataError::InvalidValue {
            table: self.table,
            row: self.row,
            field,
            value: value.to_string(),
        }
    }

    /// A non-negative integer. Spreadsheets often store integers as floats, so `10.0` is accepted.
    pub fn quantity(&self, field: &'static str) -> Result<Quantity, DataError> {
        let value = self.raw(field)?;
        if let Ok(x) = value.parse::<Quantity>() {
            return Ok(x);
        }

        match value.parse::<f64>() {
            Ok(x) if x.is_finite() && x >= 0.0 && x.fract() == 0.0 => Ok(x as Quantity),
            _ => Err(self.invalid(field, value)),
        }
    }

    /// A 1-based index
    pub fn index(&self, field: &'static str) -> Result<Index, DataError> {
        match self.quantity(field)? {
            0 => Err(DataError::ZeroIndex {
                table: self.table,
                row: self.row,
                field,
            }),
            x => Ok(x as Index),
        }
    }

    pub fn cost(&self, field: &'static str) -> Result<Cost, DataError> {
        let value = self.raw(field)?;
        match value.parse::<Cost>() {
            Ok(x) if x.is_finite() => Ok(x),
            _ => Err(self.invalid(field, value)),
        }
    }
}

/// Conversion from a raw record into a typed row
pub trait FromRecord: Sized {
    const TABLE: Table;
    fn from_record(record: &Record) -> Result<Self, DataError>;
}

/// Production and storage capability of a center for a product
#[derive(Debug, Clone, PartialEq)]
pub struct CenterRow {
    pub product_id: Index,
    pub center_id: Index,
    pub production_cost: Cost,
    pub max_production: Quantity,
    pub max_storage: Quantity,
    pub inventory_cost: Cost,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemandRow {
    pub client_id: Index,
    pub product_id: Index,
    pub period: Index,
    pub demand: Quantity,
    pub purchase_price: Cost,
}

/// A lane from a center to a client for a product
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRow {
    pub product_id: Index,
    pub center_id: Index,
    pub client_id: Index,
    pub transportation_cost: Cost,
}

/// The price a supplier charges for delivering a product to a client
#[derive(Debug, Clone, PartialEq)]
pub struct SupplierRow {
    pub product_id: Index,
    pub supplier_id: Index,
    pub client_id: Index,
    pub product_cost: Cost,
}

/// Maximum quantity of a product a supplier can deliver each period, across all clients
#[derive(Debug, Clone, PartialEq)]
pub struct SupplierCapRow {
    pub product_id: Index,
    pub supplier_id: Index,
    pub max_quantity: Quantity,
}

impl FromRecord for CenterRow {
    const TABLE: Table = Table::Centers;

    fn from_record(r: &Record) -> Result<Self, DataError> {
        Ok(CenterRow {
            product_id: r.index("product_id")?,
            center_id: r.index("center_id")?,
            production_cost: r.cost("production_cost")?,
            max_production: r.quantity("max_production")?,
            max_storage: r.quantity("max_storage")?,
            inventory_cost: r.cost("inventory_cost")?,
        })
    }
}

impl FromRecord for DemandRow {
    const TABLE: Table = Table::Demand;

    fn from_record(r: &Record) -> Result<Self, DataError> {
        Ok(DemandRow {
            client_id: r.index("client_id")?,
            product_id: r.index("product_id")?,
            period: r.index("period")?,
            demand: r.quantity("demand")?,
            purchase_price: r.cost("purchase_price")?,
        })
    }
}

impl FromRecord for TransportRow {
    const TABLE: Table = Table::Transport;

    fn from_record(r: &Record) -> Result<Self, DataError> {
        Ok(TransportRow {
            product_id: r.index("product_id")?,
            center_id: r.index("center_id")?,
            client_id: r.index("client_id")?,
            transportation_cost: r.cost("transportation_cost")?,
        })
    }
}

impl FromRecord for SupplierRow {
    const TABLE: Table = Table::Suppliers;

    fn from_record(r: &Record) -> Result<Self, DataError> {
        Ok(SupplierRow {
            product_id: r.index("product_id")?,
            supplier_id: r.index("supplier_id")?,
            client_id: r.index("client_id")?,
            product_cost: r.cost("product_cost")?,
        })
    }
}

impl FromRecord for SupplierCapRow {
    const TABLE: Table = Table::MaxSuppliers;

    fn from_record(r: &Record) -> Result<Self, DataError> {
        Ok(SupplierCapRow {
            product_id: r.index("product_id")?,
            supplier_id: r.index("supplier_id")?,
            max_quantity: r.quantity("max_quantity")?,
        })
    }
}

/// The input tables of an aggregate planning problem
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanningData {
    pub centers: Vec<CenterRow>,
    pub demand: Vec<DemandRow>,
    pub transport: Vec<TransportRow>,
    pub suppliers: Vec<SupplierRow>,
    pub max_suppliers: Vec<SupplierCapRow>,
}

/// Parses the records of `T::TABLE`. A table without records parses to no rows.
fn parse<T: FromRecord>(tables: &HashMap<Table, Vec<Record>>) -> Result<Vec<T>, DataError> {
    match tables.get(&T::TABLE) {
        Some(records) => records.iter().map(T::from_record).collect(),
        None => Ok(Vec::new()),
    }
}

impl PlanningData {
    /// Load the planning data at `path`, which is either a workbook or a directory of csv files.
    pub fn load(path: &Path) -> Result<PlanningData, DataError> {
        let tables = if path.is_dir() {
            reader::read_csv_dir(path)?
        } else {
            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_lowercase();
            match extension.as_str() {
                "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => reader::read_workbook(path)?,
                _ => return Err(DataError::UnsupportedFormat(path.to_path_buf())),
            }
        };

        let data = PlanningData::from_records(&tables)?;
        info!(
            "Loaded planning data from {}: {} center rows, {} demand rows, {} lanes, {} supplier offers, {} supplier caps",
            path.display(),
            data.centers.len(),
            data.demand.len(),
            data.transport.len(),
            data.suppliers.len(),
            data.max_suppliers.len()
        );

        Ok(data)
    }

    pub fn from_records(tables: &HashMap<Table, Vec<Record>>) -> Result<PlanningData, DataError> {
        Ok(PlanningData {
            centers: parse(tables)?,
            demand: parse(tables)?,
            transport: parse(tables)?,
            suppliers: parse(tables)?,
            max_suppliers: parse(tables)?,
        })
    }
}
