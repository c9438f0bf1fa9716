//! Reads the raw tables of the planning data, either from a workbook or from a directory of csv files.

use std::{collections::HashMap, path::Path};

use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use log::{debug, trace};

use super::{schema::Table, DataError, Record};

/// Read every table from a workbook (`.xlsx`, `.xlsm`, `.xls` or `.ods`) with one sheet per table.
pub fn read_workbook(path: &Path) -> Result<HashMap<Table, Vec<Record>>, DataError> {
    let mut workbook = open_workbook_auto(path)?;
    let sheets = workbook.sheet_names().to_vec();

    let mut tables = HashMap::new();
    for table in Table::ALL {
        let sheet = table.sheet_name();
        if !sheets.iter().any(|s| s == sheet) {
            return Err(DataError::MissingSheet(sheet.to_string()));
        }

        let range = workbook.worksheet_range(sheet)?;
        let mut rows = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());
        let headers = rows.next().unwrap_or_default();

        debug!("Reading sheet '{}' as table {}", sheet, table);
        tables.insert(table, records(table, &headers, rows)?);
    }

    Ok(tables)
}

/// Read every table from a directory holding one csv file per table, named after [`Table::file_name`].
pub fn read_csv_dir(dir: &Path) -> Result<HashMap<Table, Vec<Record>>, DataError> {
    let mut tables = HashMap::new();
    for table in Table::ALL {
        let path = dir.join(table.file_name());
        if !path.is_file() {
            return Err(DataError::MissingTableFile(path));
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&path)?;
        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(|v| v.to_string()).collect::<Vec<_>>());
        }

        debug!("Reading {} as table {}", path.display(), table);
        tables.insert(table, records(table, &headers, rows.into_iter())?);
    }

    Ok(tables)
}

/// Remap the raw `headers` of `table` to canonical field names and collect the non-blank rows.
fn records(
    table: Table,
    headers: &[String],
    rows: impl Iterator<Item = Vec<String>>,
) -> Result<Vec<Record>, DataError> {
    let fields = headers
        .iter()
        .map(|header| table.field(header))
        .collect::<Vec<_>>();

    for (raw, field) in table.columns() {
        if !fields.contains(&Some(*field)) {
            return Err(DataError::MissingColumn {
                table,
                column: raw.trim().to_string(),
            });
        }
    }

    let mut out = Vec::new();
    for (i, row) in rows.enumerate() {
        if row.iter().all(|value| value.trim().is_empty()) {
            continue;
        }

        let values = fields
            .iter()
            .zip(row)
            .filter_map(|(field, value)| field.map(|f| (f, value.trim().to_string())))
            .collect();

        // Data rows start right below the header, i.e. on the second row of the sheet
        out.push(Record::new(table, i + 2, values));
    }

    trace!("{} rows in table {}", out.len(), table);
    Ok(out)
}
