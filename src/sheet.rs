//! Spreadsheet-row extraction for bulk job import.
//!
//! Uploaded sheets arrive as CSV with `Delivery`, `Payer` and `Amount`
//! columns in any casing. This module turns them into normalized row tuples;
//! the reconciliation engine never sees the file format.

use std::io::Read;

use crate::{Error, job::Payer, reconcile::Delivery};

/// One normalized spreadsheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    /// The delivery location cell.
    pub delivery: String,
    /// The payer cell, as written in the sheet.
    pub payer: String,
    /// The amount cell.
    pub amount: f64,
}

impl From<SheetRow> for Delivery {
    fn from(row: SheetRow) -> Self {
        Delivery {
            location: row.delivery,
            amount: row.amount,
            payer: Payer::normalize(&row.payer),
        }
    }
}

/// Extract job rows from CSV data.
///
/// Column headers are matched case-insensitively. The whole sheet is
/// rejected if a required column is missing or any row leaves one of the
/// required cells empty, so a partial batch can never reach the engine.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingSheetColumn] if a required column is missing or a cell
///   is empty,
/// - or [Error::InvalidSheet] if the data is not readable as CSV or an
///   amount is not a number.
pub fn read_job_rows<R: Read>(reader: R) -> Result<Vec<SheetRow>, Error> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|error| Error::InvalidSheet(error.to_string()))?;

    let delivery_column = find_column(headers, "delivery")
        .ok_or(Error::MissingSheetColumn("Delivery"))?;
    let payer_column = find_column(headers, "payer").ok_or(Error::MissingSheetColumn("Payer"))?;
    let amount_column = find_column(headers, "amount").ok_or(Error::MissingSheetColumn("Amount"))?;

    let mut rows = Vec::new();

    for (row_number, record) in csv_reader.records().enumerate() {
        let record = record.map_err(|error| Error::InvalidSheet(error.to_string()))?;

        let delivery = required_cell(&record, delivery_column, "Delivery")?;
        let payer = required_cell(&record, payer_column, "Payer")?;
        let amount_text = required_cell(&record, amount_column, "Amount")?;

        let amount: f64 = amount_text.parse().map_err(|_| {
            Error::InvalidSheet(format!(
                "row {}: \"{amount_text}\" is not a number",
                row_number + 1
            ))
        })?;

        rows.push(SheetRow {
            delivery,
            payer,
            amount,
        });
    }

    Ok(rows)
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
}

fn required_cell(
    record: &csv::StringRecord,
    column: usize,
    name: &'static str,
) -> Result<String, Error> {
    let cell = record.get(column).unwrap_or_default().trim();

    if cell.is_empty() {
        return Err(Error::MissingSheetColumn(name));
    }

    Ok(cell.to_owned())
}
