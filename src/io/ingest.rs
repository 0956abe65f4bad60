//! CSV ingest for historical price/demand observations.
//!
//! Turns a CSV with `Price_<Product>` / `Demand_<Product>` columns into a
//! `DemandTable`.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation**: malformed rows are skipped and reported, never
//!   half-used, so every column keeps the same length
//! - **Separation of concerns**: no fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{info, warn};

use crate::domain::{DemandTable, Observation, Product};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the usable observations plus what was skipped.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub table: DemandTable,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Column positions of every required field.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    price: [usize; Product::COUNT],
    demand: [usize; Product::COUNT],
}

/// Load a demand CSV from disk.
pub fn load_demand_table(path: &Path) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let data = read_demand_table(file)?;
    info!(
        path = %path.display(),
        rows_read = data.rows_read,
        rows_used = data.rows_used,
        "loaded demand data"
    );
    Ok(data)
}

/// Parse demand CSV from any reader.
pub fn read_demand_table<R: Read>(source: R) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let columns = resolve_columns(&build_header_map(&headers))?;

    let mut observations = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Blank lines are skipped by the reader, so prefer its own position.
        let fallback_line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line: e.position().map_or(fallback_line, |p| p.line() as usize),
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };
        let line = record.position().map_or(fallback_line, |p| p.line() as usize);

        if record.len() != headers.len() {
            row_errors.push(RowError {
                line,
                message: format!("expected {} fields, found {}", headers.len(), record.len()),
            });
            continue;
        }

        match parse_row(&record, &columns) {
            Ok(obs) => observations.push(obs),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if !row_errors.is_empty() {
        warn!(skipped = row_errors.len(), "skipped malformed CSV rows");
    }
    if observations.is_empty() {
        return Err(AppError::new(
            3,
            format!("No usable rows in demand CSV ({rows_read} read, {} rejected).", row_errors.len()),
        ));
    }

    let rows_used = observations.len();
    Ok(IngestedData {
        table: DemandTable::new(observations),
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (normalize_header_name(h), i))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn resolve_columns(header_map: &HashMap<String, usize>) -> Result<ColumnIndex, AppError> {
    let mut missing = Vec::new();
    let mut index = ColumnIndex {
        price: [0; Product::COUNT],
        demand: [0; Product::COUNT],
    };

    for product in Product::ALL {
        for (name, slot) in [
            (product.price_column(), &mut index.price[product.index()]),
            (product.demand_column(), &mut index.demand[product.index()]),
        ] {
            match header_map.get(&normalize_header_name(&name)) {
                Some(&i) => *slot = i,
                None => missing.push(name),
            }
        }
    }

    if !missing.is_empty() {
        return Err(AppError::new(
            2,
            format!("Demand CSV is missing required columns: {}", missing.join(", ")),
        ));
    }
    Ok(index)
}

fn parse_row(record: &StringRecord, columns: &ColumnIndex) -> Result<Observation, String> {
    let mut prices = [0.0; Product::COUNT];
    let mut demands = [0.0; Product::COUNT];
    for product in Product::ALL {
        let i = product.index();
        prices[i] = parse_field(record, columns.price[i], &product.price_column())?;
        demands[i] = parse_field(record, columns.demand[i], &product.demand_column())?;
    }
    Ok(Observation { prices, demands })
}

fn parse_field(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    let raw = record.get(idx).unwrap_or("");
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("{name}: '{raw}' is not a number"))?;
    if !value.is_finite() {
        return Err(format!("{name}: '{raw}' is not finite"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Date,Price_Milk,Price_Chocolate,Price_Soup,Price_Ramen,Demand_Milk,Demand_Chocolate,Demand_Soup,Demand_Ramen";

    #[test]
    fn reads_well_formed_rows() {
        let csv = format!(
            "{HEADER}\n2024-01-01,3.0,2.0,1.5,0.9,1000,500,300,700\n2024-01-02, 3.2 ,2.4,1.2,1.1,950,460,330,650\n"
        );
        let data = read_demand_table(csv.as_bytes()).unwrap();
        assert_eq!(data.rows_read, 2);
        assert_eq!(data.rows_used, 2);
        assert!(data.row_errors.is_empty());
        assert_eq!(data.table.price_column(Product::Milk), vec![3.0, 3.2]);
        assert_eq!(data.table.demand_column(Product::Ramen), vec![700.0, 650.0]);
    }

    #[test]
    fn malformed_rows_are_skipped_and_reported() {
        let csv = format!(
            "{HEADER}\n\
             2024-01-01,3.0,2.0,1.5,0.9,1000,500,300,700\n\
             2024-01-02,3.2,2.4,1.2\n\
             2024-01-03,abc,2.4,1.2,1.1,950,460,330,650\n\
             2024-01-04,3.5,1.8,1.4,1.3,900,520,310,600\n"
        );
        let data = read_demand_table(csv.as_bytes()).unwrap();
        assert_eq!(data.rows_read, 4);
        assert_eq!(data.rows_used, 2);
        let lines: Vec<usize> = data.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4]);
        assert!(data.row_errors[1].message.contains("Price_Milk"));
        // Columns stay aligned.
        assert_eq!(data.table.price_column(Product::Soup), vec![1.5, 1.4]);
        assert_eq!(data.table.demand_column(Product::Soup), vec![300.0, 310.0]);
    }

    #[test]
    fn row_errors_report_file_lines_across_blank_lines() {
        let csv = format!(
            "{HEADER}\n\
             2024-01-01,3.0,2.0,1.5,0.9,1000,500,300,700\n\
             \n\
             \n\
             2024-01-03,abc,2.4,1.2,1.1,950,460,330,650\n\
             2024-01-04,3.5,1.8,1.4,1.3,900,520,310,600\n"
        );
        let data = read_demand_table(csv.as_bytes()).unwrap();
        assert_eq!(data.rows_used, 2);
        assert_eq!(data.row_errors.len(), 1);
        assert_eq!(data.row_errors[0].line, 5);
    }

    #[test]
    fn header_matching_is_case_insensitive() {
        let csv = "price_milk,PRICE_CHOCOLATE,Price_Soup,Price_Ramen,demand_milk,Demand_Chocolate,Demand_Soup,Demand_Ramen\n\
                   3,2,1.5,0.9,1000,500,300,700\n";
        let data = read_demand_table(csv.as_bytes()).unwrap();
        assert_eq!(data.rows_used, 1);
    }

    #[test]
    fn missing_columns_are_reported_by_name() {
        let csv = "Price_Milk,Demand_Milk\n3,1000\n";
        let err = read_demand_table(csv.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("Price_Chocolate"));
        assert!(!err.message().contains("Price_Milk"));
    }

    #[test]
    fn file_without_usable_rows_fails() {
        let csv = format!("{HEADER}\n2024-01-01,x,x,x,x,x,x,x,x\n");
        let err = read_demand_table(csv.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
