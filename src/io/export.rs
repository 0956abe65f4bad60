//! Export demand tables to CSV.
//!
//! The layout matches what `ingest` reads, so generated samples can be fed
//! straight back into training. Values are written at full precision and
//! parse back to the same `f64`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{DemandTable, Product};
use crate::error::AppError;

/// Write a demand table as CSV to a file.
pub fn write_demand_csv(path: &Path, table: &DemandTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;
    write_demand_csv_to(file, table)
}

/// Write a demand table as CSV to any writer.
pub fn write_demand_csv_to<W: Write>(sink: W, table: &DemandTable) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(sink);

    let header: Vec<String> = Product::ALL
        .iter()
        .map(|p| p.price_column())
        .chain(Product::ALL.iter().map(|p| p.demand_column()))
        .collect();
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write CSV header: {e}")))?;

    for o in &table.observations {
        let row: Vec<String> = o
            .prices
            .iter()
            .map(|v| v.to_string())
            .chain(o.demands.iter().map(|v| v.to_string()))
            .collect();
        writer
            .write_record(&row)
            .map_err(|e| AppError::new(2, format!("Failed to write CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SampleConfig, generate_sample};
    use crate::domain::{ModelConfig, Observation};
    use crate::io::ingest::read_demand_table;
    use crate::models::train_demand_models;

    #[test]
    fn exported_csv_reads_back() {
        let table = DemandTable::new(vec![
            Observation {
                prices: [3.0, 2.0, 1.5, 0.9],
                demands: [1000.0, 500.0, 300.0, 700.0],
            },
            Observation {
                prices: [3.25, 2.4, 1.2, 1.1],
                demands: [950.5, 460.0, 330.0, 650.0],
            },
        ]);

        let mut buf = Vec::new();
        write_demand_csv_to(&mut buf, &table).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Price_Milk,Price_Chocolate,Price_Soup,Price_Ramen,Demand_Milk"));

        let back = read_demand_table(text.as_bytes()).unwrap();
        assert_eq!(back.table, table);
    }

    #[test]
    fn noise_free_sample_survives_csv_round_trip() {
        let config = SampleConfig {
            rows: 60,
            noise: 0.0,
            ..SampleConfig::default()
        };
        let table = generate_sample(&config).unwrap();

        let mut buf = Vec::new();
        write_demand_csv_to(&mut buf, &table).unwrap();
        let back = read_demand_table(buf.as_slice()).unwrap();
        assert_eq!(back.table, table);

        let trained = train_demand_models(&back.table, &ModelConfig::default()).unwrap();
        for product in Product::ALL {
            let fitted = trained.registry.get(product).unwrap().as_slice();
            for (b, t) in fitted.iter().zip(config.true_coefficients(product)) {
                assert!((b - t).abs() < 1e-6, "{product}: {b} vs {t}");
            }
        }
    }
}
