//! CSV rendering of performance summaries for the reporting collaborator.
//!
//! Every field externalizes as a plain decimal string. Undefined metrics
//! (cost basis per share with zero shares, unsolvable IRR) render as an
//! empty field - the literal string "NaN" must never leak into user-facing
//! output.

use std::io::Write;

use crate::errors::Result;
use crate::performance::performance_model::SecurityPerformance;

const HEADERS: [&str; 11] = [
    "Security",
    "Quantity",
    "Cost Basis",
    "Total Cost Basis",
    "Price",
    "Market Value",
    "Unrealized Gain",
    "Realized Gain",
    "Total Gain",
    "Total Gain %",
    "IRR",
];

/// Writes one CSV row per security, preceded by a header row.
pub fn write_performance_csv<W: Write>(writer: W, rows: &[SecurityPerformance]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADERS)?;

    for row in rows {
        csv_writer.write_record([
            row.security_id.clone(),
            row.shares_held.to_string(),
            row.cost_basis_per_share
                .map(|v| v.to_string())
                .unwrap_or_default(),
            row.total_cost_basis.to_string(),
            row.price.to_string(),
            row.market_value.to_string(),
            row.unrealized_gain.to_string(),
            row.realized_gain.to_string(),
            row.total_gain.to_string(),
            row.total_gain_percentage
                .map(|v| v.to_string())
                .unwrap_or_default(),
            row.irr.map(format_rate).unwrap_or_default(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Renders the summary as an in-memory CSV string.
pub fn performance_csv_string(rows: &[SecurityPerformance]) -> Result<String> {
    let mut buffer = Vec::new();
    write_performance_csv(&mut buffer, rows)?;
    String::from_utf8(buffer).map_err(|e| crate::errors::Error::Export(e.to_string()))
}

/// Plain decimal rendering of a solved rate; never scientific notation.
fn format_rate(rate: f64) -> String {
    format!("{:.6}", rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_row() -> SecurityPerformance {
        SecurityPerformance {
            security_id: "ACME".to_string(),
            account_id: "brokerage".to_string(),
            base_currency: "USD".to_string(),
            shares_held: dec!(100),
            cost_basis_per_share: Some(dec!(10)),
            total_cost_basis: dec!(1000),
            price: dec!(12),
            market_value: dec!(1200),
            unrealized_gain: dec!(200),
            realized_gain: dec!(50),
            total_gain: dec!(250),
            total_gain_percentage: Some(dec!(0.25)),
            irr: Some(0.1),
            short_position: false,
        }
    }

    #[test]
    fn test_csv_renders_plain_decimals() {
        let csv = performance_csv_string(&[sample_row()]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Security,Quantity,Cost Basis,Total Cost Basis,Price,Market Value,Unrealized Gain,Realized Gain,Total Gain,Total Gain %,IRR"
        );
        assert_eq!(
            lines.next().unwrap(),
            "ACME,100,10,1000,12,1200,200,50,250,0.25,0.100000"
        );
    }

    #[test]
    fn test_undefined_metrics_render_empty_not_nan() {
        let mut row = sample_row();
        row.shares_held = dec!(0);
        row.cost_basis_per_share = None;
        row.total_gain_percentage = None;
        row.irr = None;

        let csv = performance_csv_string(&[row]).unwrap();
        let data_line = csv.lines().nth(1).unwrap();
        assert_eq!(data_line, "ACME,0,,1000,12,1200,200,50,250,,");
        assert!(!csv.contains("NaN"));
    }
}
