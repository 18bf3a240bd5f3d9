//! CSV export for period financials, financing ledgers and sensitivity tables.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::finance::cashflow::LedgerEntry;
use crate::finance::sensitivity::SensitivityTable;
use crate::market::portfolio::PeriodFinancials;

/// Column header for the per-period financial table.
const FINANCIALS_HEADER: &[&str] = &["day", "hour", "portfolio_name", "revenue", "cost", "profit"];

/// Column header for a financing ledger.
const LEDGER_HEADER: &[&str] = &["day", "profit", "owed", "payment", "cash_flow"];

/// Writes the per-period financial table as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_financials_csv(rows: &[PeriodFinancials], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(FINANCIALS_HEADER)?;
    for r in rows {
        wtr.write_record(&[
            r.day.to_string(),
            r.hour.to_string(),
            r.portfolio_name.clone(),
            format!("{:.2}", r.revenue),
            format!("{:.2}", r.cost),
            format!("{:.2}", r.profit),
        ])?;
    }
    wtr.flush()
}

/// Writes a financing ledger as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_ledger_csv(ledger: &[LedgerEntry], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(LEDGER_HEADER)?;
    for e in ledger {
        wtr.write_record(&[
            e.day.to_string(),
            format!("{:.2}", e.inflow),
            format!("{:.2}", e.owed_begin_of_day),
            format!("{:.2}", e.payment),
            format!("{:.2}", e.cash_flow),
        ])?;
    }
    wtr.flush()
}

/// Writes the sensitivity table as CSV, one `profit_<offset>` column per offset.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_sensitivity_csv(table: &SensitivityTable, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let mut header = vec!["portfolio_name".to_string()];
    header.extend(table.offsets().iter().map(|o| format!("profit_{o}")));
    wtr.write_record(&header)?;

    for (name, profits) in table.rows() {
        let mut record = vec![name.clone()];
        record.extend(profits.iter().map(|p| format!("{p:.2}")));
        wtr.write_record(&record)?;
    }
    wtr.flush()
}

/// Exports the per-period financial table to `path`.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_financials(rows: &[PeriodFinancials], path: &Path) -> io::Result<()> {
    write_financials_csv(rows, io::BufWriter::new(File::create(path)?))
}

/// Exports a financing ledger to `path`.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_ledger(ledger: &[LedgerEntry], path: &Path) -> io::Result<()> {
    write_ledger_csv(ledger, io::BufWriter::new(File::create(path)?))
}

/// Exports the sensitivity table to `path`.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_sensitivity(table: &SensitivityTable, path: &Path) -> io::Result<()> {
    write_sensitivity_csv(table, io::BufWriter::new(File::create(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::cashflow::{DailyProfit, amortize};
    use crate::finance::sensitivity::sweep;
    use crate::market::demand::{DemandPeriod, DemandSchedule};
    use crate::market::portfolio::PortfolioCosts;
    use crate::market::stack::{SupplyStack, UnitSpec};

    fn make_row(hour: u32) -> PeriodFinancials {
        PeriodFinancials {
            day: 1,
            hour,
            portfolio_name: "Big_Gas".to_string(),
            revenue: 1234.5,
            cost: -2000.0,
            profit: -765.5,
        }
    }

    #[test]
    fn financials_header_and_row_count() {
        let rows: Vec<PeriodFinancials> = (1..=4).map(make_row).collect();
        let mut buf = Vec::new();
        write_financials_csv(&rows, &mut buf).ok();
        let output = String::from_utf8(buf).unwrap_or_default();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "day,hour,portfolio_name,revenue,cost,profit");
        assert_eq!(lines[1], "1,1,Big_Gas,1234.50,-2000.00,-765.50");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn ledger_round_trip_parseable() {
        let series = [
            DailyProfit { day: 1, profit: -9250.0 },
            DailyProfit { day: 2, profit: 300_000.0 },
        ];
        let ledger = amortize(&series, 225_000.0, 0.05).unwrap_or_default();
        let mut buf = Vec::new();
        write_ledger_csv(&ledger, &mut buf).ok();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let headers = rdr.headers().cloned().ok();
        assert_eq!(headers.as_ref().map(csv::StringRecord::len), Some(5));
        let records: Vec<csv::StringRecord> = rdr.records().filter_map(Result::ok).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][2], "236250.00");
        assert_eq!(&records[0][4], "-9250.00");
    }

    #[test]
    fn sensitivity_has_column_per_offset() {
        let stack = SupplyStack::from_units(vec![
            UnitSpec::new("a", "A", 10.0, 5.0),
            UnitSpec::new("b", "B", 10.0, 15.0),
        ])
        .expect("valid stack");
        let schedule =
            DemandSchedule::new(vec![DemandPeriod::new(1, 1, 15.0)]).expect("valid schedule");
        let costs = PortfolioCosts::new().with("A", 0.0, 1.0).with("B", 0.0, 1.0);
        let table = sweep(&stack, &schedule, &costs, &[1.0, 2.5]).expect("sweep");

        let mut buf = Vec::new();
        write_sensitivity_csv(&table, &mut buf).ok();
        let output = String::from_utf8(buf).unwrap_or_default();
        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some("portfolio_name,profit_0,profit_1,profit_2.5")
        );
        // A: 10 MW at (15 - 5) = 100, plus 10 MW * offset
        assert_eq!(lines.next(), Some("A,100.00,110.00,125.00"));
        assert_eq!(lines.next(), Some("B,0.00,5.00,12.50"));
    }

    #[test]
    fn deterministic_output() {
        let rows: Vec<PeriodFinancials> = (1..=3).map(make_row).collect();
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_financials_csv(&rows, &mut buf1).ok();
        write_financials_csv(&rows, &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }
}
