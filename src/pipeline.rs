//! One run over a statement: resolve the mapping, clean, categorize,
//! aggregate, then forecast. Each stage is a plain function from the
//! previous stage's output; this module only wires them together.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::aggregator::{self, CategorySpend, EmiSummary, Totals, UpiSummary};
use crate::classifier;
use crate::error::Result;
use crate::forecast::{self, ForecastResult};
use crate::ingest;
use crate::mapping::ColumnMapping;
use crate::models::{MonthlyBucket, RawTable, Transaction};
use crate::normalizer::{self, NormalizeStats};
use crate::settings::Settings;

#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub stats: NormalizeStats,
    pub transactions: Vec<Transaction>,
    pub totals: Totals,
    pub monthly: Vec<MonthlyBucket>,
    pub categories: Vec<CategorySpend>,
    pub upi: UpiSummary,
    pub emi: EmiSummary,
    pub forecast: ForecastResult,
}

impl Analysis {
    pub fn recent(&self, n: usize) -> Vec<&Transaction> {
        aggregator::recent(&self.transactions, n)
    }
}

/// Run every stage after ingestion. Fails only on mapping or cleaning
/// errors; an unavailable forecast is part of a successful result.
pub fn analyze(table: &RawTable, mapping: &ColumnMapping, settings: &Settings) -> Result<Analysis> {
    let rules = settings.slice_rules()?;
    let resolved = mapping.resolve(&table.columns)?;
    let normalized = normalizer::normalize(table, &resolved, settings.day_first)?;
    let transactions = classifier::classify(normalized.rows);

    let monthly = aggregator::monthly_series(&transactions);
    let forecast = forecast::forecast_savings(
        &aggregator::savings_series(&monthly),
        &settings.forecast,
    );

    let analysis = Analysis {
        stats: normalized.stats,
        totals: aggregator::totals(&transactions),
        categories: aggregator::spend_by_category(&transactions),
        upi: aggregator::upi_summary(&transactions, &rules),
        emi: aggregator::emi_summary(&transactions, &rules),
        monthly,
        forecast,
        transactions,
    };
    info!(
        transactions = analysis.transactions.len(),
        months = analysis.monthly.len(),
        forecast = analysis.forecast.is_available(),
        "analysis complete"
    );
    Ok(analysis)
}

pub fn load_and_analyze(path: &Path, mapping: &ColumnMapping, settings: &Settings) -> Result<Analysis> {
    let table = ingest::read_statement(path)?;
    analyze(&table, mapping, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Category;
    use crate::error::CashError;
    use crate::mapping::TypeColumn;
    use crate::models::RawCell;
    use crate::normalizer::SignSource;

    fn table(rows: &[(&str, &str, &str, &str)]) -> RawTable {
        RawTable {
            columns: ["Date", "Description", "Amount", "Type"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows: rows
                .iter()
                .map(|(d, desc, a, t)| {
                    vec![
                        RawCell::Text(d.to_string()),
                        RawCell::Text(desc.to_string()),
                        RawCell::Text(a.to_string()),
                        RawCell::Text(t.to_string()),
                    ]
                })
                .collect(),
        }
    }

    fn typed_mapping() -> ColumnMapping {
        ColumnMapping::new("Date", "Description", "Amount").with_type_column(TypeColumn::new("Type"))
    }

    #[test]
    fn test_two_month_statement_end_to_end() {
        let t = table(&[
            ("2024-01-05", "SWIGGY ORDER", "450", "DR"),
            ("2024-01-31", "SALARY CREDIT", "50000", "CR"),
            ("2024-02-10", "UPI/AMAZON/123", "1200", "DR"),
        ]);
        let a = analyze(&t, &typed_mapping(), &Settings::default()).unwrap();

        assert_eq!(a.stats.sign_source, SignSource::TypeColumn);
        let signed: Vec<f64> = a.transactions.iter().map(|t| t.signed_amount).collect();
        assert_eq!(signed, vec![-450.0, 50000.0, -1200.0]);
        let cats: Vec<Category> = a.transactions.iter().map(|t| t.category).collect();
        assert_eq!(cats, vec![Category::FoodDining, Category::Salary, Category::Shopping]);

        assert_eq!(a.monthly.len(), 2);
        assert_eq!(a.monthly[0].month, "2024-01");
        assert_eq!(a.monthly[0].total_inflow, 50000.0);
        assert_eq!(a.monthly[0].total_outflow, 450.0);
        assert_eq!(a.monthly[0].savings, 49550.0);
        assert_eq!(a.monthly[1].month, "2024-02");
        assert_eq!(a.monthly[1].total_inflow, 0.0);
        assert_eq!(a.monthly[1].total_outflow, 1200.0);
        assert_eq!(a.monthly[1].savings, -1200.0);

        assert_eq!(a.totals.savings, 48350.0);
        assert_eq!(a.upi.transactions.len(), 1);
        assert!(a.emi.is_empty());
        assert_eq!(
            a.forecast,
            ForecastResult::InsufficientHistory {
                available: 2,
                required: 3
            }
        );
    }

    #[test]
    fn test_presigned_statement_with_type_column() {
        let t = table(&[
            ("2024-01-05", "SWIGGY ORDER", "-450", "DR"),
            ("2024-01-20", "SALARY CREDIT", "50000", "CR"),
            ("2024-02-10", "UPI/AMAZON/123", "-1200", "DR"),
        ]);
        let a = analyze(&t, &typed_mapping(), &Settings::default()).unwrap();
        let signed: Vec<f64> = a.transactions.iter().map(|t| t.signed_amount).collect();
        assert_eq!(signed, vec![-450.0, 50000.0, -1200.0]);
        let cats: Vec<Category> = a.transactions.iter().map(|t| t.category).collect();
        assert_eq!(cats, vec![Category::FoodDining, Category::Salary, Category::Shopping]);
        let savings: Vec<f64> = a.monthly.iter().map(|b| b.savings).collect();
        assert_eq!(savings, vec![49550.0, -1200.0]);
        assert_eq!(a.monthly[1].total_inflow, 0.0);
    }

    #[test]
    fn test_signed_amounts_ignore_type_column() {
        let t = table(&[
            ("2024-01-05", "SWIGGY ORDER", "-450", "CR"),
            ("2024-01-31", "SALARY CREDIT", "50000", "DR"),
        ]);
        let a = analyze(&t, &typed_mapping(), &Settings::default()).unwrap();
        assert_eq!(a.stats.sign_source, SignSource::AmountSign);
        assert_eq!(a.transactions[0].signed_amount, -450.0);
        assert_eq!(a.transactions[1].signed_amount, 50000.0);
    }

    #[test]
    fn test_constant_savings_still_aggregates() {
        let t = table(&[
            ("2024-01-01", "SALARY", "100", ""),
            ("2024-02-01", "SALARY", "100", ""),
            ("2024-03-01", "SALARY", "100", ""),
            ("2024-04-01", "SALARY", "100", ""),
        ]);
        let mapping = ColumnMapping::new("Date", "Description", "Amount");
        let a = analyze(&t, &mapping, &Settings::default()).unwrap();
        assert!(matches!(a.forecast, ForecastResult::FittingFailed { .. }));
        assert_eq!(a.monthly.len(), 4);
        assert_eq!(a.totals.inflow, 400.0);
    }

    #[test]
    fn test_forecast_with_enough_history() {
        let t = table(&[
            ("2024-01-01", "SALARY", "50000", "CR"),
            ("2024-01-09", "RENT", "15000", "DR"),
            ("2024-02-01", "SALARY", "50000", "CR"),
            ("2024-02-09", "RENT", "22000", "DR"),
            ("2024-03-01", "SALARY", "52000", "CR"),
            ("2024-03-15", "SWIGGY", "4000", "DR"),
            ("2024-04-01", "SALARY", "52000", "CR"),
            ("2024-04-20", "EMI HDFC", "30000", "DR"),
        ]);
        let a = analyze(&t, &typed_mapping(), &Settings::default()).unwrap();
        let ForecastResult::Available(f) = &a.forecast else {
            panic!("expected a forecast, got {:?}", a.forecast);
        };
        assert_eq!(f.points.len(), 3);
        assert_eq!(f.last_observed, 22000.0);
        assert_eq!(a.emi.total_outflow, 30000.0);
    }

    #[test]
    fn test_unknown_column_is_an_error() {
        let t = table(&[("2024-01-01", "X", "1", "")]);
        let mapping = ColumnMapping::new("Txn Date", "Description", "Amount");
        let err = analyze(&t, &mapping, &Settings::default()).unwrap_err();
        assert!(matches!(err, CashError::UnknownColumn(_)));
    }

    #[test]
    fn test_nothing_valid_is_an_error() {
        let t = table(&[("not a date", "X", "1", ""), ("2024-01-01", "Y", "abc", "")]);
        let mapping = ColumnMapping::new("Date", "Description", "Amount");
        let err = analyze(&t, &mapping, &Settings::default()).unwrap_err();
        assert!(matches!(err, CashError::NoValidRows));
    }

    #[test]
    fn test_load_and_analyze_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.csv");
        std::fs::write(
            &path,
            "Date,Description,Amount\n2024-01-05,SWIGGY ORDER,-450\n2024-01-31,SALARY CREDIT,50000\n",
        )
        .unwrap();
        let mapping = ColumnMapping::new("Date", "Description", "Amount");
        let a = load_and_analyze(&path, &mapping, &Settings::default()).unwrap();
        assert_eq!(a.transactions.len(), 2);
        assert_eq!(a.recent(1)[0].description, "SALARY CREDIT");
    }
}
