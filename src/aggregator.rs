use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::classifier::Category;
use crate::error::{CashError, Result};
use crate::models::{MonthlyBucket, Transaction};

pub const DEFAULT_UPI_PATTERN: &str = "UPI";
pub const DEFAULT_EMI_PATTERN: &str = "EMI|LOAN";
const TOP_N: usize = 10;

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub inflow: f64,
    /// Non-negative magnitude.
    pub outflow: f64,
    pub savings: f64,
}

pub fn totals(txns: &[Transaction]) -> Totals {
    let inflow: f64 = txns.iter().filter(|t| t.is_inflow()).map(|t| t.signed_amount).sum();
    let outflow: f64 = txns.iter().filter(|t| t.is_outflow()).map(|t| t.signed_amount).sum();
    Totals {
        inflow,
        outflow: outflow.abs(),
        savings: inflow + outflow,
    }
}

// ---------------------------------------------------------------------------
// Monthly series
// ---------------------------------------------------------------------------

/// One bucket per month that has any inflow or outflow, ascending by
/// `YYYY-MM`. A month with only one side gets an explicit zero on the other.
pub fn monthly_series(txns: &[Transaction]) -> Vec<MonthlyBucket> {
    let mut by_month: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for t in txns {
        if t.is_inflow() {
            by_month.entry(t.month()).or_default().0 += t.signed_amount;
        } else if t.is_outflow() {
            by_month.entry(t.month()).or_default().1 += t.signed_amount;
        }
    }
    by_month
        .into_iter()
        .map(|(month, (inflow, outflow))| {
            let outflow = outflow.abs();
            MonthlyBucket {
                month,
                total_inflow: inflow,
                total_outflow: outflow,
                savings: inflow - outflow,
            }
        })
        .collect()
}

pub fn savings_series(buckets: &[MonthlyBucket]) -> Vec<f64> {
    buckets.iter().map(|b| b.savings).collect()
}

// ---------------------------------------------------------------------------
// Category breakdown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpend {
    pub category: Category,
    pub total: f64,
    pub count: usize,
}

/// Spend per category over debits only, largest first.
pub fn spend_by_category(txns: &[Transaction]) -> Vec<CategorySpend> {
    let mut by_cat: BTreeMap<Category, (f64, usize)> = BTreeMap::new();
    for t in txns.iter().filter(|t| t.is_outflow()) {
        let entry = by_cat.entry(t.category).or_default();
        entry.0 += t.signed_amount;
        entry.1 += 1;
    }
    let mut out: Vec<CategorySpend> = by_cat
        .into_iter()
        .map(|(category, (sum, count))| CategorySpend {
            category,
            total: sum.abs(),
            count,
        })
        .collect();
    out.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.label().cmp(b.category.label()))
    });
    out
}

/// The `n` most recent transactions, newest first.
pub fn recent(txns: &[Transaction], n: usize) -> Vec<&Transaction> {
    let mut sorted: Vec<&Transaction> = txns.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted.truncate(n);
    sorted
}

// ---------------------------------------------------------------------------
// Derived slices (UPI / EMI)
// ---------------------------------------------------------------------------

/// Case-insensitive description patterns for the UPI and EMI views.
#[derive(Debug, Clone)]
pub struct SliceRules {
    upi: Regex,
    emi: Regex,
}

impl SliceRules {
    pub fn new(upi_pattern: &str, emi_pattern: &str) -> Result<Self> {
        Ok(Self {
            upi: compile(upi_pattern)?,
            emi: compile(emi_pattern)?,
        })
    }

    pub fn is_upi(&self, txn: &Transaction) -> bool {
        self.upi.is_match(&txn.description)
    }

    /// EMI rows are debits whose description mentions a loan.
    pub fn is_emi(&self, txn: &Transaction) -> bool {
        txn.is_outflow() && self.emi.is_match(&txn.description)
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| CashError::Settings(format!("invalid pattern {pattern:?}: {e}")))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptionTotal {
    pub description: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    pub month: String,
    pub total: f64,
}

/// Absolute summed signed amount per description, largest first, top 10.
fn top_descriptions(txns: &[&Transaction]) -> Vec<DescriptionTotal> {
    let mut by_desc: BTreeMap<&str, f64> = BTreeMap::new();
    for t in txns {
        *by_desc.entry(t.description.as_str()).or_default() += t.signed_amount;
    }
    let mut out: Vec<DescriptionTotal> = by_desc
        .into_iter()
        .map(|(description, sum)| DescriptionTotal {
            description: description.to_string(),
            total: sum.abs(),
        })
        .collect();
    out.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.description.cmp(&b.description))
    });
    out.truncate(TOP_N);
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpiSummary {
    pub transactions: Vec<Transaction>,
    pub inflow: f64,
    /// Non-negative magnitude.
    pub outflow: f64,
    pub net: f64,
    pub top_counterparties: Vec<DescriptionTotal>,
}

impl UpiSummary {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

pub fn upi_summary(txns: &[Transaction], rules: &SliceRules) -> UpiSummary {
    let slice: Vec<&Transaction> = txns.iter().filter(|t| rules.is_upi(t)).collect();
    let inflow: f64 = slice.iter().filter(|t| t.is_inflow()).map(|t| t.signed_amount).sum();
    let outflow: f64 = slice.iter().filter(|t| t.is_outflow()).map(|t| t.signed_amount).sum();
    UpiSummary {
        top_counterparties: top_descriptions(&slice),
        transactions: slice.into_iter().cloned().collect(),
        inflow,
        outflow: outflow.abs(),
        net: inflow + outflow,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmiSummary {
    pub transactions: Vec<Transaction>,
    /// Non-negative magnitude.
    pub total_outflow: f64,
    pub monthly: Vec<MonthTotal>,
    pub average_monthly: f64,
    pub top_sources: Vec<DescriptionTotal>,
}

impl EmiSummary {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

pub fn emi_summary(txns: &[Transaction], rules: &SliceRules) -> EmiSummary {
    let slice: Vec<&Transaction> = txns.iter().filter(|t| rules.is_emi(t)).collect();
    let total: f64 = slice.iter().map(|t| t.signed_amount).sum();

    let mut by_month: BTreeMap<String, f64> = BTreeMap::new();
    for t in &slice {
        *by_month.entry(t.month()).or_default() += t.signed_amount;
    }
    let monthly: Vec<MonthTotal> = by_month
        .into_iter()
        .map(|(month, sum)| MonthTotal {
            month,
            total: sum.abs(),
        })
        .collect();
    let average_monthly = if monthly.is_empty() {
        0.0
    } else {
        monthly.iter().map(|m| m.total).sum::<f64>() / monthly.len() as f64
    };

    EmiSummary {
        top_sources: top_descriptions(&slice),
        transactions: slice.into_iter().cloned().collect(),
        total_outflow: total.abs(),
        monthly,
        average_monthly,
    }
}
