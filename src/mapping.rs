use serde::{Deserialize, Serialize};

use crate::error::{CashError, Result};
use crate::models::RawTable;

pub const DEFAULT_CREDIT_TOKEN: &str = "CR";
pub const DEFAULT_DEBIT_TOKEN: &str = "DR";

/// Optional Credit/Debit column and the literal values that mark each side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeColumn {
    pub column: String,
    pub credit_token: String,
    pub debit_token: String,
}

impl TypeColumn {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            credit_token: DEFAULT_CREDIT_TOKEN.to_string(),
            debit_token: DEFAULT_DEBIT_TOKEN.to_string(),
        }
    }

    pub fn with_tokens(mut self, credit: impl Into<String>, debit: impl Into<String>) -> Self {
        self.credit_token = credit.into();
        self.debit_token = debit.into();
        self
    }
}

/// The user's choice of which raw columns feed the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub date: String,
    pub description: String,
    pub amount: String,
    pub type_column: Option<TypeColumn>,
}

/// Column indices for a mapping that has been checked against a header row.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMapping {
    pub date: usize,
    pub description: usize,
    pub amount: usize,
    pub type_column: Option<ResolvedTypeColumn>,
}

/// Type column index plus tokens already trimmed and uppercased.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTypeColumn {
    pub index: usize,
    pub credit_token: String,
    pub debit_token: String,
}

impl ColumnMapping {
    pub fn new(
        date: impl Into<String>,
        description: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            description: description.into(),
            amount: amount.into(),
            type_column: None,
        }
    }

    pub fn with_type_column(mut self, type_column: TypeColumn) -> Self {
        self.type_column = Some(type_column);
        self
    }

    pub fn resolve(&self, columns: &[String]) -> Result<ResolvedMapping> {
        let find = |name: &str| {
            columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| CashError::UnknownColumn(name.to_string()))
        };

        let type_column = match &self.type_column {
            Some(tc) => Some(ResolvedTypeColumn {
                index: find(&tc.column)?,
                credit_token: normalize_token(&tc.credit_token),
                debit_token: normalize_token(&tc.debit_token),
            }),
            None => None,
        };

        Ok(ResolvedMapping {
            date: find(&self.date)?,
            description: find(&self.description)?,
            amount: find(&self.amount)?,
            type_column,
        })
    }
}

pub fn normalize_token(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Distinct non-blank values of a candidate type column, in first-seen order.
pub fn sample_type_values(table: &RawTable, column: &str, limit: usize) -> Result<Vec<String>> {
    let idx = table
        .column_index(column)
        .ok_or_else(|| CashError::UnknownColumn(column.to_string()))?;
    let mut values: Vec<String> = Vec::new();
    for row in 0..table.len() {
        if values.len() >= limit {
            break;
        }
        let value = table.cell(row, idx).as_text().trim().to_string();
        if !value.is_empty() && !values.contains(&value) {
            values.push(value);
        }
    }
    Ok(values)
}
