use std::fmt;

use serde::Serialize;

use crate::models::Transaction;
use crate::normalizer::NormalizedRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    #[serde(rename = "Food & Dining")]
    FoodDining,
    Shopping,
    Rent,
    #[serde(rename = "Fuel & Transport")]
    FuelTransport,
    #[serde(rename = "Mobile & Internet")]
    MobileInternet,
    Utilities,
    Salary,
    #[serde(rename = "Loans & EMI")]
    LoansEmi,
    #[serde(rename = "Health & Medical")]
    HealthMedical,
    Education,
    #[serde(rename = "Entertainment & Subscriptions")]
    EntertainmentSubscriptions,
    Others,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Self::FoodDining,
        Self::Shopping,
        Self::Rent,
        Self::FuelTransport,
        Self::MobileInternet,
        Self::Utilities,
        Self::Salary,
        Self::LoansEmi,
        Self::HealthMedical,
        Self::Education,
        Self::EntertainmentSubscriptions,
        Self::Others,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::FoodDining => "Food & Dining",
            Self::Shopping => "Shopping",
            Self::Rent => "Rent",
            Self::FuelTransport => "Fuel & Transport",
            Self::MobileInternet => "Mobile & Internet",
            Self::Utilities => "Utilities",
            Self::Salary => "Salary",
            Self::LoansEmi => "Loans & EMI",
            Self::HealthMedical => "Health & Medical",
            Self::Education => "Education",
            Self::EntertainmentSubscriptions => "Entertainment & Subscriptions",
            Self::Others => "Others",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Keyword groups in priority order; the first group with a matching
/// keyword wins. Keywords are lowercase and matched as substrings, so the
/// trailing spaces in "vi ", "sal " and "prime " are significant.
pub const RULES: &[(Category, &[&str])] = &[
    (Category::FoodDining, &["swiggy", "zomato", "restaurant", "food", "dining"]),
    (Category::Shopping, &["amazon", "flipkart", "myntra", "ajio", "meesho"]),
    (Category::Rent, &["rent"]),
    (
        Category::FuelTransport,
        &["petrol", "fuel", "shell", "hpcl", "bpcl", "indianoil"],
    ),
    (
        Category::MobileInternet,
        &["recharge", "jio", "airtel", "vi ", "vodafone", "bsnl"],
    ),
    (
        Category::Utilities,
        &["electricity", "eb", "tneb", "gas bill", "power bill"],
    ),
    (Category::Salary, &["salary", "payroll", "salary credit", "sal "]),
    (Category::LoansEmi, &["emi", "loan", "repayment"]),
    (
        Category::HealthMedical,
        &["hospital", "pharmacy", "medical", "clinic"],
    ),
    (Category::Education, &["school", "college", "fees", "tuition"]),
    (
        Category::EntertainmentSubscriptions,
        &["netflix", "hotstar", "prime video", "prime ", "spotify", "wynk"],
    ),
];

fn matches_group(description: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| description.contains(k))
}

/// Assign a description to exactly one category. Never fails; unmatched
/// text falls through to `Others`.
pub fn categorize(description: &str) -> Category {
    let desc_lower = description.to_lowercase();
    RULES
        .iter()
        .find(|(_, keywords)| matches_group(&desc_lower, keywords))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Others)
}

/// Attach a category to every cleaned row.
pub fn classify(rows: Vec<NormalizedRow>) -> Vec<Transaction> {
    rows.into_iter()
        .map(|row| Transaction {
            category: categorize(&row.description),
            date: row.date,
            description: row.description,
            amount: row.amount,
            signed_amount: row.signed_amount,
        })
        .collect()
}
