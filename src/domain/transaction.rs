use chrono::{Datelike, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{amount, Cents};

pub type TransactionId = String;

/// Textual layout of `Transaction::date`, e.g. "13.11.2025 09:53".
pub const DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

pub const DEFAULT_ACCOUNT_ID: &str = "acc_chk";

/// One dated, signed entry of the ledger. Positive amounts are inflows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(with = "amount")]
    pub amount: Cents,
    pub date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default, rename = "type")]
    pub tx_type: String,
}

/// Input for recording a transaction. Empty strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct NewTransaction {
    pub id: Option<TransactionId>,
    /// Raw amount, rounded to cents when the transaction is recorded
    pub amount: f64,
    pub date: String,
    pub description: Option<String>,
    pub details: Option<String>,
    pub category: Option<String>,
    pub account_id: Option<String>,
    pub tx_type: Option<String>,
}

impl NewTransaction {
    pub fn new(amount: f64, date: impl Into<String>) -> Self {
        Self {
            amount,
            date: date.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Partial update of a transaction. The id can never be changed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    pub amount: Option<f64>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub details: Option<String>,
    pub category: Option<String>,
    pub account_id: Option<String>,
    #[serde(rename = "type")]
    pub tx_type: Option<String>,
}

impl TransactionUpdate {
    pub fn amount(amount: f64) -> Self {
        Self {
            amount: Some(amount),
            ..Self::default()
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl Transaction {
    /// Build a transaction from input, filling every absent field with its default.
    /// `amount` must already be rounded to cents.
    pub fn from_input(id: TransactionId, amount: Cents, input: NewTransaction) -> Self {
        let inflow = amount > 0;
        Self {
            id,
            amount,
            date: input.date,
            description: input.description.unwrap_or_default(),
            details: present(input.details).unwrap_or_default(),
            category: present(input.category)
                .unwrap_or_else(|| default_category(inflow).to_string()),
            account_id: present(input.account_id)
                .unwrap_or_else(|| DEFAULT_ACCOUNT_ID.to_string()),
            tx_type: present(input.tx_type).unwrap_or_else(|| default_type(inflow).to_string()),
        }
    }

    /// Apply the present fields of `update`. `amount` must already be rounded.
    pub fn apply(&mut self, amount: Option<Cents>, update: TransactionUpdate) {
        if let Some(amount) = amount {
            self.amount = amount;
        }
        if let Some(date) = update.date {
            self.date = date;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(details) = update.details {
            self.details = details;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(account_id) = update.account_id {
            self.account_id = account_id;
        }
        if let Some(tx_type) = update.tx_type {
            self.tx_type = tx_type;
        }
    }

    pub fn is_expense(&self) -> bool {
        self.amount < 0
    }

    /// Calendar date of the transaction, or None if `date` is malformed.
    pub fn parsed_date(&self) -> Option<TransactionDate> {
        TransactionDate::parse(&self.date)
    }
}

pub fn default_category(inflow: bool) -> &'static str {
    if inflow { "income" } else { "expense" }
}

pub fn default_type(inflow: bool) -> &'static str {
    if inflow { "deposit" } else { "payment" }
}

/// Generate a transaction id: time-based prefix plus a random suffix.
pub fn generate_transaction_id() -> TransactionId {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("tx_{}_{}", Utc::now().timestamp_millis(), &suffix[..9])
}

/// Current local time in the `DD.MM.YYYY HH:MM` layout.
pub fn format_now() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

/// Day/month/year parsed out of a `DD.MM.YYYY HH:MM` string.
/// The values are taken as written, without calendar validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionDate {
    pub day: u32,
    pub month: u32,
    pub year: i32,
}

impl TransactionDate {
    /// Only the text before the first space matters, and it must have
    /// exactly three dot-separated segments, each starting with an integer.
    pub fn parse(input: &str) -> Option<Self> {
        let date_part = input.split(' ').next()?;
        let mut segments = date_part.split('.');
        let (day, month, year) = (segments.next()?, segments.next()?, segments.next()?);
        if segments.next().is_some() {
            return None;
        }

        Some(Self {
            day: leading_int(day)?.try_into().ok()?,
            month: leading_int(month)?.try_into().ok()?,
            year: leading_int(year)?.try_into().ok()?,
        })
    }

    pub fn is_same_month(&self, today: NaiveDate) -> bool {
        self.month == today.month() && self.year == today.year()
    }
}

/// Integer at the start of `segment`, ignoring anything after its digits:
/// " 11x" -> 11, "-3" -> -3, "x11" -> None.
fn leading_int(segment: &str) -> Option<i64> {
    let segment = segment.trim_start();
    let (negative, rest) = match segment.as_bytes().first() {
        Some(b'-') => (true, &segment[1..]),
        Some(b'+') => (false, &segment[1..]),
        _ => (false, segment),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let value: i64 = rest[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}
