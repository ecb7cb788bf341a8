use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{abs_cents, add_cents, total, AmountOverflow, Cents, Transaction};

/// The whole persisted state of the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    #[serde(with = "total")]
    pub balance: Cents,
    #[serde(with = "total")]
    pub monthly_spend: Cents,
    /// Newest first
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSummary {
    #[serde(with = "total")]
    pub balance: Cents,
    #[serde(with = "total")]
    pub monthly_spend: Cents,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    #[serde(with = "total")]
    pub balance: Cents,
    #[serde(with = "total")]
    pub monthly_spend: Cents,
    pub total_transactions: usize,
    #[serde(with = "total")]
    pub total_income: Cents,
    #[serde(with = "total")]
    pub total_expense: Cents,
}

impl LedgerSnapshot {
    pub fn summary(&self) -> BalanceSummary {
        BalanceSummary {
            balance: self.balance,
            monthly_spend: self.monthly_spend,
        }
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.transactions.iter().position(|tx| tx.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Recompute the monthly spend from the full transaction list.
    pub fn refresh_monthly_spend(&mut self, today: NaiveDate) -> Result<(), AmountOverflow> {
        self.monthly_spend = compute_monthly_spend(&self.transactions, today)?;
        Ok(())
    }

    /// Full recompute of every derived figure.
    pub fn recompute(&mut self, today: NaiveDate) -> Result<(), AmountOverflow> {
        self.balance = total_amount(&self.transactions)?;
        self.refresh_monthly_spend(today)
    }

    pub fn stats(&self) -> Result<LedgerStats, AmountOverflow> {
        let (total_income, total_expense) = income_and_expense(&self.transactions)?;
        Ok(LedgerStats {
            balance: self.balance,
            monthly_spend: self.monthly_spend,
            total_transactions: self.transactions.len(),
            total_income,
            total_expense,
        })
    }
}

/// Sum of |amount| over outflows dated in the month/year of `today`.
/// Transactions whose date does not parse contribute nothing.
pub fn compute_monthly_spend(
    transactions: &[Transaction],
    today: NaiveDate,
) -> Result<Cents, AmountOverflow> {
    transactions
        .iter()
        .filter(|tx| tx.is_expense())
        .filter(|tx| {
            tx.parsed_date()
                .is_some_and(|date| date.is_same_month(today))
        })
        .try_fold(0, |spend, tx| add_cents(spend, abs_cents(tx.amount)?))
}

/// Sum of all transaction amounts.
pub fn total_amount(transactions: &[Transaction]) -> Result<Cents, AmountOverflow> {
    transactions
        .iter()
        .try_fold(0, |sum, tx| add_cents(sum, tx.amount))
}

/// Returns (sum of inflows, sum of |outflows|).
pub fn income_and_expense(transactions: &[Transaction]) -> Result<(Cents, Cents), AmountOverflow> {
    transactions
        .iter()
        .try_fold((0, 0), |(income, expense), tx| {
            if tx.amount > 0 {
                Ok((add_cents(income, tx.amount)?, expense))
            } else {
                Ok((income, add_cents(expense, abs_cents(tx.amount)?)?))
            }
        })
}

/// Result of comparing the stored totals with the ones derived from transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub transaction_count: usize,
    #[serde(with = "total")]
    pub stored_balance: Cents,
    #[serde(with = "total")]
    pub derived_balance: Cents,
    #[serde(with = "total")]
    pub stored_monthly_spend: Cents,
    #[serde(with = "total")]
    pub derived_monthly_spend: Cents,
    pub duplicate_ids: Vec<String>,
    pub unparsable_dates: Vec<String>,
    pub issues: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

pub fn build_integrity_report(
    snapshot: &LedgerSnapshot,
    today: NaiveDate,
) -> Result<IntegrityReport, AmountOverflow> {
    let derived_balance = total_amount(&snapshot.transactions)?;
    let derived_monthly_spend = compute_monthly_spend(&snapshot.transactions, today)?;

    let mut seen = HashSet::new();
    let mut duplicate_ids = Vec::new();
    let mut unparsable_dates = Vec::new();
    for tx in &snapshot.transactions {
        if !seen.insert(tx.id.as_str()) && !duplicate_ids.contains(&tx.id) {
            duplicate_ids.push(tx.id.clone());
        }
        if tx.parsed_date().is_none() {
            unparsable_dates.push(tx.id.clone());
        }
    }

    let mut issues = Vec::new();
    if derived_balance != snapshot.balance {
        issues.push(format!(
            "Balance {} does not match transaction total {}",
            super::format_cents(snapshot.balance),
            super::format_cents(derived_balance)
        ));
    }
    if derived_monthly_spend != snapshot.monthly_spend {
        issues.push(format!(
            "Monthly spend {} does not match derived value {}",
            super::format_cents(snapshot.monthly_spend),
            super::format_cents(derived_monthly_spend)
        ));
    }
    if !duplicate_ids.is_empty() {
        issues.push(format!("Duplicate transaction ids: {}", duplicate_ids.join(", ")));
    }
    // Unparsable dates are tolerated by the monthly spend; only reported.

    Ok(IntegrityReport {
        transaction_count: snapshot.transactions.len(),
        stored_balance: snapshot.balance,
        derived_balance,
        stored_monthly_spend: snapshot.monthly_spend,
        derived_monthly_spend,
        duplicate_ids,
        unparsable_dates,
        issues,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewTransaction;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 13).unwrap()
    }

    fn make_tx(id: &str, cents: Cents, date: &str) -> Transaction {
        Transaction::from_input(id.into(), cents, NewTransaction::new(0.0, date))
    }

    #[test]
    fn test_monthly_spend_current_month_outflows_only() {
        let transactions = vec![
            make_tx("a", -4000, "13.11.2025 09:00"),
            make_tx("b", -1050, "01.11.2025 18:30"),
            make_tx("c", 10000, "02.11.2025 10:00"),
            make_tx("d", -2000, "30.10.2025 10:00"),
            make_tx("e", -2000, "13.11.2024 10:00"),
        ];

        assert_eq!(compute_monthly_spend(&transactions, today()), Ok(5050));
    }

    #[test]
    fn test_monthly_spend_skips_malformed_dates() {
        let transactions = vec![
            make_tx("a", -4000, "2025-11-13 09:00"),
            make_tx("b", -1000, "13.11.2025 09:00"),
            make_tx("c", -999, ""),
        ];

        assert_eq!(compute_monthly_spend(&transactions, today()), Ok(1000));
    }

    #[test]
    fn test_monthly_spend_idempotent() {
        let mut snapshot = LedgerSnapshot {
            transactions: vec![
                make_tx("a", -4000, "13.11.2025 09:00"),
                make_tx("b", -1, "13.11.2025 09:00"),
            ],
            ..LedgerSnapshot::default()
        };

        snapshot.refresh_monthly_spend(today()).unwrap();
        let first = snapshot.monthly_spend;
        snapshot.refresh_monthly_spend(today()).unwrap();

        assert_eq!(first, 4001);
        assert_eq!(snapshot.monthly_spend, first);
    }

    #[test]
    fn test_stats() {
        let snapshot = LedgerSnapshot {
            balance: 4950,
            monthly_spend: 0,
            transactions: vec![
                make_tx("a", 10000, "01.01.2024 10:00"),
                make_tx("b", -4000, "01.01.2024 10:00"),
                make_tx("c", -1050, "01.01.2024 10:00"),
                make_tx("d", 0, "01.01.2024 10:00"),
            ],
        };

        let stats = snapshot.stats().unwrap();
        assert_eq!(stats.total_transactions, 4);
        assert_eq!(stats.total_income, 10000);
        assert_eq!(stats.total_expense, 5050);
        assert_eq!(stats.balance, 4950);
    }

    #[test]
    fn test_recompute_repairs_drift() {
        let mut snapshot = LedgerSnapshot {
            balance: 123,
            monthly_spend: 999,
            transactions: vec![
                make_tx("a", 10000, "13.11.2025 10:00"),
                make_tx("b", -4000, "13.11.2025 10:00"),
            ],
        };

        snapshot.recompute(today()).unwrap();

        assert_eq!(snapshot.balance, 6000);
        assert_eq!(snapshot.monthly_spend, 4000);
    }

    #[test]
    fn test_integrity_report_healthy() {
        let mut snapshot = LedgerSnapshot {
            transactions: vec![make_tx("a", -4000, "13.11.2025 10:00")],
            ..LedgerSnapshot::default()
        };
        snapshot.recompute(today()).unwrap();

        let report = build_integrity_report(&snapshot, today()).unwrap();
        assert!(report.is_healthy(), "issues: {:?}", report.issues);
    }

    #[test]
    fn test_integrity_report_detects_problems() {
        let snapshot = LedgerSnapshot {
            balance: 100,
            monthly_spend: 0,
            transactions: vec![
                make_tx("a", -4000, "13.11.2025 10:00"),
                make_tx("a", 500, "garbage"),
            ],
        };

        let report = build_integrity_report(&snapshot, today()).unwrap();
        assert!(!report.is_healthy());
        assert_eq!(report.derived_balance, -3500);
        assert_eq!(report.derived_monthly_spend, 4000);
        assert_eq!(report.duplicate_ids, vec!["a".to_string()]);
        assert_eq!(report.unparsable_dates, vec!["a".to_string()]);
        assert_eq!(report.issues.len(), 3);
    }

    #[test]
    fn test_snapshot_json_layout() {
        let json = r#"{
            "balance": 60,
            "monthlySpend": 40,
            "transactions": [
                {"id": "tx_1", "amount": -40, "date": "13.11.2025 09:00",
                 "description": "Expense", "details": "", "category": "expense",
                 "accountId": "acc_chk", "type": "payment"}
            ]
        }"#;

        let snapshot: LedgerSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.balance, 6000);
        assert_eq!(snapshot.monthly_spend, 4000);
        assert_eq!(snapshot.transactions[0].amount, -4000);
        assert_eq!(snapshot.transactions[0].account_id, "acc_chk");
    }

    #[test]
    fn test_sums_fail_instead_of_overflowing() {
        let transactions = vec![
            make_tx("a", Cents::MIN, "13.11.2025 10:00"),
            make_tx("b", -1, "13.11.2025 10:00"),
        ];

        assert_eq!(total_amount(&transactions), Err(AmountOverflow));
        assert_eq!(compute_monthly_spend(&transactions, today()), Err(AmountOverflow));
        assert_eq!(income_and_expense(&transactions), Err(AmountOverflow));
    }

    #[test]
    fn test_snapshot_rejects_out_of_range_amount() {
        let json = r#"{"balance": 0, "monthlySpend": 0, "transactions": [
            {"id": "tx_1", "amount": -1e300, "date": "13.11.2025 09:00"}
        ]}"#;

        assert!(serde_json::from_str::<LedgerSnapshot>(json).is_err());
    }
}
