//! Income / expense roll-ups over flat transaction lists. Callers pass
//! transactions newest-first; "recent" slices are taken from the front.

use super::{
    config::{DASHBOARD_RECENT_LEN, SUMMARY_RECENT_LEN},
    models::{Property, Transaction, TxType},
};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_income: f64,
    pub total_expense: f64,
    pub profit: f64,
    pub count: usize,
    /// Expense totals only
    pub categories: BTreeMap<String, f64>,
    pub recent: Vec<Transaction>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyReport {
    #[serde(flatten)]
    pub property: Property,
    pub income: f64,
    pub expense: f64,
    pub profit: f64,
    pub tx_count: usize,
    /// Percent, one decimal; zero when nothing was spent
    pub roi: f64,
    pub categories: BTreeMap<String, f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub total_income: f64,
    pub total_expense: f64,
    pub profit: f64,
    pub total_properties: usize,
    pub total_transactions: usize,
    pub properties: Vec<PropertyReport>,
    pub recent_transactions: Vec<Transaction>,
    pub category_totals: BTreeMap<String, f64>,
}

#[derive(Default)]
struct Totals {
    income: f64,
    expense: f64,
    count: usize,
    categories: BTreeMap<String, f64>,
}

impl Totals {
    fn add(&mut self, tx: &Transaction) {
        self.count += 1;
        match tx.tx_type {
            TxType::Income => self.income += tx.amount,
            TxType::Expense => {
                self.expense += tx.amount;
                *self.categories.entry(tx.category.clone()).or_default() +=
                    tx.amount;
            }
        }
    }
}

fn totals<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Totals {
    let mut totals = Totals::default();
    for tx in transactions {
        totals.add(tx);
    }
    totals
}

pub fn roi(profit: f64, expense: f64) -> f64 {
    if expense > 0.0 {
        (profit / expense * 1000.0).round() / 10.0
    } else {
        0.0
    }
}

pub fn summarize(transactions: &[Transaction]) -> Summary {
    let t = totals(transactions);
    Summary {
        total_income: t.income,
        total_expense: t.expense,
        profit: t.income - t.expense,
        count: t.count,
        categories: t.categories,
        recent: transactions
            .iter()
            .take(SUMMARY_RECENT_LEN)
            .cloned()
            .collect(),
    }
}

pub fn report_property(
    property: Property,
    transactions: &[Transaction],
) -> PropertyReport {
    let t = totals(
        transactions
            .iter()
            .filter(|tx| tx.property_id == property.id),
    );
    let profit = t.income - t.expense;
    PropertyReport {
        property,
        income: t.income,
        expense: t.expense,
        profit,
        tx_count: t.count,
        roi: roi(profit, t.expense),
        categories: t.categories,
    }
}

pub fn dashboard(
    properties: Vec<Property>,
    transactions: Vec<Transaction>,
) -> DashboardData {
    let all = totals(&transactions);
    let total_properties = properties.len();
    let reports = properties
        .into_iter()
        .map(|p| report_property(p, &transactions))
        .collect();

    DashboardData {
        total_income: all.income,
        total_expense: all.expense,
        profit: all.income - all.expense,
        total_properties,
        total_transactions: all.count,
        properties: reports,
        recent_transactions: transactions
            .iter()
            .take(DASHBOARD_RECENT_LEN)
            .cloned()
            .collect(),
        category_totals: all.categories,
    }
}

#[cfg(test)]
pub mod fixtures {
    use crate::models::{NewTransaction, Transaction, TxType};
    use chrono::NaiveDate;
    use uuid::Uuid;

    pub fn tx(
        property_id: Uuid,
        tx_type: TxType,
        amount: f64,
        category: &str,
    ) -> Transaction {
        NewTransaction {
            property_id,
            tx_type,
            amount,
            category: category.into(),
            description: String::new(),
            image_url: None,
            recorded_by: "tester".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date"),
        }
        .into_transaction(None)
    }
}
