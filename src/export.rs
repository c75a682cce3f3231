//! Spreadsheet-friendly CSV of the whole ledger.

use super::models::{Transaction, TxType};
use anyhow::Result;
use chrono::NaiveDate;

/// Excel only reads the file as UTF-8 when it starts with a BOM.
const BOM: &str = "\u{feff}";

const HEADER: [&str; 6] = [
    "วันที่",
    "ทรัพย์สิน",
    "ประเภท",
    "หมวดหมู่",
    "รายละเอียด",
    "จำนวนเงิน",
];

pub fn filename(today: NaiveDate) -> String {
    format!("renovatetrack_report_{}.csv", today.format("%Y-%m-%d"))
}

/// Oldest first. Expenses are written as negative amounts so a column sum
/// gives the profit.
pub fn transactions_csv(mut transactions: Vec<Transaction>) -> Result<String> {
    transactions.sort_by(|a, b| {
        a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at))
    });

    let mut writer = csv::Writer::from_writer(BOM.as_bytes().to_vec());
    writer.write_record(HEADER)?;
    for tx in &transactions {
        let amount = match tx.tx_type {
            TxType::Income => tx.amount,
            TxType::Expense => -tx.amount,
        };
        writer.write_record([
            tx.date.to_string(),
            tx.property_name.clone().unwrap_or_default(),
            tx.tx_type.label().to_string(),
            tx.category.clone(),
            tx.description.clone(),
            amount.to_string(),
        ])?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;

    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::fixtures::tx;
    use uuid::Uuid;

    #[test]
    fn test_filename() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(filename(day), "renovatetrack_report_2024-06-01.csv");
    }

    #[test]
    fn test_empty_ledger_is_just_the_header() {
        let csv = transactions_csv(Vec::new()).unwrap();
        assert_eq!(
            csv,
            "\u{feff}วันที่,ทรัพย์สิน,ประเภท,หมวดหมู่,รายละเอียด,จำนวนเงิน\n"
        );
    }

    #[test]
    fn test_rows() {
        let p = Uuid::new_v4();
        let mut late = tx(p, TxType::Expense, 3500.0, "วัสดุ");
        late.date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        late.description = "ค่าปูน, ทราย".into();
        late.property_name = Some("บ้านรามคำแหง".into());
        let mut early = tx(p, TxType::Income, 50000.5, "อื่นๆ");
        early.property_name = Some("บ้านรามคำแหง".into());

        let csv = transactions_csv(vec![late, early]).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "2024-03-01,บ้านรามคำแหง,รายรับ,อื่นๆ,,50000.5");
        // commas inside a field get quoted
        assert_eq!(
            lines[2],
            "2024-03-05,บ้านรามคำแหง,รายจ่าย,วัสดุ,\"ค่าปูน, ทราย\",-3500"
        );
    }
}
