//! Revenue aggregation and report rendering.
//!
//! Aggregation walks a canonical batch once, folding successful payments
//! into per-day buckets that are pre-seeded for every calendar day of the
//! reporting window. Rendering never consults a clock, so the same input
//! always produces byte-identical output.

use crate::error::Result;
use crate::transaction::Payment;
use crate::window::DateRange;
use chrono::NaiveDate;
use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

/// Revenue recognized on a single calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevenueBucket {
    /// Calendar day the revenue belongs to.
    pub date: NaiveDate,
    /// Summed amounts of successful payments created on that day.
    pub amount: i64,
}

/// Number of successful payments taken through one payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodCount {
    pub method: String,
    pub count: u64,
}

/// Aggregated revenue figures for one reporting window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevenueSummary {
    /// One bucket per calendar day in the window, in chronological order.
    pub revenue_by_day: Vec<RevenueBucket>,
    /// Method tallies in order of first appearance in the batch.
    pub method_counts: Vec<MethodCount>,
    pub total_revenue: i64,
    pub transaction_count: u64,
}

/// Folds a canonical batch into per-day revenue for `range`.
///
/// Only settled and paid records count as revenue; their amounts are
/// bucketed by creation day. Successful payments created outside the window
/// are dropped from the figures without failing the run. Every day of the
/// window gets a bucket, even when nothing was sold. Amount sums saturate
/// at the i64 extremes instead of overflowing.
pub fn aggregate(canonical: &[Payment], range: &DateRange) -> RevenueSummary {
    let mut revenue_by_day: Vec<RevenueBucket> = range
        .days()
        .map(|date| RevenueBucket { date, amount: 0 })
        .collect();

    // Tallies live in the Vec; the map only locates the slot for a label,
    // so first-appearance order survives into the output.
    let mut method_counts: Vec<MethodCount> = Vec::new();
    let mut method_slots: HashMap<String, usize> = HashMap::new();
    let mut total_revenue: i64 = 0;
    let mut transaction_count: u64 = 0;

    for payment in canonical {
        if !payment.is_successful() {
            continue;
        }

        let day = payment.created_at.date();
        if !range.contains(day) {
            debug!(
                "Payment {} created {} falls outside {} to {}",
                payment.id, day, range.start, range.end
            );
            continue;
        }

        let offset = (day - range.start).num_days() as usize;
        let amount = payment.amount_or_zero();
        let bucket = &mut revenue_by_day[offset];
        bucket.amount = bucket.amount.saturating_add(amount);
        total_revenue = total_revenue.saturating_add(amount);
        transaction_count += 1;

        let label = payment.method_label();
        if let Some(&slot) = method_slots.get(label) {
            method_counts[slot].count += 1;
        } else {
            method_slots.insert(label.to_string(), method_counts.len());
            method_counts.push(MethodCount {
                method: label.to_string(),
                count: 1,
            });
        }
    }

    RevenueSummary {
        revenue_by_day,
        method_counts,
        total_revenue,
        transaction_count,
    }
}

/// Mean revenue per successful payment, rounded half away from zero to two
/// decimal places. An empty window averages to zero rather than failing.
pub fn average_transaction_value(total_revenue: i64, transaction_count: u64) -> Decimal {
    if transaction_count == 0 {
        return Decimal::ZERO;
    }
    let average = Decimal::from(total_revenue) / Decimal::from(transaction_count);
    average.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Growth of `current` over `previous` as a whole percentage, rounded half
/// away from zero. A zero baseline reports 0 instead of dividing by zero.
pub fn growth_percent(current: i64, previous: i64) -> i64 {
    if previous == 0 {
        return 0;
    }
    let delta = Decimal::from(current) - Decimal::from(previous);
    let ratio = delta / Decimal::from(previous) * Decimal::ONE_HUNDRED;
    let rounded = ratio.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    // An out-of-range percentage saturates instead of panicking.
    rounded.to_i64().unwrap_or(if rounded.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// A fully reconciled reporting run, ready for rendering.
///
/// Field order here fixes the JSON key order; all collections carry their
/// own deterministic ordering, so serializing the same report twice yields
/// identical bytes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_revenue: i64,
    pub transaction_count: u64,
    pub average_transaction_value: Decimal,
    /// Whole-percent growth over the preceding window of equal length.
    /// Absent for explicit date ranges, which have no implied baseline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_percent: Option<i64>,
    pub revenue_by_day: Vec<RevenueBucket>,
    pub method_counts: Vec<MethodCount>,
    /// Deduplicated records, newest first, record id breaking ties.
    pub canonical_transactions: Vec<Payment>,
}

impl ReconReport {
    /// Writes the per-day revenue table as CSV.
    pub fn write_summary_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["date", "revenue"])?;
        for bucket in &self.revenue_by_day {
            wtr.write_record([bucket.date.to_string(), bucket.amount.to_string()])?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Writes the canonical transaction listing as CSV. Optional fields
    /// render as empty columns.
    pub fn write_transactions_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["id", "invoice_id", "date", "time", "amount", "status", "method"])?;
        for payment in &self.canonical_transactions {
            wtr.write_record([
                payment.id.clone(),
                payment.invoice_id.clone().unwrap_or_default(),
                payment.created_at.date().to_string(),
                payment.created_at.format("%H:%M:%S").to_string(),
                payment
                    .amount
                    .map(|amount| amount.to_string())
                    .unwrap_or_default(),
                payment.status.to_string(),
                payment.method.clone().unwrap_or_default(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Writes the whole report as pretty-printed JSON with a trailing
    /// newline.
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::PaymentStatus;
    use chrono::NaiveDateTime;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn ts(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn payment(
        id: &str,
        amount: Option<i64>,
        status: PaymentStatus,
        method: Option<&str>,
        created_at: &str,
    ) -> Payment {
        Payment {
            id: id.to_string(),
            invoice_id: Some(format!("INV-{}", id)),
            amount,
            status,
            method: method.map(str::to_string),
            created_at: ts(created_at),
            updated_at: None,
        }
    }

    fn three_day_range() -> DateRange {
        DateRange {
            start: date(2024, 1, 8),
            end: date(2024, 1, 10),
        }
    }

    #[test]
    fn test_aggregate_pre_seeds_every_day() {
        let batch = vec![
            payment("p1", Some(50000), PaymentStatus::Paid, Some("QRIS"), "2024-01-09T10:00:00"),
            payment("p2", Some(99999), PaymentStatus::Failed, Some("CARD"), "2024-01-09T12:00:00"),
        ];

        let summary = aggregate(&batch, &three_day_range());
        let amounts: Vec<i64> = summary.revenue_by_day.iter().map(|b| b.amount).collect();
        assert_eq!(amounts, vec![0, 50000, 0]);
        assert_eq!(summary.revenue_by_day[0].date, date(2024, 1, 8));
        assert_eq!(summary.revenue_by_day[2].date, date(2024, 1, 10));
        assert_eq!(summary.total_revenue, 50000);
        assert_eq!(summary.transaction_count, 1);
    }

    #[test]
    fn test_aggregate_drops_out_of_range_payments() {
        let batch = vec![payment(
            "p1",
            Some(75000),
            PaymentStatus::Settled,
            Some("OVO"),
            "2024-01-07T23:59:59",
        )];

        let summary = aggregate(&batch, &three_day_range());
        assert_eq!(summary.total_revenue, 0);
        assert_eq!(summary.transaction_count, 0);
        assert!(summary.method_counts.is_empty());
    }

    #[test]
    fn test_aggregate_conserves_total_across_buckets() {
        let batch = vec![
            payment("p1", Some(10000), PaymentStatus::Paid, Some("QRIS"), "2024-01-08T08:00:00"),
            payment("p2", Some(20000), PaymentStatus::Settled, Some("OVO"), "2024-01-09T09:00:00"),
            payment("p3", Some(30000), PaymentStatus::Paid, Some("QRIS"), "2024-01-10T10:00:00"),
            payment("p4", Some(40000), PaymentStatus::Pending, Some("CARD"), "2024-01-10T11:00:00"),
        ];

        let summary = aggregate(&batch, &three_day_range());
        let bucket_sum: i64 = summary.revenue_by_day.iter().map(|b| b.amount).sum();
        assert_eq!(bucket_sum, summary.total_revenue);
        assert_eq!(summary.total_revenue, 60000);
        assert_eq!(summary.transaction_count, 3);
    }

    #[test]
    fn test_method_counts_keep_first_appearance_order() {
        let batch = vec![
            payment("p1", Some(1000), PaymentStatus::Paid, Some("QRIS"), "2024-01-08T08:00:00"),
            payment("p2", Some(1000), PaymentStatus::Paid, None, "2024-01-08T09:00:00"),
            payment("p3", Some(1000), PaymentStatus::Paid, Some("OVO"), "2024-01-09T10:00:00"),
            payment("p4", Some(1000), PaymentStatus::Paid, Some("QRIS"), "2024-01-09T11:00:00"),
        ];

        let summary = aggregate(&batch, &three_day_range());
        let tallies: Vec<(&str, u64)> = summary
            .method_counts
            .iter()
            .map(|m| (m.method.as_str(), m.count))
            .collect();
        assert_eq!(tallies, vec![("QRIS", 2), ("Unknown", 1), ("OVO", 1)]);
    }

    #[test]
    fn test_missing_amount_counts_as_zero_revenue() {
        let batch = vec![payment(
            "p1",
            None,
            PaymentStatus::Paid,
            Some("QRIS"),
            "2024-01-09T10:00:00",
        )];

        let summary = aggregate(&batch, &three_day_range());
        assert_eq!(summary.total_revenue, 0);
        // The payment still counts and still tallies its method.
        assert_eq!(summary.transaction_count, 1);
        assert_eq!(summary.method_counts[0].count, 1);
    }

    #[test]
    fn test_aggregate_saturates_on_overflow() {
        let batch = vec![
            payment("p1", Some(i64::MAX), PaymentStatus::Paid, Some("QRIS"), "2024-01-09T10:00:00"),
            payment("p2", Some(1), PaymentStatus::Paid, Some("QRIS"), "2024-01-09T11:00:00"),
        ];

        let summary = aggregate(&batch, &three_day_range());
        assert_eq!(summary.total_revenue, i64::MAX);
        assert_eq!(summary.revenue_by_day[1].amount, i64::MAX);
        assert_eq!(summary.transaction_count, 2);
    }

    #[test]
    fn test_average_rounds_half_away_from_zero() {
        assert_eq!(average_transaction_value(50000, 3).to_string(), "16666.67");
        assert_eq!(average_transaction_value(60000, 2).to_string(), "30000");
        assert_eq!(average_transaction_value(25, 2).to_string(), "12.5");
    }

    #[test]
    fn test_average_of_empty_window_is_zero() {
        assert_eq!(average_transaction_value(0, 0), Decimal::ZERO);
    }

    #[test]
    fn test_growth_percent_basic() {
        assert_eq!(growth_percent(60000, 40000), 50);
        assert_eq!(growth_percent(30000, 40000), -25);
        assert_eq!(growth_percent(40000, 40000), 0);
    }

    #[test]
    fn test_growth_percent_zero_baseline() {
        assert_eq!(growth_percent(10000, 0), 0);
        assert_eq!(growth_percent(0, 0), 0);
    }

    #[test]
    fn test_growth_percent_rounds_half_away_from_zero() {
        assert_eq!(growth_percent(1125, 1000), 13);
        assert_eq!(growth_percent(875, 1000), -13);
        assert_eq!(growth_percent(1124, 1000), 12);
    }

    #[test]
    fn test_growth_percent_saturates_on_overflow() {
        assert_eq!(growth_percent(i64::MAX, 1), i64::MAX);
        assert_eq!(growth_percent(i64::MIN, 1), i64::MIN);
    }

    fn sample_report() -> ReconReport {
        ReconReport {
            start_date: date(2024, 1, 8),
            end_date: date(2024, 1, 9),
            total_revenue: 50000,
            transaction_count: 1,
            average_transaction_value: average_transaction_value(50000, 1),
            growth_percent: None,
            revenue_by_day: vec![
                RevenueBucket {
                    date: date(2024, 1, 8),
                    amount: 0,
                },
                RevenueBucket {
                    date: date(2024, 1, 9),
                    amount: 50000,
                },
            ],
            method_counts: vec![MethodCount {
                method: "QRIS".to_string(),
                count: 1,
            }],
            canonical_transactions: vec![Payment {
                id: "pay_1".to_string(),
                invoice_id: None,
                amount: None,
                status: PaymentStatus::Paid,
                method: None,
                created_at: ts("2024-01-09T10:30:00"),
                updated_at: None,
            }],
        }
    }

    #[test]
    fn test_summary_csv_layout() {
        let mut output = Vec::new();
        sample_report().write_summary_csv(&mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(text, "date,revenue\n2024-01-08,0\n2024-01-09,50000\n");
    }

    #[test]
    fn test_transactions_csv_blanks_optional_columns() {
        let mut output = Vec::new();
        sample_report().write_transactions_csv(&mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(
            text,
            "id,invoice_id,date,time,amount,status,method\n\
             pay_1,,2024-01-09,10:30:00,,PAID,\n"
        );
    }

    #[test]
    fn test_json_omits_growth_when_not_computed() {
        let mut output = Vec::new();
        sample_report().write_json(&mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value.get("growthPercent").is_none());
        assert_eq!(value["totalRevenue"], 50000);
        assert_eq!(value["averageTransactionValue"], "50000");
        assert_eq!(value["revenueByDay"][1]["amount"], 50000);
        assert_eq!(value["methodCounts"][0]["method"], "QRIS");
    }

    #[test]
    fn test_json_includes_growth_when_computed() {
        let mut report = sample_report();
        report.growth_percent = Some(-25);

        let mut output = Vec::new();
        report.write_json(&mut output).unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&output).unwrap();
        assert_eq!(value["growthPercent"], -25);
    }
}
