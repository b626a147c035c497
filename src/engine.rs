//! Core reconciliation engine.
//!
//! Ingests gateway CSV exports, collapses duplicate payment attempts, and
//! aggregates the canonical batch into a revenue report for one reporting
//! window. The engine never consults a clock; the reference date is a
//! parameter, so identical input always yields identical output.

use crate::dedup::canonicalize;
use crate::error::Result;
use crate::report::{aggregate, average_transaction_value, growth_percent, ReconReport};
use crate::transaction::{Payment, TransactionRecord};
use crate::window::ReportWindow;
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use std::io::Read;

/// The payment reconciliation engine.
///
/// Accumulates payment attempts from one or more exports, then reconciles
/// them in a single pass: deduplicate, aggregate, compare against the
/// preceding period when the window implies one.
///
/// # Output Ordering
///
/// Every collection in the resulting report carries a deterministic order:
/// revenue buckets chronologically, method tallies by first appearance, and
/// the transaction listing newest first with record ids breaking ties.
pub struct ReconEngine {
    /// The reporting window requested for this run.
    window: ReportWindow,

    /// Payment attempts in ingestion order.
    payments: Vec<Payment>,
}

impl ReconEngine {
    /// Creates an engine with no ingested payments.
    pub fn new(window: ReportWindow) -> Self {
        ReconEngine {
            window,
            payments: Vec::new(),
        }
    }

    /// Ingests payment attempts from a CSV export.
    ///
    /// Records are read one at a time. Rows that cannot be parsed are
    /// logged at warn level and skipped; a malformed row never aborts the
    /// batch. May be called repeatedly to combine exports.
    pub fn ingest_csv<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        for (row_idx, result) in csv_reader.deserialize::<TransactionRecord>().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            match result {
                Ok(record) => {
                    if let Some(payment) = record.parse() {
                        debug!("Row {}: ingested payment {}", row_num, payment.id);
                        self.payments.push(payment);
                    } else {
                        warn!("Row {}: Failed to parse transaction record", row_num);
                    }
                }
                Err(e) => {
                    warn!("Row {}: CSV parse error: {}", row_num, e);
                }
            }
        }

        Ok(())
    }

    /// Ingests already-parsed payments.
    pub fn ingest<I>(&mut self, payments: I)
    where
        I: IntoIterator<Item = Payment>,
    {
        self.payments.extend(payments);
    }

    /// Reconciles the ingested batch into a report.
    ///
    /// `as_of` anchors relative windows; explicit ranges ignore it. Growth
    /// against the preceding period is computed only for relative windows,
    /// which are the only ones with an implied baseline; a relative window
    /// whose preceding period falls off the calendar is rejected as
    /// oversized. `status_filter` narrows the canonical transaction listing
    /// to one status label (case-insensitive) without touching the revenue
    /// figures.
    pub fn reconcile(
        &self,
        as_of: NaiveDate,
        status_filter: Option<&str>,
    ) -> Result<ReconReport> {
        let range = self.window.resolve(as_of)?;
        let canonical = canonicalize(&self.payments)?;
        debug!(
            "Reconciling {} canonical records ({} ingested) for {} to {}",
            canonical.len(),
            self.payments.len(),
            range.start,
            range.end
        );

        let summary = aggregate(&canonical, &range);
        let growth = if self.window.compares_previous_period() {
            let baseline = aggregate(&canonical, &range.previous()?);
            Some(growth_percent(
                summary.total_revenue,
                baseline.total_revenue,
            ))
        } else {
            None
        };
        let average =
            average_transaction_value(summary.total_revenue, summary.transaction_count);

        let mut listing: Vec<Payment> = match status_filter {
            Some(label) => canonical
                .into_iter()
                .filter(|p| p.status.as_str().eq_ignore_ascii_case(label))
                .collect(),
            None => canonical,
        };
        listing.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(ReconReport {
            start_date: range.start,
            end_date: range.end,
            total_revenue: summary.total_revenue,
            transaction_count: summary.transaction_count,
            average_transaction_value: average,
            growth_percent: growth,
            revenue_by_day: summary.revenue_by_day,
            method_counts: summary.method_counts,
            canonical_transactions: listing,
        })
    }
}
