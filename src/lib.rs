//! # Payment Recon
//!
//! A reconciliation engine for payment-gateway CSV exports: collapses
//! duplicate payment attempts into one canonical record per invoice, then
//! aggregates per-day revenue, method distribution, and period-over-period
//! growth for a reporting window.
//!
//! ## Design Principles
//!
//! - **Pure computation**: No clock reads; the reference date is a parameter
//! - **Deterministic output**: Every collection carries a defined order, so
//!   identical input yields byte-identical reports
//! - **Integer money**: Amounts stay `i64`; `rust_decimal` only for ratios
//! - **Lenient ingest, strict reconciliation**: Malformed rows are logged
//!   and skipped, but a record with no correlation key fails the run
//!
//! ## Example
//!
//! ```no_run
//! use payment_recon::{ReconEngine, ReportWindow};
//! use chrono::NaiveDate;
//! use std::io::Cursor;
//!
//! let csv = "id,invoice_id,amount,status,method,created_at,updated_at\n\
//!            pay_1,INV-1,50000,PAID,QRIS,2024-01-09T10:30:00,\n";
//! let mut engine = ReconEngine::new(ReportWindow::LastDays(30));
//! engine.ingest_csv(Cursor::new(csv)).unwrap();
//!
//! let as_of = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
//! let report = engine.reconcile(as_of, None).unwrap();
//! report.write_summary_csv(std::io::stdout()).unwrap();
//! ```

pub mod dedup;
pub mod engine;
pub mod error;
pub mod report;
pub mod transaction;
pub mod window;

pub use dedup::canonicalize;
pub use engine::ReconEngine;
pub use error::{ReconError, Result};
pub use report::{MethodCount, ReconReport, RevenueBucket, RevenueSummary};
pub use transaction::{Payment, PaymentStatus, TransactionRecord};
pub use window::{DateRange, ReportWindow};
