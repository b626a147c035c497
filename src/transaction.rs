//! Transaction models for CSV parsing and internal representation.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Label used for grouping when the gateway reported no payment method.
pub const UNKNOWN_METHOD: &str = "Unknown";

/// Raw transaction record as read from a gateway CSV export.
///
/// Uses string-based parsing for flexibility: real exports carry empty
/// fields for optional columns and timestamps in a handful of near-ISO
/// shapes. Extra columns (booth ids, invoice URLs, ...) are ignored.
#[derive(Debug, Deserialize)]
pub struct TransactionRecord {
    /// Unique identifier of this payment attempt
    pub id: String,

    /// Gateway invoice id shared by attempts for one logical purchase
    #[serde(default)]
    pub invoice_id: Option<String>,

    /// Integer amount in minor-unit-free currency (absent for attempts
    /// that never reached a payable state)
    #[serde(default)]
    pub amount: Option<String>,

    /// Gateway status label: SETTLED, PAID, PENDING, EXPIRED, FAILED
    pub status: String,

    /// Free-text payment method label
    #[serde(default)]
    pub method: Option<String>,

    /// Creation timestamp (required; it is the revenue bucketing key)
    pub created_at: String,

    /// Last-update timestamp (absent for never-updated attempts)
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl TransactionRecord {
    /// Parses the raw CSV record into a typed payment.
    ///
    /// Returns `None` if the record is unusable: unparseable `created_at`
    /// or `updated_at`, or a non-empty amount that is not an integer.
    /// Absent optional fields are normalized to `None`; fallback values are
    /// applied where the fields are consumed, not here.
    pub fn parse(&self) -> Option<Payment> {
        let created_at = parse_timestamp(&self.created_at)?;
        let updated_at = match self.updated_at.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_timestamp(raw)?),
            _ => None,
        };
        let amount = match self.amount.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(raw.parse::<i64>().ok()?),
            _ => None,
        };

        Some(Payment {
            id: self.id.trim().to_string(),
            invoice_id: normalize_optional(self.invoice_id.as_deref()),
            amount,
            status: PaymentStatus::parse(&self.status),
            method: normalize_optional(self.method.as_deref()),
            created_at,
            updated_at,
        })
    }
}

/// Maps empty and whitespace-only strings to `None`.
fn normalize_optional(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses an export timestamp.
///
/// Accepts RFC 3339 (the offset is dropped, keeping the wall-clock reading:
/// exports are already in the platform's reporting timezone), `T`- or
/// space-separated datetimes without an offset, and bare dates, which
/// truncate to midnight.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(ts.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Payment attempt status as reported by the gateway.
///
/// Statuses form a total order used during deduplication to pick the most
/// advanced outcome when attempts for one invoice conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    /// Funds collected and settled to the platform.
    Settled,

    /// Funds collected, settlement pending.
    Paid,

    /// Invoice issued, awaiting the customer.
    Pending,

    /// Invoice lapsed before the customer paid.
    Expired,

    /// Gateway rejected or aborted the attempt.
    Failed,

    /// A label this engine does not recognize, preserved verbatim.
    Other(String),
}

impl PaymentStatus {
    /// Parses a gateway status label, case-insensitively after trimming.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "SETTLED" => PaymentStatus::Settled,
            "PAID" => PaymentStatus::Paid,
            "PENDING" => PaymentStatus::Pending,
            "EXPIRED" => PaymentStatus::Expired,
            "FAILED" => PaymentStatus::Failed,
            _ => PaymentStatus::Other(trimmed.to_string()),
        }
    }

    /// Authority ranking used when collapsing duplicate attempts.
    /// Unrecognized labels rank below everything.
    pub fn priority(&self) -> u8 {
        match self {
            PaymentStatus::Settled => 5,
            PaymentStatus::Paid => 4,
            PaymentStatus::Pending => 3,
            PaymentStatus::Expired => 2,
            PaymentStatus::Failed => 1,
            PaymentStatus::Other(_) => 0,
        }
    }

    /// Whether this status means money was actually collected.
    pub fn is_successful(&self) -> bool {
        matches!(self, PaymentStatus::Settled | PaymentStatus::Paid)
    }

    /// The canonical uppercase label, or the preserved verbatim one.
    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Settled => "SETTLED",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Expired => "EXPIRED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Other(label) => label,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PaymentStatus {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// A parsed and validated payment attempt ready for reconciliation.
///
/// Optional fields stay optional: the record is re-emitted unmodified when
/// it is chosen as canonical, and fallback values (`0` amounts, the
/// `"Unknown"` method label) are applied only where the values are consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Unique identifier of this attempt
    pub id: String,

    /// Gateway invoice id correlating attempts for one purchase, if any
    pub invoice_id: Option<String>,

    /// Integer amount; `None` for attempts that never reached a payable state
    pub amount: Option<i64>,

    /// Gateway status
    pub status: PaymentStatus,

    /// Free-text payment method label, if the gateway reported one
    pub method: Option<String>,

    /// Creation timestamp in the platform's reporting timezone
    pub created_at: NaiveDateTime,

    /// Last-update timestamp, if the gateway posted one
    pub updated_at: Option<NaiveDateTime>,
}

impl Payment {
    /// The key correlating retries of one logical purchase: the gateway
    /// invoice id when present and non-empty, else the record's own id.
    ///
    /// `None` means the record cannot be correlated at all and is invalid
    /// input for reconciliation.
    pub fn correlation_key(&self) -> Option<&str> {
        if let Some(invoice) = self.invoice_id.as_deref() {
            if !invoice.is_empty() {
                return Some(invoice);
            }
        }
        if !self.id.is_empty() {
            return Some(&self.id);
        }
        None
    }

    /// The timestamp that breaks ties between equal-status attempts:
    /// `updated_at` when present, else `created_at`.
    pub fn effective_timestamp(&self) -> NaiveDateTime {
        self.updated_at.unwrap_or(self.created_at)
    }

    /// The amount this record contributes to revenue totals.
    pub fn amount_or_zero(&self) -> i64 {
        self.amount.unwrap_or(0)
    }

    /// The label this record is grouped under in the method distribution.
    pub fn method_label(&self) -> &str {
        self.method.as_deref().unwrap_or(UNKNOWN_METHOD)
    }

    /// Whether this record counts toward revenue.
    pub fn is_successful(&self) -> bool {
        self.status.is_successful()
    }
}
