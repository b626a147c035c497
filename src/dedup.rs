//! Collapsing duplicate payment attempts into canonical records.
//!
//! The gateway posts retries and status updates for one invoice as separate
//! rows; reconciliation keeps exactly one authoritative record per invoice,
//! chosen by status priority and, on ties, recency.

use crate::error::{ReconError, Result};
use crate::transaction::Payment;
use log::debug;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Collapses duplicate attempts, keeping one canonical record per
/// correlation key.
///
/// Records are processed in input order. A later record supersedes the
/// current choice for its key only if its status ranks strictly higher, or
/// ranks equal with a strictly later effective timestamp; on a full tie the
/// earlier-processed record stays.
///
/// Output order is the first-occurrence order of correlation keys, so the
/// result is deterministic for a given input order.
///
/// # Errors
///
/// Fails with [`ReconError::MissingCorrelationKey`] on the first record that
/// has neither an invoice id nor a record id; no partial output is produced.
pub fn canonicalize(payments: &[Payment]) -> Result<Vec<Payment>> {
    // Winning input index per key, in first-occurrence order. The map only
    // locates the slot; its iteration order never reaches the output.
    let mut winners: Vec<usize> = Vec::new();
    let mut slot_by_key: HashMap<&str, usize> = HashMap::new();

    for (index, payment) in payments.iter().enumerate() {
        let key = payment
            .correlation_key()
            .ok_or(ReconError::MissingCorrelationKey { index })?;

        match slot_by_key.entry(key) {
            Entry::Vacant(vacant) => {
                vacant.insert(winners.len());
                winners.push(index);
            }
            Entry::Occupied(occupied) => {
                let slot = &mut winners[*occupied.get()];
                if supersedes(payment, &payments[*slot]) {
                    debug!(
                        "Record {} supersedes record {} for key {} ({} -> {})",
                        index, *slot, key, payments[*slot].status, payment.status
                    );
                    *slot = index;
                }
            }
        }
    }

    Ok(winners
        .into_iter()
        .map(|index| payments[index].clone())
        .collect())
}

/// Whether `candidate` should replace `incumbent` as the canonical record
/// for their shared correlation key.
fn supersedes(candidate: &Payment, incumbent: &Payment) -> bool {
    let candidate_priority = candidate.status.priority();
    let incumbent_priority = incumbent.status.priority();

    if candidate_priority != incumbent_priority {
        return candidate_priority > incumbent_priority;
    }
    candidate.effective_timestamp() > incumbent.effective_timestamp()
}
