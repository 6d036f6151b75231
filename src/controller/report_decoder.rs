//! Raw report → active button set

use super::catalog::{ButtonSet, LogicalButton};
use tracing::trace;

/// Smallest report that covers every byte the catalog reads
pub const MIN_REPORT_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Report too short: {len} bytes, need at least {min}")]
    ShortReport { len: usize, min: usize },
}

/// Decodes one input report into the set of buttons it marks as active.
///
/// Every catalog button is evaluated independently; opposite D-pad
/// directions can never both be active because one axis byte cannot be
/// below 0x40 and above 0xC0 at the same time.
///
/// # Errors
///
/// [`DecodeError::ShortReport`] if the report has fewer than
/// [`MIN_REPORT_LEN`] bytes. Nothing is decoded in that case.
pub fn decode_report(report: &[u8]) -> Result<ButtonSet, DecodeError> {
    if report.len() < MIN_REPORT_LEN {
        return Err(DecodeError::ShortReport {
            len: report.len(),
            min: MIN_REPORT_LEN,
        });
    }

    let active = LogicalButton::ALL
        .into_iter()
        .filter(|button| button.decode_rule().evaluate(report))
        .collect();

    trace!("Decoded report {:02X?} -> {:?}", report, active);
    Ok(active)
}
