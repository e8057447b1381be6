//! Transfer bookkeeping owned by a single download

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Progress of one download.
///
/// Owned by the transfer manager while bytes are flowing and handed back
/// to the caller when the transfer ends. `written_bytes` never decreases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferState {
    /// Size of the complete resource, when the server announced it
    pub total_bytes: Option<u64>,
    /// Bytes present in the temp file, including a resumed prefix
    pub written_bytes: u64,
    pub temp_path: PathBuf,
    /// Whether the server honoured a range request for this transfer
    pub resumable: bool,
}

impl TransferState {
    #[must_use]
    pub fn new(temp_path: PathBuf) -> Self {
        Self {
            total_bytes: None,
            written_bytes: 0,
            temp_path,
            resumable: false,
        }
    }

    /// Record newly written bytes
    pub fn advance(&mut self, bytes: u64) {
        self.written_bytes = self.written_bytes.saturating_add(bytes);
    }

    /// Whether every announced byte has arrived.
    /// Unknown totals count as complete once the stream ended cleanly.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total_bytes.is_none_or(|total| self.written_bytes >= total)
    }

    /// Fraction in `0.0..=1.0`, if the total is known and non-zero
    #[must_use]
    pub fn fraction(&self) -> Option<f64> {
        match self.total_bytes {
            Some(total) if total > 0 => {
                #[allow(clippy::cast_precision_loss)]
                let fraction = self.written_bytes as f64 / total as f64;
                Some(fraction.min(1.0))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion() {
        let mut state = TransferState::new(PathBuf::from("/tmp/quran.zip.partial"));
        assert!(state.is_complete());

        state.total_bytes = Some(2_453_000);
        state.advance(1_000_000);
        assert!(!state.is_complete());
        assert!((state.fraction().unwrap() - 0.4077).abs() < 0.001);

        state.advance(1_453_000);
        assert!(state.is_complete());
        assert_eq!(state.fraction(), Some(1.0));
    }
}
