/// A point-in-time view of one transfer, handed to progress observers
/// after every chunk. Purely observational; has no protocol effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub transferred_bytes: u64,
    pub total_bytes: u64,
}

impl TransferProgress {
    /// Completion percentage rounded to two decimal places.
    ///
    /// Exactly `100.0` once `transferred_bytes == total_bytes`. A zero-byte
    /// transfer is complete the moment it starts, so it reports `100.0`.
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        let ratio = self.transferred_bytes as f64 / self.total_bytes as f64;
        (ratio * 10_000.0).round() / 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.transferred_bytes == self.total_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_exact_at_completion() {
        let p = TransferProgress {
            transferred_bytes: 40_000,
            total_bytes: 40_000,
        };
        assert_eq!(p.percent(), 100.0);
        assert!(p.is_complete());
    }

    #[test]
    fn percent_rounds_to_two_decimals() {
        let p = TransferProgress {
            transferred_bytes: 1,
            total_bytes: 3,
        };
        assert_eq!(p.percent(), 33.33);

        let p = TransferProgress {
            transferred_bytes: 2,
            total_bytes: 3,
        };
        assert_eq!(p.percent(), 66.67);
    }

    #[test]
    fn zero_byte_transfer_reports_full() {
        let p = TransferProgress {
            transferred_bytes: 0,
            total_bytes: 0,
        };
        assert_eq!(p.percent(), 100.0);
        assert!(p.is_complete());
    }

    #[test]
    fn partial_chunk_percent() {
        let p = TransferProgress {
            transferred_bytes: 16_384,
            total_bytes: 40_000,
        };
        assert_eq!(p.percent(), 40.96);
    }
}
