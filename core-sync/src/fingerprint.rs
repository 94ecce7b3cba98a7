//! Payload fingerprinting for the content-hash short-circuit
//!
//! A sync run hashes the raw fetched snapshot before any normalization. If
//! the latest recorded run for the same type carries the same hash, nothing
//! changed at the source and the run can be skipped wholesale.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{Result, SyncError};

/// SHA-256 hex digest of the canonical JSON encoding of `payload`
pub fn payload_fingerprint<T: Serialize>(payload: &[T]) -> Result<String> {
    let encoded =
        serde_json::to_vec(payload).map_err(|e| SyncError::Fingerprint(e.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StockRecord;

    fn stock(id: &str, available: f64) -> StockRecord {
        StockRecord {
            nomenclature_id: id.to_string(),
            available,
            reserved_stock: 0.0,
            reserved_orders: 0.0,
        }
    }

    #[test]
    fn test_same_payload_same_hash() {
        let a = vec![stock("n-1", 5.0), stock("n-2", 7.5)];
        let b = vec![stock("n-1", 5.0), stock("n-2", 7.5)];

        assert_eq!(
            payload_fingerprint(&a).unwrap(),
            payload_fingerprint(&b).unwrap()
        );
    }

    #[test]
    fn test_any_change_changes_hash() {
        let a = vec![stock("n-1", 5.0)];
        let b = vec![stock("n-1", 5.1)];

        assert_ne!(
            payload_fingerprint(&a).unwrap(),
            payload_fingerprint(&b).unwrap()
        );
    }

    #[test]
    fn test_order_is_significant() {
        let a = vec![stock("n-1", 5.0), stock("n-2", 7.5)];
        let b = vec![stock("n-2", 7.5), stock("n-1", 5.0)];

        assert_ne!(
            payload_fingerprint(&a).unwrap(),
            payload_fingerprint(&b).unwrap()
        );
    }

    #[test]
    fn test_empty_payload_hashes() {
        let hash = payload_fingerprint(&Vec::<StockRecord>::new()).unwrap();
        assert_eq!(hash.len(), 64);
    }
}
