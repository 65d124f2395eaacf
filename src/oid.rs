use std::fmt;

use libipld::cid::Cid;
use libipld::multihash::{Code, MultihashDigest};

// multicodec for raw bytes
const RAW_CODEC: u64 = 0x55;

/// `Oid` is the content-addressed identifier of an encoded model: a CIDv1
/// over the raw codec with a SHA2-256 digest, rendered base58btc.
///
/// Identifiers are computed over the URL base64 payload, so equal payloads
/// always share an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Oid {
    cid: Cid,
}

impl Oid {
    pub fn new(bytes: &[u8]) -> Self {
        let hash = MultihashDigest::digest(&Code::Sha2_256, bytes);
        Self {
            cid: Cid::new_v1(RAW_CODEC, hash),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.cid.to_bytes()
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = self
            .cid
            .to_string_of_base(multibase::Base::Base58Btc)
            .map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::DINING_PHILOSOPHERS;

    #[test]
    fn test_oid_is_deterministic() {
        let a = Oid::new(DINING_PHILOSOPHERS.as_bytes());
        let b = Oid::new(DINING_PHILOSOPHERS.as_bytes());
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_oid_distinguishes_payloads() {
        let a = Oid::new(b"payload-a");
        let b = Oid::new(b"payload-b");
        assert_ne!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_oid_rendering() {
        let oid = Oid::new(DINING_PHILOSOPHERS.as_bytes());
        let rendered = oid.to_string();
        println!("oid: {rendered}");
        // base58btc multibase prefix
        assert!(rendered.starts_with('z'));
        assert!(!oid.to_bytes().is_empty());
    }
}
