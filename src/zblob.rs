use serde::Serialize;

use crate::compression::{compress_encode, decompress_decode, MODEL_ENTRY};
use crate::oid::Oid;
use crate::petri_net::PetriNet;

const FAILED_TO_CONVERT: &str = "failed to convert to json";
const FAILED_TO_DECOMPRESS: &str = "failed to decompress";

/// `Zblob` is the sharable-blob record a storage layer persists: the net as
/// its base64 archive payload plus the content identifier computed over that
/// payload. The core produces and consumes these records but implements no
/// storage backend.
#[derive(Debug, Clone, Serialize)]
pub struct Zblob {
    pub id: i64,
    pub ipfs_cid: String,
    pub base64_zipped: String,
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub referrer: String,
    pub created_at: String,
}

impl Default for Zblob {
    fn default() -> Self {
        let mut zblob = Zblob::from_net(&PetriNet::new());
        zblob.title = "default".to_string();
        zblob.keywords = "new".to_string();
        zblob
    }
}

impl Zblob {
    /// Wraps an already-encoded base64 payload, stamping its identifier.
    pub fn from_string(encoded_zip: &str) -> Self {
        Self {
            id: 0,
            ipfs_cid: Oid::new(encoded_zip.as_bytes()).to_string(),
            base64_zipped: encoded_zip.to_string(),
            title: String::new(),
            description: String::new(),
            keywords: String::new(),
            referrer: String::new(),
            created_at: String::new(),
        }
    }

    /// Packages a net as its URL payload.
    ///
    /// # Panics
    ///
    /// Panics if the net cannot be serialised; a net the library built
    /// always can be.
    pub fn from_net(net: &PetriNet) -> Self {
        let json = net.to_json_str().expect(FAILED_TO_CONVERT);
        let payload = compress_encode(MODEL_ENTRY, &json).expect(FAILED_TO_CONVERT);
        Self::from_string(&payload)
    }

    /// Unpacks the blob back into a net.
    ///
    /// # Panics
    ///
    /// Panics if the payload is not a valid archive the library produced.
    pub fn to_net(&self) -> PetriNet {
        let json = decompress_decode(&self.base64_zipped, MODEL_ENTRY).expect(FAILED_TO_DECOMPRESS);
        PetriNet::from_json_str(&json).expect(FAILED_TO_DECOMPRESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::DINING_PHILOSOPHERS;

    #[test]
    fn test_zblob_roundtrip() {
        let net = PetriNet::from_json_str(DINING_PHILOSOPHERS).expect("Failed to create PetriNet");
        let zblob = net.to_zblob();
        let net2 = zblob.to_net();
        assert_eq!(net2.places.len(), 15);
        assert_eq!(net2.transitions.len(), 10);
    }

    #[test]
    fn test_cid_matches_payload() {
        let net = PetriNet::from_json_str(DINING_PHILOSOPHERS).expect("Failed to create PetriNet");
        let zblob = net.to_zblob();
        assert_eq!(
            zblob.ipfs_cid,
            Oid::new(zblob.base64_zipped.as_bytes()).to_string()
        );
    }

    #[test]
    fn test_equal_nets_share_cid() {
        let a = PetriNet::from_json_str(DINING_PHILOSOPHERS).expect("net");
        // canonical json + pinned timestamps make the payload reproducible
        let b = PetriNet::from_json_str(DINING_PHILOSOPHERS).expect("net");
        assert_eq!(a.to_zblob().ipfs_cid, b.to_zblob().ipfs_cid);
    }

    #[test]
    fn test_default_zblob() {
        let zblob = Zblob::default();
        assert_eq!(zblob.title, "default");
        let net = zblob.to_net();
        assert!(net.places.is_empty());
    }
}
