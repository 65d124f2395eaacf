use crate::compression::{unzip_url, MODEL_ENTRY};
use crate::dsl::Dsl;
use crate::petri_net::PetriNet;
use crate::vasm::StateMachine;

/// `Model` couples a net with its executable state machine.
#[derive(Debug)]
pub struct Model {
    pub net: PetriNet,
    pub vm: Box<StateMachine>,
}

impl Model {
    pub fn new(func: fn(&mut dyn Dsl)) -> Self {
        let mut net = PetriNet::new();
        let vm = Box::new(net.declare(func).as_vasm());
        let mut model = Self { net, vm };
        model.stamp_cid();
        model
    }

    /// Declares additional structure on the existing net, reindexes, and
    /// rebuilds the vm. Allows chaining.
    pub fn declare(&mut self, func: fn(&mut dyn Dsl)) -> &mut Model {
        self.vm = Box::new(self.net.declare(func).as_vasm());
        self.stamp_cid();
        self
    }

    /// Parses a JSON value into a model.
    ///
    /// # Panics
    ///
    /// Panics if the JSON value cannot be parsed.
    pub fn from_json_value(value: serde_json::Value) -> Self {
        let net = PetriNet::from_json_value(value).expect("Failed to parse JSON");
        let vm = Box::new(net.execute());
        let mut model = Self { net, vm };
        model.stamp_cid();
        model
    }

    /// Parses a JSON string into a model.
    ///
    /// # Panics
    ///
    /// Panics if the JSON string cannot be parsed.
    pub fn from_json_str(value: &str) -> Self {
        let net = PetriNet::from_json_str(value).expect("Failed to parse JSON");
        let vm = Box::new(net.execute());
        let mut model = Self { net, vm };
        model.stamp_cid();
        model
    }

    /// Encodes the net as a sharable URL: the net's path with the base64
    /// archive payload in the `z` query parameter.
    pub fn zip_url(&self) -> String {
        let zblob = self.net.to_zblob();
        format!("{}?z={}", self.net.path, zblob.base64_zipped)
    }

    /// Decodes a `?z=` URL produced by [`Model::zip_url`] (or a foreign
    /// peer) and replaces this model's net and vm with the result.
    ///
    /// Returns the extracted JSON declaration and whether loading succeeded;
    /// malformed external input is recoverable and reported as `false`.
    pub fn unpack_from_url(&mut self, url: &str) -> (String, bool) {
        let json = match unzip_url(url, MODEL_ENTRY) {
            Ok(json) => json,
            Err(_) => return (String::new(), false),
        };
        match PetriNet::from_json_str(&json) {
            Ok(net) => {
                self.net = net;
                self.vm = Box::new(self.net.execute());
                self.stamp_cid();
                (json, true)
            }
            Err(_) => (json, false),
        }
    }

    pub fn to_zblob(&self) -> crate::zblob::Zblob {
        self.net.to_zblob()
    }

    fn stamp_cid(&mut self) {
        self.net.cid = self.net.to_zblob().ipfs_cid;
    }
}

impl Clone for Model {
    fn clone(&self) -> Self {
        let net = self.net.clone();
        let vm = Box::new(net.execute());
        Self { net, vm }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::petri_net::DEFAULT_ROLE;

    fn sample(m: &mut dyn Dsl) {
        m.model_type("petriNet");
        let left = m.cell("left", Some(1), None, 100, 100);
        let right = m.cell("right", None, Some(2), 300, 100);
        let forward = m.func("forward", DEFAULT_ROLE, 200, 40);
        let back = m.func("back", "operator", 200, 160);

        m.arrow(&left, &forward, 1);
        m.arrow(&forward, &right, 1);
        m.arrow(&right, &back, 1);
        m.arrow(&back, &left, 1);
    }

    #[test]
    fn test_url_roundtrip() {
        let model = Model::new(sample);
        let url = model.zip_url();
        assert!(url.starts_with("?z="));

        let mut decoded = Model::new(|_| {});
        let (json, ok) = decoded.unpack_from_url(&url);
        assert!(ok, "expected decode to succeed");
        assert!(!json.is_empty());

        assert_eq!(decoded.net.places.len(), 2);
        assert_eq!(decoded.net.transitions.len(), 2);
        for (label, t) in &model.net.transitions {
            assert_eq!(t.delta, decoded.net.transitions[label].delta, "{label}");
        }
        for (label, p) in &model.net.places {
            let q = &decoded.net.places[label];
            assert_eq!((p.offset, p.initial, p.capacity), (q.offset, q.initial, q.capacity));
        }
    }

    #[test]
    fn test_url_encoding_is_stable() {
        let model = Model::new(sample);
        let url = model.zip_url();
        let mut decoded = Model::new(|_| {});
        let (_, ok) = decoded.unpack_from_url(&url);
        assert!(ok);
        assert_eq!(decoded.zip_url(), url);
        assert_eq!(decoded.net.cid, model.net.cid);
    }

    #[test]
    fn test_from_json_str() {
        let model = Model::from_json_str(crate::fixtures::DINING_PHILOSOPHERS);
        assert_eq!(model.net.places.len(), 15);
        assert_eq!(model.vm.token_count("chopstick1"), 1);
        assert_eq!(model.vm.token_count("right2"), 0);
        assert!(!model.net.cid.is_empty());
    }

    #[test]
    fn test_declare_chains_onto_existing_net() {
        let mut model = Model::new(sample);
        model.declare(|m| {
            let spill = m.cell("spill", None, None, 200, 300);
            let drain = m.func("drain", DEFAULT_ROLE, 200, 240);
            m.arrow(&spill, &drain, 1);
        });
        // redeclaring replaced the vm along with the net
        assert!(model.net.transitions.contains_key("drain"));
        assert_eq!(model.vm.get_state().len(), 3);
    }

    #[test]
    fn test_unpack_rejects_garbage() {
        let mut model = Model::new(|_| {});
        let before = model.net.cid.clone();
        let (json, ok) = model.unpack_from_url("?z=AAAA");
        assert!(!ok);
        assert!(json.is_empty());
        assert_eq!(model.net.cid, before);
    }

    #[test]
    fn test_clone_rebuilds_vm() {
        let model = Model::new(sample);
        let mut copy = model.clone();
        let res = copy.vm.fire(&crate::vasm::Op {
            action: "forward".to_string(),
            ..Default::default()
        });
        assert!(res.is_ok(), "{}", res.msg);
        // the original keeps its own marking
        assert_eq!(model.vm.token_count("left"), 1);
        assert_eq!(copy.vm.token_count("left"), 0);
    }
}
