use crate::petri_net::{PetriNet, PlaceMap, TransitionMap, EXPECTED_PLACE};
use crate::vector::{add, Vector};

pub const UNKNOWN_ACTION: &str = "unknown action";
pub const FAILED_ROLE_ASSERTION: &str = "role assertion failed";
pub const BAD_MULTIPLE: &str = "multiple must be positive integer";
pub const OK: &str = "OK";

const DEFAULT_MULTIPLE: i64 = 1;

fn inhibited_by(label: &str) -> String {
    format!("transition is inhibited by place {label}")
}

/// Op names a transition to fire, how many times, and as whom. An empty role
/// bypasses the role assertion; a zero multiple is promoted to 1.
#[derive(Debug, Clone, Default)]
pub struct Op {
    pub action: String,
    pub multiple: i64,
    pub role: String,
}

/// `Transaction` is the result of a test-fire or fire: whether it succeeded,
/// the reason when it did not, and the output marking.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub ok: bool,
    pub msg: String,
    pub out: Vector,
    pub role: String,
}

impl Transaction {
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn is_err(&self) -> bool {
        !self.ok
    }
}

/// `StateMachine` executes an indexed net as a
/// [vector addition state machine](https://en.wikipedia.org/wiki/Vector_addition_system).
///
/// The machine clones the net's place and transition tables at construction
/// and owns its marking and capacity vectors exclusively; the source net
/// stays read-only. Firing is single-owner: `fire` is the only mutator.
#[derive(Debug, Clone)]
pub struct StateMachine {
    places: PlaceMap,
    transitions: TransitionMap,
    state: Vector,
    capacity: Vector,
}

impl StateMachine {
    /// Builds a machine from an indexed net, starting at the net's initial
    /// marking with the net's capacities.
    pub fn from_net(net: &PetriNet) -> Self {
        Self::with_state(net, net.initial_vector())
    }

    /// Builds a machine starting from the given marking.
    pub fn with_state(net: &PetriNet, state: Vector) -> Self {
        Self::with_state_and_capacity(net, state, net.capacity_vector())
    }

    /// Builds a machine with both marking and capacity supplied. An empty
    /// state falls back to the net's initial vector; a state/capacity length
    /// mismatch falls back to the zero vector.
    pub fn with_state_and_capacity(net: &PetriNet, state: Vector, capacity: Vector) -> Self {
        let mut state = state;
        if state.is_empty() {
            state = net.initial_vector();
        } else if state.len() != capacity.len() {
            state = net.empty_vector();
        }
        Self {
            places: net.places.clone(),
            transitions: net.transitions.clone(),
            state,
            capacity,
        }
    }

    /// Returns a snapshot of the marking; mutating it does not affect the
    /// machine.
    pub fn get_state(&self) -> Vector {
        self.state.clone()
    }

    /// Token count at the named place.
    ///
    /// # Panics
    ///
    /// Panics when the label is not a place.
    pub fn token_count(&self, label: &str) -> i64 {
        let p = self
            .places
            .get(label)
            .unwrap_or_else(|| panic!("{}", EXPECTED_PLACE));
        self.state[p.offset as usize]
    }

    /// Evaluates the guards of the named transition against the current
    /// marking. Returns the first inhibiting guard's place label.
    ///
    /// A standard guard inhibits while the place holds enough tokens; an
    /// inverted guard (read arc) inhibits while it does not.
    ///
    /// # Panics
    ///
    /// Panics when the action does not name a transition.
    pub fn inhibited(&self, op: &Op) -> (bool, String) {
        let txn = self
            .transitions
            .get(&op.action)
            .unwrap_or_else(|| panic!("{}", UNKNOWN_ACTION));
        for g in txn.guards.values() {
            let (ok, _, _) = add(&self.state, &g.delta, 1, None);
            if g.inverted {
                if !ok {
                    return (true, g.label.clone());
                }
            } else if ok {
                return (true, g.label.clone());
            }
        }
        (false, String::new())
    }

    /// Checks whether `op` could fire, without mutating the marking.
    pub fn test_fire(&self, op: &Op) -> Transaction {
        let Some(txn) = self.transitions.get(&op.action) else {
            return Transaction {
                ok: false,
                msg: UNKNOWN_ACTION.to_string(),
                out: self.get_state(),
                role: String::new(),
            };
        };
        let role = txn.role.label.clone();
        if !op.role.is_empty() && txn.role.label != op.role {
            return Transaction {
                ok: false,
                msg: FAILED_ROLE_ASSERTION.to_string(),
                out: self.get_state(),
                role,
            };
        }
        if op.multiple < 0 {
            return Transaction {
                ok: false,
                msg: BAD_MULTIPLE.to_string(),
                out: self.get_state(),
                role,
            };
        }
        let multiple = if op.multiple == 0 {
            DEFAULT_MULTIPLE
        } else {
            op.multiple
        };
        let (is_inhibited, label) = self.inhibited(op);
        if is_inhibited {
            return Transaction {
                ok: false,
                msg: inhibited_by(&label),
                out: vec![0; self.state.len()],
                role,
            };
        }
        let (ok, msg, out) = add(&self.state, &txn.delta, multiple, Some(&self.capacity));
        if !ok {
            return Transaction {
                ok: false,
                msg: msg.to_string(),
                out,
                role,
            };
        }
        Transaction {
            ok: true,
            msg: OK.to_string(),
            out,
            role,
        }
    }

    /// Runs [`StateMachine::test_fire`] and commits the output marking on
    /// success. On any failure the marking is untouched.
    pub fn fire(&mut self, op: &Op) -> Transaction {
        let res = self.test_fire(op);
        if res.ok {
            self.state.copy_from_slice(&res.out);
        }
        res
    }
}

impl PetriNet {
    /// Starts a process at the net's initial marking and capacities.
    pub fn execute(&self) -> StateMachine {
        StateMachine::from_net(self)
    }

    /// Starts a process at the given marking with the net's capacities.
    pub fn execute_with(&self, state: Vector) -> StateMachine {
        StateMachine::with_state(self, state)
    }

    /// Starts a process with both marking and capacities supplied.
    pub fn execute_with_capacity(&self, state: Vector, capacity: Vector) -> StateMachine {
        StateMachine::with_state_and_capacity(self, state, capacity)
    }
}
