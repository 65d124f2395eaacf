use std::collections::HashMap;

use crate::dsl::{Builder, Dsl, Node};
use crate::vector::Vector;
use crate::zblob::Zblob;

pub const BAD_INHIBITOR_SOURCE: &str = "inhibitor source must be a place";
pub const BAD_INHIBITOR_TARGET: &str = "inhibitor target must be a transition";
pub const BAD_WEIGHT: &str = "arc weight must be positive integer";
pub const BAD_ARC_TRANSITION: &str = "source and target are both transitions";
pub const BAD_ARC_PLACE: &str = "source and target are both places";
pub const EXPECTED_TRANSITION: &str = "element was expected to be a transition";
pub const EXPECTED_PLACE: &str = "element was expected to be a place";
pub const DUPLICATE_LABEL: &str = "label is already in use";

pub const DEFAULT_ROLE: &str = "default";

/// Layout position of a place or transition. The z coordinate is carried in
/// the domain model but absent from the 2-D JSON schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Position {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y, z: 0 }
    }
}

/// Place elements contain tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Place {
    pub label: String,
    pub offset: i64,
    pub position: Position,
    pub initial: i64,
    pub capacity: i64,
}

/// Role defines coarse permission to fire a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub label: String,
}

/// Guard is a per-transition inhibitor rule tied to one place.
///
/// `inverted = true` marks a read arc: the transition is inhibited while the
/// guarding place is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    pub label: String,
    pub delta: Vector,
    pub inverted: bool,
}

/// Transition defines a token transfer action. `delta` and `guards` are the
/// indexed form, rebuilt from the arc list by [`PetriNet::index`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub label: String,
    pub position: Position,
    pub role: Role,
    pub delta: Vector,
    pub guards: GuardMap,
    pub allow_reentry: bool,
}

impl Default for Transition {
    fn default() -> Self {
        Self {
            label: String::new(),
            position: Position::default(),
            role: Role {
                label: DEFAULT_ROLE.to_string(),
            },
            delta: Vector::new(),
            guards: GuardMap::new(),
            allow_reentry: false,
        }
    }
}

pub type PlaceMap = HashMap<String, Place>;
pub type TransitionMap = HashMap<String, Transition>;
pub type GuardMap = HashMap<String, Guard>;
pub type RoleMap = HashMap<String, Role>;

/// Arc is the authored (graph form) edge between a place and a transition.
///
/// `read = true` iff the arc is an inhibitor sourced at the transition: the
/// transition may fire only while the place holds tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arc {
    pub source: String,
    pub target: String,
    pub weight: i64,
    pub inhibitor: bool,
    pub read: bool,
}

/// PetriNet holds the authored net: places, transitions, arcs and roles.
///
/// The arc list and the per-transition delta/guard vectors are dual
/// representations; [`PetriNet::index`] and [`PetriNet::graph`] are the only
/// legal conversions between them.
#[derive(Debug, Clone)]
pub struct PetriNet {
    pub model_type: String,
    pub version: String,
    pub places: PlaceMap,
    pub transitions: TransitionMap,
    pub arcs: Vec<Arc>,
    pub roles: RoleMap,
    pub path: String,
    pub cid: String,
}

impl Default for PetriNet {
    fn default() -> Self {
        let mut roles = RoleMap::new();
        roles.insert(
            DEFAULT_ROLE.to_string(),
            Role {
                label: DEFAULT_ROLE.to_string(),
            },
        );
        Self {
            model_type: "petriNet".to_string(),
            version: "v0".to_string(),
            places: PlaceMap::new(),
            transitions: TransitionMap::new(),
            arcs: Vec::new(),
            roles,
            path: String::new(),
            cid: String::new(),
        }
    }
}

impl PetriNet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn declare(&mut self, func: fn(&mut dyn Dsl)) -> Builder<'_> {
        let mut builder = Builder::new(self);
        func(&mut builder);
        builder
    }

    pub fn empty_vector(&self) -> Vector {
        vec![0; self.places.len()]
    }

    pub fn initial_vector(&self) -> Vector {
        let mut v = self.empty_vector();
        for p in self.places.values() {
            v[p.offset as usize] = p.initial;
        }
        v
    }

    pub fn capacity_vector(&self) -> Vector {
        let mut v = self.empty_vector();
        for p in self.places.values() {
            v[p.offset as usize] = p.capacity;
        }
        v
    }

    /// Next unused auto-label for a place.
    pub fn place_seq(&self) -> String {
        let mut i = 0;
        loop {
            let label = format!("place{i}");
            if !self.places.contains_key(&label) {
                return label;
            }
            i += 1;
        }
    }

    /// Next unused auto-label for a transition.
    pub fn transition_seq(&self) -> String {
        let mut i = 0;
        loop {
            let label = format!("txn{i}");
            if !self.transitions.contains_key(&label) {
                return label;
            }
            i += 1;
        }
    }

    /// Declares a new place with an auto-generated label and the next dense
    /// offset. The customiser runs before insertion, so it may rename the
    /// element.
    pub fn cell(&mut self, customise: impl FnOnce(&mut Place)) -> Node {
        let mut p = Place {
            label: self.place_seq(),
            offset: self.places.len() as i64,
            ..Place::default()
        };
        customise(&mut p);
        let label = p.label.clone();
        self.places.insert(label.clone(), p);
        Node::Place(label)
    }

    /// Declares a new transition with an auto-generated label and the default
    /// role. The customiser runs before insertion; its role is registered in
    /// the net-level role map.
    pub fn func(&mut self, customise: impl FnOnce(&mut Transition)) -> Node {
        let mut t = Transition {
            label: self.transition_seq(),
            ..Transition::default()
        };
        customise(&mut t);
        self.roles.insert(t.role.label.clone(), t.role.clone());
        let label = t.label.clone();
        self.transitions.insert(label.clone(), t);
        Node::Transition(label)
    }

    /// Looks up an element by label.
    pub fn node(&self, label: &str) -> Option<Node> {
        if self.places.contains_key(label) {
            Some(Node::Place(label.to_string()))
        } else if self.transitions.contains_key(label) {
            Some(Node::Transition(label.to_string()))
        } else {
            None
        }
    }

    /// Renames an element, moving its map entry and rewriting any arcs that
    /// reference the old label. The new label must be unused for the kind.
    ///
    /// # Panics
    ///
    /// Panics when the new label is already in use, or when the node does not
    /// resolve to an element of its kind.
    pub fn rename(&mut self, node: &Node, label: &str) -> Node {
        let renamed = match node {
            Node::Place(old) => {
                assert!(!self.places.contains_key(label), "{}", DUPLICATE_LABEL);
                let mut p = self.places.remove(old).expect(EXPECTED_PLACE);
                p.label = label.to_string();
                self.places.insert(label.to_string(), p);
                Node::Place(label.to_string())
            }
            Node::Transition(old) => {
                assert!(!self.transitions.contains_key(label), "{}", DUPLICATE_LABEL);
                let mut t = self.transitions.remove(old).expect(EXPECTED_TRANSITION);
                t.label = label.to_string();
                self.transitions.insert(label.to_string(), t);
                Node::Transition(label.to_string())
            }
        };
        let old = node.label();
        for arc in &mut self.arcs {
            if arc.source == old {
                arc.source = label.to_string();
            }
            if arc.target == old {
                arc.target = label.to_string();
            }
        }
        renamed
    }

    pub fn set_position(&mut self, node: &Node, x: i64, y: i64, z: i64) {
        match node {
            Node::Place(label) => {
                self.places.get_mut(label).expect(EXPECTED_PLACE).position = Position { x, y, z };
            }
            Node::Transition(label) => {
                self.transitions
                    .get_mut(label)
                    .expect(EXPECTED_TRANSITION)
                    .position = Position { x, y, z };
            }
        }
    }

    /// Sets the starting token count of a place.
    ///
    /// # Panics
    ///
    /// Panics when the node is not a place.
    pub fn set_initial(&mut self, node: &Node, tokens: i64) {
        match node {
            Node::Place(label) => {
                self.places.get_mut(label).expect(EXPECTED_PLACE).initial = tokens;
            }
            Node::Transition(_) => panic!("{}", EXPECTED_PLACE),
        }
    }

    /// Sets the maximum tokens a place can store; 0 means unbounded.
    ///
    /// # Panics
    ///
    /// Panics when the node is not a place.
    pub fn set_capacity(&mut self, node: &Node, tokens: i64) {
        match node {
            Node::Place(label) => {
                self.places.get_mut(label).expect(EXPECTED_PLACE).capacity = tokens;
            }
            Node::Transition(_) => panic!("{}", EXPECTED_PLACE),
        }
    }

    /// Sets and registers the role of a transition.
    ///
    /// # Panics
    ///
    /// Panics when the node is not a transition.
    pub fn set_role(&mut self, node: &Node, role: &str) {
        match node {
            Node::Transition(label) => {
                let r = Role {
                    label: role.to_string(),
                };
                self.roles.insert(r.label.clone(), r.clone());
                self.transitions.get_mut(label).expect(EXPECTED_TRANSITION).role = r;
            }
            Node::Place(_) => panic!("{}", EXPECTED_TRANSITION),
        }
    }

    /// Appends a token-transfer arc from `source` to `target`.
    ///
    /// # Panics
    ///
    /// Panics when both endpoints are the same kind or the weight is
    /// negative.
    pub fn arrow(&mut self, source: &Node, target: &Node, weight: i64) {
        if source.is_place() && target.is_place() {
            panic!("{}", BAD_ARC_PLACE);
        }
        if source.is_transition() && target.is_transition() {
            panic!("{}", BAD_ARC_TRANSITION);
        }
        if weight < 0 {
            panic!("{}", BAD_WEIGHT);
        }
        self.arcs.push(Arc {
            source: source.label().to_string(),
            target: target.label().to_string(),
            weight,
            inhibitor: false,
            read: false,
        });
    }

    /// Appends an inhibitor arc. A place-sourced guard blocks the target
    /// transition while the place holds tokens; a transition-sourced guard
    /// (read arc) blocks the source transition while the place is empty.
    ///
    /// # Panics
    ///
    /// Panics when the endpoints are not one place and one transition, or
    /// the weight is negative.
    pub fn guard(&mut self, source: &Node, target: &Node, weight: i64) {
        if weight < 0 {
            panic!("{}", BAD_WEIGHT);
        }
        let read = if source.is_transition() {
            if !target.is_place() {
                panic!("{}", BAD_INHIBITOR_SOURCE);
            }
            true
        } else {
            if !target.is_transition() {
                panic!("{}", BAD_INHIBITOR_TARGET);
            }
            false
        };
        self.arcs.push(Arc {
            source: source.label().to_string(),
            target: target.label().to_string(),
            weight,
            inhibitor: true,
            read,
        });
    }

    /// Rebuilds every transition's delta vector and guard table from the
    /// authored arc list.
    pub fn index(&mut self) {
        let size = self.places.len();
        for t in self.transitions.values_mut() {
            t.delta = vec![0; size];
            t.guards.clear();
        }
        for arc in &self.arcs {
            if arc.inhibitor {
                let (place_label, txn_label) = if arc.read {
                    (&arc.target, &arc.source)
                } else {
                    (&arc.source, &arc.target)
                };
                let place = self
                    .places
                    .get(place_label)
                    .unwrap_or_else(|| panic!("unknown place: {place_label}"));
                let mut delta = vec![0; size];
                delta[place.offset as usize] = -arc.weight;
                let guard = Guard {
                    label: place.label.clone(),
                    delta,
                    inverted: arc.read,
                };
                self.transitions
                    .get_mut(txn_label)
                    .unwrap_or_else(|| panic!("unknown transition: {txn_label}"))
                    .guards
                    .insert(guard.label.clone(), guard);
            } else if let Some(place) = self.places.get(&arc.source) {
                let offset = place.offset as usize;
                self.transitions
                    .get_mut(&arc.target)
                    .unwrap_or_else(|| panic!("unknown transition: {}", arc.target))
                    .delta[offset] -= arc.weight;
            } else {
                let place = self
                    .places
                    .get(&arc.target)
                    .unwrap_or_else(|| panic!("unknown place: {}", arc.target));
                let offset = place.offset as usize;
                self.transitions
                    .get_mut(&arc.source)
                    .unwrap_or_else(|| panic!("unknown transition: {}", arc.source))
                    .delta[offset] += arc.weight;
            }
        }
    }

    /// Rebuilds the arc list from delta vectors and guard tables, the inverse
    /// of [`PetriNet::index`]. Arc ordering is not preserved; the read /
    /// standard distinction on guards is.
    ///
    /// # Panics
    ///
    /// Panics when a guard holds a positive delta component.
    pub fn graph(&mut self) {
        let mut labels_by_offset: HashMap<i64, String> = HashMap::new();
        for (label, p) in &self.places {
            labels_by_offset.insert(p.offset, label.clone());
        }
        let place_at = |offset: usize| -> &String {
            labels_by_offset
                .get(&(offset as i64))
                .unwrap_or_else(|| panic!("no place at offset {offset}"))
        };

        let mut arcs = Vec::new();
        for t in self.transitions.values() {
            for (offset, d) in t.delta.iter().enumerate() {
                if *d < 0 {
                    arcs.push(Arc {
                        source: place_at(offset).clone(),
                        target: t.label.clone(),
                        weight: -d,
                        inhibitor: false,
                        read: false,
                    });
                } else if *d > 0 {
                    arcs.push(Arc {
                        source: t.label.clone(),
                        target: place_at(offset).clone(),
                        weight: *d,
                        inhibitor: false,
                        read: false,
                    });
                }
            }
            for g in t.guards.values() {
                for (offset, d) in g.delta.iter().enumerate() {
                    if *d < 0 {
                        let place = place_at(offset).clone();
                        let (source, target) = if g.inverted {
                            (t.label.clone(), place)
                        } else {
                            (place, t.label.clone())
                        };
                        arcs.push(Arc {
                            source,
                            target,
                            weight: -d,
                            inhibitor: true,
                            read: g.inverted,
                        });
                    } else if *d != 0 {
                        panic!("{}", BAD_INHIBITOR_TARGET);
                    }
                }
            }
        }
        self.arcs = arcs;
    }

    /// Axis-aligned bounding box over all element positions, padded by a
    /// fixed margin: `(x, y, width, height)`.
    pub fn get_view_port(&self) -> (i64, i64, i64, i64) {
        const MARGIN: i64 = 60;
        let mut min_x = 0;
        let mut min_y = 0;
        let mut max_x = 0;
        let mut max_y = 0;
        let mut first = true;
        let positions = self
            .places
            .values()
            .map(|p| p.position)
            .chain(self.transitions.values().map(|t| t.position));
        for pos in positions {
            if first {
                min_x = pos.x;
                min_y = pos.y;
                max_x = pos.x;
                max_y = pos.y;
                first = false;
            } else {
                min_x = min_x.min(pos.x);
                min_y = min_y.min(pos.y);
                max_x = max_x.max(pos.x);
                max_y = max_y.max(pos.y);
            }
        }
        (
            min_x - MARGIN,
            min_y - MARGIN,
            (max_x - min_x) + 2 * MARGIN,
            (max_y - min_y) + 2 * MARGIN,
        )
    }

    pub fn to_zblob(&self) -> Zblob {
        Zblob::from_net(self)
    }
}
