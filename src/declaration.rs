use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::petri_net::{PetriNet, Place, Position, Role, Transition, DEFAULT_ROLE};

/// Wire form of a place: the offset is persisted so vector semantics
/// round-trip bit-identically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceDefinition {
    pub offset: i64,
    #[serde(default)]
    pub initial: i64,
    #[serde(default)]
    pub capacity: i64,
    #[serde(default)]
    pub x: i64,
    #[serde(default)]
    pub y: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub x: i64,
    #[serde(default)]
    pub y: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcDefinition {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub weight: i64,
    #[serde(default)]
    pub inhibit: bool,
}

/// `Declaration` is the canonical JSON schema (`version: "v0"`) a net is
/// persisted as. Arcs are the authored graph form; deltas and guards are
/// rebuilt by indexing after decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    pub model_type: String,
    pub version: String,
    pub places: HashMap<String, PlaceDefinition>,
    pub transitions: HashMap<String, TransitionDefinition>,
    pub arcs: Vec<ArcDefinition>,
}

// weight == 0 means 1 on the wire; the delta form is canonical
fn normalise_weight(weight: i64) -> i64 {
    if weight == 0 {
        1
    } else {
        weight
    }
}

impl PetriNet {
    /// Projects the net onto the wire schema. The default role is elided;
    /// zero arc weights are normalised to 1.
    pub fn to_declaration(&self) -> Declaration {
        let places = self
            .places
            .iter()
            .map(|(label, p)| {
                (
                    label.clone(),
                    PlaceDefinition {
                        offset: p.offset,
                        initial: p.initial,
                        capacity: p.capacity,
                        x: p.position.x,
                        y: p.position.y,
                    },
                )
            })
            .collect();
        let transitions = self
            .transitions
            .iter()
            .map(|(label, t)| {
                let role = if t.role.label == DEFAULT_ROLE {
                    None
                } else {
                    Some(t.role.label.clone())
                };
                (
                    label.clone(),
                    TransitionDefinition {
                        role,
                        x: t.position.x,
                        y: t.position.y,
                    },
                )
            })
            .collect();
        let arcs = self
            .arcs
            .iter()
            .map(|arc| ArcDefinition {
                source: arc.source.clone(),
                target: arc.target.clone(),
                weight: normalise_weight(arc.weight),
                inhibit: arc.inhibitor,
            })
            .collect();
        Declaration {
            model_type: self.model_type.clone(),
            version: self.version.clone(),
            places,
            transitions,
            arcs,
        }
    }

    /// Rebuilds a net from the wire schema and indexes it. A missing role
    /// decodes as `"default"`; inhibitor direction is resolved from the
    /// source kind.
    ///
    /// # Panics
    ///
    /// Panics when an arc references an unknown label or connects elements
    /// of the same kind.
    pub fn from_declaration(decl: &Declaration) -> Self {
        let mut net = PetriNet::new();
        net.model_type = decl.model_type.clone();
        net.version = decl.version.clone();

        for (label, p) in &decl.places {
            net.places.insert(
                label.clone(),
                Place {
                    label: label.clone(),
                    offset: p.offset,
                    position: Position::new(p.x, p.y),
                    initial: p.initial,
                    capacity: p.capacity,
                },
            );
        }
        for (label, t) in &decl.transitions {
            let role = Role {
                label: t
                    .role
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            };
            net.roles.insert(role.label.clone(), role.clone());
            net.transitions.insert(
                label.clone(),
                Transition {
                    label: label.clone(),
                    position: Position::new(t.x, t.y),
                    role,
                    ..Transition::default()
                },
            );
        }
        for a in &decl.arcs {
            let source = net
                .node(&a.source)
                .unwrap_or_else(|| panic!("unknown node: {}", a.source));
            let target = net
                .node(&a.target)
                .unwrap_or_else(|| panic!("unknown node: {}", a.target));
            let weight = normalise_weight(a.weight);
            if a.inhibit {
                net.guard(&source, &target, weight);
            } else {
                net.arrow(&source, &target, weight);
            }
        }
        net.index();
        net
    }

    /// Creates a new net from the given JSON value.
    pub fn from_json_value(contents: Value) -> Result<Self, serde_json::Error> {
        let decl: Declaration = serde_json::from_value(contents)?;
        Ok(Self::from_declaration(&decl))
    }

    /// Creates a new net from the given JSON string.
    pub fn from_json_str(contents: &str) -> Result<Self, serde_json::Error> {
        let decl: Declaration = serde_json::from_str(contents)?;
        Ok(Self::from_declaration(&decl))
    }

    /// Converts the net to a JSON value.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self.to_declaration())
    }

    /// Converts the net to a canonical (sorted-key) JSON string.
    pub fn to_json_str(&self) -> Result<String, cjson::Error> {
        self.to_json().map(|v| cjson::to_string(&v))?
    }
}
