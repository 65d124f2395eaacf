//! > **Metamodel - A Rust Library for Petri-net State Machine Modeling**
//!
//! - Declares Petri-nets with inhibitor arcs, role-based guards, and place
//!   capacities, either programmatically or from a compact URL-safe form.
//! - Nets are indexed into vector form and executed as a
//!   [Vector Addition State Machine (VASM)](https://en.wikipedia.org/wiki/Vector_addition_system).
//! - Models are viewable / sharable in browsers as `?z=` links over a
//!   deterministic deflate + base64 encoding.

/// The `petri_net` module contains the definition and implementation of the `PetriNet` struct.
pub mod petri_net;

/// The `vector` module contains the bounded vector arithmetic used for token transfer and inhibitor checks.
pub mod vector;

/// The `dsl` module contains the `Dsl` trait and `Builder` for declaring Petri-nets.
pub mod dsl;

/// The `vasm` module contains the implementation of a Vector Addition State Machine (VASM).
pub mod vasm;

/// The `declaration` module contains the canonical JSON schema for persisted nets.
pub mod declaration;

/// The `compression` module contains functions for zipping/unzipping models as sharable base64 blobs.
pub mod compression;

/// The `oid` module is used to generate CID's for the zipped blobs.
pub mod oid;

/// The `zblob` module contains utilities to facilitate loading zipped blob data as petri-nets.
pub mod zblob;

/// The `model` module encapsulates the `PetriNet` and `StateMachine` objects into a single `Model` object.
pub mod model;

/// The `display` module renders models as SVG images.
pub mod display;

/// The `fixtures` module contains test fixtures for the project.
pub mod fixtures;

pub use dsl::{Builder, Dsl, Node};
pub use model::Model;
pub use petri_net::PetriNet;
pub use vasm::{Op, StateMachine, Transaction};
pub use vector::Vector;
