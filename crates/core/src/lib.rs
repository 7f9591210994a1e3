//! # FerroDB Core
//!
//! This crate is the index-selection core of the FerroDB query planner.
//! Given a parsed predicate tree and the catalog of indexes defined on a
//! collection, it decides which indexes are legally usable for each
//! predicate and annotates the tree with that information. Downstream
//! planner stages consume the annotation to enumerate access plans.
//!
//! The crate performs no I/O and holds no global state. Filter parsing,
//! catalog discovery, plan enumeration and bound generation live in their
//! own crates.

#[macro_use]
extern crate tracing;

#[macro_use]
mod mac;

pub mod catalog;
pub mod err;
pub mod expr;
pub mod idx;
