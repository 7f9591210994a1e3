//! The compatibility oracle: may a predicate use an index at a given key
//! position?
//!
//! The decision is a closed matrix over the effective key type and the
//! predicate kind. Every arm corresponds to a rule of the access method
//! behind that key type; a misclassification here silently produces wrong
//! query results, so the arms stay as literal as possible.

use anyhow::Result;

use crate::catalog::{IndexDefinition, IndexType, KeyPatternElt};
use crate::expr::{Crs, GeoOperator, MatchExpression, MatchKind};

use super::geo;

/// Decides whether `node` may use `index` at the key position represented
/// by `elt`.
pub(super) fn compatible(
	elt: &KeyPatternElt,
	index: &IndexDefinition,
	node: &MatchExpression,
) -> Result<bool> {
	let kind = node.kind();
	match index.effective_key_type(elt) {
		"" => ordinary_compatible(index, node, kind),
		"hashed" => Ok(matches!(kind, MatchKind::Eq | MatchKind::In)),
		"2dsphere" => Ok(sphere_compatible(node, kind)),
		"2d" => Ok(flat_compatible(index, node, kind)),
		"text" => Ok(kind == MatchKind::Text),
		"geoHaystack" => Ok(false),
		unknown => {
			warn!("Unknown indexing for node {} and key element {}", node, elt);
			fail!("Unknown index key type {unknown}");
		}
	}
}

/// Rules for an ordinary sorted key.
fn ordinary_compatible(
	index: &IndexDefinition,
	node: &MatchExpression,
	kind: MatchKind,
) -> Result<bool> {
	// A sparse index omits documents missing the field, but equality
	// against null must also match those documents.
	if kind == MatchKind::Eq && index.sparse && node.value().is_some_and(|v| v.is_null()) {
		return Ok(false);
	}

	// A sorted key cannot serve geometric predicates.
	if matches!(kind, MatchKind::Geo | MatchKind::GeoNear) {
		return Ok(false);
	}

	if kind == MatchKind::Not {
		// Negations cannot use sparse indexes (documents missing the field
		// match the negation but are absent from the index) or multikey
		// indexes ({a: [1,2,3]} does not match {a: {$ne: 3}}, yet a scan
		// over the complement intervals would return it).
		if index.sparse || index.multikey {
			return Ok(false);
		}
		// No correct interval enumeration exists for these negated kinds.
		if let Some(child) = node.children().first() {
			if matches!(child.kind(), MatchKind::Regex | MatchKind::Mod) {
				return Ok(false);
			}
		}
	}

	if index.index_type != IndexType::Text {
		return Ok(true);
	}

	// A sorted key inside a text index. Equalities are usable anywhere; the
	// text machinery requires an equality on every prefix field, so any
	// other predicate may only bind a suffix position. The first
	// string-typed element of the key pattern divides prefix from suffix.
	if kind == MatchKind::Eq {
		return Ok(true);
	}
	for spec_elt in &index.key_pattern {
		if spec_elt.is_special() {
			// Reached the divider first: the node's field is a suffix.
			return Ok(true);
		}
		if node.path() == spec_elt.field {
			return Ok(false);
		}
	}

	// A text index always carries a string-typed element, so the scan above
	// must hit the divider.
	fail!("Text index has no text element in its key pattern");
}

/// Rules for a spherical geo key.
fn sphere_compatible(node: &MatchExpression, kind: MatchKind) -> bool {
	match kind {
		MatchKind::Geo => {
			node.geo_predicate().is_some_and(|geo| geo.geometry.has_s2_region())
		}
		MatchKind::GeoNear => node
			.near_predicate()
			.is_some_and(|near| near.crs == Crs::Sphere || near.near_sphere),
		_ => false,
	}
}

/// Rules for a flat geo key.
fn flat_compatible(index: &IndexDefinition, node: &MatchExpression, kind: MatchKind) -> bool {
	match kind {
		MatchKind::GeoNear => {
			node.near_predicate().is_some_and(|near| near.crs == Crs::Flat)
		}
		MatchKind::Geo => {
			let Some(predicate) = node.geo_predicate() else {
				return false;
			};
			// A flat index only answers containment queries.
			if predicate.operator != GeoOperator::Within {
				return false;
			}
			if predicate.geometry.has_flat_region() {
				return true;
			}
			// Spherical caps are answerable as long as the scan region
			// stays inside the world bounds.
			match predicate.geometry.cap() {
				Some(circle) => geo::cap_wont_wrap(circle, index),
				None => false,
			}
		}
		_ => false,
	}
}
