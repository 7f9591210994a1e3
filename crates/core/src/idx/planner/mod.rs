//! Index selection for the query planner.
//!
//! Given a parsed predicate tree and the index catalog of a collection,
//! this module decides which indexes are legally usable for each predicate
//! and annotates the tree with per-predicate relevance tags. Downstream
//! planner stages enumerate access plans from the annotation; nothing here
//! chooses between indexes or generates scan bounds.
//!
//! The passes compose into a pipeline over an owned mutable tree:
//!
//! 1. [`get_fields`] collects the paths any indexable predicate references.
//! 2. [`find_relevant_indexes`] shortlists the catalog down to indexes
//!    whose leading key could serve at least one of those paths.
//! 3. [`rate_indexes`] tags every bounds-generating leaf with the
//!    shortlisted indexes compatible with it, split by key position.
//! 4. [`strip_invalid_assignments_to_text_indexes`] removes assignments to
//!    compound-prefix text indexes whose structural prerequisite is unmet.
//!
//! All passes are synchronous, perform no I/O and touch no global state;
//! unrelated trees can be planned concurrently without coordination.

use std::collections::HashSet;

use anyhow::Result;

use crate::catalog::IndexDefinition;
use crate::expr::MatchExpression;

mod compat;
mod geo;
mod tag;
mod text;
mod tree;

pub use tag::RelevantTag;

/// Returns the set of fully-qualified paths referenced by indexable
/// predicates in the tree, composed across array operators and excluding
/// anything beneath a NOR.
pub fn get_fields(node: &MatchExpression, prefix: &str) -> HashSet<String> {
	let mut out = HashSet::new();
	tree::gather_fields(node, prefix, &mut out);
	out
}

/// Selects every catalog index whose leading key field is in `fields`.
/// No other filtering happens at this stage; per-predicate compatibility is
/// the rating pass's job.
pub fn find_relevant_indexes(
	fields: &HashSet<String>,
	all_indexes: &[IndexDefinition],
) -> Result<Vec<IndexDefinition>> {
	let mut out = Vec::new();
	for (position, index) in all_indexes.iter().enumerate() {
		let Some(leading) = index.key_pattern.first() else {
			fail!("Index at position {} has an empty key pattern", position);
		};
		if fields.contains(&leading.field) {
			out.push(index.clone());
		}
	}
	Ok(out)
}

/// Tags the tree in place: every bounds-generating leaf outside a NOR
/// receives a [`RelevantTag`] listing the shortlisted indexes usable at the
/// leading key position (`first`) and at trailing compound positions
/// (`not_first`). This is the unique tag assignment point; rating an
/// already-tagged tree is an internal error.
pub fn rate_indexes(
	node: &mut MatchExpression,
	prefix: &str,
	indexes: &[IndexDefinition],
) -> Result<()> {
	tree::rate(node, prefix, indexes)
}

/// For each text index with a compound prefix, strips tag entries whose
/// surrounding structure does not provide an equality predicate on every
/// prefix field inside the same conjunction as the text predicate.
pub fn strip_invalid_assignments_to_text_indexes(
	node: &mut MatchExpression,
	indexes: &[IndexDefinition],
) -> Result<()> {
	text::strip_invalid_assignments(node, indexes)
}
