//! Predicate tree traversals: gathering indexed paths and rating indexes.

use std::collections::HashSet;

use anyhow::Result;

use crate::catalog::IndexDefinition;
use crate::expr::{MatchExpression, MatchKind};

use super::compat::compatible;
use super::tag::RelevantTag;

/// Collects every fully-qualified path referenced by an indexable leaf
/// reachable from `node`. Paths under a NOR are never usable by a positive
/// index match, so the walk stops there.
pub(super) fn gather_fields(node: &MatchExpression, prefix: &str, out: &mut HashSet<String>) {
	if node.kind() == MatchKind::Nor {
		return;
	}

	if node.indexable_on_own_path() {
		out.insert(format!("{prefix}{}", node.path()));
	} else if node.indexes_through_children() {
		// The predicate {a: {$elemMatch: {b: 1}}} is really over a.b, so
		// the local path joins the prefix. An elemMatch nested under $all
		// has no local path; appending a dot there would produce "a..b".
		let prefix = extend_prefix(prefix, node.path());
		for child in node.children() {
			gather_fields(child, &prefix, out);
		}
	} else if node.is_logical() {
		for child in node.children() {
			gather_fields(child, prefix, out);
		}
	}
}

/// Attaches a relevance tag to every bounds-generating leaf reachable from
/// `node`, listing for each shortlisted index the key positions the leaf
/// could bind.
pub(super) fn rate(
	node: &mut MatchExpression,
	prefix: &str,
	indexes: &[IndexDefinition],
) -> Result<()> {
	if node.kind() == MatchKind::Nor {
		return Ok(());
	}

	// Every bounds-generating node is tagged, even when no compatible index
	// exists; downstream enumeration relies on the tag being present.
	if node.generates_bounds() {
		let is_not = node.kind() == MatchKind::Not;
		// A negation binds the index through its child's field.
		let full_path = if is_not {
			let child_path = node.children().first().map(|c| c.path()).unwrap_or_default();
			format!("{prefix}{child_path}")
		} else {
			format!("{prefix}{}", node.path())
		};

		if node.tag().is_some() {
			fail!("Node {} was already tagged", node);
		}

		let mut tag = RelevantTag::new(full_path);
		for (position, index) in indexes.iter().enumerate() {
			let mut elts = index.key_pattern.iter();
			let Some(leading) = elts.next() else {
				fail!("Index at position {} has an empty key pattern", position);
			};
			if leading.field == tag.path && compatible(leading, index, node)? {
				tag.first.push(position);
			}
			for elt in elts {
				if elt.field == tag.path && compatible(elt, index, node)? {
					tag.not_first.push(position);
				}
			}
		}

		// The negation's child carries an independently-owned copy, so the
		// strip pass can evolve the two tags separately.
		if is_not {
			let child_tag = tag.clone();
			if let Some(child) = node.children_mut().first_mut() {
				child.set_tag(child_tag);
			}
		}
		node.set_tag(tag);
		return Ok(());
	}

	if node.indexes_through_children() {
		let prefix = extend_prefix(prefix, node.path());
		for child in node.children_mut() {
			rate(child, &prefix, indexes)?;
		}
	} else if node.is_logical() {
		for child in node.children_mut() {
			rate(child, prefix, indexes)?;
		}
	}
	Ok(())
}

fn extend_prefix(prefix: &str, path: &str) -> String {
	if path.is_empty() {
		prefix.to_owned()
	} else {
		format!("{prefix}{path}.")
	}
}
