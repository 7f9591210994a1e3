//! Structural validation of text-index assignments.
//!
//! A text index with a compound prefix can only be used when every prefix
//! field has an equality predicate in the same conjunction as the text
//! predicate. The rating pass cannot see that requirement locally, so this
//! pass walks the tagged tree per text index and strips the assignments
//! whose surrounding structure fails it.

use std::collections::HashSet;

use anyhow::Result;

use crate::catalog::{IndexDefinition, IndexType};
use crate::expr::{MatchExpression, MatchKind};

pub(super) fn strip_invalid_assignments(
	node: &mut MatchExpression,
	indexes: &[IndexDefinition],
) -> Result<()> {
	for (position, index) in indexes.iter().enumerate() {
		if index.index_type != IndexType::Text {
			continue;
		}

		// The prefix fields precede the first string-typed key element,
		// which divides prefix from text payload.
		let mut prefix_paths = HashSet::new();
		let mut found_divider = false;
		for elt in &index.key_pattern {
			if elt.is_special() {
				found_divider = true;
				break;
			}
			prefix_paths.insert(elt.field.clone());
		}
		if !found_divider {
			fail!("Text index at position {} has no text element in its key pattern", position);
		}

		// Without a prefix there is no structural requirement to enforce.
		if !prefix_paths.is_empty() {
			strip_for_index(node, position, &prefix_paths)?;
		}
	}
	Ok(())
}

/// Removes assignments to the text index at `position` from every leaf in
/// the subtree whose context cannot satisfy the prefix requirement.
fn strip_for_index(
	node: &mut MatchExpression,
	position: usize,
	prefix_paths: &HashSet<String>,
) -> Result<()> {
	// A leaf reached here sits outside a satisfying conjunction: either a
	// text predicate with nothing over the prefix, or a non-text predicate
	// with no AND-related text predicate.
	if node.indexable_on_own_path() {
		let Some(tag) = node.tag_mut() else {
			fail!("Leaf {} has no relevance tag", node);
		};
		tag.remove_index(position);
		return Ok(());
	}

	// Negations cannot contribute to the conjunction requirement.
	if matches!(node.kind(), MatchKind::Not | MatchKind::Nor) {
		return Ok(());
	}

	if node.kind() != MatchKind::And {
		for child in node.children_mut() {
			strip_for_index(child, position, prefix_paths)?;
		}
		return Ok(());
	}

	// A conjunction satisfies the requirement when a text predicate is
	// assigned to the index and every prefix path is covered by another
	// assigned child. Children assigned at a suffix position erase nothing,
	// since a suffix path is not a prefix path.
	let mut has_text = false;
	let mut remaining = prefix_paths.clone();
	for child in node.children_mut() {
		let assigned = child.tag().is_some_and(|tag| tag.references(position));
		if assigned {
			if child.kind() == MatchKind::Text {
				has_text = true;
			} else {
				remaining.remove(child.path());
			}
		} else {
			// The child may be hiding deeper assignments that this
			// conjunction will not satisfy.
			strip_for_index(child, position, prefix_paths)?;
		}
	}

	if !has_text || !remaining.is_empty() {
		for child in node.children_mut() {
			strip_for_index(child, position, prefix_paths)?;
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use crate::catalog::KeyPatternElt;
	use crate::idx::planner::tree::rate;

	use super::*;

	fn compound_text_index() -> IndexDefinition {
		IndexDefinition::new(
			IndexType::Text,
			vec![KeyPatternElt::sorted("a"), KeyPatternElt::special("_fts", "text")],
		)
	}

	fn rate_and_strip(tree: &mut MatchExpression, indexes: &[IndexDefinition]) {
		rate(tree, "", indexes).unwrap();
		strip_invalid_assignments(tree, indexes).unwrap();
	}

	#[test]
	fn test_satisfied_conjunction_keeps_assignments() {
		let indexes = vec![compound_text_index()];
		let mut tree = MatchExpression::and(vec![
			MatchExpression::eq("a", json!(1)),
			MatchExpression::text_search("hi"),
		]);
		rate_and_strip(&mut tree, &indexes);
		assert!(tree.children()[0].tag().unwrap().references(0));
		assert!(tree.children()[1].tag().unwrap().references(0));
	}

	#[test]
	fn test_lone_text_predicate_is_stripped() {
		let indexes = vec![compound_text_index()];
		let mut tree = MatchExpression::text_search("hi");
		rate_and_strip(&mut tree, &indexes);
		assert!(!tree.tag().unwrap().references(0));
	}

	#[test]
	fn test_missing_prefix_equality_strips_conjunction() {
		let indexes = vec![compound_text_index()];
		let mut tree = MatchExpression::and(vec![
			MatchExpression::eq("b", json!(1)),
			MatchExpression::text_search("hi"),
		]);
		rate_and_strip(&mut tree, &indexes);
		assert!(!tree.children()[1].tag().unwrap().references(0));
	}

	#[test]
	fn test_prefix_equality_in_disjunction_does_not_count() {
		let indexes = vec![compound_text_index()];
		let mut tree = MatchExpression::or(vec![
			MatchExpression::eq("a", json!(1)),
			MatchExpression::text_search("hi"),
		]);
		rate_and_strip(&mut tree, &indexes);
		assert!(!tree.children()[0].tag().unwrap().references(0));
		assert!(!tree.children()[1].tag().unwrap().references(0));
	}

	#[test]
	fn test_text_predicate_without_prefix_index_is_untouched() {
		// A text index with no prefix imposes no structural requirement.
		let indexes = vec![IndexDefinition::new(
			IndexType::Text,
			vec![KeyPatternElt::special("_fts", "text")],
		)];
		let mut tree = MatchExpression::text_search("hi");
		rate_and_strip(&mut tree, &indexes);
		assert!(tree.tag().unwrap().references(0));
	}

	#[test]
	fn test_multiple_prefix_fields_all_required() {
		let indexes = vec![IndexDefinition::new(
			IndexType::Text,
			vec![
				KeyPatternElt::sorted("a"),
				KeyPatternElt::sorted("b"),
				KeyPatternElt::special("_fts", "text"),
			],
		)];
		let mut satisfied = MatchExpression::and(vec![
			MatchExpression::eq("a", json!(1)),
			MatchExpression::eq("b", json!(2)),
			MatchExpression::text_search("hi"),
		]);
		rate_and_strip(&mut satisfied, &indexes);
		assert!(satisfied.children()[2].tag().unwrap().references(0));

		let mut missing_one = MatchExpression::and(vec![
			MatchExpression::eq("a", json!(1)),
			MatchExpression::text_search("hi"),
		]);
		rate_and_strip(&mut missing_one, &indexes);
		assert!(!missing_one.children()[0].tag().unwrap().references(0));
		assert!(!missing_one.children()[1].tag().unwrap().references(0));
	}

	#[test]
	fn test_nested_assignments_are_scrubbed() {
		// The invalid assignment hides below a disjunction inside the AND.
		let indexes = vec![compound_text_index()];
		let mut tree = MatchExpression::and(vec![
			MatchExpression::or(vec![MatchExpression::text_search("hi")]),
			MatchExpression::eq("b", json!(1)),
		]);
		rate_and_strip(&mut tree, &indexes);
		let inner = &tree.children()[0].children()[0];
		assert!(!inner.tag().unwrap().references(0));
	}

	#[test]
	fn test_negations_are_opaque_to_the_strip_pass() {
		// A negation over a prefix field rates as a suffix assignment (its
		// own path is empty), erases nothing from the prefix set, and the
		// failure sweep stops at the negation without stripping its tag.
		let indexes = vec![compound_text_index()];
		let mut tree = MatchExpression::and(vec![
			MatchExpression::not(MatchExpression::eq("a", json!(1))),
			MatchExpression::text_search("hi"),
		]);
		rate_and_strip(&mut tree, &indexes);
		let negation = &tree.children()[0];
		assert!(negation.tag().unwrap().references(0));
		assert!(negation.children()[0].tag().unwrap().references(0));
		// The conjunction still fails the prefix requirement, so the text
		// predicate loses its assignment.
		assert!(!tree.children()[1].tag().unwrap().references(0));
	}

	#[test]
	fn test_malformed_text_index_fails() {
		let indexes = vec![IndexDefinition::new(
			IndexType::Text,
			vec![KeyPatternElt::sorted("a")],
		)];
		let mut tree = MatchExpression::eq("a", json!(1));
		rate(&mut tree, "", &indexes).unwrap();
		assert!(strip_invalid_assignments(&mut tree, &indexes).is_err());
	}
}
