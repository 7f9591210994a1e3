//! The parsed predicate tree the planner operates on.
//!
//! A [`MatchExpression`] is one node of the tree: a kind discriminator, an
//! optional field path, an operand payload, ordered children, and a mutable
//! tag slot the relevance pass writes into. The filter parser owns tree
//! construction; this crate only ever mutates the tag slots.

use std::fmt;

use serde_json::Value;

use crate::idx::planner::RelevantTag;

pub mod geometry;

pub use geometry::{Circle, Crs, GeoOperator, GeoPredicate, GeometryContainer, NearPredicate};

/// The kind of a match expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
	Eq,
	Lt,
	Lte,
	Gt,
	Gte,
	In,
	Exists,
	Regex,
	Mod,
	Type,
	Text,
	Geo,
	GeoNear,
	/// `$elemMatch` whose operand is a document of sub-predicates
	ElemMatchObject,
	/// `$all` whose operands are `$elemMatch` documents
	AllElemMatch,
	And,
	Or,
	Not,
	Nor,
	/// A predicate evaluated by running user code; never indexable
	Where,
}

impl MatchKind {
	fn label(&self) -> &'static str {
		match self {
			Self::Eq => "eq",
			Self::Lt => "lt",
			Self::Lte => "lte",
			Self::Gt => "gt",
			Self::Gte => "gte",
			Self::In => "in",
			Self::Exists => "exists",
			Self::Regex => "regex",
			Self::Mod => "mod",
			Self::Type => "type",
			Self::Text => "text",
			Self::Geo => "geo",
			Self::GeoNear => "geoNear",
			Self::ElemMatchObject => "elemMatch",
			Self::AllElemMatch => "all",
			Self::And => "and",
			Self::Or => "or",
			Self::Not => "not",
			Self::Nor => "nor",
			Self::Where => "where",
		}
	}
}

/// The operand a leaf predicate compares its field against.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
	None,
	Value(Value),
	Geo(GeoPredicate),
	Near(NearPredicate),
}

/// One node of a parsed predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchExpression {
	kind: MatchKind,
	path: String,
	operand: Operand,
	children: Vec<MatchExpression>,
	tag: Option<RelevantTag>,
}

impl MatchExpression {
	fn new(kind: MatchKind, path: impl Into<String>, operand: Operand) -> Self {
		Self {
			kind,
			path: path.into(),
			operand,
			children: Vec::new(),
			tag: None,
		}
	}

	fn composite(kind: MatchKind, path: impl Into<String>, children: Vec<Self>) -> Self {
		Self {
			kind,
			path: path.into(),
			operand: Operand::None,
			children,
			tag: None,
		}
	}

	pub fn eq(path: impl Into<String>, value: Value) -> Self {
		Self::new(MatchKind::Eq, path, Operand::Value(value))
	}

	pub fn lt(path: impl Into<String>, value: Value) -> Self {
		Self::new(MatchKind::Lt, path, Operand::Value(value))
	}

	pub fn lte(path: impl Into<String>, value: Value) -> Self {
		Self::new(MatchKind::Lte, path, Operand::Value(value))
	}

	pub fn gt(path: impl Into<String>, value: Value) -> Self {
		Self::new(MatchKind::Gt, path, Operand::Value(value))
	}

	pub fn gte(path: impl Into<String>, value: Value) -> Self {
		Self::new(MatchKind::Gte, path, Operand::Value(value))
	}

	pub fn in_list(path: impl Into<String>, values: Vec<Value>) -> Self {
		Self::new(MatchKind::In, path, Operand::Value(Value::Array(values)))
	}

	pub fn exists(path: impl Into<String>) -> Self {
		Self::new(MatchKind::Exists, path, Operand::None)
	}

	pub fn regex(path: impl Into<String>, pattern: impl Into<String>) -> Self {
		Self::new(MatchKind::Regex, path, Operand::Value(Value::String(pattern.into())))
	}

	pub fn modulo(path: impl Into<String>, divisor: i64, remainder: i64) -> Self {
		Self::new(MatchKind::Mod, path, Operand::Value(serde_json::json!([divisor, remainder])))
	}

	pub fn has_type(path: impl Into<String>, type_number: i64) -> Self {
		Self::new(MatchKind::Type, path, Operand::Value(Value::from(type_number)))
	}

	/// A full-text predicate. Text predicates always bind the reserved
	/// full-text field rather than a document field.
	pub fn text_search(query: impl Into<String>) -> Self {
		Self::new(MatchKind::Text, "_fts", Operand::Value(Value::String(query.into())))
	}

	pub fn geo(path: impl Into<String>, predicate: GeoPredicate) -> Self {
		Self::new(MatchKind::Geo, path, Operand::Geo(predicate))
	}

	pub fn geo_near(path: impl Into<String>, predicate: NearPredicate) -> Self {
		Self::new(MatchKind::GeoNear, path, Operand::Near(predicate))
	}

	pub fn elem_match(path: impl Into<String>, children: Vec<Self>) -> Self {
		Self::composite(MatchKind::ElemMatchObject, path, children)
	}

	pub fn all_elem_match(path: impl Into<String>, children: Vec<Self>) -> Self {
		Self::composite(MatchKind::AllElemMatch, path, children)
	}

	pub fn and(children: Vec<Self>) -> Self {
		Self::composite(MatchKind::And, "", children)
	}

	pub fn or(children: Vec<Self>) -> Self {
		Self::composite(MatchKind::Or, "", children)
	}

	pub fn not(child: Self) -> Self {
		Self::composite(MatchKind::Not, "", vec![child])
	}

	pub fn nor(children: Vec<Self>) -> Self {
		Self::composite(MatchKind::Nor, "", children)
	}

	pub fn where_clause(code: impl Into<String>) -> Self {
		Self::new(MatchKind::Where, "", Operand::Value(Value::String(code.into())))
	}

	pub fn kind(&self) -> MatchKind {
		self.kind
	}

	/// The node's local field path. Empty for composites and for the
	/// sentinel case of array operators with no local path.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// The comparison operand, for kinds that carry one
	pub fn value(&self) -> Option<&Value> {
		match &self.operand {
			Operand::Value(v) => Some(v),
			_ => None,
		}
	}

	pub fn geo_predicate(&self) -> Option<&GeoPredicate> {
		match &self.operand {
			Operand::Geo(g) => Some(g),
			_ => None,
		}
	}

	pub fn near_predicate(&self) -> Option<&NearPredicate> {
		match &self.operand {
			Operand::Near(n) => Some(n),
			_ => None,
		}
	}

	pub fn children(&self) -> &[MatchExpression] {
		&self.children
	}

	pub(crate) fn children_mut(&mut self) -> &mut [MatchExpression] {
		&mut self.children
	}

	/// The relevance tag attached by the rating pass, if any
	pub fn tag(&self) -> Option<&RelevantTag> {
		self.tag.as_ref()
	}

	pub(crate) fn tag_mut(&mut self) -> Option<&mut RelevantTag> {
		self.tag.as_mut()
	}

	pub(crate) fn set_tag(&mut self, tag: RelevantTag) {
		self.tag = Some(tag);
	}

	/// Whether an index over this node's own path can satisfy this node.
	///
	/// True for the bounds-generating leaf kinds with a non-empty path.
	/// Array operators that distribute an index over their children are
	/// excluded: they contribute through descent, not on their own field.
	pub fn indexable_on_own_path(&self) -> bool {
		if self.path.is_empty() {
			return false;
		}
		matches!(
			self.kind,
			MatchKind::Eq
				| MatchKind::Lt
				| MatchKind::Lte
				| MatchKind::Gt
				| MatchKind::Gte
				| MatchKind::In
				| MatchKind::Exists
				| MatchKind::Regex
				| MatchKind::Mod
				| MatchKind::Type
				| MatchKind::Text
				| MatchKind::Geo
				| MatchKind::GeoNear
		)
	}

	/// Whether this node distributes indexes over its children, pushing its
	/// own path onto theirs
	pub fn indexes_through_children(&self) -> bool {
		matches!(self.kind, MatchKind::ElemMatchObject | MatchKind::AllElemMatch)
	}

	/// Whether index scan bounds can be derived from this node: an indexable
	/// leaf, or a negation of one
	pub fn generates_bounds(&self) -> bool {
		if self.indexable_on_own_path() {
			return true;
		}
		self.kind == MatchKind::Not
			&& self.children.first().is_some_and(|c| c.indexable_on_own_path())
	}

	pub fn is_logical(&self) -> bool {
		matches!(self.kind, MatchKind::And | MatchKind::Or | MatchKind::Not | MatchKind::Nor)
	}
}

impl fmt::Display for MatchExpression {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.kind.label())?;
		if !self.path.is_empty() {
			write!(f, " {}", self.path)?;
		}
		if !self.children.is_empty() {
			write!(f, " [")?;
			for (i, child) in self.children.iter().enumerate() {
				if i > 0 {
					write!(f, ", ")?;
				}
				write!(f, "{}", child)?;
			}
			write!(f, "]")?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn test_leaf_indexability() {
		assert!(MatchExpression::eq("a", json!(5)).indexable_on_own_path());
		assert!(MatchExpression::gt("a.b", json!(1)).indexable_on_own_path());
		assert!(MatchExpression::text_search("hi").indexable_on_own_path());
		assert!(!MatchExpression::where_clause("this.a > 1").indexable_on_own_path());
		assert!(!MatchExpression::and(vec![]).indexable_on_own_path());
		// Array operators contribute through their children only.
		let em = MatchExpression::elem_match("a", vec![MatchExpression::eq("b", json!(7))]);
		assert!(!em.indexable_on_own_path());
		assert!(em.indexes_through_children());
	}

	#[test]
	fn test_negation_generates_bounds() {
		let not = MatchExpression::not(MatchExpression::eq("a", json!(3)));
		assert!(not.generates_bounds());
		assert!(not.is_logical());
		// A negated composite is logical but not bounds-generating.
		let not_and = MatchExpression::not(MatchExpression::and(vec![]));
		assert!(!not_and.generates_bounds());
	}

	#[test]
	fn test_empty_path_is_sentinel() {
		// An elemMatch nested under $all carries no local path.
		let inner = MatchExpression::elem_match("", vec![MatchExpression::eq("b", json!(1))]);
		assert!(inner.path().is_empty());
		assert!(inner.indexes_through_children());
		assert!(!inner.indexable_on_own_path());
	}

	#[test]
	fn test_display() {
		let expr = MatchExpression::and(vec![
			MatchExpression::eq("a", json!(1)),
			MatchExpression::text_search("hi"),
		]);
		assert_eq!(expr.to_string(), "and [eq a, text _fts]");
	}
}
