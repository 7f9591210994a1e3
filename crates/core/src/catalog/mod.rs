//! Index catalog definitions.
//!
//! The catalog provider discovers these from collection metadata; the
//! planner treats them as immutable inputs. A key pattern is an ordered
//! sequence of fields, each either an ordinary sorted key or a specialty
//! key named by its plugin string.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The access method behind an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexType {
	Btree,
	Hashed,
	Geo2d,
	Geo2dSphere,
	Text,
	GeoHaystack,
}

/// The declared value of one key pattern element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KeyValue {
	/// Ordinary sorted key: `1` ascending, `-1` descending
	Sorted(i32),
	/// Specialty key named by its plugin string, e.g. `"2d"` or `"text"`
	Special(String),
}

/// One element of an index key pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPatternElt {
	pub field: String,
	pub value: KeyValue,
}

impl KeyPatternElt {
	/// An ascending sorted key element
	pub fn sorted(field: impl Into<String>) -> Self {
		Self {
			field: field.into(),
			value: KeyValue::Sorted(1),
		}
	}

	/// A specialty key element
	pub fn special(field: impl Into<String>, plugin: impl Into<String>) -> Self {
		Self {
			field: field.into(),
			value: KeyValue::Special(plugin.into()),
		}
	}

	/// Whether the declared value is a plugin string
	pub fn is_special(&self) -> bool {
		matches!(self.value, KeyValue::Special(_))
	}
}

impl fmt::Display for KeyPatternElt {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.value {
			KeyValue::Sorted(direction) => write!(f, "{{{}: {}}}", self.field, direction),
			KeyValue::Special(plugin) => write!(f, "{{{}: \"{}\"}}", self.field, plugin),
		}
	}
}

/// The definition of one index, as discovered from collection metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDefinition {
	pub index_type: IndexType,
	pub key_pattern: Vec<KeyPatternElt>,
	/// Documents missing an indexed field are absent from a sparse index
	pub sparse: bool,
	/// Keys may expand per array element of an indexed field
	pub multikey: bool,
	/// Auxiliary configuration carried by the index definition, e.g. hash
	/// conversion parameters of flat geo indexes
	pub info: BTreeMap<String, Value>,
}

impl IndexDefinition {
	pub fn new(index_type: IndexType, key_pattern: Vec<KeyPatternElt>) -> Self {
		Self {
			index_type,
			key_pattern,
			sparse: false,
			multikey: false,
			info: BTreeMap::new(),
		}
	}

	/// An ordinary sorted index over the given fields, ascending
	pub fn btree(fields: &[&str]) -> Self {
		Self::new(IndexType::Btree, fields.iter().map(|f| KeyPatternElt::sorted(*f)).collect())
	}

	pub fn sparse(mut self) -> Self {
		self.sparse = true;
		self
	}

	pub fn multikey(mut self) -> Self {
		self.multikey = true;
		self
	}

	pub fn with_info(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.info.insert(name.into(), value.into());
		self
	}

	/// Reads a numeric configuration parameter, falling back to `default`
	/// when absent or non-numeric
	pub fn info_num_or(&self, name: &str, default: f64) -> f64 {
		self.info.get(name).and_then(Value::as_f64).unwrap_or(default)
	}

	/// The effective type of a key pattern element within this index.
	///
	/// Historically an index could be declared with an arbitrary string as a
	/// key value and still be served by the ordinary sorted access method.
	/// The plugin string is therefore only believed when the index's own
	/// type is not ordinary sorted; otherwise the element is treated as a
	/// plain sorted key.
	pub fn effective_key_type<'a>(&self, elt: &'a KeyPatternElt) -> &'a str {
		match &elt.value {
			KeyValue::Special(plugin) if self.index_type != IndexType::Btree => plugin,
			_ => "",
		}
	}
}
