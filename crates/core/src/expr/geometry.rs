//! Geometry operands of geo predicates.
//!
//! The filter parser builds these from the query document. The planner only
//! needs to know which reference frames a shape can answer queries in, so
//! the shapes themselves stay opaque apart from the spherical cap, whose
//! coordinates drive the flat-index wrap check.

use geo::Point;
use serde::{Deserialize, Serialize};

/// How a geo predicate relates a field to its geometry operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeoOperator {
	/// The field's geometry must be contained in the operand
	Within,
	/// The field's geometry must intersect the operand
	Intersects,
}

/// A geodesic disk: center in degrees of longitude and latitude, radius in
/// radians of arc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
	pub center: Point<f64>,
	pub radius: f64,
}

impl Circle {
	pub fn new(x: f64, y: f64, radius: f64) -> Self {
		Self {
			center: Point::new(x, y),
			radius,
		}
	}
}

/// The geometry operand of a geo predicate, classified by the regions it
/// can produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryContainer {
	/// A shape expressed in legacy flat coordinates: point, box, polygon or
	/// planar circle
	Flat,
	/// A GeoJSON shape indexable through a spherical cell covering
	Spherical,
	/// A spherical cap
	Cap(Circle),
}

impl GeometryContainer {
	/// Whether the shape can produce a spherical region
	pub fn has_s2_region(&self) -> bool {
		matches!(self, Self::Spherical | Self::Cap(_))
	}

	/// Whether the shape can produce a flat region
	pub fn has_flat_region(&self) -> bool {
		matches!(self, Self::Flat)
	}

	/// The underlying spherical cap, if the shape is one
	pub fn cap(&self) -> Option<&Circle> {
		match self {
			Self::Cap(circle) => Some(circle),
			_ => None,
		}
	}
}

/// A geo predicate: operator plus geometry operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPredicate {
	pub operator: GeoOperator,
	pub geometry: GeometryContainer,
}

impl GeoPredicate {
	pub fn within(geometry: GeometryContainer) -> Self {
		Self {
			operator: GeoOperator::Within,
			geometry,
		}
	}

	pub fn intersects(geometry: GeometryContainer) -> Self {
		Self {
			operator: GeoOperator::Intersects,
			geometry,
		}
	}
}

/// Coordinate reference system of a near query's centroid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crs {
	Flat,
	Sphere,
}

/// A proximity predicate: centroid, its reference frame, and whether the
/// query was phrased as a spherical-distance search over legacy coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearPredicate {
	pub centroid: Point<f64>,
	pub crs: Crs,
	pub near_sphere: bool,
}

impl NearPredicate {
	/// A near query over flat coordinates
	pub fn flat(x: f64, y: f64) -> Self {
		Self {
			centroid: Point::new(x, y),
			crs: Crs::Flat,
			near_sphere: false,
		}
	}

	/// A near query over a GeoJSON point
	pub fn sphere(x: f64, y: f64) -> Self {
		Self {
			centroid: Point::new(x, y),
			crs: Crs::Sphere,
			near_sphere: false,
		}
	}

	/// A spherical-distance near query over legacy coordinates
	pub fn near_sphere(x: f64, y: f64) -> Self {
		Self {
			centroid: Point::new(x, y),
			crs: Crs::Flat,
			near_sphere: true,
		}
	}
}
