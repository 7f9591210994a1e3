//! Geodesic helpers for rating geo predicates against flat indexes.
//!
//! A flat geo index hashes coordinates over a bounded plane, so it cannot
//! answer a spherical cap query whose scan region would wrap the ±180°
//! meridian or cross a pole. The helpers here reproduce the scan-region
//! bound used by the index's hash converter.

use crate::catalog::IndexDefinition;
use crate::expr::Circle;

/// Hash conversion parameters of a flat geo index, as declared on the index
/// or defaulted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct HashConverter {
	bits: u32,
	scaling: f64,
}

impl HashConverter {
	pub(super) fn from_index(index: &IndexDefinition) -> Self {
		let bits = index.info_num_or("bits", 26.0) as u32;
		let max = index.info_num_or("max", 180.0);
		let min = index.info_num_or("min", -180.0);
		let buckets = 1024.0 * 1024.0 * 1024.0 * 4.0;
		Self {
			bits,
			scaling: buckets / (max - min),
		}
	}

	/// Worst-case positional error of a hashed location, in degrees: the
	/// diagonal of one hash cell at the configured precision, plus a
	/// thousandth of a cell as epsilon.
	fn error(&self) -> f64 {
		let cell = 2f64.powi(32 - self.bits as i32) / self.scaling;
		let epsilon = cell * 0.001;
		std::f64::consts::SQRT_2 * cell + epsilon
	}

	/// The positional error expressed in radians of arc
	pub(super) fn error_sphere(&self) -> f64 {
		self.error().to_radians()
	}
}

/// Widens a north-south scan distance into the east-west scan distance
/// needed at latitude `y`, both in degrees. Meridians converge away from
/// the equator, so covering the same ground distance takes more longitude;
/// the correction uses the scan edge closest to a pole, clamped to ±89° to
/// keep the cosine away from zero.
pub(super) fn x_scan_distance(y: f64, y_scan: f64) -> f64 {
	y_scan
		/ f64::min(
			(y + y_scan).min(89.0).to_radians().cos(),
			(y - y_scan).max(-89.0).to_radians().cos(),
		)
}

/// Whether a spherical cap's scan region stays strictly inside the world
/// bounds of a flat index. Caps whose widened bounding box would touch the
/// ±180° meridian or a pole cannot be answered by the index.
pub(super) fn cap_wont_wrap(circle: &Circle, index: &IndexDefinition) -> bool {
	let converter = HashConverter::from_index(index);
	let y_scan = circle.radius.to_degrees() + converter.error_sphere();
	let x_scan = x_scan_distance(circle.center.y(), y_scan);
	circle.center.x() + x_scan < 180.0
		&& circle.center.x() - x_scan > -180.0
		&& circle.center.y() + y_scan < 90.0
		&& circle.center.y() - y_scan > -90.0
}
