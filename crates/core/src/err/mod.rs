use std::panic::Location;

use thiserror::Error;

/// An error raised by the index selection core.
///
/// The core has no recoverable errors: its inputs are validated by the
/// collaborators that build them, so every variant here reports an internal
/// invariant that was broken. Callers should treat any of these as fatal for
/// the current planning attempt and discard the predicate tree.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
	/// The planner reached code that must never execute for well-formed inputs
	#[error("The query planner reached an unreachable state: {0}")]
	Unreachable(String),
}

impl Error {
	/// Creates an `Unreachable` error, capturing the caller's location
	#[track_caller]
	pub(crate) fn unreachable(message: impl std::fmt::Display) -> Self {
		let location = Location::caller();
		Self::Unreachable(format!("{}:{}: {}", location.file(), location.line(), message))
	}
}
