//! Error types, stable error codes, and the per-engine diagnostics stack.
//!
//! Two tiers: leaf routines return [`EngineError`] and never panic; the
//! engine records a [`Frame`] for each failure it sees and decides whether
//! to recover (benign range terminations) or surface the error.

use thiserror::Error;

/// Result type alias using the engine error type.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Stable integer error enumeration shared with embedders.
///
/// Everything at or above [`RANGE_ERROR_SENTINEL`] is a benign range
/// termination, so callers can test `code as i32 >= RANGE_ERROR_SENTINEL`
/// to recognise an integration that simply stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
	NoError = 0,
	Input = 1,
	Value = 2,
	/// Reserved: lookup keys are a closed enum in this crate, so an
	/// unknown-key failure is unconstructible, but the code stays in the
	/// numbering for embedders.
	Key = 3,
	Index = 4,
	Memory = 5,
	Runtime = 6,
	ZeroFinding = 7,
	RangeMinimumVelocity = 8,
	RangeMaximumDrop = 9,
	RangeMinimumAltitude = 10,
	RangeInvalidParameter = 11,
}

/// First of the benign range-termination codes.
pub const RANGE_ERROR_SENTINEL: i32 = ErrorCode::RangeMinimumVelocity as i32;

impl ErrorCode {
	/// Whether this code is a benign range termination.
	#[must_use]
	pub const fn is_range(self) -> bool {
		self as i32 >= RANGE_ERROR_SENTINEL
	}
}

/// Errors surfaced by the trajectory core.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
	/// Null or empty input where data was required.
	#[error("empty or missing input: {0}")]
	Input(&'static str),

	/// A value failed validation (insufficient length, duplicate
	/// abscissae, out-of-range parameter).
	#[error("{0}")]
	Value(String),

	/// Index out of bounds after negative-index translation.
	#[error("index {index} out of bounds for length {len}")]
	Index { index: isize, len: usize },

	/// Buffer growth failed.
	#[error("buffer growth failed at capacity {0}")]
	Memory(usize),

	/// An operation could not produce its result from otherwise valid
	/// inputs (e.g. no apex present in the integrated data).
	#[error("{0}")]
	Runtime(String),

	/// Iterative search did not converge.
	#[error("zero finding did not converge: {0}")]
	ZeroFinding(String),

	/// A parameter precondition of a range operation failed.
	#[error("invalid parameter: {0}")]
	InvalidParameter(&'static str),
}

impl EngineError {
	/// Value error from a formatted message.
	pub fn value(msg: impl Into<String>) -> Self {
		Self::Value(msg.into())
	}

	/// Runtime error from a formatted message.
	pub fn runtime(msg: impl Into<String>) -> Self {
		Self::Runtime(msg.into())
	}

	/// The stable code for this error.
	#[must_use]
	pub const fn code(&self) -> ErrorCode {
		match self {
			Self::Input(_) => ErrorCode::Input,
			Self::Value(_) => ErrorCode::Value,
			Self::Index { .. } => ErrorCode::Index,
			Self::Memory(_) => ErrorCode::Memory,
			Self::Runtime(_) => ErrorCode::Runtime,
			Self::ZeroFinding(_) => ErrorCode::ZeroFinding,
			Self::InvalidParameter(_) => ErrorCode::RangeInvalidParameter,
		}
	}
}

/// Why an integration loop stopped.
///
/// Every variant is non-fatal: the buffer contents up to the stop point
/// remain valid and usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
	/// The requested range limit was passed.
	RangeLimit,
	/// Relative speed fell below the configured minimum velocity.
	MinimumVelocity,
	/// The projectile dropped below the configured maximum-drop ceiling.
	MaximumDrop,
	/// The projectile descended below the configured minimum altitude.
	MinimumAltitude,
}

impl Termination {
	/// The stable code for this termination reason.
	#[must_use]
	pub const fn code(self) -> ErrorCode {
		match self {
			Self::RangeLimit => ErrorCode::NoError,
			Self::MinimumVelocity => ErrorCode::RangeMinimumVelocity,
			Self::MaximumDrop => ErrorCode::RangeMaximumDrop,
			Self::MinimumAltitude => ErrorCode::RangeMinimumAltitude,
		}
	}
}

impl std::fmt::Display for Termination {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			Self::RangeLimit => "range limit reached",
			Self::MinimumVelocity => "minimum velocity reached",
			Self::MaximumDrop => "maximum drop reached",
			Self::MinimumAltitude => "minimum altitude reached",
		};
		f.write_str(s)
	}
}

/// Maximum number of retained diagnostic frames.
pub const ERROR_STACK_DEPTH: usize = 16;

/// One diagnostic frame recorded at a failure site.
#[derive(Debug, Clone)]
pub struct Frame {
	pub code: ErrorCode,
	/// Component tag, e.g. `"buffer"` or `"engine"`.
	pub source: &'static str,
	pub func: &'static str,
	pub file: &'static str,
	pub line: u32,
	pub msg: String,
}

/// Bounded stack of diagnostic frames.
///
/// Cleared at the start of each public engine operation; when full, the
/// newest frame replaces the most recent one (last wins).
#[derive(Debug, Default)]
pub struct ErrorStack {
	frames: Vec<Frame>,
}

impl ErrorStack {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn clear(&mut self) {
		self.frames.clear();
	}

	pub fn push(&mut self, frame: Frame) {
		if self.frames.len() == ERROR_STACK_DEPTH {
			self.frames.pop();
		}
		self.frames.push(frame);
	}

	#[must_use]
	pub fn last(&self) -> Option<&Frame> {
		self.frames.last()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.frames.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.frames.is_empty()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
		self.frames.iter()
	}
}

/// Record a diagnostic frame with a formatted message, capturing the
/// call site's file and line.
#[macro_export]
macro_rules! push_frame {
	($stack:expr, $code:expr, $source:expr, $func:expr, $($arg:tt)+) => {
		$stack.push($crate::error::Frame {
			code: $code,
			source: $source,
			func: $func,
			file: file!(),
			line: line!(),
			msg: format!($($arg)+),
		})
	};
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_range_sentinel() {
		assert!(ErrorCode::RangeMinimumVelocity.is_range());
		assert!(ErrorCode::RangeMaximumDrop.is_range());
		assert!(ErrorCode::RangeMinimumAltitude.is_range());
		assert!(ErrorCode::RangeInvalidParameter.is_range());
		assert!(!ErrorCode::Runtime.is_range());
		assert!(!ErrorCode::NoError.is_range());
	}

	#[test]
	fn test_stack_last_wins_when_full() {
		let mut stack = ErrorStack::new();
		for i in 0..20 {
			push_frame!(stack, ErrorCode::Value, "test", "test_stack", "frame {i}");
		}
		assert_eq!(stack.len(), ERROR_STACK_DEPTH);
		assert_eq!(stack.last().unwrap().msg, "frame 19");
	}

	#[test]
	fn test_termination_codes_are_benign() {
		for term in [
			Termination::MinimumVelocity,
			Termination::MaximumDrop,
			Termination::MinimumAltitude,
		] {
			assert!(term.code().is_range());
		}
		assert_eq!(Termination::RangeLimit.code(), ErrorCode::NoError);
	}
}
