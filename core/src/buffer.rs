//! Dense trajectory buffer with keyed lookup.
//!
//! The integrators append one [`Sample`] per step in strictly
//! increasing time order. Lookups may be keyed by any component even
//! though only time is globally monotone; bisection picks its
//! comparison direction from the end samples, which is correct for the
//! quasi-monotone trajectory keys over a flight envelope, and the
//! hinted [`TrajectoryBuffer::get_at`] scan handles the rest.

use crate::error::{EngineError, Result};
use crate::interp::{sample_at_key, sample_at_slant_height};
use crate::model::{InterpKey, Sample};

/// Capacity after the first growth; subsequent growths double.
const INITIAL_CAPACITY: usize = 64;

/// A keyed value this close to a stored sample's key returns the stored
/// sample unchanged.
const KEY_MATCH_EPSILON: f64 = 1e-9;

/// Growable, exclusively owned buffer of trajectory samples.
#[derive(Debug, Default)]
pub struct TrajectoryBuffer {
	samples: Vec<Sample>,
}

impl TrajectoryBuffer {
	/// An empty buffer; no allocation until the first append.
	#[must_use]
	pub const fn new() -> Self {
		Self { samples: Vec::new() }
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.samples.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.samples.is_empty()
	}

	#[must_use]
	pub fn as_slice(&self) -> &[Sample] {
		&self.samples
	}

	#[must_use]
	pub fn first(&self) -> Option<&Sample> {
		self.samples.first()
	}

	#[must_use]
	pub fn last(&self) -> Option<&Sample> {
		self.samples.last()
	}

	/// Append a sample, growing capacity by doubling (from
	/// [`INITIAL_CAPACITY`] on the first growth).
	///
	/// # Errors
	///
	/// Fails with a memory error when the allocator refuses the grown
	/// block; the buffer is unchanged in that case.
	pub fn append(&mut self, sample: Sample) -> Result<()> {
		let len = self.samples.len();
		if len == self.samples.capacity() {
			let target = if len == 0 { INITIAL_CAPACITY } else { len * 2 };
			self.samples
				.try_reserve_exact(target - len)
				.map_err(|_| EngineError::Memory(target))?;
		}
		self.samples.push(sample);
		Ok(())
	}

	/// Indexed access with negative indexing from the end
	/// (`get(-1)` is the last sample).
	///
	/// # Errors
	///
	/// Fails with an index error when the translated index is out of
	/// bounds.
	#[allow(clippy::cast_possible_wrap)]
	pub fn get(&self, index: isize) -> Result<&Sample> {
		let len = self.samples.len();
		let resolved = if index < 0 {
			index + len as isize
		} else {
			index
		};
		usize::try_from(resolved)
			.ok()
			.and_then(|i| self.samples.get(i))
			.ok_or(EngineError::Index { index, len })
	}

	/// Binary-search a center index for 3-point interpolation at
	/// `key == v`, clamped to `[1, n-2]`. The comparison direction is
	/// chosen from the first and last samples.
	///
	/// # Errors
	///
	/// Fails with a value error when fewer than three samples are
	/// stored.
	pub fn bisect_center(&self, key: InterpKey, v: f64) -> Result<usize> {
		self.require_interpolable()?;
		Ok(self.bisect_by(v, |s| key.value_of(s)))
	}

	/// [`Self::bisect_center`] for the derived slant-height key.
	///
	/// # Errors
	///
	/// Fails with a value error when fewer than three samples are
	/// stored.
	pub fn bisect_center_slant(
		&self,
		look_cosine: f64,
		look_sine: f64,
		v: f64,
	) -> Result<usize> {
		self.require_interpolable()?;
		Ok(self.bisect_by(v, |s| s.slant_height(look_cosine, look_sine)))
	}

	/// Interpolate a full sample at `key == v` from the three samples
	/// around `center`.
	///
	/// # Errors
	///
	/// Fails with a value error on fewer than three samples or on
	/// coincident key values in the support window, and with an index
	/// error when `center` is not in `[1, n-2]`.
	#[allow(clippy::cast_possible_wrap)]
	pub fn interpolate_at(&self, center: usize, key: InterpKey, v: f64) -> Result<Sample> {
		self.require_interpolable()?;
		let n = self.samples.len();
		if center < 1 || center > n - 2 {
			return Err(EngineError::Index {
				index: center as isize,
				len: n,
			});
		}
		sample_at_key(
			key,
			v,
			&self.samples[center - 1],
			&self.samples[center],
			&self.samples[center + 1],
		)
	}

	/// Look up (or interpolate) the sample where `key == v`.
	///
	/// With a positive `start_from_time` hint and a non-time key, the
	/// buffer is scanned linearly from the first sample at or past the
	/// hint, forward then backward, for a bracket containing `v`; the
	/// bracket's upper sample is the target. Without a hint (or for
	/// the time key) the target comes from [`Self::bisect_center`].
	/// A target whose key value is within 1e-9 of `v` is returned
	/// unchanged; anything else is interpolated.
	///
	/// # Errors
	///
	/// Fails with an input error on an empty buffer, and with a value
	/// error on fewer than three samples or coincident support keys.
	pub fn get_at(
		&self,
		key: InterpKey,
		v: f64,
		start_from_time: Option<f64>,
	) -> Result<Sample> {
		if self.samples.is_empty() {
			return Err(EngineError::Input("trajectory buffer"));
		}
		self.require_interpolable()?;
		let n = self.samples.len();

		let hinted = match start_from_time {
			Some(t0) if t0 > 0.0 && key != InterpKey::Time => {
				self.scan_bracket(key, v, t0)
			}
			_ => None,
		};
		let target = match hinted {
			Some(i) => i,
			None => self.bisect_by(v, |s| key.value_of(s)),
		};

		let sample = &self.samples[target];
		if (key.value_of(sample) - v).abs() < KEY_MATCH_EPSILON {
			return Ok(*sample);
		}
		self.interpolate_at(target.clamp(1, n - 2), key, v)
	}

	/// [`Self::get_at`] for the derived slant-height key
	/// `py·cos(look) − px·sin(look)`.
	///
	/// # Errors
	///
	/// Fails with an input error on an empty buffer, and with a value
	/// error on fewer than three samples or coincident support keys.
	pub fn get_at_slant_height(&self, look_angle: f64, v: f64) -> Result<Sample> {
		if self.samples.is_empty() {
			return Err(EngineError::Input("trajectory buffer"));
		}
		let (look_sine, look_cosine) = look_angle.sin_cos();
		let target = self.bisect_center_slant(look_cosine, look_sine, v)?;

		let sample = &self.samples[target];
		if (sample.slant_height(look_cosine, look_sine) - v).abs() < KEY_MATCH_EPSILON {
			return Ok(*sample);
		}
		let n = self.samples.len();
		let center = target.clamp(1, n - 2);
		sample_at_slant_height(
			look_cosine,
			look_sine,
			v,
			&self.samples[center - 1],
			&self.samples[center],
			&self.samples[center + 1],
		)
	}

	fn require_interpolable(&self) -> Result<()> {
		let n = self.samples.len();
		if n < 3 {
			return Err(EngineError::value(format!(
				"need at least 3 samples for cubic interpolation, got {n}"
			)));
		}
		Ok(())
	}

	fn bisect_by(&self, v: f64, keyed: impl Fn(&Sample) -> f64) -> usize {
		let n = self.samples.len();
		let ascending = keyed(&self.samples[n - 1]) >= keyed(&self.samples[0]);
		let idx = if ascending {
			self.samples.partition_point(|s| keyed(s) < v)
		} else {
			self.samples.partition_point(|s| keyed(s) > v)
		};
		idx.clamp(1, n - 2)
	}

	/// Linear scan for a bracket `[key_i, key_{i+1}]` containing `v`,
	/// starting from the first sample at or past `t0`: forward first,
	/// then backward. Returns the upper index of the bracket.
	fn scan_bracket(&self, key: InterpKey, v: f64, t0: f64) -> Option<usize> {
		let n = self.samples.len();
		let start = self
			.samples
			.partition_point(|s| s.time < t0)
			.min(n - 1);

		let contains = |i: usize| {
			let a = key.value_of(&self.samples[i]);
			let b = key.value_of(&self.samples[i + 1]);
			(a - v) * (b - v) <= 0.0
		};
		(start..n - 1)
			.find(|&i| contains(i))
			.or_else(|| (0..start).rev().find(|&i| contains(i)))
			.map(|i| i + 1)
	}
}
