//! Trajectory data model.
//!
//! These types flow between the integrators, the dense buffer, and the
//! event filter: one dense [`Sample`] per integration step, the
//! [`InterpKey`] naming which component drives a lookup, the
//! [`TrajFlag`] event bitset, and the flagged [`TrajectoryRecord`] rows
//! the filter emits.

use serde::{Deserialize, Serialize};

use crate::vector::V3;

/// Two records closer than this in time are merged into one by OR-ing
/// their flags.
pub const SEPARATE_ROW_TIME_DELTA: f64 = 1e-9;

/// One row of the dense trajectory sequence.
///
/// Units: seconds, feet, feet/second; `mach` is the projectile speed
/// over the local speed of sound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
	pub time: f64,
	pub px: f64,
	pub py: f64,
	pub pz: f64,
	pub vx: f64,
	pub vy: f64,
	pub vz: f64,
	pub mach: f64,
}

impl Sample {
	#[must_use]
	pub const fn position(&self) -> V3 {
		V3::new(self.px, self.py, self.pz)
	}

	#[must_use]
	pub const fn velocity(&self) -> V3 {
		V3::new(self.vx, self.vy, self.vz)
	}

	#[must_use]
	pub fn speed(&self) -> f64 {
		self.velocity().magnitude()
	}

	/// Height above the line of sight, `py·cos(look) − px·sin(look)`.
	///
	/// Computed on the fly; no sample field stores it.
	#[must_use]
	pub fn slant_height(&self, look_cosine: f64, look_sine: f64) -> f64 {
		self.py * look_cosine - self.px * look_sine
	}
}

/// Which sample component drives a lookup or bisection.
///
/// The derived slant-height pseudo-key has no variant here because no
/// field stores it; the buffer exposes a parallel `(cos, sin)` API for
/// it instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpKey {
	Time,
	Mach,
	PosX,
	PosY,
	PosZ,
	VelX,
	VelY,
	VelZ,
}

impl InterpKey {
	/// Every key, in sample field order.
	pub const ALL: [Self; 8] = [
		Self::Time,
		Self::PosX,
		Self::PosY,
		Self::PosZ,
		Self::VelX,
		Self::VelY,
		Self::VelZ,
		Self::Mach,
	];

	/// Read the keyed component from a sample.
	#[must_use]
	pub const fn value_of(self, s: &Sample) -> f64 {
		match self {
			Self::Time => s.time,
			Self::Mach => s.mach,
			Self::PosX => s.px,
			Self::PosY => s.py,
			Self::PosZ => s.pz,
			Self::VelX => s.vx,
			Self::VelY => s.vy,
			Self::VelZ => s.vz,
		}
	}

	/// Write the keyed component of a sample.
	pub const fn set(self, s: &mut Sample, v: f64) {
		match self {
			Self::Time => s.time = v,
			Self::Mach => s.mach = v,
			Self::PosX => s.px = v,
			Self::PosY => s.py = v,
			Self::PosZ => s.pz = v,
			Self::VelX => s.vx = v,
			Self::VelY => s.vy = v,
			Self::VelZ => s.vz = v,
		}
	}
}

/// Event flag bitset attached to filter output records.
#[derive(Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrajFlag(u32);

impl TrajFlag {
	pub const NONE: Self = Self(0);
	/// Row emitted by distance or time stepping.
	pub const RANGE: Self = Self(1);
	/// Upward crossing of the line of sight.
	pub const ZERO_UP: Self = Self(1 << 1);
	/// Downward crossing of the line of sight.
	pub const ZERO_DOWN: Self = Self(1 << 2);
	/// Mach 1 crossing.
	pub const MACH: Self = Self(1 << 3);
	/// Highest point of the trajectory.
	pub const APEX: Self = Self(1 << 4);
	/// Maximum-ranging-trajectory waypoint. Carried through masks and
	/// merges; never produced by this core.
	pub const MRT: Self = Self(1 << 5);
	/// Either crossing of the line of sight.
	pub const ZERO: Self = Self(Self::ZERO_UP.0 | Self::ZERO_DOWN.0);

	#[must_use]
	pub const fn bits(self) -> u32 {
		self.0
	}

	/// All bits of `other` are set in `self`.
	#[must_use]
	pub const fn contains(self, other: Self) -> bool {
		self.0 & other.0 == other.0
	}

	/// At least one bit of `other` is set in `self`.
	#[must_use]
	pub const fn intersects(self, other: Self) -> bool {
		self.0 & other.0 != 0
	}

	#[must_use]
	pub const fn is_empty(self) -> bool {
		self.0 == 0
	}

	pub const fn insert(&mut self, other: Self) {
		self.0 |= other.0;
	}

	pub const fn remove(&mut self, other: Self) {
		self.0 &= !other.0;
	}
}

impl std::ops::BitOr for TrajFlag {
	type Output = Self;

	fn bitor(self, rhs: Self) -> Self {
		Self(self.0 | rhs.0)
	}
}

impl std::ops::BitOrAssign for TrajFlag {
	fn bitor_assign(&mut self, rhs: Self) {
		self.0 |= rhs.0;
	}
}

impl std::ops::BitAnd for TrajFlag {
	type Output = Self;

	fn bitand(self, rhs: Self) -> Self {
		Self(self.0 & rhs.0)
	}
}

impl std::fmt::Debug for TrajFlag {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.is_empty() {
			return f.write_str("NONE");
		}
		let names = [
			(Self::RANGE, "RANGE"),
			(Self::ZERO_UP, "ZERO_UP"),
			(Self::ZERO_DOWN, "ZERO_DOWN"),
			(Self::MACH, "MACH"),
			(Self::APEX, "APEX"),
			(Self::MRT, "MRT"),
		];
		let mut first = true;
		for (bit, name) in names {
			if self.intersects(bit) {
				if !first {
					f.write_str("|")?;
				}
				f.write_str(name)?;
				first = false;
			}
		}
		Ok(())
	}
}

/// One filter output row: a sample plus the events detected at it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRecord {
	pub sample: Sample,
	pub flag: TrajFlag,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_zero_is_union_of_crossings() {
		assert_eq!(TrajFlag::ZERO, TrajFlag::ZERO_UP | TrajFlag::ZERO_DOWN);
		assert!(TrajFlag::ZERO.contains(TrajFlag::ZERO_UP));
		assert!(TrajFlag::ZERO.contains(TrajFlag::ZERO_DOWN));
		assert!(!TrajFlag::ZERO.contains(TrajFlag::MACH));
	}

	#[test]
	fn test_insert_remove() {
		let mut f = TrajFlag::RANGE;
		f.insert(TrajFlag::APEX);
		assert!(f.contains(TrajFlag::RANGE | TrajFlag::APEX));
		f.remove(TrajFlag::RANGE);
		assert_eq!(f, TrajFlag::APEX);
	}

	#[test]
	fn test_flag_debug_names() {
		let f = TrajFlag::RANGE | TrajFlag::MACH;
		assert_eq!(format!("{f:?}"), "RANGE|MACH");
		assert_eq!(format!("{:?}", TrajFlag::NONE), "NONE");
	}

	#[test]
	fn test_key_roundtrip() {
		let mut s = Sample::default();
		for key in [
			InterpKey::Time,
			InterpKey::Mach,
			InterpKey::PosX,
			InterpKey::PosY,
			InterpKey::PosZ,
			InterpKey::VelX,
			InterpKey::VelY,
			InterpKey::VelZ,
		] {
			key.set(&mut s, 7.5);
			assert!((key.value_of(&s) - 7.5).abs() < f64::EPSILON);
			key.set(&mut s, 0.0);
		}
	}

	#[test]
	fn test_slant_height_zero_look() {
		let s = Sample { py: 3.0, px: 100.0, ..Sample::default() };
		assert!((s.slant_height(1.0, 0.0) - 3.0).abs() < 1e-12);
	}
}
