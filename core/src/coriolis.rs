//! Earth-rotation (Coriolis) effect in the shooter frame.
//!
//! With both latitude and azimuth known, the full local acceleration
//! `-2 Ω × v` is integrated per step. With only latitude known the
//! effect degrades to the flat-fire approximation, applied to finished
//! range vectors instead of the step loop.
//!
//! Frame: x downrange, y up, z right; azimuth measured clockwise from
//! north; latitude positive north.

use serde::{Deserialize, Serialize};

use crate::vector::V3;

/// Earth angular velocity, rad/s.
pub const EARTH_ANGULAR_VELOCITY: f64 = 7.292_115e-5;

/// Precomputed Coriolis state for one shot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coriolis {
	sin_lat: f64,
	cos_lat: f64,
	/// Earth rate resolved into the shooter frame; zero when only the
	/// flat-fire approximation is available.
	omega: V3,
	/// True when no azimuth was supplied and only the flat-fire range
	/// adjustment applies.
	pub flat_fire_only: bool,
}

impl Coriolis {
	/// Coriolis state for a shot fired at `latitude_rad`, optionally
	/// with a known `azimuth_rad` (clockwise from north). Without an
	/// azimuth the per-step acceleration is unavailable and
	/// [`Coriolis::flat_fire_only`] is set.
	#[must_use]
	pub fn new(latitude_rad: f64, azimuth_rad: Option<f64>) -> Self {
		let (sin_lat, cos_lat) = latitude_rad.sin_cos();
		match azimuth_rad {
			Some(az) => {
				let (sin_az, cos_az) = az.sin_cos();
				// Ω is (0, Ω·cos λ, Ω·sin λ) in east/north/up; resolve
				// onto downrange/up/right for the given azimuth.
				let omega = V3::new(
					EARTH_ANGULAR_VELOCITY * cos_lat * cos_az,
					EARTH_ANGULAR_VELOCITY * sin_lat,
					-EARTH_ANGULAR_VELOCITY * cos_lat * sin_az,
				);
				Self { sin_lat, cos_lat, omega, flat_fire_only: false }
			}
			None => Self {
				sin_lat,
				cos_lat,
				omega: V3::ZERO,
				flat_fire_only: true,
			},
		}
	}

	/// Local Coriolis acceleration for the given ground (inertial)
	/// velocity. Zero in flat-fire mode.
	#[must_use]
	pub fn coriolis_acceleration_local(&self, ground_velocity: V3) -> V3 {
		-(self.omega.cross(ground_velocity)) * 2.0
	}

	/// Flat-fire range correction: horizontal drift `Ω·x·t·sin λ`
	/// added to a finished range vector. Identity when the full
	/// acceleration was already integrated.
	#[must_use]
	pub fn adjust_range_from(&self, time: f64, range_vec: V3) -> V3 {
		if !self.flat_fire_only {
			return range_vec;
		}
		let drift = EARTH_ANGULAR_VELOCITY * range_vec.x * time * self.sin_lat;
		V3::new(range_vec.x, range_vec.y, range_vec.z + drift)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::f64::consts::{FRAC_PI_2, PI};

	#[test]
	fn test_flat_fire_without_azimuth() {
		let c = Coriolis::new(0.8, None);
		assert!(c.flat_fire_only);
		assert_eq!(
			c.coriolis_acceleration_local(V3::new(2800.0, 0.0, 0.0)),
			V3::ZERO
		);
	}

	#[test]
	fn test_northern_drift_is_rightward() {
		// Firing north at 45°N, the horizontal deflection is to the
		// right (+z) for forward motion.
		let c = Coriolis::new(PI / 4.0, Some(0.0));
		let a = c.coriolis_acceleration_local(V3::new(2800.0, 0.0, 0.0));
		assert!(a.z > 0.0, "accel {a:?}");
	}

	#[test]
	fn test_eotvos_effect_firing_east() {
		// Eötvös: at the equator an eastward shot strikes high, a
		// westward one strikes low.
		let c = Coriolis::new(0.0, Some(FRAC_PI_2));
		let a = c.coriolis_acceleration_local(V3::new(2800.0, 0.0, 0.0));
		assert!(a.y > 0.0, "accel {a:?}");
		// Firing west it is pressed down.
		let c = Coriolis::new(0.0, Some(-FRAC_PI_2));
		let a = c.coriolis_acceleration_local(V3::new(2800.0, 0.0, 0.0));
		assert!(a.y < 0.0, "accel {a:?}");
	}

	#[test]
	fn test_flat_fire_range_adjustment() {
		let c = Coriolis::new(FRAC_PI_2, None);
		let adjusted = c.adjust_range_from(1.0, V3::new(1000.0, -10.0, 0.0));
		let expected = EARTH_ANGULAR_VELOCITY * 1000.0;
		assert!((adjusted.z - expected).abs() < 1e-9);
		assert!((adjusted.x - 1000.0).abs() < 1e-12);
		assert!((adjusted.y + 10.0).abs() < 1e-12);
	}

	#[test]
	fn test_full_mode_adjustment_is_identity() {
		let c = Coriolis::new(0.5, Some(1.0));
		let v = V3::new(500.0, -3.0, 0.2);
		assert_eq!(c.adjust_range_from(2.0, v), v);
	}
}
