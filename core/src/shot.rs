//! Per-shot properties bundle.
//!
//! A [`ShotProps`] collects everything one integration pass needs:
//! muzzle state, barrel geometry, the atmosphere, the drag curve, the
//! wind stack, and the optional Coriolis state. The bundle is logically
//! immutable for one pass; only the wind cursor advances, and the
//! integrator preamble rewinds it so a shot can be integrated again.

use std::sync::Arc;

use crate::atmosphere::Atmosphere;
use crate::coriolis::Coriolis;
use crate::drag::DragCurve;
use crate::wind::WindSock;

/// Everything the integrators need for one shot.
#[derive(Debug, Clone)]
pub struct ShotProps {
	/// Muzzle speed, fps.
	pub muzzle_velocity: f64,
	/// Base integration step; feet per unit relative speed for the
	/// Euler family, seconds for RK4.
	pub calc_step: f64,
	/// Station altitude of the muzzle, feet.
	pub alt0: f64,
	/// Sight height over bore, feet.
	pub sight_height: f64,
	/// Projection of the sight offset onto the body axes for a canted
	/// rifle; `(1, 0)` when held level.
	pub cant_cosine: f64,
	pub cant_sine: f64,
	/// Barrel angles, radians.
	pub barrel_elevation: f64,
	pub barrel_azimuth: f64,
	/// Line-of-sight angle above horizontal, radians.
	pub look_angle: f64,
	/// Bullet weight, grains.
	pub weight_grains: f64,
	/// Twist rate, inches per turn; positive for right-hand twist,
	/// zero disables spin drift.
	pub twist_inches: f64,
	/// Gyroscopic stability factor; see [`miller_stability`].
	pub stability_coefficient: f64,
	pub atmo: Atmosphere,
	pub drag_curve: Arc<DragCurve>,
	pub wind_sock: WindSock,
	pub coriolis: Option<Coriolis>,
}

impl ShotProps {
	/// A level, no-wind shot with the given essentials; adjust the
	/// public fields for anything else.
	#[must_use]
	pub fn new(
		muzzle_velocity: f64,
		calc_step: f64,
		drag_curve: Arc<DragCurve>,
		atmo: Atmosphere,
	) -> Self {
		Self {
			muzzle_velocity,
			calc_step,
			alt0: atmo.altitude_ft(),
			sight_height: 0.0,
			cant_cosine: 1.0,
			cant_sine: 0.0,
			barrel_elevation: 0.0,
			barrel_azimuth: 0.0,
			look_angle: 0.0,
			weight_grains: 0.0,
			twist_inches: 0.0,
			stability_coefficient: 0.0,
			atmo,
			drag_curve,
			wind_sock: WindSock::calm(),
			coriolis: None,
		}
	}

	/// Set the cant projection from a cant angle.
	#[must_use]
	pub fn with_cant(mut self, cant_angle_rad: f64) -> Self {
		let (sin, cos) = cant_angle_rad.sin_cos();
		self.cant_cosine = cos;
		self.cant_sine = sin;
		self
	}

	/// Drag coefficient at the given Mach number.
	#[must_use]
	pub fn drag_by_mach(&self, m: f64) -> f64 {
		self.drag_curve.drag_by_mach(m)
	}

	/// Litz spin-drift approximation in feet at flight time `t`:
	/// `1.25·(sg + 1.2)·t^1.83` inches, signed by twist direction.
	/// Zero when twist or stability is unset.
	#[must_use]
	pub fn spin_drift(&self, time: f64) -> f64 {
		if self.twist_inches == 0.0 || self.stability_coefficient <= 0.0 {
			return 0.0;
		}
		let drift_inches =
			1.25 * (self.stability_coefficient + 1.2) * time.powf(1.83);
		self.twist_inches.signum() * drift_inches / 12.0
	}
}

/// Miller-rule gyroscopic stability factor with velocity and
/// atmosphere corrections. Returns zero for a smoothbore or degenerate
/// geometry.
#[must_use]
pub fn miller_stability(
	weight_grains: f64,
	twist_inches: f64,
	diameter_inches: f64,
	length_inches: f64,
	muzzle_velocity_fps: f64,
	atmo: &Atmosphere,
) -> f64 {
	if twist_inches == 0.0 || diameter_inches <= 0.0 || length_inches <= 0.0 {
		return 0.0;
	}
	let twist_calibers = (twist_inches / diameter_inches).abs();
	let length_calibers = length_inches / diameter_inches;
	let sg = 30.0 * weight_grains
		/ (twist_calibers.powi(2)
			* diameter_inches.powi(3)
			* length_calibers
			* length_calibers.mul_add(length_calibers, 1.0));
	let velocity_correction = (muzzle_velocity_fps / 2800.0).powf(1.0 / 3.0);
	let atmo_correction = (atmo.temperature_f() + 460.0) / (59.0 + 460.0)
		* (29.92 / atmo.pressure_inhg());
	sg * velocity_correction * atmo_correction
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::drag::DragCurve;

	fn test_shot() -> ShotProps {
		ShotProps::new(
			2700.0,
			0.5,
			Arc::new(DragCurve::constant(1e-5)),
			Atmosphere::icao(0.0),
		)
	}

	#[test]
	fn test_spin_drift_disabled_without_twist() {
		let shot = test_shot();
		assert!((shot.spin_drift(1.5)).abs() < f64::EPSILON);
	}

	#[test]
	fn test_spin_drift_sign_follows_twist() {
		let mut shot = test_shot();
		shot.twist_inches = 11.25;
		shot.stability_coefficient = 1.8;
		let right = shot.spin_drift(1.0);
		assert!(right > 0.0);
		shot.twist_inches = -11.25;
		assert!((shot.spin_drift(1.0) + right).abs() < 1e-12);
	}

	#[test]
	fn test_miller_stability_typical_match_bullet() {
		// 175 gr, .308", 1.24" long, 1:11.25" twist, 2600 fps: a well
		// stabilized load lands just under sg 2.
		let atmo = Atmosphere::icao(0.0);
		let sg = miller_stability(175.0, 11.25, 0.308, 1.24, 2600.0, &atmo);
		assert!((1.5..2.5).contains(&sg), "sg {sg}");
	}

	#[test]
	fn test_miller_stability_smoothbore() {
		let atmo = Atmosphere::icao(0.0);
		assert!(miller_stability(175.0, 0.0, 0.308, 1.24, 2600.0, &atmo) == 0.0);
	}

	#[test]
	fn test_cant_projection() {
		let shot = test_shot().with_cant(0.0);
		assert!((shot.cant_cosine - 1.0).abs() < 1e-12);
		assert!(shot.cant_sine.abs() < 1e-12);
	}
}
