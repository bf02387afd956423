//! Integration step loops.
//!
//! Three methods behind one tagged dispatch: explicit Euler, the
//! semi-implicit Euler–Cromer variant (same cost, much better energy
//! behaviour on the lofted arcs), and classic RK4. All of them share
//! the preamble in [`StepState`] and the same per-step ordering: wind
//! refresh, atmosphere refresh, dense append, drag, acceleration,
//! advance, terminate.

mod euler;
mod rk4;

use serde::{Deserialize, Serialize};

use crate::buffer::TrajectoryBuffer;
use crate::engine::Config;
use crate::error::{Result, Termination};
use crate::model::Sample;
use crate::shot::ShotProps;
use crate::vector::V3;

/// Which integration method a shot runs under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegratorKind {
	/// Explicit Euler: position advances with the pre-update velocity.
	Euler,
	/// Semi-implicit Euler: position advances with the post-update
	/// velocity.
	#[default]
	EulerCromer,
	/// Fixed-step classic Runge–Kutta 4.
	RungeKutta4,
}

impl IntegratorKind {
	/// Run the step loop for one shot, appending the dense sequence to
	/// `buffer`, until the range limit or a termination condition.
	///
	/// # Errors
	///
	/// Fails with a memory error when the buffer cannot grow.
	pub fn integrate(
		self,
		shot: &mut ShotProps,
		config: &Config,
		range_limit_ft: f64,
		buffer: &mut TrajectoryBuffer,
	) -> Result<Termination> {
		match self {
			Self::Euler => euler::integrate(shot, config, range_limit_ft, buffer, false),
			Self::EulerCromer => {
				euler::integrate(shot, config, range_limit_ft, buffer, true)
			}
			Self::RungeKutta4 => rk4::integrate(shot, config, range_limit_ft, buffer),
		}
	}
}

/// Mutable integration state shared by all methods.
pub(crate) struct StepState {
	pub gravity: V3,
	pub position: V3,
	pub velocity: V3,
	pub time: f64,
	pub density_ratio: f64,
	pub mach_fps: f64,
	pub wind: V3,
	/// Drop ceiling lowered by any initial sight-height offset.
	pub max_drop: f64,
}

impl StepState {
	/// Common preamble: muzzle state from the barrel geometry, drop
	/// ceiling, initial atmosphere, and a rewound wind cursor.
	pub fn initial(shot: &mut ShotProps, config: &Config) -> Self {
		shot.wind_sock.rewind();
		let position = V3::new(
			0.0,
			-shot.cant_cosine * shot.sight_height,
			-shot.cant_sine * shot.sight_height,
		);
		let (sin_e, cos_e) = shot.barrel_elevation.sin_cos();
		let (sin_a, cos_a) = shot.barrel_azimuth.sin_cos();
		let velocity =
			V3::new(cos_e * cos_a, sin_e, cos_e * sin_a) * shot.muzzle_velocity;
		let max_drop = -config.maximum_drop.abs() + position.y.min(0.0);
		let (density_ratio, mach_fps) = shot
			.atmo
			.update_density_factor_and_mach_for_altitude(shot.alt0 + position.y);
		Self {
			gravity: V3::new(0.0, config.gravity_constant, 0.0),
			position,
			velocity,
			time: 0.0,
			density_ratio,
			mach_fps,
			wind: shot.wind_sock.current_vector(),
			max_drop,
		}
	}

	/// Per-step environment refresh: advance the wind cursor when its
	/// layer expired, then re-read the atmosphere at current altitude.
	pub fn refresh_environment(&mut self, shot: &mut ShotProps) {
		if self.position.x >= shot.wind_sock.next_range() {
			self.wind = shot.wind_sock.vector_for_range(self.position.x);
		}
		let (density_ratio, mach_fps) = shot
			.atmo
			.update_density_factor_and_mach_for_altitude(shot.alt0 + self.position.y);
		self.density_ratio = density_ratio;
		self.mach_fps = mach_fps;
	}

	/// Local speed of sound with the degenerate-atmosphere guard.
	fn sound_speed(&self) -> f64 {
		if self.mach_fps == 0.0 { 1e-6 } else { self.mach_fps }
	}

	/// Drag coefficient `km` for a relative speed, including the air
	/// density factor.
	pub fn drag_coefficient(&self, shot: &ShotProps, relative_speed: f64) -> f64 {
		self.density_ratio * shot.drag_by_mach(relative_speed / self.sound_speed())
	}

	/// Snapshot of the current state as one dense sample.
	pub fn sample(&self) -> Sample {
		Sample {
			time: self.time,
			px: self.position.x,
			py: self.position.y,
			pz: self.position.z,
			vx: self.velocity.x,
			vy: self.velocity.y,
			vz: self.velocity.z,
			mach: self.velocity.magnitude() / self.sound_speed(),
		}
	}
}

/// Effective base step after the configured multiplier.
pub(crate) fn effective_step(shot: &ShotProps, config: &Config) -> f64 {
	shot.calc_step * config.step_multiplier
}
