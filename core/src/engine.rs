//! Shot orchestration.
//!
//! An [`Engine`] owns one shot's properties, the configuration, the
//! selected integrator, and the diagnostics stack. Its operations
//! clear the stack on entry, run an integration pass, and either
//! recover locally (benign range terminations) or surface the failure
//! with a recorded frame.

use serde::{Deserialize, Serialize};

use crate::buffer::TrajectoryBuffer;
use crate::error::{EngineError, ErrorStack, Result, Termination};
use crate::filter::TrajectoryFilter;
use crate::integrator::{IntegratorKind, StepState};
use crate::model::{InterpKey, Sample, TrajFlag, TrajectoryRecord};
use crate::push_frame;
use crate::shot::ShotProps;

/// Sentinel for effectively unlimited range, time, or error.
pub const MAX_SENTINEL: f64 = 9e9;

/// Engine-wide numeric configuration, imperial units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Config {
	/// Scales every shot's `calc_step`.
	pub step_multiplier: f64,
	/// Convergence band for external zero-finding searches, feet.
	pub zero_finding_accuracy: f64,
	/// Integration stops below this relative speed, fps.
	pub minimum_velocity: f64,
	/// Integration stops below this drop, feet (sign is ignored).
	pub maximum_drop: f64,
	/// Iteration cap for external zero-finding searches.
	pub max_iterations: u32,
	/// Vertical gravity, ft/s² (negative down).
	pub gravity_constant: f64,
	/// Integration stops descending below this altitude, feet.
	pub minimum_altitude: f64,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			step_multiplier: 1.0,
			zero_finding_accuracy: 5e-6,
			minimum_velocity: 50.0,
			maximum_drop: -15_000.0,
			max_iterations: 60,
			gravity_constant: -32.174_05,
			minimum_altitude: -1500.0,
		}
	}
}

/// Outcome of one engine integration pass.
#[derive(Debug)]
pub struct Integration {
	/// Why the step loop stopped; every variant is usable data.
	pub termination: Termination,
	/// The filter's flagged records, sorted by time.
	pub records: Vec<TrajectoryRecord>,
}

/// Per-shot orchestrator.
#[derive(Debug)]
pub struct Engine {
	pub config: Config,
	shot: ShotProps,
	integrator: IntegratorKind,
	stack: ErrorStack,
}

impl Engine {
	#[must_use]
	pub fn new(shot: ShotProps, config: Config, integrator: IntegratorKind) -> Self {
		Self {
			config,
			shot,
			integrator,
			stack: ErrorStack::new(),
		}
	}

	#[must_use]
	pub const fn shot(&self) -> &ShotProps {
		&self.shot
	}

	pub const fn shot_mut(&mut self) -> &mut ShotProps {
		&mut self.shot
	}

	/// Diagnostic frames recorded by the most recent operation.
	#[must_use]
	pub const fn error_stack(&self) -> &ErrorStack {
		&self.stack
	}

	/// Integrate the shot out to `range_limit_ft`, filling `buffer`
	/// with the dense sequence and returning the filtered records.
	///
	/// `range_step_ft` and `time_step` enable fixed-interval rows when
	/// positive; `filter_flags` selects event detection.
	///
	/// # Errors
	///
	/// Fails with a memory error when the buffer cannot grow, or a
	/// value error from a degenerate event interpolation. Benign range
	/// terminations are not errors; see [`Integration::termination`].
	pub fn integrate(
		&mut self,
		range_limit_ft: f64,
		range_step_ft: f64,
		time_step: f64,
		filter_flags: TrajFlag,
		buffer: &mut TrajectoryBuffer,
	) -> Result<Integration> {
		self.stack.clear();

		let initial = StepState::initial(&mut self.shot, &self.config);
		let mut filter = TrajectoryFilter::new(
			filter_flags,
			initial.position,
			initial.velocity,
			initial.mach_fps,
			self.shot.barrel_elevation,
			self.shot.look_angle,
			range_limit_ft,
			range_step_ft,
			time_step,
		);

		let termination = match self.integrator.integrate(
			&mut self.shot,
			&self.config,
			range_limit_ft,
			buffer,
		) {
			Ok(termination) => termination,
			Err(e) => {
				push_frame!(self.stack, e.code(), "integrator", "integrate", "{e}");
				return Err(e);
			}
		};

		for sample in buffer.as_slice() {
			if let Err(e) = filter.record(*sample) {
				push_frame!(self.stack, e.code(), "filter", "record", "{e}");
				return Err(e);
			}
		}

		Ok(Integration {
			termination,
			records: filter.into_records(),
		})
	}

	/// Locate the apex (vertical velocity zero) of the shot.
	///
	/// The minimum-velocity floor is lifted for the pass, since a
	/// steep shot can be slow at its apex, and restored on every exit
	/// path. The pass itself runs with unlimited range.
	///
	/// # Errors
	///
	/// Fails with an invalid-parameter error when the barrel does not
	/// point upward, and with a runtime error when the integrated data
	/// never crosses `vy = 0`.
	pub fn find_apex(&mut self) -> Result<Sample> {
		self.stack.clear();

		if self.shot.barrel_elevation <= 0.0 {
			let err = EngineError::InvalidParameter(
				"barrel elevation must be positive to find an apex",
			);
			push_frame!(self.stack, err.code(), "engine", "find_apex", "{err}");
			return Err(err);
		}

		let saved_minimum_velocity = self.config.minimum_velocity;
		self.config.minimum_velocity = 0.0;
		let mut buffer = TrajectoryBuffer::new();
		let outcome = self.integrator.integrate(
			&mut self.shot,
			&self.config,
			MAX_SENTINEL,
			&mut buffer,
		);
		self.config.minimum_velocity = saved_minimum_velocity;

		if let Err(e) = outcome {
			push_frame!(self.stack, e.code(), "integrator", "integrate", "{e}");
			return Err(e);
		}

		// Any benign termination leaves usable data; what matters is
		// whether the climb actually turned over.
		if !buffer.last().is_some_and(|s| s.vy <= 0.0) {
			let err = EngineError::runtime("no apex flagged in trajectory data");
			push_frame!(self.stack, err.code(), "engine", "find_apex", "{err}");
			return Err(err);
		}

		match buffer.get_at(InterpKey::VelY, 0.0, None) {
			Ok(apex) => Ok(apex),
			Err(e) => {
				push_frame!(self.stack, e.code(), "buffer", "get_at", "{e}");
				Err(e)
			}
		}
	}

	/// Vertical miss measure for a candidate barrel angle against a
	/// target at `(target_x, target_y)` feet: `(hit_y − target_y)`
	/// minus the horizontal shortfall. Returns [`MAX_SENTINEL`] when
	/// the shot cannot reach the target distance.
	///
	/// Sets the shot's barrel elevation to `angle_rad` as a side
	/// effect, like the zero-finding searches that drive it.
	///
	/// # Errors
	///
	/// Fails with a memory error when the scratch buffer cannot grow,
	/// or a value error from a degenerate lookup.
	pub fn error_at_distance(
		&mut self,
		angle_rad: f64,
		target_x: f64,
		target_y: f64,
	) -> Result<f64> {
		self.stack.clear();
		self.shot.barrel_elevation = angle_rad;

		let mut buffer = TrajectoryBuffer::new();
		let outcome = self.integrator.integrate(
			&mut self.shot,
			&self.config,
			target_x,
			&mut buffer,
		);
		if let Err(e) = outcome {
			push_frame!(self.stack, e.code(), "integrator", "integrate", "{e}");
			return Err(e);
		}

		let reachable = buffer.len() >= 3
			&& buffer
				.last()
				.is_some_and(|s| s.time > 0.0 && s.px >= target_x);
		if !reachable {
			return Ok(MAX_SENTINEL);
		}

		match buffer.get_at(InterpKey::PosX, target_x, None) {
			Ok(hit) => Ok((hit.py - target_y) - (hit.px - target_x).abs()),
			Err(e) => {
				push_frame!(self.stack, e.code(), "buffer", "get_at", "{e}");
				Err(e)
			}
		}
	}
}
