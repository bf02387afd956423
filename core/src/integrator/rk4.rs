//! Fixed-step classic Runge–Kutta 4 loop.
//!
//! The fourth-order update absorbs step error well enough that the
//! adaptive Δt of the Euler family is unnecessary; `calc_step` is the
//! time step directly. Drag is re-evaluated at every stage, so the
//! Mach dependence is seen inside the step, not just at its start.

use super::{StepState, effective_step};
use crate::buffer::TrajectoryBuffer;
use crate::engine::Config;
use crate::error::{Result, Termination};
use crate::shot::ShotProps;
use crate::vector::V3;

pub(super) fn integrate(
	shot: &mut ShotProps,
	config: &Config,
	range_limit_ft: f64,
	buffer: &mut TrajectoryBuffer,
) -> Result<Termination> {
	let delta_time = effective_step(shot, config);
	let mut state = StepState::initial(shot, config);
	let coriolis = shot.coriolis.filter(|c| !c.flat_fire_only);
	let mut steps: u32 = 0;

	let termination = loop {
		if state.position.x > range_limit_ft && steps >= 3 {
			break Termination::RangeLimit;
		}

		state.refresh_environment(shot);
		buffer.append(state.sample())?;

		let relative_speed = (state.velocity - state.wind).magnitude();

		let acceleration = |velocity: V3| -> V3 {
			let relative = velocity - state.wind;
			let speed = relative.magnitude();
			let km = state.drag_coefficient(shot, speed);
			let mut a = state.gravity - relative * (km * speed);
			if let Some(cor) = coriolis {
				a += cor.coriolis_acceleration_local(velocity);
			}
			a
		};

		let half = 0.5 * delta_time;
		let k1v = acceleration(state.velocity);
		let k1p = state.velocity;

		let mut v2 = state.velocity;
		v2.fused_multiply_add(k1v, half);
		let k2v = acceleration(v2);
		let k2p = v2;

		let mut v3 = state.velocity;
		v3.fused_multiply_add(k2v, half);
		let k3v = acceleration(v3);
		let k3p = v3;

		let mut v4 = state.velocity;
		v4.fused_multiply_add(k3v, delta_time);
		let k4v = acceleration(v4);
		let k4p = v4;

		let sixth = delta_time / 6.0;
		state
			.velocity
			.fused_multiply_add(k1v + (k2v + k3v) * 2.0 + k4v, sixth);
		state
			.position
			.fused_multiply_add(k1p + (k2p + k3p) * 2.0 + k4p, sixth);
		state.time += delta_time;
		steps += 1;

		if relative_speed < config.minimum_velocity {
			break Termination::MinimumVelocity;
		}
		if state.position.y < state.max_drop {
			break Termination::MaximumDrop;
		}
		if shot.alt0 + state.position.y < config.minimum_altitude
			&& state.velocity.y <= 0.0
		{
			break Termination::MinimumAltitude;
		}
	};

	buffer.append(state.sample())?;
	Ok(termination)
}
