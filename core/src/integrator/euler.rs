//! First-order step loops: explicit Euler and Euler–Cromer.
//!
//! Both use the adaptive step `calc_step / max(1, |v_rel|)`, so the
//! spatial resolution stays roughly constant as the projectile slows.
//! The only difference is which velocity advances the position:
//! explicit Euler uses the pre-update velocity, Euler–Cromer the
//! post-update one.

use super::{StepState, effective_step};
use crate::buffer::TrajectoryBuffer;
use crate::engine::Config;
use crate::error::{Result, Termination};
use crate::shot::ShotProps;

pub(super) fn integrate(
	shot: &mut ShotProps,
	config: &Config,
	range_limit_ft: f64,
	buffer: &mut TrajectoryBuffer,
	semi_implicit: bool,
) -> Result<Termination> {
	let calc_step = effective_step(shot, config);
	let mut state = StepState::initial(shot, config);
	let coriolis = shot.coriolis.filter(|c| !c.flat_fire_only);
	let mut steps: u32 = 0;

	let termination = loop {
		if state.position.x > range_limit_ft && steps >= 3 {
			break Termination::RangeLimit;
		}

		state.refresh_environment(shot);
		buffer.append(state.sample())?;

		let relative_velocity = state.velocity - state.wind;
		let relative_speed = relative_velocity.magnitude();
		let delta_time = calc_step / relative_speed.max(1.0);

		let km = state.drag_coefficient(shot, relative_speed);
		let mut acceleration =
			state.gravity - relative_velocity * (km * relative_speed);
		if let Some(cor) = coriolis {
			// Coriolis acts on the inertial velocity, not the
			// wind-relative one.
			acceleration += cor.coriolis_acceleration_local(state.velocity);
		}

		if semi_implicit {
			state.velocity.fused_multiply_add(acceleration, delta_time);
			state.position.fused_multiply_add(state.velocity, delta_time);
		} else {
			let old_velocity = state.velocity;
			state.velocity.fused_multiply_add(acceleration, delta_time);
			state.position.fused_multiply_add(old_velocity, delta_time);
		}
		state.time += delta_time;
		steps += 1;

		if relative_speed < config.minimum_velocity {
			break Termination::MinimumVelocity;
		}
		let descending = state.velocity.y <= 0.0;
		// Explicit Euler keeps the legacy descending guard on the drop
		// ceiling; the semi-implicit path uses the plain ceiling test.
		if state.position.y < state.max_drop && (semi_implicit || descending) {
			break Termination::MaximumDrop;
		}
		if shot.alt0 + state.position.y < config.minimum_altitude && descending {
			break Termination::MinimumAltitude;
		}
	};

	buffer.append(state.sample())?;
	Ok(termination)
}
