//! Parallel multi-shot solving.
//!
//! One engine per shot, fanned out via [`rayon`]; no shared mutable
//! state is required, so statistics are accumulated with `merge` in a
//! `reduce` step. Shots that share standard drag curves should build
//! them through one [`crate::drag::CurveCache`] so the `Arc`'d curves
//! are shared across the pool.

use rayon::prelude::*;

use crate::buffer::TrajectoryBuffer;
use crate::engine::{Config, Engine, Integration};
use crate::error::{Result, Termination};
use crate::integrator::IntegratorKind;
use crate::model::TrajFlag;
use crate::shot::ShotProps;

/// Shared parameters for every shot of a batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchParams {
	pub range_limit_ft: f64,
	pub range_step_ft: f64,
	pub time_step: f64,
	pub filter_flags: TrajFlag,
	pub integrator: IntegratorKind,
}

/// Accumulated batch statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
	/// Shots that produced usable records.
	pub solved: usize,
	/// Shots that failed with a real error.
	pub failed: usize,
	/// Solved shots that stopped before the range limit.
	pub stopped_early: usize,
}

impl BatchStats {
	fn merge(mut self, other: Self) -> Self {
		self.solved += other.solved;
		self.failed += other.failed;
		self.stopped_early += other.stopped_early;
		self
	}

	fn of(result: &Result<Integration>) -> Self {
		match result {
			Ok(integration) => Self {
				solved: 1,
				failed: 0,
				stopped_early: usize::from(
					integration.termination != Termination::RangeLimit,
				),
			},
			Err(_) => Self { solved: 0, failed: 1, stopped_early: 0 },
		}
	}
}

/// Solve every shot in parallel, returning per-shot outcomes in input
/// order plus merged statistics.
#[must_use]
pub fn solve_batch(
	shots: Vec<ShotProps>,
	config: &Config,
	params: &BatchParams,
) -> (Vec<Result<Integration>>, BatchStats) {
	let results: Vec<Result<Integration>> = shots
		.into_par_iter()
		.map(|shot| {
			let mut engine = Engine::new(shot, *config, params.integrator);
			let mut buffer = TrajectoryBuffer::new();
			engine.integrate(
				params.range_limit_ft,
				params.range_step_ft,
				params.time_step,
				params.filter_flags,
				&mut buffer,
			)
		})
		.collect();

	let stats = results
		.par_iter()
		.map(BatchStats::of)
		.reduce(BatchStats::default, BatchStats::merge);

	(results, stats)
}
