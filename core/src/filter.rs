//! Trajectory filter: scans the dense sequence and emits flagged records.
//!
//! The filter consumes samples in time order, holding the last two
//! behind the newest so every detection can interpolate with the full
//! three-point rule. It emits rows at fixed distance and time steps and
//! at the detected apex, Mach-1 crossing, and line-of-sight crossings,
//! keeping the output sorted by time and merging rows that land within
//! [`SEPARATE_ROW_TIME_DELTA`] of each other.

use crate::error::Result;
use crate::interp::{sample_at_key, sample_at_slant_height};
use crate::model::{InterpKey, SEPARATE_ROW_TIME_DELTA, Sample, TrajFlag, TrajectoryRecord};
use crate::vector::V3;

/// Tolerance for matching a sample against a distance or time step.
const STEP_EPSILON: f64 = 1e-6;

/// Streaming event detector over an integration's dense output.
#[derive(Debug)]
pub struct TrajectoryFilter {
	/// Remaining event mask; one-shot bits are cleared as they fire.
	flags: TrajFlag,
	records: Vec<TrajectoryRecord>,
	prev: Option<Sample>,
	prev_prev: Option<Sample>,
	look_sine: f64,
	look_cosine: f64,
	look_tangent: f64,
	range_limit: f64,
	range_step: f64,
	time_step: f64,
	next_record_distance: f64,
	time_of_last_record: f64,
	range_active: bool,
}

impl TrajectoryFilter {
	/// Build a filter for one integration pass.
	///
	/// The initial state prunes impossible events from the mask up
	/// front: a Mach-1 crossing when the shot starts subsonic, an
	/// upward sight-line crossing when the muzzle starts at or above
	/// the line, and any crossing at all when the barrel never climbs
	/// toward the line of sight.
	#[must_use]
	#[allow(clippy::too_many_arguments)]
	pub fn new(
		mut flags: TrajFlag,
		initial_position: V3,
		initial_velocity: V3,
		initial_mach_fps: f64,
		barrel_angle: f64,
		look_angle: f64,
		range_limit: f64,
		range_step: f64,
		time_step: f64,
	) -> Self {
		if flags.intersects(TrajFlag::MACH)
			&& initial_velocity.magnitude() < initial_mach_fps
		{
			flags.remove(TrajFlag::MACH);
		}
		if flags.intersects(TrajFlag::ZERO) && initial_position.y >= 0.0 {
			flags.remove(TrajFlag::ZERO_UP);
		}
		if initial_position.y < 0.0 && barrel_angle <= look_angle {
			flags.remove(TrajFlag::ZERO);
			flags.remove(TrajFlag::MRT);
		}

		let (look_sine, look_cosine) = look_angle.sin_cos();
		Self {
			flags,
			records: Vec::new(),
			prev: None,
			prev_prev: None,
			look_sine,
			look_cosine,
			look_tangent: look_angle.tan(),
			range_limit,
			range_step,
			time_step,
			next_record_distance: 0.0,
			time_of_last_record: 0.0,
			range_active: range_step > 0.0,
		}
	}

	/// Feed the next dense sample, emitting whatever records it
	/// completes.
	///
	/// # Errors
	///
	/// Fails with a value error when an event interpolation hits
	/// coincident support keys.
	pub fn record(&mut self, new: Sample) -> Result<()> {
		if new.time == 0.0 {
			let flag = if self.range_step > 0.0 || self.time_step > 0.0 {
				TrajFlag::RANGE
			} else {
				TrajFlag::NONE
			};
			self.emit(new, flag);
			self.time_of_last_record = 0.0;
			self.rotate(new);
			return Ok(());
		}

		let interpolable = match (&self.prev_prev, &self.prev) {
			(Some(pp), Some(p)) => pp.time < p.time && p.time < new.time,
			_ => false,
		};

		self.record_range_steps(&new, interpolable)?;
		if interpolable {
			self.record_time_steps(&new)?;
			self.record_apex(&new)?;
			self.record_mach_crossing(&new)?;
			self.record_zero_crossings(&new)?;
		}

		self.rotate(new);
		Ok(())
	}

	/// Finish the pass, returning the time-sorted records.
	#[must_use]
	pub fn into_records(self) -> Vec<TrajectoryRecord> {
		self.records
	}

	fn rotate(&mut self, new: Sample) {
		self.prev_prev = self.prev.take();
		self.prev = Some(new);
	}

	fn record_range_steps(&mut self, new: &Sample, interpolable: bool) -> Result<()> {
		while self.range_active
			&& self.next_record_distance + self.range_step - STEP_EPSILON <= new.px
		{
			let record_distance = self.next_record_distance + self.range_step;
			if record_distance > self.range_limit + STEP_EPSILON {
				self.range_active = false;
				break;
			}
			let emitted = if (new.px - record_distance).abs() < STEP_EPSILON {
				Some(*new)
			} else if interpolable {
				let (pp, p) = (self.prev_prev.unwrap(), self.prev.unwrap());
				Some(sample_at_key(InterpKey::PosX, record_distance, &pp, &p, new)?)
			} else {
				None
			};
			let Some(sample) = emitted else { break };
			self.emit(sample, TrajFlag::RANGE);
			self.next_record_distance = record_distance;
			self.time_of_last_record = sample.time;
		}
		Ok(())
	}

	fn record_time_steps(&mut self, new: &Sample) -> Result<()> {
		if self.time_step <= 0.0 {
			return Ok(());
		}
		while self.time_of_last_record + self.time_step - STEP_EPSILON <= new.time {
			let record_time = self.time_of_last_record + self.time_step;
			let (pp, p) = (self.prev_prev.unwrap(), self.prev.unwrap());
			let sample = sample_at_key(InterpKey::Time, record_time, &pp, &p, new)?;
			self.emit(sample, TrajFlag::RANGE);
			self.time_of_last_record = record_time;
		}
		Ok(())
	}

	fn record_apex(&mut self, new: &Sample) -> Result<()> {
		if !self.flags.intersects(TrajFlag::APEX) {
			return Ok(());
		}
		let p = self.prev.unwrap();
		if p.vy > 0.0 && new.vy <= 0.0 {
			let pp = self.prev_prev.unwrap();
			let sample = sample_at_key(InterpKey::VelY, 0.0, &pp, &p, new)?;
			self.emit(sample, TrajFlag::APEX);
			self.flags.remove(TrajFlag::APEX);
		}
		Ok(())
	}

	fn record_mach_crossing(&mut self, new: &Sample) -> Result<()> {
		if !self.flags.intersects(TrajFlag::MACH) || new.mach >= 1.0 {
			return Ok(());
		}
		let (pp, p) = (self.prev_prev.unwrap(), self.prev.unwrap());
		let sample = sample_at_key(InterpKey::Mach, 1.0, &pp, &p, new)?;
		self.emit(sample, TrajFlag::MACH);
		self.flags.remove(TrajFlag::MACH);
		Ok(())
	}

	fn record_zero_crossings(&mut self, new: &Sample) -> Result<()> {
		if !self.flags.intersects(TrajFlag::ZERO) {
			return Ok(());
		}
		let reference = new.px * self.look_tangent;
		// The downward crossing is only armed once the upward one has
		// fired (or was pruned at construction): a shot climbing from
		// below the line must not report a descent it never made.
		if self.flags.intersects(TrajFlag::ZERO_UP) {
			if new.py >= reference {
				self.emit_zero(new, TrajFlag::ZERO_UP)?;
			}
		} else if self.flags.intersects(TrajFlag::ZERO_DOWN) && new.py < reference {
			self.emit_zero(new, TrajFlag::ZERO_DOWN)?;
		}
		Ok(())
	}

	fn emit_zero(&mut self, new: &Sample, which: TrajFlag) -> Result<()> {
		let (pp, p) = (self.prev_prev.unwrap(), self.prev.unwrap());
		let sample =
			sample_at_slant_height(self.look_cosine, self.look_sine, 0.0, &pp, &p, new)?;
		self.emit(sample, which);
		self.flags.remove(which);
		Ok(())
	}

	/// Sorted-merge insertion: locate by time, OR the flag into an
	/// adjacent record closer than the merge window, otherwise insert.
	fn emit(&mut self, sample: Sample, flag: TrajFlag) {
		let idx = self
			.records
			.partition_point(|r| r.sample.time < sample.time);
		if idx > 0
			&& (self.records[idx - 1].sample.time - sample.time).abs()
				< SEPARATE_ROW_TIME_DELTA
		{
			self.records[idx - 1].flag.insert(flag);
			return;
		}
		if idx < self.records.len()
			&& (self.records[idx].sample.time - sample.time).abs()
				< SEPARATE_ROW_TIME_DELTA
		{
			self.records[idx].flag.insert(flag);
			return;
		}
		self.records.insert(idx, TrajectoryRecord { sample, flag });
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn feed(filter: &mut TrajectoryFilter, samples: &[Sample]) {
		for s in samples {
			filter.record(*s).unwrap();
		}
	}

	fn arc_sample(t: f64) -> Sample {
		// Simple drag-free arc: vx 1000, vy0 100, g = -32.
		Sample {
			time: t,
			px: 1000.0 * t,
			py: 100.0f64.mul_add(t, -16.0 * t * t) - 0.2,
			pz: 0.0,
			vx: 1000.0,
			vy: 100.0 - 32.0 * t,
			vz: 0.0,
			mach: (1000.0f64.powi(2) + (100.0 - 32.0 * t).powi(2)).sqrt() / 1116.45,
		}
	}

	fn arc_filter(flags: TrajFlag, range_step: f64, time_step: f64) -> TrajectoryFilter {
		TrajectoryFilter::new(
			flags,
			V3::new(0.0, -0.2, 0.0),
			V3::new(1000.0, 100.0, 0.0),
			1116.45,
			0.1,
			0.0,
			10_000.0,
			range_step,
			time_step,
		)
	}

	#[test]
	fn test_first_sample_fast_path() {
		let mut filter = arc_filter(TrajFlag::NONE, 100.0, 0.0);
		filter.record(arc_sample(0.0)).unwrap();
		let records = filter.into_records();
		assert_eq!(records.len(), 1);
		assert_eq!(records[0].flag, TrajFlag::RANGE);
		assert_eq!(records[0].sample.time, 0.0);
	}

	#[test]
	fn test_range_steps_emitted_at_each_step() {
		let mut filter = arc_filter(TrajFlag::NONE, 500.0, 0.0);
		let samples: Vec<Sample> =
			(0..40).map(|i| arc_sample(f64::from(i) * 0.05)).collect();
		feed(&mut filter, &samples);
		let records = filter.into_records();
		// t=0 row plus rows at 500, 1000, 1500 ft.
		assert!(records.len() >= 4, "got {}", records.len());
		for (i, r) in records.iter().take(4).enumerate() {
			assert!(r.flag.contains(TrajFlag::RANGE));
			let expected = 500.0 * i as f64;
			assert!(
				(r.sample.px - expected).abs() < 1e-6,
				"row {i} at px {}",
				r.sample.px
			);
		}
	}

	#[test]
	fn test_range_steps_disabled_past_limit() {
		let mut filter = TrajectoryFilter::new(
			TrajFlag::NONE,
			V3::new(0.0, -0.2, 0.0),
			V3::new(1000.0, 100.0, 0.0),
			1116.45,
			0.1,
			0.0,
			900.0,
			500.0,
			0.0,
		);
		let samples: Vec<Sample> =
			(0..40).map(|i| arc_sample(f64::from(i) * 0.05)).collect();
		feed(&mut filter, &samples);
		let records = filter.into_records();
		// 0 and 500 only; 1000 exceeds the limit.
		assert_eq!(records.len(), 2);
	}

	#[test]
	fn test_time_steps() {
		let mut filter = arc_filter(TrajFlag::NONE, 0.0, 0.25);
		let samples: Vec<Sample> =
			(0..40).map(|i| arc_sample(f64::from(i) * 0.05)).collect();
		feed(&mut filter, &samples);
		let records = filter.into_records();
		assert!(records.len() >= 8);
		for (i, r) in records.iter().take(8).enumerate() {
			let expected = 0.25 * i as f64;
			assert!(
				(r.sample.time - expected).abs() < 1e-9,
				"row {i} at t {}",
				r.sample.time
			);
		}
	}

	#[test]
	fn test_apex_one_shot() {
		let mut filter = arc_filter(TrajFlag::APEX, 0.0, 0.0);
		let samples: Vec<Sample> =
			(0..80).map(|i| arc_sample(f64::from(i) * 0.1)).collect();
		feed(&mut filter, &samples);
		let records = filter.into_records();
		let apexes: Vec<_> = records
			.iter()
			.filter(|r| r.flag.contains(TrajFlag::APEX))
			.collect();
		assert_eq!(apexes.len(), 1);
		// vy = 0 at t = 100/32.
		assert!((apexes[0].sample.vy).abs() < 1e-9);
		assert!((apexes[0].sample.time - 3.125).abs() < 1e-6);
	}

	#[test]
	fn test_zero_up_then_down() {
		let mut filter = arc_filter(TrajFlag::ZERO, 0.0, 0.0);
		let samples: Vec<Sample> =
			(0..80).map(|i| arc_sample(f64::from(i) * 0.1)).collect();
		feed(&mut filter, &samples);
		// The muzzle row carries no flag; the two crossings follow.
		let records = filter.into_records();
		assert_eq!(records.len(), 3);
		assert_eq!(records[0].flag, TrajFlag::NONE);
		assert_eq!(records[1].flag, TrajFlag::ZERO_UP);
		assert_eq!(records[2].flag, TrajFlag::ZERO_DOWN);
		assert!(records[1].sample.time < records[2].sample.time);
		for r in &records[1..] {
			assert!(r.sample.py.abs() < 1e-3, "py {}", r.sample.py);
		}
	}

	#[test]
	fn test_zero_pruned_for_flat_barrel() {
		// Barrel at or below the look angle from below the line: no
		// crossing is ever possible.
		let filter = TrajectoryFilter::new(
			TrajFlag::ZERO | TrajFlag::MRT,
			V3::new(0.0, -0.2, 0.0),
			V3::new(1000.0, 0.0, 0.0),
			1116.45,
			0.0,
			0.0,
			10_000.0,
			0.0,
			0.0,
		);
		assert!(!filter.flags.intersects(TrajFlag::ZERO));
		assert!(!filter.flags.intersects(TrajFlag::MRT));
	}

	#[test]
	fn test_mach_pruned_for_subsonic_start() {
		let filter = TrajectoryFilter::new(
			TrajFlag::MACH,
			V3::ZERO,
			V3::new(900.0, 0.0, 0.0),
			1116.45,
			0.1,
			0.0,
			10_000.0,
			0.0,
			0.0,
		);
		assert!(!filter.flags.intersects(TrajFlag::MACH));
	}

	#[test]
	fn test_merge_law() {
		let mut filter = arc_filter(TrajFlag::NONE, 0.0, 0.0);
		let s = arc_sample(1.0);
		filter.emit(s, TrajFlag::RANGE);
		let mut nearby = s;
		nearby.time += SEPARATE_ROW_TIME_DELTA / 2.0;
		filter.emit(nearby, TrajFlag::APEX);
		let mut apart = s;
		apart.time += 1.0;
		filter.emit(apart, TrajFlag::MACH);

		let records = filter.into_records();
		assert_eq!(records.len(), 2);
		assert_eq!(records[0].flag, TrajFlag::RANGE | TrajFlag::APEX);
		assert_eq!(records[1].flag, TrajFlag::MACH);
	}
}
