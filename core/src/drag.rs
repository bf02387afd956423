//! Mach-keyed drag curves and the shared curve cache.
//!
//! A [`DragCurve`] is an immutable table of cubic segments in Mach,
//! built once per projectile and queried every integration step with
//! `drag_by_mach`. Construction accepts raw `(mach, cd)` points, a
//! standard reference model scaled by ballistic coefficient, or a JSON
//! point list. Node slopes come from the same Fritsch–Carlson rule as
//! the trajectory interpolator, so a monotone table stays monotone
//! between nodes.
//!
//! [`CurveCache`] memoizes standard-model builds across shots; it is
//! safe to share between threads solving different shots.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::interp::{hermite, monotone_slopes};
use crate::tables;

/// Imperial standard-projectile form factor. Folding it and the BC into
/// the stored coefficients at construction time makes `drag_by_mach`
/// return the ready-to-use `km` with `a_drag = km · |v_rel| · v_rel`.
const BC_FORM_FACTOR: f64 = 2.08551e-4;

/// Standard reference drag model selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DragModel {
	G1,
	G7,
}

impl DragModel {
	const fn table(self) -> &'static [(f64, f64)] {
		match self {
			Self::G1 => tables::G1_TABLE,
			Self::G7 => tables::G7_TABLE,
		}
	}
}

/// One tabulated point of a drag curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragPoint {
	pub mach: f64,
	pub cd: f64,
}

/// Immutable sequence of cubic segments in Mach.
///
/// Queries below the first node or above the last return the end-node
/// coefficient unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct DragCurve {
	mach: Vec<f64>,
	coeff: Vec<f64>,
	slope: Vec<f64>,
}

impl DragCurve {
	/// Build a curve from raw coefficient points, already in `km` form.
	///
	/// # Errors
	///
	/// Fails with a value error on fewer than two points or on Mach
	/// values that are not strictly increasing.
	pub fn from_points(points: &[DragPoint]) -> Result<Self> {
		if points.len() < 2 {
			return Err(EngineError::value(format!(
				"drag curve needs at least 2 points, got {}",
				points.len()
			)));
		}
		let mach: Vec<f64> = points.iter().map(|p| p.mach).collect();
		let coeff: Vec<f64> = points.iter().map(|p| p.cd).collect();
		let slope = monotone_slopes(&mach, &coeff)?;
		Ok(Self { mach, coeff, slope })
	}

	/// Build a curve from reference-projectile coefficients scaled by a
	/// ballistic coefficient.
	///
	/// # Errors
	///
	/// Fails with a value error on a non-positive BC or a bad table.
	pub fn with_ballistic_coefficient(points: &[DragPoint], bc: f64) -> Result<Self> {
		if bc <= 0.0 || !bc.is_finite() {
			return Err(EngineError::value(format!(
				"ballistic coefficient must be positive and finite, got {bc}"
			)));
		}
		let scale = BC_FORM_FACTOR / bc;
		let scaled: Vec<DragPoint> = points
			.iter()
			.map(|p| DragPoint { mach: p.mach, cd: p.cd * scale })
			.collect();
		Self::from_points(&scaled)
	}

	/// Build the curve for a standard reference model and BC.
	///
	/// # Errors
	///
	/// Fails with a value error on a non-positive BC.
	pub fn standard(model: DragModel, bc: f64) -> Result<Self> {
		let points: Vec<DragPoint> = model
			.table()
			.iter()
			.map(|&(mach, cd)| DragPoint { mach, cd })
			.collect();
		Self::with_ballistic_coefficient(&points, bc)
	}

	/// A flat curve returning `km` at every Mach. Useful for tests and
	/// for drag-free comparison runs.
	#[must_use]
	pub fn constant(km: f64) -> Self {
		Self {
			mach: vec![0.0, 5.0],
			coeff: vec![km, km],
			slope: vec![0.0, 0.0],
		}
	}

	/// Parse a curve from a JSON array of `{"mach": .., "cd": ..}`
	/// objects, in raw `km` form.
	///
	/// # Errors
	///
	/// Fails with a value error on malformed JSON or a bad point list.
	pub fn from_json(json: &str) -> Result<Self> {
		let points: Vec<DragPoint> = serde_json::from_str(json)
			.map_err(|e| EngineError::value(format!("drag table JSON: {e}")))?;
		Self::from_points(&points)
	}

	/// Drag coefficient at the given Mach number.
	///
	/// O(log n) segment lookup plus one Hermite evaluation.
	#[must_use]
	pub fn drag_by_mach(&self, m: f64) -> f64 {
		let n = self.mach.len();
		if m <= self.mach[0] {
			return self.coeff[0];
		}
		if m >= self.mach[n - 1] {
			return self.coeff[n - 1];
		}
		// First node strictly above m; the containing segment is [i-1, i].
		let i = self.mach.partition_point(|&x| x <= m);
		hermite(
			m,
			self.mach[i - 1],
			self.mach[i],
			self.coeff[i - 1],
			self.coeff[i],
			self.slope[i - 1],
			self.slope[i],
		)
	}

	/// Number of cubic segments.
	#[must_use]
	pub fn segments(&self) -> usize {
		self.mach.len() - 1
	}
}

/// Concurrent cache of built standard curves, keyed by model and the
/// bit pattern of the BC.
#[derive(Debug, Default)]
pub struct CurveCache {
	curves: DashMap<(DragModel, u64), Arc<DragCurve>>,
}

impl CurveCache {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// The curve for `(model, bc)`, built on first request.
	///
	/// # Errors
	///
	/// Fails with a value error on a non-positive BC.
	pub fn standard(&self, model: DragModel, bc: f64) -> Result<Arc<DragCurve>> {
		let key = (model, bc.to_bits());
		if let Some(hit) = self.curves.get(&key) {
			return Ok(Arc::clone(&hit));
		}
		let curve = Arc::new(DragCurve::standard(model, bc)?);
		self.curves.insert(key, Arc::clone(&curve));
		Ok(curve)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.curves.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.curves.is_empty()
	}
}
