//! Wind layers and the downrange wind cursor.
//!
//! A shot carries an ordered stack of [`WindLayer`]s, each valid until
//! a downrange distance. [`WindSock`] walks them with a cursor that
//! only ever advances during one integration; the integrator checks the
//! memoized `next_range` before paying for a layer switch.

use serde::{Deserialize, Serialize};

use crate::vector::V3;

/// One wind layer, valid for `x < until_distance_ft`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindLayer {
	/// Wind speed, fps.
	pub speed_fps: f64,
	/// Direction the wind blows *from*, radians. The layer vector is
	/// `(-v·sin θ, 0, -v·cos θ)` in the shooter frame, so π/2 is a
	/// headwind.
	pub direction_from_rad: f64,
	/// Downrange distance this layer extends to, feet.
	pub until_distance_ft: f64,
}

impl WindLayer {
	/// The layer's velocity vector in the shooter frame.
	#[must_use]
	pub fn vector(&self) -> V3 {
		V3::new(
			-self.speed_fps * self.direction_from_rad.sin(),
			0.0,
			-self.speed_fps * self.direction_from_rad.cos(),
		)
	}
}

/// Ordered wind layers with a monotone downrange cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindSock {
	layers: Vec<WindLayer>,
	cursor: usize,
	next_range: f64,
	current: V3,
}

impl WindSock {
	/// Build a sock from layers in any order; they are sorted by their
	/// `until_distance_ft`.
	#[must_use]
	pub fn new(mut layers: Vec<WindLayer>) -> Self {
		layers.sort_by(|a, b| {
			a.until_distance_ft
				.partial_cmp(&b.until_distance_ft)
				.unwrap_or(std::cmp::Ordering::Equal)
		});
		let mut sock = Self {
			layers,
			cursor: 0,
			next_range: f64::INFINITY,
			current: V3::ZERO,
		};
		sock.refresh();
		sock
	}

	/// A sock with no wind anywhere.
	#[must_use]
	pub fn calm() -> Self {
		Self::new(Vec::new())
	}

	/// Vector of the layer under the cursor.
	#[must_use]
	pub const fn current_vector(&self) -> V3 {
		self.current
	}

	/// Downrange distance at which the current layer expires.
	#[must_use]
	pub const fn next_range(&self) -> f64 {
		self.next_range
	}

	/// Advance the cursor to the layer covering `x` and return its
	/// vector. The cursor never retreats; see [`Self::rewind`] for
	/// reuse across integrations.
	pub fn vector_for_range(&mut self, x: f64) -> V3 {
		while self.cursor < self.layers.len()
			&& self.layers[self.cursor].until_distance_ft <= x
		{
			self.cursor += 1;
		}
		self.refresh();
		self.current
	}

	/// Reset the cursor to the first layer. Required before reusing a
	/// shot for a second integration pass.
	pub fn rewind(&mut self) {
		self.cursor = 0;
		self.refresh();
	}

	fn refresh(&mut self) {
		if let Some(layer) = self.layers.get(self.cursor) {
			self.current = layer.vector();
			self.next_range = layer.until_distance_ft;
		} else {
			self.current = V3::ZERO;
			self.next_range = f64::INFINITY;
		}
	}
}
