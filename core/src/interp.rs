//! Monotone piecewise-cubic interpolation.
//!
//! Three-point PCHIP (Fritsch–Carlson slopes) is the workhorse: it never
//! overshoots monotone data, which matters when recovering trajectory
//! components near the apex or the transonic band. A two-point linear
//! fallback is provided for callers that only hold one bracket.
//!
//! Scalar routines operate on `(x, y)` pairs; the sample-level helpers
//! interpolate every component of a [`Sample`] at once, keyed either by
//! a stored component or by the derived slant-height value.

use crate::error::{EngineError, Result};
use crate::model::{InterpKey, Sample};

/// Two-point linear interpolation.
///
/// # Errors
///
/// Fails with a value error when `x0 == x1`.
pub fn interpolate_2_pt(x: f64, x0: f64, y0: f64, x1: f64, y1: f64) -> Result<f64> {
	if x0 == x1 {
		return Err(EngineError::value(format!(
			"duplicate abscissa {x0} in linear interpolation"
		)));
	}
	Ok((x - x0) * (y1 - y0) / (x1 - x0) + y0)
}

/// Three-point monotone (PCHIP) interpolation.
///
/// The three support points may arrive in any order; the result is
/// invariant under permutation. Evaluation outside the support range is
/// permitted (the containing-segment Hermite simply extrapolates);
/// callers that must not extrapolate clamp their center index first.
///
/// # Errors
///
/// Fails with a value error when two support abscissae coincide.
pub fn interpolate_3_pt(
	x: f64,
	p0: (f64, f64),
	p1: (f64, f64),
	p2: (f64, f64),
) -> Result<f64> {
	// Three-element sort network on the support abscissae.
	let (mut a, mut b, mut c) = (p0, p1, p2);
	if a.0 > b.0 {
		std::mem::swap(&mut a, &mut b);
	}
	if b.0 > c.0 {
		std::mem::swap(&mut b, &mut c);
	}
	if a.0 > b.0 {
		std::mem::swap(&mut a, &mut b);
	}
	let ((x0, y0), (x1, y1), (x2, y2)) = (a, b, c);

	// Exact comparison: coincident keys do occur (two samples straddling
	// the apex share a Mach value) and must be rejected, not fudged.
	if x0 == x1 || x1 == x2 {
		return Err(EngineError::value(format!(
			"duplicate abscissa {x1} in cubic interpolation supports"
		)));
	}

	let h0 = x1 - x0;
	let h1 = x2 - x1;
	let d0 = (y1 - y0) / h0;
	let d1 = (y2 - y1) / h1;

	// Interior slope: weighted harmonic mean, zero across a local extremum.
	let m1 = if d0 * d1 <= 0.0 {
		0.0
	} else {
		let w1 = 2.0 * h1 + h0;
		let w2 = h1 + 2.0 * h0;
		(w1 + w2) / (w1 / d0 + w2 / d1)
	};

	let m0 = endpoint_slope(h0, h1, d0, d1);
	let m2 = endpoint_slope(h1, h0, d1, d0);

	if x <= x1 {
		Ok(hermite(x, x0, x1, y0, y1, m0, m1))
	} else {
		Ok(hermite(x, x1, x2, y1, y2, m1, m2))
	}
}

/// One-sided three-point endpoint slope with the Fritsch–Carlson clamp.
fn endpoint_slope(h_near: f64, h_far: f64, d_near: f64, d_far: f64) -> f64 {
	let m = ((2.0 * h_near + h_far) * d_near - h_near * d_far) / (h_near + h_far);
	if m * d_near <= 0.0 {
		0.0
	} else if m.abs() > 3.0 * d_near.abs() {
		3.0 * d_near
	} else {
		m
	}
}

/// Cubic Hermite evaluation on `[xk, xk1]` with node slopes `mk`, `mk1`.
pub(crate) fn hermite(
	x: f64,
	xk: f64,
	xk1: f64,
	yk: f64,
	yk1: f64,
	mk: f64,
	mk1: f64,
) -> f64 {
	let h = xk1 - xk;
	let t = (x - xk) / h;
	let t2 = t * t;
	let t3 = t2 * t;
	(2.0 * t3 - 3.0 * t2 + 1.0) * yk
		+ (t3 - 2.0 * t2 + t) * mk * h
		+ (-2.0 * t3 + 3.0 * t2) * yk1
		+ (t3 - t2) * mk1 * h
}

/// Fritsch–Carlson node slopes for an n-point table with strictly
/// increasing abscissae. Used to build cubic segment tables (drag
/// curves) with the same monotone behaviour as [`interpolate_3_pt`].
///
/// # Errors
///
/// Fails with a value error on fewer than two points or on duplicate
/// abscissae.
pub(crate) fn monotone_slopes(xs: &[f64], ys: &[f64]) -> Result<Vec<f64>> {
	let n = xs.len();
	if n < 2 || ys.len() != n {
		return Err(EngineError::value(format!(
			"need at least 2 matched points for slope construction, got {n}"
		)));
	}
	for w in xs.windows(2) {
		if w[1] <= w[0] {
			return Err(EngineError::value(format!(
				"table abscissae must be strictly increasing near {}",
				w[0]
			)));
		}
	}

	let mut slopes = vec![0.0; n];
	if n == 2 {
		let d = (ys[1] - ys[0]) / (xs[1] - xs[0]);
		slopes[0] = d;
		slopes[1] = d;
		return Ok(slopes);
	}

	for i in 1..n - 1 {
		let h_prev = xs[i] - xs[i - 1];
		let h_next = xs[i + 1] - xs[i];
		let d_prev = (ys[i] - ys[i - 1]) / h_prev;
		let d_next = (ys[i + 1] - ys[i]) / h_next;
		slopes[i] = if d_prev * d_next <= 0.0 {
			0.0
		} else {
			let w1 = 2.0 * h_next + h_prev;
			let w2 = h_next + 2.0 * h_prev;
			(w1 + w2) / (w1 / d_prev + w2 / d_next)
		};
	}

	let h0 = xs[1] - xs[0];
	let h1 = xs[2] - xs[1];
	let d0 = (ys[1] - ys[0]) / h0;
	let d1 = (ys[2] - ys[1]) / h1;
	slopes[0] = endpoint_slope(h0, h1, d0, d1);

	let hm = xs[n - 1] - xs[n - 2];
	let hp = xs[n - 2] - xs[n - 3];
	let dm = (ys[n - 1] - ys[n - 2]) / hm;
	let dp = (ys[n - 2] - ys[n - 3]) / hp;
	slopes[n - 1] = endpoint_slope(hm, hp, dm, dp);

	Ok(slopes)
}

/// Interpolate every component of a sample at `key == v`, from three
/// support samples. The keyed component of the result is set to `v`
/// exactly rather than round-tripped through the interpolant.
///
/// # Errors
///
/// Fails with a value error when the key values of the supports are not
/// pairwise distinct.
pub fn sample_at_key(
	key: InterpKey,
	v: f64,
	s0: &Sample,
	s1: &Sample,
	s2: &Sample,
) -> Result<Sample> {
	let x0 = key.value_of(s0);
	let x1 = key.value_of(s1);
	let x2 = key.value_of(s2);
	let mut out = Sample::default();
	for field in InterpKey::ALL {
		if field == key {
			field.set(&mut out, v);
			continue;
		}
		let y = interpolate_3_pt(
			v,
			(x0, field.value_of(s0)),
			(x1, field.value_of(s1)),
			(x2, field.value_of(s2)),
		)?;
		field.set(&mut out, y);
	}
	Ok(out)
}

/// Interpolate every component of a sample at slant height `v`, from
/// three support samples. The slant-height key is derived per support
/// as `py·cos − px·sin`; every stored component is interpolated.
///
/// # Errors
///
/// Fails with a value error when the derived slant heights are not
/// pairwise distinct.
pub fn sample_at_slant_height(
	look_cosine: f64,
	look_sine: f64,
	v: f64,
	s0: &Sample,
	s1: &Sample,
	s2: &Sample,
) -> Result<Sample> {
	let x0 = s0.slant_height(look_cosine, look_sine);
	let x1 = s1.slant_height(look_cosine, look_sine);
	let x2 = s2.slant_height(look_cosine, look_sine);
	let mut out = Sample::default();
	for field in InterpKey::ALL {
		let y = interpolate_3_pt(
			v,
			(x0, field.value_of(s0)),
			(x1, field.value_of(s1)),
			(x2, field.value_of(s2)),
		)?;
		field.set(&mut out, y);
	}
	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_reproduces_supports() {
		let pts = [(0.0, 1.0), (1.5, -2.0), (4.0, 3.5)];
		for (x, y) in pts {
			let got = interpolate_3_pt(x, pts[0], pts[1], pts[2]).unwrap();
			assert!((got - y).abs() < 1e-12, "at {x}: {got} vs {y}");
		}
	}

	#[test]
	fn test_permutation_invariance() {
		let pts = [(0.0, 0.0), (1.0, 1.0), (2.0, 4.0)];
		let orders = [
			[0, 1, 2],
			[0, 2, 1],
			[1, 0, 2],
			[1, 2, 0],
			[2, 0, 1],
			[2, 1, 0],
		];
		let reference = interpolate_3_pt(0.7, pts[0], pts[1], pts[2]).unwrap();
		for ord in orders {
			let got =
				interpolate_3_pt(0.7, pts[ord[0]], pts[ord[1]], pts[ord[2]]).unwrap();
			assert!((got - reference).abs() < 1e-12);
		}
	}

	#[test]
	fn test_monotone_no_overshoot() {
		// Monotone data stays monotone across the whole span.
		let pts = [(0.0, 0.0), (1.0, 1.0), (2.0, 4.0)];
		let mut last = -1.0;
		for i in 0..=200 {
			let x = 2.0 * f64::from(i) / 200.0;
			let y = interpolate_3_pt(x, pts[0], pts[1], pts[2]).unwrap();
			assert!(y >= last - 1e-12, "decreasing at x={x}");
			assert!((0.0..=4.0 + 1e-12).contains(&y), "overshoot at x={x}");
			last = y;
		}
	}

	#[test]
	fn test_flat_across_extremum() {
		// Opposite secant signs zero the interior slope.
		let got = interpolate_3_pt(1.0, (0.0, 0.0), (1.0, 1.0), (2.0, 0.0)).unwrap();
		assert!((got - 1.0).abs() < 1e-12);
	}

	#[test]
	fn test_duplicate_abscissae_rejected() {
		let err = interpolate_3_pt(0.5, (0.0, 0.0), (0.0, 1.0), (2.0, 4.0));
		assert!(err.is_err());
	}

	#[test]
	fn test_linear_fallback() {
		let got = interpolate_2_pt(1.0, 0.0, 0.0, 2.0, 10.0).unwrap();
		assert!((got - 5.0).abs() < 1e-12);
		assert!(interpolate_2_pt(1.0, 2.0, 0.0, 2.0, 10.0).is_err());
	}

	#[test]
	fn test_sample_key_identity_component() {
		let s0 = Sample { time: 0.0, px: 0.0, mach: 2.0, ..Sample::default() };
		let s1 = Sample { time: 1.0, px: 100.0, mach: 1.5, ..Sample::default() };
		let s2 = Sample { time: 2.0, px: 190.0, mach: 1.1, ..Sample::default() };
		let out = sample_at_key(InterpKey::PosX, 150.0, &s0, &s1, &s2).unwrap();
		assert!((out.px - 150.0).abs() < f64::EPSILON);
		assert!(out.time > 1.0 && out.time < 2.0);
	}

	#[test]
	fn test_monotone_slopes_two_points() {
		let slopes = monotone_slopes(&[0.0, 2.0], &[0.0, 4.0]).unwrap();
		assert!((slopes[0] - 2.0).abs() < 1e-12);
		assert!((slopes[1] - 2.0).abs() < 1e-12);
	}

	#[test]
	fn test_monotone_slopes_reject_unsorted() {
		assert!(monotone_slopes(&[0.0, 1.0, 1.0], &[0.0, 1.0, 2.0]).is_err());
		assert!(monotone_slopes(&[0.0], &[0.0]).is_err());
	}
}
