//! Atmosphere model: density ratio and speed of sound by altitude.
//!
//! Station conditions (altitude, pressure, temperature, humidity) are
//! fixed per shot; the integrator queries
//! [`Atmosphere::update_density_factor_and_mach_for_altitude`] as the
//! projectile climbs or drops, which projects temperature with the
//! standard lapse rate and pressure with the barometric formula.
//!
//! Imperial units throughout the interface (feet, °F, inHg); density is
//! computed in SI internally and returned as a ratio against the
//! sea-level standard.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

const STANDARD_TEMPERATURE_F: f64 = 59.0;
const STANDARD_PRESSURE_INHG: f64 = 29.92;
/// Sea-level standard air density, kg/m³.
const STANDARD_DENSITY: f64 = 1.225;
/// °F per foot of altitude.
const LAPSE_RATE_F_PER_FT: f64 = -3.566_16e-3;
/// Barometric formula altitude coefficient, 1/ft.
const PRESSURE_ALTITUDE_COEFF: f64 = 6.8756e-6;
const PRESSURE_EXPONENT: f64 = 5.2559;
const FAHRENHEIT_TO_RANKINE: f64 = 459.67;
/// Speed of sound is `49.0223·√(T °R)` fps.
const SPEED_OF_SOUND_COEFF: f64 = 49.0223;

const PA_PER_INHG: f64 = 3386.389;
/// Specific gas constant, dry air (J/(kg·K)).
const R_DRY: f64 = 287.05;
/// Specific gas constant, water vapor (J/(kg·K)).
const R_VAPOR: f64 = 461.495;

/// Shooter-station atmosphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Atmosphere {
	altitude_ft: f64,
	pressure_inhg: f64,
	temperature_f: f64,
	/// Relative humidity, 0..=1.
	humidity: f64,
}

impl Atmosphere {
	/// Station atmosphere from measured conditions.
	///
	/// Humidity accepts either a 0..=1 fraction or a 1..=100 percent
	/// value.
	///
	/// # Errors
	///
	/// Fails with a value error when any condition is outside the
	/// plausible envelope.
	pub fn new(
		altitude_ft: f64,
		pressure_inhg: f64,
		temperature_f: f64,
		humidity: f64,
	) -> Result<Self> {
		if !(-1500.0..=40_000.0).contains(&altitude_ft) {
			return Err(EngineError::value(format!(
				"altitude {altitude_ft} ft outside supported range"
			)));
		}
		if !(20.0..=32.5).contains(&pressure_inhg) {
			return Err(EngineError::value(format!(
				"pressure {pressure_inhg} inHg outside supported range"
			)));
		}
		if !(-100.0..=150.0).contains(&temperature_f) {
			return Err(EngineError::value(format!(
				"temperature {temperature_f} F outside supported range"
			)));
		}
		let humidity = if humidity > 1.0 { humidity / 100.0 } else { humidity };
		if !(0.0..=1.0).contains(&humidity) {
			return Err(EngineError::value(format!(
				"humidity {humidity} outside 0..=1"
			)));
		}
		Ok(Self { altitude_ft, pressure_inhg, temperature_f, humidity })
	}

	/// ICAO standard atmosphere at the given station altitude, dry air.
	#[must_use]
	pub fn icao(altitude_ft: f64) -> Self {
		let temperature_f = LAPSE_RATE_F_PER_FT.mul_add(altitude_ft, STANDARD_TEMPERATURE_F);
		let pressure_inhg = STANDARD_PRESSURE_INHG
			* PRESSURE_ALTITUDE_COEFF
				.mul_add(-altitude_ft, 1.0)
				.powf(PRESSURE_EXPONENT);
		Self {
			altitude_ft,
			pressure_inhg,
			temperature_f,
			humidity: 0.0,
		}
	}

	#[must_use]
	pub const fn altitude_ft(&self) -> f64 {
		self.altitude_ft
	}

	#[must_use]
	pub const fn pressure_inhg(&self) -> f64 {
		self.pressure_inhg
	}

	#[must_use]
	pub const fn temperature_f(&self) -> f64 {
		self.temperature_f
	}

	/// Density ratio (vs sea-level standard) and speed of sound (fps)
	/// at an arbitrary altitude, projected from station conditions.
	#[must_use]
	pub fn update_density_factor_and_mach_for_altitude(&self, altitude_ft: f64) -> (f64, f64) {
		let dz = altitude_ft - self.altitude_ft;
		let temperature_f = LAPSE_RATE_F_PER_FT.mul_add(dz, self.temperature_f);
		let pressure_inhg = self.pressure_inhg
			* PRESSURE_ALTITUDE_COEFF
				.mul_add(-dz, 1.0)
				.powf(PRESSURE_EXPONENT);
		let density = air_density(temperature_f, pressure_inhg, self.humidity);
		let mach_fps = SPEED_OF_SOUND_COEFF * (temperature_f + FAHRENHEIT_TO_RANKINE).sqrt();
		(density / STANDARD_DENSITY, mach_fps)
	}

	/// Density ratio and speed of sound at the station itself.
	#[must_use]
	pub fn density_factor_and_mach(&self) -> (f64, f64) {
		self.update_density_factor_and_mach_for_altitude(self.altitude_ft)
	}
}

/// Humidity-corrected air density in kg/m³.
fn air_density(temperature_f: f64, pressure_inhg: f64, humidity: f64) -> f64 {
	let t_c = (temperature_f - 32.0) / 1.8;
	let t_k = t_c + 273.15;
	let p_pa = pressure_inhg * PA_PER_INHG;

	// Saturation vapor pressure over water (Tetens), Pa.
	let es = 610.94 * ((17.625 * t_c) / (t_c + 243.04)).exp();
	let e = humidity * es;
	let pd = (p_pa - e).max(0.0);

	pd / (R_DRY * t_k) + e / (R_VAPOR * t_k)
}
