//! Exterior-ballistics trajectory engine core.
//!
//! This crate provides the numerical heart of a trajectory solver:
//! - Step-loop integrators (Euler, Euler–Cromer, RK4) under gravity,
//!   Mach-dependent drag, layered wind, and optional Coriolis
//! - A dense trajectory buffer with keyed lookup and monotone
//!   three-point interpolation over any component
//! - An event filter producing flagged records at distance/time steps
//!   and at the apex, Mach-1, and line-of-sight crossings
//! - The per-shot engine tying it together, with a stable error-code
//!   surface for embedders
//!
//! It is a library only: no I/O, no command line. One engine runs one
//! shot at a time; engines are independent, and [`batch`] fans a set
//! of shots across threads.

pub mod atmosphere;
pub mod batch;
pub mod buffer;
pub mod coriolis;
pub mod drag;
pub mod engine;
pub mod error;
pub mod filter;
pub mod integrator;
pub mod interp;
pub mod model;
pub mod shot;
pub mod tables;
pub mod vector;
pub mod wind;

pub use atmosphere::Atmosphere;
pub use buffer::TrajectoryBuffer;
pub use coriolis::Coriolis;
pub use drag::{CurveCache, DragCurve, DragModel, DragPoint};
pub use engine::{Config, Engine, Integration, MAX_SENTINEL};
pub use error::{EngineError, ErrorCode, ErrorStack, Result, Termination};
pub use filter::TrajectoryFilter;
pub use integrator::IntegratorKind;
pub use model::{InterpKey, Sample, TrajFlag, TrajectoryRecord};
pub use shot::{ShotProps, miller_stability};
pub use vector::V3;
pub use wind::{WindLayer, WindSock};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
