//! particle_field - Animated particle field with proximity lines
//! No heap allocation, no_std compatible, draws onto any embedded-graphics target
//!
//! Each frame the [`FrameDriver`] advances the particles, connects the ones
//! that are close to each other or to the pointer, and redraws the surface.

#![no_std]

pub mod driver;
pub mod error;
pub mod graph;
pub mod physics;
pub mod render;
pub mod settings;
pub mod store;

#[cfg(test)]
mod testing;

pub use driver::{DriverState, FrameDriver, FrameHost, FrameRequest};
pub use error::{FieldError, SettingsError};
pub use graph::{build_edges, Edge, EdgeEnd, PointerState, ProximityEdges};
pub use physics::step;
pub use render::{GridLayout, Renderer};
pub use settings::{BoundaryPolicy, GridKind, GridStyle, Halo, Settings};
pub use store::{Bounds, Particle, ParticleField};
