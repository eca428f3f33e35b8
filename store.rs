//! store - Fixed-size particle storage
//! The particle set is created once per field and never grows or shrinks

use core::f32::consts::TAU;

use heapless::Vec;
use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::error::FieldError;
use crate::settings::Settings;

/// Size of the drawing surface in surface units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True while a resize reports a zero, negative or garbage dimension.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
            || !self.width.is_finite()
            || !self.height.is_finite()
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        (0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
    /// Current fill alpha, always in [0, 1].
    pub opacity: f32,
    pub base_opacity: f32,
    /// Pulse phase in radians.
    pub phase: f32,
}

impl Particle {
    pub const fn new(x: f32, y: f32, vx: f32, vy: f32, radius: f32, opacity: f32) -> Self {
        Self {
            x,
            y,
            vx,
            vy,
            radius,
            opacity,
            base_opacity: opacity,
            phase: 0.0,
        }
    }

    /// Positive radius, opacities in [0, 1] and finite motion state.
    pub fn is_valid(&self) -> bool {
        let finite = [self.x, self.y, self.vx, self.vy, self.phase]
            .iter()
            .all(|v| v.is_finite());
        finite
            && self.radius > 0.0
            && self.radius.is_finite()
            && (0.0..=1.0).contains(&self.opacity)
            && (0.0..=1.0).contains(&self.base_opacity)
    }
}

/// Particles owned by one renderer instance, at most `CAPACITY` of them.
pub struct ParticleField<const CAPACITY: usize> {
    particles: Vec<Particle, CAPACITY>,
}

impl<const CAPACITY: usize> ParticleField<CAPACITY> {
    /// Creates `count` particles scattered uniformly over `bounds`.
    ///
    /// The same RNG state always yields the same field. An empty axis places
    /// every particle at 0 on that axis.
    pub fn initialize<R: Rng>(
        count: usize,
        bounds: Bounds,
        settings: &Settings,
        rng: &mut R,
    ) -> Result<Self, FieldError> {
        settings.validate()?;
        if count > CAPACITY {
            return Err(FieldError::CapacityExceeded {
                requested: count,
                capacity: CAPACITY,
            });
        }

        let width = axis_extent(bounds.width);
        let height = axis_extent(bounds.height);

        let mut particles = Vec::new();
        for _ in 0..count {
            let x = rng.gen::<f32>() * width;
            let y = rng.gen::<f32>() * height;
            let vx = (rng.gen::<f32>() - 0.5) * 2.0 * settings.max_speed;
            let vy = (rng.gen::<f32>() - 0.5) * 2.0 * settings.max_speed;
            let radius = lerp(settings.radius_min, settings.radius_max, rng.gen());
            let opacity = lerp(settings.opacity_min, settings.opacity_max, rng.gen())
                .clamp(0.0, 1.0);
            let phase = rng.gen::<f32>() * TAU;

            let particle = Particle {
                phase,
                ..Particle::new(x, y, vx, vy, radius, opacity)
            };
            // Cannot fail, count was checked against CAPACITY
            let _ = particles.push(particle);
        }

        log::debug!(
            "initialized {} particles in {}x{}",
            count,
            bounds.width,
            bounds.height
        );
        Ok(Self { particles })
    }

    /// Builds `settings.particle_count` particles from `settings.rng_seed`,
    /// falling back to `entropy` when no seed is configured.
    pub fn seeded(bounds: Bounds, settings: &Settings, entropy: u64) -> Result<Self, FieldError> {
        let mut rng = SmallRng::seed_from_u64(settings.rng_seed.unwrap_or(entropy));
        Self::initialize(settings.particle_count, bounds, settings, &mut rng)
    }

    /// Wraps an existing set of particles, mostly useful for placing them by hand.
    pub fn from_particles(particles: &[Particle]) -> Result<Self, FieldError> {
        if let Some(index) = particles.iter().position(|p| !p.is_valid()) {
            return Err(FieldError::InvalidParticle { index });
        }
        Vec::from_slice(particles)
            .map(|particles| Self { particles })
            .map_err(|_| FieldError::CapacityExceeded {
                requested: particles.len(),
                capacity: CAPACITY,
            })
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable view for the physics step. The slice length cannot change.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }
}

fn axis_extent(dimension: f32) -> f32 {
    if dimension > 0.0 && dimension.is_finite() {
        dimension
    } else {
        0.0
    }
}

fn lerp(min: f32, max: f32, t: f32) -> f32 {
    min + (max - min) * t
}
