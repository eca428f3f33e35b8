//! settings - One parameterized configuration per section
//! Replaces the per-section copies of the canvas code with named presets

use embedded_graphics::pixelcolor::Rgb888;

use crate::error::SettingsError;

/// What happens when a particle leaves the surface.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BoundaryPolicy {
    /// Re-enter from the opposite edge, `(p + v*dt) mod dimension`.
    Wrap,
    /// Clamp to the edge and invert the velocity component.
    Bounce,
}

/// Glow circle drawn behind every particle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Halo {
    /// Extra radius on top of the particle radius.
    pub spread: f32,
    pub alpha: f32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GridKind {
    Lines,
    Dots,
}

/// Static background grid with a localized pointer highlight.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridStyle {
    pub kind: GridKind,
    /// Distance between grid lines or dots, in surface units.
    pub gap: f32,
    pub alpha: f32,
    /// Radius around the pointer within which the nearest grid point lights up.
    pub pointer_radius: f32,
    /// Extra alpha added at zero distance from the pointer.
    pub pointer_boost: f32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Settings {
    // Population
    pub particle_count: usize,
    pub max_speed: f32,
    pub radius_min: f32,
    pub radius_max: f32,
    pub opacity_min: f32,
    pub opacity_max: f32,
    /// Phase advance per frame for the opacity pulse, 0 keeps opacity fixed.
    pub pulse_speed: f32,

    // Physics
    pub boundary: BoundaryPolicy,

    // Connections
    pub particle_threshold: f32,
    /// 0 disables pointer edges.
    pub pointer_threshold: f32,
    pub edge_weight: f32,
    pub pointer_edge_weight: f32,

    // Look
    pub accent: Rgb888,
    pub background: Rgb888,
    pub halo: Option<Halo>,
    pub grid: Option<GridStyle>,

    /// Fraction of the remaining distance the drawn pointer covers each frame.
    pub pointer_ease: f32,

    /// `None` means seed from caller-provided entropy.
    pub rng_seed: Option<u64>,
}

const ACCENT: Rgb888 = Rgb888::new(240, 176, 32);
const BACKGROUND: Rgb888 = Rgb888::new(8, 8, 12);

impl Settings {
    /// Full-viewport hero background: wrapping dust, line grid, pointer web.
    pub const fn hero() -> Self {
        Self {
            particle_count: 60,
            max_speed: 0.15,
            radius_min: 0.5,
            radius_max: 2.5,
            opacity_min: 0.2,
            opacity_max: 0.7,
            pulse_speed: 0.0,
            boundary: BoundaryPolicy::Wrap,
            particle_threshold: 120.0,
            pointer_threshold: 200.0,
            edge_weight: 0.08,
            pointer_edge_weight: 0.15,
            accent: ACCENT,
            background: BACKGROUND,
            halo: None,
            grid: Some(GridStyle {
                kind: GridKind::Lines,
                gap: 60.0,
                alpha: 0.04,
                pointer_radius: 120.0,
                pointer_boost: 0.3,
            }),
            pointer_ease: 1.0,
            rng_seed: None,
        }
    }

    /// Network graph panel: bouncing nodes with glow, no pointer interaction.
    pub const fn showcase() -> Self {
        Self {
            particle_count: 40,
            max_speed: 0.25,
            radius_min: 2.0,
            radius_max: 5.0,
            opacity_min: 0.8,
            opacity_max: 0.8,
            pulse_speed: 0.0,
            boundary: BoundaryPolicy::Bounce,
            particle_threshold: 200.0,
            pointer_threshold: 0.0,
            edge_weight: 0.25,
            pointer_edge_weight: 0.0,
            accent: ACCENT,
            background: BACKGROUND,
            halo: Some(Halo { spread: 6.0, alpha: 0.12 }),
            grid: None,
            pointer_ease: 1.0,
            rng_seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.radius_min > 0.0 && self.radius_min <= self.radius_max)
            || !self.radius_max.is_finite()
        {
            return Err(SettingsError::RadiusRange);
        }
        if !(0.0..=1.0).contains(&self.opacity_min)
            || !(0.0..=1.0).contains(&self.opacity_max)
            || self.opacity_min > self.opacity_max
        {
            return Err(SettingsError::OpacityRange);
        }

        non_negative(self.max_speed, "max_speed")?;
        non_negative(self.pulse_speed, "pulse_speed")?;
        non_negative(self.particle_threshold, "particle_threshold")?;
        non_negative(self.pointer_threshold, "pointer_threshold")?;
        unit(self.edge_weight, "edge_weight")?;
        unit(self.pointer_edge_weight, "pointer_edge_weight")?;

        if !(self.pointer_ease > 0.0 && self.pointer_ease <= 1.0) {
            return Err(SettingsError::InvalidValue("pointer_ease"));
        }
        if let Some(halo) = self.halo {
            non_negative(halo.spread, "halo.spread")?;
            unit(halo.alpha, "halo.alpha")?;
        }
        if let Some(grid) = self.grid {
            if !(grid.gap > 0.0 && grid.gap.is_finite()) {
                return Err(SettingsError::InvalidValue("grid.gap"));
            }
            unit(grid.alpha, "grid.alpha")?;
            unit(grid.pointer_boost, "grid.pointer_boost")?;
            non_negative(grid.pointer_radius, "grid.pointer_radius")?;
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::hero()
    }
}

fn non_negative(value: f32, name: &'static str) -> Result<(), SettingsError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SettingsError::InvalidValue(name))
    }
}

fn unit(value: f32, name: &'static str) -> Result<(), SettingsError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::InvalidValue(name))
    }
}
