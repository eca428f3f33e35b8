//! physics - Per-frame particle advance with a boundary policy

use crate::settings::BoundaryPolicy;
use crate::store::{Bounds, Particle};

/// Advances every particle by `velocity * dt` and keeps it on the surface.
///
/// `dt` is measured in frames, 1.0 for one display refresh at the nominal rate.
/// Empty bounds and non-positive `dt` leave the particles untouched.
pub fn step(
    particles: &mut [Particle],
    bounds: Bounds,
    policy: BoundaryPolicy,
    dt: f32,
    pulse_speed: f32,
) {
    if bounds.is_empty() || !(dt > 0.0 && dt.is_finite()) {
        return;
    }

    for p in particles.iter_mut() {
        p.x += p.vx * dt;
        p.y += p.vy * dt;

        match policy {
            BoundaryPolicy::Wrap => {
                p.x = wrap(p.x, bounds.width);
                p.y = wrap(p.y, bounds.height);
            }
            BoundaryPolicy::Bounce => {
                bounce(&mut p.x, &mut p.vx, bounds.width);
                bounce(&mut p.y, &mut p.vy, bounds.height);
            }
        }

        if pulse_speed > 0.0 {
            p.phase = wrap(p.phase + pulse_speed * dt, core::f32::consts::TAU);
            p.opacity = pulse(p.base_opacity, p.phase);
        }
    }
}

/// Euclidean remainder, so `-1 mod 100 == 99`. The result lies in `[0, dimension]`.
fn wrap(value: f32, dimension: f32) -> f32 {
    let r = value % dimension;
    if r < 0.0 {
        r + dimension
    } else {
        r
    }
}

fn bounce(position: &mut f32, velocity: &mut f32, dimension: f32) {
    if *position < 0.0 {
        *position = 0.0;
        *velocity = libm::fabsf(*velocity);
    } else if *position > dimension {
        *position = dimension;
        *velocity = -libm::fabsf(*velocity);
    }
}

fn pulse(base: f32, phase: f32) -> f32 {
    (base * (0.75 + 0.25 * libm::sinf(phase))).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    use crate::settings::Settings;
    use crate::store::ParticleField;

    fn single(x: f32, y: f32, vx: f32, vy: f32) -> [Particle; 1] {
        [Particle::new(x, y, vx, vy, 1.0, 0.5)]
    }

    #[test]
    fn wrap_moves_without_crossing() {
        let mut particles = single(5.0, 5.0, -1.0, -1.0);
        step(&mut particles, Bounds::new(100.0, 100.0), BoundaryPolicy::Wrap, 1.0, 0.0);
        assert_eq!((particles[0].x, particles[0].y), (4.0, 4.0));
        assert_eq!((particles[0].vx, particles[0].vy), (-1.0, -1.0));
    }

    #[test]
    fn wrap_reenters_from_opposite_edge() {
        let mut particles = single(0.5, 99.5, -1.0, 1.0);
        step(&mut particles, Bounds::new(100.0, 100.0), BoundaryPolicy::Wrap, 1.0, 0.0);
        assert_eq!((particles[0].x, particles[0].y), (99.5, 0.5));
    }

    #[test]
    fn bounce_clamps_and_flips() {
        let mut particles = single(0.5, 99.5, -1.0, 1.0);
        step(&mut particles, Bounds::new(100.0, 100.0), BoundaryPolicy::Bounce, 1.0, 0.0);
        let p = particles[0];
        assert_eq!((p.x, p.y), (0.0, 100.0));
        assert_eq!((p.vx, p.vy), (1.0, -1.0));

        // Heads back inside on the next frame
        step(&mut particles, Bounds::new(100.0, 100.0), BoundaryPolicy::Bounce, 1.0, 0.0);
        assert_eq!((particles[0].x, particles[0].y), (1.0, 99.0));
    }

    #[test]
    fn particles_never_escape() {
        let settings = Settings {
            max_speed: 7.0,
            ..Settings::hero()
        };
        let bounds = Bounds::new(64.0, 48.0);
        for policy in [BoundaryPolicy::Wrap, BoundaryPolicy::Bounce] {
            let mut rng = SmallRng::seed_from_u64(11);
            let mut field: ParticleField<60> =
                ParticleField::initialize(60, bounds, &settings, &mut rng).unwrap();
            for frame in 0..500 {
                let dt = if frame % 3 == 0 { 2.5 } else { 1.0 };
                step(field.particles_mut(), bounds, policy, dt, 0.0);
                for p in field.particles() {
                    assert!(bounds.contains(p.x, p.y), "{:?} escaped with {:?}", p, policy);
                }
            }
        }
    }

    #[test]
    fn empty_bounds_skip_the_frame() {
        let mut particles = single(5.0, 5.0, 1.0, 1.0);
        for bounds in [Bounds::new(0.0, 0.0), Bounds::new(-3.0, 10.0)] {
            step(&mut particles, bounds, BoundaryPolicy::Wrap, 1.0, 0.1);
            step(&mut particles, bounds, BoundaryPolicy::Bounce, 1.0, 0.1);
        }
        assert_eq!(particles[0], Particle::new(5.0, 5.0, 1.0, 1.0, 1.0, 0.5));
    }

    #[test]
    fn non_positive_dt_is_ignored() {
        let mut particles = single(5.0, 5.0, 1.0, 1.0);
        step(&mut particles, Bounds::new(10.0, 10.0), BoundaryPolicy::Wrap, 0.0, 0.0);
        step(&mut particles, Bounds::new(10.0, 10.0), BoundaryPolicy::Wrap, f32::NAN, 0.0);
        assert_eq!((particles[0].x, particles[0].y), (5.0, 5.0));
    }

    #[test]
    fn pulse_keeps_opacity_in_range() {
        let mut particles = [Particle::new(1.0, 1.0, 0.0, 0.0, 1.0, 1.0)];
        let mut seen_dim = false;
        for _ in 0..200 {
            step(&mut particles, Bounds::new(10.0, 10.0), BoundaryPolicy::Wrap, 1.0, 0.1);
            let opacity = particles[0].opacity;
            assert!((0.0..=1.0).contains(&opacity));
            seen_dim |= opacity < 0.6;
        }
        assert!(seen_dim);
        assert_eq!(particles[0].base_opacity, 1.0);
    }
}
