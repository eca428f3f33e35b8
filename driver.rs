//! driver - Frame loop lifecycle for one particle field
//! Idle -> Running -> Stopped, one tick per display refresh

use embedded_graphics::{pixelcolor::Rgb888, prelude::*};

use crate::error::FieldError;
use crate::graph::{build_edges, PointerState};
use crate::physics;
use crate::render::Renderer;
use crate::settings::Settings;
use crate::store::{Bounds, Particle, ParticleField};

/// Handle for a scheduled frame callback.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u32);

/// Scheduling and listener hooks supplied by whatever hosts the field.
pub trait FrameHost {
    /// Schedules the next tick at the display refresh rate.
    fn request_frame(&mut self) -> FrameRequest;
    fn cancel_frame(&mut self, request: FrameRequest);
    /// Detaches pointer and resize listeners.
    fn release_listeners(&mut self);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
    Stopped,
}

pub struct FrameDriver<H: FrameHost, const CAPACITY: usize> {
    host: H,
    settings: Settings,
    field: ParticleField<CAPACITY>,
    renderer: Renderer,
    bounds: Bounds,
    // Raw position from the host and the smoothed one everything draws with
    pointer: PointerState,
    eased: PointerState,
    pending: Option<FrameRequest>,
    state: DriverState,
}

impl<H: FrameHost, const CAPACITY: usize> FrameDriver<H, CAPACITY> {
    /// Initializes the particle store. The loop does not run until `start`.
    pub fn new(host: H, settings: Settings, bounds: Bounds, entropy: u64) -> Result<Self, FieldError> {
        let field = ParticleField::seeded(bounds, &settings, entropy)?;
        Self::with_field(host, settings, bounds, field)
    }

    pub fn with_field(
        host: H,
        settings: Settings,
        bounds: Bounds,
        field: ParticleField<CAPACITY>,
    ) -> Result<Self, FieldError> {
        settings.validate()?;
        Ok(Self {
            renderer: Renderer::new(&settings, bounds),
            host,
            settings,
            field,
            bounds,
            pointer: PointerState::Away,
            eased: PointerState::Away,
            pending: None,
            state: DriverState::Idle,
        })
    }

    /// Begins the frame loop. Without a surface this is a no-op and the
    /// driver stays idle.
    pub fn start<D: Dimensions>(&mut self, surface: Option<&D>) -> DriverState {
        if self.state != DriverState::Idle {
            log::debug!("start ignored in state {:?}", self.state);
            return self.state;
        }
        if surface.is_none() {
            log::warn!("drawing surface unavailable, particle field not started");
            return self.state;
        }

        self.pending = Some(self.host.request_frame());
        self.state = DriverState::Running;
        log::debug!("particle field running with {} particles", self.field.len());
        self.state
    }

    /// Runs one frame: physics, edges, draw, then schedules the next one.
    ///
    /// A missing surface or a failing draw stops the loop for good.
    pub fn tick<D>(&mut self, surface: Option<&mut D>, dt: f32) -> DriverState
    where
        D: DrawTarget,
        D::Color: From<Rgb888>,
    {
        if self.state != DriverState::Running {
            return self.state;
        }
        // The request that brought us here has fired
        self.pending = None;

        let Some(surface) = surface else {
            log::warn!("drawing surface removed while running, stopping");
            self.stop();
            return self.state;
        };

        self.ease_pointer();

        physics::step(
            self.field.particles_mut(),
            self.bounds,
            self.settings.boundary,
            dt,
            self.settings.pulse_speed,
        );

        let particles = self.field.particles();
        let edges = build_edges(
            particles,
            self.eased,
            self.settings.particle_threshold,
            self.settings.pointer_threshold,
        );
        let drawn = self.renderer.draw(surface, particles, edges, self.eased);

        if drawn.is_err() {
            log::warn!("draw failed, stopping particle field");
            self.stop();
            return self.state;
        }

        self.pending = Some(self.host.request_frame());
        self.state
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.pointer = PointerState::At { x, y };
    }

    pub fn pointer_left(&mut self) {
        self.pointer = PointerState::Away;
    }

    /// Takes effect on the next tick.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.bounds = Bounds::new(width, height);
        self.renderer.resize(self.bounds);
        log::debug!("particle field resized to {}x{}", width, height);
    }

    /// Cancels the pending frame and releases listeners. Safe to call again.
    pub fn stop(&mut self) {
        if self.state == DriverState::Stopped {
            return;
        }
        if let Some(request) = self.pending.take() {
            self.host.cancel_frame(request);
        }
        self.host.release_listeners();
        self.state = DriverState::Stopped;
        log::debug!("particle field stopped");
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn particles(&self) -> &[Particle] {
        self.field.particles()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Pointer position as last drawn, after easing.
    pub fn pointer(&self) -> PointerState {
        self.eased
    }

    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn ease_pointer(&mut self) {
        let ease = self.settings.pointer_ease;
        self.eased = match (self.pointer, self.eased) {
            (PointerState::At { x, y }, PointerState::At { x: ex, y: ey }) if ease < 1.0 => {
                PointerState::At {
                    x: ex + (x - ex) * ease,
                    y: ey + (y - ey) * ease,
                }
            }
            // Snap on entry, on leave and when easing is off
            (raw, _) => raw,
        };
    }
}

impl<H: FrameHost, const CAPACITY: usize> Drop for FrameDriver<H, CAPACITY> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    use crate::testing::{Canvas, CountingHost, UNTOUCHED};

    type Driver = FrameDriver<CountingHost, 60>;

    fn settings() -> Settings {
        Settings {
            grid: None,
            halo: None,
            ..Settings::hero().with_seed(42)
        }
    }

    fn running() -> Driver {
        let mut driver =
            Driver::new(CountingHost::default(), settings(), Bounds::new(32.0, 32.0), 0).unwrap();
        assert_eq!(driver.start(Some(&Canvas::new())), DriverState::Running);
        driver
    }

    #[test]
    fn new_driver_is_idle_with_full_field() {
        let driver =
            Driver::new(CountingHost::default(), settings(), Bounds::new(32.0, 32.0), 0).unwrap();
        assert_eq!(driver.state(), DriverState::Idle);
        assert_eq!(driver.particles().len(), 60);
        assert_eq!(driver.host().requested, 0);
    }

    #[test]
    fn start_without_surface_is_a_no_op() {
        let mut driver =
            Driver::new(CountingHost::default(), settings(), Bounds::new(32.0, 32.0), 0).unwrap();
        assert_eq!(driver.start::<Canvas>(None), DriverState::Idle);
        assert_eq!(driver.host().requested, 0);

        let mut canvas = Canvas::new();
        assert_eq!(driver.tick(Some(&mut canvas), 1.0), DriverState::Idle);
        assert_eq!(canvas.draws, 0);
    }

    #[test]
    fn every_tick_requests_the_next_frame() {
        let mut driver = running();
        let mut canvas = Canvas::new();
        for _ in 0..3 {
            assert_eq!(driver.tick(Some(&mut canvas), 1.0), DriverState::Running);
        }
        assert_eq!(driver.host().requested, 4);
        assert_eq!(driver.pending(), Some(FrameRequest(4)));
        assert!(canvas.draws > 0);
        for p in driver.particles() {
            assert!(driver.bounds().contains(p.x, p.y));
        }
    }

    #[test]
    fn start_twice_does_not_double_schedule() {
        let mut driver = running();
        assert_eq!(driver.start(Some(&Canvas::new())), DriverState::Running);
        assert_eq!(driver.host().requested, 1);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut driver = running();
        driver.stop();
        driver.stop();
        assert_eq!(driver.state(), DriverState::Stopped);
        assert_eq!(driver.host().cancelled.as_slice(), &[FrameRequest(1)]);
        assert_eq!(driver.host().releases, 1);
        assert_eq!(driver.pending(), None);

        let mut canvas = Canvas::new();
        assert_eq!(driver.tick(Some(&mut canvas), 1.0), DriverState::Stopped);
        assert_eq!(canvas.draws, 0);
        assert_eq!(driver.start(Some(&canvas)), DriverState::Stopped);
    }

    #[test]
    fn stopping_an_idle_driver_releases_listeners() {
        let mut driver =
            Driver::new(CountingHost::default(), settings(), Bounds::new(32.0, 32.0), 0).unwrap();
        driver.stop();
        assert!(driver.host().cancelled.is_empty());
        assert_eq!(driver.host().releases, 1);
    }

    #[test]
    fn failing_draw_stops_the_loop() {
        let mut driver = running();
        let mut canvas = Canvas::new();
        canvas.lose();
        assert_eq!(driver.tick(Some(&mut canvas), 1.0), DriverState::Stopped);
        // The fired request is not cancelled again and nothing new is scheduled
        assert!(driver.host().cancelled.is_empty());
        assert_eq!(driver.host().requested, 1);
        assert_eq!(driver.host().releases, 1);
    }

    #[test]
    fn missing_surface_stops_the_loop() {
        let mut driver = running();
        assert_eq!(driver.tick::<Canvas>(None, 1.0), DriverState::Stopped);
        assert_eq!(driver.host().releases, 1);
    }

    #[test]
    fn zero_sized_resize_skips_frames() {
        let mut driver = running();
        let before: heapless::Vec<Particle, 60> = driver.particles().iter().copied().collect();
        driver.resize(0.0, 0.0);

        let mut canvas = Canvas::new();
        assert_eq!(driver.tick(Some(&mut canvas), 1.0), DriverState::Running);
        assert_eq!(driver.particles(), before.as_slice());
        assert_eq!(canvas.at(0, 0), UNTOUCHED);

        driver.resize(32.0, 32.0);
        driver.tick(Some(&mut canvas), 1.0);
        assert_ne!(canvas.at(0, 0), UNTOUCHED);
    }

    #[test]
    fn physics_runs_before_edges() {
        let settings = Settings {
            particle_threshold: 20.0,
            pointer_threshold: 0.0,
            edge_weight: 1.0,
            ..settings()
        };
        let field = ParticleField::from_particles(&[
            Particle::new(5.0, 16.0, 1.0, 0.0, 0.5, 1.0),
            Particle::new(25.0, 16.0, -1.0, 0.0, 0.5, 1.0),
        ])
        .unwrap();
        let mut driver: FrameDriver<CountingHost, 2> =
            FrameDriver::with_field(CountingHost::default(), settings, Bounds::new(32.0, 32.0), field)
                .unwrap();
        let mut canvas = Canvas::new();
        driver.start(Some(&canvas));
        driver.tick(Some(&mut canvas), 1.0);

        // 20 apart before the step, 18 after: only the moved pair connects
        let renderer = Renderer::new(&settings, Bounds::new(32.0, 32.0));
        assert_eq!(canvas.at(15, 16), renderer.shade(1.0 - 18.0 / 20.0));
        assert_eq!(canvas.at(6, 16), settings.accent);
    }

    #[test]
    fn with_field_rejects_invalid_settings() {
        let field: ParticleField<2> =
            ParticleField::from_particles(&[Particle::new(5.0, 5.0, 0.0, 0.0, 1.0, 0.5)]).unwrap();
        let settings = Settings {
            pointer_ease: f32::NAN,
            radius_min: -3.0,
            ..settings()
        };
        let result =
            FrameDriver::with_field(CountingHost::default(), settings, Bounds::new(32.0, 32.0), field);
        assert!(matches!(result, Err(FieldError::Settings(_))));
    }

    #[test]
    fn pointer_is_eased_after_entry() {
        let settings = Settings { pointer_ease: 0.5, ..settings() };
        let mut driver: Driver =
            FrameDriver::new(CountingHost::default(), settings, Bounds::new(32.0, 32.0), 0).unwrap();
        let mut canvas = Canvas::new();
        driver.start(Some(&canvas));

        driver.pointer_moved(10.0, 10.0);
        driver.tick(Some(&mut canvas), 1.0);
        assert_eq!(driver.pointer(), PointerState::At { x: 10.0, y: 10.0 });

        driver.pointer_moved(20.0, 30.0);
        driver.tick(Some(&mut canvas), 1.0);
        assert_eq!(driver.pointer(), PointerState::At { x: 15.0, y: 20.0 });

        driver.pointer_left();
        driver.tick(Some(&mut canvas), 1.0);
        assert_eq!(driver.pointer(), PointerState::Away);
    }

    struct Watched<'a>(&'a Cell<u32>);

    impl FrameHost for Watched<'_> {
        fn request_frame(&mut self) -> FrameRequest {
            FrameRequest(7)
        }

        fn cancel_frame(&mut self, _request: FrameRequest) {
            self.0.set(self.0.get() + 10);
        }

        fn release_listeners(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn drop_tears_down_a_running_driver() {
        let teardown = Cell::new(0);
        {
            let mut driver: FrameDriver<Watched<'_>, 60> =
                FrameDriver::new(Watched(&teardown), settings(), Bounds::new(32.0, 32.0), 0)
                    .unwrap();
            driver.start(Some(&Canvas::new()));
        }
        // One cancel and one release
        assert_eq!(teardown.get(), 11);
    }
}
