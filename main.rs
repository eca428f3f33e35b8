//! main.rs - Desktop host for the particle field
//! Stands in for the page: owns the window, the frame schedule and the listeners

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    text::{Baseline, Text},
};
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window,
};
use std::convert::Infallible;
use std::error::Error;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use particle_field::{BoundaryPolicy, Bounds, DriverState, FrameDriver, FrameHost, FrameRequest, Settings};

const WIDTH: u32 = 480;
const HEIGHT: u32 = 270;
const MAX_PARTICLES: usize = 64;
const TARGET_FPS: u32 = 60;

/// Frame schedule and listener registration for one driver.
#[derive(Default)]
struct WindowHost {
    next: u32,
    scheduled: Option<FrameRequest>,
    listening: bool,
}

impl WindowHost {
    fn new() -> Self {
        Self {
            listening: true,
            ..Self::default()
        }
    }
}

impl FrameHost for WindowHost {
    fn request_frame(&mut self) -> FrameRequest {
        self.next += 1;
        let request = FrameRequest(self.next);
        self.scheduled = Some(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.scheduled == Some(request) {
            self.scheduled = None;
        }
    }

    fn release_listeners(&mut self) {
        self.listening = false;
    }
}

type Driver = FrameDriver<WindowHost, MAX_PARTICLES>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Preset {
    Hero,
    Showcase,
}

impl Preset {
    fn settings(self) -> Settings {
        match self {
            Preset::Hero => Settings::hero(),
            Preset::Showcase => Settings::showcase(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Preset::Hero => "hero",
            Preset::Showcase => "showcase",
        }
    }
}

fn entropy() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(0)
}

/// Mounts a fresh field for `preset`, the way a section mounts its canvas.
fn mount(preset: Preset, display: &SimulatorDisplay<Rgb888>) -> Result<Driver, Box<dyn Error>> {
    let settings = preset.settings();
    let mut driver = FrameDriver::new(
        WindowHost::new(),
        settings,
        Bounds::new(WIDTH as f32, HEIGHT as f32),
        entropy(),
    )?;
    driver.start(Some(display));
    log::info!(
        "mounted {} field: {} particles, {:?} boundary",
        preset.name(),
        settings.particle_count,
        settings.boundary
    );
    Ok(driver)
}

fn draw_hud(
    display: &mut SimulatorDisplay<Rgb888>,
    preset: Preset,
    driver: &Driver,
) -> Result<(), Infallible> {
    let style = MonoTextStyle::new(&FONT_6X10, Rgb888::new(120, 100, 60));
    let policy = match driver.settings().boundary {
        BoundaryPolicy::Wrap => "wrap",
        BoundaryPolicy::Bounce => "bounce",
    };
    let status = format!(
        "{} | {} | {} particles",
        preset.name(),
        policy,
        driver.particles().len()
    );
    Text::with_baseline(&status, Point::new(5, 5), style, Baseline::Top).draw(display)?;
    Text::with_baseline(
        "1: Hero | 2: Showcase | Space: Reseed | Q: Quit",
        Point::new(5, HEIGHT as i32 - 15),
        style,
        Baseline::Top,
    )
    .draw(display)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut display = SimulatorDisplay::<Rgb888>::new(Size::new(WIDTH, HEIGHT));
    let output_settings = OutputSettingsBuilder::new().scale(2).build();
    let mut window = Window::new("Particle Field", &output_settings);

    let mut preset = Preset::Hero;
    let mut driver = mount(preset, &display)?;

    let frame_duration = Duration::from_secs_f32(1.0 / TARGET_FPS as f32);
    let mut last_frame = Instant::now();

    log::info!("controls: 1 hero, 2 showcase, space reseed, q quit");

    'main_loop: loop {
        let now = Instant::now();
        // Normalized to display refreshes, capped so a stall does not teleport particles
        let dt = (now.duration_since(last_frame).as_secs_f32() * TARGET_FPS as f32).min(4.0);
        last_frame = now;

        if driver.host().scheduled.is_some() {
            driver.host_mut().scheduled = None;
            if driver.tick(Some(&mut display), dt) == DriverState::Stopped {
                log::warn!("particle field stopped, background left blank");
            }
        }
        draw_hud(&mut display, preset, &driver)?;
        window.update(&display);

        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'main_loop,
                SimulatorEvent::MouseMove { point } if driver.host().listening => {
                    driver.pointer_moved(point.x as f32, point.y as f32);
                }
                SimulatorEvent::KeyDown { keycode, .. } => {
                    let key = format!("{:?}", keycode).to_lowercase();
                    let next = match key.as_str() {
                        "num1" => Some(Preset::Hero),
                        "num2" => Some(Preset::Showcase),
                        "space" => Some(preset),
                        "q" => break 'main_loop,
                        _ => None,
                    };
                    if let Some(next) = next {
                        // Unmount before the replacement takes the surface
                        driver.stop();
                        preset = next;
                        driver = mount(preset, &display)?;
                    }
                }
                _ => {}
            }
        }

        // Frame rate limiting
        let elapsed = now.elapsed();
        if elapsed < frame_duration {
            thread::sleep(frame_duration - elapsed);
        }
    }

    driver.stop();
    log::info!("particle field closed");
    Ok(())
}
