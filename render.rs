//! render - Draws one frame of the field onto an embedded-graphics surface
//! Grid first, then edges, then halos and dots; never touches particle state

use embedded_graphics::{
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle},
};

use crate::graph::{distance, Edge, EdgeEnd, PointerState};
use crate::settings::{GridKind, GridStyle, Halo, Settings};
use crate::store::{Bounds, Particle};

/// Grid geometry derived from the surface size.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridLayout {
    pub columns: u32,
    pub rows: u32,
    pub gap: f32,
}

impl GridLayout {
    /// Grid lines sit at `k * gap` for every `k * gap < dimension`.
    fn compute(bounds: Bounds, gap: f32) -> Option<Self> {
        if bounds.is_empty() || !(gap > 0.0 && gap.is_finite()) {
            return None;
        }
        Some(Self {
            columns: libm::ceilf(bounds.width / gap) as u32,
            rows: libm::ceilf(bounds.height / gap) as u32,
            gap,
        })
    }
}

pub struct Renderer {
    accent: Rgb888,
    background: Rgb888,
    edge_weight: f32,
    pointer_edge_weight: f32,
    halo: Option<Halo>,
    grid: Option<GridStyle>,
    bounds: Bounds,
    layout: Option<GridLayout>,
}

impl Renderer {
    pub fn new(settings: &Settings, bounds: Bounds) -> Self {
        let mut renderer = Self {
            accent: settings.accent,
            background: settings.background,
            edge_weight: settings.edge_weight,
            pointer_edge_weight: settings.pointer_edge_weight,
            halo: settings.halo,
            grid: settings.grid,
            bounds,
            layout: None,
        };
        renderer.resize(bounds);
        renderer
    }

    /// Recomputes every size-dependent value. Call before the next draw.
    pub fn resize(&mut self, bounds: Bounds) {
        self.bounds = bounds;
        self.layout = self
            .grid
            .and_then(|grid| GridLayout::compute(bounds, grid.gap));
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn grid_layout(&self) -> Option<GridLayout> {
        self.layout
    }

    /// Accent colour at `alpha` over the background. There is no read-back
    /// from the target, so every shape blends against the background only.
    pub fn shade(&self, alpha: f32) -> Rgb888 {
        blend(self.background, self.accent, alpha)
    }

    pub fn draw<D, I>(
        &self,
        target: &mut D,
        particles: &[Particle],
        edges: I,
        pointer: PointerState,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget,
        D::Color: From<Rgb888>,
        I: IntoIterator<Item = Edge>,
    {
        if self.bounds.is_empty() {
            return Ok(());
        }

        let background: D::Color = self.background.into();
        target.clear(background)?;

        if let (Some(grid), Some(layout)) = (self.grid, self.layout) {
            self.draw_grid(target, grid, layout, pointer)?;
        }

        // Edges
        for edge in edges {
            let Some(a) = particles.get(edge.from) else {
                continue;
            };
            let (end, weight) = match edge.to {
                EdgeEnd::Particle(j) => match particles.get(j) {
                    Some(b) => ((b.x, b.y), self.edge_weight),
                    None => continue,
                },
                EdgeEnd::Pointer => match pointer.position() {
                    Some(at) => (at, self.pointer_edge_weight),
                    None => continue,
                },
            };
            let color: D::Color = self.shade(edge.strength * weight).into();
            Line::new(to_point(a.x, a.y), to_point(end.0, end.1))
                .into_styled(PrimitiveStyle::with_stroke(color, 1))
                .draw(target)?;
        }

        // Particles
        for p in particles {
            let center = to_point(p.x, p.y);
            if let Some(halo) = self.halo {
                let glow: D::Color = self.shade(halo.alpha).into();
                Circle::with_center(center, diameter(p.radius + halo.spread))
                    .into_styled(PrimitiveStyle::with_fill(glow))
                    .draw(target)?;
            }
            let fill: D::Color = self.shade(p.opacity).into();
            Circle::with_center(center, diameter(p.radius))
                .into_styled(PrimitiveStyle::with_fill(fill))
                .draw(target)?;
        }

        Ok(())
    }

    fn draw_grid<D>(
        &self,
        target: &mut D,
        grid: GridStyle,
        layout: GridLayout,
        pointer: PointerState,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget,
        D::Color: From<Rgb888>,
    {
        let base: D::Color = self.shade(grid.alpha).into();
        let (width, height) = (self.bounds.width, self.bounds.height);

        match grid.kind {
            GridKind::Lines => {
                let style = PrimitiveStyle::with_stroke(base, 1);
                for column in 0..layout.columns {
                    let x = column as f32 * layout.gap;
                    Line::new(to_point(x, 0.0), to_point(x, height))
                        .into_styled(style)
                        .draw(target)?;
                }
                for row in 0..layout.rows {
                    let y = row as f32 * layout.gap;
                    Line::new(to_point(0.0, y), to_point(width, y))
                        .into_styled(style)
                        .draw(target)?;
                }
            }
            GridKind::Dots => {
                for row in 0..layout.rows {
                    for column in 0..layout.columns {
                        let point = to_point(column as f32 * layout.gap, row as f32 * layout.gap);
                        Pixel(point, base).draw(target)?;
                    }
                }
            }
        }

        // Pointer highlight on the grid point nearest to the pointer
        let Some((px, py)) = pointer.position() else {
            return Ok(());
        };
        let reach = grid.pointer_radius;
        if reach <= 0.0 || layout.columns == 0 || layout.rows == 0 {
            return Ok(());
        }
        let gx = nearest_index(px, layout.gap, layout.columns) as f32 * layout.gap;
        let gy = nearest_index(py, layout.gap, layout.rows) as f32 * layout.gap;
        let d = distance(gx, gy, px, py);
        if d >= reach {
            return Ok(());
        }
        let falloff = 1.0 - d / reach;
        let color: D::Color = self.shade(grid.alpha + grid.pointer_boost * falloff).into();
        // Grows from one pixel up to a radius of 2 right under the pointer
        Circle::with_center(to_point(gx, gy), diameter(0.5 + 1.5 * falloff))
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(target)?;
        Ok(())
    }
}

/// Index of the grid line closest to `center`, clamped to `0..count`.
fn nearest_index(center: f32, gap: f32, count: u32) -> u32 {
    let index = libm::roundf(center / gap).clamp(0.0, (count - 1) as f32);
    index as u32
}

pub fn blend(background: Rgb888, accent: Rgb888, alpha: f32) -> Rgb888 {
    let alpha = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
    let mix = |b: u8, f: u8| libm::roundf(b as f32 + (f as f32 - b as f32) * alpha) as u8;
    Rgb888::new(
        mix(background.r(), accent.r()),
        mix(background.g(), accent.g()),
        mix(background.b(), accent.b()),
    )
}

fn to_point(x: f32, y: f32) -> Point {
    Point::new(libm::roundf(x) as i32, libm::roundf(y) as i32)
}

fn diameter(radius: f32) -> u32 {
    (libm::roundf(radius * 2.0) as u32).max(1)
}
