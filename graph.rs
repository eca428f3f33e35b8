//! graph - Proximity edges between particles and towards the pointer
//! Edges are transient: produced lazily and consumed within one frame

use crate::store::Particle;

/// Last known cursor position in surface space.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub enum PointerState {
    /// Never entered or has left the surface.
    #[default]
    Away,
    At { x: f32, y: f32 },
}

impl PointerState {
    pub fn position(&self) -> Option<(f32, f32)> {
        match *self {
            PointerState::Away => None,
            PointerState::At { x, y } => Some((x, y)),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EdgeEnd {
    /// Index of the second particle, always greater than `Edge::from`.
    Particle(usize),
    Pointer,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Edge {
    pub from: usize,
    pub to: EdgeEnd,
    /// `1 - distance / threshold`, in (0, 1].
    pub strength: f32,
}

impl Edge {
    pub fn is_pointer(&self) -> bool {
        self.to == EdgeEnd::Pointer
    }
}

pub fn distance(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    libm::hypotf(bx - ax, by - ay)
}

/// Strength for a pair at `distance`, or `None` when it is not connected.
fn falloff(distance: f32, threshold: f32) -> Option<f32> {
    if !(threshold > 0.0 && distance < threshold) {
        return None;
    }
    // Rounding can push d/t to exactly 1 just under the threshold
    Some(1.0 - distance / threshold).filter(|strength| *strength > 0.0)
}

/// Yields every particle pair closer than `particle_threshold` (each unordered
/// pair once, as `i < j`), then every particle closer than `pointer_threshold`
/// to the pointer. A threshold of zero or less disables that class of edge.
///
/// PERF: O(n^2) in particle count. Fine for the tens of particles a section
/// draws; a bucket grid would be needed past a few hundred.
pub fn build_edges(
    particles: &[Particle],
    pointer: PointerState,
    particle_threshold: f32,
    pointer_threshold: f32,
) -> ProximityEdges<'_> {
    ProximityEdges {
        particles,
        pointer: pointer.position(),
        particle_threshold,
        pointer_threshold,
        i: 0,
        j: 1,
        pointer_index: 0,
    }
}

pub struct ProximityEdges<'a> {
    particles: &'a [Particle],
    pointer: Option<(f32, f32)>,
    particle_threshold: f32,
    pointer_threshold: f32,
    i: usize,
    j: usize,
    pointer_index: usize,
}

impl<'a> Iterator for ProximityEdges<'a> {
    type Item = Edge;

    fn next(&mut self) -> Option<Edge> {
        let n = self.particles.len();

        // Particle pairs
        if self.particle_threshold > 0.0 {
            while self.i < n {
                while self.j < n {
                    let (i, j) = (self.i, self.j);
                    self.j += 1;
                    let a = &self.particles[i];
                    let b = &self.particles[j];
                    if let Some(strength) =
                        falloff(distance(a.x, a.y, b.x, b.y), self.particle_threshold)
                    {
                        return Some(Edge {
                            from: i,
                            to: EdgeEnd::Particle(j),
                            strength,
                        });
                    }
                }
                self.i += 1;
                self.j = self.i + 1;
            }
        }

        // Pointer
        let (px, py) = self.pointer?;
        while self.pointer_index < n {
            let i = self.pointer_index;
            self.pointer_index += 1;
            let p = &self.particles[i];
            if let Some(strength) = falloff(distance(p.x, p.y, px, py), self.pointer_threshold) {
                return Some(Edge {
                    from: i,
                    to: EdgeEnd::Pointer,
                    strength,
                });
            }
        }
        None
    }
}
