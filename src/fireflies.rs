//! Fireflies drifting around the pet. Purely decorative until the jar is out;
//! the scoop catches any that come within reach of the pointer.

use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Firefly {
    pub(crate) x: f32,
    pub(crate) y: f32,
    vx: f32,
    vy: f32,
    pub(crate) phase: f32,
}

/// Cell-space rectangle the swarm stays inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Bounds {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) w: f32,
    pub(crate) h: f32,
}

pub(crate) struct Swarm {
    pub(crate) flies: Vec<Firefly>,
}

impl Swarm {
    pub(crate) fn new<R: Rng>(count: usize, bounds: Bounds, rng: &mut R) -> Self {
        let flies = (0..count).map(|_| spawn(bounds, rng)).collect();
        Self { flies }
    }

    pub(crate) fn step<R: Rng>(&mut self, dt: f32, bounds: Bounds, rng: &mut R) {
        for f in &mut self.flies {
            f.vx = (f.vx + rng.gen_range(-4.0..4.0) * dt).clamp(-3.0, 3.0);
            f.vy = (f.vy + rng.gen_range(-2.0..2.0) * dt).clamp(-1.5, 1.5);
            f.x += f.vx * dt;
            f.y += f.vy * dt;
            f.phase += dt * 3.0;

            // bounce off the edges; a collapsed area pins them to its origin
            let max_x = (bounds.x + bounds.w - 1.0).max(bounds.x);
            let max_y = (bounds.y + bounds.h - 1.0).max(bounds.y);
            if f.x < bounds.x || f.x > max_x {
                f.vx = -f.vx;
                f.x = f.x.clamp(bounds.x, max_x);
            }
            if f.y < bounds.y || f.y > max_y {
                f.vy = -f.vy;
                f.y = f.y.clamp(bounds.y, max_y);
            }
        }
    }

    /// Removes every firefly within `radius` cells of the point, respawning
    /// each one elsewhere. Returns how many were caught.
    pub(crate) fn catch_near<R: Rng>(
        &mut self,
        px: f32,
        py: f32,
        radius: f32,
        bounds: Bounds,
        rng: &mut R,
    ) -> u32 {
        let mut caught = 0;
        for f in &mut self.flies {
            // cells are about twice as tall as they are wide
            let (dx, dy) = (f.x - px, (f.y - py) * 2.0);
            if dx * dx + dy * dy <= radius * radius {
                *f = spawn(bounds, rng);
                caught += 1;
            }
        }
        caught
    }
}

fn spawn<R: Rng>(b: Bounds, rng: &mut R) -> Firefly {
    Firefly {
        x: b.x + rng.gen_range(0.0..b.w.max(1.0)),
        y: b.y + rng.gen_range(0.0..b.h.max(1.0)),
        vx: rng.gen_range(-1.0..1.0),
        vy: rng.gen_range(-0.5..0.5),
        phase: rng.gen_range(0.0..std::f32::consts::TAU),
    }
}
