use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// An integer cell coordinate on the simulation grid.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    /// Creates a new GridPos.
    pub fn new(x: i32, y: i32) -> Self {
        GridPos { x, y }
    }

    /// Returns true if the position lies inside a `width` x `height` grid.
    pub fn in_bounds(&self, width: u32, height: u32) -> bool {
        self.x >= 0 && self.y >= 0 && (self.x as u32) < width && (self.y as u32) < height
    }

    /// The four orthogonal neighbors (von Neumann neighborhood, center excluded).
    /// On a torus the coordinates wrap; otherwise out-of-bounds neighbors are dropped.
    pub fn von_neumann(&self, width: u32, height: u32, torus: bool) -> Vec<GridPos> {
        let offsets = [(0, -1), (-1, 0), (1, 0), (0, 1)];
        let (w, h) = (width as i32, height as i32);
        let mut out = Vec::with_capacity(4);
        for (dx, dy) in offsets {
            let candidate = *self + GridPos::new(dx, dy);
            if torus {
                let wrapped = GridPos::new(candidate.x.rem_euclid(w), candidate.y.rem_euclid(h));
                // Tiny grids can wrap two offsets onto the same cell
                if wrapped != *self && !out.contains(&wrapped) {
                    out.push(wrapped);
                }
            } else if candidate.in_bounds(width, height) {
                out.push(candidate);
            }
        }
        out
    }

    /// One step towards `target` along the axis with the larger absolute difference.
    /// Ties (including diagonals) move along y. Returns `self` if already there.
    pub fn step_towards(&self, target: GridPos) -> GridPos {
        let d = target - *self;
        if d.x.abs() > d.y.abs() {
            *self + GridPos::new(d.x.signum(), 0)
        } else {
            *self + GridPos::new(0, d.y.signum())
        }
    }
}

impl Add for GridPos {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self { x: self.x + other.x, y: self.y + other.y }
    }
}

impl Sub for GridPos {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self { x: self.x - other.x, y: self.y - other.y }
    }
}

/// A position in the rendered 3D scene.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Vec3 { x, y, z }
    }

    /// Maps a planar simulation coordinate onto the scene floor.
    /// Simulation `x` stays on the x axis, simulation `y` goes to z, and `height` is the y axis.
    pub fn from_planar(x: i32, y: i32, height: f32) -> Self {
        Vec3 { x: x as f32, y: height, z: y as f32 }
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(v: [f32; 3]) -> Self {
        Vec3::new(v[0], v[1], v[2])
    }
}
