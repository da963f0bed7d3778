//! 16-dimensional Euclidean geometry: positions, distance, and the
//! uniform-in-hypersphere sampler used for neuron placement.

use crate::rng::EngineRng;

/// Dimensionality of the space every neuron and pulse lives in.
pub const DIMENSIONS: usize = 16;

/// A point (or displacement) in 16-dimensional Euclidean space.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position16(pub [f64; DIMENSIONS]);

impl Position16 {
    /// The origin.
    pub const ZERO: Position16 = Position16([0.0; DIMENSIONS]);

    /// Build from a raw coordinate array.
    pub const fn new(coords: [f64; DIMENSIONS]) -> Self {
        Self(coords)
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Position16) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Squared Euclidean distance, avoiding a `sqrt` when only comparisons
    /// against a radius are needed.
    pub fn distance_squared(&self, other: &Position16) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum()
    }

    /// Euclidean norm from the origin.
    pub fn norm(&self) -> f64 {
        self.distance(&Position16::ZERO)
    }

    /// Component-wise sum.
    pub fn add(&self, other: &Position16) -> Position16 {
        let mut out = [0.0; DIMENSIONS];
        for i in 0..DIMENSIONS {
            out[i] = self.0[i] + other.0[i];
        }
        Position16(out)
    }

    /// Component-wise difference (`self - other`).
    pub fn sub(&self, other: &Position16) -> Position16 {
        let mut out = [0.0; DIMENSIONS];
        for i in 0..DIMENSIONS {
            out[i] = self.0[i] - other.0[i];
        }
        Position16(out)
    }

    /// Scale every component by `factor`.
    pub fn scale(&self, factor: f64) -> Position16 {
        let mut out = [0.0; DIMENSIONS];
        for i in 0..DIMENSIONS {
            out[i] = self.0[i] * factor;
        }
        Position16(out)
    }

    /// Return this point, or one scaled down to lie on the surface of the
    /// hypersphere of `radius` centered at the origin, whichever is closer
    /// to the origin. Enforces the "always inside SpaceMaxDimension" invariant.
    pub fn clamp_to_hypersphere(&self, radius: f64) -> Position16 {
        let norm = self.norm();
        if norm <= radius || norm == 0.0 {
            *self
        } else {
            self.scale(radius / norm)
        }
    }

    /// Sample a point uniformly distributed within the 16-ball of the given
    /// radius, using the Gaussian-normalization method: draw 16 standard
    /// normal deviates, normalize to the unit sphere, then scale by
    /// `radius * u^(1/16)` for `u ~ U[0, 1)` so the radial density matches a
    /// uniform volume distribution rather than clustering on the surface.
    pub fn random_in_ball(rng: &mut EngineRng, radius: f64) -> Position16 {
        let mut coords = [0.0; DIMENSIONS];
        for c in coords.iter_mut() {
            *c = rng.standard_normal();
        }
        let point = Position16(coords);
        let norm = point.norm();
        let direction = if norm > 0.0 {
            point.scale(1.0 / norm)
        } else {
            point
        };
        let u = rng.uniform01();
        let scale = radius * u.powf(1.0 / DIMENSIONS as f64);
        direction.scale(scale)
    }
}
