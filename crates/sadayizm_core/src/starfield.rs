//! Decorative starfield simulation.
//!
//! Stars drift away from the screen center with a simple perspective
//! projection and are recycled once they leave the bounds or run out of
//! depth. Drawing is the host's job; this module only advances state.

use rand::Rng;
use serde::Serialize;

/// Star count used by the landing page.
pub const DEFAULT_STAR_COUNT: usize = 200;

const DRIFT: f64 = 0.05;
const DEPTH_STEP: f64 = 0.2;
const MIN_DEPTH: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Star {
    pub x: f64,
    pub y: f64,
    /// Depth; smaller is closer and moves faster.
    pub z: f64,
    pub opacity: f64,
    pub radius: f64,
}

impl Star {
    fn random<R: Rng>(rng: &mut R, width: f64, height: f64) -> Self {
        Self {
            x: rng.random::<f64>() * width,
            y: rng.random::<f64>() * height,
            z: rng.random::<f64>() * width,
            opacity: 0.2 + rng.random::<f64>() * 0.8,
            radius: 0.5 + rng.random::<f64>() * 1.5,
        }
    }

    fn is_out(&self, width: f64, height: f64) -> bool {
        self.x < 0.0 || self.x > width || self.y < 0.0 || self.y > height || self.z < MIN_DEPTH
    }
}

/// A field of stars bound to a viewport.
pub struct Starfield<R: Rng> {
    width: f64,
    height: f64,
    stars: Vec<Star>,
    rng: R,
}

impl<R: Rng> Starfield<R> {
    pub fn new(count: usize, width: f64, height: f64, mut rng: R) -> Self {
        let stars = (0..count)
            .map(|_| Star::random(&mut rng, width, height))
            .collect();
        Self {
            width,
            height,
            stars,
            rng,
        }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Advances one animation frame.
    pub fn step(&mut self) {
        let (center_x, center_y) = (self.width / 2.0, self.height / 2.0);
        for star in &mut self.stars {
            star.x += DRIFT * (star.x - center_x) / star.z;
            star.y += DRIFT * (star.y - center_y) / star.z;
            star.z -= DEPTH_STEP;

            // Division by a near-zero depth can yield non-finite positions.
            if !star.x.is_finite() || !star.y.is_finite() || star.is_out(self.width, self.height)
            {
                *star = Star::random(&mut self.rng, self.width, self.height);
            }
        }
    }

    /// Rebinds the field to a new viewport and reseeds every star.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        let count = self.stars.len();
        self.stars = (0..count)
            .map(|_| Star::random(&mut self.rng, width, height))
            .collect();
    }
}
