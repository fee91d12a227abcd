//! Parametric paths traced around the home area.

use crate::constants::ROSE_PHASES;
use crate::config::PatternConfig;
use crate::math::degrees_to_radians;
use glam::Vec3;
use std::f32::consts::{PI, TAU};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PatternShape {
    Ellipse {
        radius_x: f32,
        radius_z: f32,
    },
    /// Rhodonea curve `r = radius * cos(petals * θ + phase)`, or `sin` when
    /// `sinusoidal` is set.
    Rose {
        radius: f32,
        phase: f32,
        petals: f32,
        sinusoidal: bool,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct PatternPath {
    shape: PatternShape,
    origin: Vec3,
    amplitude: f32,
    clockwise: bool,
    /// Radians per tick.
    step: f32,
    theta: f32,
    current: Vec3,
}

impl PatternPath {
    pub fn new(shape: PatternShape, origin: Vec3, amplitude: f32, step: f32, clockwise: bool) -> Self {
        let mut path = Self {
            shape,
            origin,
            amplitude,
            clockwise,
            step,
            theta: 0.0,
            current: origin,
        };
        path.current = path.point_at(0.0);
        path
    }

    /// Shared ellipse the whole flock circles while at home.
    pub fn home_flock(origin: Vec3, config: &PatternConfig) -> Self {
        Self::new(
            PatternShape::Ellipse {
                radius_x: config.flock_radius_x,
                radius_z: config.flock_radius_z,
            },
            origin,
            config.flock_amplitude,
            degrees_to_radians(config.flock_step_degrees),
            config.flock_clockwise,
        )
    }

    /// Per-agent rose. Odd agents run counter-clockwise on a sine rose so
    /// neighbors interleave.
    pub fn agent_rose(index: usize, origin: Vec3, config: &PatternConfig) -> Self {
        let even = index % 2 == 0;
        Self::new(
            PatternShape::Rose {
                radius: config.rose_radius,
                phase: ROSE_PHASES[index % ROSE_PHASES.len()],
                petals: config.rose_petals,
                sinusoidal: !even,
            },
            origin,
            config.rose_amplitude,
            degrees_to_radians(config.rose_step_degrees),
            even,
        )
    }

    pub fn shape(&self) -> PatternShape {
        self.shape
    }

    pub fn theta(&self) -> f32 {
        self.theta
    }

    /// Point written by the most recent [`PatternPath::advance`].
    pub fn current(&self) -> Vec3 {
        self.current
    }

    fn period(&self) -> f32 {
        match self.shape {
            PatternShape::Ellipse { .. } => TAU,
            PatternShape::Rose { .. } => PI,
        }
    }

    pub fn point_at(&self, theta: f32) -> Vec3 {
        let (sin, cos) = theta.sin_cos();
        let (x, z) = match self.shape {
            PatternShape::Ellipse { radius_x, radius_z } => (radius_x * cos, radius_z * sin),
            PatternShape::Rose {
                radius,
                phase,
                petals,
                sinusoidal,
            } => {
                let arg = petals * theta + phase;
                let r = radius * if sinusoidal { arg.sin() } else { arg.cos() };
                (r * cos, r * sin)
            }
        };
        self.origin + Vec3::new(x, self.amplitude * sin, z)
    }

    /// Write the point at the current angle, then step the angle.
    pub fn advance(&mut self) -> Vec3 {
        self.current = self.point_at(self.theta);
        let delta = if self.clockwise { -self.step } else { self.step };
        self.theta = (self.theta + delta).rem_euclid(self.period());
        self.current
    }
}
