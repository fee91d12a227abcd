//! Vector and rotation helpers shared by the steering code.
//!
//! All functions are pure apart from the random samplers, which draw from the
//! RNG handed in by the caller.

use crate::constants::VECTOR_EPSILON_SQ;
use glam::{Quat, Vec3};
use rand::distr::uniform::SampleUniform;
use rand::Rng;
use std::f32::consts::FRAC_PI_2;

/// Rescale `v` in place so its length does not exceed `max_magnitude`.
///
/// Vectors already within the bound (including the zero vector) are left
/// untouched.
pub fn clamp_magnitude(v: &mut Vec3, max_magnitude: f32) {
    let len_sq = v.length_squared();
    if len_sq > 0.0 && len_sq > max_magnitude * max_magnitude {
        *v *= max_magnitude.max(0.0) / len_sq.sqrt();
    }
}

/// Linear remap of `value` from `[low_in, high_in]` onto `[low_out, high_out]`.
///
/// Values outside the input range extrapolate. Callers guarantee
/// `low_in != high_in`.
pub fn map_range(value: f32, low_in: f32, high_in: f32, low_out: f32, high_out: f32) -> f32 {
    debug_assert!(low_in != high_in, "map_range called with a degenerate input range");
    low_out + (high_out - low_out) * (value - low_in) / (high_in - low_in)
}

/// Angle of the heading in the x/y plane, `atan2(y, x)`.
pub fn azimuth(v: Vec3) -> f32 {
    v.y.atan2(v.x)
}

/// Angle between the heading and +Z. `None` for a zero vector.
pub fn inclination(v: Vec3) -> Option<f32> {
    let len_sq = v.length_squared();
    if len_sq <= VECTOR_EPSILON_SQ {
        return None;
    }
    Some((v.z / len_sq.sqrt()).clamp(-1.0, 1.0).acos())
}

/// Unit quaternion rotating by `angle_radians` around `axis`.
///
/// The axis is normalized first; a zero axis yields the identity.
pub fn axis_angle_to_quat(axis: Vec3, angle_radians: f32) -> Quat {
    let len_sq = axis.length_squared();
    if len_sq <= VECTOR_EPSILON_SQ {
        return Quat::IDENTITY;
    }
    let axis = axis / len_sq.sqrt();
    let (sin, cos) = (angle_radians * 0.5).sin_cos();
    Quat::from_xyzw(axis.x * sin, axis.y * sin, axis.z * sin, cos)
}

/// Orientation that points the model's +Y axis along `heading`.
///
/// Built as yaw around +Z by `azimuth - π/2` composed with pitch around +X by
/// `π/2 - inclination` (yaw applied after pitch). Returns `None` when the
/// heading is zero so callers can keep their previous orientation.
pub fn heading_orientation(heading: Vec3) -> Option<Quat> {
    let inclination = inclination(heading)?;
    let yaw = axis_angle_to_quat(Vec3::Z, azimuth(heading) - FRAC_PI_2);
    let pitch = axis_angle_to_quat(Vec3::X, FRAC_PI_2 - inclination);
    Some(yaw * pitch)
}

pub fn degrees_to_radians(degrees: f32) -> f32 {
    degrees.to_radians()
}

pub fn radians_to_degrees(radians: f32) -> f32 {
    radians.to_degrees()
}

/// Uniform integer in `[min, max]`, both bounds inclusive.
pub fn random_int<T, R>(rng: &mut R, min: T, max: T) -> T
where
    T: SampleUniform + PartialOrd + Copy,
    R: Rng + ?Sized,
{
    if min >= max {
        return min;
    }
    rng.random_range(min..=max)
}

/// Uniform fractional sample in `[min, max)`.
pub fn random_decimal<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if min >= max {
        return min;
    }
    rng.random_range(min..max)
}

/// Normalize `v`, returning zero for degenerate or non-finite input instead of NaN.
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    let len_sq = v.length_squared();
    if !len_sq.is_finite() || len_sq <= VECTOR_EPSILON_SQ {
        Vec3::ZERO
    } else {
        v / len_sq.sqrt()
    }
}
