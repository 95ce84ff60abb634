//! Scalar and vector helpers used by the motion and animation code

use glam::Vec3;

/// Values that can be linearly interpolated
pub trait Lerp: Copy {
    fn lerp(a: &Self, b: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        lerp(*a, *b, t)
    }
}

impl Lerp for Vec3 {
    fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        a.lerp(*b, t)
    }
}

/// Unclamped linear interpolation
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Inverse of [`lerp`]; returns 0 for an empty range
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() <= f32::EPSILON {
        0.0
    } else {
        (value - a) / (b - a)
    }
}

/// Clamp that tolerates an inverted range by swapping the bounds
pub fn clamp_range(value: f32, a: f32, b: f32) -> f32 {
    let (min, max) = if a <= b { (a, b) } else { (b, a) };
    value.clamp(min, max)
}

/// Frame-rate independent exponential smoothing factor
///
/// `rate` is the fraction of the remaining distance covered per second.
pub fn damp_factor(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate.max(0.0) * dt.max(0.0)).exp()
}

/// Orthographic zoom that frames the same visible height as `fov` does
/// relative to `reference_fov` at equal distance
pub fn fov_to_zoom(fov: f32, reference_fov: f32) -> f32 {
    let half = (fov.to_radians() * 0.5).tan();
    let reference = (reference_fov.to_radians() * 0.5).tan();
    if half <= f32::EPSILON {
        return 1.0;
    }
    reference / half
}

/// Inverse of [`fov_to_zoom`]
pub fn zoom_to_fov(zoom: f32, reference_fov: f32) -> f32 {
    let reference = (reference_fov.to_radians() * 0.5).tan();
    let zoom = zoom.max(f32::EPSILON);
    2.0 * (reference / zoom).atan().to_degrees()
}

/// FOV that keeps a subject's apparent size constant when the camera moves
/// from `base_distance` to `distance`
pub fn dolly_zoom_fov(base_fov: f32, base_distance: f32, distance: f32) -> f32 {
    if distance <= f32::EPSILON {
        return base_fov;
    }
    let half = (base_fov.to_radians() * 0.5).tan() * base_distance / distance;
    2.0 * half.atan().to_degrees()
}

/// Point on a sphere around the origin from azimuth (about +Y, from +Z) and elevation, radians
pub fn spherical_offset(radius: f32, azimuth: f32, elevation: f32) -> Vec3 {
    let horizontal = radius * elevation.cos();
    Vec3::new(
        horizontal * azimuth.sin(),
        radius * elevation.sin(),
        horizontal * azimuth.cos(),
    )
}
