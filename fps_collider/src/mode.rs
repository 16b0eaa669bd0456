use crate::{constants::SLIDE_DIVISOR_EPS, types::Vec3};

/// Movement mode, recomputed by every position test.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// No ground support, or a jump is still rising. Initial mode.
    #[default]
    Falling,
    /// Supported by ground flat enough to stand on.
    Walking,
    /// Supported only by ground steeper than the slide threshold.
    Sliding,
}

/// The normal with the highest z. Ties keep the first; an empty list counts as flat ground.
pub fn highest_normal(normals: &[Vec3]) -> Vec3 {
    let Some((first, rest)) = normals.split_first() else {
        return Vec3::z();
    };

    let mut best = *first;
    for n in rest {
        if n.z > best.z {
            best = *n;
        }
    }
    best
}

/// Mode for ground with normal `n`. The threshold itself is walkable.
#[inline]
pub fn classify_ground(n: Vec3, slide_threshold: f32) -> Mode {
    if n.z < slide_threshold {
        Mode::Sliding
    } else {
        Mode::Walking
    }
}

/// Velocity along a slope with normal `n`.
///
/// `slide_speed / (1 - n.z) * (n.z * n.x, n.z * n.y, n.z * n.z - 1)`, which is tangent to
/// the surface and points downhill. Near-flat normals give zero.
pub fn slide_velocity(n: Vec3, slide_speed: f32) -> Vec3 {
    let divisor = 1.0 - n.z;
    if divisor <= SLIDE_DIVISOR_EPS {
        return Vec3::zeros();
    }

    let speed = slide_speed / divisor;
    Vec3::new(n.z * n.x, n.z * n.y, n.z * n.z - 1.0) * speed
}
