/*!
Core types and math aliases shared by the collider modules.

This module contains no algorithms. It defines the data exchanged between:
- the collision space (broad phase candidates, narrow phase contacts)
- the contact resolver (feet/torso queries)
- the movement state machine and integrator

Contacts are transient: every query produces a fresh set. Only the highest
feet contact survives a query, for the step-height computation.
*/

use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra as na;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// Identity of a character collision volume.
///
/// Allocated once per built volume and never reused within a process, so a rebuilt
/// volume (after `set_dimensions`) never aliases the one it replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VolumeId(u64);

static NEXT_VOLUME_ID: AtomicU64 = AtomicU64::new(1);

impl VolumeId {
    pub(crate) fn next() -> Self {
        Self(NEXT_VOLUME_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// A geometry known to a collision space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeomId {
    /// Static world geometry, by definition id.
    Static(u32),
    /// A character feet/torso volume.
    Volume(VolumeId),
}

/// A single contact point produced by a narrow-phase query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// World-space point on the surface of the touched geometry.
    pub position: Vec3,
    /// World-space unit normal of the touched surface, pointing toward the volume.
    pub normal: Vec3,
    /// Penetration depth (positive when overlapping).
    pub depth: f32,
}

/// Outward unit normal of a triangle given by its three world-space vertices.
///
/// Uses the edges `v1 - v2` and `v2 - v3`, so counter-clockwise winding (seen from the
/// side the normal points to) yields the front-facing normal. Degenerate triangles
/// return `None`.
#[inline]
pub fn triangle_normal(v1: Vec3, v2: Vec3, v3: Vec3) -> Option<Vec3> {
    let side1 = v1 - v2;
    let side2 = v2 - v3;
    side1.cross(&side2).try_normalize(1.0e-12)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ccw_triangle_in_xy_plane_faces_up() {
        let n = triangle_normal(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert!((n - Vec3::z()).norm() < 1.0e-6);
    }

    #[test]
    fn clockwise_triangle_faces_down() {
        let n = triangle_normal(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
        )
        .unwrap();
        assert!((n + Vec3::z()).norm() < 1.0e-6);
    }

    #[test]
    fn degenerate_triangle_has_no_normal() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert!(triangle_normal(p, p, Vec3::new(2.0, 4.0, 6.0)).is_none());
    }

    #[test]
    fn volume_ids_are_unique() {
        let a = VolumeId::next();
        let b = VolumeId::next();
        assert_ne!(a, b);
    }
}
