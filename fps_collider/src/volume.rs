use log::warn;

use crate::{
    bitmask_flags::CollisionBits,
    config::check_dimensions,
    constants::MIN_RADIUS,
    error::ColliderError,
    types::{GeomId, Vec3, VolumeId},
};

/// A Z-aligned cylinder that follows the character origin at a fixed offset.
///
/// The volume is pure data: collision spaces read its pose and size when queried.
#[derive(Clone, Copy, Debug)]
pub struct CollisionVolume {
    id: VolumeId,
    radius: f32,
    half_length: f32,
    /// Subtracted from the character origin to get the cylinder center.
    offset: Vec3,
    position: Vec3,
    category_bits: CollisionBits,
    collide_bits: CollisionBits,
}

impl CollisionVolume {
    fn new(radius: f32, half_length: f32, offset: Vec3) -> Self {
        Self {
            id: VolumeId::next(),
            radius,
            half_length,
            offset,
            position: Vec3::zeros(),
            // Volumes advertise nothing and accept everything by default.
            category_bits: CollisionBits::none(),
            collide_bits: CollisionBits::all(),
        }
    }

    pub fn id(&self) -> VolumeId {
        self.id
    }

    pub fn geom_id(&self) -> GeomId {
        GeomId::Volume(self.id)
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Half of the cylinder length along +Z.
    pub fn half_length(&self) -> f32 {
        self.half_length
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    /// World-space center of the cylinder.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn category_bits(&self) -> CollisionBits {
        self.category_bits
    }

    pub fn set_category_bits(&mut self, bits: CollisionBits) {
        self.category_bits = bits;
    }

    pub fn collide_bits(&self) -> CollisionBits {
        self.collide_bits
    }

    pub fn set_collide_bits(&mut self, bits: CollisionBits) {
        self.collide_bits = bits;
    }

    /// Lowest and highest world z covered by the cylinder.
    pub fn z_range(&self) -> (f32, f32) {
        (
            self.position.z - self.half_length,
            self.position.z + self.half_length,
        )
    }
}

/// Dimensions after clamping, as used to build the volumes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dimensions {
    pub height_above_terrain: f32,
    pub radius: f32,
    pub step_height: f32,
    pub theta: f32,
}

/// The feet and torso volumes of one character.
///
/// - feet:  radius x (theta + k), spans `[ground - theta, ground + k]`
/// - torso: radius x (height - k), spans `[ground + k, origin]`
///
/// where `ground = origin.z - height`.
#[derive(Clone, Debug)]
pub struct VolumePair {
    dims: Dimensions,
    feet: CollisionVolume,
    torso: CollisionVolume,
}

impl VolumePair {
    pub fn new(
        height_above_terrain: f32,
        radius: f32,
        step_height: f32,
        theta: f32,
    ) -> Result<Self, ColliderError> {
        let dims = clamp_dimensions(height_above_terrain, radius, step_height, theta)?;
        let (feet, torso) = build_volumes(dims);
        Ok(Self { dims, feet, torso })
    }

    /// Rebuild both volumes for new dimensions.
    ///
    /// Collision bits are carried over to the new volumes; positions are reset and must
    /// be refreshed with `update`. On error the previous volumes are kept.
    pub fn set_dimensions(
        &mut self,
        height_above_terrain: f32,
        radius: f32,
        step_height: f32,
        theta: f32,
    ) -> Result<(), ColliderError> {
        let dims = clamp_dimensions(height_above_terrain, radius, step_height, theta)?;
        let (mut feet, mut torso) = build_volumes(dims);

        feet.category_bits = self.feet.category_bits;
        feet.collide_bits = self.feet.collide_bits;
        torso.category_bits = self.torso.category_bits;
        torso.collide_bits = self.torso.collide_bits;

        self.dims = dims;
        self.feet = feet;
        self.torso = torso;
        Ok(())
    }

    /// Position both volumes for the character origin `origin`.
    #[inline]
    pub fn update(&mut self, origin: Vec3) {
        self.feet.position = origin - self.feet.offset;
        self.torso.position = origin - self.torso.offset;
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn feet(&self) -> &CollisionVolume {
        &self.feet
    }

    pub fn feet_mut(&mut self) -> &mut CollisionVolume {
        &mut self.feet
    }

    pub fn torso(&self) -> &CollisionVolume {
        &self.torso
    }

    pub fn torso_mut(&mut self) -> &mut CollisionVolume {
        &mut self.torso
    }

    /// True when `geom` is one of this pair's own volumes.
    #[inline]
    pub fn owns(&self, geom: GeomId) -> bool {
        geom == self.feet.geom_id() || geom == self.torso.geom_id()
    }
}

fn clamp_dimensions(
    height_above_terrain: f32,
    radius: f32,
    step_height: f32,
    theta: f32,
) -> Result<Dimensions, ColliderError> {
    check_dimensions(height_above_terrain, radius, step_height, theta)?;

    let mut radius = radius;
    if radius < MIN_RADIUS {
        warn!("collider radius {radius} too small, clamped to {MIN_RADIUS}");
        radius = MIN_RADIUS;
    }

    let mut step_height = step_height;
    if step_height > height_above_terrain {
        warn!("step height {step_height} exceeds height {height_above_terrain}, clamped");
        step_height = height_above_terrain;
    }

    Ok(Dimensions {
        height_above_terrain,
        radius,
        step_height,
        theta,
    })
}

fn build_volumes(dims: Dimensions) -> (CollisionVolume, CollisionVolume) {
    let Dimensions {
        height_above_terrain: h,
        radius,
        step_height: k,
        theta,
    } = dims;

    let feet_offset = Vec3::new(0.0, 0.0, h + theta * 0.5 - k * 0.5);
    let torso_offset = Vec3::new(0.0, 0.0, (h - k) * 0.5);

    let feet = CollisionVolume::new(radius, (theta + k) * 0.5, feet_offset);
    let torso = CollisionVolume::new(radius, (h - k) * 0.5, torso_offset);
    (feet, torso)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmask_flags::CollisionLayer;

    const EPS: f32 = 1.0e-6;

    #[test]
    fn offsets_and_extents_follow_dimensions() {
        let pair = VolumePair::new(1.8, 0.3, 0.5, 0.1).unwrap();

        let feet = pair.feet();
        assert!((feet.offset().z - (1.8 + 0.05 - 0.25)).abs() < EPS);
        assert!((feet.half_length() - 0.3).abs() < EPS);
        assert!((feet.radius() - 0.3).abs() < EPS);

        let torso = pair.torso();
        assert!((torso.offset().z - 0.65).abs() < EPS);
        assert!((torso.half_length() - 0.65).abs() < EPS);
    }

    #[test]
    fn volumes_span_expected_heights_around_the_ground_reference() {
        let mut pair = VolumePair::new(1.8, 0.3, 0.5, 0.1).unwrap();
        pair.update(Vec3::new(4.0, -2.0, 11.8));

        // Ground reference is 10.0.
        let (feet_lo, feet_hi) = pair.feet().z_range();
        assert!((feet_lo - 9.9).abs() < 1.0e-5);
        assert!((feet_hi - 10.5).abs() < 1.0e-5);

        let (torso_lo, torso_hi) = pair.torso().z_range();
        assert!((torso_lo - 10.5).abs() < 1.0e-5);
        assert!((torso_hi - 11.8).abs() < 1.0e-5);

        assert_eq!(pair.feet().position().x, 4.0);
        assert_eq!(pair.torso().position().y, -2.0);
    }

    #[test]
    fn resizing_with_same_parameters_is_deterministic() {
        let mut pair = VolumePair::new(1.8, 0.3, 0.5, 0.1).unwrap();

        pair.set_dimensions(1.6, 0.4, 0.4, 0.2).unwrap();
        let first = (
            pair.feet().offset(),
            pair.feet().half_length(),
            pair.torso().offset(),
            pair.torso().half_length(),
            pair.feet().radius(),
        );

        pair.set_dimensions(1.6, 0.4, 0.4, 0.2).unwrap();
        let second = (
            pair.feet().offset(),
            pair.feet().half_length(),
            pair.torso().offset(),
            pair.torso().half_length(),
            pair.feet().radius(),
        );

        assert_eq!(first, second);
    }

    #[test]
    fn resizing_rebuilds_volumes_and_keeps_bits() {
        let mut pair = VolumePair::new(1.8, 0.3, 0.5, 0.1).unwrap();
        let mut bits = CollisionBits::none();
        bits.add(CollisionLayer::Terrain);
        pair.feet_mut().set_collide_bits(bits);

        let old_feet = pair.feet().geom_id();
        pair.set_dimensions(1.8, 0.3, 0.5, 0.1).unwrap();

        assert_ne!(pair.feet().geom_id(), old_feet);
        assert!(!pair.owns(old_feet));
        assert!(pair.owns(pair.feet().geom_id()));
        assert_eq!(pair.feet().collide_bits(), bits);
    }

    #[test]
    fn tiny_radius_and_tall_step_are_clamped() {
        let pair = VolumePair::new(1.0, 0.0, 2.0, 0.1).unwrap();
        let dims = pair.dimensions();
        assert_eq!(dims.radius, MIN_RADIUS);
        assert_eq!(dims.step_height, 1.0);
        assert!(pair.torso().half_length().abs() < EPS);
    }

    #[test]
    fn invalid_dimensions_keep_previous_volumes() {
        let mut pair = VolumePair::new(1.8, 0.3, 0.5, 0.1).unwrap();
        let before = pair.feet().geom_id();

        assert!(pair.set_dimensions(-1.0, 0.3, 0.5, 0.1).is_err());
        assert!(pair.set_dimensions(1.8, 0.3, 0.5, f32::NAN).is_err());

        assert_eq!(pair.feet().geom_id(), before);
        assert_eq!(pair.dimensions().height_above_terrain, 1.8);
    }
}
