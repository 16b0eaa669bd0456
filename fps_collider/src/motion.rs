use nalgebra as na;

use crate::{
    collider::FpsCollider,
    constants::{DEFAULT_SIDESTEP_SPEED, DEFAULT_TURN_SPEED, DEFAULT_WALK_SPEED, MAX_PITCH_DEG},
    space::CollisionSpace,
    types::Vec3,
};

/// One tick of player input. Axes are in [-1, 1]; out of range values are clamped.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionInput {
    /// Forward is positive.
    pub forward_back: f32,
    /// Right is positive.
    pub sidestep: f32,
    /// Positive turns the heading clockwise (seen from above).
    pub look_left_right: f32,
    /// Positive pitches up.
    pub look_up_down: f32,
    pub jump: bool,
}

/// Look direction and desired velocity produced from one tick of input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionOutput {
    /// Heading in degrees, counter-clockwise about +Z. 0 faces +Y.
    pub heading_deg: f32,
    /// Pitch in degrees, within the pitch limit.
    pub pitch_deg: f32,
    /// Desired horizontal velocity in world space.
    pub velocity: Vec3,
    pub jump: bool,
}

/// Maps first-person input to a heading, a pitch and a desired walking velocity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FpsMotionModel {
    pub heading_deg: f32,
    pub pitch_deg: f32,
    pub max_walk_speed: f32,
    pub max_sidestep_speed: f32,
    /// Degrees per second at full deflection.
    pub max_turn_speed: f32,
}

impl Default for FpsMotionModel {
    fn default() -> Self {
        Self {
            heading_deg: 0.0,
            pitch_deg: 0.0,
            max_walk_speed: DEFAULT_WALK_SPEED,
            max_sidestep_speed: DEFAULT_SIDESTEP_SPEED,
            max_turn_speed: DEFAULT_TURN_SPEED,
        }
    }
}

impl FpsMotionModel {
    /// Turn, pitch, and derive the desired velocity for this tick.
    pub fn step(&mut self, input: &MotionInput, dt: f32) -> MotionOutput {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let look_lr = axis(input.look_left_right);
        let look_ud = axis(input.look_up_down);

        self.heading_deg -= look_lr * self.max_turn_speed * dt;
        self.pitch_deg = (self.pitch_deg + look_ud * self.max_turn_speed * dt)
            .clamp(-MAX_PITCH_DEG, MAX_PITCH_DEG);

        let local = Vec3::new(
            axis(input.sidestep) * self.max_sidestep_speed,
            axis(input.forward_back) * self.max_walk_speed,
            0.0,
        );
        let yaw = na::Rotation3::from_axis_angle(&Vec3::z_axis(), self.heading_deg.to_radians());

        MotionOutput {
            heading_deg: self.heading_deg,
            pitch_deg: self.pitch_deg,
            velocity: yaw * local,
            jump: input.jump,
        }
    }

    /// Step the model and move `collider` from `position` with the resulting velocity.
    pub fn drive<S: CollisionSpace>(
        &mut self,
        collider: &mut FpsCollider<S>,
        position: Vec3,
        input: &MotionInput,
        dt: f32,
    ) -> (Vec3, MotionOutput) {
        let out = self.step(input, dt);
        let next = collider.update(position, out.velocity, dt, out.jump);
        (next, out)
    }
}

#[inline]
fn axis(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ColliderConfig,
        mode::Mode,
        space::{RapierSpace, WorldStaticDef},
    };

    const EPS: f32 = 1.0e-5;

    #[test]
    fn forward_at_zero_heading_moves_along_y() {
        let mut model = FpsMotionModel::default();
        let out = model.step(
            &MotionInput {
                forward_back: 1.0,
                ..Default::default()
            },
            0.1,
        );
        assert!((out.velocity - Vec3::new(0.0, 3.0, 0.0)).norm() < EPS);
    }

    #[test]
    fn looking_right_turns_heading_clockwise() {
        let mut model = FpsMotionModel::default();
        let input = MotionInput {
            forward_back: 1.0,
            look_left_right: 1.0,
            ..Default::default()
        };

        // 90 deg/s for one second: heading -90, forward now faces +X.
        let out = model.step(&input, 1.0);
        assert!((out.heading_deg + 90.0).abs() < EPS);
        assert!((out.velocity - Vec3::new(3.0, 0.0, 0.0)).norm() < 1.0e-4);
    }

    #[test]
    fn sidestep_is_perpendicular_to_forward() {
        let mut model = FpsMotionModel {
            heading_deg: 90.0,
            ..Default::default()
        };
        let out = model.step(
            &MotionInput {
                sidestep: 1.0,
                ..Default::default()
            },
            0.1,
        );
        // Heading 90 faces -X, so right is +Y.
        assert!((out.velocity - Vec3::new(0.0, 3.0, 0.0)).norm() < 1.0e-4);
    }

    #[test]
    fn pitch_is_clamped_and_axes_saturate() {
        let mut model = FpsMotionModel::default();
        let input = MotionInput {
            look_up_down: 5.0,
            forward_back: -4.0,
            ..Default::default()
        };

        let out = model.step(&input, 2.0);
        assert_eq!(out.pitch_deg, MAX_PITCH_DEG);
        assert!((out.velocity.y + 3.0).abs() < EPS);

        let down = MotionInput {
            look_up_down: -1.0,
            ..Default::default()
        };
        let out = model.step(&down, 10.0);
        assert_eq!(out.pitch_deg, -MAX_PITCH_DEG);
    }

    #[test]
    fn drive_moves_the_collider() {
        let space = RapierSpace::build(vec![WorldStaticDef::ground(1, 0.0)]).unwrap();
        let mut collider = FpsCollider::new(space, ColliderConfig::default()).unwrap();
        let mut model = FpsMotionModel::default();
        let input = MotionInput {
            forward_back: 1.0,
            ..Default::default()
        };

        let mut p = Vec3::new(0.0, 0.0, 1.8);
        for _ in 0..30 {
            p = model.drive(&mut collider, p, &input, 1.0 / 30.0).0;
        }

        assert_eq!(collider.mode(), Mode::Walking);
        assert!(p.y > 2.5);
        assert!(p.x.abs() < EPS);
        assert!((p.z - 1.8).abs() < 1.0e-3);
    }
}
