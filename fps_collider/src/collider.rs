/*!
First-person character collider.

`FpsCollider` moves a character origin through a [`CollisionSpace`] once per
tick. The origin sits `height_above_terrain` above the ground it stands on;
two Z-aligned cylinders hang below it:

```text
   origin ─┬─  ┐
           │   │ torso: blocks the move when it touches anything
           │   │
 ground+k ─┼─  ┘ ┐
           │     │ feet: senses ground, climbs anything lower than k
   ground ─┼─    │
 ground-θ ─┴─    ┘
```

Per tick (`update`)
1. Pick a velocity from the current mode (gravity while falling, slope slide,
   jump impulse) and move to a candidate position.
2. Test the candidate: the feet decide the new mode and snap the height to
   the ground, then the torso says whether the candidate is blocked.
3. When blocked, remove the velocity components that run into the torso's
   contact normals and test once more. If that is blocked too, stay put and
   keep the mode the tick started with.
*/

use log::{debug, trace};

use crate::{
    bitmask_flags::CollisionBits,
    config::ColliderConfig,
    contact::ContactResolver,
    error::ColliderError,
    mode::{Mode, classify_ground, highest_normal, slide_velocity},
    space::CollisionSpace,
    types::Vec3,
    volume::{CollisionVolume, Dimensions, VolumePair},
};

/// Result of testing one candidate position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionTest {
    /// Candidate after the ground height snap.
    pub position: Vec3,
    /// The torso touches something at `position`.
    pub blocked: bool,
}

pub struct FpsCollider<S> {
    space: S,
    volumes: VolumePair,
    contacts: ContactResolver,
    config: ColliderConfig,
    mode: Mode,
    last_velocity: Vec3,
    slide_velocity: Vec3,
    /// Set by a jump, cleared once the vertical velocity stops rising.
    jumped: bool,
}

impl<S: CollisionSpace> FpsCollider<S> {
    pub fn new(space: S, config: ColliderConfig) -> Result<Self, ColliderError> {
        config.validate()?;

        let volumes = VolumePair::new(
            config.height_above_terrain,
            config.radius,
            config.step_height,
            config.theta,
        )?;

        // Keep the clamped dimensions so the config reflects the built volumes.
        let mut config = config;
        apply_dimensions(&mut config, volumes.dimensions());

        Ok(Self {
            space,
            volumes,
            contacts: ContactResolver::new(),
            config,
            mode: Mode::Falling,
            last_velocity: Vec3::zeros(),
            slide_velocity: Vec3::zeros(),
            jumped: false,
        })
    }

    /// Advance one tick from `p0` with the desired horizontal `velocity`.
    ///
    /// The z component of `velocity` is ignored. Returns the new origin; mode and velocity
    /// state are kept for the next tick. A non-positive or non-finite `dt`, or non-finite
    /// input, returns `p0` and leaves the state alone.
    pub fn update(&mut self, p0: Vec3, velocity: Vec3, dt: f32, jump: bool) -> Vec3 {
        let finite = dt.is_finite()
            && p0.iter().all(|v| v.is_finite())
            && velocity.iter().all(|v| v.is_finite());
        if !finite || dt <= 0.0 {
            return p0;
        }

        if self.jumped && self.last_velocity.z <= 0.0 {
            self.jumped = false;
        }

        let start_mode = self.mode;
        let v0 = self.candidate_velocity(velocity, dt, jump);

        let first = self.test_position(p0 + v0 * dt, dt);
        if !first.blocked {
            self.last_velocity = v0;

            // Standing still on uneven ground must not make the camera bob.
            if start_mode == Mode::Walking
                && self.mode == Mode::Walking
                && self.same_horizontal(first.position, p0)
            {
                return p0;
            }
            return first.position;
        }

        let mut v1 = v0;
        for n in self.contacts.normals() {
            let into = n.dot(&v1);
            if into < 0.0 {
                v1 -= n * into;
            }
        }

        let second = self.test_position(p0 + v1 * dt, dt);
        if !second.blocked {
            self.last_velocity = v1;
            return second.position;
        }

        trace!("move from {p0:?} blocked twice, holding position");
        self.last_velocity = Vec3::zeros();
        self.set_mode(start_mode);
        p0
    }

    fn candidate_velocity(&mut self, desired: Vec3, dt: f32, jump: bool) -> Vec3 {
        let cfg = &self.config;

        match self.mode {
            Mode::Falling => {
                let fall =
                    (self.last_velocity.z + cfg.gravity_vec().z * dt).max(cfg.terminal_speed);
                let last = self.last_velocity;
                let blend = cfg.air_control;
                Vec3::new(
                    last.x + (desired.x - last.x) * blend,
                    last.y + (desired.y - last.y) * blend,
                    fall,
                )
            }
            Mode::Sliding => {
                let mut v = Vec3::new(desired.x, desired.y, 0.0) + self.slide_velocity;
                if jump {
                    v.z = cfg.jump_speed;
                    self.jumped = true;
                }
                v
            }
            Mode::Walking => {
                let mut v = Vec3::new(desired.x, desired.y, 0.0);
                if jump {
                    v.z = cfg.jump_speed;
                    self.jumped = true;
                }
                v
            }
        }
    }

    /// Test a candidate origin: classify the ground under the feet, snap the height and
    /// check the torso.
    ///
    /// Updates the mode (and the slide velocity when sliding).
    pub fn test_position(&mut self, candidate: Vec3, dt: f32) -> PositionTest {
        let mut position = candidate;

        self.volumes.update(position);
        let touching = self.contacts.collide_feet(&self.space, &self.volumes);

        let ground = match self.contacts.last_feet_contact() {
            Some(contact) if touching && !self.jumped => Some(contact),
            _ => None,
        };

        match ground {
            None => self.set_mode(Mode::Falling),
            Some(contact) => {
                let cfg = &self.config;
                let diff = cfg.height_above_terrain + contact.position.z - position.z;
                position.z += diff.min(cfg.jump_speed * dt);

                let n = highest_normal(self.contacts.normals());
                let mode = classify_ground(n, cfg.slide_threshold);
                if mode == Mode::Sliding {
                    self.slide_velocity = slide_velocity(n, cfg.slide_speed);
                }
                self.set_mode(mode);
            }
        }

        self.volumes.update(position);
        let blocked = self.contacts.collide_torso(&self.space, &self.volumes);

        PositionTest { position, blocked }
    }

    /// Run the feet query at the volumes' current position.
    pub fn collide_feet(&mut self) -> bool {
        self.contacts.collide_feet(&self.space, &self.volumes)
    }

    /// Run the torso query at the volumes' current position.
    pub fn collide_torso(&mut self) -> bool {
        self.contacts.collide_torso(&self.space, &self.volumes)
    }

    fn same_horizontal(&self, a: Vec3, b: Vec3) -> bool {
        let eps = self.config.anti_bounce_epsilon;
        if eps > 0.0 {
            (a.x - b.x).abs() <= eps && (a.y - b.y).abs() <= eps
        } else {
            a.x == b.x && a.y == b.y
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            debug!("collider mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }
}

impl<S> FpsCollider<S> {
    /// Forget velocities, jump state and contacts; the next tick starts falling.
    pub fn reset(&mut self) {
        self.last_velocity = Vec3::zeros();
        self.slide_velocity = Vec3::zeros();
        self.jumped = false;
        self.contacts.invalidate();
        self.mode = Mode::Falling;
    }

    /// Rebuild both volumes. On error nothing changes.
    pub fn set_dimensions(
        &mut self,
        height_above_terrain: f32,
        radius: f32,
        step_height: f32,
        theta: f32,
    ) -> Result<(), ColliderError> {
        self.volumes
            .set_dimensions(height_above_terrain, radius, step_height, theta)?;
        apply_dimensions(&mut self.config, self.volumes.dimensions());
        self.contacts.invalidate();
        Ok(())
    }

    pub fn dimensions(&self) -> Dimensions {
        self.volumes.dimensions()
    }

    pub fn set_slide_threshold(&mut self, threshold: f32) {
        self.config.slide_threshold = threshold;
    }

    pub fn set_slide_speed(&mut self, speed: f32) {
        self.config.slide_speed = speed;
    }

    pub fn set_jump_speed(&mut self, speed: f32) {
        self.config.jump_speed = speed;
    }

    /// Most negative vertical speed while falling. Positive values are mirrored downward.
    pub fn set_terminal_speed(&mut self, speed: f32) {
        self.config.terminal_speed = -speed.abs();
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.config.gravity = [gravity.x, gravity.y, gravity.z];
    }

    /// Clamped to [0, 1].
    pub fn set_air_control(&mut self, air_control: f32) {
        self.config.air_control = air_control.clamp(0.0, 1.0);
    }

    pub fn feet_collide_bits(&self) -> CollisionBits {
        self.volumes.feet().collide_bits()
    }

    pub fn set_feet_collide_bits(&mut self, bits: CollisionBits) {
        self.volumes.feet_mut().set_collide_bits(bits);
    }

    pub fn torso_collide_bits(&self) -> CollisionBits {
        self.volumes.torso().collide_bits()
    }

    pub fn set_torso_collide_bits(&mut self, bits: CollisionBits) {
        self.volumes.torso_mut().set_collide_bits(bits);
    }

    pub fn feet_category_bits(&self) -> CollisionBits {
        self.volumes.feet().category_bits()
    }

    pub fn set_feet_category_bits(&mut self, bits: CollisionBits) {
        self.volumes.feet_mut().set_category_bits(bits);
    }

    pub fn torso_category_bits(&self) -> CollisionBits {
        self.volumes.torso().category_bits()
    }

    pub fn set_torso_category_bits(&mut self, bits: CollisionBits) {
        self.volumes.torso_mut().set_category_bits(bits);
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn last_velocity(&self) -> Vec3 {
        self.last_velocity
    }

    /// Slide velocity computed the last time the collider started sliding.
    pub fn slide_velocity(&self) -> Vec3 {
        self.slide_velocity
    }

    pub fn is_jumping(&self) -> bool {
        self.jumped
    }

    pub fn feet(&self) -> &CollisionVolume {
        self.volumes.feet()
    }

    pub fn torso(&self) -> &CollisionVolume {
        self.volumes.torso()
    }

    /// Contacts and normals of the most recent query.
    pub fn contacts(&self) -> &ContactResolver {
        &self.contacts
    }

    pub fn config(&self) -> &ColliderConfig {
        &self.config
    }

    pub fn space(&self) -> &S {
        &self.space
    }
}

fn apply_dimensions(config: &mut ColliderConfig, dims: Dimensions) {
    config.height_above_terrain = dims.height_above_terrain;
    config.radius = dims.radius;
    config.step_height = dims.step_height;
    config.theta = dims.theta;
}
