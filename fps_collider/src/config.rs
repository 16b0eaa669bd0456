/*!
Collider tuning.

`ColliderConfig` gathers every value the integrator reads. Defaults live in
`constants`; a RON document only has to name the fields it overrides:

```ron
(
    height_above_terrain: 1.6,
    slide_threshold: 0.7,
    gravity: (0.0, 0.0, -20.0),
)
```

Distances are in meters, time in seconds, Z is up.
*/

use ron::Options;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        DEFAULT_GRAVITY, DEFAULT_HEIGHT_ABOVE_TERRAIN, DEFAULT_JUMP_SPEED, DEFAULT_RADIUS,
        DEFAULT_SLIDE_SPEED, DEFAULT_SLIDE_THRESHOLD, DEFAULT_STEP_HEIGHT, DEFAULT_TERMINAL_SPEED,
        DEFAULT_THETA,
    },
    error::ColliderError,
    types::Vec3,
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColliderConfig {
    /// Distance from the ground reference up to the collider origin.
    pub height_above_terrain: f32,
    /// Radius of both cylinders.
    pub radius: f32,
    /// Step-up height `k`.
    pub step_height: f32,
    /// How far the feet volume reaches below the ground reference.
    pub theta: f32,
    /// Minimum walkable normal z.
    pub slide_threshold: f32,
    pub slide_speed: f32,
    pub jump_speed: f32,
    /// Most negative vertical speed reached while falling.
    pub terminal_speed: f32,
    pub gravity: [f32; 3],
    /// Share of the desired horizontal velocity applied while falling, in [0, 1].
    ///
    /// 0 keeps the horizontal velocity the character had when it left the ground.
    pub air_control: f32,
    /// Horizontal tolerance of the anti-bounce rule. 0 means exact equality.
    pub anti_bounce_epsilon: f32,
}

impl Default for ColliderConfig {
    fn default() -> Self {
        Self {
            height_above_terrain: DEFAULT_HEIGHT_ABOVE_TERRAIN,
            radius: DEFAULT_RADIUS,
            step_height: DEFAULT_STEP_HEIGHT,
            theta: DEFAULT_THETA,
            slide_threshold: DEFAULT_SLIDE_THRESHOLD,
            slide_speed: DEFAULT_SLIDE_SPEED,
            jump_speed: DEFAULT_JUMP_SPEED,
            terminal_speed: DEFAULT_TERMINAL_SPEED,
            gravity: DEFAULT_GRAVITY,
            air_control: 0.0,
            anti_bounce_epsilon: 0.0,
        }
    }
}

/// RON options with extensions enabled for more flexible parsing.
fn ron_options() -> Options {
    Options::default().with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
}

impl ColliderConfig {
    /// Parse and validate a config from a RON document.
    pub fn from_ron_str(source: &str) -> Result<Self, ColliderError> {
        let config: ColliderConfig = ron_options().from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn gravity_vec(&self) -> Vec3 {
        Vec3::new(self.gravity[0], self.gravity[1], self.gravity[2])
    }

    /// Reject values the integrator cannot work with.
    ///
    /// Dimensions that the collider clamps instead of rejecting (tiny radius, step taller
    /// than the height) pass here and are adjusted by `set_dimensions`.
    pub fn validate(&self) -> Result<(), ColliderError> {
        check_dimensions(
            self.height_above_terrain,
            self.radius,
            self.step_height,
            self.theta,
        )?;

        let finite = [
            ("slide_threshold", self.slide_threshold),
            ("slide_speed", self.slide_speed),
            ("jump_speed", self.jump_speed),
            ("terminal_speed", self.terminal_speed),
            ("gravity.x", self.gravity[0]),
            ("gravity.y", self.gravity[1]),
            ("gravity.z", self.gravity[2]),
            ("air_control", self.air_control),
            ("anti_bounce_epsilon", self.anti_bounce_epsilon),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(ColliderError::InvalidDimension { name, value });
            }
        }

        if self.terminal_speed > 0.0 {
            return Err(ColliderError::InvalidConfig(format!(
                "terminal_speed must be <= 0 (downward), got {}",
                self.terminal_speed
            )));
        }
        if !(0.0..=1.0).contains(&self.air_control) {
            return Err(ColliderError::InvalidConfig(format!(
                "air_control must be within [0, 1], got {}",
                self.air_control
            )));
        }
        if self.anti_bounce_epsilon < 0.0 {
            return Err(ColliderError::InvalidConfig(format!(
                "anti_bounce_epsilon must be >= 0, got {}",
                self.anti_bounce_epsilon
            )));
        }

        Ok(())
    }
}

/// Hard validation shared by the config and `set_dimensions`.
pub(crate) fn check_dimensions(
    height: f32,
    radius: f32,
    step_height: f32,
    theta: f32,
) -> Result<(), ColliderError> {
    let values = [
        ("height_above_terrain", height),
        ("radius", radius),
        ("step_height", step_height),
        ("theta", theta),
    ];
    for (name, value) in values {
        if !value.is_finite() {
            return Err(ColliderError::InvalidDimension { name, value });
        }
    }

    if height <= 0.0 {
        return Err(ColliderError::InvalidDimension {
            name: "height_above_terrain",
            value: height,
        });
    }
    if step_height < 0.0 {
        return Err(ColliderError::InvalidDimension {
            name: "step_height",
            value: step_height,
        });
    }
    if theta < 0.0 {
        return Err(ColliderError::InvalidDimension {
            name: "theta",
            value: theta,
        });
    }

    Ok(())
}
