/// Default eye height above the terrain the collider keeps the origin at (meters).
pub const DEFAULT_HEIGHT_ABOVE_TERRAIN: f32 = 1.8;

/// Default radius of both the feet and torso cylinders (meters).
pub const DEFAULT_RADIUS: f32 = 0.3;

/// Default step-up height `k` (meters).
///
/// The feet volume reaches `k` above the ground reference, so obstacles lower than this
/// are climbed instead of blocking the torso.
pub const DEFAULT_STEP_HEIGHT: f32 = 0.5;

/// Default thickness `theta` the feet volume extends below the ground reference (meters).
pub const DEFAULT_THETA: f32 = 0.1;

/// Minimum contact normal z (cosine of the slope angle) that still counts as walkable.
///
/// 0.65 is roughly 49 degrees from vertical.
pub const DEFAULT_SLIDE_THRESHOLD: f32 = 0.65;

/// Default speed scale used by the closed-form slide velocity (meters per second).
pub const DEFAULT_SLIDE_SPEED: f32 = 3.0;

/// Default initial vertical speed of a jump (meters per second).
///
/// Also bounds how far terrain may push the character up in one tick: `jump_speed * dt`.
pub const DEFAULT_JUMP_SPEED: f32 = 5.0;

/// Default terminal fall speed (meters per second, negative is down).
pub const DEFAULT_TERMINAL_SPEED: f32 = -50.0;

/// Default gravity vector (meters per second squared, Z-up).
pub const DEFAULT_GRAVITY: [f32; 3] = [0.0, 0.0, -9.81];

/// Smallest radius accepted by `set_dimensions`; smaller values are clamped to this.
pub const MIN_RADIUS: f32 = 0.01;

/// Maximum contact points gathered per candidate pair for the feet volume.
pub const MAX_FEET_CONTACTS: usize = 8;

/// Maximum contact points gathered per candidate pair for the torso volume.
///
/// One point is enough to know the torso is blocked.
pub const MAX_TORSO_CONTACTS: usize = 1;

/// Guard for the slide speed divisor `1 - n.z`.
pub const SLIDE_DIVISOR_EPS: f32 = 1.0e-4;

/// Pitch limit for the motion model (degrees). Staying off 90 avoids gimbal lock.
pub const MAX_PITCH_DEG: f32 = 89.9;

/// Default forward/backward walk speed of the motion model (meters per second).
pub const DEFAULT_WALK_SPEED: f32 = 3.0;

/// Default sidestep speed of the motion model (meters per second).
pub const DEFAULT_SIDESTEP_SPEED: f32 = 3.0;

/// Default turn speed of the motion model (degrees per second at full axis deflection).
pub const DEFAULT_TURN_SPEED: f32 = 90.0;
