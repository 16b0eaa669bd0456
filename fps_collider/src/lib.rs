pub mod bitmask_flags;
pub mod collider;
pub mod config;
pub mod constants;
pub mod contact;
pub mod error;
pub mod mode;
pub mod motion;
pub mod space;
pub mod types;
pub mod volume;

pub use bitmask_flags::{CollisionBits, CollisionLayer, pair_accepted};
pub use collider::{FpsCollider, PositionTest};
pub use config::ColliderConfig;
pub use contact::ContactResolver;
pub use error::ColliderError;
pub use mode::Mode;
pub use motion::{FpsMotionModel, MotionInput, MotionOutput};
pub use space::{CollisionSpace, ColliderShapeDef, RapierSpace, WorldStaticDef};
pub use types::{Contact, GeomId, Vec3, VolumeId};
pub use volume::{CollisionVolume, Dimensions, VolumePair};
