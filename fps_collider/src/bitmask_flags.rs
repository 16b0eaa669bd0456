use num_traits::{One, PrimInt};

/// Trait implemented by flag enums whose discriminant is a bit index.
///
/// You choose the backing integer type via the associated `Storage`.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `bit_index()` must be < number of bits in `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// A plain bitmask container.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    /// Every bit set.
    pub fn all() -> Self {
        Self { bits: !T::zero() }
    }

    pub fn none() -> Self {
        Self { bits: T::zero() }
    }

    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits | tag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits & !tag.mask();
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    pub fn add_many<U: FlagBitmask<Storage = T> + Copy>(&mut self, tags: &[U]) {
        for &tag in tags {
            self.add(tag);
        }
    }

    /// True when any bit is shared with `other`.
    pub fn intersects(&self, other: Self) -> bool {
        (self.bits & other.bits) != T::zero()
    }
}

/// Declare a bitmask-backed enum and implement `FlagBitmask` for it.
///
/// Example:
/// ```rust
/// use fps_collider::define_bitmask_flags;
///
/// define_bitmask_flags!(SurfaceTag, u16, {
///     Metal,
///     Wood,
///     Water,
/// });
/// ```
#[macro_export]
macro_rules! define_bitmask_flags {
    ($name:ident, $storage:ty, { $($variant:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        pub enum $name {
            $($variant),*
        }

        impl $crate::bitmask_flags::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}

define_bitmask_flags!(CollisionLayer, u32, {
    Terrain,
    Static,
    Dynamic,
    Character,
    Trigger,
});

/// Category/collide masks of a single geometry.
pub type CollisionBits = BitmaskFlags<u32>;

/// Broad-phase pair filter.
///
/// A pair may collide when either side's category is accepted by the other side's
/// collide mask, the same rule ODE-style spaces use.
#[inline]
pub fn pair_accepted(
    a_category: CollisionBits,
    a_collide: CollisionBits,
    b_category: CollisionBits,
    b_collide: CollisionBits,
) -> bool {
    a_category.intersects(b_collide) || b_category.intersects(a_collide)
}
