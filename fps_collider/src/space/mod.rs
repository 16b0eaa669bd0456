/*!
Collision space abstraction.

The collider never reaches for a global physics world. It is handed a value
implementing [`CollisionSpace`], which provides the two query stages the
contact resolver needs:

- broad phase: enumerate candidate geometries for a volume
- narrow phase: exact contacts between a volume and one candidate, plus the
  triangles in range when the candidate is a mesh

[`RapierSpace`] is the provided implementation over immutable world statics.
*/

pub mod rapier_space;

use std::{rc::Rc, sync::Arc};

use crate::{
    types::{Contact, GeomId, Vec3},
    volume::CollisionVolume,
};

pub use rapier_space::{ColliderShapeDef, RapierSpace, WorldStaticDef};

/// The physics world collaborator queried by the contact resolver.
pub trait CollisionSpace {
    /// Broad phase: call `on_pair` once for every geometry that may touch `volume`.
    ///
    /// Implementations apply their own bounds and bitmask filtering. They may report the
    /// volume itself or its sibling; callers skip those.
    fn for_each_candidate(&self, volume: &CollisionVolume, on_pair: &mut dyn FnMut(GeomId));

    /// Narrow phase: append at most `max_contacts` contacts between `volume` and `geom`.
    ///
    /// When `geom` is a triangle mesh, `on_triangle` receives the index of every triangle in
    /// range of the volume, whether or not it produced a contact. Look the vertices up with
    /// [`CollisionSpace::mesh_triangle`].
    /// Returns the number of contacts appended.
    fn collide(
        &self,
        volume: &CollisionVolume,
        geom: GeomId,
        max_contacts: usize,
        contacts: &mut Vec<Contact>,
        on_triangle: &mut dyn FnMut(u32),
    ) -> usize;

    /// World-space vertices of triangle `index` of mesh `geom`.
    fn mesh_triangle(&self, geom: GeomId, index: u32) -> Option<[Vec3; 3]>;
}

impl<S: CollisionSpace + ?Sized> CollisionSpace for &S {
    fn for_each_candidate(&self, volume: &CollisionVolume, on_pair: &mut dyn FnMut(GeomId)) {
        (**self).for_each_candidate(volume, on_pair)
    }

    fn collide(
        &self,
        volume: &CollisionVolume,
        geom: GeomId,
        max_contacts: usize,
        contacts: &mut Vec<Contact>,
        on_triangle: &mut dyn FnMut(u32),
    ) -> usize {
        (**self).collide(volume, geom, max_contacts, contacts, on_triangle)
    }

    fn mesh_triangle(&self, geom: GeomId, index: u32) -> Option<[Vec3; 3]> {
        (**self).mesh_triangle(geom, index)
    }
}

impl<S: CollisionSpace + ?Sized> CollisionSpace for Arc<S> {
    fn for_each_candidate(&self, volume: &CollisionVolume, on_pair: &mut dyn FnMut(GeomId)) {
        (**self).for_each_candidate(volume, on_pair)
    }

    fn collide(
        &self,
        volume: &CollisionVolume,
        geom: GeomId,
        max_contacts: usize,
        contacts: &mut Vec<Contact>,
        on_triangle: &mut dyn FnMut(u32),
    ) -> usize {
        (**self).collide(volume, geom, max_contacts, contacts, on_triangle)
    }

    fn mesh_triangle(&self, geom: GeomId, index: u32) -> Option<[Vec3; 3]> {
        (**self).mesh_triangle(geom, index)
    }
}

impl<S: CollisionSpace + ?Sized> CollisionSpace for Rc<S> {
    fn for_each_candidate(&self, volume: &CollisionVolume, on_pair: &mut dyn FnMut(GeomId)) {
        (**self).for_each_candidate(volume, on_pair)
    }

    fn collide(
        &self,
        volume: &CollisionVolume,
        geom: GeomId,
        max_contacts: usize,
        contacts: &mut Vec<Contact>,
        on_triangle: &mut dyn FnMut(u32),
    ) -> usize {
        (**self).collide(volume, geom, max_contacts, contacts, on_triangle)
    }

    fn mesh_triangle(&self, geom: GeomId, index: u32) -> Option<[Vec3; 3]> {
        (**self).mesh_triangle(geom, index)
    }
}
