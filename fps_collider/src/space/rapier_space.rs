//! Rapier/parry-backed collision space for immutable world geometry.
//!
//! Design goals
//! - Deterministic: given the same inputs, build identical entries (sorted by `id`).
//! - Query-focused: only what the contact resolver needs (candidates, contacts, triangles).
//! - Immutable world: statics do not move after construction, so world AABBs are
//!   computed once.
//!
//! Planes are infinite and are always reported as candidates. Finite shapes and
//! triangle meshes are stored with world-space AABBs and scanned linearly.

use std::f32::consts::FRAC_PI_2;

use log::trace;
use nalgebra as na;
use rapier3d::parry::{
    bounding_volume::Aabb,
    query::{self, ContactManifold, DefaultQueryDispatcher, PersistentQueryDispatcher},
    shape::{Cylinder, Shape, SharedShape, Triangle},
};

use crate::{
    bitmask_flags::{CollisionBits, pair_accepted},
    error::ColliderError,
    space::CollisionSpace,
    types::{Contact, GeomId, Iso, Quat, Vec3},
    volume::CollisionVolume,
};

/// Canonical definition of an immutable world collider.
///
/// Conventions
/// - Units are meters, Z is up.
/// - Rotation is a unit quaternion.
/// - For planes, the normal is derived from the pose: `normal = rotation * +Z`,
///   and `dist = dot(normal, translation) + offset_along_normal`.
/// - Mesh vertices are given in the local frame of the pose.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Stable unique identifier, also the `GeomId::Static` value reported by queries.
    pub id: u32,
    /// World-space translation.
    pub translation: Vec3,
    /// World-space rotation.
    pub rotation: Quat,
    /// Collider shape parameters.
    pub shape: ColliderShapeDef,
    /// Layers this geometry belongs to.
    pub category_bits: CollisionBits,
    /// Layers this geometry accepts collisions from.
    pub collide_bits: CollisionBits,
}

impl WorldStaticDef {
    /// A definition that belongs to every layer and accepts every layer.
    pub fn new(id: u32, translation: Vec3, rotation: Quat, shape: ColliderShapeDef) -> Self {
        Self {
            id,
            translation,
            rotation,
            shape,
            category_bits: CollisionBits::all(),
            collide_bits: CollisionBits::all(),
        }
    }

    /// Horizontal ground plane at height `z`.
    pub fn ground(id: u32, z: f32) -> Self {
        Self::new(
            id,
            Vec3::new(0.0, 0.0, z),
            Quat::identity(),
            ColliderShapeDef::Plane {
                offset_along_normal: 0.0,
            },
        )
    }

    pub fn with_bits(mut self, category_bits: CollisionBits, collide_bits: CollisionBits) -> Self {
        self.category_bits = category_bits;
        self.collide_bits = collide_bits;
        self
    }
}

/// Supported static collider shapes.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite plane (half-space below it is solid).
    Plane {
        /// Offset along the plane normal (meters).
        offset_along_normal: f32,
    },

    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vec3 },

    /// Sphere/ball (meters).
    Sphere { radius: f32 },

    /// Z-aligned flat cylinder (meters).
    CylinderZ { radius: f32, half_height: f32 },

    /// Z-aligned capsule (meters). `half_height` excludes the caps.
    CapsuleZ { radius: f32, half_height: f32 },

    /// Triangle mesh. Each index triple names one triangle, wound counter-clockwise
    /// when seen from the side that faces the character.
    TriMesh {
        vertices: Vec<Vec3>,
        indices: Vec<[u32; 3]>,
    },
}

struct MeshData {
    /// World-space vertices.
    vertices: Vec<Vec3>,
    indices: Vec<[u32; 3]>,
    triangle_aabbs: Vec<Aabb>,
    aabb: Aabb,
}

impl MeshData {
    fn triangle(&self, index: usize) -> Option<[Vec3; 3]> {
        let [a, b, c] = *self.indices.get(index)?;
        Some([
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ])
    }
}

enum GeomKind {
    Plane { shape: SharedShape, pose: Iso },
    Convex { shape: SharedShape, pose: Iso, aabb: Aabb },
    Mesh(MeshData),
}

struct GeomEntry {
    id: u32,
    kind: GeomKind,
    category_bits: CollisionBits,
    collide_bits: CollisionBits,
}

/// Static world geometry answering the collider's broad and narrow phase queries.
pub struct RapierSpace {
    /// Sorted by `id`.
    entries: Vec<GeomEntry>,
}

impl RapierSpace {
    /// Build a space from a list of static collider definitions.
    ///
    /// The input is sorted by `id` before insertion. Duplicate ids, non-finite poses and
    /// malformed meshes are rejected.
    pub fn build(mut defs: Vec<WorldStaticDef>) -> Result<Self, ColliderError> {
        defs.sort_by_key(|d| d.id);

        let mut entries: Vec<GeomEntry> = Vec::with_capacity(defs.len());
        for def in defs {
            if entries.last().is_some_and(|e| e.id == def.id) {
                return Err(ColliderError::DuplicateGeomId(def.id));
            }

            let kind = geom_from_def(&def)?;
            entries.push(GeomEntry {
                id: def.id,
                kind,
                category_bits: def.category_bits,
                collide_bits: def.collide_bits,
            });
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, geom: GeomId) -> Option<&GeomEntry> {
        let GeomId::Static(id) = geom else {
            return None;
        };
        self.entries
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|i| &self.entries[i])
    }
}

impl CollisionSpace for RapierSpace {
    fn for_each_candidate(&self, volume: &CollisionVolume, on_pair: &mut dyn FnMut(GeomId)) {
        let volume_aabb = volume_aabb(volume);

        for entry in &self.entries {
            if !pair_accepted(
                volume.category_bits(),
                volume.collide_bits(),
                entry.category_bits,
                entry.collide_bits,
            ) {
                continue;
            }

            let overlaps = match &entry.kind {
                GeomKind::Plane { .. } => true,
                GeomKind::Convex { aabb, .. } => aabb_intersects(aabb, &volume_aabb),
                GeomKind::Mesh(mesh) => aabb_intersects(&mesh.aabb, &volume_aabb),
            };

            if overlaps {
                on_pair(GeomId::Static(entry.id));
            }
        }
    }

    fn collide(
        &self,
        volume: &CollisionVolume,
        geom: GeomId,
        max_contacts: usize,
        contacts: &mut Vec<Contact>,
        on_triangle: &mut dyn FnMut(u32),
    ) -> usize {
        let Some(entry) = self.entry(geom) else {
            return 0;
        };

        let cylinder = Cylinder::new(volume.half_length(), volume.radius());
        let volume_iso = volume_iso(volume);

        match &entry.kind {
            GeomKind::Plane { shape, pose } | GeomKind::Convex { shape, pose, .. } => {
                if max_contacts == 0 {
                    return 0;
                }
                manifold_contacts(
                    pose,
                    &**shape,
                    &volume_iso,
                    &cylinder,
                    max_contacts,
                    contacts,
                )
            }
            GeomKind::Mesh(mesh) => {
                let volume_aabb = volume_aabb(volume);
                let identity = Iso::identity();
                let mut produced = 0;

                for (index, tri_aabb) in mesh.triangle_aabbs.iter().enumerate() {
                    if !aabb_intersects(tri_aabb, &volume_aabb) {
                        continue;
                    }
                    let Some([a, b, c]) = mesh.triangle(index) else {
                        continue;
                    };

                    on_triangle(index as u32);

                    if produced >= max_contacts {
                        continue;
                    }

                    let triangle = Triangle::new(a.into(), b.into(), c.into());
                    if let Some(contact) =
                        contact_against(&identity, &triangle, &volume_iso, &cylinder)
                    {
                        contacts.push(contact);
                        produced += 1;
                    }
                }

                produced
            }
        }
    }

    fn mesh_triangle(&self, geom: GeomId, index: u32) -> Option<[Vec3; 3]> {
        match &self.entry(geom)?.kind {
            GeomKind::Mesh(mesh) => mesh.triangle(index as usize),
            _ => None,
        }
    }
}

/// Up to `max_contacts` points of the contact manifold between a world shape and a volume
/// cylinder.
///
/// A face resting on a face yields several points, so the highest point of a step edge is
/// reported even when the shallowest separation is sideways. Pairs without a manifold
/// generator fall back to a single exact contact.
fn manifold_contacts(
    shape_pose: &Iso,
    shape: &dyn Shape,
    volume_iso: &Iso,
    cylinder: &Cylinder,
    max_contacts: usize,
    contacts: &mut Vec<Contact>,
) -> usize {
    let pos12 = shape_pose.inv_mul(volume_iso);
    let mut manifolds: Vec<ContactManifold<(), ()>> = Vec::new();
    let mut workspace = None;

    let mut produced = 0;
    match DefaultQueryDispatcher.contact_manifolds(
        &pos12,
        shape,
        cylinder,
        0.0,
        &mut manifolds,
        &mut workspace,
    ) {
        Ok(()) => {
            'manifolds: for manifold in &manifolds {
                let normal = shape_pose * manifold.local_n1;
                for point in &manifold.points {
                    if produced >= max_contacts {
                        break 'manifolds;
                    }
                    if point.dist > 0.0 {
                        continue;
                    }
                    contacts.push(Contact {
                        position: (shape_pose * point.local_p1).coords,
                        normal,
                        depth: -point.dist,
                    });
                    produced += 1;
                }
            }
        }
        Err(unsupported) => trace!("contact manifold unsupported: {unsupported:?}"),
    }

    if produced > 0 {
        return produced;
    }
    match contact_against(shape_pose, shape, volume_iso, cylinder) {
        Some(contact) => {
            contacts.push(contact);
            1
        }
        None => 0,
    }
}

/// Exact contact between a world shape and a volume cylinder, if touching or overlapping.
///
/// The world shape goes first so the reported point lies on its surface and the normal
/// points out of it, toward the volume.
fn contact_against(
    shape_pose: &Iso,
    shape: &dyn Shape,
    volume_iso: &Iso,
    cylinder: &Cylinder,
) -> Option<Contact> {
    match query::contact(shape_pose, shape, volume_iso, cylinder, 0.0) {
        Ok(Some(c)) => Some(Contact {
            position: c.point1.coords,
            normal: c.normal1.into_inner(),
            depth: -c.dist,
        }),
        Ok(None) => None,
        Err(unsupported) => {
            trace!("contact query unsupported: {unsupported:?}");
            None
        }
    }
}

/// Rotation taking parry's +Y shape axis onto world +Z.
fn y_to_z() -> Quat {
    Quat::from_axis_angle(&Vec3::x_axis(), FRAC_PI_2)
}

fn pose(translation: Vec3, rotation: Quat) -> Iso {
    Iso::from_parts(na::Translation3::from(translation), rotation)
}

fn volume_iso(volume: &CollisionVolume) -> Iso {
    pose(volume.position(), y_to_z())
}

fn volume_aabb(volume: &CollisionVolume) -> Aabb {
    let c = volume.position();
    let ext = Vec3::new(volume.radius(), volume.radius(), volume.half_length());
    Aabb::new((c - ext).into(), (c + ext).into())
}

fn geom_from_def(def: &WorldStaticDef) -> Result<GeomKind, ColliderError> {
    let finite = def.translation.iter().all(|v| v.is_finite())
        && def.rotation.coords.iter().all(|v| v.is_finite());
    if !finite {
        return Err(ColliderError::InvalidConfig(format!(
            "static geometry {} has a non-finite pose",
            def.id
        )));
    }

    let kind = match &def.shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => {
            // n = R * +Z; plane is n . x = dist with dist = n . t + offset.
            let n = def.rotation * Vec3::z();
            let dist = n.dot(&def.translation) + *offset_along_normal;
            let unit_n = na::Unit::new_normalize(n);

            GeomKind::Plane {
                shape: SharedShape::halfspace(unit_n),
                pose: pose(unit_n.into_inner() * dist, Quat::identity()),
            }
        }

        ColliderShapeDef::Cuboid { half_extents } => convex(
            SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z),
            pose(def.translation, def.rotation),
        ),

        ColliderShapeDef::Sphere { radius } => convex(
            SharedShape::ball(*radius),
            pose(def.translation, def.rotation),
        ),

        ColliderShapeDef::CylinderZ {
            radius,
            half_height,
        } => convex(
            SharedShape::cylinder(*half_height, *radius),
            pose(def.translation, def.rotation * y_to_z()),
        ),

        ColliderShapeDef::CapsuleZ {
            radius,
            half_height,
        } => convex(
            SharedShape::capsule_z(*half_height, *radius),
            pose(def.translation, def.rotation),
        ),

        ColliderShapeDef::TriMesh { vertices, indices } => {
            GeomKind::Mesh(mesh_from_def(def, vertices, indices)?)
        }
    };

    Ok(kind)
}

fn convex(shape: SharedShape, pose: Iso) -> GeomKind {
    let aabb = shape.compute_aabb(&pose);
    GeomKind::Convex { shape, pose, aabb }
}

fn mesh_from_def(
    def: &WorldStaticDef,
    vertices: &[Vec3],
    indices: &[[u32; 3]],
) -> Result<MeshData, ColliderError> {
    let invalid = |reason: String| ColliderError::InvalidMesh { id: def.id, reason };

    if vertices.is_empty() || indices.is_empty() {
        return Err(invalid("mesh has no triangles".to_string()));
    }
    if let Some(v) = vertices.iter().find(|v| !v.iter().all(|c| c.is_finite())) {
        return Err(invalid(format!("non-finite vertex {v:?}")));
    }
    if let Some(tri) = indices
        .iter()
        .find(|tri| tri.iter().any(|&i| i as usize >= vertices.len()))
    {
        return Err(invalid(format!(
            "triangle {tri:?} indexes past {} vertices",
            vertices.len()
        )));
    }

    let iso = pose(def.translation, def.rotation);
    let world: Vec<Vec3> = vertices
        .iter()
        .map(|v| iso.transform_point(&(*v).into()).coords)
        .collect();

    let triangle_aabbs: Vec<Aabb> = indices
        .iter()
        .map(|&[a, b, c]| points_aabb(&[world[a as usize], world[b as usize], world[c as usize]]))
        .collect();
    let aabb = points_aabb(&world);

    Ok(MeshData {
        vertices: world,
        indices: indices.to_vec(),
        triangle_aabbs,
        aabb,
    })
}

fn points_aabb(points: &[Vec3]) -> Aabb {
    let mut mins = points[0];
    let mut maxs = points[0];
    for p in &points[1..] {
        mins = mins.inf(p);
        maxs = maxs.sup(p);
    }
    Aabb::new(mins.into(), maxs.into())
}

/// Test two AABBs for intersection (touching counts).
fn aabb_intersects(a: &Aabb, b: &Aabb) -> bool {
    !(a.maxs.x < b.mins.x
        || a.mins.x > b.maxs.x
        || a.maxs.y < b.mins.y
        || a.mins.y > b.maxs.y
        || a.maxs.z < b.mins.z
        || a.mins.z > b.maxs.z)
}
