/*!
Contact resolution for the feet and torso volumes.

Each query starts from scratch: the normal list and the contact count of the
queried volume are cleared, the space is asked for candidates, and every
candidate that is not one of the character's own volumes is collided.

Normals
- Triangle meshes contribute the face normal of every triangle in range.
- Other geometry contributes the surface normal of each contact point.

Only the feet query remembers a contact: the highest one (by z) seen during
the query, used to compute how far the character must step up.
*/

use crate::{
    constants::{MAX_FEET_CONTACTS, MAX_TORSO_CONTACTS},
    space::CollisionSpace,
    types::{Contact, Vec3, triangle_normal},
    volume::{CollisionVolume, VolumePair},
};

#[derive(Clone, Debug, Default)]
pub struct ContactResolver {
    normals: Vec<Vec3>,
    /// Per-pair narrow phase output, reused between pairs.
    scratch: Vec<Contact>,
    last_feet_contact: Option<Contact>,
    feet_contacts: usize,
    torso_contacts: usize,
}

impl ContactResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collide the feet volume against the space. Returns true iff any contact was found.
    ///
    /// The highest contact of this query replaces the remembered feet contact; on ties the
    /// first one encountered wins. When nothing is touched the previous feet contact is
    /// left as it was.
    pub fn collide_feet<S: CollisionSpace + ?Sized>(
        &mut self,
        space: &S,
        volumes: &VolumePair,
    ) -> bool {
        self.normals.clear();
        self.feet_contacts = 0;

        let mut highest: Option<Contact> = None;
        let Self {
            normals,
            scratch,
            feet_contacts,
            ..
        } = self;

        query_volume(
            space,
            volumes,
            volumes.feet(),
            MAX_FEET_CONTACTS,
            normals,
            scratch,
            &mut |contacts| {
                for contact in contacts {
                    let higher = highest.is_none_or(|h| contact.position.z > h.position.z);
                    if higher {
                        highest = Some(*contact);
                    }
                }
                *feet_contacts += contacts.len();
            },
        );

        if highest.is_some() {
            self.last_feet_contact = highest;
        }
        self.feet_contacts > 0
    }

    /// Collide the torso volume against the space. Returns true iff the torso is blocked.
    pub fn collide_torso<S: CollisionSpace + ?Sized>(
        &mut self,
        space: &S,
        volumes: &VolumePair,
    ) -> bool {
        self.normals.clear();
        self.torso_contacts = 0;

        let Self {
            normals,
            scratch,
            torso_contacts,
            ..
        } = self;

        query_volume(
            space,
            volumes,
            volumes.torso(),
            MAX_TORSO_CONTACTS,
            normals,
            scratch,
            &mut |contacts| *torso_contacts += contacts.len(),
        );

        self.torso_contacts > 0
    }

    /// Normals gathered by the most recent query.
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Highest feet contact from the most recent feet query that touched something.
    pub fn last_feet_contact(&self) -> Option<Contact> {
        self.last_feet_contact
    }

    pub fn feet_contact_count(&self) -> usize {
        self.feet_contacts
    }

    pub fn torso_contact_count(&self) -> usize {
        self.torso_contacts
    }

    /// Forget every contact. Used when the volumes are rebuilt or the collider is reset.
    pub fn invalidate(&mut self) {
        self.normals.clear();
        self.scratch.clear();
        self.last_feet_contact = None;
        self.feet_contacts = 0;
        self.torso_contacts = 0;
    }
}

/// Broad phase plus narrow phase for one volume.
///
/// `on_contacts` sees the contacts of each pair after its normals were recorded.
fn query_volume<S: CollisionSpace + ?Sized>(
    space: &S,
    volumes: &VolumePair,
    volume: &CollisionVolume,
    max_contacts: usize,
    normals: &mut Vec<Vec3>,
    scratch: &mut Vec<Contact>,
    on_contacts: &mut dyn FnMut(&[Contact]),
) {
    space.for_each_candidate(volume, &mut |geom| {
        if volumes.owns(geom) {
            return;
        }

        scratch.clear();
        let mut saw_triangles = false;
        let produced = space.collide(volume, geom, max_contacts, scratch, &mut |index| {
            saw_triangles = true;
            if let Some(n) = space
                .mesh_triangle(geom, index)
                .and_then(|[a, b, c]| triangle_normal(a, b, c))
            {
                normals.push(n);
            }
        });

        if produced == 0 {
            return;
        }
        let contacts = &scratch[scratch.len() - produced..];

        if !saw_triangles {
            normals.extend(contacts.iter().map(|c| c.normal));
        }
        on_contacts(contacts);
    });
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::types::GeomId;

    #[derive(Default)]
    struct Scripted {
        contacts: Vec<Contact>,
        triangles: Vec<[Vec3; 3]>,
    }

    /// A space that replays fixed answers, in candidate order.
    #[derive(Default)]
    struct ScriptedSpace {
        order: Vec<GeomId>,
        pairs: HashMap<GeomId, Scripted>,
    }

    impl ScriptedSpace {
        fn with(mut self, geom: GeomId, contacts: Vec<Contact>, triangles: Vec<[Vec3; 3]>) -> Self {
            self.order.push(geom);
            self.pairs.insert(geom, Scripted { contacts, triangles });
            self
        }

        fn also_report(mut self, geom: GeomId) -> Self {
            self.order.push(geom);
            self
        }
    }

    impl CollisionSpace for ScriptedSpace {
        fn for_each_candidate(&self, _volume: &CollisionVolume, on_pair: &mut dyn FnMut(GeomId)) {
            for geom in &self.order {
                on_pair(*geom);
            }
        }

        fn collide(
            &self,
            _volume: &CollisionVolume,
            geom: GeomId,
            max_contacts: usize,
            contacts: &mut Vec<Contact>,
            on_triangle: &mut dyn FnMut(u32),
        ) -> usize {
            let Some(scripted) = self.pairs.get(&geom) else {
                panic!("unexpected narrow phase against {geom:?}");
            };
            for index in 0..scripted.triangles.len() {
                on_triangle(index as u32);
            }
            let n = scripted.contacts.len().min(max_contacts);
            contacts.extend_from_slice(&scripted.contacts[..n]);
            n
        }

        fn mesh_triangle(&self, geom: GeomId, index: u32) -> Option<[Vec3; 3]> {
            self.pairs.get(&geom)?.triangles.get(index as usize).copied()
        }
    }

    fn at(z: f32, x: f32) -> Contact {
        Contact {
            position: Vec3::new(x, 0.0, z),
            normal: Vec3::z(),
            depth: 0.01,
        }
    }

    fn volumes() -> VolumePair {
        VolumePair::new(1.8, 0.3, 0.5, 0.1).unwrap()
    }

    #[test]
    fn feet_track_highest_contact_first_wins_ties() {
        let space = ScriptedSpace::default()
            .with(GeomId::Static(1), vec![at(0.1, 1.0), at(0.3, 2.0)], vec![])
            .with(GeomId::Static(2), vec![at(0.3, 3.0), at(0.2, 4.0)], vec![]);

        let mut resolver = ContactResolver::new();
        assert!(resolver.collide_feet(&space, &volumes()));

        let contact = resolver.last_feet_contact().unwrap();
        assert_eq!(contact.position.z, 0.3);
        assert_eq!(contact.position.x, 2.0);
        assert_eq!(resolver.feet_contact_count(), 4);
    }

    #[test]
    fn feet_contacts_are_capped_per_pair() {
        let many: Vec<Contact> = (0..12).map(|i| at(i as f32 * 0.01, 0.0)).collect();
        let space = ScriptedSpace::default().with(GeomId::Static(1), many, vec![]);

        let mut resolver = ContactResolver::new();
        resolver.collide_feet(&space, &volumes());
        assert_eq!(resolver.feet_contact_count(), MAX_FEET_CONTACTS);
        assert!((resolver.last_feet_contact().unwrap().position.z - 0.07).abs() < 1.0e-6);
    }

    #[test]
    fn own_volumes_are_never_collided() {
        let pair = volumes();
        // The scripted space panics if asked to collide a geometry it has no answer for.
        let space = ScriptedSpace::default()
            .also_report(pair.feet().geom_id())
            .also_report(pair.torso().geom_id())
            .with(GeomId::Static(5), vec![at(0.0, 0.0)], vec![]);

        let mut resolver = ContactResolver::new();
        assert!(resolver.collide_feet(&space, &pair));
        assert!(resolver.collide_torso(&space, &pair));
        assert_eq!(resolver.torso_contact_count(), 1);
    }

    #[test]
    fn mesh_triangles_contribute_face_normals() {
        let flat = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        // Rises along +x at 45 degrees.
        let ramp = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let degenerate = [Vec3::zeros(), Vec3::zeros(), Vec3::x()];

        let mut contact = at(0.0, 0.0);
        contact.normal = Vec3::new(0.0, 1.0, 0.0);
        let space = ScriptedSpace::default().with(
            GeomId::Static(3),
            vec![contact],
            vec![flat, ramp, degenerate],
        );

        let mut resolver = ContactResolver::new();
        resolver.collide_feet(&space, &volumes());

        let normals = resolver.normals();
        assert_eq!(normals.len(), 2);
        assert!((normals[0] - Vec3::z()).norm() < 1.0e-6);
        let s = std::f32::consts::FRAC_1_SQRT_2;
        assert!((normals[1] - Vec3::new(-s, 0.0, s)).norm() < 1.0e-6);
    }

    #[test]
    fn primitive_contacts_contribute_contact_normals() {
        let mut wall = at(1.0, 0.3);
        wall.normal = Vec3::new(-1.0, 0.0, 0.0);
        let space = ScriptedSpace::default()
            .with(GeomId::Static(1), vec![at(0.0, 0.0)], vec![])
            .with(GeomId::Static(2), vec![wall], vec![]);

        let mut resolver = ContactResolver::new();
        resolver.collide_torso(&space, &volumes());
        // The torso keeps a single contact per pair.
        assert_eq!(resolver.normals(), &[Vec3::z(), Vec3::new(-1.0, 0.0, 0.0)]);
        assert_eq!(resolver.torso_contact_count(), 2);
    }

    #[test]
    fn empty_query_keeps_previous_feet_contact() {
        let touching = ScriptedSpace::default().with(GeomId::Static(1), vec![at(0.4, 0.0)], vec![]);
        let empty = ScriptedSpace::default();

        let mut resolver = ContactResolver::new();
        assert!(resolver.collide_feet(&touching, &volumes()));
        assert!(!resolver.collide_feet(&empty, &volumes()));

        assert_eq!(resolver.feet_contact_count(), 0);
        assert!(resolver.normals().is_empty());
        assert_eq!(resolver.last_feet_contact().unwrap().position.z, 0.4);

        resolver.invalidate();
        assert!(resolver.last_feet_contact().is_none());
    }
}
