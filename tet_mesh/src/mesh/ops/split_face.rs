// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `SplitFace`: replaces every tet incident to face `(a, b, c)` — one on the
//! boundary, up to two interior — with three children each, fanning out
//! from a new vertex placed on the face.

use glam::DVec3;
use mesh_commons::utils::SVec;

use crate::mesh::channels::{face_key, FaceAttributes};
use crate::mesh::connectivity::TetMesh;
use crate::mesh::id_types::{TetId, VertexId};
use crate::mesh::operation::OperationBuilder;
use crate::mesh::tuple::Tuple;

use super::local_faces_of;

#[derive(Debug, Clone)]
pub struct SplitFace {
    a: VertexId,
    b: VertexId,
    c: VertexId,
    new_position: Option<DVec3>,
    cached_quads: SVec<(TetId, [VertexId; 4])>,
    old_face_attrs: FaceAttributes,
    /// Every face attribute of the removed tets, split face included — `j_vn`
    /// (the vertices of each triple not among the split face's three) picks
    /// the transfer rule in `after`.
    cached_faces: SVec<([VertexId; 3], FaceAttributes)>,
    new_vid: Option<VertexId>,
}

impl SplitFace {
    pub fn new(a: VertexId, b: VertexId, c: VertexId) -> Self {
        Self {
            a,
            b,
            c,
            new_position: None,
            cached_quads: SVec::new(),
            old_face_attrs: FaceAttributes::default(),
            cached_faces: SVec::new(),
            new_vid: None,
        }
    }

    pub fn with_position(mut self, p: DVec3) -> Self {
        self.new_position = Some(p);
        self
    }

    /// The newly allocated vertex, once `replacing_tets` has run.
    pub fn new_vertex(&self) -> Option<VertexId> {
        self.new_vid
    }

    fn face_key(&self) -> [VertexId; 3] {
        face_key(self.a, self.b, self.c)
    }
}

impl OperationBuilder for SplitFace {
    fn name(&self) -> &'static str {
        "SplitFace"
    }

    fn removed_tids(&mut self, mesh: &TetMesh, _cursor: Tuple) -> Vec<TetId> {
        let tids = mesh.connectivity.tets_incident_to_face(self.a, self.b, self.c);
        self.cached_quads = tids
            .iter()
            .map(|&t| (t, mesh.connectivity.tet_vids(t)))
            .collect();
        tids.into_iter().collect()
    }

    fn request_vert_slots(&self) -> usize {
        1
    }

    fn replacing_tets(&mut self, slots: &[VertexId]) -> Vec<[VertexId; 4]> {
        let ux = slots[0];
        self.new_vid = Some(ux);
        let collapse = [self.a, self.b, self.c];
        let mut out = Vec::with_capacity(self.cached_quads.len() * 3);
        for &(_, quad) in &self.cached_quads {
            for &v in &collapse {
                let idx = quad.iter().position(|&q| q == v).unwrap();
                let mut new_quad = quad;
                new_quad[idx] = ux;
                out.push(new_quad);
            }
        }
        out
    }

    fn before(&mut self, mesh: &TetMesh, _cursor: Tuple) -> bool {
        self.old_face_attrs = mesh.channels.face.get(self.face_key()).copied().unwrap_or_default();

        self.cached_faces.clear();
        let tids = mesh.connectivity.tets_incident_to_face(self.a, self.b, self.c);
        for tid in tids {
            let quad = mesh.connectivity.tet_vids(tid);
            for face in local_faces_of(quad) {
                let key = face_key(face[0], face[1], face[2]);
                let attrs = mesh.channels.face.get(key).copied().unwrap_or_default();
                self.cached_faces.push((key, attrs));
            }
        }
        true
    }

    fn after(&mut self, mesh: &mut TetMesh, new_tets: &[TetId]) -> bool {
        let ux = self.new_vid.expect("replacing_tets runs before after");
        let pos = self.new_position.unwrap_or_else(|| {
            let pa = mesh.channels.vertex[self.a].position;
            let pb = mesh.channels.vertex[self.b].position;
            let pc = mesh.channels.vertex[self.c].position;
            (pa + pb + pc) / 3.0
        });
        mesh.channels.vertex[ux].position = pos;
        mesh.channels.vertex[ux].is_on_surface = self.old_face_attrs.is_surface;

        let collapse = [self.a, self.b, self.c];
        for &(key, attrs) in &self.cached_faces {
            let j_vn: SVec<VertexId> = key.iter().copied().filter(|v| !collapse.contains(v)).collect();
            match j_vn.len() {
                // The triple is the split face itself: each of the three
                // replacements (substitute one face-vertex with ux)
                // inherits the attribute.
                0 => {
                    for &v in &collapse {
                        let rest: SVec<VertexId> = collapse.iter().copied().filter(|&w| w != v).collect();
                        mesh.channels.face.set(face_key(ux, rest[0], rest[1]), attrs);
                    }
                }
                // Exactly one vertex off the split face: the new internal
                // faces {ux, face-vertex, off-vertex} are reset, not
                // inherited — they're freshly interior.
                1 => {
                    let off = j_vn[0];
                    for v in key.iter().copied().filter(|&v| v != off) {
                        mesh.channels.face.get_mut(face_key(ux, v, off)).reset();
                    }
                }
                // Two or more vertices off the split face: the triple isn't
                // touched by the substitution at all, so it survives under
                // its own key unchanged. Unreachable with exactly two
                // removed tets (each contributes at most one off-vertex,
                // its own apex) but kept for faithfulness to the rule.
                _ => {}
            }
        }
        mesh.channels.face.remove(self.face_key());

        for &tid in new_tets {
            mesh.channels.tet[tid].quality = super::tet_quality(mesh, tid);
        }
        true
    }
}
