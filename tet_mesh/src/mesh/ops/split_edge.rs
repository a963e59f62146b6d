// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `SplitEdge`: replaces every tet incident to edge `(v1, v2)` with two
//! children, each substituting one endpoint for the new midpoint vertex.

use glam::DVec3;
use mesh_commons::utils::SVec;

use crate::mesh::channels::{face_key, FaceAttributes};
use crate::mesh::connectivity::TetMesh;
use crate::mesh::id_types::{TetId, VertexId};
use crate::mesh::operation::OperationBuilder;
use crate::mesh::tuple::Tuple;

use super::local_faces_of;

#[derive(Debug, Clone)]
pub struct SplitEdge {
    v1: VertexId,
    v2: VertexId,
    new_position: Option<DVec3>,
    cached_quads: SVec<(TetId, [VertexId; 4])>,
    cached_faces: SVec<([VertexId; 3], FaceAttributes)>,
    edge_is_surface: bool,
    new_vid: Option<VertexId>,
}

impl SplitEdge {
    pub fn new(v1: VertexId, v2: VertexId) -> Self {
        Self {
            v1,
            v2,
            new_position: None,
            cached_quads: SVec::new(),
            cached_faces: SVec::new(),
            edge_is_surface: false,
            new_vid: None,
        }
    }

    /// Overrides the default midpoint with an explicit placement, used when
    /// the caller already knows where the inserted point should land (e.g.
    /// snapping onto an input point during insertion).
    pub fn with_position(mut self, p: DVec3) -> Self {
        self.new_position = Some(p);
        self
    }

    /// The newly allocated vertex, once `replacing_tets` has run.
    pub fn new_vertex(&self) -> Option<VertexId> {
        self.new_vid
    }
}

impl OperationBuilder for SplitEdge {
    fn name(&self) -> &'static str {
        "SplitEdge"
    }

    fn removed_tids(&mut self, mesh: &TetMesh, _cursor: Tuple) -> Vec<TetId> {
        let tids = mesh.connectivity.tets_incident_to_edge(self.v1, self.v2);
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
        let mut out = Vec::with_capacity(self.cached_quads.len() * 2);
        for &(_, quad) in &self.cached_quads {
            let pos1 = quad.iter().position(|&v| v == self.v1).unwrap();
            let pos2 = quad.iter().position(|&v| v == self.v2).unwrap();
            let mut a = quad;
            a[pos1] = ux;
            let mut b = quad;
            b[pos2] = ux;
            out.push(a);
            out.push(b);
        }
        out
    }

    fn before(&mut self, mesh: &TetMesh, _cursor: Tuple) -> bool {
        self.edge_is_surface =
            mesh.channels.vertex[self.v1].is_on_surface && mesh.channels.vertex[self.v2].is_on_surface;

        self.cached_faces.clear();
        let tids = mesh.connectivity.tets_incident_to_edge(self.v1, self.v2);
        for tid in tids {
            let quad = mesh.connectivity.tet_vids(tid);
            for face in local_faces_of(quad) {
                let key = face_key(face[0], face[1], face[2]);
                if let Some(&attrs) = mesh.channels.face.get(key) {
                    if !self.cached_faces.iter().any(|(k, _)| *k == key) {
                        self.cached_faces.push((key, attrs));
                    }
                }
            }
        }
        true
    }

    fn after(&mut self, mesh: &mut TetMesh, new_tets: &[TetId]) -> bool {
        let ux = self.new_vid.expect("replacing_tets runs before after");
        let pos = self.new_position.unwrap_or_else(|| {
            let a = mesh.channels.vertex[self.v1].position;
            let b = mesh.channels.vertex[self.v2].position;
            0.5 * (a + b)
        });
        mesh.channels.vertex[ux].position = pos;
        mesh.channels.vertex[ux].is_on_surface = self.edge_is_surface;

        for &(key, attrs) in &self.cached_faces {
            let has_v1 = key.contains(&self.v1);
            let has_v2 = key.contains(&self.v2);
            match (has_v1, has_v2) {
                (false, false) => {}
                (true, true) => {
                    let other = key.iter().copied().find(|&v| v != self.v1 && v != self.v2).unwrap();
                    mesh.channels.face.set(face_key(ux, self.v2, other), attrs);
                    mesh.channels.face.set(face_key(self.v1, ux, other), attrs);
                }
                _ => {
                    let e = if has_v1 { self.v1 } else { self.v2 };
                    let mut rest = key.iter().copied().filter(|&v| v != e);
                    let r0 = rest.next().unwrap();
                    let r1 = rest.next().unwrap();
                    let new_key = face_key(ux, r0, r1);
                    mesh.channels.face.get_mut(new_key).merge(&attrs);
                }
            }
        }

        for &tid in new_tets {
            mesh.channels.tet[tid].quality = super::tet_quality(mesh, tid);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::operation::customized_operation;

    fn single_tet_with_edge() -> (TetMesh, VertexId, VertexId) {
        let mesh = TetMesh::init(
            4,
            &[
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(0.0, 0.0, 1.0),
                DVec3::new(1.0, 0.0, 0.0),
                DVec3::new(0.0, 1.0, 0.0),
            ],
            &[[0, 1, 2, 3]],
        )
        .unwrap();
        let vids: Vec<_> = mesh.connectivity.iter_vertices().collect();
        (mesh, vids[0], vids[1])
    }

    #[test]
    fn split_edge_doubles_the_single_tet_and_preserves_invariants() {
        let (mut mesh, v0, v1) = single_tet_with_edge();
        let tid = mesh.connectivity.iter_tets().next().unwrap();
        let cursor = Tuple::from_tet(&mesh, tid);
        let mut op = SplitEdge::new(v0, v1);
        let (ok, new_cursors) = customized_operation(&mut mesh, &mut op, cursor).unwrap();
        assert!(ok);
        assert_eq!(new_cursors.len(), 2);
        assert_eq!(mesh.connectivity.iter_tets().count(), 2);
        assert!(mesh.check_invariants().is_ok());
    }

    #[test]
    fn split_edge_places_new_vertex_at_midpoint_by_default() {
        let (mut mesh, v0, v1) = single_tet_with_edge();
        let tid = mesh.connectivity.iter_tets().next().unwrap();
        let cursor = Tuple::from_tet(&mesh, tid);
        let p0 = mesh.channels.vertex[v0].position;
        let p1 = mesh.channels.vertex[v1].position;
        let mut op = SplitEdge::new(v0, v1);
        customized_operation(&mut mesh, &mut op, cursor).unwrap();
        let ux = mesh
            .connectivity
            .iter_vertices()
            .find(|&v| v != v0 && v != v1 && mesh.connectivity.incidence(v).len() == 2)
            .unwrap();
        assert_eq!(mesh.channels.vertex[ux].position, 0.5 * (p0 + p1));
    }
}
