// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `DivideTet`: replaces a single tet with four children fanning out from a
//! new interior vertex. Every one of the tet's four original faces survives
//! unchanged, carried by whichever child keeps all three of its vertices;
//! only brand new interior faces (ux to each original edge) are created,
//! and those start with default (non-surface) attributes.

use glam::DVec3;

use crate::mesh::channels::{face_key, FaceAttributes};
use crate::mesh::connectivity::TetMesh;
use crate::mesh::id_types::{TetId, VertexId};
use crate::mesh::operation::OperationBuilder;
use crate::mesh::tuple::Tuple;

use super::local_faces_of;

#[derive(Debug, Clone)]
pub struct DivideTet {
    new_position: Option<DVec3>,
    quad: [VertexId; 4],
    cached_faces: [([VertexId; 3], Option<FaceAttributes>); 4],
    new_vid: Option<VertexId>,
}

impl DivideTet {
    pub fn new() -> Self {
        Self {
            new_position: None,
            quad: [VertexId::default(); 4],
            cached_faces: [
                ([VertexId::default(); 3], None),
                ([VertexId::default(); 3], None),
                ([VertexId::default(); 3], None),
                ([VertexId::default(); 3], None),
            ],
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
}

impl Default for DivideTet {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationBuilder for DivideTet {
    fn name(&self) -> &'static str {
        "DivideTet"
    }

    fn removed_tids(&mut self, mesh: &TetMesh, cursor: Tuple) -> Vec<TetId> {
        self.quad = mesh.connectivity.tet_vids(cursor.tid);
        vec![cursor.tid]
    }

    fn request_vert_slots(&self) -> usize {
        1
    }

    fn replacing_tets(&mut self, slots: &[VertexId]) -> Vec<[VertexId; 4]> {
        let ux = slots[0];
        self.new_vid = Some(ux);
        (0..4)
            .map(|i| {
                let mut q = self.quad;
                q[i] = ux;
                q
            })
            .collect()
    }

    fn before(&mut self, mesh: &TetMesh, cursor: Tuple) -> bool {
        let quad = mesh.connectivity.tet_vids(cursor.tid);
        let faces = local_faces_of(quad);
        for (slot, face) in self.cached_faces.iter_mut().zip(faces) {
            let key = face_key(face[0], face[1], face[2]);
            *slot = (key, mesh.channels.face.get(key).copied());
        }
        true
    }

    fn after(&mut self, mesh: &mut TetMesh, new_tets: &[TetId]) -> bool {
        let ux = self.new_vid.expect("replacing_tets runs before after");
        let pos = self.new_position.unwrap_or_else(|| {
            self.quad
                .iter()
                .map(|&v| mesh.channels.vertex[v].position)
                .fold(DVec3::ZERO, |acc, p| acc + p)
                / 4.0
        });
        mesh.channels.vertex[ux].position = pos;

        // The four original faces are now interior; reset then re-install
        // whatever attribute they carried, since their triples (unchanged)
        // remain valid boundary markers in the new mesh.
        for &(key, attrs) in &self.cached_faces {
            mesh.channels.face.reset(key);
            if let Some(attrs) = attrs {
                mesh.channels.face.set(key, attrs);
            }
        }

        for &tid in new_tets {
            mesh.channels.tet[tid].quality = super::tet_quality(mesh, tid);
        }
        true
    }
}
