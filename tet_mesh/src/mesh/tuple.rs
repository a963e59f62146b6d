// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The tuple cursor: a (vertex, edge-local, face-local, tet) location that
//! identifies one incidence chain inside a tet, plus the four switch
//! operations that walk it to its unique neighbor in one component.
//!
//! Validity is hash-based rather than back-pointer-based: each tet carries
//! a version that bumps on every mutation touching it, and a tuple caches
//! that version at construction. This sidesteps the cyclic-ownership
//! problems a back-pointer scheme would create.

use tracing::warn;

use crate::errors::MeshError;

use super::connectivity::TetMesh;
use super::id_types::{TetId, VertexId};

/// The six local edges of a tet, as index pairs into its vertex quadruple.
pub const LOCAL_EDGES: [(u8, u8); 6] = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];

/// The four local faces of a tet, each opposite the vertex at the same
/// index — face 0 is opposite vertex 0, and so on.
pub const LOCAL_FACES: [[u8; 3]; 4] = [[1, 2, 3], [0, 2, 3], [0, 1, 3], [0, 1, 2]];

/// A (vertex, edge, face, tet) cursor. Ephemeral: never hold one across a
/// mutation without re-validating via `Tuple::revalidate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tuple {
    pub vid: VertexId,
    pub eid: u8,
    pub fid: u8,
    pub tid: TetId,
    hash: u64,
}

fn edge_endpoints(vids: &[VertexId; 4], eid: u8) -> (VertexId, VertexId) {
    let (i, j) = LOCAL_EDGES[eid as usize];
    (vids[i as usize], vids[j as usize])
}

fn face_vertices(vids: &[VertexId; 4], fid: u8) -> [VertexId; 3] {
    let idx = LOCAL_FACES[fid as usize];
    [vids[idx[0] as usize], vids[idx[1] as usize], vids[idx[2] as usize]]
}

fn find_edge_local(vids: &[VertexId; 4], a: VertexId, b: VertexId) -> u8 {
    LOCAL_EDGES
        .iter()
        .position(|&(i, j)| {
            let (va, vb) = (vids[i as usize], vids[j as usize]);
            (va == a && vb == b) || (va == b && vb == a)
        })
        .expect("edge not present in tet") as u8
}

fn find_face_local(vids: &[VertexId; 4], target: [VertexId; 3]) -> u8 {
    let mut sorted_target = target;
    sorted_target.sort();
    LOCAL_FACES
        .iter()
        .enumerate()
        .find_map(|(fid, idx)| {
            let mut f = [vids[idx[0] as usize], vids[idx[1] as usize], vids[idx[2] as usize]];
            f.sort();
            (f == sorted_target).then_some(fid as u8)
        })
        .expect("face not present in tet")
}

impl Tuple {
    /// The canonical cursor over a tet: vertex 0, edge (0,1), face opposite
    /// vertex 3 (the only face containing both endpoints of that edge and
    /// vertex 0).
    pub fn from_tet(mesh: &TetMesh, tid: TetId) -> Self {
        let vids = mesh.connectivity.tet_vids(tid);
        Tuple {
            vid: vids[0],
            eid: 0,
            fid: find_face_local(&vids, [vids[0], vids[1], vids[2]]),
            tid,
            hash: mesh.connectivity.hash(tid),
        }
    }

    /// Any cursor over the unordered edge (a, b): searches `a`'s incidence
    /// list for a tet containing both endpoints.
    pub fn from_edge(mesh: &TetMesh, a: VertexId, b: VertexId) -> Option<Self> {
        let tid = *mesh
            .connectivity
            .incidence(a)
            .iter()
            .find(|&&t| mesh.connectivity.tet_vids(t).contains(&b))?;
        let vids = mesh.connectivity.tet_vids(tid);
        let eid = find_edge_local(&vids, a, b);
        let fid = LOCAL_FACES
            .iter()
            .position(|idx| idx.contains(&LOCAL_EDGES[eid as usize].0) && idx.contains(&LOCAL_EDGES[eid as usize].1))
            .expect("every edge borders at least one face") as u8;
        Some(Tuple {
            vid: a,
            eid,
            fid,
            tid,
            hash: mesh.connectivity.hash(tid),
        })
    }

    /// A cursor over the sorted vertex triple (a, b, c), plus the global
    /// face id (derived as the owning tet and local face index).
    pub fn from_face(mesh: &TetMesh, a: VertexId, b: VertexId, c: VertexId) -> Option<(Self, (TetId, u8))> {
        let tid = *mesh
            .connectivity
            .incidence(a)
            .iter()
            .find(|&&t| {
                let vids = mesh.connectivity.tet_vids(t);
                vids.contains(&b) && vids.contains(&c)
            })?;
        let vids = mesh.connectivity.tet_vids(tid);
        let fid = find_face_local(&vids, [a, b, c]);
        let eid = find_edge_local(&vids, a, b);
        Some((
            Tuple {
                vid: a,
                eid,
                fid,
                tid,
                hash: mesh.connectivity.hash(tid),
            },
            (tid, fid),
        ))
    }

    /// `Ok(())` iff this cursor's tet is live and hasn't been mutated since
    /// the cursor was taken.
    pub fn revalidate(&self, mesh: &TetMesh) -> Result<(), MeshError> {
        if mesh.connectivity.is_tet_live(self.tid) && mesh.connectivity.hash(self.tid) == self.hash
        {
            Ok(())
        } else {
            warn!(tet = ?self.tid, "stale cursor used at public API boundary");
            Err(MeshError::StaleCursor { tet: self.tid })
        }
    }

    /// Moves to the unique other endpoint of the current edge.
    pub fn switch_vertex(&self, mesh: &TetMesh) -> Result<Self, MeshError> {
        self.revalidate(mesh)?;
        let vids = mesh.connectivity.tet_vids(self.tid);
        let (a, b) = edge_endpoints(&vids, self.eid);
        let other = if a == self.vid { b } else { a };
        Ok(Tuple {
            vid: other,
            ..*self
        })
    }

    /// Moves to the unique other local edge within the current face that
    /// also touches the current vertex.
    pub fn switch_edge(&self, mesh: &TetMesh) -> Result<Self, MeshError> {
        self.revalidate(mesh)?;
        let vids = mesh.connectivity.tet_vids(self.tid);
        let face = face_vertices(&vids, self.fid);
        let new_eid = LOCAL_EDGES
            .iter()
            .enumerate()
            .find(|&(eid, &(i, j))| {
                eid as u8 != self.eid
                    && face.contains(&vids[i as usize])
                    && face.contains(&vids[j as usize])
                    && (vids[i as usize] == self.vid || vids[j as usize] == self.vid)
            })
            .map(|(eid, _)| eid as u8)
            .expect("a triangle has two edges meeting at each vertex");
        Ok(Tuple {
            eid: new_eid,
            ..*self
        })
    }

    /// Moves to the unique other local face within the current tet that
    /// also contains the current edge.
    pub fn switch_face(&self, mesh: &TetMesh) -> Result<Self, MeshError> {
        self.revalidate(mesh)?;
        let new_fid = LOCAL_FACES
            .iter()
            .enumerate()
            .find(|&(fid, idx)| {
                fid as u8 != self.fid
                    && idx.contains(&LOCAL_EDGES[self.eid as usize].0)
                    && idx.contains(&LOCAL_EDGES[self.eid as usize].1)
            })
            .map(|(fid, _)| fid as u8)
            .expect("every edge borders exactly two faces of a tet");
        Ok(Tuple {
            fid: new_fid,
            ..*self
        })
    }

    /// Moves to the tet on the other side of the current face, or `None`
    /// when that face is a boundary face.
    pub fn switch_tet(&self, mesh: &TetMesh) -> Result<Option<Self>, MeshError> {
        self.revalidate(mesh)?;
        let vids = mesh.connectivity.tet_vids(self.tid);
        let face = face_vertices(&vids, self.fid);
        let others: Vec<TetId> = mesh
            .connectivity
            .tets_incident_to_face(face[0], face[1], face[2])
            .into_iter()
            .filter(|&t| t != self.tid)
            .collect();
        let Some(&new_tid) = others.first() else {
            return Ok(None);
        };
        let new_vids = mesh.connectivity.tet_vids(new_tid);
        let new_fid = find_face_local(&new_vids, face);
        let (ea, eb) = edge_endpoints(&vids, self.eid);
        let new_eid = find_edge_local(&new_vids, ea, eb);
        Ok(Some(Tuple {
            vid: self.vid,
            eid: new_eid,
            fid: new_fid,
            tid: new_tid,
            hash: mesh.connectivity.hash(new_tid),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    fn bipyramid() -> TetMesh {
        // Two tets sharing face (0,1,2), apexes at 3 and 4.
        TetMesh::init(
            5,
            &[
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(1.0, 0.0, 0.0),
                DVec3::new(0.0, 1.0, 0.0),
                DVec3::new(0.0, 0.0, 1.0),
                DVec3::new(0.0, 0.0, -1.0),
            ],
            &[[0, 1, 2, 3], [0, 2, 1, 4]],
        )
        .unwrap()
    }

    #[test]
    fn switch_vertex_is_involutive() {
        let mesh = bipyramid();
        let tid = mesh.connectivity.iter_tets().next().unwrap();
        let t = Tuple::from_tet(&mesh, tid);
        let t2 = t.switch_vertex(&mesh).unwrap();
        assert_ne!(t.vid, t2.vid);
        let t3 = t2.switch_vertex(&mesh).unwrap();
        assert_eq!(t, t3);
    }

    #[test]
    fn switch_edge_is_involutive() {
        let mesh = bipyramid();
        let tid = mesh.connectivity.iter_tets().next().unwrap();
        let t = Tuple::from_tet(&mesh, tid);
        let t2 = t.switch_edge(&mesh).unwrap();
        assert_ne!(t.eid, t2.eid);
        let t3 = t2.switch_edge(&mesh).unwrap();
        assert_eq!(t, t3);
    }

    #[test]
    fn switch_face_is_involutive() {
        let mesh = bipyramid();
        let tid = mesh.connectivity.iter_tets().next().unwrap();
        let t = Tuple::from_tet(&mesh, tid);
        let t2 = t.switch_face(&mesh).unwrap();
        assert_ne!(t.fid, t2.fid);
        let t3 = t2.switch_face(&mesh).unwrap();
        assert_eq!(t, t3);
    }

    #[test]
    fn switch_tet_crosses_shared_face_and_back() {
        let mesh = bipyramid();
        let tets: Vec<_> = mesh.connectivity.iter_tets().collect();
        let vids0 = mesh.connectivity.tet_vids(tets[0]);
        // Build a tuple whose face is the (0,1,2) face shared by both tets.
        let (t, _) = Tuple::from_face(&mesh, vids0[0], vids0[1], vids0[2]).unwrap();
        let crossed = t.switch_tet(&mesh).unwrap();
        assert!(crossed.is_some());
        let crossed = crossed.unwrap();
        assert_ne!(crossed.tid, t.tid);
        let back = crossed.switch_tet(&mesh).unwrap().unwrap();
        assert_eq!(back.tid, t.tid);
    }

    #[test]
    fn switch_tet_none_on_boundary_face() {
        let mesh = bipyramid();
        let tid = mesh.connectivity.iter_tets().next().unwrap();
        let vids = mesh.connectivity.tet_vids(tid);
        // Any face touching the apex vertex only borders this one tet.
        let apex = vids[3];
        let others: Vec<_> = vids.iter().copied().filter(|&v| v != apex).take(2).collect();
        let (t, _) = Tuple::from_face(&mesh, apex, others[0], others[1]).unwrap();
        assert!(t.switch_tet(&mesh).unwrap().is_none());
    }

    #[test]
    fn tuple_from_tet_round_trips_tid() {
        let mesh = bipyramid();
        let tid = mesh.connectivity.iter_tets().next().unwrap();
        assert_eq!(Tuple::from_tet(&mesh, tid).tid, tid);
    }

    #[test]
    fn stale_cursor_detected_after_hash_bump() {
        let mut mesh = bipyramid();
        let tid = mesh.connectivity.iter_tets().next().unwrap();
        let t = Tuple::from_tet(&mesh, tid);
        mesh.connectivity.bump_hash(tid);
        assert!(matches!(
            t.switch_vertex(&mesh),
            Err(MeshError::StaleCursor { .. })
        ));
    }
}
