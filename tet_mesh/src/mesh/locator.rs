// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The point locator: classifies a query point against a tet's vertex
//! quadruple into {vertex, edge, face, interior}, and descends the current
//! pass's split-history to re-find containment after the original hint tet
//! has been split.

use std::collections::HashMap;

use glam::DVec3;
use mesh_commons::utils::SVec;

use crate::predicates::{orient_3d, points_are_colinear_3d, Orientation};

use super::connectivity::TetMesh;
use super::id_types::{TetId, VertexId};

/// Per-insertion-pass mapping from parent tet id to the children produced
/// when it was removed by an operation. Leaves (absent keys) are the live
/// tets. Cleared between passes by `TetMesh::consolidate_mesh`.
#[derive(Debug, Clone, Default)]
pub struct SplitHistory {
    children: HashMap<TetId, SVec<TetId>>,
}

impl SplitHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.children.clear();
    }

    pub fn record(&mut self, parent: TetId, children: impl IntoIterator<Item = TetId>) {
        self.children.entry(parent).or_default().extend(children);
    }

    pub fn children_of(&self, parent: TetId) -> Option<&[TetId]> {
        self.children.get(&parent).map(|v| v.as_slice())
    }

    pub fn is_leaf(&self, tid: TetId) -> bool {
        !self.children.contains_key(&tid)
    }
}

/// Output of the configuration classifier: where a point lies relative to a
/// tet whose containment has already been established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Configuration {
    Vertex(VertexId),
    Edge(VertexId, VertexId),
    Face(VertexId, VertexId, VertexId),
    Interior,
}

const OPPOSITE_FACE: [[usize; 3]; 4] = [[1, 2, 3], [0, 2, 3], [0, 1, 3], [0, 1, 2]];

/// A point lies in tet `tid` iff all four orientation tests against its
/// (positively-oriented) faces are non-negative. Degenerate (zero) results
/// indicate the point lies on the boundary, not outside.
pub fn contains_point(mesh: &TetMesh, tid: TetId, p: DVec3) -> bool {
    let vids = mesh.oriented_tet_vids(tid);
    let pos = |v: VertexId| mesh.channels.vertex[v].position;
    let (a, b, c, d) = (pos(vids[0]), pos(vids[1]), pos(vids[2]), pos(vids[3]));
    orient_3d(p, b, c, d).is_non_negative()
        && orient_3d(a, p, c, d).is_non_negative()
        && orient_3d(a, b, p, d).is_non_negative()
        && orient_3d(a, b, c, p).is_non_negative()
}

/// Classifies `p` against `tid`'s vertex quadruple. Assumes `p` is already
/// known to lie within (or on the boundary of) the tet — callers establish
/// that via `contains_point` / `find_containing_tet` first.
///
/// Tie-break, per the local-index order 0..4: the first zero-orientation
/// face wins; within that face, the first collinear edge pair wins.
pub fn classify(mesh: &TetMesh, tid: TetId, p: DVec3) -> Configuration {
    let vids = mesh.oriented_tet_vids(tid);
    let pos = |v: VertexId| mesh.channels.vertex[v].position;

    for &v in &vids {
        if pos(v) == p {
            return Configuration::Vertex(v);
        }
    }

    for face in OPPOSITE_FACE {
        let (a, b, c) = (vids[face[0]], vids[face[1]], vids[face[2]]);
        if orient_3d(pos(a), pos(b), pos(c), p) == Orientation::Zero {
            for (u, w) in [(a, b), (b, c), (a, c)] {
                if points_are_colinear_3d(pos(u), pos(w), p) {
                    return Configuration::Edge(u, w);
                }
            }
            return Configuration::Face(a, b, c);
        }
    }

    Configuration::Interior
}

/// Descends the split-history from `tid` to find the leaf that currently
/// contains `p`. Returns `None` if no leaf does — the caller treats that as
/// `MeshError::OutsideHull`.
pub fn find_containing_tet(
    mesh: &TetMesh,
    history: &SplitHistory,
    tid: TetId,
    p: DVec3,
) -> Option<TetId> {
    match history.children_of(tid) {
        None => {
            if mesh.connectivity.is_tet_live(tid) && contains_point(mesh, tid, p) {
                Some(tid)
            } else {
                None
            }
        }
        Some(children) => children
            .iter()
            .find_map(|&child| find_containing_tet(mesh, history, child, p)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_tet() -> (TetMesh, [VertexId; 4]) {
        let mesh = TetMesh::init(
            4,
            &[
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(1.0, 0.0, 0.0),
                DVec3::new(0.0, 1.0, 0.0),
                DVec3::new(0.0, 0.0, 1.0),
            ],
            &[[0, 1, 2, 3]],
        )
        .unwrap();
        let vids: Vec<_> = mesh.connectivity.iter_vertices().collect();
        (mesh, [vids[0], vids[1], vids[2], vids[3]])
    }

    #[test]
    fn interior_point_classifies_as_interior() {
        let (mesh, _) = unit_tet();
        let tid = mesh.connectivity.iter_tets().next().unwrap();
        let p = DVec3::new(0.25, 0.25, 0.25);
        assert!(contains_point(&mesh, tid, p));
        assert_eq!(classify(&mesh, tid, p), Configuration::Interior);
    }

    #[test]
    fn vertex_coincident_point_classifies_as_vertex() {
        let (mesh, _) = unit_tet();
        let tid = mesh.connectivity.iter_tets().next().unwrap();
        let origin = mesh.oriented_tet_vids(tid)[0];
        let p = mesh.channels.vertex[origin].position;
        assert_eq!(classify(&mesh, tid, p), Configuration::Vertex(origin));
    }

    #[test]
    fn outside_point_is_not_contained() {
        let (mesh, _) = unit_tet();
        let tid = mesh.connectivity.iter_tets().next().unwrap();
        assert!(!contains_point(&mesh, tid, DVec3::new(-1.0, -1.0, -1.0)));
    }

    #[test]
    fn split_history_descent_finds_leaf() {
        let (mesh, _) = unit_tet();
        let root = mesh.connectivity.iter_tets().next().unwrap();
        let mut history = SplitHistory::new();
        // fabricate a fake single-child split so descent has something to do
        let fake_child_mesh = TetMesh::init(
            4,
            &[
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(1.0, 0.0, 0.0),
                DVec3::new(0.0, 1.0, 0.0),
                DVec3::new(0.0, 0.0, 1.0),
            ],
            &[[0, 1, 2, 3]],
        )
        .unwrap();
        let fake_child = fake_child_mesh.connectivity.iter_tets().next().unwrap();
        history.record(root, [fake_child]);
        assert!(!history.is_leaf(root));
        // descending through a history entry whose recorded child doesn't
        // exist in `mesh` finds nothing, which is the expected "stale
        // lookup" behavior rather than a panic.
        assert!(find_containing_tet(&mesh, &history, root, DVec3::new(0.1, 0.1, 0.1)).is_none());
    }
}
