// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The point-insertion driver: for each input point, resolve a hint tet,
//! descend the split-history to the leaf actually containing it, classify
//! it, dispatch to the matching local operation, and record the resulting
//! parent→children relation.

use anyhow::Result;
use glam::DVec3;
use tracing::{debug, info_span};

use crate::errors::MeshError;
use crate::hint_oracle::HintOracle;

use super::connectivity::TetMesh;
use super::id_types::VertexId;
use super::locator::{classify, find_containing_tet, Configuration};
use super::operation::customized_operation;
use super::ops::{DivideTet, SplitEdge, SplitFace};
use super::tuple::Tuple;

/// Inserts every point in `points`, in order, returning the vertex id each
/// one resolved to (a freshly split vertex, or the id of a coincident
/// existing vertex). Fails fatally with `OutsideHull` the moment a point
/// isn't contained by any live tet the oracle/history can reach.
pub fn insert_all_points(
    mesh: &mut TetMesh,
    points: &[DVec3],
    oracle: &dyn HintOracle,
) -> Result<Vec<VertexId>> {
    let _span = info_span!("insert_all_points", n = points.len()).entered();
    let mut result = Vec::with_capacity(points.len());
    for (index, &p) in points.iter().enumerate() {
        result.push(insert_one_point(mesh, index, p, oracle)?);
    }
    Ok(result)
}

fn insert_one_point(
    mesh: &mut TetMesh,
    index: usize,
    p: DVec3,
    oracle: &dyn HintOracle,
) -> Result<VertexId> {
    let hint = oracle.hint(p).ok_or(MeshError::OutsideHull { point: p })?;
    let history = mesh.split_history.clone();
    let tid =
        find_containing_tet(mesh, &history, hint, p).ok_or(MeshError::OutsideHull { point: p })?;

    let config = classify(mesh, tid, p);
    debug!(point_index = index, configuration = ?config, "dispatching insertion");

    let vid = match config {
        Configuration::Vertex(v) => v,

        Configuration::Edge(u, w) => {
            let removed = mesh.connectivity.tets_incident_to_edge(u, w);
            let cursor = Tuple::from_edge(mesh, u, w).expect("edge is incident to the leaf tet");
            let mut op = SplitEdge::new(u, w).with_position(p);
            let (ok, new_cursors) = customized_operation(mesh, &mut op, cursor)?;
            if !ok {
                return Err(MeshError::OperationRejected {
                    op: "SplitEdge",
                    hook: "before",
                }
                .into());
            }
            for (i, &parent) in removed.iter().enumerate() {
                let children = [new_cursors[2 * i].tid, new_cursors[2 * i + 1].tid];
                mesh.split_history.record(parent, children);
            }
            op.new_vertex().expect("replacing_tets always allocates one slot")
        }

        Configuration::Face(u, w, x) => {
            let removed = mesh.connectivity.tets_incident_to_face(u, w, x);
            let (cursor, _) =
                Tuple::from_face(mesh, u, w, x).expect("face is incident to the leaf tet");
            let mut op = SplitFace::new(u, w, x).with_position(p);
            let (ok, new_cursors) = customized_operation(mesh, &mut op, cursor)?;
            if !ok {
                return Err(MeshError::OperationRejected {
                    op: "SplitFace",
                    hook: "before",
                }
                .into());
            }
            for (i, &parent) in removed.iter().enumerate() {
                let children = [
                    new_cursors[3 * i].tid,
                    new_cursors[3 * i + 1].tid,
                    new_cursors[3 * i + 2].tid,
                ];
                mesh.split_history.record(parent, children);
            }
            op.new_vertex().expect("replacing_tets always allocates one slot")
        }

        Configuration::Interior => {
            let cursor = Tuple::from_tet(mesh, tid);
            let mut op = DivideTet::new().with_position(p);
            let (ok, new_cursors) = customized_operation(mesh, &mut op, cursor)?;
            if !ok {
                return Err(MeshError::OperationRejected {
                    op: "DivideTet",
                    hook: "before",
                }
                .into());
            }
            let children: Vec<_> = new_cursors.iter().map(|c| c.tid).collect();
            mesh.split_history.record(tid, children);
            op.new_vertex().expect("replacing_tets always allocates one slot")
        }
    };

    Ok(vid)
}

#[cfg(test)]
mod scenarios {
    use super::*;
    use crate::hint_oracle::AabbHintOracle;
    use crate::mesh::channels::FaceAttributes;
    use crate::mesh::id_types::TetId;

    struct FixedHint(TetId);

    impl HintOracle for FixedHint {
        fn hint(&self, _p: DVec3) -> Option<TetId> {
            Some(self.0)
        }
    }

    fn single_tet() -> TetMesh {
        TetMesh::init(
            4,
            &[
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(1.0, 0.0, 0.0),
                DVec3::new(0.0, 1.0, 0.0),
                DVec3::new(0.0, 0.0, 1.0),
            ],
            &[[0, 1, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn interior_insertion_splits_one_tet_into_four() {
        let mut mesh = single_tet();
        let root = mesh.connectivity.iter_tets().next().unwrap();
        let oracle = FixedHint(root);
        let ids =
            insert_all_points(&mut mesh, &[DVec3::new(0.25, 0.25, 0.25)], &oracle).unwrap();
        assert_eq!(ids.len(), 1);
        let ux = ids[0];
        assert_eq!(mesh.connectivity.iter_tets().count(), 4);
        assert_eq!(mesh.connectivity.incidence(ux).len(), 4);
        for &tid in mesh.connectivity.incidence(ux) {
            let vids = mesh.connectivity.tet_vids(tid);
            let pos = |v: VertexId| mesh.channels.vertex[v].position;
            assert_eq!(
                crate::predicates::orient_3d(pos(vids[0]), pos(vids[1]), pos(vids[2]), pos(vids[3])),
                crate::predicates::Orientation::Positive
            );
        }
        assert!(mesh.check_invariants().is_ok());
    }

    fn bipyramid_on_face() -> (TetMesh, VertexId, VertexId, VertexId) {
        let mesh = TetMesh::init(
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
        .unwrap();
        let vids: Vec<_> = mesh.connectivity.iter_vertices().collect();
        (mesh, vids[0], vids[1], vids[2])
    }

    #[test]
    fn face_insertion_splits_two_tets_into_six_and_inherits_surface_tag() {
        let (mut mesh, a, b, c) = bipyramid_on_face();
        let key = crate::mesh::channels::face_key(a, b, c);
        mesh.channels.face.set(
            key,
            FaceAttributes {
                is_surface: true,
                bbox_face: 2,
            },
        );
        let tid = mesh.connectivity.tets_incident_to_face(a, b, c).into_iter().next().unwrap();
        let oracle = FixedHint(tid);
        let ids = insert_all_points(&mut mesh, &[DVec3::new(1.0 / 3.0, 1.0 / 3.0, 0.0)], &oracle)
            .unwrap();
        let ux = ids[0];
        assert_eq!(mesh.connectivity.iter_tets().count(), 6);
        assert!(mesh.channels.vertex[ux].is_on_surface);
        for (x, y) in [(a, b), (b, c), (a, c)] {
            let spoke = crate::mesh::channels::face_key(ux, x, y);
            assert!(mesh.channels.face.get(spoke).unwrap().is_surface);
        }
        assert!(mesh.check_invariants().is_ok());
    }

    fn bipyramid_ring_of_three() -> (TetMesh, VertexId, VertexId) {
        // Three tets fanned around the shared edge (0,1), apexes 2, 3, 4.
        let mesh = TetMesh::init(
            5,
            &[
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(1.0, 0.0, 0.0),
                DVec3::new(0.0, 1.0, 0.0),
                DVec3::new(0.0, 0.0, 1.0),
                DVec3::new(0.0, -1.0, 0.0),
            ],
            &[[0, 1, 2, 3], [0, 1, 3, 4], [0, 1, 4, 2]],
        )
        .unwrap();
        let vids: Vec<_> = mesh.connectivity.iter_vertices().collect();
        (mesh, vids[0], vids[1])
    }

    #[test]
    fn edge_insertion_splits_three_tets_into_six() {
        let (mut mesh, v0, v1) = bipyramid_ring_of_three();
        let tid = mesh.connectivity.tets_incident_to_edge(v0, v1).into_iter().next().unwrap();
        let oracle = FixedHint(tid);
        let ids = insert_all_points(&mut mesh, &[DVec3::new(0.5, 0.0, 0.0)], &oracle).unwrap();
        let ux = ids[0];
        assert_eq!(mesh.connectivity.iter_tets().count(), 6);
        assert_eq!(mesh.connectivity.incidence(ux).len(), 6);
        assert!(!mesh.connectivity.tets_incident_to_edge(v0, ux).is_empty());
        assert!(!mesh.connectivity.tets_incident_to_edge(v1, ux).is_empty());
        assert!(mesh.check_invariants().is_ok());
    }

    #[test]
    fn vertex_snap_is_idempotent() {
        let mut mesh = single_tet();
        let vids: Vec<_> = mesh.connectivity.iter_vertices().collect();
        let existing = vids[1];
        let existing_pos = mesh.channels.vertex[existing].position;
        let root = mesh.connectivity.iter_tets().next().unwrap();
        let oracle = FixedHint(root);
        let ids = insert_all_points(&mut mesh, &[existing_pos], &oracle).unwrap();
        assert_eq!(ids[0], existing);
        assert_eq!(mesh.connectivity.iter_tets().count(), 1);
    }

    #[test]
    fn stacked_insertions_descend_through_split_history() {
        let mut mesh = single_tet();
        let root = mesh.connectivity.iter_tets().next().unwrap();
        let oracle = FixedHint(root);
        insert_all_points(&mut mesh, &[DVec3::new(0.25, 0.25, 0.25)], &oracle).unwrap();
        assert!(!mesh.split_history.is_leaf(root));
        insert_all_points(&mut mesh, &[DVec3::new(0.1, 0.1, 0.1)], &oracle).unwrap();
        assert_eq!(mesh.connectivity.iter_tets().count(), 7);
        assert!(mesh.check_invariants().is_ok());
    }

    /// Minimal deterministic xorshift generator, local to this test module:
    /// the bulk-insertion invariant check needs a reproducible point stream
    /// without pulling in a `rand` dependency the rest of the crate has no
    /// other use for.
    struct XorShift64(u64);

    impl XorShift64 {
        fn next_u64(&mut self) -> u64 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.0 = x;
            x
        }

        fn next_unit(&mut self) -> f64 {
            (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
        }
    }

    /// The classic fan decomposition of a cube into six tets sharing the
    /// main diagonal (0, 6): gap-free and non-overlapping, unlike an
    /// arbitrary vertex-quadruple partition.
    fn unit_cube_six_tets() -> TetMesh {
        let positions = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(1.0, 0.0, 1.0),
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(0.0, 1.0, 1.0),
        ];
        let tets = [
            [0, 1, 2, 6],
            [0, 2, 3, 6],
            [0, 3, 7, 6],
            [0, 7, 4, 6],
            [0, 4, 5, 6],
            [0, 5, 1, 6],
        ];
        TetMesh::init(8, &positions, &tets).unwrap()
    }

    #[test]
    fn invariants_hold_after_bulk_insertion_of_100_random_points() {
        let mut mesh = unit_cube_six_tets();
        let mut rng = XorShift64(0x2545F4914F6CDD1D);
        let mut points = Vec::with_capacity(100);
        while points.len() < 100 {
            let p = DVec3::new(rng.next_unit(), rng.next_unit(), rng.next_unit());
            // keep strictly interior, away from the six-tet decomposition's
            // internal diagonal faces to avoid degenerate (on-face) hints.
            if p.x > 0.02 && p.x < 0.98 && p.y > 0.02 && p.y < 0.98 && p.z > 0.02 && p.z < 0.98 {
                points.push(p);
            }
        }

        for p in points {
            let oracle = AabbHintOracle::rebuild(&mesh.connectivity, &mesh.channels);
            insert_one_point(&mut mesh, 0, p, &oracle).unwrap();
        }

        assert!(mesh.check_invariants().is_ok());
        for vid in mesh.connectivity.iter_vertices().collect::<Vec<_>>() {
            for &tid in mesh.connectivity.incidence(vid) {
                assert!(mesh.connectivity.tet_vids(tid).contains(&vid));
            }
        }
    }
}
