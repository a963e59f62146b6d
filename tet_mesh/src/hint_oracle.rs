// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Point-location hint oracle: a best-guess starting tet for the locator to
//! descend the split-history from. The oracle is allowed to be wrong or
//! stale — it only needs to get the search close, since `locator::
//! find_containing_tet` re-derives the real leaf from there. Kept outside
//! `mesh` since it's a reference implementation plugged into insertion
//! through the trait, not part of the mesh's own invariants.

use glam::DVec3;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::mesh::channels::Channels;
use crate::mesh::connectivity::MeshConnectivity;
use crate::mesh::id_types::TetId;

pub trait HintOracle {
    /// Best-guess tet id to start the locator's descent from for `p`. `None`
    /// when the oracle has no tets indexed yet.
    fn hint(&self, p: DVec3) -> Option<TetId>;
}

struct IndexedTet {
    tid: TetId,
    aabb: AABB<[f64; 3]>,
}

impl RTreeObject for IndexedTet {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

impl PointDistance for IndexedTet {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        self.aabb.distance_2(point)
    }
}

/// Reference `HintOracle` backed by an R-tree of tet bounding boxes. Rebuilt
/// wholesale from the live mesh; cheap enough for tests and small meshes,
/// not meant to be kept incrementally in sync across many operations.
pub struct AabbHintOracle {
    tree: RTree<IndexedTet>,
}

impl AabbHintOracle {
    pub fn rebuild(connectivity: &MeshConnectivity, channels: &Channels) -> Self {
        let objects: Vec<IndexedTet> = connectivity
            .iter_tets()
            .map(|tid| {
                let vids = connectivity.tet_vids(tid);
                let pts: Vec<DVec3> = vids.iter().map(|&v| channels.vertex[v].position).collect();
                let min = pts.iter().fold(DVec3::splat(f64::INFINITY), |a, &b| a.min(b));
                let max = pts.iter().fold(DVec3::splat(f64::NEG_INFINITY), |a, &b| a.max(b));
                IndexedTet {
                    tid,
                    aabb: AABB::from_corners([min.x, min.y, min.z], [max.x, max.y, max.z]),
                }
            })
            .collect();
        Self {
            tree: RTree::bulk_load(objects),
        }
    }
}

impl HintOracle for AabbHintOracle {
    fn hint(&self, p: DVec3) -> Option<TetId> {
        self.tree
            .nearest_neighbor(&[p.x, p.y, p.z])
            .map(|indexed| indexed.tid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::connectivity::TetMesh;

    #[test]
    fn hint_returns_none_on_empty_tree() {
        let mesh = TetMesh::new();
        let oracle = AabbHintOracle::rebuild(&mesh.connectivity, &mesh.channels);
        assert!(oracle.hint(DVec3::ZERO).is_none());
    }

    #[test]
    fn hint_finds_the_containing_tet() {
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
        let oracle = AabbHintOracle::rebuild(&mesh.connectivity, &mesh.channels);
        let tid = mesh.connectivity.iter_tets().next().unwrap();
        assert_eq!(oracle.hint(DVec3::new(0.1, 0.1, 0.1)), Some(tid));
    }
}
