// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::Result;
use glam::DVec3;
use mesh_commons::utils::SVec;
use slotmap::{SecondaryMap, SlotMap};

use crate::errors::MeshError;
use crate::predicates::{orient_3d, Orientation};

use super::channels::{Channels, VertexAttributes};
use super::id_types::{TetId, VertexId};
use super::locator::SplitHistory;

#[derive(Debug, Clone, Default)]
pub struct VertexSlot {
    pub incidence: SVec<TetId>,
    pub removed: bool,
}

#[derive(Debug, Clone)]
pub struct TetSlot {
    pub vids: [VertexId; 4],
    pub removed: bool,
    pub hash: u64,
}

/// Old id -> new id remaps produced by a `consolidate` pass, handed to the
/// attribute tables so they can relabel in lockstep.
pub struct ConsolidateMapping {
    pub vertices: SecondaryMap<VertexId, VertexId>,
    pub tets: SecondaryMap<TetId, TetId>,
}

/// Vertex/tet incidence store. This is the *only* persisted adjacency: every
/// other adjacency (face-adjacent tet, edge neighborhood) is recovered on
/// demand by intersecting incidence lists. Owns no geometry or attribute
/// data.
#[derive(Debug, Clone, Default)]
pub struct MeshConnectivity {
    pub(crate) vertices: SlotMap<VertexId, VertexSlot>,
    pub(crate) tets: SlotMap<TetId, TetSlot>,
}

impl MeshConnectivity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_vertex(&mut self) -> VertexId {
        self.vertices.insert(VertexSlot::default())
    }

    /// Allocates a new tet with the given vertex quadruple, wiring up
    /// incidence on all four vertices. Does not check orientation; callers
    /// validate that separately against geometry.
    pub fn alloc_tet(&mut self, vids: [VertexId; 4]) -> TetId {
        let tid = self.tets.insert(TetSlot {
            vids,
            removed: false,
            hash: 0,
        });
        for v in vids {
            self.vertices[v].incidence.push(tid);
        }
        tid
    }

    /// Tombstones a tet: marks it removed and strips it from every vertex's
    /// incidence list. The slot itself is only reclaimed by `consolidate`.
    pub fn remove_tet(&mut self, tid: TetId) {
        let vids = self.tets[tid].vids;
        self.tets[tid].removed = true;
        for v in vids {
            self.vertices[v].incidence.retain(|t| *t != tid);
        }
    }

    pub fn bump_hash(&mut self, tid: TetId) {
        self.tets[tid].hash = self.tets[tid].hash.wrapping_add(1);
    }

    pub fn hash(&self, tid: TetId) -> u64 {
        self.tets[tid].hash
    }

    pub fn is_tet_live(&self, tid: TetId) -> bool {
        self.tets.get(tid).map_or(false, |t| !t.removed)
    }

    pub fn is_vertex_live(&self, vid: VertexId) -> bool {
        self.vertices.get(vid).map_or(false, |v| !v.removed)
    }

    pub fn tet_vids(&self, tid: TetId) -> [VertexId; 4] {
        self.tets[tid].vids
    }

    pub fn incidence(&self, vid: VertexId) -> &[TetId] {
        &self.vertices[vid].incidence
    }

    pub fn iter_tets(&self) -> impl Iterator<Item = TetId> + '_ {
        self.tets
            .iter()
            .filter(|(_, t)| !t.removed)
            .map(|(id, _)| id)
    }

    pub fn iter_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .filter(|(_, v)| !v.removed)
            .map(|(id, _)| id)
    }

    /// Tets incident to an (unordered) edge: the intersection of both
    /// endpoints' incidence lists.
    pub fn tets_incident_to_edge(&self, a: VertexId, b: VertexId) -> SVec<TetId> {
        self.incidence(a)
            .iter()
            .copied()
            .filter(|t| self.incidence(b).contains(t))
            .collect()
    }

    /// Tets incident to a face given as three vertices: intersection of all
    /// three incidence lists. At most two for a manifold mesh (one on the
    /// boundary).
    pub fn tets_incident_to_face(&self, a: VertexId, b: VertexId, c: VertexId) -> SVec<TetId> {
        self.incidence(a)
            .iter()
            .copied()
            .filter(|t| self.incidence(b).contains(t) && self.incidence(c).contains(t))
            .collect()
    }

    /// Checks the purely-topological invariants (2, 3, 6 from the data
    /// model): incidence lists agree with tet vertex membership in both
    /// directions, and no two live tets share a vertex quadruple up to
    /// rotation. Orientation (invariant 1) needs geometry and is checked at
    /// the `TetMesh` level.
    pub fn check_incidence_invariants(&self) -> Result<(), String> {
        for tid in self.iter_tets() {
            for v in self.tet_vids(tid) {
                if !self.incidence(v).contains(&tid) {
                    return Err(format!("tet {tid:?} not found in incidence of vertex {v:?}"));
                }
            }
        }
        for vid in self.iter_vertices() {
            for &tid in self.incidence(vid) {
                if !self.is_tet_live(tid) {
                    return Err(format!(
                        "vertex {vid:?} incidence references removed tet {tid:?}"
                    ));
                }
                if !self.tet_vids(tid).contains(&vid) {
                    return Err(format!(
                        "vertex {vid:?} incidence references tet {tid:?} that doesn't contain it"
                    ));
                }
            }
        }
        let mut seen: Vec<[VertexId; 4]> = Vec::new();
        for tid in self.iter_tets() {
            let mut vids = self.tet_vids(tid);
            vids.sort();
            if seen.contains(&vids) {
                return Err(format!("duplicate tet vertex set {vids:?}"));
            }
            seen.push(vids);
        }
        Ok(())
    }

    /// Drops tombstoned vertices and tets, relabeling the live ones onto a
    /// dense key range. Returns the old->new mappings so attribute tables
    /// can be compacted in lockstep.
    pub fn consolidate(&mut self) -> ConsolidateMapping {
        let mut vertex_map: SecondaryMap<VertexId, VertexId> = SecondaryMap::new();
        let mut new_vertices: SlotMap<VertexId, VertexSlot> = SlotMap::with_key();
        for (old, slot) in self.vertices.iter() {
            if !slot.removed {
                let new = new_vertices.insert(VertexSlot::default());
                vertex_map.insert(old, new);
            }
        }

        let mut tet_map: SecondaryMap<TetId, TetId> = SecondaryMap::new();
        let mut new_tets: SlotMap<TetId, TetSlot> = SlotMap::with_key();
        for (old, slot) in self.tets.iter() {
            if !slot.removed {
                let new_vids = slot.vids.map(|v| vertex_map[v]);
                let new = new_tets.insert(TetSlot {
                    vids: new_vids,
                    removed: false,
                    hash: 0,
                });
                tet_map.insert(old, new);
            }
        }

        for (old, slot) in self.vertices.iter() {
            if let Some(&new) = vertex_map.get(old) {
                new_vertices[new].incidence = slot
                    .incidence
                    .iter()
                    .filter_map(|t| tet_map.get(*t).copied())
                    .collect();
            }
        }

        self.vertices = new_vertices;
        self.tets = new_tets;

        ConsolidateMapping {
            vertices: vertex_map,
            tets: tet_map,
        }
    }
}

/// The top-level mesh: connectivity, attribute tables and the current
/// pass's split-history, bundled the way the engine this was forked from
/// bundles its own connectivity store with its channel tables.
#[derive(Debug, Clone, Default)]
pub struct TetMesh {
    pub connectivity: MeshConnectivity,
    pub channels: Channels,
    pub split_history: SplitHistory,
}

impl TetMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-loads a mesh from `num_vertices` unplaced vertices and a list of
    /// tets given as vertex-index quadruples into `0..num_vertices`, with
    /// each vertex's double position supplied in `positions`. Rejects any
    /// tet whose vertex quadruple is not positively oriented.
    pub fn init(num_vertices: usize, positions: &[DVec3], tets: &[[usize; 4]]) -> Result<Self> {
        let mut mesh = Self::new();
        let mut vids = Vec::with_capacity(num_vertices);
        for i in 0..num_vertices {
            let vid = mesh.connectivity.alloc_vertex();
            let mut attrs = VertexAttributes::default();
            if let Some(&p) = positions.get(i) {
                attrs.position = p;
            }
            mesh.channels.vertex.insert(vid, attrs);
            vids.push(vid);
        }
        for quad in tets {
            let resolved = [
                vids[quad[0]],
                vids[quad[1]],
                vids[quad[2]],
                vids[quad[3]],
            ];
            let p: Vec<DVec3> = resolved
                .iter()
                .map(|&v| mesh.channels.vertex[v].position)
                .collect();
            if orient_3d(p[0], p[1], p[2], p[3]) != Orientation::Positive {
                return Err(MeshError::OrientationViolation { vids: resolved }.into());
            }
            let tid = mesh.connectivity.alloc_tet(resolved);
            mesh.channels.tet.ensure(tid);
        }
        Ok(mesh)
    }

    /// The vertex quadruple of `tid`, guaranteed to be positively oriented
    /// under the exact predicate given the current double positions.
    pub fn oriented_tet_vids(&self, tid: TetId) -> [VertexId; 4] {
        let vids = self.connectivity.tet_vids(tid);
        let p = |v: VertexId| self.channels.vertex[v].position;
        if orient_3d(p(vids[0]), p(vids[1]), p(vids[2]), p(vids[3])) == Orientation::Positive {
            vids
        } else {
            [vids[1], vids[0], vids[2], vids[3]]
        }
    }

    pub fn for_each_tet(&self, mut f: impl FnMut(TetId)) {
        for tid in self.connectivity.iter_tets() {
            f(tid);
        }
    }

    pub fn for_each_vertex(&self, mut f: impl FnMut(VertexId)) {
        for vid in self.connectivity.iter_vertices() {
            f(vid);
        }
    }

    /// Checks every universal invariant from the data model against the
    /// live mesh: orientation of all tets plus the topological invariants
    /// checked by `MeshConnectivity::check_incidence_invariants`.
    pub fn check_invariants(&self) -> Result<()> {
        self.connectivity
            .check_incidence_invariants()
            .map_err(|description| MeshError::IncidenceCorruption { description })?;
        for tid in self.connectivity.iter_tets() {
            let vids = self.connectivity.tet_vids(tid);
            let p = |v: VertexId| self.channels.vertex[v].position;
            if orient_3d(p(vids[0]), p(vids[1]), p(vids[2]), p(vids[3])) != Orientation::Positive {
                return Err(MeshError::OrientationViolation { vids }.into());
            }
        }
        Ok(())
    }

    /// Compacts tombstoned vertices/tets out of the connectivity store and
    /// relabels attribute tables in lockstep. Clears the split-history,
    /// since the ids it refers to are invalidated by relabeling.
    pub fn consolidate_mesh(&mut self) -> Result<()> {
        let mapping = self.connectivity.consolidate();
        self.channels.consolidate(&mapping);
        self.split_history.clear();
        self.check_invariants()
    }
}
