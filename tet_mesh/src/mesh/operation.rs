// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The operation builder protocol: a capability record exposing five entry
//! points, driven by the generic `customized_operation` function. This
//! replaces the virtual-inheritance scheme of the engine this core's
//! algorithms are drawn from with a plain trait object-free generic driver.

use anyhow::Result;
use tracing::{debug_span, trace};

use crate::errors::MeshError;
use crate::predicates::{orient_3d, Orientation};

use super::connectivity::TetMesh;
use super::id_types::{TetId, VertexId};
use super::tuple::Tuple;

/// An atomic local mesh-edit operation. Implementors may cache state
/// gathered in `before`/`removed_tids` as ordinary struct fields — the
/// driver always calls the five methods in the order documented on
/// `customized_operation`, on the same value.
pub trait OperationBuilder {
    /// Name used in error messages and tracing spans.
    fn name(&self) -> &'static str;

    /// Declares which live tets this operation will destroy. Called before
    /// any mutation.
    fn removed_tids(&mut self, mesh: &TetMesh, cursor: Tuple) -> Vec<TetId>;

    /// How many new vertex indices this operation needs allocated.
    fn request_vert_slots(&self) -> usize;

    /// Given the freshly allocated vertex ids, the replacement tet vertex
    /// quadruples, in a convention defined by the operation. Takes `&mut
    /// self` so implementors can remember which slot played which role, for
    /// use later in `after`.
    fn replacing_tets(&mut self, slots: &[VertexId]) -> Vec<[VertexId; 4]>;

    /// Snapshot attributes of the soon-to-be-removed region. Returning
    /// `false` aborts the operation with no state change.
    fn before(&mut self, mesh: &TetMesh, cursor: Tuple) -> bool;

    /// Install attributes on the newly created region. A `false` return is
    /// treated as fatal (`MeshError::OperationRejected`) uniformly across
    /// every operation — see the resolved open question on this in the
    /// design notes.
    fn after(&mut self, mesh: &mut TetMesh, new_tets: &[TetId]) -> bool;
}

/// Runs one operation to completion against `cursor`, atomically:
///
/// a. Invoke `before`. If false, abort with no state change.
/// b. Call `removed_tids`, then `request_vert_slots` to allocate fresh slots.
/// c. Call `replacing_tets` to get the new quadruples.
/// d. Mark removed tets, allocate new tets, rewrite incidence, bump hashes.
/// e. Resize attribute tables for the new slots.
/// f. Materialize cursors for the new tets and pass them to `after`.
///
/// Returns `(false, [])` if `before` rejected the operation, or
/// `(true, new_cursors)` on success. Fails with `OrientationViolation` if
/// any replacement tet ends up non-positively oriented, or with
/// `OperationRejected` if `after` returns false.
pub fn customized_operation<Op: OperationBuilder>(
    mesh: &mut TetMesh,
    op: &mut Op,
    cursor: Tuple,
) -> Result<(bool, Vec<Tuple>)> {
    cursor.revalidate(mesh)?;
    let _span = debug_span!("customized_operation", op = op.name()).entered();

    if !op.before(mesh, cursor) {
        trace!(op = op.name(), "before hook rejected operation");
        return Ok((false, Vec::new()));
    }

    let removed = op.removed_tids(mesh, cursor);
    let n_slots = op.request_vert_slots();
    let slots: Vec<VertexId> = (0..n_slots).map(|_| mesh.connectivity.alloc_vertex()).collect();
    for &vid in &slots {
        mesh.channels.vertex.ensure(vid);
    }

    let new_quads = op.replacing_tets(&slots);

    for &tid in &removed {
        trace!(op = op.name(), tet = ?tid, "removing tet");
        mesh.connectivity.remove_tet(tid);
    }

    let mut new_tets = Vec::with_capacity(new_quads.len());
    for quad in &new_quads {
        let tid = mesh.connectivity.alloc_tet(*quad);
        mesh.channels.tet.ensure(tid);
        new_tets.push(tid);
    }

    for &tid in removed.iter().chain(new_tets.iter()) {
        mesh.connectivity.bump_hash(tid);
    }

    if !op.after(mesh, &new_tets) {
        return Err(MeshError::OperationRejected {
            op: op.name(),
            hook: "after",
        }
        .into());
    }

    for &tid in &new_tets {
        let vids = mesh.connectivity.tet_vids(tid);
        let pos = |v: VertexId| mesh.channels.vertex[v].position;
        if orient_3d(pos(vids[0]), pos(vids[1]), pos(vids[2]), pos(vids[3])) != Orientation::Positive
        {
            return Err(MeshError::OrientationViolation { vids }.into());
        }
    }

    let new_cursors = new_tets
        .iter()
        .map(|&t| Tuple::from_tet(mesh, t))
        .collect();
    Ok((true, new_cursors))
}
