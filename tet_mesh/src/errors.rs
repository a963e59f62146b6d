// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed error taxonomy for the connectivity store and the local edit
//! operations built on top of it.
//!
//! Every fallible function in this crate returns `anyhow::Result`, matching
//! the rest of the prelude, but the underlying cause is always one of these
//! variants. Callers that want to match on the failure mode rather than
//! just propagate it can `err.downcast_ref::<MeshError>()`.

use glam::DVec3;
use thiserror::Error;

use crate::mesh::id_types::{TetId, VertexId};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    /// The point locator could not find any leaf tet containing the query
    /// point. Fatal for the insertion pass; surface reconstruction is out
    /// of scope for this core.
    #[error("point {point:?} lies outside the mesh hull")]
    OutsideHull { point: DVec3 },

    /// A replacement tet produced by an operation has non-positive
    /// orientation.
    #[error("replacement tet {vids:?} has non-positive orientation")]
    OrientationViolation { vids: [VertexId; 4] },

    /// An operation's `before` or `after` hook returned `false`.
    #[error("operation {op} rejected by its {hook} hook")]
    OperationRejected {
        op: &'static str,
        hook: &'static str,
    },

    /// A tuple was used after its snapshot hash no longer matched the tet's
    /// current hash. This is a programmer error: tuples must not be held
    /// across a mutation without re-validation.
    #[error("stale cursor: tet {tet:?} was mutated since the cursor was taken")]
    StaleCursor { tet: TetId },

    /// `consolidate_mesh` found a violated invariant while compacting
    /// indices.
    #[error("incidence corruption during consolidation: {description}")]
    IncidenceCorruption { description: String },
}
