// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The three concrete local mesh-edit operations: `SplitEdge`, `SplitFace`
//! and `DivideTet`, each an `OperationBuilder` with its own
//! attribute-transfer rules.

mod divide_tet;
mod split_edge;
mod split_face;

pub use divide_tet::DivideTet;
pub use split_edge::SplitEdge;
pub use split_face::SplitFace;

use super::connectivity::TetMesh;
use super::id_types::{TetId, VertexId};
use super::tuple::LOCAL_FACES;

/// The four face vertex triples of a tet, by its vertex quadruple (not its
/// tet id) — usable on quadruples cached before a tet was removed.
pub fn local_faces_of(quad: [VertexId; 4]) -> [[VertexId; 3]; 4] {
    LOCAL_FACES.map(|idx| [quad[idx[0] as usize], quad[idx[1] as usize], quad[idx[2] as usize]])
}

/// A simple radius-ratio-style quality measure: normalized volume over the
/// cube of the RMS edge length. Not specified exactly by the operations
/// above, which only require *some* quality value to be recomputed after
/// every split; this is a reasonable stand-in that vanishes continuously as
/// a tet degenerates.
pub fn tet_quality(mesh: &TetMesh, tid: TetId) -> f64 {
    let vids = mesh.connectivity.tet_vids(tid);
    let p: Vec<_> = vids.iter().map(|&v| mesh.channels.vertex[v].position).collect();
    let volume = (p[1] - p[0]).dot((p[2] - p[0]).cross(p[3] - p[0])) / 6.0;
    const EDGES: [(usize, usize); 6] = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];
    let sum_sq: f64 = EDGES.iter().map(|&(i, j)| (p[i] - p[j]).length_squared()).sum();
    let rms_edge = (sum_sq / 6.0).sqrt();
    if rms_edge <= 0.0 {
        0.0
    } else {
        volume.abs() / rms_edge.powi(3)
    }
}
