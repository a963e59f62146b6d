// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Exact geometric predicates. These are the only floating-point-robustness
//! guarantee this crate makes: every classification decision in the point
//! locator routes through `orient_3d` or `points_are_colinear_3d`, both
//! backed by Shewchuk's adaptive-precision arithmetic via the `robust`
//! crate. Nothing here is reimplemented from scratch.

use glam::DVec3;
use robust::{orient2d, orient3d, Coord, Coord3D};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Negative,
    Zero,
    Positive,
}

impl Orientation {
    pub fn is_non_negative(self) -> bool {
        !matches!(self, Orientation::Negative)
    }
}

fn to_coord3d(v: DVec3) -> Coord3D<f64> {
    Coord3D {
        x: v.x,
        y: v.y,
        z: v.z,
    }
}

/// Sign of the signed volume of the tetrahedron (a, b, c, d). Positive when
/// d lies above the plane through a, b, c as seen with a standard
/// right-handed orientation of that plane.
pub fn orient_3d(a: DVec3, b: DVec3, c: DVec3, d: DVec3) -> Orientation {
    // `robust::orient3d` is a faithful port of Shewchuk's predicate, whose
    // value is the determinant det[a-d, b-d, c-d] = -det[b-a, c-a, d-a] — the
    // negative of the signed volume convention used throughout this crate.
    // Negate before classifying.
    let det = -orient3d(to_coord3d(a), to_coord3d(b), to_coord3d(c), to_coord3d(d));
    if det > 0.0 {
        Orientation::Positive
    } else if det < 0.0 {
        Orientation::Negative
    } else {
        Orientation::Zero
    }
}

fn orient2d_on(axis_a: usize, axis_b: usize, a: DVec3, b: DVec3, c: DVec3) -> f64 {
    let pick = |v: DVec3| -> Coord<f64> {
        let comp = [v.x, v.y, v.z];
        Coord {
            x: comp[axis_a],
            y: comp[axis_b],
        }
    };
    orient2d(pick(a), pick(b), pick(c))
}

/// True iff a, b, c are collinear in 3D. Implemented by projecting onto two
/// independent coordinate planes and requiring both 2D orientations to
/// vanish; if the first pair of planes happens to be degenerate for this
/// triple (all three projected points coincide, e.g. the segment is
/// parallel to both axes used) a third plane is tried before concluding.
pub fn points_are_colinear_3d(a: DVec3, b: DVec3, c: DVec3) -> bool {
    const PLANES: [(usize, usize); 3] = [(0, 1), (1, 2), (0, 2)];
    let mut votes = 0;
    let mut checked = 0;
    for (axis_a, axis_b) in PLANES {
        let pa = [a.x, a.y, a.z][axis_a] - [b.x, b.y, b.z][axis_a];
        let pb = [a.x, a.y, a.z][axis_b] - [b.x, b.y, b.z][axis_b];
        let qa = [a.x, a.y, a.z][axis_a] - [c.x, c.y, c.z][axis_a];
        let qb = [a.x, a.y, a.z][axis_b] - [c.x, c.y, c.z][axis_b];
        if pa == 0.0 && pb == 0.0 && qa == 0.0 && qb == 0.0 {
            // a, b, c project onto a single point on this plane; this plane
            // can't distinguish collinear from non-collinear, skip it.
            continue;
        }
        checked += 1;
        if orient2d_on(axis_a, axis_b, a, b, c) == 0.0 {
            votes += 1;
        }
    }
    checked > 0 && votes == checked
}
