// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Some useful re-exports
pub mod prelude;

/// The tetrahedral connectivity store and the local mesh-edit operations
/// built on top of it.
pub mod mesh;

/// Exact geometric predicates used by the point locator.
pub mod predicates;

/// Typed error taxonomy for the mesh-edit kernel.
pub mod errors;

/// Reference `HintOracle` implementation backed by an AABB tree.
pub mod hint_oracle;

/// Conditionally-Send+Sync type aliases, toggled by the `sync` feature.
pub mod sync;
