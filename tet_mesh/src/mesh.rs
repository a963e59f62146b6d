// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Stable vertex/tet identities.
pub mod id_types;

/// The connectivity store: vertex/tet incidence, removal flags, per-tet hashes.
pub mod connectivity;

/// The tuple cursor and its four switch operations.
pub mod tuple;

/// Vertex, tet and face attribute tables.
pub mod channels;

/// The operation builder protocol and its driver, `customized_operation`.
pub mod operation;

/// Concrete local mesh-edit operations: SplitEdge, SplitFace, DivideTet.
pub mod ops;

/// The point locator: containment test, configuration classifier, split-history descent.
pub mod locator;

/// The point-insertion driver.
pub mod insertion;
