// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use smallvec::SmallVec;

/// A small vector of up to 4 elements inline, used for per-tet and
/// per-face-local collections that almost never spill onto the heap.
pub type SVec<T> = SmallVec<[T; 4]>;
