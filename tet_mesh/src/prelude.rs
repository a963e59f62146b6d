// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub use anyhow::{anyhow, bail, Context, Result};

pub use glam::{DVec3, Mat4, Quat, UVec2, UVec3, Vec2, Vec3, Vec4};

pub use itertools::Itertools;
pub use std::collections::{HashMap, HashSet};

pub use crate::errors::MeshError;

pub use crate::mesh::channels;
pub use crate::mesh::connectivity::*;
pub use crate::mesh::id_types::*;
pub use crate::mesh::insertion::*;
pub use crate::mesh::locator::*;
pub use crate::mesh::operation::*;
pub use crate::mesh::ops::*;
pub use crate::mesh::tuple::*;

pub use crate::hint_oracle::{AabbHintOracle, HintOracle};
pub use crate::predicates::{orient_3d, points_are_colinear_3d, Orientation};

pub use mesh_commons::utils::*;
