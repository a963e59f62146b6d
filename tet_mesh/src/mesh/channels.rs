// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Attribute tables. Modeled as two independent index-keyed tables (vertex,
//! tet) plus one content-keyed table (face, by sorted vertex triple), per
//! the design notes. Growth is append-only during a pass; `Channels::
//! consolidate` compacts all three in lockstep with a `MeshConnectivity::
//! consolidate` pass.

use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use glam::DVec3;
use mesh_commons::utils::SVec;
use serde::{Deserialize, Serialize};
use slotmap::{Key, SecondaryMap};

use super::connectivity::ConsolidateMapping;
use super::id_types::{TetId, VertexId};

/// A minimal rational number, used only to store an exact position when a
/// caller needs one. No arithmetic is implemented on it here: computing
/// with exact coordinates is outside this core's scope (see `orient_3d`,
/// which always operates on the rounded double position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rational {
    pub num: i128,
    pub den: i128,
}

pub type ExactPosition = [Rational; 3];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexAttributes {
    pub exact_position: Option<ExactPosition>,
    pub position: DVec3,
    pub is_rounded: bool,
    pub is_on_surface: bool,
    pub is_on_boundary: bool,
    pub on_bbox_faces: SVec<i32>,
    pub sizing_scalar: f64,
    pub is_freezed: bool,
    pub partition_id: usize,
}

impl Default for VertexAttributes {
    fn default() -> Self {
        Self {
            exact_position: None,
            position: DVec3::ZERO,
            is_rounded: true,
            is_on_surface: false,
            is_on_boundary: false,
            on_bbox_faces: SVec::new(),
            sizing_scalar: 1.0,
            is_freezed: false,
            partition_id: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TetAttributes {
    pub quality: f64,
    pub is_outside: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceAttributes {
    pub is_surface: bool,
    /// Index of the bounding-box face this lies on, or -1 when internal.
    pub bbox_face: i32,
}

impl Default for FaceAttributes {
    fn default() -> Self {
        Self {
            is_surface: false,
            bbox_face: -1,
        }
    }
}

impl FaceAttributes {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Unions two attribute records for faces that collapse onto the same
    /// key: surface tag is OR'd, bbox-face index is taken from `other` when
    /// it carries one.
    pub fn merge(&mut self, other: &FaceAttributes) {
        self.is_surface |= other.is_surface;
        if other.bbox_face >= 0 {
            self.bbox_face = other.bbox_face;
        }
    }
}

/// Index-keyed attribute table with default-value semantics: reading an
/// unset key yields `V::default()` via `Index`/`IndexMut`, matching the
/// behavior callers expect from a dense parallel array without requiring
/// one to actually be allocated for every slot up front.
#[derive(Debug, Clone)]
pub struct Channel<K: Key, V: Default + Clone> {
    values: SecondaryMap<K, V>,
}

impl<K: Key, V: Default + Clone> Default for Channel<K, V> {
    fn default() -> Self {
        Self {
            values: SecondaryMap::new(),
        }
    }
}

impl<K: Key, V: Default + Clone> Channel<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure(&mut self, k: K) {
        if !self.values.contains_key(k) {
            self.values.insert(k, V::default());
        }
    }

    pub fn insert(&mut self, k: K, v: V) {
        self.values.insert(k, v);
    }

    pub fn remove(&mut self, k: K) {
        self.values.remove(k);
    }

    pub fn get(&self, k: K) -> Option<&V> {
        self.values.get(k)
    }

    pub fn get_mut(&mut self, k: K) -> Option<&mut V> {
        self.values.get_mut(k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.values.iter()
    }
}

impl<K: Key, V: Default + Clone> Index<K> for Channel<K, V> {
    type Output = V;

    fn index(&self, k: K) -> &V {
        self.values.get(k).expect("channel: no entry for key")
    }
}

impl<K: Key, V: Default + Clone> IndexMut<K> for Channel<K, V> {
    fn index_mut(&mut self, k: K) -> &mut V {
        self.ensure(k);
        self.values.get_mut(k).unwrap()
    }
}

/// Canonical content-address for a face: its three vertex ids, sorted.
pub fn face_key(a: VertexId, b: VertexId, c: VertexId) -> [VertexId; 3] {
    let mut key = [a, b, c];
    key.sort();
    key
}

#[derive(Debug, Clone, Default)]
pub struct FaceTable {
    values: HashMap<[VertexId; 3], FaceAttributes>,
}

impl FaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: [VertexId; 3]) -> Option<&FaceAttributes> {
        self.values.get(&key)
    }

    pub fn get_mut(&mut self, key: [VertexId; 3]) -> &mut FaceAttributes {
        self.values.entry(key).or_default()
    }

    pub fn set(&mut self, key: [VertexId; 3], attrs: FaceAttributes) {
        self.values.insert(key, attrs);
    }

    pub fn reset(&mut self, key: [VertexId; 3]) {
        self.values.entry(key).or_default().reset();
    }

    pub fn remove(&mut self, key: [VertexId; 3]) -> Option<FaceAttributes> {
        self.values.remove(&key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Channels {
    pub vertex: Channel<VertexId, VertexAttributes>,
    pub tet: Channel<TetId, TetAttributes>,
    pub face: FaceTable,
}

impl Channels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relabels vertex/tet attributes onto the ids produced by a
    /// `MeshConnectivity::consolidate` pass. Face attributes are keyed by
    /// content (vertex ids), so they're rewritten in place through the same
    /// vertex mapping rather than moved wholesale.
    pub fn consolidate(&mut self, mapping: &ConsolidateMapping) {
        let mut new_vertex = Channel::new();
        for (old, new) in mapping.vertices.iter() {
            if let Some(attrs) = self.vertex.get(old) {
                new_vertex.insert(*new, attrs.clone());
            }
        }
        self.vertex = new_vertex;

        let mut new_tet = Channel::new();
        for (old, new) in mapping.tets.iter() {
            if let Some(attrs) = self.tet.get(old) {
                new_tet.insert(*new, *attrs);
            }
        }
        self.tet = new_tet;

        let mut new_face = FaceTable::new();
        for (key, attrs) in self.face.values.iter() {
            let remapped = key.map(|v| mapping.vertices.get(v).copied().unwrap_or(v));
            new_face.set(face_key(remapped[0], remapped[1], remapped[2]), *attrs);
        }
        self.face = new_face;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    slotmap::new_key_type! { struct TestKey; }

    #[test]
    fn channel_default_on_unset_key() {
        let mut sm: SlotMap<TestKey, ()> = SlotMap::with_key();
        let k = sm.insert(());
        let ch: Channel<TestKey, TetAttributes> = Channel::new();
        assert!(ch.get(k).is_none());
    }

    #[test]
    fn channel_index_mut_ensures_default() {
        let mut sm: SlotMap<TestKey, ()> = SlotMap::with_key();
        let k = sm.insert(());
        let mut ch: Channel<TestKey, TetAttributes> = Channel::new();
        ch[k].quality = 0.5;
        assert_eq!(ch[k].quality, 0.5);
        assert!(!ch[k].is_outside);
    }

    #[test]
    fn face_key_is_order_independent() {
        let mut sm: SlotMap<VertexId, ()> = SlotMap::with_key();
        let a = sm.insert(());
        let b = sm.insert(());
        let c = sm.insert(());
        assert_eq!(face_key(a, b, c), face_key(c, a, b));
        assert_eq!(face_key(a, b, c), face_key(b, c, a));
    }

    #[test]
    fn face_attributes_reset_and_merge() {
        let mut a = FaceAttributes {
            is_surface: true,
            bbox_face: 2,
        };
        let b = FaceAttributes {
            is_surface: false,
            bbox_face: -1,
        };
        let mut merged = a;
        merged.merge(&b);
        assert!(merged.is_surface);
        assert_eq!(merged.bbox_face, 2);

        a.reset();
        assert!(!a.is_surface);
        assert_eq!(a.bbox_face, -1);
    }
}
