use crate::math::Vec3;
use crate::types::{AmbientProbe, Cubemap, LightSlot, MAX_TOTAL_LIGHTS};
use bit_vec::BitVec;
use derive_more::Deref;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::{Arc, Weak};

/// Fixed-capacity list of packed lights: active slots first, fading slots after.
#[derive(Debug, Clone, PartialEq, Deref, Serialize)]
pub struct SlotBuffer {
    #[deref]
    slots: Vec<LightSlot>,
}

impl Default for SlotBuffer {
    fn default() -> Self {
        Self {
            slots: Vec::with_capacity(MAX_TOTAL_LIGHTS),
        }
    }
}

impl SlotBuffer {
    pub fn is_full(&self) -> bool {
        self.slots.len() >= MAX_TOTAL_LIGHTS
    }

    /// Appends a slot; returns false and drops it when the buffer is full.
    pub fn push(&mut self, slot: LightSlot) -> bool {
        if self.is_full() {
            return false;
        }
        self.slots.push(slot);
        true
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// What the renderer reads for one object. Refreshed in place by every update.
#[derive(Debug, Default, Serialize)]
pub struct NodeLightingState {
    /// Creation order of the tracked object
    pub sequence: u64,
    pub ambient_cube: [Vec3; 6],
    pub active_lights: usize,
    pub slots: SlotBuffer,
    #[serde(skip)]
    pub cubemap: Weak<Cubemap>,
    /// Set on the update that switched to a new cubemap
    pub cubemap_changed: bool,
}

impl NodeLightingState {
    /// Active plus fading slots
    pub fn light_count(&self) -> usize {
        self.slots.len()
    }
}

/// Shared, stable handle to an object's lighting state.
/// The same allocation is returned for the whole life of the tracked object.
#[derive(Debug, Clone, Deref)]
pub struct LightingHandle(Arc<RwLock<NodeLightingState>>);

impl LightingHandle {
    pub(crate) fn new(sequence: u64) -> Self {
        Self(Arc::new(RwLock::new(NodeLightingState {
            sequence,
            ..Default::default()
        })))
    }

    pub fn ptr_eq(a: &LightingHandle, b: &LightingHandle) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

/// Cache entry for one tracked object.
#[derive(Debug)]
pub(crate) struct TrackedObject {
    pub pos: Vec3,
    pub probe: Weak<AmbientProbe>,
    /// Indices into the light catalog, nearest first (sun first when visible)
    pub candidates: Vec<usize>,
    pub sky_idx: Option<usize>,
    /// Indexed by position in `candidates`
    pub occluded: BitVec,
    pub lighting_time: f64,
    pub handle: LightingHandle,
}

impl TrackedObject {
    pub fn new(sequence: u64, pos: Vec3) -> Self {
        Self {
            pos,
            probe: Weak::new(),
            candidates: Vec::new(),
            sky_idx: None,
            occluded: BitVec::new(),
            lighting_time: 0.0,
            handle: LightingHandle::new(sequence),
        }
    }
}
