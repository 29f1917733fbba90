use crate::catalog::LevelCatalog;
use crate::collision::{CollisionWorld, TraceOutcome, CONTENTS_SKY, CONTENTS_SOLID};
use crate::config::LightingConfig;
use crate::error::LevelError;
use crate::level::LevelData;
use crate::math::{add, dist_sq, is_finite, length_sq, mat_translation, mul, sub, xform_vec4, Mat4, Vec3};
use crate::types::{Light, LightType, ObjectId, Transform, MAX_ACTIVE_LIGHTS, MAX_TOTAL_LIGHTS};
use bit_vec::BitVec;
use log::{debug, info};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

pub mod state;

pub use state::{LightingHandle, NodeLightingState, SlotBuffer};
use state::TrackedObject;

/// Squared displacement below which an object counts as stationary.
const POS_EPSILON: f32 = 0.001;
/// Fading slots dimmer than this (squared magnitude) are dropped.
const FADE_CUTOFF: f32 = 1.0;
/// Length of the sun visibility ray, in level units.
const SKY_TRACE_LENGTH: f32 = 10000.0;
/// Traces start slightly above the object's origin.
const TRACE_EYE_OFFSET: Vec3 = [0.0, 0.0, 0.05];

#[derive(Debug, Default)]
struct ObjectCache {
    objects: HashMap<ObjectId, TrackedObject>,
    next_sequence: u64,
}

/// Resolves, caches and blends the lighting of every dynamic object in the loaded level.
///
/// All cache mutation happens under a single lock, so `update` and
/// `on_object_destroyed` may be called from any thread.
#[derive(Default)]
pub struct AmbientLightingManager {
    config: RwLock<LightingConfig>,
    catalog: RwLock<Option<Arc<LevelCatalog>>>,
    cache: Mutex<ObjectCache>,
    worklist: Mutex<Vec<(ObjectId, Transform)>>,
}

impl AmbientLightingManager {
    pub fn new(config: LightingConfig) -> Self {
        Self {
            config: RwLock::new(config),
            ..Default::default()
        }
    }

    pub fn config(&self) -> LightingConfig {
        *self.config.read()
    }

    pub fn set_config(&self, config: LightingConfig) {
        *self.config.write() = config;
    }

    pub fn is_loaded(&self) -> bool {
        self.catalog.read().is_some()
    }

    pub fn catalog(&self) -> Option<Arc<LevelCatalog>> {
        self.catalog.read().clone()
    }

    pub fn tracked_objects(&self) -> usize {
        self.cache.lock().objects.len()
    }

    /// Builds every catalog for `level` and makes it current.
    /// Cached objects refer to catalog indices, so the cache is purged.
    pub fn load_level(&self, level: &dyn LevelData, collision: Arc<dyn CollisionWorld>) -> Result<(), LevelError> {
        let catalog = LevelCatalog::build(level, collision)?;

        let mut cache = self.cache.lock();
        let dropped = cache.objects.len();
        cache.objects.clear();
        *self.catalog.write() = Some(Arc::new(catalog));
        self.worklist.lock().clear();

        if dropped > 0 {
            info!("Level reloaded, dropped {} cached objects", dropped);
        }
        Ok(())
    }

    /// Releases the catalogs, the cache and the worklist. Safe to call at any time.
    pub fn reset(&self) {
        let mut cache = self.cache.lock();
        cache.objects.clear();
        *self.catalog.write() = None;
        self.worklist.lock().clear();
        debug!("Lighting manager reset");
    }

    /// Forgets a destroyed object. Unknown ids are ignored.
    pub fn on_object_destroyed(&self, id: ObjectId) {
        let mut cache = self.cache.lock();
        if cache.objects.remove(&id).is_some() {
            debug!("Object {:?} destroyed, lighting entry removed", id);
        }
    }

    /// Schedules `id` for the next `process_frame`. A later request for the same object
    /// replaces the earlier one.
    pub fn queue_update(&self, id: ObjectId, transform: Transform) {
        let mut worklist = self.worklist.lock();
        match worklist.iter_mut().find(|(queued, _)| *queued == id) {
            Some(entry) => entry.1 = transform,
            None => worklist.push((id, transform)),
        }
    }

    /// Drains the worklist, updating every queued object at time `now`.
    pub fn process_frame(&self, now: f64) -> Vec<(ObjectId, LightingHandle)> {
        let queued = std::mem::take(&mut *self.worklist.lock());
        queued
            .into_iter()
            .filter_map(|(id, transform)| self.update(id, &transform, now).map(|h| (id, h)))
            .collect()
    }

    /// Moves every light visible from the camera's leaf, plus the sun, into eye space.
    pub fn transform_lights_to_eye_space(&self, camera: &Mat4) {
        let Some(catalog) = self.catalog() else {
            return;
        };
        let lights = &catalog.lights;
        let cam_leaf = catalog.collision.find_leaf(mat_translation(camera));

        for &idx in lights.pvs(cam_leaf) {
            xform_light(&lights.all[idx], camera);
        }
        if let Some(sun) = lights.sun() {
            xform_light(sun, camera);
        }
    }

    /// Refreshes the lighting of one object at time `now` (seconds) and returns its handle.
    ///
    /// Returns `None`, touching nothing, for a non-finite position or when no level is loaded.
    pub fn update(&self, id: ObjectId, transform: &Transform, now: f64) -> Option<LightingHandle> {
        let pos = transform.pos;
        if !is_finite(pos) {
            debug!("Object {:?}: non-finite position {:?}, skipped", id, pos);
            return None;
        }

        let mut cache = self.cache.lock();
        let catalog = self.catalog()?;
        let config = self.config();

        let ObjectCache { objects, next_sequence } = &mut *cache;
        let mut new_instance = false;
        let entry = objects.entry(id).or_insert_with(|| {
            new_instance = true;
            *next_sequence += 1;
            TrackedObject::new(*next_sequence - 1, pos)
        });

        let handle = entry.handle.clone();
        let mut state = handle.write();
        state.cubemap_changed = false;

        let pos_changed = new_instance || dist_sq(pos, entry.pos) > POS_EPSILON;

        let mut dt = now - entry.lighting_time;
        if dt <= 0.0 {
            dt = 0.0;
        } else {
            entry.lighting_time = now;
        }
        // Nothing to blend from on the first update
        let atten = if new_instance { 0.0 } else { config.decay_factor(dt) };

        let collision = catalog.collision.as_ref();
        let leaf = collision.find_leaf(pos);

        if pos_changed {
            if let Some(probe) = catalog.probes.nearest(pos) {
                entry.probe = Arc::downgrade(probe);
            }

            if let Some(cubemap) = catalog.cubemaps.nearest(pos) {
                let is_current = state
                    .cubemap
                    .upgrade()
                    .is_some_and(|current| Arc::ptr_eq(&current, cubemap));
                if cubemap.has_full_cubemap && !is_current {
                    state.cubemap = Arc::downgrade(cubemap);
                    state.cubemap_changed = true;
                    debug!("Object {:?}: switched to cubemap at {:?}", id, cubemap.pos);
                }
            }

            entry.pos = pos;
        }

        if let Some(probe) = entry.probe.upgrade() {
            for (face, color) in state.ambient_cube.iter_mut().enumerate() {
                *color = if config.light_average {
                    blend_toward(probe.cube[face], *color, atten)
                } else {
                    probe.cube[face]
                };
            }
        }

        let lights = &catalog.lights;
        if pos_changed {
            let mut candidates = lights.pvs(leaf).to_vec();
            candidates.sort_by(|&a, &b| {
                dist_sq(lights.all[a].pos, pos).total_cmp(&dist_sq(lights.all[b].pos, pos))
            });

            entry.sky_idx = None;
            if let Some(sun) = lights.sun {
                if is_sky_visible(collision, pos, &lights.all[sun], catalog.unit_scale) {
                    candidates.insert(0, sun);
                    entry.sky_idx = Some(0);
                }
            }

            entry.occluded = BitVec::from_elem(candidates.len(), false);
            entry.candidates = candidates;
        }

        let previous = if config.light_average {
            std::mem::take(&mut state.slots)
        } else {
            state.slots.clear();
            SlotBuffer::default()
        };
        let mut matched = [false; MAX_TOTAL_LIGHTS];
        let mut active = 0;

        for (i, &light_idx) in entry.candidates.iter().enumerate() {
            if active >= MAX_ACTIVE_LIGHTS {
                break;
            }
            let light = &lights.all[light_idx];

            if pos_changed && entry.sky_idx != Some(i) && !is_light_visible(collision, pos, light) {
                entry.occluded.set(i, true);
            }
            if entry.occluded.get(i).unwrap_or(false) {
                continue;
            }

            let mut slot = light.pack();
            if config.light_average {
                let mut old_color = [0.0; 3];
                if let Some(j) = previous.iter().position(|s| s.id == light.id) {
                    matched[j] = true;
                    old_color = previous[j].color();
                }
                slot.set_color(blend_toward(light.color, old_color, atten));
            }
            state.slots.push(slot);
            active += 1;
        }

        if config.light_average {
            // Lights that left the set fade out instead of popping
            for (j, old) in previous.iter().enumerate() {
                if matched[j] {
                    continue;
                }
                let faded = mul(old.color(), atten);
                if length_sq(faded) < FADE_CUTOFF {
                    continue;
                }
                let mut slot = old.clone();
                slot.set_color(faded);
                if !state.slots.push(slot) {
                    break;
                }
            }
        }

        state.active_lights = active;
        debug!(
            "Object {:?}: leaf {}, {} active / {} total lights",
            id,
            leaf,
            active,
            state.light_count()
        );

        drop(state);
        Some(handle)
    }
}

/// `target - (target - old) * atten`, exact at both ends of the range.
fn blend_toward(target: Vec3, old: Vec3, atten: f32) -> Vec3 {
    if atten <= 0.0 {
        return target;
    }
    if atten >= 1.0 {
        return old;
    }
    sub(target, mul(sub(target, old), atten))
}

fn is_sky_visible(collision: &dyn CollisionWorld, pos: Vec3, sun: &Light, unit_scale: f32) -> bool {
    let start = add(pos, TRACE_EYE_OFFSET);
    let end = add(start, mul(sun.direction, SKY_TRACE_LENGTH * unit_scale));
    collision.trace_line(start, end, CONTENTS_SOLID | CONTENTS_SKY) == TraceOutcome::Sky
}

fn is_light_visible(collision: &dyn CollisionWorld, pos: Vec3, light: &Light) -> bool {
    let start = add(pos, TRACE_EYE_OFFSET);
    collision.trace_line(start, light.pos, CONTENTS_SOLID) == TraceOutcome::Clear
}

fn xform_light(light: &Light, camera: &Mat4) {
    let mut eye = light.eye.write();
    // The sun has no position, point lights have no direction
    if light.light_type != LightType::Directional {
        let p = light.pos;
        eye.pos = xform_vec4(camera, [p[0], p[1], p[2], 1.0]);
    }
    if light.light_type != LightType::Point {
        let d = light.direction;
        eye.direction = xform_vec4(camera, [d[0], d[1], d[2], 0.0]);
    }
}
