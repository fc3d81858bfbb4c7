//! Scene Cache - Path → scene map with creation-on-miss.
//!
//! Construction is idempotent per path: two lookups without an intervening
//! eviction return the identical scene instance. Eviction happens only in
//! [`SceneCache::clean`], driven by the controller after a committed
//! transition, never mid-transition.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::scene::Scene;

pub(crate) struct SceneCache {
    scenes: RefCell<HashMap<String, Scene>>,
}

impl SceneCache {
    pub fn new() -> Self {
        Self {
            scenes: RefCell::new(HashMap::new()),
        }
    }

    pub fn insert(&self, scene: Scene) {
        self.scenes
            .borrow_mut()
            .insert(scene.path().to_string(), scene);
    }

    /// Return the scene for `path`, constructing it with `make` on a miss.
    pub fn get_or_insert_with(&self, path: &str, make: impl FnOnce() -> Scene) -> Scene {
        if let Some(scene) = self.scenes.borrow().get(path) {
            return scene.clone();
        }
        let scene = make();
        self.insert(scene.clone());
        scene
    }

    /// Evict every entry for which `protect` returns false.
    ///
    /// Returns the evicted paths for diagnostic logging.
    pub fn clean(&self, protect: impl Fn(&Scene) -> bool) -> Vec<String> {
        let mut scenes = self.scenes.borrow_mut();
        let mut evicted = Vec::new();
        scenes.retain(|path, scene| {
            if protect(scene) {
                true
            } else {
                evicted.push(path.clone());
                false
            }
        });
        evicted
    }

    pub fn len(&self) -> usize {
        self.scenes.borrow().len()
    }

    #[cfg(test)]
    pub fn contains(&self, path: &str) -> bool {
        self.scenes.borrow().contains_key(path)
    }
}
