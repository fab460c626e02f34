use crate::scene::{ObjectHandle, ObjectKind, Scene, SceneStyle};
use forage_common::{AgentId, Snapshot, Vec3};
use log::debug;
use std::collections::{HashMap, HashSet};

/// What happens to the visual of an agent missing from the latest snapshot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AgentRetention {
    /// Leave it in place at its last known position.
    Keep,
    /// Destroy it; a later sighting of the same id creates a fresh object.
    Despawn,
}

/// Mirrors snapshots into a [`Scene`].
///
/// Agent visuals are keyed by agent id and reused across snapshots. Food has no
/// identity on the wire, so every food visual is replaced on each reconcile.
/// The base marker is created once, when the synchronizer is built.
pub struct SceneSynchronizer<S: Scene> {
    scene: S,
    style: SceneStyle,
    retention: AgentRetention,
    agent_visuals: HashMap<AgentId, ObjectHandle>,
    food_visuals: Vec<ObjectHandle>,
    base_marker: ObjectHandle,
}

impl<S: Scene> SceneSynchronizer<S> {
    pub fn new(mut scene: S, style: SceneStyle, retention: AgentRetention) -> Self {
        let base_marker = scene.create(ObjectKind::Base, style.base_position);
        Self {
            scene,
            style,
            retention,
            agent_visuals: HashMap::new(),
            food_visuals: Vec::new(),
            base_marker,
        }
    }

    /// Brings the scene in line with `snapshot`.
    pub fn reconcile(&mut self, snapshot: &Snapshot) {
        let mut created = 0usize;
        for agent in &snapshot.agents {
            let position = Vec3::from_planar(agent.x, agent.y, self.style.agent_height);
            let handle = match self.agent_visuals.get(&agent.id) {
                Some(&handle) => {
                    self.scene.set_position(handle, position);
                    handle
                }
                None => {
                    let handle = self.scene.create(ObjectKind::Agent, position);
                    self.agent_visuals.insert(agent.id, handle);
                    created += 1;
                    handle
                }
            };
            self.scene.set_color(handle, self.style.agent_color(agent.carrying_food));
        }

        let mut despawned = 0usize;
        if self.retention == AgentRetention::Despawn {
            let present: HashSet<AgentId> = snapshot.agents.iter().map(|a| a.id).collect();
            let scene = &mut self.scene;
            self.agent_visuals.retain(|id, handle| {
                if present.contains(id) {
                    true
                } else {
                    scene.destroy(*handle);
                    despawned += 1;
                    false
                }
            });
        }

        for handle in self.food_visuals.drain(..) {
            self.scene.destroy(handle);
        }
        for food in &snapshot.food {
            let position = Vec3::from_planar(food.x, food.y, self.style.food_height);
            self.food_visuals.push(self.scene.create(ObjectKind::Food, position));
        }

        debug!(
            "Reconciled snapshot: {} agents ({} new, {} despawned), {} food",
            self.agent_visuals.len(),
            created,
            despawned,
            self.food_visuals.len()
        );
    }

    pub fn agent_visual(&self, id: AgentId) -> Option<ObjectHandle> {
        self.agent_visuals.get(&id).copied()
    }

    pub fn agent_count(&self) -> usize {
        self.agent_visuals.len()
    }

    pub fn food_visuals(&self) -> &[ObjectHandle] {
        &self.food_visuals
    }

    pub fn base_marker(&self) -> ObjectHandle {
        self.base_marker
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn into_scene(self) -> S {
        self.scene
    }
}
