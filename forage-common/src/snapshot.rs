use serde::{Deserialize, Serialize};

/// Stable identity of an agent across snapshots.
pub type AgentId = u32;

/// The state of the simulated world returned by one `/step` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// True once no food is left on the grid; no further steps will change the world.
    #[serde(rename = "is_finished")]
    pub finished: bool,
    /// All agents, in the order the server reports them.
    pub agents: Vec<AgentState>,
    /// Food still lying on the grid. Food has no identity between snapshots.
    pub food: Vec<FoodItem>,
}

/// One agent as seen in a snapshot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    pub id: AgentId,
    pub x: i32,
    pub y: i32,
    #[serde(rename = "has_food")]
    pub carrying_food: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItem {
    pub x: i32,
    pub y: i32,
}

impl Snapshot {
    /// Decodes a snapshot from the server's JSON body. Every field is required.
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Number of agents currently carrying food back to the base.
    pub fn carrying_count(&self) -> usize {
        self.agents.iter().filter(|a| a.carrying_food).count()
    }
}
