pub mod config;
pub mod model_params;
pub mod snapshot;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{EngineConfig, WorldConfig, AgentConfig, ServerConfig, ViewerConfig, SyncConfig, SceneConfig, RenderConfig};
pub use model_params::ModelParams;
pub use snapshot::{AgentId, AgentState, FoodItem, Snapshot};
pub use vecmath::{GridPos, Vec3};
