use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::model_params::ModelParams;
use crate::vecmath::GridPos;
use std::path::{Path, PathBuf};

// Grid and placement settings for the simulated world
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct WorldConfig {
    pub width: u32,
    pub height: u32,
    pub torus: bool,
    pub base_x: i32,
    pub base_y: i32,
    pub food_count: u32,
    pub placement_seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            width: 11,
            height: 11,
            torus: true,
            base_x: 5,
            base_y: 5,
            food_count: 20,
            placement_seed: 42,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct AgentConfig {
    pub count: u32,
    pub initial_energy: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig { count: 5, initial_energy: 100 }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig { bind: "0.0.0.0:5000".to_string() }
    }
}

/// Simulation server configuration, loaded from engine.toml.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub agents: AgentConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl EngineConfig {
    /// Loads the engine configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config in '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates an engine configuration.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let world = &self.world;
        if world.width == 0 || world.height == 0 {
            anyhow::bail!("world width and height must be greater than 0.");
        }
        if !self.base().in_bounds(world.width, world.height) {
            anyhow::bail!(
                "base ({}, {}) lies outside the {}x{} grid.",
                world.base_x, world.base_y, world.width, world.height
            );
        }
        // The base cell never holds food or a starting agent
        let free_cells = (world.width as u64 * world.height as u64).saturating_sub(1);
        let wanted = world.food_count as u64 + self.agents.count as u64;
        if wanted > free_cells {
            anyhow::bail!(
                "{} food items and {} agents do not fit in {} free cells.",
                world.food_count, self.agents.count, free_cells
            );
        }
        Ok(())
    }

    pub fn base(&self) -> GridPos {
        GridPos::new(self.world.base_x, self.world.base_y)
    }

    /// Converts the configuration into the parameters the model runs with.
    pub fn model_params(&self) -> ModelParams {
        ModelParams {
            width: self.world.width,
            height: self.world.height,
            torus: self.world.torus,
            base: self.base(),
            num_food: self.world.food_count,
            num_agents: self.agents.count,
            initial_energy: self.agents.initial_energy,
            seed: self.world.placement_seed,
        }
    }
}

// Polling behaviour of the visualizer
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct SyncConfig {
    pub endpoint: String,
    pub interval_secs: f32,
    pub request_timeout_secs: f32,
    /// Destroy the visual of an agent that no longer appears in a snapshot.
    pub despawn_missing_agents: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            endpoint: "http://localhost:5000".to_string(),
            interval_secs: 0.2,
            request_timeout_secs: 5.0,
            despawn_missing_agents: true,
        }
    }
}

// Placement heights and colors of the visual objects
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct SceneConfig {
    pub agent_height: f32,
    pub food_height: f32,
    pub base_position: [f32; 3],
    pub normal_color: String,
    pub carrying_color: String,
    pub food_color: String,
    pub base_color: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            agent_height: 0.5,
            food_height: 0.25,
            base_position: [5.0, 0.3, 5.0],
            normal_color: "green".to_string(),
            carrying_color: "yellow".to_string(),
            food_color: "red".to_string(),
            base_color: "blue".to_string(),
        }
    }
}

// Output settings for the headless frame renderer
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct RenderConfig {
    pub frames_dir: Option<PathBuf>,
    pub pixels_per_unit: u32,
    pub world_width: u32,
    pub world_height: u32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            frames_dir: None,
            pixels_per_unit: 48,
            world_width: 11,
            world_height: 11,
            background: "white".to_string(),
        }
    }
}

/// Upper bound for the poll interval and the request timeout, in seconds.
pub const MAX_WAIT_SECS: f32 = 3600.0;

/// Visualizer configuration, loaded from visualizer.toml.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ViewerConfig {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

impl ViewerConfig {
    /// Loads the visualizer configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config in '{}': {}", path_ref.display(), e))
    }

    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: ViewerConfig = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sync.endpoint.trim().is_empty() {
            anyhow::bail!("sync.endpoint must not be empty.");
        }
        if !(self.sync.interval_secs > 0.0 && self.sync.interval_secs <= MAX_WAIT_SECS) {
            anyhow::bail!("sync.interval_secs must be in (0, {}].", MAX_WAIT_SECS);
        }
        if !(self.sync.request_timeout_secs > 0.0 && self.sync.request_timeout_secs <= MAX_WAIT_SECS) {
            anyhow::bail!("sync.request_timeout_secs must be in (0, {}].", MAX_WAIT_SECS);
        }
        if self.render.pixels_per_unit == 0 {
            anyhow::bail!("render.pixels_per_unit must be greater than 0.");
        }
        if self.render.world_width == 0 || self.render.world_height == 0 {
            anyhow::bail!("render.world_width and render.world_height must be greater than 0.");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let engine = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(engine.world.width, 11);
        assert_eq!(engine.agents.count, 5);
        assert_eq!(engine.world.food_count, 20);
        assert_eq!(engine.server.bind, "0.0.0.0:5000");

        let viewer = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(viewer.sync.endpoint, "http://localhost:5000");
        assert!((viewer.sync.interval_secs - 0.2).abs() < 1e-6);
        assert_eq!(viewer.scene.base_position, [5.0, 0.3, 5.0]);
        assert!(viewer.render.frames_dir.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let viewer = ViewerConfig::from_toml_str("[sync]\ninterval_secs = 1.5\n").unwrap();
        assert!((viewer.sync.interval_secs - 1.5).abs() < 1e-6);
        assert_eq!(viewer.sync.endpoint, "http://localhost:5000");
        assert!(viewer.sync.despawn_missing_agents);
    }

    #[test]
    fn rejects_base_outside_grid() {
        let err = EngineConfig::from_toml_str("[world]\nbase_x = 11\n").unwrap_err();
        assert!(err.to_string().contains("outside"));
    }

    #[test]
    fn rejects_overfull_grid() {
        let toml = "[world]\nwidth = 3\nheight = 3\nbase_x = 1\nbase_y = 1\nfood_count = 6\n[agents]\ncount = 3\n";
        assert!(EngineConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn rejects_unbounded_waits() {
        assert!(ViewerConfig::from_toml_str("[sync]\ninterval_secs = inf\n").is_err());
        assert!(ViewerConfig::from_toml_str("[sync]\ninterval_secs = nan\n").is_err());
        assert!(ViewerConfig::from_toml_str("[sync]\nrequest_timeout_secs = 1e30\n").is_err());
        assert!(ViewerConfig::from_toml_str("[sync]\ninterval_secs = 3600.0\n").is_ok());
    }

    #[test]
    fn rejects_non_positive_interval() {
        assert!(ViewerConfig::from_toml_str("[sync]\ninterval_secs = 0.0\n").is_err());
        assert!(ViewerConfig::from_toml_str("[sync]\nendpoint = \"\"\n").is_err());
    }

    #[test]
    fn load_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[agents]\ncount = 2").unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.agents.count, 2);

        let err = EngineConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }

    #[test]
    fn model_params_follow_config() {
        let config = EngineConfig::from_toml_str("[world]\nbase_x = 2\nbase_y = 3\nplacement_seed = 7\n").unwrap();
        let params = config.model_params();
        assert_eq!(params.base, GridPos::new(2, 3));
        assert_eq!(params.seed, 7);
        assert_eq!(params.num_cells(), 121);
    }
}
