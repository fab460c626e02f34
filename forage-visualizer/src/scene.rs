use anyhow::Result;
use forage_common::{SceneConfig, Vec3};

/// Opaque reference to an object owned by a [`Scene`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub u64);

/// Which template an object is instantiated from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Agent,
    Food,
    Base,
}

/// RGBA color.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Color(pub [u8; 4]);

// Color definitions for named colors (RGBA format)
const COLOR_MAP: &[(&str, [u8; 4])] = &[
    ("black", [0, 0, 0, 255]),
    ("white", [255, 255, 255, 255]),
    ("red", [255, 0, 0, 255]),
    ("green", [0, 255, 0, 255]),
    ("blue", [0, 0, 255, 255]),
    ("yellow", [255, 255, 0, 255]),
    ("cyan", [0, 255, 255, 255]),
    ("magenta", [255, 0, 255, 255]),
    ("gray", [128, 128, 128, 255]),
    ("brown", [139, 69, 19, 255]),
];

impl Color {
    pub const GREEN: Color = Color([0, 255, 0, 255]);
    pub const YELLOW: Color = Color([255, 255, 0, 255]);

    /// Looks up a color by name (case-insensitive).
    pub fn named(name: &str) -> Result<Color> {
        for &(known, rgba) in COLOR_MAP {
            if known.eq_ignore_ascii_case(name.trim()) {
                return Ok(Color(rgba));
            }
        }
        let names: Vec<&str> = COLOR_MAP.iter().map(|(n, _)| *n).collect();
        anyhow::bail!("Color '{}' not recognized (expected one of: {})", name, names.join(", "))
    }
}

/// The host capability the synchronizer drives: instantiate, move, recolor and destroy objects.
pub trait Scene {
    /// Instantiates the template for `kind` at `position`.
    fn create(&mut self, kind: ObjectKind, position: Vec3) -> ObjectHandle;
    fn destroy(&mut self, handle: ObjectHandle);
    fn set_position(&mut self, handle: ObjectHandle, position: Vec3);
    fn set_color(&mut self, handle: ObjectHandle, color: Color);

    /// Called once after each reconciled snapshot.
    fn present(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Heights, base placement and agent colors used when mirroring a snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SceneStyle {
    pub agent_height: f32,
    pub food_height: f32,
    pub base_position: Vec3,
    pub normal_color: Color,
    pub carrying_color: Color,
}

impl SceneStyle {
    pub fn from_config(config: &SceneConfig) -> Result<Self> {
        Ok(SceneStyle {
            agent_height: config.agent_height,
            food_height: config.food_height,
            base_position: Vec3::from(config.base_position),
            normal_color: Color::named(&config.normal_color)?,
            carrying_color: Color::named(&config.carrying_color)?,
        })
    }

    pub fn agent_color(&self, carrying_food: bool) -> Color {
        if carrying_food {
            self.carrying_color
        } else {
            self.normal_color
        }
    }
}

impl Default for SceneStyle {
    fn default() -> Self {
        SceneStyle {
            agent_height: 0.5,
            food_height: 0.25,
            base_position: Vec3::new(5.0, 0.3, 5.0),
            normal_color: Color::GREEN,
            carrying_color: Color::YELLOW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_colors() {
        assert_eq!(Color::named("Yellow").unwrap(), Color::YELLOW);
        assert_eq!(Color::named(" green ").unwrap(), Color::GREEN);
        let err = Color::named("chartreuse").unwrap_err();
        assert!(err.to_string().contains("chartreuse"));
    }

    #[test]
    fn style_from_default_config_matches_default() {
        let style = SceneStyle::from_config(&SceneConfig::default()).unwrap();
        assert_eq!(style, SceneStyle::default());
        assert_eq!(style.agent_color(true), Color::YELLOW);
        assert_eq!(style.agent_color(false), Color::GREEN);
    }

    #[test]
    fn style_rejects_unknown_color() {
        let config = SceneConfig { carrying_color: "gold".to_string(), ..SceneConfig::default() };
        assert!(SceneStyle::from_config(&config).is_err());
    }
}
