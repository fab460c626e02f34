use crate::scene::{Color, ObjectHandle, ObjectKind, Scene};
use anyhow::{bail, Context, Result};
use forage_common::{RenderConfig, SceneConfig, Vec3};
use image::{ImageBuffer, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Largest frame edge, in pixels, that the raster host will allocate.
pub const MAX_FRAME_SIDE: u32 = 16_384;

/// How an object kind is drawn until the synchronizer recolors it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Template {
    pub color: Color,
    /// Footprint as a fraction of one grid cell.
    pub size: f32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SceneTemplates {
    pub agent: Template,
    pub food: Template,
    pub base: Template,
}

impl SceneTemplates {
    pub fn from_config(config: &SceneConfig) -> Result<Self> {
        Ok(SceneTemplates {
            agent: Template { color: Color::named(&config.normal_color)?, size: 0.7 },
            food: Template { color: Color::named(&config.food_color)?, size: 0.45 },
            base: Template { color: Color::named(&config.base_color)?, size: 1.0 },
        })
    }

    fn get(&self, kind: ObjectKind) -> Template {
        match kind {
            ObjectKind::Agent => self.agent,
            ObjectKind::Food => self.food,
            ObjectKind::Base => self.base,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterObject {
    pub kind: ObjectKind,
    pub position: Vec3,
    pub color: Color,
}

/// Headless scene host: keeps objects in memory and draws a top-down view of the floor.
/// The scene x axis maps to image columns and z to image rows; height only orders drawing.
pub struct RasterScene {
    objects: BTreeMap<ObjectHandle, RasterObject>,
    next_id: u64,
    templates: SceneTemplates,
    pixels_per_unit: u32,
    width_px: u32,
    height_px: u32,
    background: Color,
    frames_dir: Option<PathBuf>,
    frames_written: usize,
}

impl RasterScene {
    pub fn new(render: &RenderConfig, scene: &SceneConfig) -> Result<Self> {
        let templates = SceneTemplates::from_config(scene)?;
        let background = Color::named(&render.background)?;
        let (width_px, height_px) = match (
            render.world_width.checked_mul(render.pixels_per_unit),
            render.world_height.checked_mul(render.pixels_per_unit),
        ) {
            (Some(w), Some(h)) if w <= MAX_FRAME_SIDE && h <= MAX_FRAME_SIDE => (w, h),
            _ => bail!(
                "Frame of {}x{} cells at {} px per unit exceeds {} px per side",
                render.world_width,
                render.world_height,
                render.pixels_per_unit,
                MAX_FRAME_SIDE
            ),
        };
        if let Some(dir) = &render.frames_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create frames directory: {}", dir.display()))?;
            info!("Writing frames to {}", dir.display());
        }
        Ok(Self {
            objects: BTreeMap::new(),
            next_id: 0,
            templates,
            pixels_per_unit: render.pixels_per_unit,
            width_px,
            height_px,
            background,
            frames_dir: render.frames_dir.clone(),
            frames_written: 0,
        })
    }

    pub fn object(&self, handle: ObjectHandle) -> Option<&RasterObject> {
        self.objects.get(&handle)
    }

    pub fn count(&self, kind: ObjectKind) -> usize {
        self.objects.values().filter(|o| o.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Center of the grid cell under `position`, in pixels.
    fn to_pixel(&self, position: Vec3) -> (i32, i32) {
        let ppu = self.pixels_per_unit as f32;
        let px = ((position.x + 0.5) * ppu).round() as i32;
        let py = ((position.z + 0.5) * ppu).round() as i32;
        (px, py)
    }

    /// Draws the current objects, lowest first.
    pub fn render(&self) -> RgbaImage {
        let mut image = ImageBuffer::from_pixel(self.width_px, self.height_px, Rgba(self.background.0));

        let mut ordered: Vec<&RasterObject> = self.objects.values().collect();
        ordered.sort_by(|a, b| a.position.y.partial_cmp(&b.position.y).unwrap_or(std::cmp::Ordering::Equal));

        let ppu = self.pixels_per_unit as f32;
        for object in ordered {
            let (cx, cy) = self.to_pixel(object.position);
            let template = self.templates.get(object.kind);
            let color = Rgba(object.color.0);
            let extent = ((template.size * ppu).round() as u32).max(1);
            let corner = (cx - extent as i32 / 2, cy - extent as i32 / 2);
            match object.kind {
                ObjectKind::Agent => {
                    draw_filled_circle_mut(&mut image, (cx, cy), (extent / 2).max(1) as i32, color);
                }
                ObjectKind::Food => {
                    draw_filled_rect_mut(&mut image, Rect::at(corner.0, corner.1).of_size(extent, extent), color);
                }
                ObjectKind::Base => {
                    let rect = Rect::at(corner.0, corner.1).of_size(extent, extent);
                    draw_hollow_rect_mut(&mut image, rect, color);
                    if extent > 4 {
                        let inner = Rect::at(corner.0 + 2, corner.1 + 2).of_size(extent - 4, extent - 4);
                        draw_hollow_rect_mut(&mut image, inner, color);
                    }
                }
            }
        }
        image
    }

    fn lookup(&mut self, handle: ObjectHandle, op: &str) -> Option<&mut RasterObject> {
        let object = self.objects.get_mut(&handle);
        if object.is_none() {
            warn!("{} on unknown object {:?} ignored", op, handle);
        }
        object
    }
}

impl Scene for RasterScene {
    fn create(&mut self, kind: ObjectKind, position: Vec3) -> ObjectHandle {
        self.next_id += 1;
        let handle = ObjectHandle(self.next_id);
        let color = self.templates.get(kind).color;
        self.objects.insert(handle, RasterObject { kind, position, color });
        handle
    }

    fn destroy(&mut self, handle: ObjectHandle) {
        if self.objects.remove(&handle).is_none() {
            warn!("destroy on unknown object {:?} ignored", handle);
        }
    }

    fn set_position(&mut self, handle: ObjectHandle, position: Vec3) {
        if let Some(object) = self.lookup(handle, "set_position") {
            object.position = position;
        }
    }

    fn set_color(&mut self, handle: ObjectHandle, color: Color) {
        if let Some(object) = self.lookup(handle, "set_color") {
            object.color = color;
        }
    }

    /// Writes `frame_NNNNN.png` when a frames directory is configured.
    fn present(&mut self) -> Result<()> {
        let Some(dir) = &self.frames_dir else {
            return Ok(());
        };
        let path = dir.join(format!("frame_{:05}.png", self.frames_written));
        self.render()
            .save(&path)
            .with_context(|| format!("Failed to write frame {}", path.display()))?;
        debug!("Wrote {}", path.display());
        self.frames_written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneStyle;
    use crate::sync::{AgentRetention, SceneSynchronizer};
    use forage_common::{AgentState, FoodItem, Snapshot};

    fn render_config(frames_dir: Option<PathBuf>) -> RenderConfig {
        RenderConfig { frames_dir, pixels_per_unit: 10, ..RenderConfig::default() }
    }

    #[test]
    fn created_objects_use_template_colors() {
        let mut scene = RasterScene::new(&render_config(None), &SceneConfig::default()).unwrap();
        let food = scene.create(ObjectKind::Food, Vec3::new(1.0, 0.25, 1.0));
        let agent = scene.create(ObjectKind::Agent, Vec3::new(2.0, 0.5, 2.0));
        assert_eq!(scene.object(food).unwrap().color, Color::named("red").unwrap());
        assert_eq!(scene.object(agent).unwrap().color, Color::GREEN);

        scene.set_color(agent, Color::YELLOW);
        scene.set_position(agent, Vec3::new(3.0, 0.5, 2.0));
        assert_eq!(scene.object(agent).unwrap().color, Color::YELLOW);
        assert_eq!(scene.object(agent).unwrap().position.x, 3.0);

        scene.destroy(food);
        assert!(scene.object(food).is_none());
        assert_eq!(scene.len(), 1);
        // Unknown handles are ignored
        scene.destroy(food);
        scene.set_color(food, Color::GREEN);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn render_draws_objects_at_cell_centers() {
        let mut scene = RasterScene::new(&render_config(None), &SceneConfig::default()).unwrap();
        scene.create(ObjectKind::Agent, Vec3::new(2.0, 0.5, 3.0));
        scene.create(ObjectKind::Food, Vec3::new(7.0, 0.25, 1.0));

        let image = scene.render();
        assert_eq!(image.dimensions(), (110, 110));
        assert_eq!(image.get_pixel(25, 35), &Rgba(Color::GREEN.0));
        assert_eq!(image.get_pixel(75, 15), &Rgba(Color::named("red").unwrap().0));
        assert_eq!(image.get_pixel(50, 90), &Rgba(Color::named("white").unwrap().0));
    }

    #[test]
    fn rejects_unknown_colors() {
        let scene = SceneConfig { food_color: "teal".to_string(), ..SceneConfig::default() };
        assert!(RasterScene::new(&render_config(None), &scene).is_err());
        let render = RenderConfig { background: "plaid".to_string(), ..RenderConfig::default() };
        assert!(RasterScene::new(&render, &SceneConfig::default()).is_err());
    }

    #[test]
    fn rejects_oversized_frames() {
        let overflowing = RenderConfig { pixels_per_unit: 70_000, world_width: 70_000, ..RenderConfig::default() };
        assert!(RasterScene::new(&overflowing, &SceneConfig::default()).is_err());

        let too_tall = RenderConfig { pixels_per_unit: 1_000, world_height: 20, ..RenderConfig::default() };
        assert!(RasterScene::new(&too_tall, &SceneConfig::default()).is_err());

        let largest = RenderConfig { pixels_per_unit: 1_024, world_width: 16, world_height: 1, ..RenderConfig::default() };
        assert!(RasterScene::new(&largest, &SceneConfig::default()).is_ok());
    }

    #[test]
    fn present_writes_numbered_frames() {
        let dir = tempfile::tempdir().unwrap();
        let frames = dir.path().join("frames");
        let scene = RasterScene::new(&render_config(Some(frames.clone())), &SceneConfig::default()).unwrap();
        let mut sync = SceneSynchronizer::new(scene, SceneStyle::default(), AgentRetention::Despawn);

        let snap = Snapshot {
            finished: false,
            agents: vec![AgentState { id: 0, x: 1, y: 1, carrying_food: true }],
            food: vec![FoodItem { x: 4, y: 4 }],
        };
        sync.reconcile(&snap);
        sync.scene_mut().present().unwrap();
        sync.reconcile(&snap);
        sync.scene_mut().present().unwrap();

        assert_eq!(sync.scene().frames_written(), 2);
        assert!(frames.join("frame_00000.png").exists());
        let last = image::open(frames.join("frame_00001.png")).unwrap().to_rgba8();
        assert_eq!(last.get_pixel(15, 15), &Rgba(Color::YELLOW.0));
    }

    #[test]
    fn present_without_frames_dir_is_a_no_op() {
        let mut scene = RasterScene::new(&render_config(None), &SceneConfig::default()).unwrap();
        scene.present().unwrap();
        assert_eq!(scene.frames_written(), 0);
    }
}
