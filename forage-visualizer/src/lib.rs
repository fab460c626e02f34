//! Mirrors a remote forage simulation into a scene by polling its `/step` endpoint.

pub mod clock;
pub mod raster;
pub mod runner;
pub mod scene;
pub mod source;
pub mod sync;

pub use clock::{Clock, SystemClock};
pub use raster::RasterScene;
pub use runner::{LoopState, PollLoop, StopReason};
pub use scene::{Color, ObjectHandle, ObjectKind, Scene, SceneStyle};
pub use source::{HttpSource, PollError, SnapshotSource};
pub use sync::{AgentRetention, SceneSynchronizer};
