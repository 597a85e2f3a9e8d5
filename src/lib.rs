//! Easel is a minimal 2D canvas overlay editor.
//!
//! The public API is session-oriented:
//!
//! - Mount an [`Editor`] over a [`Viewport`]
//! - Apply overlay operations (image load, text toggle/edit, video transport, drag)
//! - Rasterize the resulting [`Stage`] through a [`RenderBackend`]
//!
//! The editor core is headless: every control of the original UI surface maps onto an
//! [`Editor`] method, and the rendering backend sits behind a trait so the rasterizer
//! can be swapped without touching control logic.
#![forbid(unsafe_code)]

pub mod assets;
pub mod editor;
pub mod foundation;
pub mod render;
pub mod scene;
pub mod session;

pub use crate::assets::image::{ImageBitmap, ImageLoadHandle, ImageLoadPoll};
pub use crate::assets::video::{PlaybackState, VideoElement};
pub use crate::editor::Editor;
pub use crate::foundation::error::{EaselError, EaselResult};
pub use crate::foundation::geom::{Affine, Point, Rect, Rgba8, Vec2, Viewport};
pub use crate::render::backend::{
    BackendKind, FrameRGBA, RenderBackend, RenderSettings, create_backend,
};
pub use crate::scene::layer::Layer;
pub use crate::scene::node::{ImageOverlay, Node, NodeId, OverlayContent, TextOverlay, VideoOverlay};
pub use crate::scene::stage::Stage;
pub use crate::session::{OverlayTarget, SessionCommand, parse_script, run_script};
