use crate::{foundation::error::EaselResult, scene::stage::Stage};

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha** by default. The `premultiplied` flag is included to
/// make this explicit at API boundaries.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

/// A renderer that can rasterize a live [`Stage`] into a [`FrameRGBA`].
///
/// The editor's control logic never talks to a rasterizer directly; it mutates the
/// stage, and a backend turns the stage into pixels on demand.
pub trait RenderBackend {
    /// Rasterize the stage's layer, nodes in paint order.
    fn render_stage(&mut self, stage: &Stage) -> EaselResult<FrameRGBA>;
}

/// Available backend kinds.
///
/// - `Cpu` is always available.
#[derive(Clone, Copy, Debug)]
pub enum BackendKind {
    /// CPU raster backend powered by `vello_cpu`.
    Cpu,
}

/// Backend-agnostic settings.
#[derive(Clone, Debug, Default)]
pub struct RenderSettings {
    /// If set, backends clear the target to this RGBA8 color before drawing.
    pub clear_rgba: Option<[u8; 4]>,
    /// Raw font bytes used to shape text overlays. Without them the backend falls back
    /// to a generic family, which may resolve to nothing on fontless systems.
    pub font_bytes: Option<Vec<u8>>,
}

/// Create a rendering backend implementation.
pub fn create_backend(
    kind: BackendKind,
    settings: &RenderSettings,
) -> EaselResult<Box<dyn RenderBackend>> {
    match kind {
        BackendKind::Cpu => Ok(Box::new(crate::render::cpu::CpuBackend::new(
            settings.clone(),
        ))),
    }
}
