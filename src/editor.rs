use std::path::PathBuf;

use tracing::{debug, instrument, warn};

use crate::{
    assets::{
        image::{ImageBitmap, ImageLoadHandle, ImageLoadPoll, load_image_file},
        video::VideoElement,
    },
    foundation::geom::{Rgba8, Viewport},
    scene::{
        node::{ImageOverlay, MIN_FONT_SIZE, Node, NodeId, OverlayContent, TextOverlay, VideoOverlay},
        stage::Stage,
    },
};

/// Image overlay defaults: position and size used when the loaded bitmap is attached.
pub const IMAGE_DEFAULT_POS: (f64, f64) = (100.0, 100.0);
pub const IMAGE_DEFAULT_SIZE: (f64, f64) = (100.0, 100.0);

/// Text overlay defaults restored on every create.
pub const TEXT_DEFAULT_POS: (f64, f64) = (50.0, 50.0);
pub const TEXT_DEFAULT_FONT_SIZE: f64 = 24.0;
pub const TEXT_DEFAULT_FILL: Rgba8 = Rgba8::BLACK;

/// Video overlay position and fixed element size.
pub const VIDEO_DEFAULT_POS: (f64, f64) = (100.0, 100.0);
pub const VIDEO_SIZE: (u32, u32) = (320, 240);

/// The canvas editor: one stage, toggleable overlays, explicit handles.
///
/// Every user-facing control maps onto a method. State-changing operations run the
/// composition pass themselves, so after any method returns the layer's children match
/// the editor's flags and pending assets.
///
/// Overlay nodes are addressed exclusively through the [`NodeId`] handles retained at
/// creation time. Removal never queries the scene by overlay type, so an image overlay
/// and a video overlay can coexist without ambiguity.
#[derive(Debug)]
pub struct Editor {
    stage: Option<Stage>,

    image_load: Option<ImageLoadHandle>,
    pending_image: Option<ImageBitmap>,
    pending_video: Option<VideoElement>,
    video_source: Option<PathBuf>,

    text_enabled: bool,
    video_enabled: bool,
    text: String,
    font_size: f64,

    image_node: Option<NodeId>,
    text_node: Option<NodeId>,
    video_node: Option<NodeId>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self {
            stage: None,
            image_load: None,
            pending_image: None,
            pending_video: None,
            video_source: None,
            text_enabled: false,
            video_enabled: false,
            text: String::new(),
            font_size: TEXT_DEFAULT_FONT_SIZE,
            image_node: None,
            text_node: None,
            video_node: None,
        }
    }

    /// Set the source used by [`Editor::toggle_video`]. The original pins this to one
    /// fixed clip; here it is configured once up front.
    pub fn with_video_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.video_source = Some(source.into());
        self
    }

    pub fn set_video_source(&mut self, source: impl Into<PathBuf>) {
        self.video_source = Some(source.into());
    }

    /// Construct the stage sized to `viewport` and attach its layer.
    ///
    /// Idempotent: once mounted, further calls are no-ops and the original viewport wins.
    pub fn mount(&mut self, viewport: Viewport) {
        if self.stage.is_some() {
            return;
        }
        debug!(width = viewport.width, height = viewport.height, "mount stage");
        self.stage = Some(Stage::new(viewport));
        self.compose();
    }

    pub fn is_mounted(&self) -> bool {
        self.stage.is_some()
    }

    pub fn stage(&self) -> Option<&Stage> {
        self.stage.as_ref()
    }

    /// Start the one-shot background image load. The overlay appears automatically once
    /// the load completes and a composition pass runs (see [`Editor::poll_image_load`]).
    pub fn load_image(&mut self, path: impl Into<PathBuf>) {
        self.image_load = Some(ImageLoadHandle::spawn(path.into()));
    }

    /// Load and decode synchronously. Failure is silent, as with the background path.
    pub fn load_image_sync(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        match load_image_file(&path) {
            Ok(bitmap) => {
                self.pending_image = Some(bitmap);
                self.compose();
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "image load failed, no overlay will be created");
            }
        }
    }

    /// Drain a completed background load, if any. Returns true when the pass attached
    /// a new overlay.
    pub fn poll_image_load(&mut self) -> bool {
        let Some(handle) = &self.image_load else {
            return false;
        };
        match handle.poll() {
            ImageLoadPoll::Pending => false,
            ImageLoadPoll::Ready(bitmap) => {
                self.image_load = None;
                self.pending_image = Some(bitmap);
                self.compose();
                self.image_node.is_some()
            }
            ImageLoadPoll::Failed => {
                self.image_load = None;
                false
            }
        }
    }

    /// Composition pass: make the layer's children match the presence flags and pending
    /// assets, creating missing overlays with their defaults and redrawing after each
    /// creation. Safe to call before mount (no-op).
    #[instrument(skip(self))]
    pub fn compose(&mut self) {
        let Some(stage) = self.stage.as_mut() else {
            return;
        };
        let layer = stage.layer_mut();

        if self.image_node.is_none()
            && let Some(bitmap) = self.pending_image.take()
        {
            let node = Node::new(
                IMAGE_DEFAULT_POS.0,
                IMAGE_DEFAULT_POS.1,
                IMAGE_DEFAULT_SIZE.0,
                IMAGE_DEFAULT_SIZE.1,
                OverlayContent::Image(ImageOverlay { bitmap }),
            );
            self.image_node = Some(layer.add(node));
            layer.draw();
        }

        if self.text_enabled && self.text_node.is_none() {
            let node = Node::new(
                TEXT_DEFAULT_POS.0,
                TEXT_DEFAULT_POS.1,
                0.0,
                0.0,
                OverlayContent::Text(TextOverlay::new(
                    self.text.clone(),
                    self.font_size,
                    TEXT_DEFAULT_FILL,
                )),
            );
            self.text_node = Some(layer.add(node));
            layer.draw();
        }

        if self.video_enabled
            && self.video_node.is_none()
            && let Some(element) = self.pending_video.take()
        {
            let node = Node::new(
                VIDEO_DEFAULT_POS.0,
                VIDEO_DEFAULT_POS.1,
                f64::from(element.width()),
                f64::from(element.height()),
                OverlayContent::Video(VideoOverlay { element }),
            );
            self.video_node = Some(layer.add(node));
            layer.draw();
        }
    }

    /// Toggle the text overlay. Creation uses the defaults (empty content, font size 24,
    /// black fill); state is deliberately not preserved across a destroy/recreate cycle.
    pub fn toggle_text(&mut self) {
        if let Some(id) = self.text_node.take() {
            self.text_enabled = false;
            if let Some(stage) = self.stage.as_mut() {
                stage.layer_mut().remove(id);
                stage.layer_mut().draw();
            }
            self.text.clear();
            self.font_size = TEXT_DEFAULT_FONT_SIZE;
        } else {
            self.text_enabled = true;
            self.text.clear();
            self.font_size = TEXT_DEFAULT_FONT_SIZE;
            self.compose();
        }
    }

    /// Update the live text overlay's content and redraw. No-op while no text overlay
    /// exists.
    pub fn set_text(&mut self, content: &str) {
        self.text = content.to_owned();
        let Some((stage, id)) = self.stage.as_mut().zip(self.text_node) else {
            return;
        };
        let layer = stage.layer_mut();
        if let Some(text) = layer.get_mut(id).and_then(Node::as_text_mut) {
            text.content = content.to_owned();
            layer.draw();
        }
    }

    /// Update the live text overlay's font size and redraw. Values below 1 are clamped.
    pub fn set_font_size(&mut self, px: f64) {
        self.font_size = if px.is_finite() {
            px.max(MIN_FONT_SIZE)
        } else {
            MIN_FONT_SIZE
        };
        let Some((stage, id)) = self.stage.as_mut().zip(self.text_node) else {
            return;
        };
        let layer = stage.layer_mut();
        if let Some(text) = layer.get_mut(id).and_then(Node::as_text_mut) {
            text.set_font_size(px);
            layer.draw();
        }
    }

    /// Toggle the video overlay. On enable a fresh element (paused, at zero) is staged
    /// and composed in at 320x240; on disable the overlay is destroyed by its retained
    /// handle, which drops the element with it.
    pub fn toggle_video(&mut self) {
        if let Some(id) = self.video_node.take() {
            self.video_enabled = false;
            self.pending_video = None;
            if let Some(stage) = self.stage.as_mut() {
                stage.layer_mut().remove(id);
                stage.layer_mut().draw();
            }
        } else {
            let Some(source) = self.video_source.clone() else {
                warn!("toggle_video ignored: no video source configured");
                return;
            };
            self.video_enabled = true;
            self.pending_video = Some(VideoElement::new(source, VIDEO_SIZE.0, VIDEO_SIZE.1));
            self.compose();
        }
    }

    /// Invert the playback state of the video overlay, if present. Playback changes do
    /// not redraw the layer.
    pub fn play_pause(&mut self) {
        if let Some(video) = self.video_overlay_mut() {
            video.element.toggle();
        }
    }

    /// Pause the video overlay and rewind to the start, if present. Idempotent.
    pub fn stop_video(&mut self) {
        if let Some(video) = self.video_overlay_mut() {
            video.element.stop();
        }
    }

    /// Position the video overlay's clock at `seconds`, if present. Invalid positions
    /// (non-finite or negative) are ignored. Like the other transport operations this
    /// does not redraw.
    pub fn seek_video(&mut self, seconds: f64) {
        if let Some(video) = self.video_overlay_mut()
            && let Err(err) = video.element.seek(seconds)
        {
            warn!(seconds, error = %err, "seek ignored");
        }
    }

    /// Move a draggable node and redraw. Unknown handles and non-draggable nodes no-op.
    pub fn drag_to(&mut self, id: NodeId, x: f64, y: f64) {
        if !(x.is_finite() && y.is_finite()) {
            return;
        }
        let Some(stage) = self.stage.as_mut() else {
            return;
        };
        let layer = stage.layer_mut();
        let Some(node) = layer.get_mut(id) else {
            return;
        };
        if !node.draggable {
            return;
        }
        node.x = x;
        node.y = y;
        layer.draw();
    }

    /// Record the in-progress gesture scale on a node.
    pub fn set_scale(&mut self, id: NodeId, sx: f64, sy: f64) {
        let Some(stage) = self.stage.as_mut() else {
            return;
        };
        let layer = stage.layer_mut();
        if let Some(node) = layer.get_mut(id) {
            node.set_scale(sx, sy);
            layer.draw();
        }
    }

    /// Finish a resize/rotate gesture: bake the accumulated scale into position and size,
    /// reset scale to unit, redraw.
    pub fn transform_end(&mut self, id: NodeId) {
        let Some(stage) = self.stage.as_mut() else {
            return;
        };
        let layer = stage.layer_mut();
        if let Some(node) = layer.get_mut(id) {
            node.bake_transform();
            layer.draw();
        }
    }

    pub fn image_node(&self) -> Option<NodeId> {
        self.image_node
    }

    pub fn text_node(&self) -> Option<NodeId> {
        self.text_node
    }

    pub fn video_node(&self) -> Option<NodeId> {
        self.video_node
    }

    /// Current text input value (mirrors the live overlay while one exists).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current font size input value.
    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.stage.as_ref().and_then(|s| s.layer().get(id))
    }

    fn video_overlay_mut(&mut self) -> Option<&mut VideoOverlay> {
        let (stage, id) = self.stage.as_mut().zip(self.video_node)?;
        stage.layer_mut().get_mut(id).and_then(Node::as_video_mut)
    }
}
