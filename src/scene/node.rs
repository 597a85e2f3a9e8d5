use crate::{
    assets::{image::ImageBitmap, video::VideoElement},
    foundation::geom::{Affine, Rgba8},
};

/// Stable handle for an overlay node.
///
/// Handles are allocated by the [`Layer`](crate::scene::layer::Layer) at creation time and
/// retained by whoever created the node. All later addressing (mutation, removal) goes
/// through the handle; the scene is never re-queried by overlay type.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct NodeId(pub u64);

/// A single drawable overlay placed on the layer.
#[derive(Debug)]
pub struct Node {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Accumulated gesture scale, baked by [`Node::bake_transform`].
    pub scale_x: f64,
    pub scale_y: f64,
    pub draggable: bool,
    pub content: OverlayContent,
}

/// Content payload of an overlay node.
#[derive(Debug)]
pub enum OverlayContent {
    Image(ImageOverlay),
    Text(TextOverlay),
    Video(VideoOverlay),
}

#[derive(Debug)]
pub struct ImageOverlay {
    pub bitmap: ImageBitmap,
}

#[derive(Debug)]
pub struct TextOverlay {
    pub content: String,
    pub font_size: f64,
    pub fill: Rgba8,
}

#[derive(Debug)]
pub struct VideoOverlay {
    pub element: VideoElement,
}

/// Font sizes below this are clamped up; a zero or negative size never reaches a node.
pub const MIN_FONT_SIZE: f64 = 1.0;

impl TextOverlay {
    pub fn new(content: impl Into<String>, font_size: f64, fill: Rgba8) -> Self {
        Self {
            content: content.into(),
            font_size: clamp_font_size(font_size),
            fill,
        }
    }

    /// Set the font size, clamped to [`MIN_FONT_SIZE`].
    pub fn set_font_size(&mut self, px: f64) {
        self.font_size = clamp_font_size(px);
    }
}

fn clamp_font_size(px: f64) -> f64 {
    if px.is_finite() {
        px.max(MIN_FONT_SIZE)
    } else {
        MIN_FONT_SIZE
    }
}

impl Node {
    pub fn new(x: f64, y: f64, width: f64, height: f64, content: OverlayContent) -> Self {
        Self {
            x,
            y,
            width,
            height,
            scale_x: 1.0,
            scale_y: 1.0,
            draggable: true,
            content,
        }
    }

    /// Overlay kind name, used in log events.
    pub fn kind(&self) -> &'static str {
        match self.content {
            OverlayContent::Image(_) => "image",
            OverlayContent::Text(_) => "text",
            OverlayContent::Video(_) => "video",
        }
    }

    /// Record the in-progress gesture scale. Non-finite or non-positive factors are ignored.
    pub fn set_scale(&mut self, sx: f64, sy: f64) {
        if sx.is_finite() && sx > 0.0 && sy.is_finite() && sy > 0.0 {
            self.scale_x = sx;
            self.scale_y = sy;
        }
    }

    /// Bake the accumulated gesture scale into position and size, then reset scale to unit.
    ///
    /// This runs on transform-end so that subsequent drags and edits are not compounded by
    /// residual scale; afterwards both factors are exactly `1.0`.
    pub fn bake_transform(&mut self) {
        self.x *= self.scale_x;
        self.y *= self.scale_y;
        self.width *= self.scale_x;
        self.height *= self.scale_y;
        self.scale_x = 1.0;
        self.scale_y = 1.0;
    }

    /// Node-local affine: translation to the node origin followed by the gesture scale.
    pub fn local_affine(&self) -> Affine {
        Affine::translate((self.x, self.y)) * Affine::scale_non_uniform(self.scale_x, self.scale_y)
    }

    pub fn as_text(&self) -> Option<&TextOverlay> {
        match &self.content {
            OverlayContent::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextOverlay> {
        match &mut self.content {
            OverlayContent::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_video(&self) -> Option<&VideoOverlay> {
        match &self.content {
            OverlayContent::Video(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_video_mut(&mut self) -> Option<&mut VideoOverlay> {
        match &mut self.content {
            OverlayContent::Video(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageOverlay> {
        match &self.content {
            OverlayContent::Image(i) => Some(i),
            _ => None,
        }
    }
}
