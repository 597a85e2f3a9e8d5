use crate::{foundation::geom::Viewport, scene::layer::Layer};

/// Top-level drawable surface, sized from a [`Viewport`] once at construction.
///
/// A stage owns exactly one [`Layer`]; there is no stage-level node API.
#[derive(Debug)]
pub struct Stage {
    viewport: Viewport,
    layer: Layer,
}

impl Stage {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            layer: Layer::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.viewport.width
    }

    pub fn height(&self) -> u32 {
        self.viewport.height
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn layer(&self) -> &Layer {
        &self.layer
    }

    pub fn layer_mut(&mut self) -> &mut Layer {
        &mut self.layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_is_sized_from_viewport() {
        let stage = Stage::new(Viewport::new(800, 600).unwrap());
        assert_eq!(stage.width(), 800);
        assert_eq!(stage.height(), 600);
        assert!(stage.layer().is_empty());
    }
}
