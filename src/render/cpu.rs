use std::{borrow::Cow, collections::HashMap, path::PathBuf, sync::Arc};

use tracing::debug;

use crate::{
    assets::{
        image::ImageBitmap,
        video::{self, VideoSourceInfo},
    },
    foundation::{
        error::{EaselError, EaselResult},
        geom::Affine,
        geom::Rgba8,
    },
    render::backend::{FrameRGBA, RenderBackend, RenderSettings},
    scene::{
        node::{Node, OverlayContent, TextOverlay, VideoOverlay},
        stage::Stage,
    },
};

/// Placeholder fill for video overlays when no frame can be decoded.
const VIDEO_PLACEHOLDER_RGBA: [u8; 4] = [24, 24, 28, 255];

/// CPU raster backend powered by `vello_cpu`.
///
/// Text is shaped with Parley. Glyphs are only drawn when the backend was constructed
/// with font bytes ([`RenderSettings::font_bytes`]); without them text overlays shape
/// against a generic family and paint nothing, which keeps fontless environments
/// (CI, containers) rendering instead of failing.
pub struct CpuBackend {
    settings: RenderSettings,
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Rgba8>,
    text_font: Option<(String, vello_cpu::peniko::FontData)>,
    image_cache: HashMap<usize, (Arc<Vec<u8>>, vello_cpu::Image)>,
    video_info_cache: HashMap<PathBuf, VideoSourceInfo>,
}

impl CpuBackend {
    pub fn new(settings: RenderSettings) -> Self {
        let mut font_ctx = parley::FontContext::default();
        let text_font = settings.font_bytes.as_ref().and_then(|bytes| {
            let families = font_ctx
                .collection
                .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
            let family_id = families.first().map(|(id, _)| *id)?;
            let family_name = font_ctx.collection.family_name(family_id)?.to_string();
            let font = vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(bytes.clone()),
                0,
            );
            Some((family_name, font))
        });

        Self {
            settings,
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            text_font,
            image_cache: HashMap::new(),
            video_info_cache: HashMap::new(),
        }
    }

    fn layout_text(&mut self, text: &TextOverlay) -> parley::Layout<Rgba8> {
        let stack = match &self.text_font {
            Some((family, _)) => {
                parley::style::FontStack::Source(Cow::Owned(family.clone()))
            }
            None => parley::style::FontStack::Source(Cow::Borrowed("sans-serif")),
        };

        let mut builder =
            self.layout_ctx
                .ranged_builder(&mut self.font_ctx, &text.content, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(stack));
        builder.push_default(parley::style::StyleProperty::FontSize(
            text.font_size as f32,
        ));
        builder.push_default(parley::style::StyleProperty::Brush(text.fill));

        let mut layout: parley::Layout<Rgba8> = builder.build(&text.content);
        layout.break_all_lines(None);
        layout
    }

    /// Each entry holds the source `Arc`, which pins its address for the entry's
    /// lifetime; an entry whose only remaining owner is the cache has no live bitmap
    /// behind it and is evicted before lookup.
    fn image_paint_for(&mut self, bitmap: &ImageBitmap) -> EaselResult<vello_cpu::Image> {
        self.image_cache
            .retain(|_, (src, _)| Arc::strong_count(src) > 1);

        let key = Arc::as_ptr(&bitmap.rgba8_premul) as usize;
        if let Some((src, paint)) = self.image_cache.get(&key)
            && Arc::ptr_eq(src, &bitmap.rgba8_premul)
        {
            return Ok(paint.clone());
        }
        let pixmap =
            premul_bytes_to_pixmap(&bitmap.rgba8_premul, bitmap.width, bitmap.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.image_cache
            .insert(key, (bitmap.rgba8_premul.clone(), paint.clone()));
        Ok(paint)
    }

    /// Decode the frame at the element's current playback position. `None` when frame
    /// decode is unavailable; the caller falls back to the placeholder fill.
    fn video_frame_paint(&mut self, overlay: &VideoOverlay) -> Option<vello_cpu::Image> {
        let source = overlay.element.source().to_path_buf();
        let info = match self.video_info_cache.get(&source) {
            Some(info) => info.clone(),
            None => match video::probe_video(&source) {
                Ok(info) => {
                    self.video_info_cache.insert(source.clone(), info.clone());
                    info
                }
                Err(err) => {
                    debug!(source = %source.display(), error = %err, "video probe unavailable, using placeholder");
                    return None;
                }
            },
        };

        let mut rgba = match video::decode_frame_rgba8(&info, overlay.element.current_time()) {
            Ok(rgba) => rgba,
            Err(err) => {
                debug!(source = %source.display(), error = %err, "video frame decode failed, using placeholder");
                return None;
            }
        };
        for px in rgba.chunks_exact_mut(4) {
            let a = px[3] as u16;
            px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
            px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
            px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
        }
        let pixmap = premul_bytes_to_pixmap(&rgba, info.width, info.height).ok()?;
        Some(vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        })
    }

    fn draw_node(&mut self, ctx: &mut vello_cpu::RenderContext, node: &Node) -> EaselResult<()> {
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        match &node.content {
            OverlayContent::Image(image) => {
                let paint = self.image_paint_for(&image.bitmap)?;
                let (img_w, img_h) = (f64::from(image.bitmap.width), f64::from(image.bitmap.height));
                if img_w == 0.0 || img_h == 0.0 {
                    return Ok(());
                }
                // Content is drawn in bitmap-local space and scaled out to the node size.
                let transform = node.local_affine()
                    * Affine::scale_non_uniform(node.width / img_w, node.height / img_h);
                ctx.set_transform(affine_to_cpu(transform));
                ctx.set_paint(paint);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, img_w, img_h));
                Ok(())
            }
            OverlayContent::Text(text) => {
                let layout = self.layout_text(text);
                let Some((_, font)) = self.text_font.clone() else {
                    debug!("no font bytes configured, skipping text glyphs");
                    return Ok(());
                };
                ctx.set_transform(affine_to_cpu(node.local_affine()));

                for line in layout.lines() {
                    for item in line.items() {
                        let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                            continue;
                        };

                        let brush = run.style().brush;
                        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                            brush.r, brush.g, brush.b, brush.a,
                        ));

                        let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                            id: g.id,
                            x: g.x,
                            y: g.y,
                        });
                        ctx.glyph_run(&font)
                            .font_size(run.run().font_size())
                            .fill_glyphs(glyphs);
                    }
                }
                Ok(())
            }
            OverlayContent::Video(overlay) => {
                let (el_w, el_h) = (
                    f64::from(overlay.element.width()),
                    f64::from(overlay.element.height()),
                );
                if el_w == 0.0 || el_h == 0.0 {
                    return Ok(());
                }
                let rect = vello_cpu::kurbo::Rect::new(0.0, 0.0, el_w, el_h);
                let transform = node.local_affine()
                    * Affine::scale_non_uniform(node.width / el_w, node.height / el_h);
                ctx.set_transform(affine_to_cpu(transform));

                if let Some(paint) = self.video_frame_paint(overlay) {
                    ctx.set_paint(paint);
                } else {
                    let [r, g, b, a] = VIDEO_PLACEHOLDER_RGBA;
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
                }
                ctx.fill_rect(&rect);
                Ok(())
            }
        }
    }
}

impl RenderBackend for CpuBackend {
    fn render_stage(&mut self, stage: &Stage) -> EaselResult<FrameRGBA> {
        let width_u16: u16 = stage
            .width()
            .try_into()
            .map_err(|_| EaselError::render("stage width exceeds u16"))?;
        let height_u16: u16 = stage
            .height()
            .try_into()
            .map_err(|_| EaselError::render("stage height exceeds u16"))?;

        let mut pixmap = vello_cpu::Pixmap::new(width_u16, height_u16);
        let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);

        // The clear color is painted as the bottom fill of the pass itself;
        // render_to_pixmap replaces the target's pixels rather than compositing
        // over them.
        if let Some([r, g, b, a]) = self.settings.clear_rgba {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(width_u16),
                f64::from(height_u16),
            ));
        }

        for (_, node) in stage.layer().iter() {
            self.draw_node(&mut ctx, node)?;
        }
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        Ok(FrameRGBA {
            width: stage.width(),
            height: stage.height(),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> EaselResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| EaselError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| EaselError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(EaselError::render("image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}
