use std::{
    path::{Path, PathBuf},
    sync::{Arc, mpsc},
    thread,
};

use anyhow::Context;
use tracing::warn;

use crate::foundation::error::EaselResult;

/// Decoded raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug)]
pub struct ImageBitmap {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

pub fn decode_image(bytes: &[u8]) -> EaselResult<ImageBitmap> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(ImageBitmap {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

pub fn load_image_file(path: &Path) -> EaselResult<ImageBitmap> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(&bytes)
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

/// Result of polling an in-flight image load.
#[derive(Debug)]
pub enum ImageLoadPoll {
    /// Load still running.
    Pending,
    /// Load finished; the bitmap is handed over exactly once.
    Ready(ImageBitmap),
    /// Load failed. The failure was already logged; no bitmap will ever arrive.
    Failed,
}

/// One-shot background image load, drained by polling.
///
/// The load cannot be cancelled; dropping the handle lets the worker finish and its
/// result be discarded. Failure is silent by design: a warning event is the only trace.
#[derive(Debug)]
pub struct ImageLoadHandle {
    rx: mpsc::Receiver<ImageBitmap>,
}

impl ImageLoadHandle {
    /// Start reading and decoding `path` on a background thread.
    pub fn spawn(path: PathBuf) -> Self {
        let (tx, rx) = mpsc::sync_channel(1);
        thread::spawn(move || match load_image_file(&path) {
            Ok(bitmap) => {
                // The receiver may already be gone; nothing to do then.
                let _ = tx.send(bitmap);
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "image load failed, no overlay will be created");
            }
        });
        Self { rx }
    }

    pub fn poll(&self) -> ImageLoadPoll {
        match self.rx.try_recv() {
            Ok(bitmap) => ImageLoadPoll::Ready(bitmap),
            Err(mpsc::TryRecvError::Empty) => ImageLoadPoll::Pending,
            Err(mpsc::TryRecvError::Disconnected) => ImageLoadPoll::Failed,
        }
    }

    /// Block until the load settles. Used by scripted sessions and tests.
    pub fn wait(self) -> Option<ImageBitmap> {
        self.rx.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn png_bytes(rgba: Vec<u8>, w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_raw(w, h, rgba).unwrap();
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decode_image_png_dimensions_and_premul() {
        let buf = png_bytes(vec![100, 50, 200, 128], 1, 1);
        let bitmap = decode_image(&buf).unwrap();
        assert_eq!(bitmap.width, 1);
        assert_eq!(bitmap.height, 1);
        assert_eq!(
            bitmap.rgba8_premul.as_slice(),
            &[
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128u8
            ]
        );
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_image(b"not an image").is_err());
    }

    #[test]
    fn background_load_delivers_bitmap() {
        let dir = std::env::temp_dir().join(format!("easel_imgload_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("px.png");
        std::fs::write(&path, png_bytes(vec![1, 2, 3, 255], 1, 1)).unwrap();

        let handle = ImageLoadHandle::spawn(path);
        let bitmap = handle.wait().expect("load should succeed");
        assert_eq!((bitmap.width, bitmap.height), (1, 1));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn background_load_failure_is_silent() {
        let handle = ImageLoadHandle::spawn(PathBuf::from("definitely/missing.png"));
        assert!(handle.wait().is_none());
    }
}
