use std::{io::Cursor, path::PathBuf, time::Duration};

use easel::{Editor, PlaybackState, Viewport};

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "easel_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn write_png(path: &PathBuf, w: u32, h: u32) {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([200, 30, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, &buf).unwrap();
}

fn mounted() -> Editor {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut editor = Editor::new();
    editor.mount(Viewport::new(800, 600).unwrap());
    editor
}

#[test]
fn text_toggle_cycle_restores_defaults() {
    let mut editor = mounted();

    editor.toggle_text();
    editor.set_text("scratch");
    editor.set_font_size(48.0);
    editor.toggle_text();
    assert!(editor.text_node().is_none());

    editor.toggle_text();
    let node = editor.node(editor.text_node().unwrap()).unwrap();
    assert_eq!((node.x, node.y), (50.0, 50.0));
    let text = node.as_text().unwrap();
    assert_eq!(text.content, "");
    assert_eq!(text.font_size, 24.0);
}

#[test]
fn set_text_updates_live_overlay() {
    let mut editor = mounted();
    editor.toggle_text();
    editor.set_text("hello");

    let node = editor.node(editor.text_node().unwrap()).unwrap();
    assert_eq!(node.as_text().unwrap().content, "hello");

    editor.toggle_text();
    editor.toggle_text();
    let node = editor.node(editor.text_node().unwrap()).unwrap();
    assert_eq!(node.as_text().unwrap().content, "");
}

#[test]
fn font_size_zero_clamps_to_one() {
    let mut editor = mounted();
    editor.toggle_text();
    editor.set_font_size(0.0);

    assert_eq!(editor.font_size(), 1.0);
    let node = editor.node(editor.text_node().unwrap()).unwrap();
    assert_eq!(node.as_text().unwrap().font_size, 1.0);
}

#[test]
fn video_toggle_creates_one_overlay_with_fixed_geometry() {
    let mut editor = mounted().with_video_source("clip.webm");
    editor.toggle_video();

    let id = editor.video_node().unwrap();
    let node = editor.node(id).unwrap();
    assert_eq!((node.x, node.y), (100.0, 100.0));
    assert_eq!((node.width, node.height), (320.0, 240.0));
    assert_eq!(editor.stage().unwrap().layer().len(), 1);

    editor.toggle_video();
    assert!(editor.video_node().is_none());
    assert!(editor.stage().unwrap().layer().is_empty());
}

#[test]
fn play_pause_inverts_and_stop_is_idempotent() {
    let mut editor = mounted().with_video_source("clip.webm");
    editor.toggle_video();
    let id = editor.video_node().unwrap();

    let state = |editor: &Editor| {
        editor
            .node(id)
            .unwrap()
            .as_video()
            .unwrap()
            .element
            .state()
    };

    assert_eq!(state(&editor), PlaybackState::Paused);
    editor.play_pause();
    assert_eq!(state(&editor), PlaybackState::Playing);
    editor.play_pause();
    assert_eq!(state(&editor), PlaybackState::Paused);

    editor.play_pause();
    editor.stop_video();
    editor.stop_video();
    let video = editor.node(id).unwrap().as_video().unwrap();
    assert_eq!(video.element.state(), PlaybackState::Paused);
    assert_eq!(video.element.current_time(), 0.0);
}

#[test]
fn transport_without_video_overlay_is_a_noop() {
    let mut editor = mounted();
    editor.play_pause();
    editor.stop_video();
    editor.seek_video(2.0);
    assert!(editor.stage().unwrap().layer().is_empty());
}

#[test]
fn seek_positions_the_video_clock() {
    let mut editor = mounted().with_video_source("clip.webm");
    editor.toggle_video();
    let id = editor.video_node().unwrap();
    let draws = editor.stage().unwrap().layer().draw_count();

    editor.seek_video(3.5);
    let position = |editor: &Editor| {
        editor
            .node(id)
            .unwrap()
            .as_video()
            .unwrap()
            .element
            .current_time()
    };
    assert_eq!(position(&editor), 3.5);

    // Invalid positions are ignored; seeking never redraws.
    editor.seek_video(-1.0);
    editor.seek_video(f64::NAN);
    assert_eq!(position(&editor), 3.5);
    assert_eq!(editor.stage().unwrap().layer().draw_count(), draws);
}

#[test]
fn image_overlay_appears_once_load_completes() {
    let dir = temp_dir("image_auto");
    std::fs::create_dir_all(&dir).unwrap();
    let png = dir.join("lion.png");
    write_png(&png, 4, 4);

    let mut editor = mounted();
    editor.load_image(&png);

    let mut attached = false;
    for _ in 0..200 {
        if editor.poll_image_load() {
            attached = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(attached, "image load did not complete in time");

    let node = editor.node(editor.image_node().unwrap()).unwrap();
    assert_eq!((node.x, node.y), (100.0, 100.0));
    assert_eq!((node.width, node.height), (100.0, 100.0));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn failed_image_load_leaves_no_overlay() {
    let mut editor = mounted();
    editor.load_image("no/such/image.png");

    for _ in 0..50 {
        editor.poll_image_load();
        std::thread::sleep(Duration::from_millis(2));
    }
    assert!(editor.image_node().is_none());
    assert!(editor.stage().unwrap().layer().is_empty());
}

#[test]
fn transform_end_resets_scale_to_unit() {
    let dir = temp_dir("transform_end");
    std::fs::create_dir_all(&dir).unwrap();
    let png = dir.join("img.png");
    write_png(&png, 2, 2);

    let mut editor = mounted();
    editor.load_image_sync(&png);
    let id = editor.image_node().unwrap();

    editor.set_scale(id, 2.5, 0.5);
    editor.transform_end(id);

    let node = editor.node(id).unwrap();
    assert_eq!(node.scale_x, 1.0);
    assert_eq!(node.scale_y, 1.0);
    assert_eq!((node.x, node.y), (250.0, 50.0));
    assert_eq!((node.width, node.height), (250.0, 50.0));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn video_removal_by_handle_spares_the_image_overlay() {
    let dir = temp_dir("handle_removal");
    std::fs::create_dir_all(&dir).unwrap();
    let png = dir.join("img.png");
    write_png(&png, 2, 2);

    let mut editor = mounted().with_video_source("clip.webm");
    editor.load_image_sync(&png);
    editor.toggle_video();
    assert_eq!(editor.stage().unwrap().layer().len(), 2);

    let image_id = editor.image_node().unwrap();
    editor.toggle_video();

    assert!(editor.video_node().is_none());
    assert_eq!(editor.stage().unwrap().layer().len(), 1);
    assert!(editor.node(image_id).unwrap().as_image().is_some());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn video_toggle_cycle_recreates_a_fresh_element() {
    let mut editor = mounted().with_video_source("clip.webm");
    editor.toggle_video();
    editor.play_pause();
    editor.toggle_video();
    editor.toggle_video();

    let node = editor.node(editor.video_node().unwrap()).unwrap();
    let element = &node.as_video().unwrap().element;
    assert_eq!(element.state(), PlaybackState::Paused);
    assert_eq!(element.current_time(), 0.0);
}
