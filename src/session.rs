//! Scripted editor sessions.
//!
//! A session is a flat list of [`SessionCommand`] values applied in order to an
//! [`Editor`]. The CLI replays a JSON-encoded session and rasterizes the result; tests
//! use the same path to drive the editor declaratively.

use serde::{Deserialize, Serialize};

use crate::{
    editor::Editor,
    foundation::error::{EaselError, EaselResult},
    foundation::geom::Viewport,
    scene::node::NodeId,
};

/// Which overlay a gesture command addresses.
///
/// Scripts cannot know [`NodeId`](crate::scene::node::NodeId) values up front, so gesture
/// commands name the overlay and the editor resolves its retained handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayTarget {
    Image,
    Text,
    Video,
}

/// One editor operation in a scripted session.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SessionCommand {
    Mount { width: u32, height: u32 },
    LoadImage { path: String },
    ToggleText,
    SetText { text: String },
    SetFontSize { px: f64 },
    SetVideoSource { path: String },
    ToggleVideo,
    PlayPause,
    StopVideo,
    SeekVideo { seconds: f64 },
    Drag { target: OverlayTarget, x: f64, y: f64 },
    SetScale { target: OverlayTarget, sx: f64, sy: f64 },
    TransformEnd { target: OverlayTarget },
}

/// Parse a JSON array of commands.
pub fn parse_script(json: &str) -> EaselResult<Vec<SessionCommand>> {
    serde_json::from_str(json).map_err(|e| EaselError::script(format!("parse session: {e}")))
}

/// Apply `commands` in order. Gesture commands addressing an absent overlay no-op, like
/// the interactive operations they mirror.
pub fn run_script(editor: &mut Editor, commands: &[SessionCommand]) -> EaselResult<()> {
    for command in commands {
        match command {
            SessionCommand::Mount { width, height } => {
                editor.mount(Viewport::new(*width, *height)?);
            }
            SessionCommand::LoadImage { path } => editor.load_image_sync(path),
            SessionCommand::ToggleText => editor.toggle_text(),
            SessionCommand::SetText { text } => editor.set_text(text),
            SessionCommand::SetFontSize { px } => editor.set_font_size(*px),
            SessionCommand::SetVideoSource { path } => editor.set_video_source(path),
            SessionCommand::ToggleVideo => editor.toggle_video(),
            SessionCommand::PlayPause => editor.play_pause(),
            SessionCommand::StopVideo => editor.stop_video(),
            SessionCommand::SeekVideo { seconds } => editor.seek_video(*seconds),
            SessionCommand::Drag { target, x, y } => {
                if let Some(id) = resolve(editor, *target) {
                    editor.drag_to(id, *x, *y);
                }
            }
            SessionCommand::SetScale { target, sx, sy } => {
                if let Some(id) = resolve(editor, *target) {
                    editor.set_scale(id, *sx, *sy);
                }
            }
            SessionCommand::TransformEnd { target } => {
                if let Some(id) = resolve(editor, *target) {
                    editor.transform_end(id);
                }
            }
        }
    }
    Ok(())
}

fn resolve(editor: &Editor, target: OverlayTarget) -> Option<NodeId> {
    match target {
        OverlayTarget::Image => editor.image_node(),
        OverlayTarget::Text => editor.text_node(),
        OverlayTarget::Video => editor.video_node(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_malformed_json() {
        assert!(parse_script("not json").is_err());
        assert!(parse_script(r#"[{"op": "warp_drive"}]"#).is_err());
    }

    #[test]
    fn commands_round_trip_through_json() {
        let cmds = vec![
            SessionCommand::Mount {
                width: 800,
                height: 600,
            },
            SessionCommand::ToggleText,
            SessionCommand::SetText {
                text: "hello".to_string(),
            },
            SessionCommand::TransformEnd {
                target: OverlayTarget::Text,
            },
        ];
        let json = serde_json::to_string(&cmds).unwrap();
        let back = parse_script(&json).unwrap();
        assert_eq!(back.len(), 4);
        assert!(matches!(back[1], SessionCommand::ToggleText));
    }

    #[test]
    fn script_drives_editor_state() {
        let mut editor = Editor::new();
        let script = r#"[
            {"op": "mount", "width": 640, "height": 480},
            {"op": "toggle_text"},
            {"op": "set_text", "text": "hello"},
            {"op": "set_font_size", "px": 32},
            {"op": "drag", "target": "text", "x": 10, "y": 15}
        ]"#;
        run_script(&mut editor, &parse_script(script).unwrap()).unwrap();

        let id = editor.text_node().unwrap();
        let node = editor.node(id).unwrap();
        assert_eq!(node.as_text().unwrap().content, "hello");
        assert_eq!(node.as_text().unwrap().font_size, 32.0);
        assert_eq!((node.x, node.y), (10.0, 15.0));
    }

    #[test]
    fn seek_command_positions_the_video_overlay() {
        let mut editor = Editor::new();
        let script = r#"[
            {"op": "mount", "width": 64, "height": 64},
            {"op": "set_video_source", "path": "clip.webm"},
            {"op": "toggle_video"},
            {"op": "seek_video", "seconds": 1.5}
        ]"#;
        run_script(&mut editor, &parse_script(script).unwrap()).unwrap();

        let id = editor.video_node().unwrap();
        let node = editor.node(id).unwrap();
        assert_eq!(node.as_video().unwrap().element.current_time(), 1.5);
    }

    #[test]
    fn gesture_on_absent_overlay_is_a_noop() {
        let mut editor = Editor::new();
        let script = r#"[
            {"op": "mount", "width": 64, "height": 64},
            {"op": "transform_end", "target": "video"},
            {"op": "drag", "target": "image", "x": 1, "y": 2}
        ]"#;
        run_script(&mut editor, &parse_script(script).unwrap()).unwrap();
        assert!(editor.video_node().is_none());
        assert!(editor.image_node().is_none());
    }

    #[test]
    fn mount_with_zero_dimension_fails() {
        let mut editor = Editor::new();
        let cmds = vec![SessionCommand::Mount {
            width: 0,
            height: 10,
        }];
        assert!(run_script(&mut editor, &cmds).is_err());
    }
}
