use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "easel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a JSON session script and write the resulting frame as a PNG.
    Script(ScriptArgs),
    /// Run a small built-in session and write the resulting frame as a PNG.
    Demo(DemoArgs),
}

#[derive(Parser, Debug)]
struct ScriptArgs {
    /// Input session JSON (an array of commands; must include a `mount`).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Font file used to draw text overlays.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Backend to use.
    #[arg(long, value_enum, default_value_t = BackendChoice::Cpu)]
    backend: BackendChoice,
}

#[derive(Parser, Debug)]
struct DemoArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Image overlay source.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Video overlay source.
    #[arg(long)]
    video: Option<PathBuf>,

    /// Font file used to draw text overlays.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Stage width.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Stage height.
    #[arg(long, default_value_t = 480)]
    height: u32,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Cpu,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Script(args) => cmd_script(args),
        Command::Demo(args) => cmd_demo(args),
    }
}

fn make_backend(
    choice: BackendChoice,
    font: Option<&Path>,
) -> anyhow::Result<Box<dyn easel::RenderBackend>> {
    let font_bytes = match font {
        Some(path) => Some(
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?,
        ),
        None => None,
    };
    let settings = easel::RenderSettings {
        clear_rgba: Some([255, 255, 255, 255]),
        font_bytes,
    };
    let kind = match choice {
        BackendChoice::Cpu => easel::BackendKind::Cpu,
    };
    Ok(easel::create_backend(kind, &settings)?)
}

fn write_frame_png(frame: &easel::FrameRGBA, out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", out.display()))?;
    Ok(())
}

fn cmd_script(args: ScriptArgs) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(&args.in_path)
        .with_context(|| format!("read session '{}'", args.in_path.display()))?;
    let commands = easel::parse_script(&json)?;

    let mut editor = easel::Editor::new();
    easel::run_script(&mut editor, &commands)?;
    let stage = editor
        .stage()
        .context("session did not mount the editor (missing 'mount' command?)")?;

    let mut backend = make_backend(args.backend, args.font.as_deref())?;
    let frame = backend.render_stage(stage)?;
    write_frame_png(&frame, &args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_demo(args: DemoArgs) -> anyhow::Result<()> {
    let mut editor = easel::Editor::new();
    if let Some(video) = &args.video {
        editor.set_video_source(video);
    }
    editor.mount(easel::Viewport::new(args.width, args.height)?);

    if let Some(image) = &args.image {
        editor.load_image_sync(image);
    }
    editor.toggle_text();
    editor.set_text("hello easel");
    editor.set_font_size(32.0);
    if args.video.is_some() {
        editor.toggle_video();
        editor.play_pause();
    }

    let mut backend = make_backend(BackendChoice::Cpu, args.font.as_deref())?;
    let stage = editor.stage().context("editor failed to mount")?;
    let frame = backend.render_stage(stage)?;
    write_frame_png(&frame, &args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
