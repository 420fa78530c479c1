use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use filmstrip::{
    ConnectionClass, FsFrameFetcher, HostProfile, RenderStrategy, ScrollMapper, SequenceManifest,
    SequencePlayer, StageAnchors, Viewport,
};

#[derive(Parser, Debug)]
#[command(name = "filmstrip", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite the frame at a scroll position into a PNG.
    Scrub(ScrubArgs),
    /// Print the retained frame locators for a sequence.
    Locators(LocatorArgs),
}

#[derive(Parser, Debug)]
struct ScrubArgs {
    /// Directory containing the frame set.
    #[arg(long)]
    frames: PathBuf,

    /// Locator folder inside the frame directory (empty = flat).
    #[arg(long, default_value = "")]
    folder: String,

    /// Frame file name prefix.
    #[arg(long, default_value = "frame")]
    prefix: String,

    /// Frame file extension, without the dot.
    #[arg(long, default_value = "jpg")]
    ext: String,

    /// Number of frames in the sequence.
    #[arg(long)]
    count: u32,

    /// Scroll progress in [0, 1].
    #[arg(long, default_value_t = 0.0)]
    progress: f64,

    /// Viewport width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Viewport height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct LocatorArgs {
    /// Locator folder (empty = flat).
    #[arg(long, default_value = "")]
    folder: String,

    /// Frame file name prefix.
    #[arg(long, default_value = "frame")]
    prefix: String,

    /// Frame file extension, without the dot.
    #[arg(long, default_value = "jpg")]
    ext: String,

    /// Number of frames in the sequence.
    #[arg(long)]
    count: u32,

    /// Keep only every N-th frame (plus the final one).
    #[arg(long, default_value_t = 1)]
    stride: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Scrub(args) => run_scrub(args),
        Command::Locators(args) => run_locators(args),
    }
}

fn run_scrub(args: ScrubArgs) -> anyhow::Result<()> {
    let manifest = SequenceManifest::new(args.folder, args.prefix, args.ext, args.count)?;
    // Reduced motion snaps the easing so one tick lands on the exact target.
    let profile = HostProfile {
        viewport_width_px: args.width,
        save_data: false,
        connection: ConnectionClass::Unknown,
        reduced_motion: true,
    };

    let mut player = SequencePlayer::new(
        manifest,
        profile,
        StageAnchors::new("scroll-spacer", "stage"),
        RenderStrategy::Crossfade,
        Box::new(FsFrameFetcher::new(&args.frames)),
    )?;
    player.bind(Viewport::new(args.width, args.height, 1.0)?);

    let scroll_y = args.progress.clamp(0.0, 1.0) * player.scroll_extent();
    player.on_scroll(scroll_y);
    player.on_tick();

    let surface = player
        .surface()
        .context("cross-fade surface is unavailable")?;
    if !player.poster_superseded() {
        anyhow::bail!(
            "no frame could be composited at progress {} (target {})",
            args.progress,
            player.target_frame().0
        );
    }

    let image = image::RgbaImage::from_raw(
        surface.width(),
        surface.height(),
        surface.data().to_vec(),
    )
    .context("surface buffer has unexpected dimensions")?;
    image.save(&args.out).context("write output png")?;

    println!(
        "wrote {} ({}x{}, target frame {})",
        args.out.display(),
        surface.width(),
        surface.height(),
        player.target_frame().0
    );
    Ok(())
}

fn run_locators(args: LocatorArgs) -> anyhow::Result<()> {
    let manifest = SequenceManifest::new(args.folder, args.prefix, args.ext, args.count)?;
    let mapper = ScrollMapper::new(manifest.frame_count, args.stride.max(1));
    for slot in 0..mapper.grid_len() {
        if let Some(frame) = mapper.grid_index(slot) {
            println!("{:>6}  {}", frame.0, manifest.locator(frame));
        }
    }
    Ok(())
}
