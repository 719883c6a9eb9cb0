use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framestitch::{
    AssemblyOptions, AssemblySummary, ColorMode, DEFAULT_FRAME_RATE, DEFAULT_OUTPUT_PATH,
    FailurePolicy, FfmpegLogLevel, FourCc, FrameSize, Interpolation, ProgressCallback,
    ProgressInfo, VideoProbe,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framestitch\n  framestitch frames out/pathfinding.mp4 --progress\n  framestitch frames run.mp4 --fps 60 --size 800x800 --codec avc1\n  framestitch frames run.mp4 --json --verify\n  framestitch completions zsh > _framestitch\n  framestitch ./completions   (a frame directory named like the subcommand)";

#[derive(Debug, Parser)]
#[command(
    name = "framestitch",
    version,
    about = "Stitch numbered PNG frames (0.png, 1.png, ...) into an MP4 video",
    after_help = CLI_AFTER_HELP,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    assemble: AssembleArgs,
}

#[derive(Debug, Args)]
struct AssembleArgs {
    /// Directory containing <integer>.png frames.
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Output video path (overwritten if it exists).
    #[arg(default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Frames per second.
    #[arg(long, default_value_t = DEFAULT_FRAME_RATE)]
    fps: u32,

    /// Frame size as WIDTHxHEIGHT.
    #[arg(long, default_value = "400x400")]
    size: FrameSize,

    /// Four-character codec code (mp4v, avc1, hev1, MJPG, ...).
    #[arg(long, default_value = "mp4v")]
    codec: FourCc,

    /// Target bitrate in bits per second.
    #[arg(long)]
    bitrate: Option<usize>,

    /// Write grayscale frames instead of colour.
    #[arg(long)]
    grayscale: bool,

    /// Resize filter (nearest-exact, nearest, bilinear, bicubic, lanczos).
    #[arg(long, default_value = "nearest-exact")]
    interpolation: String,

    /// Delete the partial video if a frame fails.
    #[arg(long)]
    discard_on_error: bool,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,

    /// Show debug logging.
    #[arg(long)]
    verbose: bool,

    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,

    /// Re-open the output and check its frame count and size.
    #[arg(long)]
    verify: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, default_value = "error")]
    log_level: String,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_interpolation(value: &str) -> Option<Interpolation> {
    match value.to_ascii_lowercase().as_str() {
        "nearest-exact" | "nearest_exact" | "exact" => Some(Interpolation::NearestExact),
        "nearest" => Some(Interpolation::Nearest),
        "bilinear" | "linear" | "triangle" => Some(Interpolation::Triangle),
        "bicubic" | "cubic" | "catmull-rom" => Some(Interpolation::CatmullRom),
        "lanczos" | "lanczos3" => Some(Interpolation::Lanczos3),
        _ => None,
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose { "framestitch=debug" } else { "framestitch=warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp(None)
        .try_init();
}

/// Feeds library progress into an indicatif bar.
struct TerminalProgress {
    bar: ProgressBar,
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_length(info.total);
        self.bar.set_position(info.current);
        if let Some(name) = info.current_path.as_deref().and_then(Path::file_name) {
            self.bar.set_message(name.to_string_lossy().into_owned());
        }
    }
}

fn build_options(
    args: &AssembleArgs,
    progress: Option<Arc<TerminalProgress>>,
) -> Result<AssemblyOptions, Box<dyn std::error::Error>> {
    let interpolation = parse_interpolation(&args.interpolation)
        .ok_or(format!("unsupported --interpolation: {}", args.interpolation))?;

    let mut options = AssemblyOptions::new()
        .with_source_dir(&args.dir)
        .with_output_path(&args.output)
        .with_frame_rate(args.fps)
        .with_frame_size(args.size)
        .with_codec(args.codec)
        .with_interpolation(interpolation);

    if args.grayscale {
        options = options.with_color_mode(ColorMode::Grayscale);
    }
    if let Some(bitrate) = args.bitrate {
        options = options.with_bit_rate(bitrate);
    }
    if args.discard_on_error {
        options = options.with_failure_policy(FailurePolicy::Discard);
    }
    if let Some(progress) = progress {
        options = options.with_progress(progress);
    }
    Ok(options)
}

fn verify(summary: &AssemblySummary) -> Result<(), Box<dyn std::error::Error>> {
    let frame_count = VideoProbe::frame_count(&summary.output_path)?;
    if frame_count != summary.frames_written {
        return Err(format!(
            "verification failed: expected {} frame(s), found {frame_count}",
            summary.frames_written
        )
        .into());
    }
    if frame_count == 0 {
        return Ok(());
    }

    let info = VideoProbe::probe(&summary.output_path)?;
    if info.width != summary.frame_size.width || info.height != summary.frame_size.height {
        return Err(format!(
            "verification failed: expected {}, found {}x{}",
            summary.frame_size, info.width, info.height
        )
        .into());
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "framestitch", &mut std::io::stdout());
        return Ok(());
    }

    let args = cli.assemble;
    init_logging(args.verbose);

    let level = FfmpegLogLevel::from_name(&args.log_level)
        .ok_or(format!("unsupported --log-level: {}", args.log_level))?;
    framestitch::set_ffmpeg_log_level(level);

    let progress = if args.progress {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Some(Arc::new(TerminalProgress { bar }))
    } else {
        None
    };

    let options = build_options(&args, progress.clone())?;
    let result = framestitch::assemble(&options);

    if let Some(progress) = &progress {
        progress.bar.finish_and_clear();
    }
    let summary = result?;

    if args.verify {
        verify(&summary)?;
    }

    if args.json {
        let payload = json!({
            "output": summary.output_path.display().to_string(),
            "frames": summary.frames_written,
            "width": summary.frame_size.width,
            "height": summary.frame_size.height,
            "fps": summary.frame_rate,
            "codec": summary.codec.to_string(),
            "elapsed_seconds": summary.elapsed.as_secs_f64(),
            "verified": args.verify,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!(
            "{} {}",
            "success:".green().bold(),
            format!(
                "Wrote {} frame(s) to {} ({}, {} fps, {})",
                summary.frames_written,
                summary.output_path.display(),
                summary.frame_size,
                summary.frame_rate,
                summary.codec,
            )
            .green()
        );
        if args.verify {
            println!("{} output re-opened cleanly", "verified:".cyan().bold());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_interpolation_aliases() {
        assert_eq!(parse_interpolation("nearest-exact"), Some(Interpolation::NearestExact));
        assert_eq!(parse_interpolation("NEAREST"), Some(Interpolation::Nearest));
        assert_eq!(parse_interpolation("bilinear"), Some(Interpolation::Triangle));
        assert_eq!(parse_interpolation("bicubic"), Some(Interpolation::CatmullRom));
        assert_eq!(parse_interpolation("lanczos"), Some(Interpolation::Lanczos3));
        assert_eq!(parse_interpolation("area"), None);
    }

    #[test]
    fn defaults_match_library_defaults() {
        let cli = Cli::try_parse_from(["framestitch"]).expect("parse");
        assert!(cli.command.is_none());
        let options = build_options(&cli.assemble, None).expect("options");
        let defaults = AssemblyOptions::default();

        assert_eq!(options.source_dir(), defaults.source_dir());
        assert_eq!(options.output_path(), defaults.output_path());
        assert_eq!(options.writer(), defaults.writer());
        assert_eq!(options.interpolation(), defaults.interpolation());
    }

    #[test]
    fn positional_paths_and_flags() {
        let cli = Cli::try_parse_from([
            "framestitch",
            "frames",
            "out.mp4",
            "--fps",
            "24",
            "--size",
            "640x480",
            "--codec",
            "avc1",
            "--grayscale",
            "--discard-on-error",
        ])
        .expect("parse");
        let options = build_options(&cli.assemble, None).expect("options");

        assert_eq!(options.source_dir(), Path::new("frames"));
        assert_eq!(options.output_path(), Path::new("out.mp4"));
        assert_eq!(options.writer().frame_rate, 24);
        assert_eq!(options.writer().frame_size, FrameSize::new(640, 480));
        assert_eq!(options.writer().codec, FourCc::AVC1);
        assert_eq!(options.writer().color_mode, ColorMode::Grayscale);
        assert_eq!(options.failure_policy(), FailurePolicy::Discard);
    }

    #[test]
    fn rejects_malformed_size_and_codec() {
        assert!(Cli::try_parse_from(["framestitch", "--size", "400"]).is_err());
        assert!(Cli::try_parse_from(["framestitch", "--codec", "mpeg4"]).is_err());
    }

    #[test]
    fn directory_named_like_subcommand_needs_a_path_prefix() {
        let cli = Cli::try_parse_from(["framestitch", "./completions"]).expect("parse");
        assert!(cli.command.is_none());
        assert_eq!(cli.assemble.dir, Path::new("./completions"));
        assert!(CLI_AFTER_HELP.contains("./completions"));
    }

    #[test]
    fn completions_subcommand() {
        let cli = Cli::try_parse_from(["framestitch", "completions", "bash"]).expect("parse");
        assert!(matches!(cli.command, Some(Commands::Completions { shell: Shell::Bash })));
    }
}
