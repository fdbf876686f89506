//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::CaptureRequest;
use crate::domain::{Hertz, Pid};
use crate::flame::{ColorScheme, FrameStyle, RenderSpec};
use crate::folding::StackFormat;

#[derive(Parser, Debug)]
#[command(
    name = "usescope",
    version,
    about = "Capture CPU profiles and render them as flame graphs",
    after_help = "\
EXAMPLES:
    sudo usescope profile                              10s system-wide capture
    sudo usescope profile --pid 1234 --duration 30     Profile one process
    perf script | usescope fold --format perf > out.folded
    usescope render out.folded --output out.svg --color cold"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sample with the platform profiler, then fold and render
    Profile(ProfileArgs),
    /// Fold a raw profiler dump into collapsed stacks
    Fold(FoldArgs),
    /// Render collapsed stacks as an SVG flame graph
    Render(RenderArgs),
}

#[derive(clap::Args, Debug)]
pub struct ProfileArgs {
    /// Sampling window in seconds (0 is rounded up to 1)
    #[arg(short, long, default_value = "10")]
    pub duration: u64,

    /// Sampling frequency in Hz
    #[arg(short = 'F', long, default_value = "99")]
    pub frequency: u32,

    /// Process ID to profile (omit or 0 for system-wide)
    #[arg(short, long)]
    pub pid: Option<u32>,

    /// SVG output path
    #[arg(short, long, value_name = "FILE", default_value = "flamegraph.svg")]
    pub output: PathBuf,

    /// Folded stacks output path [default: output with .folded extension]
    #[arg(long, value_name = "FILE")]
    pub folded: Option<PathBuf>,

    /// Write a JSON run summary
    #[arg(long, value_name = "FILE")]
    pub summary: Option<PathBuf>,

    /// Demangle Rust symbols
    #[arg(long)]
    pub demangle: bool,

    #[command(flatten)]
    pub render: RenderOptions,
}

impl ProfileArgs {
    #[must_use]
    pub fn capture_request(&self) -> CaptureRequest {
        CaptureRequest::new(
            Duration::from_secs(self.duration),
            Hertz(self.frequency),
            Pid::from_arg(self.pid),
            self.output.clone(),
        )
    }

    #[must_use]
    pub fn folded_path(&self) -> PathBuf {
        self.folded.clone().unwrap_or_else(|| self.output.with_extension("folded"))
    }
}

#[derive(clap::Args, Debug)]
pub struct FoldArgs {
    /// Layout of the raw dump
    #[arg(short, long, value_enum)]
    pub format: StackFormat,

    /// Raw profiler output [default: stdin]
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Folded stacks output [default: stdout]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Demangle Rust symbols
    #[arg(long)]
    pub demangle: bool,
}

#[derive(clap::Args, Debug)]
pub struct RenderArgs {
    /// Folded stacks [default: stdin]
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// SVG output path
    #[arg(short, long, value_name = "FILE", default_value = "flamegraph.svg")]
    pub output: PathBuf,

    #[command(flatten)]
    pub render: RenderOptions,
}

/// Image options shared by `profile` and `render`.
#[derive(clap::Args, Debug)]
pub struct RenderOptions {
    /// Image title
    #[arg(long, default_value = crate::flame::svg::DEFAULT_TITLE)]
    pub title: String,

    /// Color scheme
    #[arg(long, value_enum, default_value_t = ColorScheme::Hot)]
    pub color: ColorScheme,

    /// Image width in pixels
    #[arg(long, default_value = "1200")]
    pub width: u32,

    /// Image height in pixels [default: derived from stack depth]
    #[arg(long)]
    pub height: Option<u32>,
}

impl RenderOptions {
    #[must_use]
    pub fn to_spec(&self) -> RenderSpec {
        RenderSpec {
            width: self.width,
            height: self.height,
            title: self.title.clone(),
            color_scheme: self.color,
            style: FrameStyle::default(),
        }
    }
}

/// `None` and `-` both mean the standard stream.
#[must_use]
pub fn is_stdio(path: Option<&Path>) -> bool {
    path.map_or(true, |p| p.as_os_str() == "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("usescope").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_profile_defaults() {
        let Command::Profile(profile) = parse(&["profile"]).command else {
            panic!("expected profile");
        };
        let request = profile.capture_request();
        assert_eq!(request.whole_seconds(), 10);
        assert_eq!(request.frequency(), Hertz(99));
        assert_eq!(request.pid(), None);
        assert_eq!(profile.folded_path(), PathBuf::from("flamegraph.folded"));
        assert_eq!(profile.render.to_spec(), RenderSpec::default());
    }

    #[test]
    fn test_profile_pid_zero_is_system_wide() {
        let Command::Profile(profile) = parse(&["profile", "--pid", "0", "-d", "0"]).command else {
            panic!("expected profile");
        };
        let request = profile.capture_request();
        assert_eq!(request.pid(), None);
        assert_eq!(request.whole_seconds(), 1);
    }

    #[test]
    fn test_render_options() {
        let args = parse(&[
            "render", "in.folded", "-o", "x.svg", "--color", "mem", "--width", "800", "--title", "db",
        ]);
        let Command::Render(render) = args.command else {
            panic!("expected render");
        };
        let spec = render.render.to_spec();
        assert_eq!(render.input, Some(PathBuf::from("in.folded")));
        assert_eq!(spec.color_scheme, ColorScheme::Mem);
        assert_eq!(spec.width, 800);
        assert_eq!(spec.title, "db");
    }

    #[test]
    fn test_fold_requires_format() {
        let result = Args::try_parse_from(["usescope", "fold", "raw.txt"]);
        assert!(result.is_err());
        let args = parse(&["fold", "--format", "dtrace", "-q"]);
        assert!(args.quiet);
        let Command::Fold(fold) = args.command else {
            panic!("expected fold");
        };
        assert_eq!(fold.format, StackFormat::DTrace);
        assert!(is_stdio(fold.input.as_deref()));
    }

    #[test]
    fn test_unknown_color_rejected() {
        assert!(Args::try_parse_from(["usescope", "render", "--color", "rainbow"]).is_err());
    }
}
