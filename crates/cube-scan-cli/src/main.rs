//! cube-scan CLI: scan cube faces from still images, manage calibration
//! profiles and validate facelet strings.

use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use cube_scan::color::ColorProfile;
use cube_scan::core::FrameView;
use cube_scan::state::validate;
use cube_scan::{interop, CubeColor, CubeState, ScanEvent, Scanner, ScannerParams};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "cube-scan")]
#[command(about = "Recognize a Rubik's cube face state from images (3x3 grid detection, Lab color classification, combinatorial validation)")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan six face images into a validated cube state.
    Scan(ScanArgs),

    /// Calibrate one color centroid from a reference face image.
    Calibrate(CalibrateArgs),

    /// Check a 54-character facelet string against cube invariants.
    Validate {
        /// Facelet string in U R F D L B face order, e.g. "UUUUUUUUURRR...".
        facelets: String,
    },
}

#[derive(Debug, Clone, Args)]
struct ScanArgs {
    /// Six face images, one per face, in any order.
    #[arg(num_args = 6, required = true)]
    images: Vec<PathBuf>,

    /// Calibration profile (JSON) produced by `calibrate`.
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Minimal Lab distance margin between the two nearest colors before a
    /// facelet counts as ambiguous.
    #[arg(long, default_value = "10.0")]
    min_separation: f32,

    /// Emit the full cube state as JSON instead of the facelet string.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Args)]
struct CalibrateArgs {
    /// Image of a face held uniformly in the given color.
    #[arg(long)]
    image: PathBuf,

    /// Which color the reference face shows.
    #[arg(long, value_enum)]
    color: ColorArg,

    /// Profile file to update (created when missing).
    #[arg(long)]
    profile: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorArg {
    White,
    Yellow,
    Red,
    Orange,
    Green,
    Blue,
}

impl ColorArg {
    fn to_core(self) -> CubeColor {
        match self {
            Self::White => CubeColor::White,
            Self::Yellow => CubeColor::Yellow,
            Self::Red => CubeColor::Red,
            Self::Orange => CubeColor::Orange,
            Self::Green => CubeColor::Green,
            Self::Blue => CubeColor::Blue,
        }
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let _ = cube_scan::core::init_with_level(level);

    match cli.command {
        Commands::Scan(args) => run_scan(&args),
        Commands::Calibrate(args) => run_calibrate(&args),
        Commands::Validate { facelets } => run_validate(&facelets),
    }
}

/// A scanner tuned for stills: no temporal confidence smoothing.
fn still_scanner(min_separation: f32) -> Scanner {
    let mut params = ScannerParams::default();
    params.gate_frames = 1;
    params.classifier.min_separation = min_separation;
    Scanner::new(params)
}

fn load_profile(path: &PathBuf) -> CliResult<ColorProfile> {
    let file = File::open(path)
        .map_err(|e| -> CliError { format!("cannot open profile {}: {e}", path.display()).into() })?;
    Ok(serde_json::from_reader(file)?)
}

// ── scan ───────────────────────────────────────────────────────────────

fn run_scan(args: &ScanArgs) -> CliResult<()> {
    let mut scanner = still_scanner(args.min_separation);
    if let Some(path) = &args.profile {
        *scanner.classifier_mut().profile_mut() = load_profile(path)?;
    }

    let mut completed: Option<CubeState> = None;
    for (n, path) in args.images.iter().enumerate() {
        let img = image::open(path)
            .map_err(|e| -> CliError { format!("cannot open {}: {e}", path.display()).into() })?
            .to_rgb8();
        // Stills are processed in place; no mailbox, no pixel copy.
        let view = FrameView {
            pixels: interop::rgb_view(&img),
            timestamp: Duration::from_secs(n as u64),
        };

        let recorded_before = scanner.snapshot().state.recorded.len();
        for event in scanner.process_frame(&view) {
            match event {
                ScanEvent::FaceRecorded { face } | ScanEvent::FaceReplaced { face } => {
                    log::info!("{}: recorded {face:?} face", path.display());
                }
                ScanEvent::Complete(state) => {
                    log::info!("{}: recorded final face", path.display());
                    completed = Some(state);
                }
                ScanEvent::DuplicateCenter { center, .. } => {
                    return Err(format!(
                        "{}: duplicate center {center:?}; this face was already scanned",
                        path.display()
                    )
                    .into());
                }
                ScanEvent::ValidationFailed(err) => {
                    return Err(format!("assembled state is not a valid cube: {err}").into());
                }
                ScanEvent::Calibrated { .. } => {}
            }
        }

        let snap = scanner.snapshot();
        if completed.is_none() && snap.state.recorded.len() == recorded_before {
            let detail = match snap.unresolved_in_view {
                Some(n) if n > 0 => format!("{n} facelet(s) too ambiguous to classify"),
                Some(_) => "face already recorded".to_string(),
                None => "no 3x3 face grid found".to_string(),
            };
            return Err(format!("{}: {detail}", path.display()).into());
        }
    }

    let state = completed.ok_or("fewer than six distinct faces were scanned")?;
    if args.json {
        let out = serde_json::json!({
            "facelets": state.to_facelet_string(),
            "state": state,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", state.to_facelet_string());
    }
    Ok(())
}

// ── calibrate ──────────────────────────────────────────────────────────

fn run_calibrate(args: &CalibrateArgs) -> CliResult<()> {
    let mut scanner = still_scanner(10.0);
    if args.profile.exists() {
        *scanner.classifier_mut().profile_mut() = load_profile(&args.profile)?;
    }

    let img = image::open(&args.image)
        .map_err(|e| -> CliError { format!("cannot open {}: {e}", args.image.display()).into() })?
        .to_rgb8();
    let view = FrameView {
        pixels: interop::rgb_view(&img),
        timestamp: Duration::ZERO,
    };

    let color = args.color.to_core();
    scanner.calibrate_next(color);
    let events = scanner.process_frame(&view);
    if !events.contains(&ScanEvent::Calibrated { color }) {
        return Err(format!(
            "{}: no 3x3 face grid found for calibration",
            args.image.display()
        )
        .into());
    }

    let file = File::create(&args.profile).map_err(|e| -> CliError {
        format!("cannot write profile {}: {e}", args.profile.display()).into()
    })?;
    serde_json::to_writer_pretty(file, scanner.classifier_mut().profile())?;
    println!(
        "calibrated {color:?} centroid, profile written to {}",
        args.profile.display()
    );
    Ok(())
}

// ── validate ───────────────────────────────────────────────────────────

fn run_validate(facelets: &str) -> CliResult<()> {
    let state = CubeState::from_facelet_string(facelets.trim())
        .ok_or("malformed facelet string: expected 54 characters from U R F D L B with distinct centers")?;

    match validate(&state) {
        Ok(()) => {
            println!("valid cube state");
            Ok(())
        }
        Err(err) => {
            let faces = err.offending_faces();
            if faces.is_empty() {
                Err(format!("invalid cube state: {err}").into())
            } else {
                Err(format!("invalid cube state: {err} (check faces {faces:?})").into())
            }
        }
    }
}
