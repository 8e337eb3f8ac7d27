//! fontwatch — waits for font families to become usable for text layout.
//!
//! Runs the detector against a headless surface backed by cosmic-text.
//! Font files given with `--font` are registered while the detector polls,
//! optionally after a delay, which simulates a download finishing.
//!
//! Usage:
//!   fontwatch "Fira Sans" Lobster
//!   fontwatch Lobster --font ./Lobster.ttf@600 --no-system-fonts
//!   fontwatch Lobster --options '{"maxNumOfTries": 3, "tryIntervalMs": 100}'
//!
//! Prints `null` when every family loaded, otherwise the failure as JSON,
//! and exits with status 1.

use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use log::{error, info, warn};
use thiserror::Error;
use tokio::task::LocalSet;

use fontwatch_core::{on_fonts_load, ConfigError, WatchOptions, WatchResult};
use fontwatch_layout::{HeadlessSurface, LayoutError, SurfaceConfig};
use fontwatch_text::TextEngine;

#[derive(Debug, Error)]
enum CliError {
    #[error("Invalid options: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to build surface: {0}")]
    Layout(#[from] LayoutError),
    #[error("Failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// A font file to register, optionally after a delay.
#[derive(Clone, Debug, PartialEq)]
struct FontSource {
    path: PathBuf,
    delay: Duration,
}

impl FromStr for FontSource {
    type Err = String;

    /// `PATH` or `PATH@DELAY_MS`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, delay) = match s.rsplit_once('@') {
            Some((path, ms)) => {
                let ms: u64 = ms
                    .parse()
                    .map_err(|_| format!("invalid delay '{ms}' in '{s}'"))?;
                (path, Duration::from_millis(ms))
            }
            None => (s, Duration::ZERO),
        };
        if path.is_empty() {
            return Err(format!("missing path in '{s}'"));
        }
        Ok(Self {
            path: PathBuf::from(path),
            delay,
        })
    }
}

/// Wait until font families are available for text layout.
#[derive(Parser, Debug)]
#[command(name = "fontwatch")]
#[command(about = "Detect when font families become available for text layout")]
struct Args {
    /// Font families to watch
    families: Vec<String>,

    /// Font file to register, as PATH or PATH@DELAY_MS (repeatable)
    #[arg(long = "font", value_name = "PATH[@DELAY_MS]")]
    fonts: Vec<FontSource>,

    /// Poll ticks after the immediate check
    #[arg(long)]
    max_num_of_tries: Option<u32>,

    /// Milliseconds between poll ticks
    #[arg(long)]
    try_interval_ms: Option<u64>,

    /// Options as a JSON object; explicit flags take precedence
    #[arg(long, value_name = "JSON")]
    options: Option<String>,

    /// Start from an empty font database instead of the system fonts
    #[arg(long)]
    no_system_fonts: bool,
}

impl Args {
    fn watch_options(&self) -> Result<WatchOptions, ConfigError> {
        let mut options = match &self.options {
            Some(json) => WatchOptions::from_json(json)?,
            None => WatchOptions::default(),
        };
        if let Some(tries) = self.max_num_of_tries {
            options = options.with_max_num_of_tries(tries);
        }
        if let Some(ms) = self.try_interval_ms {
            options = options.with_try_interval_ms(ms);
        }
        Ok(options.normalized())
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(Ok(())) => {
            println!("null");
            ExitCode::SUCCESS
        }
        Ok(Err(not_loaded)) => {
            match serde_json::to_string(&not_loaded) {
                Ok(json) => println!("{json}"),
                Err(_) => println!("{not_loaded}"),
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{e}");
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> Result<WatchResult, CliError> {
    let options = args.watch_options()?;

    let engine = if args.no_system_fonts {
        TextEngine::empty()
    } else {
        TextEngine::new()
    };
    let surface = Rc::new(RefCell::new(HeadlessSurface::new(
        engine,
        SurfaceConfig::default(),
    )?));
    info!(
        "fontwatch: {} font faces available",
        surface.borrow().measurer().face_count()
    );

    // The callback and the shared surface are !Send.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let local = LocalSet::new();

    let result = local.block_on(&runtime, async move {
        for font in args.fonts {
            if font.delay.is_zero() {
                register(&surface, &font);
                continue;
            }
            let surface = surface.clone();
            tokio::task::spawn_local(async move {
                tokio::time::sleep(font.delay).await;
                register(&surface, &font);
            });
        }

        info!(
            "fontwatch: watching {:?} (tries={}, interval={}ms)",
            args.families, options.max_num_of_tries, options.try_interval_ms
        );
        let mut handle = surface.clone();
        on_fonts_load(
            &mut handle,
            args.families,
            |result| match &result {
                Ok(()) => info!("fontwatch: all fonts loaded"),
                Err(e) => warn!("fontwatch: {e}"),
            },
            Some(options),
        )
        .await
    });

    Ok(result)
}

fn register(surface: &Rc<RefCell<HeadlessSurface<TextEngine>>>, font: &FontSource) {
    let mut surface = surface.borrow_mut();
    match surface.measurer_mut().register_font_file(&font.path) {
        Ok(faces) => info!(
            "fontwatch: registered {} ({faces} faces) after {}ms",
            font.path.display(),
            font.delay.as_millis()
        ),
        Err(e) => error!("fontwatch: {}: {e}", font.path.display()),
    }
}

// ===================================================================
// Tests
// ===================================================================
