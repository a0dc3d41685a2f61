use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use umbrella_core::report::render;
use umbrella_core::{Engine, EngineConfig, ScanReport};

mod args;

/// Exit status when the scan itself could not be performed.
const EXIT_SCAN_FAILED: u8 = 2;

fn init_logging(args: &args::Args) -> Result<()> {
    // -v takes precedence; UMBRELLA_LOG can still tune individual targets.
    let env_filter = EnvFilter::builder()
        .with_default_directive(args.log_directive().parse()?)
        .with_env_var("UMBRELLA_LOG")
        .from_env()?
        .add_directive(args.log_directive().parse()?);

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter)
        .init();
    Ok(())
}

fn load_config(args: &args::Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(max) = args.max_scan_bytes {
        config.max_scan_bytes = max;
    }
    if let Some(jobs) = args.jobs {
        config.worker_threads = jobs;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: &args::Args) -> Result<ExitCode> {
    let config = load_config(args)?;
    debug!(?config, path = %args.path.display());

    let engine = Engine::new(config);
    engine.init()?;

    let report = if args.path.is_dir() {
        ScanReport::Directory(engine.scan_directory(&args.path)?)
    } else {
        ScanReport::File(engine.scan_file(&args.path)?)
    };
    engine.cleanup()?;

    let output = match args.format {
        args::OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        args::OutputFormat::Text => render::render_text(&report),
    };

    match &args.out {
        Some(path) => std::fs::write(path, &output)
            .with_context(|| format!("writing {}", path.display()))?,
        None => print!("{output}"),
    }

    let threats = report.summary().threats_found;
    Ok(if threats > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn main() -> ExitCode {
    let args = args::Args::parse();
    if let Err(err) = init_logging(&args) {
        eprintln!("error: {err:#}");
        return ExitCode::from(EXIT_SCAN_FAILED);
    }

    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_SCAN_FAILED)
        }
    }
}
