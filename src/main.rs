use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use trundle_core::blocks::BlockDocument;
use trundle_core::config::{LogMode, SimConfig};
use trundle_core::hardware::Hardware;
use trundle_core::variable::VariableStore;
use trundle_core::vm::Engine;
use trundle_core::{compiler, log_println, logger, serializer};

const GREETER_LOGO: &str = "
 ▄▄▄▄▄ ▄▄▄  ▄  ▄ ▄  ▄ ▄▄▄  ▄    ▄▄▄
   █   █  █ █  █ █▀▄█ █  █ █    █▄▄
   █   █▀▄▀ █▄▄█ █ ▀█ █▄▄▀ █▄▄▄ █▄▄
";

fn greeter() {
    log_println!("{}", GREETER_LOGO);
    log_println!("Version: {}\n", env!("CARGO_PKG_VERSION"));
}

/// Trundle: runs a serialized block program against the simulated vehicle.
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Trundle block-program simulator.",
    long_about = "Loads a serialized block-tree program, lowers it to its runtime form,\n\
        and executes it tick by tick against the simulated vehicle hardware."
)]
struct Cli {
    /// Serialized block-tree program file
    program: PathBuf,

    /// Number of ticks to run (overrides the config file)
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Fixed-step tick rate in Hz (overrides the config file)
    #[arg(long)]
    tick_hz: Option<f64>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the lowered program as JSON to this path
    #[arg(long)]
    emit_program: Option<PathBuf>,

    /// Print the live pin map before running
    #[arg(long)]
    show_pins: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = SimConfig::load(cli.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(ticks) = cli.ticks {
        config.ticks = ticks;
    }
    if let Some(tick_hz) = cli.tick_hz {
        config.tick_hz = tick_hz;
    }

    match config.log {
        LogMode::Standalone => logger::init_standalone(),
        LogMode::File => logger::init_file(),
        LogMode::Full => logger::init_full(),
    }

    greeter();

    let text = std::fs::read_to_string(&cli.program)
        .with_context(|| format!("failed to read {}", cli.program.display()))?;

    let mut document = BlockDocument::new();
    let mut registry = VariableStore::new();
    serializer::deserialize(&text, &mut document, &mut registry);
    log_println!(
        "Loaded {} top-level blocks, {} registered variables",
        document.blocks.len(),
        registry.len()
    );

    let program = compiler::lower_document(&document);

    if let Some(path) = &cli.emit_program {
        let json = program.to_json().context("failed to encode lowered program")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log_println!("Lowered program written to {}", path.display());
    }

    let mut hardware = Hardware::new();
    config.apply_pins(hardware.pin_map_mut());

    let mut engine = Engine::new(hardware);
    engine.load(program);

    if cli.show_pins {
        for (pin, function) in engine.hardware().pin_map().routes() {
            log_println!("  pin {:>3} -> {}", pin, function);
        }
    }

    let step = Duration::from_secs_f64(1.0 / config.tick_hz.max(1.0));
    for _ in 0..config.ticks {
        engine.tick();
        thread::sleep(step);
    }

    let report = engine.hardware().motor_report();
    log_println!(
        "Run finished after {} ticks: left motor {:+.3}, right motor {:+.3}",
        config.ticks,
        report.left_speed,
        report.right_speed
    );
    engine.stop();

    Ok(())
}
