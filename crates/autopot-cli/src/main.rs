mod cli;
mod input;
mod observer;

use std::sync::Arc;

use anyhow::{Context, Result};
use autopot_core::{
    Collaborators, ControlSignals, Settings, WindowsProcessProvider, WorkerConfig, WorkerHandle,
};
use clap::Parser;
use cli::Args;
use observer::ConsoleObserver;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = Settings::load_or_create(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let debug_logging = args.debug || settings.debug.developer_debug;
    init_logging(debug_logging);
    debug!("Loaded config from {}", args.config.display());

    let config = settings
        .worker_config()
        .with_context(|| format!("Invalid config in {}", args.config.display()))?;
    print_banner(&config, !args.disabled);

    let signals = Arc::new(ControlSignals::new(!args.disabled));

    let ctrlc_signals = Arc::clone(&signals);
    ctrlc::set_handler(move || {
        ctrlc_signals.request_shutdown();
    })
    .context("Failed to set Ctrl+C handler")?;

    let keyboard = input::spawn_keyboard_monitor(Arc::clone(&signals));

    let (tx, rx) = crossbeam_channel::unbounded();
    let worker = WorkerHandle::spawn(
        config,
        WindowsProcessProvider,
        Collaborators::system(tx),
        Arc::clone(&signals),
    )
    .context("Failed to start worker thread")?;

    // Returns once the worker exits and drops its sender
    let mut observer = ConsoleObserver::new();
    observer.run(&rx);

    let result = worker.join();
    signals.request_shutdown();
    if keyboard.join().is_err() {
        error!("Keyboard monitor panicked");
    }

    observer.print_summary();
    println!("Shutdown complete.");

    result.context("Worker stopped with an error")
}

fn init_logging(debug: bool) {
    let default_filter = if debug {
        "autopot=debug,autopot_core=debug"
    } else {
        "autopot=info,autopot_core=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn print_banner(config: &WorkerConfig, enabled: bool) {
    let hops = config
        .chain
        .hops
        .iter()
        .map(|h| format!("{:#X}", h))
        .collect::<Vec<_>>()
        .join(", ");

    println!("autopot v{}", env!("CARGO_PKG_VERSION"));
    println!("  Process   : {}", config.process_name);
    println!("  Window    : {}", config.window_title);
    println!(
        "  Pointer   : {}+{:#X} -> [{}]",
        config.chain.module_name, config.chain.base_offset, hops
    );
    println!(
        "  Potion    : key '{}', below {:.0}% of max HP, cooldown {:.2}s",
        config.potion_key,
        config.threshold_pct * 100.0,
        config.cooldown.as_secs_f64()
    );
    println!(
        "  Max HP    : rise after {:.1}s, any change after {:.1}s",
        config.quick_stable.as_secs_f64(),
        config.required_stable.as_secs_f64()
    );
    println!("  Auto potion starts {}", if enabled { "ON" } else { "OFF" });
    println!("Space/t: toggle   r: reset   Esc/q: quit");
}
