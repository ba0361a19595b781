//! nvhot - NVIDIA GPU hotspot and VRAM temperature reader
//!
//! A command-line tool that prints core, junction and memory temperatures
//! for NVIDIA GPUs.

use clap::Parser;
use nvhot::cli::args::{generate_completions, Cli, Commands};
use nvhot::commands::{run_count, run_read, run_watch};
use nvhot::config::ConfigBuilder;
use nvhot::error::{AppError, NvmlError, SessionError};

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Set log level based on verbose flag
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    // Run the appropriate command
    let result = run(&cli);

    if let Err(e) = result {
        log::error!("{}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    if let Commands::Completions { shell } = &cli.command {
        generate_completions(*shell);
        return Ok(());
    }

    let interval = match &cli.command {
        Commands::Watch(args) => args.interval,
        _ => None,
    };

    let config = ConfigBuilder::new()
        .with_file(cli.config.as_deref())?
        .with_verbose(cli.verbose.then_some(true))
        .with_interval(interval)
        .with_gpu_index(cli.gpu)
        .build()?;

    if config.general.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    match &cli.command {
        Commands::Count => run_count(&config, cli.format),

        Commands::Read => run_read(&config, cli.format),

        Commands::Watch(args) => run_watch(args, &config, cli.format),

        Commands::Completions { .. } => Ok(()),
    }
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    match err {
        AppError::Session(SessionError::Privilege(_)) => {
            eprintln!();
            eprintln!("Hint: Reading GPU registers needs root. Try running with sudo.");
        }
        AppError::Session(SessionError::FacadeInit(NvmlError::LibraryNotFound)) => {
            eprintln!();
            eprintln!("Hint: Make sure the NVIDIA driver is installed.");
            eprintln!("      On Linux, install the nvidia-utils package.");
        }
        AppError::Session(SessionError::NoDevices) => {
            eprintln!();
            eprintln!("Hint: Make sure you have an NVIDIA GPU installed.");
            eprintln!("      Check 'nvidia-smi' for GPU detection.");
        }
        AppError::Session(SessionError::RegisterAccess { .. }) => {
            eprintln!();
            eprintln!("Hint: Register layouts are only known for GA10x GPUs.");
            eprintln!("      A kernel booted with iomem=strict also blocks /dev/mem.");
        }
        _ => {}
    }
}
