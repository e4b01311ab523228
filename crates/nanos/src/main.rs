mod builtins;

use std::path::PathBuf;
use std::process;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::Parser;
use log::error;
use nanos_core::kernel::constants::APP_NAME;
use nanos_core::{Boot, BootConfig, KernelError};

/// Nanos: a service bootstrap kernel
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Directory holding the service journal and credential files.
    /// Defaults to the current directory.
    #[arg(long, value_name = "PATH")]
    datadir: Option<PathBuf>,
}

// Unknown arguments exit with 1 before anything is bound; help and version
// keep clap's behaviour.
fn parse_args() -> CliArgs {
    match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) if e.kind() == ErrorKind::UnknownArgument => {
            let arg = match e.get(ContextKind::InvalidArg) {
                Some(ContextValue::String(arg)) => arg.clone(),
                _ => String::new(),
            };
            eprintln!("{}", KernelError::UnrecognizedArgument(arg));
            process::exit(1);
        }
        Err(e) => e.exit(),
    }
}

fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    if let Err(e) = env_logger::Builder::from_env(env).try_init() {
        eprintln!("Failed to initialize env_logger: {}", e);
    }
}

fn main() {
    let args = parse_args();
    init_logging();

    let data_dir = args.datadir.unwrap_or_default();
    println!("Starting {} Server", APP_NAME);
    println!("Datadir is {}", data_dir.display());

    let config = BootConfig::from_env(data_dir);
    let mut boot = Boot::new(config, builtins::producers()).with_routines(builtins::routines());
    if let Err(e) = boot.run() {
        error!("Boot stopped after phase {}", boot.phase());
        eprintln!("Fatal: {}", e);
        process::exit(1);
    }
}
