use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hark")]
#[command(about = "Hark CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file. Fill in
    /// the provider identifiers (projectId, appId, messagingSenderId, ...)
    /// before running the worker; HARK_API_KEY supplies the api key at deploy time.
    Init {
        /// Config file path (default: HARK_CONFIG_PATH or ~/.hark/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the background message worker (delivery webhook + dispatch). Each
    /// delivered message is logged verbatim as a diagnostic record.
    Worker {
        /// Config file path (default: HARK_CONFIG_PATH or ~/.hark/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port for the delivery endpoint (default from config or 15353)
        #[arg(long, short)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("hark {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Worker { config, port }) => {
            if let Err(e) = run_worker(config, port).await {
                log::error!("worker failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let _dir = lib::init::init_config_dir(&path)?;
    println!(
        "initialized configuration at {}",
        path.parent().unwrap_or(std::path::Path::new(".")).display()
    );
    Ok(())
}

async fn run_worker(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.worker.port = p;
    }
    log::info!("starting worker on {}:{}", config.worker.bind, config.worker.port);
    lib::worker::run_worker(config, path).await
}
