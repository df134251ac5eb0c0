use clap::{Parser, Subcommand};
use phototree::library::Library;
use phototree::{config, output, roots, server, warm};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The root collections to expose.
#[derive(clap::Args, Clone)]
struct RootsArgs {
    /// A photo directory, or a JSON file mapping aliases to directories
    roots: PathBuf,
}

#[derive(Parser)]
#[command(name = "phototree")]
#[command(about = "Browse local photo collections over HTTP")]
#[command(long_about = "\
Browse local photo collections over HTTP

Directories are exposed under virtual paths. Pass a single directory to
expose it under its own name, or a JSON file naming several:

  {
    \"Bio\": \"/home/me/My Bio\",
    \"Travel\": \"/mnt/archive/travel\"
  }

  /Bio/2019/a.jpg     -> /home/me/My Bio/2019/a.jpg
  /data/<key>.jpg     -> thumbnail cache

Thumbnails are generated on first request and kept forever.

Run 'phototree gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Thumbnail cache directory (overrides cache.dir)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the roots over HTTP
    Serve {
        #[command(flatten)]
        roots: RootsArgs,
        /// Listen address (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
    },
    /// List a directory by virtual path
    Ls {
        #[command(flatten)]
        roots: RootsArgs,
        /// Virtual path, e.g. /Bio/2019
        virtual_path: String,
    },
    /// Create (or look up) one thumbnail and print its metadata
    Thumb {
        #[command(flatten)]
        roots: RootsArgs,
        /// Virtual path of an image
        virtual_path: String,
    },
    /// Pre-generate thumbnails for every image under the roots
    Warm {
        #[command(flatten)]
        roots: RootsArgs,
    },
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();
    let config_file = cli.config.as_deref();
    let cache_dir_flag = cli.cache_dir.as_deref();

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Serve { roots, bind } => {
            let (mut server_config, cache_dir) = load_settings(config_file, cache_dir_flag)?;
            if let Some(bind) = bind {
                server_config.server.bind = bind;
            }
            let bind = server_config.bind_addr()?;
            let library = open_library(&roots.roots, &cache_dir, &server_config)?;
            output::print_roots(library.roots());

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(
                bind,
                Arc::new(library),
                server_config.server.cors,
            ))?;
        }
        Command::Ls {
            roots,
            virtual_path,
        } => {
            let (server_config, cache_dir) = load_settings(config_file, cache_dir_flag)?;
            let library = open_library(&roots.roots, &cache_dir, &server_config)?;
            let entries = library.list(&virtual_path)?;
            output::print_listing(&virtual_path, &entries);
        }
        Command::Thumb {
            roots,
            virtual_path,
        } => {
            let (server_config, cache_dir) = load_settings(config_file, cache_dir_flag)?;
            let library = open_library(&roots.roots, &cache_dir, &server_config)?;
            let artifact = library.thumbnail(&virtual_path)?;
            let metadata = library.read_metadata(&artifact)?;
            output::print_metadata(&metadata, artifact.status);
        }
        Command::Warm { roots } => {
            let (server_config, cache_dir) = load_settings(config_file, cache_dir_flag)?;
            let library = open_library(&roots.roots, &cache_dir, &server_config)?;
            output::print_roots(library.roots());
            init_thread_pool(&server_config.processing);

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_warm_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let stats = warm::warm(&library, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            println!("Thumbnails: {}", stats);
        }
    }

    Ok(())
}

/// Config file (or defaults) plus the effective cache directory.
fn load_settings(
    config_file: Option<&Path>,
    cache_dir: Option<&Path>,
) -> Result<(config::ServerConfig, PathBuf), config::ConfigError> {
    let server_config = config::load_config(config_file)?;
    let cache_dir = match cache_dir {
        Some(dir) => dir.to_path_buf(),
        None => server_config.cache_dir()?,
    };
    Ok((server_config, cache_dir))
}

fn open_library(
    roots_arg: &Path,
    cache_dir: &Path,
    server_config: &config::ServerConfig,
) -> Result<Library, roots::RootsError> {
    let roots = roots::resolve_roots(roots_arg, cache_dir)?;
    Ok(Library::new(Arc::new(roots), server_config.thumbnail_config()))
}

/// Log to stderr so stdout stays clean for command output. `RUST_LOG`
/// overrides the default filter.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("phototree=info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
