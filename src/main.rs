use clap::{Parser, Subcommand};
use photo_ingest::format::{Format, supported_input_extensions};
use photo_ingest::imaging::{self, RustCodec, ThumbnailBounds};
use photo_ingest::ingest::{self, IngestSettings};
use photo_ingest::{config, logging, metadata, output};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "photo-ingest")]
#[command(about = "Extract photo metadata and build AVIF thumbnails")]
#[command(long_about = "\
Extract photo metadata and build AVIF thumbnails

For every photo, two independent results are derived:

  Metadata   GPS latitude/longitude (signed decimal degrees) and capture
             time (epoch milliseconds) from the EXIF block. Missing or
             corrupt fields are reported as null, never as an error.
  Thumbnail  the photo contain-fitted into a 480x854 box (configurable),
             encoded as AVIF, and wrapped in a base64 data: URL.

Supported inputs: .jpg .jpeg .png .avif (format is taken from the extension)

Run 'photo-ingest gen-config' to generate a documented config.toml.")]
#[command(version = env!("PHOTO_INGEST_VERSION"))]
struct Cli {
    /// Configuration file (missing file = stock defaults)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print GPS position and capture time as JSON
    Exif {
        /// Photo to inspect
        file: PathBuf,
    },
    /// Build an AVIF thumbnail; prints its data URL unless --out is given
    Thumbnail {
        /// Photo to thumbnail
        file: PathBuf,
        /// Write the AVIF bytes here instead of printing a data URL
        #[arg(long)]
        out: Option<PathBuf>,
        /// Override thumbnail.max_width
        #[arg(long)]
        max_width: Option<u32>,
        /// Override thumbnail.max_height
        #[arg(long)]
        max_height: Option<u32>,
    },
    /// Re-encode a photo into another format without resizing
    Convert {
        /// Source photo
        file: PathBuf,
        /// Target format: jpeg, png or avif
        #[arg(long)]
        to: Format,
        /// Output file
        #[arg(long)]
        out: PathBuf,
    },
    /// Ingest every supported photo under a directory
    Ingest {
        /// Directory to walk
        dir: PathBuf,
        /// Where to write the JSON manifest
        #[arg(long, default_value = "ingest-manifest.json")]
        manifest: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.json_logs);

    let load_config = || config::load_config(&cli.config);
    let codec = RustCodec::new();

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Exif { file } => {
            let bytes = std::fs::read(&file)?;
            let meta = metadata::extract(&bytes);
            println!("{}", serde_json::to_string_pretty(&meta)?);
        }
        Command::Thumbnail {
            file,
            out,
            max_width,
            max_height,
        } => {
            let config = load_config()?;
            let (format, bytes) = ingest::read_image(&file)?;
            let defaults = config.bounds();
            let bounds = ThumbnailBounds::new(
                max_width.unwrap_or(defaults.max_width),
                max_height.unwrap_or(defaults.max_height),
            );
            let thumb =
                imaging::make_thumbnail(&codec, &bytes, format, &bounds, &config.encode_settings())?;
            match out {
                Some(path) => {
                    write_output(&path, &thumb.bytes)?;
                    let dims = imaging::Dimensions {
                        width: thumb.width,
                        height: thumb.height,
                    };
                    println!(
                        "{}",
                        output::format_written(&file, &path, dims, thumb.bytes.len())
                    );
                }
                None => println!("{}", thumb.data_url),
            }
        }
        Command::Convert { file, to, out } => {
            let config = load_config()?;
            let (format, bytes) = ingest::read_image(&file)?;
            let grid = imaging::decode(&codec, format, &bytes)?;
            let converted = imaging::encode(&codec, to, &grid, &config.encode_settings())?;
            write_output(&out, &converted)?;
            println!(
                "{}",
                output::format_written(&file, &out, grid.dimensions(), converted.len())
            );
        }
        Command::Ingest { dir, manifest } => {
            let config = load_config()?;
            init_thread_pool(&config.processing);
            tracing::debug!(extensions = ?supported_input_extensions(), "scanning for photos");
            let settings = IngestSettings {
                bounds: config.bounds(),
                encode: config.encode_settings(),
            };
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_ingest_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = ingest::ingest_dir(&codec, &dir, &settings, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let result = result?;
            ingest::write_manifest(&result, &manifest)?;
            output::print_ingest_summary(&result);
            println!("Manifest: {}", manifest.display());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn write_output(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)
}
