use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use hookgen::config::{Config, DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR};
use hookgen::crop::Cropper;
use hookgen::images::{find_input_images, ImageCategory};
use hookgen::kling::{
    KlingClient, KlingError, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_MAX_ATTEMPTS,
    KLING_ACCESS_KEY_ENV, KLING_SECRET_KEY_ENV,
};
use hookgen::orchestrator::Orchestrator;
use hookgen::prompts::variants_for;
use hookgen::upload::UploadClient;

/// hookgen: bulk reaction video generation from portrait images
#[derive(Parser)]
#[command(name = "hookgen")]
#[command(version, about = "Bulk reaction video generation from portrait images")]
#[command(long_about = "Turns a folder of portrait images into short emotional \
    reaction clips via the Kling image-to-video API, then crops every result \
    to 9:16 with FFmpeg. Images whose filename contains \"crying\" get the \
    crying preset only; all others get the remaining four emotion presets.")]
#[command(after_help = "EXAMPLES:
    # Generate videos for every image in ./base-image
    hookgen generate

    # Custom input and output directories
    hookgen generate --input-dir portraits --output-dir clips

    # Use a config file for directories and poll tuning
    hookgen generate --config hookgen.toml

    # Show what would be generated without calling any API
    hookgen list-images

ENVIRONMENT:
    KLING_ACCESS_KEY    Required. Kling API access key.
    KLING_SECRET_KEY    Required. Kling API secret key.
    (both may be placed in a .env file)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate reaction videos for every image in the input directory
    Generate {
        /// Directory containing input images (png/jpg/jpeg/webp/bmp)
        #[arg(long, short = 'i')]
        input_dir: Option<PathBuf>,

        /// Directory generated videos are written to
        #[arg(long, short = 'o')]
        output_dir: Option<PathBuf>,

        /// Custom config file path (default: ./hookgen.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },

    /// List discovered input images and their selected emotion presets
    ListImages {
        /// Directory containing input images
        #[arg(long, short = 'i')]
        input_dir: Option<PathBuf>,

        /// Custom config file path (default: ./hookgen.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

/// Load .env file and check for Kling credentials
///
/// Loads environment variables from a .env file in the working directory.
/// Does not override existing environment variables.
fn load_env() {
    let _ = dotenv::dotenv();
}

/// Load config file, honoring an explicit --config path
fn load_config(explicit: Option<PathBuf>) -> Result<Config, String> {
    match explicit {
        Some(path) => Config::load_from_explicit(path).map_err(|e| e.to_string()),
        None => match Config::load() {
            Ok(c) => Ok(c),
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                eprintln!("Using default settings.\n");
                Ok(Config::default())
            }
        },
    }
}

/// Build the Kling client, translating missing credentials into setup help
fn build_kling_client() -> Result<KlingClient, String> {
    KlingClient::new().map_err(|e| match e {
        KlingError::MissingCredentials => format!(
            "{} / {} environment variables are not set.\n\n\
             Add your Kling API keys to a .env file:\n\
                 echo 'KLING_ACCESS_KEY=your-access-key' >> .env\n\
                 echo 'KLING_SECRET_KEY=your-secret-key' >> .env\n\n\
             Or set them as environment variables.",
            KLING_ACCESS_KEY_ENV, KLING_SECRET_KEY_ENV
        ),
        _ => format!("Failed to create Kling client: {}", e),
    })
}

/// Run the list-images subcommand
fn run_list_images(input_dir: Option<PathBuf>, config: Option<PathBuf>) -> Result<(), String> {
    let cfg = load_config(config)?;
    let input_dir = input_dir
        .or(cfg.paths.input_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIR));

    let images = find_input_images(&input_dir).map_err(|e| e.to_string())?;

    println!("Found {} images in {}:\n", images.len(), input_dir.display());
    for image in &images {
        let variants = variants_for(image.category);
        let labels: Vec<&str> = variants.iter().map(|v| v.label).collect();
        println!(
            "  {} ({} videos: {})",
            image.basename,
            variants.len(),
            labels.join(", ")
        );
    }
    Ok(())
}

/// Run the generate subcommand
fn run_generate(
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<(), String> {
    let cfg = load_config(config)?;

    // Merge settings: CLI args > config file > built-in defaults
    let input_dir = input_dir
        .or(cfg.paths.input_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIR));
    let output_dir = output_dir
        .or(cfg.paths.output_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let kling = build_kling_client()?;
    let upload = UploadClient::new().map_err(|e| format!("Failed to create upload client: {}", e))?;
    let cropper = Cropper::new();

    std::fs::create_dir_all(&output_dir)
        .map_err(|e| format!("Failed to create output directory: {}", e))?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to create async runtime: {}", e))?;

    rt.block_on(async {
        println!("API keys loaded");
        if cropper.is_available().await {
            println!("FFmpeg detected - videos will be cropped to 9:16");
        } else {
            println!("FFmpeg not found - videos will remain in 16:9 format");
            println!("Install FFmpeg to enable automatic cropping");
        }
        println!();

        println!("Scanning for images...");
        let images = find_input_images(&input_dir).map_err(|e| e.to_string())?;

        let crying_count = images
            .iter()
            .filter(|i| i.category == ImageCategory::Crying)
            .count();
        let standard_count = images.len() - crying_count;

        println!("Found {} images:", images.len());
        if standard_count > 0 {
            println!(
                "   - {} standard images (will generate 4 emotions each)",
                standard_count
            );
        }
        if crying_count > 0 {
            println!(
                "   - {} crying images (will generate 1 emotion each)",
                crying_count
            );
        }
        println!();

        let attempts = cfg
            .generation
            .poll_max_attempts
            .unwrap_or(DEFAULT_POLL_MAX_ATTEMPTS);
        let interval = cfg
            .generation
            .poll_interval_secs
            .map(std::time::Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL);
        let orchestrator = Orchestrator::new(kling, upload, cropper, output_dir)
            .with_poll_budget(attempts, interval);

        let summary = orchestrator.run_images(&images).await;

        println!();
        println!(
            "Generation Summary: {} successful, {} failed",
            summary.succeeded, summary.failed
        );
        if summary.cropped > 0 || summary.crop_failed > 0 {
            println!(
                "Cropping Summary: {} cropped to 9:16, {} crop failed",
                summary.cropped, summary.crop_failed
            );
        }
        println!("Video generation process completed!");

        Ok(())
    })
}

fn main() {
    // Load .env file before anything else
    load_env();

    let cli = Cli::parse();
    let start_time = Instant::now();

    match cli.command {
        Some(Commands::Generate {
            input_dir,
            output_dir,
            config,
        }) => {
            println!("hookgen - reaction video generation");
            println!("{}", "=".repeat(50));
            if let Err(e) = run_generate(input_dir, output_dir, config) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
            let minutes = start_time.elapsed().as_secs_f64() / 60.0;
            println!("\nAll tasks completed in {:.2} minutes.", minutes);
        }
        Some(Commands::ListImages { input_dir, config }) => {
            if let Err(e) = run_list_images(input_dir, config) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            // Show brief help when no command is provided
            println!("hookgen {}", env!("CARGO_PKG_VERSION"));
            println!("Bulk reaction video generation from portrait images\n");
            println!("USAGE:");
            println!("    hookgen <COMMAND>\n");
            println!("COMMANDS:");
            println!("    generate     Generate reaction videos for every input image");
            println!("    list-images  List discovered input images and their presets");
            println!("    help         Print this message or the help of a subcommand\n");
            println!("Run 'hookgen --help' for more details and examples.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_missing_explicit_is_error() {
        let result = load_config(Some(PathBuf::from("/nonexistent/hookgen.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_default_falls_back() {
        // No hookgen.toml in the test working directory is fine
        let result = load_config(None);
        assert!(result.is_ok());
    }

    #[test]
    fn test_env_var_accessible_after_dotenv() {
        // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
        let _ = dotenv::dotenv();
        let _result = std::env::var(KLING_ACCESS_KEY_ENV);
        // We just verify it doesn't panic - Ok or Err are both valid
    }

    #[test]
    fn test_build_kling_client_missing_keys_mentions_setup() {
        let original_ak = std::env::var(KLING_ACCESS_KEY_ENV).ok();
        let original_sk = std::env::var(KLING_SECRET_KEY_ENV).ok();

        std::env::remove_var(KLING_ACCESS_KEY_ENV);
        std::env::remove_var(KLING_SECRET_KEY_ENV);

        let result = build_kling_client();
        let message = result.unwrap_err();
        assert!(message.contains(KLING_ACCESS_KEY_ENV));
        assert!(message.contains(".env"));

        if let Some(val) = original_ak {
            std::env::set_var(KLING_ACCESS_KEY_ENV, val);
        }
        if let Some(val) = original_sk {
            std::env::set_var(KLING_SECRET_KEY_ENV, val);
        }
    }
}
