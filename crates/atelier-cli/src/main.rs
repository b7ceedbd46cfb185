mod config;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use atelier_core::Stage;

#[derive(Parser)]
#[command(name = "atelier", about = "Generation backend for fashion product development")]
struct Cli {
    /// Google Cloud project id (overrides GOOGLE_CLOUD_PROJECT env var)
    #[arg(long, global = true)]
    project: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write an atelier config file
    Init {
        /// Cloud Storage HMAC access id
        #[arg(long)]
        hmac_access_id: String,
        /// Cloud Storage HMAC secret
        #[arg(long)]
        hmac_secret: String,
        /// Bucket generated images are uploaded to
        #[arg(long)]
        bucket: Option<String>,
        /// Vertex AI region
        #[arg(long)]
        location: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Run the HTTP server
    Serve {
        /// Address to bind to
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// List every routed endpoint
    Stages,
}

/// Execute the `atelier init` command: write config file.
fn cmd_init(
    project: Option<&str>,
    hmac_access_id: String,
    hmac_secret: String,
    bucket: Option<String>,
    location: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }
    let Some(project) = project else {
        bail!("--project is required for `atelier init`");
    };

    let cfg = config::ConfigFile {
        google: config::GoogleSection {
            project: Some(project.to_string()),
            location,
            ..Default::default()
        },
        storage: config::StorageSection {
            bucket,
            hmac_access_id: Some(hmac_access_id.clone()),
            hmac_secret: Some(hmac_secret),
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  google.project = {project}");
    println!("  storage.hmac_access_id = {hmac_access_id}");
    println!();
    println!("Next: run `atelier serve`.");

    Ok(())
}

fn cmd_stages() {
    for stage in Stage::ALL {
        println!("POST {:<42} {}", stage.path(), stage.display_name());
    }
    println!("POST {:<42} Regenerate images", serve_cmd::REGENERATE_IMAGES_PATH);
    println!("POST {:<42} Digital Brief", serve_cmd::SUMMARY_PATH);
    println!("POST {:<42} Key features", serve_cmd::KEY_FEATURES_PATH);
}

async fn cmd_serve(project: Option<&str>, bind: &str, port: u16) -> anyhow::Result<()> {
    let resolved = config::resolve(project)?;
    let studio =
        atelier_cloud::build_studio(&resolved).context("failed to set up cloud clients")?;
    serve_cmd::run_serve(studio, bind, port).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal outside development.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            hmac_access_id,
            hmac_secret,
            bucket,
            location,
            force,
        } => {
            cmd_init(
                cli.project.as_deref(),
                hmac_access_id,
                hmac_secret,
                bucket,
                location,
                force,
            )?;
        }
        Commands::Serve { bind, port } => {
            cmd_serve(cli.project.as_deref(), &bind, port).await?;
        }
        Commands::Stages => cmd_stages(),
    }

    Ok(())
}
