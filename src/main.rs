use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use record_etl::app::load_use_case::LoadUseCase;
use record_etl::config::Config;
use record_etl::infra::{FileRecordSink, ReqwestDataSource};
use record_etl::observability;
use record_etl::pipeline::{Pipeline, Registry};

#[derive(Parser)]
#[command(name = "record_etl")]
#[command(about = "Extract, validate and load user and todo records")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML config file (defaults to etl.toml when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Base URL of the data source
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Directory for output files
    #[arg(long, global = true)]
    output_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run extract, transform and load
    Run,
    /// Run extract and transform only and print a summary
    Transform,
}

fn print_summary(registry: &Registry) {
    for (stage, result) in registry.iter() {
        println!("\n📊 Results for {}:", stage);
        println!("   Accepted: {}", result.accepted.len());
        println!("   Rejected: {}", result.rejected.len());
        for rejected in &result.rejected {
            println!("   - {} {}", rejected.record.display_id(), rejected.reason);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.source.base_url = base_url;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output.dir = output_dir;
    }

    let _log_guard = observability::init_logging(&config.logging);
    info!(base_url = %config.source.base_url, output_dir = %config.output.dir, "Configuration loaded");

    let source = ReqwestDataSource::new(&config.source.base_url, config.source.timeout_seconds)?;
    let pipeline = Pipeline::standard()?;

    println!("🚀 Running extract and transform...");
    let registry = pipeline.run(&source).await?;
    print_summary(&registry);

    match cli.command {
        Commands::Transform => {}
        Commands::Run => {
            println!("\n💾 Loading results into {}...", config.output.dir);
            let sink = FileRecordSink::new(&config.output.dir)?;
            let summary = LoadUseCase::with_default_plan(Box::new(sink)).load(&registry).await;

            for path in &summary.written {
                println!("   Wrote {}", path.display());
            }
            if !summary.failed.is_empty() {
                warn!("{} outputs failed during load", summary.failed.len());
                for (name, err) in &summary.failed {
                    error!(output = %name, "{}", err);
                    println!("   ⚠️  {}: {}", name, err);
                }
            }
            println!("✅ Pipeline completed");
        }
    }
    Ok(())
}
