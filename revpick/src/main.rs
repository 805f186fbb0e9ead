use catalog::Mode;
use clap::{Parser, Subcommand};
use revpick::{render_failures, render_json, render_text, JobFile, OutputFormat};
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "revpick")]
#[command(about = "List a job's git revisions and tags as parameter choices")]
struct Cli {
    /// Job file describing the parameter and the job that owns it
    #[arg(short, long, global = true, default_value = "revpick.toml")]
    job: PathBuf,
    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List commit ids with author and date
    Revisions,
    /// List tag names
    Tags,
    /// List whatever the parameter's type selects
    Show,
    /// Print the parameter's default value
    Default,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let file = JobFile::load(&cli.job).await?;

    match cli.command {
        Commands::Revisions => print_catalog(&file, Some(Mode::Revision), cli.format).await?,
        Commands::Tags => print_catalog(&file, Some(Mode::Tag), cli.format).await?,
        Commands::Show => print_catalog(&file, None, cli.format).await?,
        Commands::Default => print_default(&file, cli.format)?,
    }

    Ok(())
}

/// Build and print one catalog; `None` uses the parameter's own mode
async fn print_catalog(
    file: &JobFile,
    mode: Option<Mode>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let builder = file.builder()?;
    let job = file.job();
    let mode = mode.unwrap_or(builder.parameter().mode);

    info!(job = %job.name, mode = %mode, "building catalog");
    let catalog = builder.build(Some(&job), mode).await;

    if let Some(message) = builder.error_message() {
        warn!(message = %message, "catalog could not be built");
    }

    match format {
        OutputFormat::Text => {
            print!("{}", render_text(&catalog));
            eprint!("{}", render_failures(&catalog));
        }
        OutputFormat::Json => {
            let value = render_json(builder.parameter(), mode, &catalog);
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}

fn print_default(file: &JobFile, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let parameter = file.parameter_definition()?;
    let value = parameter.default_value();

    match format {
        OutputFormat::Text => {
            if let Some(value) = value {
                println!("{}", value);
            }
        }
        OutputFormat::Json => {
            let value = json!({ "parameter": parameter.name, "default": value });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}
