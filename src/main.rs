//! CLI entry point for `mailpdf`.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};

use mailpdf::config::Config;
use mailpdf::convert::{convert_file, ConversionReport, InputFormat};

#[derive(Parser)]
#[command(name = "mailpdf", version, about = "Convert email messages and text files to PDF")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use this config file instead of the default location
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Print the conversion report as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an EML message, with its PDF and image attachments, to PDF
    Eml2pdf {
        input: PathBuf,
        output: PathBuf,
    },
    /// Convert a UTF-8 text file to PDF
    Txt2pdf {
        input: PathBuf,
        output: PathBuf,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = mailpdf::config::load_config(cli.config.as_deref());
    let config = loaded.config.clone();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);
    loaded.log();

    match cli.command {
        Commands::Eml2pdf { input, output } => {
            cmd_convert(InputFormat::Eml, &input, &output, &config, cli.json)
        }
        Commands::Txt2pdf { input, output } => {
            cmd_convert(InputFormat::Text, &input, &output, &config, cli.json)
        }
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let file_layer = config.general.log_file.as_deref().and_then(|path| {
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let name = path.file_name()?;
        std::fs::create_dir_all(dir).ok()?;
        let file_appender = tracing_appender::rolling::never(dir, name);
        Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_appender),
        )
    });

    // An `Option` layer is a no-op when `None`.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
}

/// Convert one file and print what was produced.
fn cmd_convert(
    format: InputFormat,
    input: &Path,
    output: &Path,
    config: &Config,
    json: bool,
) -> anyhow::Result<()> {
    let report = convert_file(format, input, output, config)?;

    if json {
        print_report_json(format, input, output, &report)?;
    } else {
        print_report(output, &report);
    }
    Ok(())
}

fn print_report(output: &Path, report: &ConversionReport) {
    use humansize::{format_size, BINARY};

    println!();
    println!("  {:<20} {}", "Output file", output.display());
    println!(
        "  {:<20} {}",
        "Output size",
        format_size(report.output_bytes as u64, BINARY)
    );
    println!("  {:<20} {}", "Paragraphs", report.paragraphs);
    println!("  {:<20} {}", "Text pages", report.body_pages);
    if report.attachment_pages > 0 {
        println!("  {:<20} {}", "PDF pages", report.attachment_pages);
    }
    if report.image_pages > 0 {
        println!("  {:<20} {}", "Image pages", report.image_pages);
    }
    if report.skipped_parts > 0 {
        println!("  {:<20} {}", "Skipped attachments", report.skipped_parts);
    }
    println!();
}

fn print_report_json(
    format: InputFormat,
    input: &Path,
    output: &Path,
    report: &ConversionReport,
) -> anyhow::Result<()> {
    let value = serde_json::json!({
        "format": format,
        "input": input.to_string_lossy(),
        "output": output.to_string_lossy(),
        "total_pages": report.total_pages(),
        "report": report,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mailpdf", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
