//! Aligns one resume against one job description from the command line.
//!
//! Runs the same pipeline as `POST /align` without recording history.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use resume_aligner::alignment::export::to_markdown;
use resume_aligner::alignment::models::{
    AlignmentRequest, DEFAULT_ALIGNMENT_LEVEL, MAX_ALIGNMENT_LEVEL,
};
use resume_aligner::alignment::pipeline::AlignmentPipeline;
use resume_aligner::config::Config;
use resume_aligner::llm_client::GeminiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// The aligned result exactly as the API returns it.
    Json,
    /// Only the aligned resume, rendered as Markdown.
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "align", version, about = "Align a resume to a job description")]
struct Args {
    /// Resume text file, or `-` for stdin.
    #[arg(long)]
    resume: PathBuf,

    /// Job description text file, or `-` for stdin.
    #[arg(long)]
    job: PathBuf,

    /// Rewrite strength from 0 (conservative) to 100 (aggressive).
    #[arg(long, default_value_t = DEFAULT_ALIGNMENT_LEVEL,
          value_parser = clap::value_parser!(u8).range(0..=MAX_ALIGNMENT_LEVEL as i64))]
    level: u8,

    /// Template style hint passed to the model.
    #[arg(long)]
    template: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Write the output here instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_input(path: &Path, what: &str) -> Result<String> {
    if is_stdin(path) {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .with_context(|| format!("failed to read {what} from stdin"))?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {what} from {}", path.display()))
}

async fn run(args: Args) -> Result<ExitCode> {
    if is_stdin(&args.resume) && is_stdin(&args.job) {
        bail!("only one of --resume and --job can read from stdin");
    }

    let config = Config::from_env()?;

    let mut request = AlignmentRequest::new(
        read_input(&args.resume, "resume")?,
        read_input(&args.job, "job description")?,
        args.level,
    );
    if let Some(style) = args.template {
        request = request.with_template_style(style);
    }

    let generator = GeminiClient::new(
        config.gemini_api_key,
        config.gemini_api_base,
        config.attempt_timeout,
    )?;
    let pipeline = AlignmentPipeline::new(Arc::new(generator));

    let outcome = match pipeline.align(&request).await {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("error [{}]: {}", err.code(), err.user_message());
            return Ok(ExitCode::FAILURE);
        }
    };

    tracing::info!(
        style = %outcome.style,
        attempts = outcome.attempts.len(),
        "alignment finished"
    );

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&outcome.result)?,
        OutputFormat::Markdown => to_markdown(&outcome.result.aligned_resume),
    };

    match args.output {
        Some(path) => fs::write(&path, rendered + "\n")
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{rendered}"),
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("resume_aligner=warn,align=info")),
        )
        .with_writer(io::stderr)
        .init();

    match run(Args::parse()).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["align", "--resume", "r.txt", "--job", "j.txt"]).unwrap();
        assert_eq!(args.level, 50);
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.template.is_none());
        assert!(args.output.is_none());
    }

    #[test]
    fn test_level_out_of_range_rejected() {
        let parsed = Args::try_parse_from(["align", "--resume", "r", "--job", "j", "--level", "101"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_markdown_format_and_stdin_marker() {
        let args = Args::try_parse_from([
            "align", "--resume", "-", "--job", "j", "--format", "markdown", "--level", "0",
        ])
        .unwrap();
        assert_eq!(args.format, OutputFormat::Markdown);
        assert!(is_stdin(&args.resume));
        assert!(!is_stdin(&args.job));
    }
}
