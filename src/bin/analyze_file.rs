//! Analyze a local ToS file and print the report as JSON.
//!
//! Usage: analyze-file <path> [--html]

use anyhow::Context;
use terms_guardian::text::InputKind;
use terms_guardian::Analyzer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .context("usage: analyze-file <path> [--html]")?;
    let kind = match args.next().as_deref() {
        Some("--html") => InputKind::Html,
        Some(other) => anyhow::bail!("unknown flag `{other}`"),
        None => InputKind::Auto,
    };

    let input = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let analyzer = Analyzer::from_files()?;
    let report = analyzer.analyze_input(&input, kind).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
