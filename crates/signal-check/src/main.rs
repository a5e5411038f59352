//! signal-check: run one signal generation from the command line.
//!
//! Uses the same environment configuration as the API server and prints the
//! signal record as JSON on stdout. Logs go to stderr.
//!
//! Usage:
//!   cargo run -p signal-check -- --ticker AAPL --post "to the moon" --post "bag holding"
//!   cargo run -p signal-check -- --ticker TSLA --posts-file posts.txt
//!
//! Exit status is 2 when the record carries an ERROR signal.

use analysis_core::Signal;
use anyhow::{bail, Context};
use signal_generator::SignalGenerator;

#[derive(Debug, Default, PartialEq)]
struct CheckArgs {
    ticker: String,
    posts: Vec<String>,
    posts_file: Option<String>,
}

fn parse_args(args: &[String]) -> anyhow::Result<CheckArgs> {
    let mut parsed = CheckArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--ticker" => {
                parsed.ticker = iter.next().context("--ticker needs a value")?.clone();
            }
            "--post" => {
                parsed.posts.push(iter.next().context("--post needs a value")?.clone());
            }
            "--posts-file" => {
                parsed.posts_file = Some(iter.next().context("--posts-file needs a path")?.clone());
            }
            other => bail!("unknown argument '{}'", other),
        }
    }

    if parsed.ticker.trim().is_empty() {
        bail!("--ticker is required");
    }
    Ok(parsed)
}

/// One post per line; blank lines are kept so they count toward the total.
fn read_posts(contents: &str) -> Vec<String> {
    contents.lines().map(str::to_string).collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signal_check=info,signal_generator=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let CheckArgs {
        ticker,
        mut posts,
        posts_file,
    } = parse_args(&args)?;

    if let Some(path) = posts_file {
        let contents = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read posts file {}", path))?;
        posts.extend(read_posts(&contents));
    }

    let generator = SignalGenerator::from_env()?;
    let record = generator.generate(&ticker, &posts).await;

    println!("{}", serde_json::to_string_pretty(&record)?);

    if record.signal == Signal::Error {
        tracing::error!("{}: {}", record.ticker, record.reason);
        std::process::exit(2);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let parsed = parse_args(&args(&[
            "--ticker", "aapl", "--post", "to the moon", "--post", "meh", "--posts-file", "p.txt",
        ]))
        .unwrap();

        assert_eq!(parsed.ticker, "aapl");
        assert_eq!(parsed.posts, vec!["to the moon", "meh"]);
        assert_eq!(parsed.posts_file.as_deref(), Some("p.txt"));
    }

    #[test]
    fn test_parse_args_requires_ticker() {
        assert!(parse_args(&args(&["--post", "hi"])).is_err());
        assert!(parse_args(&args(&["--ticker"])).is_err());
        assert!(parse_args(&args(&["--ticker", "AAPL", "--verbose"])).is_err());
    }

    #[test]
    fn test_read_posts_keeps_blank_lines() {
        assert_eq!(read_posts("one\n\ntwo\n"), vec!["one", "", "two"]);
    }
}
