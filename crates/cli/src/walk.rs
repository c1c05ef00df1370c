//! Walk driver
//!
//! Wires the parsed arguments and config file into the traversal engine,
//! streams discovered records through the output formatter, and reports a
//! summary at the end. Per-prefix failures become warnings; only fatal setup
//! errors change the exit code.

use std::sync::Arc;

use serde::Serialize;

use sw_core::config::{Config, ConfigManager, Defaults};
use sw_core::path::parse_s3_path;
use sw_core::traits::{ObjectRecord, ObjectSink};
use sw_core::walker::{WalkConfig, WalkSummary, Walker};
use sw_s3::{ClientConfig, S3Client};

use crate::cli::Cli;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressSpinner};

/// Summary structure for JSON output
#[derive(Debug, Serialize)]
struct WalkOutput {
    objects: u64,
    prefixes: u64,
    bytes: u64,
    bytes_human: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failed: Vec<String>,
}

impl From<&WalkSummary> for WalkOutput {
    fn from(summary: &WalkSummary) -> Self {
        Self {
            objects: summary.objects,
            prefixes: summary.prefixes,
            bytes: summary.bytes,
            bytes_human: humansize::format_size(summary.bytes, humansize::BINARY),
            failed: summary.failed.clone(),
        }
    }
}

/// Sink that prints every discovery as it happens
struct PrintSink {
    formatter: Formatter,
    progress: ProgressSpinner,
}

impl ObjectSink for PrintSink {
    fn on_object(&self, record: ObjectRecord) {
        self.progress.inc(1);
        if self.formatter.is_json() {
            self.formatter.json_line(&record);
        } else if !self.formatter.is_quiet() {
            let date = record
                .last_modified
                .map(|d| d.strftime("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| " ".repeat(19));
            self.progress
                .println(&format!("[{date}] {:>10} {}", record.size_human, record.key));
        }
    }

    fn on_prefix(&self, prefix: &str) {
        // Prefixes only appear in human output; in JSON mode the summary
        // carries the count.
        if !self.formatter.is_json() && !self.formatter.is_quiet() {
            self.progress
                .println(&format!("[{}] {:>10} {}", " ".repeat(19), "DIR", prefix));
        }
    }
}

/// Resolve output settings: CLI flags win, unset flags fall back to the
/// config file's defaults
fn resolve_output(cli: &Cli, defaults: &Defaults) -> OutputConfig {
    OutputConfig {
        json: cli.json || defaults.output == "json",
        no_color: cli.no_color || !defaults.color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    }
}

/// Execute the walk described by the CLI arguments
pub async fn execute(cli: Cli) -> ExitCode {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            Formatter::new(resolve_output(&cli, &Defaults::default()))
                .error(&format!("Failed to load config: {e}"));
            return ExitCode::UsageError;
        }
    };

    let output_config = resolve_output(&cli, &config.defaults);
    let formatter = Formatter::new(output_config.clone());

    let path = match parse_s3_path(&cli.path) {
        Ok(path) => path,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError;
        }
    };

    let jobs = cli.jobs.unwrap_or(config.defaults.jobs);
    if jobs == 0 {
        formatter.error("--jobs must be at least 1");
        return ExitCode::UsageError;
    }
    let max_depth = cli.max_depth.unwrap_or(config.defaults.max_depth);

    let client_config = ClientConfig {
        endpoint_url: config.endpoint.url.clone(),
        region: config.endpoint.region.clone(),
        force_path_style: config.endpoint.force_path_style,
        access_key: config.credentials.as_ref().map(|c| c.access_key.clone()),
        secret_key: config.credentials.as_ref().map(|c| c.secret_key.clone()),
        max_connections: jobs,
    };

    let client = match S3Client::connect(client_config).await {
        Ok(client) => client,
        Err(e) => {
            formatter.error(&format!("Failed to create S3 client: {e}"));
            return ExitCode::NetworkError;
        }
    };

    tracing::info!(path = %path, jobs, max_depth, "starting walk");

    let walker = Walker::new(
        client,
        WalkConfig {
            workers: jobs,
            max_depth,
            retry: config.retry.clone(),
            max_keys: None,
        },
    );

    let sink = Arc::new(PrintSink {
        formatter: formatter.clone(),
        progress: ProgressSpinner::new(&output_config, "listing"),
    });
    let summary = walker.run(&path, sink.clone() as Arc<dyn ObjectSink>).await;
    sink.progress.finish_and_clear();

    report(&formatter, &summary);
    ExitCode::Success
}

fn load_config() -> sw_core::Result<Config> {
    let manager = ConfigManager::new()?;
    manager.load()
}

fn report(formatter: &Formatter, summary: &WalkSummary) {
    for path in &summary.failed {
        formatter.warning(&format!("failed to list {path} after retries"));
    }

    if formatter.is_json() {
        formatter.json(&WalkOutput::from(summary));
    } else {
        formatter.println(&format!(
            "\nTotal: {} objects, {} prefixes, {}",
            summary.objects,
            summary.prefixes,
            humansize::format_size(summary.bytes, humansize::BINARY)
        ));
        if !summary.failed.is_empty() {
            formatter.println(&format!(
                "{} prefix(es) could not be listed; see warnings above",
                summary.failed.len()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_output_from_summary() {
        let summary = WalkSummary {
            objects: 3,
            prefixes: 2,
            bytes: 4096,
            failed: vec!["bad/".into()],
        };
        let output = WalkOutput::from(&summary);
        assert_eq!(output.objects, 3);
        assert_eq!(output.bytes_human, "4 KiB");
        assert_eq!(output.failed, vec!["bad/".to_string()]);
    }

    fn quiet_cli(path: &str) -> Cli {
        Cli {
            path: path.into(),
            jobs: None,
            max_depth: None,
            json: false,
            no_color: true,
            no_progress: true,
            quiet: true,
            debug: false,
        }
    }

    #[tokio::test]
    async fn test_malformed_path_is_usage_error() {
        let code = execute(quiet_cli("bucket/no-scheme")).await;
        assert_eq!(code, ExitCode::UsageError);
    }

    #[test]
    fn test_config_output_is_the_fallback() {
        let mut cli = quiet_cli("s3://bucket/");
        cli.no_color = false;
        let defaults = Defaults {
            output: "json".into(),
            color: false,
            ..Defaults::default()
        };

        let resolved = resolve_output(&cli, &defaults);
        assert!(resolved.json);
        assert!(resolved.no_color);
    }

    #[test]
    fn test_cli_flags_override_config_output() {
        let mut cli = quiet_cli("s3://bucket/");
        cli.json = true;
        let defaults = Defaults::default(); // output "human", color on

        let resolved = resolve_output(&cli, &defaults);
        assert!(resolved.json);
        assert!(resolved.no_color, "the --no-color flag must win over config");
    }
}
