use crate::config::Config;
use crate::fetch::{FetchResponse, Fetcher, Transport};
use crate::output::StatsWriter;
use crate::stats::{transform, BY_LOGIN_KEY, CONTRIBUTORS_COLUMNS_KEY};
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub contributors: usize,
    pub placed_in_columns: usize,
    pub output_path: PathBuf,
}

/// Fetch, rank and write. Nothing is written unless every earlier stage succeeds.
pub async fn run<T: Transport>(config: &Config, transport: T) -> Result<PipelineReport> {
    let fetcher = Fetcher::from_config(transport, &config.fetch);
    let writer = StatsWriter::from_config(&config.output);

    info!(
        "Fetching contributor stats for {} from {}",
        config.fetch.org,
        fetcher.endpoint()
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    spinner.set_message("Fetching data...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let response = fetcher.fetch(&config.fetch.payload()).await;
    spinner.finish_and_clear();

    let raw = match response.context("Failed to fetch contributor stats")? {
        FetchResponse::Json(value) => value,
        FetchResponse::Raw { content_type, body } => bail!(
            "Stats endpoint answered with {} ({} bytes) instead of JSON",
            content_type.as_deref().unwrap_or("no content type"),
            body.len()
        ),
    };

    let payload = transform(raw, &config.layout.column_sizes)
        .context("Stats response has an unexpected shape")?;
    let report = summarize(&payload, writer.path().to_path_buf());
    info!(
        "Ranked {} contributors, {} placed in {} columns",
        report.contributors,
        report.placed_in_columns,
        config.layout.column_sizes.len()
    );

    writer
        .write(&payload)
        .await
        .context("Failed to write stats file")?;

    Ok(report)
}

fn summarize(payload: &Value, output_path: PathBuf) -> PipelineReport {
    let contributors = payload[BY_LOGIN_KEY].as_object().map_or(0, |m| m.len());
    let placed_in_columns = payload[CONTRIBUTORS_COLUMNS_KEY]
        .as_array()
        .map_or(0, |columns| {
            columns
                .iter()
                .filter_map(Value::as_array)
                .map(Vec::len)
                .sum()
        });

    PipelineReport {
        contributors,
        placed_in_columns,
        output_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::{json_response, ScriptedTransport};
    use crate::fetch::{FetchError, RawResponse};
    use serde_json::json;

    fn config_writing_to(path: PathBuf) -> Config {
        let mut config = Config::default();
        config.output.path = path;
        config
    }

    #[tokio::test]
    async fn writes_ranked_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_data").join("github_stats.json");
        let transport = ScriptedTransport::repeating(json_response(
            r#"{"byLogin":{"alice":5,"bob":9,"carol":9}}"#,
        ));

        let report = run(&config_writing_to(path.clone()), transport)
            .await
            .unwrap();

        assert_eq!(
            report,
            PipelineReport {
                contributors: 3,
                placed_in_columns: 3,
                output_path: path.clone(),
            }
        );
        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            written,
            json!({
                "byLogin": { "bob": 9, "carol": 9, "alice": 5 },
                "contributorsColumns": [[["bob", 9], ["carol", 9], ["alice", 5]], [], [], []]
            })
        );
    }

    #[tokio::test]
    async fn contributors_beyond_column_capacity_stay_in_by_login() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_stats.json");
        let by_login: serde_json::Map<String, Value> = (0..60u64)
            .map(|i| (format!("user{:02}", i), json!(100 - i)))
            .collect();
        let body = json!({ "byLogin": by_login }).to_string();
        let transport = ScriptedTransport::repeating(json_response(&body));

        let report = run(&config_writing_to(path.clone()), transport)
            .await
            .unwrap();

        assert_eq!(report.contributors, 60);
        assert_eq!(report.placed_in_columns, 53);
        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["byLogin"].as_object().unwrap().len(), 60);
        let lengths: Vec<usize> = written["contributorsColumns"]
            .as_array()
            .unwrap()
            .iter()
            .map(|column| column.as_array().unwrap().len())
            .collect();
        assert_eq!(lengths, vec![12, 13, 14, 14]);
        assert_eq!(written["contributorsColumns"][3][13], json!(["user52", 48]));
    }

    #[tokio::test]
    async fn exhausted_retries_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_stats.json");
        let transport = ScriptedTransport::repeating(json_response("not json"));

        let err = run(&config_writing_to(path.clone()), transport)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<FetchError>(),
            Some(FetchError::RetriesExhausted { attempts: 4, .. })
        ));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn non_json_response_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_stats.json");
        let transport = ScriptedTransport::repeating(RawResponse {
            status: 502,
            content_type: Some("text/html".to_string()),
            body: b"<h1>Bad Gateway</h1>".to_vec(),
        });

        let err = run(&config_writing_to(path.clone()), transport)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("text/html"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn missing_by_login_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_stats.json");
        let transport = ScriptedTransport::repeating(json_response(r#"{"error":"unknown org"}"#));

        let result = run(&config_writing_to(path.clone()), transport).await;

        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn transport_failure_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_stats.json");
        let transport = ScriptedTransport::sequence(vec![Err(FetchError::Transport(
            "connection reset".to_string(),
        ))]);

        let err = run(&config_writing_to(path.clone()), transport)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<FetchError>(),
            Some(FetchError::Transport(_))
        ));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn unwritable_destination_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let transport = ScriptedTransport::repeating(json_response(r#"{"byLogin":{}}"#));

        let result = run(&config_writing_to(dir.path().to_path_buf()), transport).await;

        assert!(result.is_err());
    }
}
