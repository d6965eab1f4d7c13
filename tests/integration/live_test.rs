//! Live tests against a real Dremio instance.
//!
//! Skipped unless DREMIO_HOST is set and the `odbc` feature is enabled.

use dremio_runner::config::RunnerConfig;
use dremio_runner::DremioRunner;

/// Helper to create a runner from the environment.
///
/// Once DREMIO_HOST is set, failing to connect fails the test.
async fn get_live_runner() -> Option<DremioRunner> {
    std::env::var("DREMIO_HOST").ok()?;
    if !DremioRunner::enabled() {
        return None;
    }

    let mut config = RunnerConfig::default();
    config.apply_env_overrides();
    Some(
        DremioRunner::from_config(config)
            .await
            .expect("DREMIO_HOST is set but connecting to Dremio failed"),
    )
}

#[tokio::test]
async fn test_live_noop_query() {
    let Some(mut runner) = get_live_runner().await else {
        eprintln!("Skipping test: DREMIO_HOST not set or odbc feature disabled");
        return;
    };

    let result = runner.run_query("SELECT 1 AS one").await.unwrap();
    assert_eq!(result.columns.len(), 1);
    assert_eq!(result.rows.len(), 1);
}

#[tokio::test]
async fn test_live_syntax_error_is_diagnosed() {
    let Some(mut runner) = get_live_runner().await else {
        eprintln!("Skipping test: DREMIO_HOST not set or odbc feature disabled");
        return;
    };

    let err = runner.run_query("SELEC 1").await.unwrap_err();
    assert!(err.to_string().contains("DETAILS"), "got: {err}");
}
