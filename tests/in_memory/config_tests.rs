//! Configuration loading and its effect on the composed marketplace.

use super::helpers::Campus;
use bidboard::{
    chat::services::{ChatError, SendMessageRequest},
    config::{ConfigError, LogFormat, MarketplaceConfig},
    marketplace::domain::UserId,
};
use camino::Utf8PathBuf;
use chrono::Duration;
use eyre::{bail, ensure};
use rstest::rstest;

const SHORT_EDIT_WINDOW: &str = r#"
[chat]
edit_window_minutes = 5

[logging]
level = "debug"
format = "json"
"#;

#[rstest]
fn partial_documents_keep_defaults() -> eyre::Result<()> {
    let config = MarketplaceConfig::from_toml_str(SHORT_EDIT_WINDOW)?;

    ensure!(config.chat.edit_window_minutes == 5);
    ensure!(config.chat.page_size == 50);
    ensure!(config.marketplace.budget_min == 50 && config.marketplace.budget_max == 2000);
    ensure!(config.logging.format == LogFormat::Json);
    Ok(())
}

#[rstest]
#[case("[marketplace]\nbudget_min = 500\nbudget_max = 100\n", "marketplace.budget_min")]
#[case("[scheduler]\nsweep_interval_secs = 0\n", "scheduler.sweep_interval_secs")]
#[case("[realtime]\ntyping_ttl_ms = 0\n", "realtime.typing_ttl_ms")]
fn invalid_values_name_their_field(#[case] raw: &str, #[case] expected: &str) -> eyre::Result<()> {
    let Err(ConfigError::Invalid { field, .. }) = MarketplaceConfig::from_toml_str(raw) else {
        bail!("{raw} should be rejected");
    };
    ensure!(field == expected);
    Ok(())
}

#[rstest]
fn configuration_loads_from_disk() -> eyre::Result<()> {
    let dir = std::env::temp_dir();
    let path = Utf8PathBuf::from_path_buf(dir.join(format!("bidboard-{}.toml", uuid::Uuid::new_v4())))
        .map_err(|raw| eyre::eyre!("temp path is not UTF-8: {}", raw.display()))?;
    std::fs::write(&path, SHORT_EDIT_WINDOW)?;

    let loaded = MarketplaceConfig::load(&path);
    std::fs::remove_file(&path)?;

    ensure!(loaded?.chat.edit_window_minutes == 5);
    Ok(())
}

#[rstest]
fn missing_file_is_a_read_error() {
    let result = MarketplaceConfig::load(camino::Utf8Path::new("/nonexistent/bidboard.toml"));
    assert!(matches!(result, Err(ConfigError::Read { .. })));
}

#[rstest]
#[tokio::test]
async fn configured_edit_window_is_enforced() -> eyre::Result<()> {
    let campus = Campus::with_config(&MarketplaceConfig::from_toml_str(SHORT_EDIT_WINDOW)?)?;
    let poster = UserId::new();
    let task_id = campus.assigned_task(poster, UserId::new()).await?;
    let chat = campus.market.chat();
    let message = chat
        .send_message(SendMessageRequest::new(task_id, poster, "Meet at the library"))
        .await?;

    campus.clock.advance(Duration::minutes(6));
    let result = chat
        .edit_message(message.id(), poster, "Meet at the café")
        .await;

    ensure!(matches!(result, Err(ChatError::Domain(_))));
    Ok(())
}
