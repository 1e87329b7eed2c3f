use std::time::Duration;

use anyhow::Result;
use ardor_logger::{
    LogArg, LogLevel, Logger, LoggerConfig, LoggerError,
    helpers::{FixedClock, InstantDelay, MemorySink, ScriptedTransport},
};
use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
use wasm_bindgen_test::wasm_bindgen_test;

struct Fixture {
    logger: Logger,
    transport: ScriptedTransport,
    delay: InstantDelay,
    sink: MemorySink,
}

fn remote_config() -> LoggerConfig {
    LoggerConfig {
        remote_enabled: true,
        min_remote_level: LogLevel::Warn,
        api_key: "k-123".into(),
        service_id: "svc".into(),
        max_buffer_size: 3,
        ..LoggerConfig::default()
    }
}

fn fixture(config: LoggerConfig, transport: ScriptedTransport) -> Result<Fixture> {
    let at: DateTime<Utc> = DateTime::parse_from_rfc3339("2024-05-01T12:30:00Z")?.into();
    let delay = InstantDelay::default();
    let sink = MemorySink::default();
    let logger = Logger::new(config)
        .with_transport(transport.clone())
        .with_delay(delay.clone())
        .with_sink(sink.clone())
        .with_clock(FixedClock(at));
    Ok(Fixture {
        logger,
        transport,
        delay,
        sink,
    })
}

fn submitted_messages(body: &str) -> Result<Vec<String>> {
    let body: Value = serde_json::from_str(body)?;
    Ok(body["logs"]
        .as_array()
        .map(|logs| {
            logs.iter()
                .filter_map(|entry| entry["message"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default())
}

#[cfg_attr(all(target_arch = "wasm32", target_os = "unknown"), wasm_bindgen_test)]
#[cfg_attr(not(all(target_arch = "wasm32", target_os = "unknown")), test)]
fn it_writes_formatted_lines_at_or_above_the_local_level() -> Result<()> {
    let Fixture { logger, sink, .. } = fixture(LoggerConfig::default(), ScriptedTransport::default())?;

    logger.debug("hidden");
    logger.info("booted");
    logger.log(
        LogLevel::Warn,
        "slow render",
        &[LogArg::from(json!({ "ms": 812 }))],
    );

    assert_eq!(
        sink.lines(),
        vec![
            (LogLevel::Info, "INFO: 2024-05-01T12:30:00.000Z - booted".to_string()),
            (
                LogLevel::Warn,
                r#"WARNING: 2024-05-01T12:30:00.000Z - slow render {"ms":812}"#.to_string()
            ),
        ]
    );
    Ok(())
}

#[cfg_attr(all(target_arch = "wasm32", target_os = "unknown"), wasm_bindgen_test)]
#[cfg_attr(not(all(target_arch = "wasm32", target_os = "unknown")), test)]
fn it_writes_nothing_while_disabled() -> Result<()> {
    let Fixture { logger, sink, .. } = fixture(remote_config(), ScriptedTransport::default())?;

    logger.set_enabled(false);
    logger.error("lost");

    assert!(sink.lines().is_empty());
    assert_eq!(logger.buffer_size(), 0);
    Ok(())
}

#[cfg_attr(all(target_arch = "wasm32", target_os = "unknown"), wasm_bindgen_test)]
#[cfg_attr(not(all(target_arch = "wasm32", target_os = "unknown")), test)]
fn it_buffers_only_lines_at_or_above_the_remote_level() -> Result<()> {
    let Fixture { logger, .. } = fixture(remote_config(), ScriptedTransport::default())?;

    logger.info("local only");
    logger.warn("buffered");
    assert_eq!(logger.buffer_size(), 1);

    logger.set_remote_level(LogLevel::Info);
    logger.info("buffered too");
    assert_eq!(logger.buffer_size(), 2);

    logger.set_remote_enabled(false);
    logger.error("not buffered");
    assert_eq!(logger.buffer_size(), 2);
    Ok(())
}

#[cfg_attr(all(target_arch = "wasm32", target_os = "unknown"), wasm_bindgen_test)]
#[cfg_attr(not(all(target_arch = "wasm32", target_os = "unknown")), tokio::test)]
async fn it_submits_buffered_entries_in_one_batch() -> Result<()> {
    let Fixture {
        logger, transport, ..
    } = fixture(remote_config(), ScriptedTransport::default())?;
    logger.warn("first");
    logger.error("second");

    logger.flush().await?;

    let submissions = transport.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(
        submissions[0].endpoint,
        "/_debug/api/v1/services/svc/logs/submit"
    );
    assert_eq!(submissions[0].api_key, "k-123");
    let body: Value = serde_json::from_str(&submissions[0].body)?;
    assert_eq!(
        body,
        json!({
            "logs": [
                { "message": "first", "log_level": "warning", "timestamp": 1_714_566_600 },
                { "message": "second", "log_level": "error", "timestamp": 1_714_566_600 },
            ]
        })
    );
    assert_eq!(logger.buffer_size(), 0);
    Ok(())
}

#[cfg_attr(all(target_arch = "wasm32", target_os = "unknown"), wasm_bindgen_test)]
#[cfg_attr(not(all(target_arch = "wasm32", target_os = "unknown")), tokio::test)]
async fn it_does_not_submit_an_empty_buffer() -> Result<()> {
    let Fixture {
        logger, transport, ..
    } = fixture(remote_config(), ScriptedTransport::default())?;

    logger.flush().await?;

    assert!(transport.submissions().is_empty());
    Ok(())
}

#[cfg_attr(all(target_arch = "wasm32", target_os = "unknown"), wasm_bindgen_test)]
#[cfg_attr(not(all(target_arch = "wasm32", target_os = "unknown")), tokio::test)]
async fn it_backs_off_exponentially_while_rate_limited() -> Result<()> {
    let Fixture {
        logger,
        transport,
        delay,
        ..
    } = fixture(
        remote_config(),
        ScriptedTransport::answering([
            Ok(429),
            Err(LoggerError::Transport("offline".into())),
            Ok(204),
        ]),
    )?;
    logger.error("eventually delivered");

    logger.flush().await?;

    assert_eq!(transport.submissions().len(), 3);
    assert_eq!(
        delay.waits(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
    assert_eq!(logger.buffer_size(), 0);
    Ok(())
}

#[cfg_attr(all(target_arch = "wasm32", target_os = "unknown"), wasm_bindgen_test)]
#[cfg_attr(not(all(target_arch = "wasm32", target_os = "unknown")), tokio::test)]
async fn it_requeues_the_batch_after_exhausting_retries() -> Result<()> {
    let Fixture {
        logger,
        transport,
        delay,
        ..
    } = fixture(
        remote_config(),
        ScriptedTransport::answering([Ok(429), Ok(429), Ok(429), Ok(429)]),
    )?;
    logger.error("a");
    logger.error("b");

    let result = logger.flush().await;

    assert_eq!(result, Err(LoggerError::RateLimited));
    assert_eq!(transport.submissions().len(), 4);
    assert_eq!(delay.waits().len(), 3);
    assert_eq!(logger.buffer_size(), 2);

    logger.flush().await?;
    let submissions = transport.submissions();
    let Some(retry) = submissions.last() else {
        panic!("expected a second delivery");
    };
    assert_eq!(submitted_messages(&retry.body)?, vec!["a", "b"]);
    Ok(())
}

#[cfg_attr(all(target_arch = "wasm32", target_os = "unknown"), wasm_bindgen_test)]
#[cfg_attr(not(all(target_arch = "wasm32", target_os = "unknown")), tokio::test)]
async fn it_gives_up_at_once_when_rejected() -> Result<()> {
    let Fixture {
        logger,
        transport,
        delay,
        ..
    } = fixture(remote_config(), ScriptedTransport::answering([Ok(400)]))?;
    logger.error("malformed?");

    let result = logger.flush().await;

    assert_eq!(result, Err(LoggerError::Rejected(400)));
    assert_eq!(transport.submissions().len(), 1);
    assert!(delay.waits().is_empty());
    assert_eq!(logger.buffer_size(), 1);
    Ok(())
}

#[cfg_attr(all(target_arch = "wasm32", target_os = "unknown"), wasm_bindgen_test)]
#[cfg_attr(not(all(target_arch = "wasm32", target_os = "unknown")), tokio::test)]
async fn it_keeps_the_newest_entries_when_requeueing_overflows() -> Result<()> {
    let Fixture { logger, .. } = fixture(
        remote_config(),
        ScriptedTransport::answering([Ok(500)]),
    )?;
    logger.error("a");
    logger.error("b");
    logger.error("c");

    let _ = logger.flush().await;
    logger.error("d");

    assert_eq!(logger.buffer_size(), 3);
    Ok(())
}

#[cfg_attr(all(target_arch = "wasm32", target_os = "unknown"), wasm_bindgen_test)]
#[cfg_attr(not(all(target_arch = "wasm32", target_os = "unknown")), test)]
fn it_beacons_the_buffer_with_the_key_in_the_query() -> Result<()> {
    let Fixture {
        logger, transport, ..
    } = fixture(remote_config(), ScriptedTransport::default())?;
    logger.error("leaving");

    logger.flush_sync()?;

    let beacons = transport.beacons();
    assert_eq!(beacons.len(), 1);
    assert_eq!(
        beacons[0].0,
        "/_debug/api/v1/services/svc/logs/submit?api_key=k-123"
    );
    assert_eq!(submitted_messages(&beacons[0].1)?, vec!["leaving"]);
    assert_eq!(logger.buffer_size(), 0);
    Ok(())
}

#[cfg_attr(all(target_arch = "wasm32", target_os = "unknown"), wasm_bindgen_test)]
#[cfg_attr(not(all(target_arch = "wasm32", target_os = "unknown")), tokio::test)]
async fn it_drops_batches_without_credentials() -> Result<()> {
    let config = LoggerConfig {
        api_key: String::new(),
        ..remote_config()
    };
    let Fixture {
        logger, transport, ..
    } = fixture(config, ScriptedTransport::default())?;
    logger.error("nowhere to go");

    logger.flush().await?;
    logger.flush_sync()?;

    assert!(transport.submissions().is_empty());
    assert!(transport.beacons().is_empty());
    assert_eq!(logger.buffer_size(), 0);
    Ok(())
}

#[cfg_attr(all(target_arch = "wasm32", target_os = "unknown"), wasm_bindgen_test)]
#[cfg_attr(not(all(target_arch = "wasm32", target_os = "unknown")), tokio::test)]
async fn it_stops_the_flush_loop_on_shutdown() -> Result<()> {
    let Fixture { logger, delay, .. } = fixture(remote_config(), ScriptedTransport::default())?;

    logger.shutdown();
    logger.run().await;

    assert!(delay.waits().is_empty());
    Ok(())
}
