use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::{
    sync::mpsc::UnboundedReceiver,
    task::JoinHandle,
    time::{interval, Duration, Interval, MissedTickBehavior},
};
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    status::{parse_status_payload, StatusRecord},
    store::StatusStore,
};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub enum PollerCommand {
    CheckNow,
    Apply(AppConfig),
}

pub fn spawn_status_poller(
    config: AppConfig,
    store: Arc<StatusStore>,
    commands: UnboundedReceiver<PollerCommand>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        run_poll_loop(config, store, commands).await;
    })
}

async fn run_poll_loop(
    mut config: AppConfig,
    store: Arc<StatusStore>,
    mut commands: UnboundedReceiver<PollerCommand>,
) {
    let client = match reqwest::Client::builder().timeout(FETCH_TIMEOUT).build() {
        Ok(client) => client,
        Err(err) => {
            warn!(?err, "failed building http client; status polling disabled");
            return;
        }
    };

    // The first tick completes immediately, which doubles as the startup fetch.
    let mut ticker = new_ticker(config.poll_minutes_clamped());
    info!(
        endpoint = %config.endpoint_url,
        minutes = config.poll_minutes_clamped(),
        "starting status poller"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                check_once(&client, &config.endpoint_url, &store).await;
            }
            command = commands.recv() => {
                match command {
                    Some(PollerCommand::CheckNow) => {
                        check_once(&client, &config.endpoint_url, &store).await;
                    }
                    Some(PollerCommand::Apply(next)) => {
                        let interval_changed =
                            next.poll_minutes_clamped() != config.poll_minutes_clamped();
                        config = next;
                        if interval_changed {
                            ticker = new_ticker(config.poll_minutes_clamped());
                        }
                        info!(
                            endpoint = %config.endpoint_url,
                            minutes = config.poll_minutes_clamped(),
                            "applied poller config"
                        );
                    }
                    None => {
                        info!("control channel closed; stopping status poller");
                        return;
                    }
                }
            }
        }
    }
}

fn new_ticker(minutes: u64) -> Interval {
    let mut ticker = interval(Duration::from_secs(minutes * 60));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

async fn check_once(client: &reqwest::Client, endpoint: &str, store: &StatusStore) {
    match fetch_status(client, endpoint).await {
        Ok(record) => {
            if let Err(err) = store.set(record) {
                warn!(?err, "failed persisting fetched status");
            } else {
                info!(
                    status = record.state.wire_name(),
                    intensity = record.intensity,
                    "monster status updated"
                );
            }
        }
        Err(err) => {
            warn!(?err, endpoint = %endpoint, "status check failed; keeping last known status");
        }
    }
}

async fn fetch_status(client: &reqwest::Client, endpoint: &str) -> Result<StatusRecord> {
    let response = client
        .get(endpoint)
        .send()
        .await
        .context("status request failed")?;
    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("status endpoint answered {status}"));
    }
    let body = response
        .text()
        .await
        .context("failed reading status body")?;
    parse_status_payload(&body)
}

#[cfg(test)]
mod tests {
    use std::{
        path::PathBuf,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::{SystemTime, UNIX_EPOCH},
    };

    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    use crate::{config::AppConfig, status::MonsterState, store::StatusStore};

    use super::{check_once, fetch_status, spawn_status_poller, PollerCommand};

    async fn serve(router: Router) -> (String, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr = listener.local_addr().expect("listener should report addr");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        (format!("http://{addr}/api/monster"), handle)
    }

    fn temp_store(tag: &str) -> (Arc<StatusStore>, PathBuf) {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after the epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("grass-reaper-poll-{tag}-{nanos}.json"));
        (StatusStore::open(path.clone()), path)
    }

    async fn wait_until(what: &str, mut check: impl FnMut() -> bool) {
        for _ in 0..250 {
            if check() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("timed out waiting for {what}");
    }

    #[tokio::test]
    async fn successful_check_replaces_store() {
        let router = Router::new().route(
            "/api/monster",
            get(|| async {
                Json(json!({
                    "status": "HUNGRY",
                    "anger_level": 70,
                    "last_check": "2024-01-01T00:00:00Z"
                }))
            }),
        );
        let (endpoint, server) = serve(router).await;
        let (store, path) = temp_store("success");

        let client = reqwest::Client::new();
        check_once(&client, &endpoint, &store).await;

        let record = store.get().expect("record should be stored");
        assert_eq!(record.state, MonsterState::Hungry);
        assert_eq!(record.intensity, 70);
        server.abort();
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn failed_check_leaves_store_untouched() {
        let router = Router::new().route(
            "/api/monster",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let (endpoint, server) = serve(router).await;
        let (store, path) = temp_store("failure");

        let seeded = crate::status::parse_status_payload(
            r#"{"status":"SATISFIED","anger_level":5,"last_check":"2024-01-01T00:00:00Z"}"#,
        )
        .expect("seed record should parse");
        store.set(seeded).expect("seed should persist");

        let client = reqwest::Client::new();
        check_once(&client, &endpoint, &store).await;

        let record = store.get().expect("seed record should remain");
        assert_eq!(record.state, MonsterState::Satisfied);
        assert_eq!(record.intensity, 5);
        server.abort();
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn fetch_rejects_malformed_body() {
        let router = Router::new().route(
            "/api/monster",
            get(|| async { Json(json!({ "mood": "grumpy" })) }),
        );
        let (endpoint, server) = serve(router).await;

        let client = reqwest::Client::new();
        let fetched = fetch_status(&client, &endpoint).await;
        assert!(fetched.is_err());
        server.abort();
    }

    #[tokio::test]
    async fn startup_and_check_now_drive_fetches() {
        let hits = Arc::new(AtomicUsize::new(0));
        let handler_hits = Arc::clone(&hits);
        let router = Router::new().route(
            "/api/monster",
            get(move || {
                let hits = Arc::clone(&handler_hits);
                async move {
                    let intensity = if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                        10
                    } else {
                        90
                    };
                    Json(json!({
                        "status": "HUNGRY",
                        "anger_level": intensity,
                        "last_check": "2024-01-01T00:00:00Z"
                    }))
                }
            }),
        );
        let (endpoint, server) = serve(router).await;
        let (store, path) = temp_store("loop");

        let config = AppConfig {
            endpoint_url: endpoint,
            poll_minutes: 60,
            ..AppConfig::default()
        };
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let poller = spawn_status_poller(config, Arc::clone(&store), rx);

        wait_until("startup fetch", || {
            store.get().map(|record| record.intensity) == Some(10)
        })
        .await;

        tx.send(PollerCommand::CheckNow).expect("command should send");
        wait_until("manual check", || {
            store.get().map(|record| record.intensity) == Some(90)
        })
        .await;

        poller.abort();
        server.abort();
        let _ = std::fs::remove_file(path);
    }
}
