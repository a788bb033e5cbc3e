use std::{
    io::ErrorKind,
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, OnceLock,
    },
    time::{Duration, Instant},
};

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use rumqttc::{AsyncClient, Event, Incoming, LastWill, MqttOptions, QoS};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::Mutex};
use tracing::{debug, info, warn};

use boiler_common::{
    BoilerEngine, BoilerSnapshot, Command, CycleOutcome, RuntimeConfig, TOPIC_AVAILABILITY,
    TOPIC_CMD_PREFIX, TOPIC_CMD_WILDCARD, TOPIC_STATE,
};

use crate::sim::SimulatedBoiler;

const MAX_MQTT_PAYLOAD_BYTES: usize = 512;

#[derive(Clone)]
struct AppState {
    engine: Arc<Mutex<BoilerEngine>>,
    /// Cleared to simulate losing the network time source.
    clock_online: Arc<AtomicBool>,
    mqtt: AsyncClient,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct CommandAccepted {
    changed: bool,
}

#[derive(Debug, Serialize)]
struct TimeStatus {
    #[serde(rename = "timeSynced")]
    time_synced: bool,
    #[serde(rename = "clockOnline")]
    clock_online: bool,
    timezone: String,
    #[serde(rename = "nowEpoch")]
    now_epoch: i64,
    #[serde(rename = "lastEpoch")]
    last_epoch: Option<i64>,
    #[serde(rename = "timeString")]
    time_string: String,
}

#[derive(Debug, Deserialize)]
struct ClockSourceUpdate {
    online: bool,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut runtime = load_runtime_config().await.unwrap_or_else(|err| {
        warn!("failed to load runtime config seed: {err:#}");
        RuntimeConfig::default()
    });
    if let Ok(timezone) = std::env::var("BOILER_TIMEZONE") {
        runtime.timezone = timezone;
    }
    runtime.sanitize();

    let timezone = runtime.timezone().context("unusable timezone")?;
    let engine = BoilerEngine::new(
        runtime.control.clone(),
        timezone,
        runtime.publish_interval_ms,
    );
    info!(timezone = timezone.name(), loop_ms = runtime.loop_interval_ms, "boiler engine ready");

    let mqtt_host = std::env::var("MQTT_HOST").unwrap_or(runtime.network.mqtt_host.clone());
    let mqtt_port = std::env::var("MQTT_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(runtime.network.mqtt_port);

    let mut mqtt_options =
        MqttOptions::new(runtime.network.client_id.clone(), mqtt_host, mqtt_port);
    mqtt_options.set_keep_alive(Duration::from_secs(30));
    mqtt_options.set_last_will(LastWill::new(
        TOPIC_AVAILABILITY,
        "offline",
        QoS::AtLeastOnce,
        true,
    ));
    let mqtt_user = std::env::var("MQTT_USER").unwrap_or(runtime.network.mqtt_user.clone());
    let mqtt_pass = std::env::var("MQTT_PASS").unwrap_or(runtime.network.mqtt_pass.clone());
    if !mqtt_user.is_empty() {
        mqtt_options.set_credentials(mqtt_user, mqtt_pass);
    }

    let (mqtt, eventloop) = AsyncClient::new(mqtt_options, 64);

    let app_state = AppState {
        engine: Arc::new(Mutex::new(engine)),
        clock_online: Arc::new(AtomicBool::new(std::env::var("BOILER_OFFLINE").is_err())),
        mqtt,
    };

    app_state
        .mqtt
        .subscribe(TOPIC_CMD_WILDCARD, QoS::AtMostOnce)
        .await?;
    spawn_mqtt_loop(app_state.clone(), eventloop);
    spawn_control_loop(
        app_state.clone(),
        SimulatedBoiler::from_env(),
        runtime.loop_interval_ms,
    );

    let app = Router::new()
        .route("/api/status", get(handle_get_status))
        .route("/api/config", get(handle_get_config))
        .route("/api/command", post(handle_post_command))
        .route("/api/time", get(handle_get_time).post(handle_set_clock_source))
        .with_state(app_state);

    let port = std::env::var("CONTROLLER_HTTP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind controller server at {addr}"))?;

    info!("controller listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

fn spawn_mqtt_loop(app_state: AppState, mut eventloop: rumqttc::EventLoop) {
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::Publish(message))) => {
                    if let Err(err) =
                        handle_mqtt_message(&app_state, message.topic, message.payload.to_vec())
                            .await
                    {
                        warn!("mqtt message handling error: {err:#}");
                    }
                }
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    info!("mqtt connected");
                    if let Err(err) = app_state
                        .mqtt
                        .try_publish(TOPIC_AVAILABILITY, QoS::AtLeastOnce, true, "online")
                    {
                        warn!("availability publish failed: {err}");
                    }
                    // Fresh subscribers get every value right away.
                    app_state.engine.lock().await.force_publish();
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("mqtt poll error: {err}");
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    });
}

fn spawn_control_loop(app_state: AppState, mut boiler: SimulatedBoiler, interval_ms: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let now_ms = monotonic_ms();
            let fetched_epoch = fetch_epoch(&app_state.clock_online);
            let snapshot = {
                let mut engine = app_state.engine.lock().await;
                let report = engine.tick(&mut boiler, fetched_epoch, now_ms);
                if let CycleOutcome::Rejected(kind) = report.cycle {
                    debug!(?kind, "transport rejected request, retrying next pass");
                }
                engine.publish_due(now_ms).then(|| engine.snapshot())
            };

            if let Some(snapshot) = snapshot {
                publish_snapshot(&app_state.mqtt, &snapshot).await;
            }
        }
    });
}

/// Wall clock as the network time source reports it; `None` while offline.
fn fetch_epoch(clock_online: &AtomicBool) -> Option<i64> {
    clock_online
        .load(Ordering::Relaxed)
        .then(|| Utc::now().timestamp())
}

async fn publish_snapshot(mqtt: &AsyncClient, snapshot: &BoilerSnapshot) {
    match serde_json::to_vec(snapshot) {
        Ok(body) => {
            if let Err(err) = mqtt
                .publish(TOPIC_STATE, QoS::AtLeastOnce, true, body)
                .await
            {
                warn!("boiler state publish failed: {err}");
            }
        }
        Err(err) => warn!("boiler state serialization failed: {err}"),
    }
}

async fn handle_mqtt_message(
    app_state: &AppState,
    topic: String,
    payload: Vec<u8>,
) -> anyhow::Result<()> {
    if payload.len() > MAX_MQTT_PAYLOAD_BYTES {
        warn!(
            "dropping oversized MQTT payload on topic {} ({} bytes)",
            topic,
            payload.len()
        );
        return Ok(());
    }
    if !topic.starts_with(TOPIC_CMD_PREFIX) {
        return Ok(());
    }

    let message = String::from_utf8(payload).context("non utf8 mqtt payload")?;
    let command = Command::from_topic(&topic, &message)
        .with_context(|| format!("rejected command on {topic}"))?;

    app_state.engine.lock().await.handle_command(command);
    Ok(())
}

async fn handle_get_status(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.engine.lock().await.snapshot();
    Json(snapshot)
}

async fn handle_get_config(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.engine.lock().await.config().clone();
    Json(config)
}

async fn handle_post_command(
    State(state): State<AppState>,
    Json(command): Json<Command>,
) -> axum::response::Response {
    if let Err(err) = command.validate() {
        return error_response(StatusCode::BAD_REQUEST, &err.to_string());
    }

    let changed = state.engine.lock().await.handle_command(command);
    Json(CommandAccepted { changed }).into_response()
}

async fn handle_get_time(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.lock().await;
    let schedule = &engine.context().schedule;
    Json(TimeStatus {
        time_synced: schedule.clock_observed(),
        clock_online: state.clock_online.load(Ordering::Relaxed),
        timezone: engine.timezone().name().to_string(),
        now_epoch: Utc::now().timestamp(),
        last_epoch: schedule.last_epoch,
        time_string: schedule.time_string.clone(),
    })
}

async fn handle_set_clock_source(
    State(state): State<AppState>,
    Json(update): Json<ClockSourceUpdate>,
) -> impl IntoResponse {
    state.clock_online.store(update.online, Ordering::Relaxed);
    info!(online = update.online, "network time source toggled");
    handle_get_time(State(state)).await
}

/// Optional read-only seed from `BOILER_CONFIG`; nothing is ever written back.
async fn load_runtime_config() -> anyhow::Result<RuntimeConfig> {
    let Ok(path) = std::env::var("BOILER_CONFIG") else {
        return Ok(RuntimeConfig::default());
    };
    match tokio::fs::read(&path).await {
        Ok(raw) => serde_json::from_slice::<RuntimeConfig>(&raw)
            .with_context(|| format!("invalid runtime config in {path}")),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(RuntimeConfig::default()),
        Err(err) => Err(err.into()),
    }
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn monotonic_ms() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START
        .get_or_init(Instant::now)
        .elapsed()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_clock_yields_no_epoch() {
        assert_eq!(fetch_epoch(&AtomicBool::new(false)), None);
        assert!(fetch_epoch(&AtomicBool::new(true)).is_some_and(|epoch| epoch > 0));
    }

    #[test]
    fn error_body_is_json() {
        let response = error_response(StatusCode::BAD_REQUEST, "nope");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
