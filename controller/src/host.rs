use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::OnceLock,
    time::{Duration, Instant},
};

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono_tz::Tz;
use rumqttc::{AsyncClient, Event, Incoming, LastWill, MqttOptions, QoS};
use serde::Serialize;
use tokio::{
    net::TcpListener,
    sync::{
        mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender},
        watch,
    },
};
use tracing::{debug, info, warn};

use ledclock_common::{
    discovery::{device_id, discovery_messages},
    types::offline_payload,
    Animation, ClockEngine, ClockSnapshot, Command, FrameBuffer, LedMatrix, Notification,
    ScrollRestart, TimeKeeper, COMMAND_TOPICS, TOPIC_STATUS,
};

use crate::{
    hardware::{ConsolePanel, StdDelay, SystemTimeSource},
    store::{apply_env_overrides, AppStore, JsonFileStore},
};

const MAX_MQTT_PAYLOAD_BYTES: usize = 1024;

type Engine = ClockEngine<ConsolePanel, StdDelay, JsonFileStore>;

#[derive(Debug)]
enum DisplayEvent {
    Connected,
    Command(Command),
}

#[derive(Clone)]
struct AppState {
    events: UnboundedSender<DisplayEvent>,
    snapshot: watch::Receiver<ClockSnapshot>,
    restart: ScrollRestart,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct Accepted {
    accepted: bool,
}

struct DisplayLoop {
    engine: Engine,
    keeper: TimeKeeper,
    source: SystemTimeSource,
    events: UnboundedReceiver<DisplayEvent>,
    mqtt: AsyncClient,
    snapshot: watch::Sender<ClockSnapshot>,
    device_id: String,
    device_name: String,
    idle_poll: Duration,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store = AppStore::from_env();
    let mut runtime = store.load_runtime_config().await.unwrap_or_else(|err| {
        warn!("failed to load runtime config from store: {err:#}");
        Default::default()
    });
    let http_port = apply_env_overrides(&mut runtime, |key| std::env::var(key).ok());
    runtime.sanitize();

    let timezone = runtime.time.timezone.parse::<Tz>().unwrap_or_else(|err| {
        warn!("unknown timezone {:?}, using UTC: {err}", runtime.time.timezone);
        Tz::UTC
    });

    let display = &runtime.display;
    let matrix = LedMatrix::new(
        FrameBuffer::for_panels(
            usize::from(display.panels_horizontal),
            usize::from(display.panels_vertical),
        ),
        ConsolePanel::default(),
        StdDelay,
    );
    let engine = ClockEngine::new(matrix, store.settings_store(), display);
    let restart = engine.scroll_restart();

    let network = &runtime.network;
    let mut mqtt_options =
        MqttOptions::new(network.client_id.clone(), network.mqtt_host.clone(), network.mqtt_port);
    mqtt_options.set_keep_alive(Duration::from_secs(30));
    mqtt_options.set_last_will(LastWill::new(
        TOPIC_STATUS,
        offline_payload(),
        QoS::AtLeastOnce,
        true,
    ));
    if !network.mqtt_user.is_empty() {
        mqtt_options.set_credentials(network.mqtt_user.clone(), network.mqtt_pass.clone());
    }
    let (mqtt, eventloop) = AsyncClient::new(mqtt_options, 64);

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot(None));

    spawn_mqtt_loop(mqtt.clone(), eventloop, events_tx.clone());
    spawn_display_loop(DisplayLoop {
        engine,
        keeper: TimeKeeper::new(timezone, runtime.time.refresh_minutes),
        source: SystemTimeSource,
        events: events_rx,
        mqtt,
        snapshot: snapshot_tx,
        device_id: device_id(&network.client_id),
        device_name: network.device_name.clone(),
        idle_poll: Duration::from_millis(display.idle_poll_ms),
    })?;

    let app_state = AppState {
        events: events_tx,
        snapshot: snapshot_rx,
        restart,
    };
    let app = Router::new()
        .route("/api/status", get(handle_get_status))
        .route("/api/notification", post(handle_post_notification))
        .route("/api/animation", post(handle_post_animation))
        .route("/api/display/refresh", post(handle_post_refresh))
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind clock server at {addr}"))?;

    info!("clock listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

fn subscribe_topics(mqtt: &AsyncClient) {
    for topic in COMMAND_TOPICS {
        if let Err(err) = mqtt.try_subscribe(topic, QoS::AtMostOnce) {
            warn!("mqtt subscribe to {topic} failed: {err}");
        }
    }
}

fn spawn_mqtt_loop(
    mqtt: AsyncClient,
    mut eventloop: rumqttc::EventLoop,
    events: UnboundedSender<DisplayEvent>,
) {
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::Publish(message))) => {
                    if let Err(err) =
                        handle_mqtt_message(&events, &message.topic, message.payload.to_vec())
                    {
                        warn!("mqtt message handling error: {err:#}");
                    }
                }
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    info!("mqtt connected");
                    subscribe_topics(&mqtt);
                    if events.send(DisplayEvent::Connected).is_err() {
                        break;
                    }
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

fn handle_mqtt_message(
    events: &UnboundedSender<DisplayEvent>,
    topic: &str,
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

    let message = String::from_utf8(payload).context("non utf8 mqtt payload")?;
    debug!(topic, payload = %message, "mqtt message");
    if let Some(command) = Command::parse(topic, &message) {
        events
            .send(DisplayEvent::Command(command))
            .context("display loop has stopped")?;
    }
    Ok(())
}

fn spawn_display_loop(display: DisplayLoop) -> anyhow::Result<()> {
    std::thread::Builder::new()
        .name("display".to_string())
        .spawn(move || display.run())
        .context("failed to spawn display thread")?;
    Ok(())
}

impl DisplayLoop {
    fn run(mut self) {
        let now = self.keeper.local_now(monotonic_ms());
        self.engine.boot(now);

        loop {
            loop {
                match self.events.try_recv() {
                    Ok(event) => self.handle_event(event),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        info!(
                            frames = self.engine.matrix().panel().frames_written(),
                            "display loop stopping"
                        );
                        return;
                    }
                }
            }

            let now_ms = monotonic_ms();
            if self.keeper.needs_refresh(now_ms) {
                self.engine
                    .refresh_time(&mut self.keeper, &mut self.source, now_ms);
            }

            let now = self.keeper.local_now(monotonic_ms());
            self.engine.tick(now);
            self.snapshot.send_replace(self.engine.snapshot(now));
            std::thread::sleep(self.idle_poll);
        }
    }

    fn handle_event(&mut self, event: DisplayEvent) {
        let now = self.keeper.local_now(monotonic_ms());
        match event {
            DisplayEvent::Connected => self.publish_discovery(),
            DisplayEvent::Command(command) => {
                if command == Command::SendDiscovery {
                    self.publish_discovery();
                }
                self.engine.handle(command, now);
            }
        }
        // Handling may have blocked for a whole animation.
        let now = self.keeper.local_now(monotonic_ms()).or(now);
        self.publish_status(now);
    }

    fn publish_status(&self, now: Option<chrono::DateTime<chrono::FixedOffset>>) {
        match serde_json::to_vec(&self.engine.status(now)) {
            Ok(body) => {
                if let Err(err) = self
                    .mqtt
                    .try_publish(TOPIC_STATUS, QoS::AtLeastOnce, true, body)
                {
                    warn!("status publish failed: {err}");
                }
            }
            Err(err) => warn!("status serialization failed: {err}"),
        }
    }

    fn publish_discovery(&self) {
        for message in discovery_messages(&self.device_id, &self.device_name) {
            match serde_json::to_vec(&message.config) {
                Ok(body) => {
                    if let Err(err) =
                        self.mqtt
                            .try_publish(message.topic.as_str(), QoS::AtLeastOnce, true, body)
                    {
                        warn!("discovery publish to {} failed: {err}", message.topic);
                    }
                }
                Err(err) => warn!("discovery serialization failed: {err}"),
            }
        }
        info!(device = %self.device_id, "discovery published");
    }
}

async fn handle_get_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.snapshot.borrow().clone())
}

async fn handle_post_notification(
    State(state): State<AppState>,
    body: String,
) -> impl IntoResponse {
    if body.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Notification body is empty");
    }
    dispatch(&state, Command::Notify(Notification::parse(&body)))
}

async fn handle_post_animation(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(name) = params.get("name") else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'name' parameter");
    };
    dispatch(&state, Command::PlayAnimation(Animation::from_name(name)))
}

async fn handle_post_refresh(State(state): State<AppState>) -> impl IntoResponse {
    state.restart.request();
    Json(Accepted { accepted: true }).into_response()
}

fn dispatch(state: &AppState, command: Command) -> axum::response::Response {
    match state.events.send(DisplayEvent::Command(command)) {
        Ok(()) => (StatusCode::ACCEPTED, Json(Accepted { accepted: true })).into_response(),
        Err(_) => error_response(StatusCode::SERVICE_UNAVAILABLE, "Display loop is not running"),
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
