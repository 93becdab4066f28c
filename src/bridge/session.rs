//! Bridge connection state machine.
//!
//! One task owns the socket for the whole process lifetime:
//! `Disconnected → Connecting → Authenticating → Connected`, then back to
//! `Disconnected` on any failure and around again after a fixed delay —
//! 5 seconds for a clean close, 10 for anything else. There is no permanent
//! give-up. All sends go through this task, so at most one is in flight.

use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use secrecy::ExposeSecret;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bridge::protocol::{BotFrame, DashboardFrame};
use crate::bridge::stats::Metrics;
use crate::commands::{CommandDispatcher, PrefixStore};
use crate::config::{AuthFailurePolicy, BridgeConfig};
use crate::error::BridgeError;
use crate::platform::{ChatGateway, GuildId};
use crate::rules::{RuleStore, RulesPatch};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Outbound queue depth; senders back off when the session is behind.
const OUTBOUND_CAPACITY: usize = 64;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeStatus {
    Disconnected,
    Connecting,
    Authenticating,
    Connected,
}

impl std::fmt::Display for BridgeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Connected => "connected",
        };
        f.write_str(s)
    }
}

/// How one connected session ended.
enum SessionEnd {
    Cancelled,
    CleanClose,
    Error,
    AuthRejected(String),
}

enum FrameOutcome {
    Continue,
    End(SessionEnd),
}

/// Everything the session needs from the rest of the bot.
#[derive(Clone)]
pub struct BridgeDeps {
    pub gateway: Arc<dyn ChatGateway>,
    pub dispatcher: Arc<CommandDispatcher>,
    pub rules: Arc<RuleStore>,
    pub prefixes: Arc<PrefixStore>,
    pub metrics: Arc<Metrics>,
}

impl BridgeDeps {
    /// Dispatch one decoded inbound frame; protocol failures drop the frame.
    async fn handle_frame(&self, text: &str, sink: &mut WsSink) -> FrameOutcome {
        let frame = match DashboardFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Dropping undecodable dashboard frame");
                return FrameOutcome::Continue;
            }
        };

        let response = match frame {
            DashboardFrame::Ping => BotFrame::Pong,
            DashboardFrame::Command {
                command,
                guild_id,
                channel_id,
                args,
                request_id,
            } => {
                self.dispatcher
                    .dispatch(&command, guild_id, channel_id, args, request_id)
                    .await
            }
            DashboardFrame::UpdateSettings {
                settings_type,
                guild_id,
                settings,
            } => self.apply_settings(settings_type, guild_id, settings).await,
            DashboardFrame::AuthError { message } => {
                let reason = message.unwrap_or_else(|| "credentials rejected".to_string());
                return FrameOutcome::End(SessionEnd::AuthRejected(reason));
            }
        };

        match send_frame(sink, &response).await {
            Ok(()) => FrameOutcome::Continue,
            Err(()) => FrameOutcome::End(SessionEnd::Error),
        }
    }

    /// Route a settings update to the owning store.
    async fn apply_settings(
        &self,
        settings_type: String,
        guild: GuildId,
        settings: Value,
    ) -> BotFrame {
        let (success, message) = match settings_type.as_str() {
            "prefix" => match settings.get("prefix").and_then(Value::as_str) {
                Some(prefix) if !prefix.is_empty() => {
                    self.prefixes.set(guild, prefix).await;
                    info!(guild = %guild, prefix, "Updated command prefix");
                    (true, None)
                }
                _ => (false, Some("missing prefix value".to_string())),
            },
            "automod" => match serde_json::from_value::<RulesPatch>(settings) {
                Ok(patch) => {
                    self.rules.apply(guild, patch).await;
                    (true, None)
                }
                Err(e) => (false, Some(format!("invalid automod settings: {e}"))),
            },
            other => (false, Some(format!("unsupported settings type: {other}"))),
        };

        BotFrame::SettingsUpdateResponse {
            settings_type,
            guild_id: guild,
            success,
            message,
        }
    }

    async fn stats_frame(&self) -> BotFrame {
        BotFrame::BotStats {
            stats: self.metrics.snapshot(self.gateway.as_ref()).await,
        }
    }
}

/// Cheap handle for observing status and queueing outbound frames.
#[derive(Clone)]
pub struct BridgeHandle {
    status: watch::Receiver<BridgeStatus>,
    outbound: mpsc::Sender<BotFrame>,
}

impl BridgeHandle {
    pub fn status(&self) -> BridgeStatus {
        *self.status.borrow()
    }

    /// A receiver for status transitions (for tests and shutdown logic).
    pub fn subscribe_status(&self) -> watch::Receiver<BridgeStatus> {
        self.status.clone()
    }

    /// Queue a frame for the session task to send once connected.
    pub async fn send(&self, frame: BotFrame) -> bool {
        self.outbound.send(frame).await.is_ok()
    }
}

/// The bridge session; `run` consumes it and loops until cancelled.
pub struct Bridge {
    config: BridgeConfig,
    deps: BridgeDeps,
    status_tx: watch::Sender<BridgeStatus>,
    outbound_rx: mpsc::Receiver<BotFrame>,
    // kept so the outbound queue never reports closed
    _outbound_tx: mpsc::Sender<BotFrame>,
}

impl Bridge {
    pub fn new(config: BridgeConfig, deps: BridgeDeps) -> (Self, BridgeHandle) {
        let (status_tx, status_rx) = watch::channel(BridgeStatus::Disconnected);
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let handle = BridgeHandle {
            status: status_rx,
            outbound: outbound_tx.clone(),
        };
        (
            Self {
                config,
                deps,
                status_tx,
                outbound_rx,
                _outbound_tx: outbound_tx,
            },
            handle,
        )
    }

    /// Maintain the dashboard connection until cancelled.
    ///
    /// Returns an error only under `AuthFailurePolicy::Fatal` when the
    /// dashboard rejects our credentials.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), BridgeError> {
        loop {
            publish_status(&self.status_tx, BridgeStatus::Connecting);
            let delay = match self.connect_and_serve(&cancel).await {
                SessionEnd::Cancelled => {
                    publish_status(&self.status_tx, BridgeStatus::Disconnected);
                    return Ok(());
                }
                SessionEnd::CleanClose => self.config.reconnect_delay_close,
                SessionEnd::Error => self.config.reconnect_delay_error,
                SessionEnd::AuthRejected(reason) => {
                    if self.config.auth_failure_policy == AuthFailurePolicy::Fatal {
                        publish_status(&self.status_tx, BridgeStatus::Disconnected);
                        return Err(BridgeError::AuthRejected(reason));
                    }
                    warn!(reason = %reason, "Authentication rejected; retrying");
                    self.config.reconnect_delay_error
                }
            };

            publish_status(&self.status_tx, BridgeStatus::Disconnected);
            debug!(delay_ms = delay.as_millis() as u64, "Scheduling reconnect");
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn connect_and_serve(&mut self, cancel: &CancellationToken) -> SessionEnd {
        // disjoint field borrows: the outbound queue is polled mutably while
        // deps and the status channel are used by the frame handlers
        let config = &self.config;
        let deps = &self.deps;
        let status_tx = &self.status_tx;
        let outbound_rx = &mut self.outbound_rx;

        let ws = tokio::select! {
            _ = cancel.cancelled() => return SessionEnd::Cancelled,
            result = connect_async(config.url.as_str()) => match result {
                Ok((ws, _response)) => ws,
                Err(e) => {
                    warn!(url = %config.url, error = %e, "Dashboard connection failed");
                    return SessionEnd::Error;
                }
            },
        };
        info!(url = %config.url, "Connected to dashboard");

        let (mut sink, mut stream) = ws.split();

        // Handshake: the session counts as live once the auth frame is out;
        // no ack is awaited. A rejection arrives later as an auth_error.
        publish_status(status_tx, BridgeStatus::Authenticating);
        let auth = BotFrame::BotAuth {
            token: config.token.expose_secret().to_string(),
        };
        if send_frame(&mut sink, &auth).await.is_err() {
            return SessionEnd::Error;
        }
        publish_status(status_tx, BridgeStatus::Connected);

        // Initial stats push on entering Connected.
        let stats = deps.stats_frame().await;
        if send_frame(&mut sink, &stats).await.is_err() {
            return SessionEnd::Error;
        }

        let mut heartbeat = tokio::time::interval(config.heartbeat_interval);
        heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        heartbeat.tick().await; // consume the immediate first tick
        let mut stats_tick = tokio::time::interval(config.stats_interval);
        stats_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        stats_tick.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return SessionEnd::Cancelled;
                }
                _ = heartbeat.tick() => {
                    if send_frame(&mut sink, &BotFrame::Heartbeat).await.is_err() {
                        return SessionEnd::Error;
                    }
                }
                _ = stats_tick.tick() => {
                    let frame = deps.stats_frame().await;
                    if send_frame(&mut sink, &frame).await.is_err() {
                        return SessionEnd::Error;
                    }
                }
                Some(frame) = outbound_rx.recv() => {
                    if send_frame(&mut sink, &frame).await.is_err() {
                        return SessionEnd::Error;
                    }
                }
                next = stream.next() => match next {
                    Some(Ok(Message::Text(text))) => {
                        match deps.handle_frame(text.as_str(), &mut sink).await {
                            FrameOutcome::Continue => {}
                            FrameOutcome::End(end) => return end,
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if sink.send(Message::Pong(payload)).await.is_err() {
                            return SessionEnd::Error;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Dashboard closed the connection");
                        return SessionEnd::CleanClose;
                    }
                    Some(Ok(other)) => {
                        debug!(frame = ?other, "Ignoring non-text frame");
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Dashboard connection error");
                        return SessionEnd::Error;
                    }
                },
            }
        }
    }
}

fn publish_status(status_tx: &watch::Sender<BridgeStatus>, status: BridgeStatus) {
    let previous = *status_tx.borrow();
    if previous != status {
        debug!(from = %previous, to = %status, "Bridge status");
        let _ = status_tx.send(status);
    }
}

async fn send_frame(sink: &mut WsSink, frame: &BotFrame) -> Result<(), ()> {
    sink.send(Message::Text(frame.encode().into()))
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to send dashboard frame");
        })
}
