//! Shared application state: the single live-minigame slot, the zone update
//! hub, the cue capability, and the pad connection registry.

use std::{sync::Arc, time::SystemTime};

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::{RwLock, broadcast, mpsc};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dto::sse::ServerEvent,
    games::{
        GameKind, Minigame,
        harness::{CuePlayer, UpdateHub},
    },
};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Capacity of the zone update broadcast channel. The rhythm render loop is
/// the chattiest producer (~30 events/s), so give subscribers headroom.
const ZONE_HUB_CAPACITY: usize = 256;

/// Capacity of the host event broadcast channel.
const EVENT_HUB_CAPACITY: usize = 16;

/// Handle used to push messages to a connected pad device.
#[derive(Clone)]
pub struct PadConnection {
    /// Identifier announced in the pad's hello message.
    pub id: String,
    /// Outbound channel to the pad's WebSocket writer task.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// The minigame instance currently mounted by the host shell.
pub struct ActiveGame {
    /// Unique identifier of this launch.
    pub id: Uuid,
    /// Which variant is running.
    pub kind: GameKind,
    /// The live instance; exactly one exists at a time.
    pub instance: Arc<dyn Minigame>,
    /// When the instance was launched.
    pub launched_at: SystemTime,
}

/// Broadcast hub for host-level events (launches, closures, handshakes).
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a hub backed by a broadcast channel of the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber receiving subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

/// Central application state shared across routes, services, and tasks.
pub struct AppState {
    config: AppConfig,
    zones: UpdateHub,
    events: SseHub,
    cues: Arc<CuePlayer>,
    live: RwLock<Option<ActiveGame>>,
    pads: DashMap<String, PadConnection>,
}

impl AppState {
    /// Construct the state wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig) -> SharedState {
        let zones = UpdateHub::new(ZONE_HUB_CAPACITY);
        let cues = Arc::new(CuePlayer::new(zones.clone()));
        Arc::new(Self {
            config,
            zones,
            events: SseHub::new(EVENT_HUB_CAPACITY),
            cues,
            live: RwLock::new(None),
            pads: DashMap::new(),
        })
    }

    /// Runtime configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Hub carrying rendered-state deltas from the live minigame.
    pub fn zones(&self) -> &UpdateHub {
        &self.zones
    }

    /// Hub carrying host-level events.
    pub fn events(&self) -> &SseHub {
        &self.events
    }

    /// The process-wide cue playback capability.
    pub fn cues(&self) -> &Arc<CuePlayer> {
        &self.cues
    }

    /// The single mutable slot holding at most one live instance.
    pub fn live(&self) -> &RwLock<Option<ActiveGame>> {
        &self.live
    }

    /// Clone a handle to the live instance, if any.
    pub async fn live_instance(&self) -> Option<Arc<dyn Minigame>> {
        let guard = self.live.read().await;
        guard.as_ref().map(|game| game.instance.clone())
    }

    /// Registry of connected pad devices keyed by their identifier.
    pub fn pads(&self) -> &DashMap<String, PadConnection> {
        &self.pads
    }
}
