//! Incident Sync Session
//!
//! Wires the store, alert gate, poller, push listener, command dispatcher
//! and (for demos) the simulation driver into one session observing one
//! incident stream. The session owns the background tasks and tears them
//! down on shutdown; in-flight command responses arriving afterwards are
//! safely ignorable.

pub mod alert;
pub mod client;
pub mod commands;
pub mod poller;
pub mod push;
pub mod simulation;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::constants;
use alert::{AlertEvent, AlertGate};
use client::ApiClient;
use commands::CommandDispatcher;
use push::PushTransport;
use store::IncidentStore;

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Backend API URL
    pub api_url: String,
    /// Poll interval in seconds
    pub poll_interval_secs: u64,
    /// Maximum incidents fetched per poll
    pub poll_limit: usize,
    /// Push channel reconnect delay in seconds
    pub push_reconnect_secs: u64,
    /// Simulation driver interval in seconds
    pub sim_interval_secs: u64,
    /// Offline/demo mode: no channels, no alerts, simulation allowed
    pub offline: bool,
    /// Local responder name, skipped by the simulation driver
    pub responder_name: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_url: constants::get_api_url(),
            poll_interval_secs: constants::get_poll_interval(),
            poll_limit: constants::get_poll_limit(),
            push_reconnect_secs: constants::get_push_reconnect(),
            sim_interval_secs: constants::get_sim_interval(),
            offline: constants::is_offline_mode(),
            responder_name: constants::get_responder_name(),
        }
    }
}

/// One logical client session observing one incident stream.
pub struct SyncSession {
    config: SyncConfig,
    store: Arc<IncidentStore>,
    dispatcher: Arc<CommandDispatcher<ApiClient>>,
    tasks: Vec<JoinHandle<()>>,
}

impl SyncSession {
    /// Build a session and the receiving end of its alert feed.
    pub fn new(config: SyncConfig) -> (Self, mpsc::UnboundedReceiver<AlertEvent>) {
        let (gate, alerts_rx) = AlertGate::new();
        gate.set_offline(config.offline);

        let store = Arc::new(IncidentStore::new(gate));
        let api = ApiClient::new(&config.api_url, constants::DEFAULT_REQUEST_TIMEOUT);
        let dispatcher = Arc::new(CommandDispatcher::new(api, store.clone()));

        let session = Self {
            config,
            store,
            dispatcher,
            tasks: Vec::new(),
        };
        (session, alerts_rx)
    }

    /// Start the polling channel. No-op in offline mode.
    pub fn start(&mut self) {
        if self.config.offline {
            log::info!("offline mode: poller not started");
            return;
        }
        let api = ApiClient::new(&self.config.api_url, constants::DEFAULT_REQUEST_TIMEOUT);
        let store = self.store.clone();
        let interval = Duration::from_secs(self.config.poll_interval_secs);
        let limit = self.config.poll_limit;
        self.tasks
            .push(tokio::spawn(poller::run_poller(api, store, interval, limit)));
    }

    /// Start the push channel over the given transport. No-op in offline
    /// mode.
    pub fn start_push<T>(&mut self, transport: T)
    where
        T: PushTransport + Send + 'static,
    {
        if self.config.offline {
            log::info!("offline mode: push listener not started");
            return;
        }
        let store = self.store.clone();
        let delay = Duration::from_secs(self.config.push_reconnect_secs);
        self.tasks
            .push(tokio::spawn(push::run_push_listener(transport, store, delay)));
    }

    /// Start the simulation driver. Only allowed in offline/demo mode: it
    /// must never run against a live backend.
    pub fn start_simulation(&mut self) {
        if !self.config.offline {
            log::warn!("simulation driver refused: session is backed by a live backend");
            return;
        }
        let Some(responder) = self.config.responder_name.clone() else {
            log::warn!("simulation driver refused: no local responder name configured");
            return;
        };
        let dispatcher = self.dispatcher.clone();
        let store = self.store.clone();
        let interval = Duration::from_secs(self.config.sim_interval_secs);
        self.tasks.push(tokio::spawn(simulation::run_simulation(
            dispatcher, store, responder, interval,
        )));
    }

    /// The authoritative incident collection.
    pub fn store(&self) -> &Arc<IncidentStore> {
        &self.store
    }

    /// The command functions (resolve, dismiss, confirm, reject, dispatch,
    /// ack-all).
    pub fn dispatcher(&self) -> &Arc<CommandDispatcher<ApiClient>> {
        &self.dispatcher
    }

    /// Flip the global alert sound flag, returning the new value.
    pub fn toggle_sound(&self) -> bool {
        self.store.alerts().toggle_sound()
    }

    pub fn sound_enabled(&self) -> bool {
        self.store.alerts().sound_enabled()
    }

    /// Tear down the background channels. In-flight command responses may
    /// still arrive and are ignored.
    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        log::info!("sync session shut down");
    }
}

impl Drop for SyncSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
