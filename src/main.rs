//! Vigil Sync - Headless Demo Runner
//!
//! Runs the incident sync core against a backend (`VIGIL_API_URL`) and
//! logs alerts as they fire. With `VIGIL_OFFLINE=1` it instead seeds a few
//! demo incidents and lets the simulation driver keep them moving.

use vigil_sync::incident::{Incident, IncidentStatus, Severity};
use vigil_sync::sync::store::IncidentStore;
use vigil_sync::{constants, SyncConfig, SyncSession};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = SyncConfig::default();
    if config.offline && config.responder_name.is_none() {
        // The simulation driver needs a local identity to skip.
        config.responder_name = Some("operator".to_string());
    }
    log::info!(
        "Starting {} v{} ({})",
        constants::APP_NAME,
        constants::APP_VERSION,
        if config.offline {
            "offline demo".to_string()
        } else {
            config.api_url.clone()
        }
    );

    let offline = config.offline;
    let (mut session, mut alerts) = SyncSession::new(config);

    tokio::spawn(async move {
        while let Some(alert) = alerts.recv().await {
            log::warn!(
                "ALERT{}: {}",
                if alert.sound { " [sound]" } else { "" },
                alert.title
            );
        }
    });

    if offline {
        seed_demo_incidents(session.store());
        session.start_simulation();
    } else {
        session.start();
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to wait for shutdown signal: {}", e);
    }
    session.shutdown();

    let active = session.store().active_incidents().len();
    log::info!("exiting with {} active incidents", active);
}

/// A handful of plausible incidents so the offline demo has something to
/// show and the simulation driver has work to advance.
fn seed_demo_incidents(store: &IncidentStore) {
    let seed = |id: &str, kind: &str, severity, location: &str, camera: &str, ts: &str| Incident {
        id: id.to_string(),
        kind: kind.to_string(),
        severity,
        location: location.to_string(),
        camera_id: camera.to_string(),
        timestamp: ts.parse().expect("valid demo timestamp"),
        confidence: 85.0,
        status: IncidentStatus::Active,
        assigned_responder: None,
        resolution_type: None,
        people_count: None,
        description: None,
    };

    let mut fight = seed(
        "demo-001",
        "violence",
        Severity::Critical,
        "Platform 2",
        "CAM-07",
        "2026-08-26T09:58:00Z",
    );
    fight.people_count = Some(4);
    fight.description = Some("Altercation near ticket gates".to_string());

    let mut crash = seed(
        "demo-002",
        "crash",
        Severity::High,
        "Parking Lot North",
        "CAM-12",
        "2026-08-26T10:02:00Z",
    );
    crash.status = IncidentStatus::Dispatched;
    crash.assigned_responder = Some("officer-3".to_string());

    let loiter = seed(
        "demo-003",
        "loitering",
        Severity::Low,
        "Service Entrance",
        "CAM-19",
        "2026-08-26T10:05:00Z",
    );

    store.apply_snapshot(vec![fight, crash, loiter]);
    log::info!("seeded {} demo incidents", store.len());
}
