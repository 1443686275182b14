//! # homifi-demo: simulated product page
//!
//! Composition root that wires the simulated host to the device engine and
//! walks through the page like a visitor would.
//!
//! ## Responsibilities
//! - Load configuration (`homifi.toml`, env vars)
//! - Initialize structured logging
//! - Build the showcase: one engine, five feature sections, one viewport
//! - Scroll to the bottom so every section auto-triggers
//! - Tap every section a few times in quick succession
//! - Answer the security notification, then tear the page down
//! - Log the diagnostics journal as it fills
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use homifi_adapter_virtual::surfaces::ToggleRole;
use homifi_adapter_virtual::{Frame, Showcase};
use homifi_app::event_bus::drain;
use homifi_domain::device::{DeviceKind, DeviceState};
use homifi_domain::event::DeviceEvent;
use homifi_domain::transition::SecurityAction;

use crate::config::Config;

const IDLE_POLL: Duration = Duration::from_millis(100);
const IDLE_LIMIT: Duration = Duration::from_secs(30);

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Page
    let mut showcase =
        Showcase::build(config.showcase_options()).context("failed to build showcase")?;
    let mut journal = Journal::new(showcase.bus().subscribe());

    // Scroll through every section
    showcase.scroll_to(0.0);
    while !showcase.scroll().at_bottom() {
        let entered = showcase.scroll_by(config.demo.scroll_step_px);
        if entered > 0 {
            tracing::info!(
                offset = showcase.scroll().viewport().top,
                entered,
                "sections entered viewport"
            );
        }
        tokio::time::sleep(config.scroll_interval()).await;
        journal.flush();
    }
    wait_idle(&showcase, &mut journal).await;
    log_states(&showcase);

    // Rapid taps: only the first of each burst is accepted
    for section in showcase.sections() {
        let accepted = (0..config.demo.taps)
            .filter(|_| section.tap(ToggleRole::Primary))
            .count();
        tracing::info!(kind = %section.kind(), taps = config.demo.taps, accepted, "tapped");
    }
    wait_idle(&showcase, &mut journal).await;
    log_states(&showcase);

    // Bring the visitor back and answer the door
    if let Some(security) = showcase.section(DeviceKind::Security) {
        if security.device().state() == DeviceState::Clear {
            security.tap(ToggleRole::Primary);
        }
        let device = security.device();
        let rang = settle(&mut journal, || device.state() == DeviceState::Notification).await;
        let answered = rang && security.act(SecurityAction::Answer);
        tracing::info!(answered, "security notification answered");
        wait_idle(&showcase, &mut journal).await;
    }

    if !showcase.is_consistent() {
        tracing::warn!("surfaces disagree with their device");
    }
    let media = showcase.media();
    tracing::info!(
        frames = media.frames().len(),
        blank = media.blank_frames(),
        stills = media
            .frames()
            .iter()
            .filter(|frame| matches!(frame, Frame::Still(_)))
            .count(),
        "curtain video summary"
    );

    showcase.teardown();
    tokio::task::yield_now().await;
    journal.flush();
    journal.summarize();

    Ok(())
}

/// Wait until no section is transitioning, settling or waiting to revert.
async fn wait_idle(showcase: &Showcase, journal: &mut Journal) {
    let trigger = showcase.trigger();
    let idle = settle(journal, || {
        showcase.sections().iter().all(|section| {
            let device = section.device();
            !device.snapshot().is_transitioning
                && !device.scheduler().revert_pending()
                && !trigger.is_settling(section.container())
        })
    })
    .await;
    if !idle {
        tracing::warn!(limit = ?IDLE_LIMIT, "devices still busy");
    }
}

/// Poll `done` until it holds, logging the journal meanwhile. Gives up
/// after [`IDLE_LIMIT`].
async fn settle(journal: &mut Journal, mut done: impl FnMut() -> bool) -> bool {
    let poll = async {
        loop {
            tokio::time::sleep(IDLE_POLL).await;
            journal.flush();
            if done() {
                break;
            }
        }
    };
    tokio::time::timeout(IDLE_LIMIT, poll).await.is_ok()
}

fn log_states(showcase: &Showcase) {
    for section in showcase.sections() {
        tracing::info!(kind = %section.kind(), state = %section.device().state(), "device at rest");
    }
}

/// Logs journal entries as they arrive and counts them per type.
struct Journal {
    rx: broadcast::Receiver<DeviceEvent>,
    counts: BTreeMap<String, usize>,
}

impl Journal {
    fn new(rx: broadcast::Receiver<DeviceEvent>) -> Self {
        Self {
            rx,
            counts: BTreeMap::new(),
        }
    }

    fn flush(&mut self) {
        for event in drain(&mut self.rx) {
            tracing::debug!(
                event_type = %event.event_type,
                device_id = %event.device_id,
                data = %event.data,
                "journal"
            );
            *self.counts.entry(event.event_type.to_string()).or_default() += 1;
        }
    }

    fn summarize(&self) {
        for (event_type, count) in &self.counts {
            tracing::info!(%event_type, count, "journal summary");
        }
    }
}
