//! Squadrone Tracker entry point.
//!
//! Wires the journal monitor into the dispatcher, registers the UI bridge
//! and stream forwarder, and runs the stream service as its own unit until
//! Ctrl-C.

mod config;
mod consumers;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use squadrone_dispatch::{Dispatcher, NotificationSink};
use squadrone_journal::monitor::{self, MonitorConfig};
use squadrone_stream::{CHANNEL_CAPACITY, ServerConfig, StreamService, channel};

use config::TrackerConfig;
use consumers::{LogNotificationSink, StreamForwarder, UiBridge};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,squadrone=debug")),
        )
        .init();

    let cfg = TrackerConfig::load().unwrap_or_default();
    let cancel = CancellationToken::new();

    // Dispatcher with the notification rule wired to the presenter seam.
    let sink = cfg
        .notifications_enabled
        .then(|| Arc::new(LogNotificationSink) as Arc<dyn NotificationSink>);
    let dispatcher = Arc::new(Dispatcher::new(sink));

    // UI bridge: the window layer drains the receiver.
    let (ui, mut ui_rx) = UiBridge::new(256);
    dispatcher.register(Arc::new(ui));
    tokio::spawn(async move {
        while let Some(event) = ui_rx.recv().await {
            tracing::debug!(kind = %event.kind, "ui event");
        }
    });

    // Stream service on its own channel; the tail loop never blocks on it.
    let (handle, inbox) = channel::channel(CHANNEL_CAPACITY);
    dispatcher.register(Arc::new(StreamForwarder::new(handle.clone())));
    handle.hello();

    let service = Arc::new(StreamService::new(
        ServerConfig {
            bind_addr: cfg.stream_bind,
            port: cfg.stream_port,
        },
        cancel.child_token(),
    ));
    let run_service = Arc::clone(&service);
    let service_task = tokio::spawn(async move {
        if let Err(e) = run_service.run(inbox).await {
            tracing::error!("stream service failed: {e}");
        }
    });

    // Log the service's liveness reply once it comes back.
    let ready_handle = handle.clone();
    tokio::spawn(async move {
        for _ in 0..50 {
            if ready_handle.is_ready() {
                for msg in ready_handle.poll_control() {
                    tracing::debug!(?msg, "stream service control message");
                }
                tracing::info!("stream service ready");
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
        tracing::warn!("stream service did not report ready");
    });

    // Journal monitor feeding the dispatcher.
    let on_event_dispatcher = Arc::clone(&dispatcher);
    let on_error_dispatcher = Arc::clone(&dispatcher);
    let monitor_task = tokio::spawn(monitor::run(
        MonitorConfig::new(cfg.journal_dir.clone()),
        cancel.child_token(),
        Box::new(move |event| {
            on_event_dispatcher.dispatch(&event);
        }),
        Box::new(move |error| {
            on_error_dispatcher.dispatch_decode_error(&error);
        }),
    ));

    tracing::info!(dir = %cfg.journal_dir.display(), "tracking journal directory");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    cancel.cancel();

    let _ = monitor_task.await;
    let _ = service_task.await;

    let dropped = handle.dropped_count();
    if dropped > 0 {
        tracing::warn!(dropped, "stream channel dropped messages this session");
    }
    Ok(())
}
