mod app;
mod config;
mod monster;
mod noise;
mod panel;
mod poller;
mod status;
mod store;
mod theme;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::{
    app::ReaperApp,
    config::AppConfig,
    poller::{spawn_status_poller, PollerCommand},
    store::{StatusStore, STATUS_FILE_NAME},
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (config, config_path) = AppConfig::load_or_create()?;
    let store = StatusStore::open(config_path.with_file_name(STATUS_FILE_NAME));

    let (poller_tx, poller_rx) = mpsc::unbounded_channel::<PollerCommand>();
    spawn_status_poller(config.clone(), store.clone(), poller_rx);

    let startup_width = config.panel_window.width.clamp(320.0, 4096.0);
    let startup_height = config.panel_window.height.clamp(240.0, 4096.0);
    let mut viewport = egui::ViewportBuilder::default()
        .with_decorations(true)
        .with_resizable(true)
        .with_inner_size([startup_width, startup_height])
        .with_title("Grass Reaper");
    if let (Some(x), Some(y)) = (config.panel_window.pos_x, config.panel_window.pos_y) {
        viewport = viewport.with_position(egui::pos2(x, y));
    }

    let native_options = eframe::NativeOptions {
        viewport,
        renderer: eframe::Renderer::Glow,
        ..Default::default()
    };

    eframe::run_native(
        "Grass Reaper",
        native_options,
        Box::new(move |cc| {
            crate::theme::apply_theme(&cc.egui_ctx);
            Ok(Box::new(ReaperApp::new(
                &store,
                config,
                config_path,
                poller_tx,
            )))
        }),
    )
    .map_err(|err| anyhow::anyhow!("failed starting panel window: {err}"))?;

    Ok(())
}
