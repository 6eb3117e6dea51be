use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::Utc;
use eframe::egui::{self, Color32};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    config::AppConfig,
    monster::GrassMonster,
    panel,
    poller::PollerCommand,
    status::{MonsterState, StatusRecord},
    store::{StatusStore, StatusSubscription},
};

pub struct AppState {
    pub config: AppConfig,
    config_path: PathBuf,
    subscription: StatusSubscription,
    poller: UnboundedSender<PollerCommand>,
    pub current: Option<StatusRecord>,
    pub monster: GrassMonster,
    pub settings_status: Option<String>,
    settings_dirty: bool,
    window_geometry_changed_at: Option<Instant>,
}

impl AppState {
    pub fn new(
        store: &Arc<StatusStore>,
        config: AppConfig,
        config_path: PathBuf,
        poller: UnboundedSender<PollerCommand>,
    ) -> Self {
        let subscription = store.subscribe();
        let current = store.get();
        let mut monster = GrassMonster::new();
        if let Some(record) = &current {
            monster.apply_status(record);
        }
        Self {
            config,
            config_path,
            subscription,
            poller,
            current,
            monster,
            settings_status: None,
            settings_dirty: false,
            window_geometry_changed_at: None,
        }
    }

    fn update_state(&mut self, ctx: &egui::Context) {
        self.drain_status_updates();
        self.sync_panel_window_geometry(ctx);
        self.flush_window_geometry_if_due(ctx);
        if self.settings_dirty {
            let _ = self.save_settings_now();
        }
        // Poll results arrive between frames; keep a slow repaint ticking so
        // the panel notices them without user input.
        ctx.request_repaint_after(Duration::from_millis(500));
    }

    fn drain_status_updates(&mut self) {
        while let Some(record) = self.subscription.try_next() {
            self.monster.apply_status(&record);
            self.current = Some(record);
        }
    }

    fn pointer_intercept_active(&self) -> bool {
        self.current
            .map(|record| record.intercepts_pointer())
            .unwrap_or(false)
    }

    pub fn request_settings_save(&mut self) {
        self.settings_dirty = true;
    }

    pub fn save_settings_now(&mut self) -> Result<(), String> {
        self.config
            .save(&self.config_path)
            .map_err(|e| format!("save failed: {e}"))?;
        self.poller
            .send(PollerCommand::Apply(self.config.clone()))
            .map_err(|e| format!("poller apply failed: {e}"))?;
        self.settings_dirty = false;
        Ok(())
    }

    pub fn request_check_now(&mut self) {
        if self.poller.send(PollerCommand::CheckNow).is_ok() {
            self.settings_status = Some("Check requested.".to_owned());
        } else {
            self.settings_status = Some("Status poller is not running.".to_owned());
        }
    }

    // Previews drive the monster directly; the live record and the
    // click-through decision keep following real poll results.
    pub fn preview_status(&mut self, state: MonsterState, intensity: u8) {
        let record = StatusRecord {
            state,
            intensity,
            observed_at: Utc::now(),
        };
        self.monster.apply_status(&record);
    }

    fn sync_panel_window_geometry(&mut self, ctx: &egui::Context) {
        let (minimized, inner_rect, outer_rect) = ctx.input(|input| {
            let viewport = input.viewport();
            (viewport.minimized, viewport.inner_rect, viewport.outer_rect)
        });
        if minimized.unwrap_or(false) {
            return;
        }

        let mut changed = false;
        if let Some(inner) = inner_rect {
            let width = inner.width().clamp(320.0, 4096.0).round();
            let height = inner.height().clamp(240.0, 4096.0).round();
            if (self.config.panel_window.width - width).abs() >= 1.0 {
                self.config.panel_window.width = width;
                changed = true;
            }
            if (self.config.panel_window.height - height).abs() >= 1.0 {
                self.config.panel_window.height = height;
                changed = true;
            }
        }
        if let Some(outer) = outer_rect {
            let pos_x = outer.min.x.round();
            let pos_y = outer.min.y.round();
            if self
                .config
                .panel_window
                .pos_x
                .map(|value| (value - pos_x).abs() >= 1.0)
                .unwrap_or(true)
            {
                self.config.panel_window.pos_x = Some(pos_x);
                changed = true;
            }
            if self
                .config
                .panel_window
                .pos_y
                .map(|value| (value - pos_y).abs() >= 1.0)
                .unwrap_or(true)
            {
                self.config.panel_window.pos_y = Some(pos_y);
                changed = true;
            }
        }
        if changed {
            self.window_geometry_changed_at = Some(Instant::now());
        }
    }

    fn flush_window_geometry_if_due(&mut self, ctx: &egui::Context) {
        let Some(changed_at) = self.window_geometry_changed_at else {
            return;
        };
        let close_requested = ctx.input(|input| input.viewport().close_requested());
        if !close_requested && changed_at.elapsed() < Duration::from_millis(600) {
            return;
        }
        self.window_geometry_changed_at = None;
        self.request_settings_save();
    }

    fn draw_overlay(&mut self, ctx: &egui::Context) {
        ctx.request_repaint_after(if self.monster.is_animating() {
            Duration::from_millis(33)
        } else {
            Duration::from_millis(250)
        });

        // Always paint a transparent base panel so the overlay clear pass stays alpha.
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::TRANSPARENT))
            .show(ctx, |_ui| {});

        self.monster.step(ctx.screen_rect());
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("grass_monster"),
        ));
        self.monster.paint(&painter);
    }
}

pub struct ReaperApp {
    state: std::rc::Rc<std::cell::RefCell<AppState>>,
}

impl ReaperApp {
    pub fn new(
        store: &Arc<StatusStore>,
        config: AppConfig,
        config_path: PathBuf,
        poller: UnboundedSender<PollerCommand>,
    ) -> Self {
        let state = AppState::new(store, config, config_path, poller);
        Self {
            state: std::rc::Rc::new(std::cell::RefCell::new(state)),
        }
    }
}

impl eframe::App for ReaperApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut state = self.state.borrow_mut();

        // 1. Common State Update (Status, Geometry)
        state.update_state(ctx);

        // 2. Draw Panel (Always active window)
        egui::CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(crate::theme::COLOR_BG)
                    .inner_margin(egui::Margin::same(14.0)),
            )
            .show(ctx, |ui| {
                ui.add_space(2.0);
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| panel::draw(&mut state, ui));
            });

        // 3. Draw Overlay (If enabled)
        if state.config.overlay_enabled {
            drop(state); // Drop borrow to allow viewport closure to borrow again

            let state_rc = self.state.clone();
            // Overlay must be click-through except while the monster is angry
            // enough to grab the pointer.
            let mouse_passthrough = {
                let borrowed = state_rc.borrow();
                !borrowed.pointer_intercept_active()
            };
            ctx.show_viewport_immediate(
                egui::ViewportId::from_hash_of("overlay_viewport"),
                egui::ViewportBuilder::default()
                    .with_title("Grass Overlay")
                    .with_transparent(true)
                    .with_decorations(false)
                    .with_maximized(true)
                    .with_always_on_top()
                    .with_mouse_passthrough(mouse_passthrough)
                    .with_taskbar(false),
                move |ctx, _class| {
                    let mut state = state_rc.borrow_mut();
                    state.draw_overlay(ctx);
                },
            );
        }
    }
}

impl Drop for ReaperApp {
    fn drop(&mut self) {
        if let Ok(state) = self.state.try_borrow() {
            if state.settings_dirty || state.window_geometry_changed_at.is_some() {
                let _ = state.config.save(&state.config_path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf, sync::Arc, time::SystemTime};

    use chrono::Utc;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    use crate::{
        config::AppConfig,
        poller::PollerCommand,
        status::{MonsterState, StatusRecord},
        store::StatusStore,
    };

    use super::AppState;

    fn temp_path(tag: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .expect("clock should be valid")
            .as_nanos();
        std::env::temp_dir().join(format!("grass_reaper_app_{tag}_{unique}.json"))
    }

    fn record(state: MonsterState, intensity: u8) -> StatusRecord {
        StatusRecord {
            state,
            intensity,
            observed_at: Utc::now(),
        }
    }

    fn new_state(
        tag: &str,
    ) -> (
        AppState,
        Arc<StatusStore>,
        UnboundedReceiver<PollerCommand>,
    ) {
        let store = StatusStore::open(temp_path(tag));
        let (tx, rx) = unbounded_channel();
        let state = AppState::new(
            &store,
            AppConfig::default(),
            temp_path(&format!("{tag}_cfg")),
            tx,
        );
        (state, store, rx)
    }

    #[test]
    fn startup_seeds_monster_from_persisted_status() {
        let store = StatusStore::open(temp_path("seed"));
        store
            .set(record(MonsterState::Hungry, 60))
            .expect("seed status should persist");
        let (tx, _rx) = unbounded_channel();
        let state = AppState::new(&store, AppConfig::default(), temp_path("seed_cfg"), tx);

        assert_eq!(state.current.map(|r| r.state), Some(MonsterState::Hungry));
        assert_eq!(state.monster.particle_count(), 5);
    }

    #[test]
    fn drain_applies_published_updates_in_order() {
        let (mut state, store, _rx) = new_state("drain");
        store
            .set(record(MonsterState::Hungry, 70))
            .expect("should publish");
        store
            .set(record(MonsterState::Satisfied, 0))
            .expect("should publish");

        state.drain_status_updates();

        assert_eq!(
            state.current.map(|r| r.state),
            Some(MonsterState::Satisfied)
        );
        // Hungry then Satisfied inside one drain leaves the monster settling.
        assert!(state.monster.is_settling());
    }

    #[test]
    fn preview_feeds_monster_without_touching_live_status() {
        let (mut state, _store, _rx) = new_state("preview");
        state.preview_status(MonsterState::Hungry, 70);

        assert!(state.current.is_none());
        assert_eq!(state.monster.particle_count(), 5);
        assert!(!state.pointer_intercept_active());
    }

    #[test]
    fn pointer_intercept_follows_live_intensity() {
        let (mut state, store, _rx) = new_state("intercept");
        store
            .set(record(MonsterState::Hungry, 80))
            .expect("should publish");
        state.drain_status_updates();
        assert!(state.pointer_intercept_active());

        store
            .set(record(MonsterState::Hungry, 30))
            .expect("should publish");
        state.drain_status_updates();
        assert!(!state.pointer_intercept_active());
    }

    #[test]
    fn save_settings_now_writes_config_and_reapplies_poller() {
        let (mut state, _store, mut rx) = new_state("save");
        state.config.poll_minutes = 30;

        state.save_settings_now().expect("settings should save");

        let saved: AppConfig = serde_json::from_str(
            &fs::read_to_string(&state.config_path).expect("config file should exist"),
        )
        .expect("config file should parse");
        assert_eq!(saved.poll_minutes, 30);
        match rx.try_recv() {
            Ok(PollerCommand::Apply(applied)) => assert_eq!(applied.poll_minutes, 30),
            other => panic!("expected apply command, got {other:?}"),
        }
        fs::remove_file(&state.config_path).ok();
    }

    #[test]
    fn check_now_reaches_the_poller() {
        let (mut state, _store, mut rx) = new_state("check_now");
        state.request_check_now();
        assert!(matches!(rx.try_recv(), Ok(PollerCommand::CheckNow)));
        assert_eq!(state.settings_status.as_deref(), Some("Check requested."));
    }
}
