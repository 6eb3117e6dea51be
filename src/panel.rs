use chrono::Local;
use eframe::egui::{self, RichText, Slider, Ui};

use crate::{app::AppState, status::MonsterState, theme};

pub fn draw(app: &mut AppState, ui: &mut Ui) {
    ui.label(
        RichText::new("Grass Reaper")
            .size(24.0)
            .strong()
            .color(theme::COLOR_ACCENT),
    );
    ui.add_space(4.0);

    draw_status_card(app, ui);
    draw_settings_card(app, ui);
    draw_preview_card(app, ui);
}

fn draw_status_card(app: &mut AppState, ui: &mut Ui) {
    let record = app.current;
    theme::card(ui, "Monster Status", |ui| {
        let Some(record) = record else {
            ui.label("Loading status...");
            return;
        };
        let state_color = match record.state {
            MonsterState::Hungry => theme::COLOR_HUNGRY,
            MonsterState::Satisfied => theme::COLOR_SATISFIED,
        };
        ui.horizontal(|ui| {
            theme::status_dot(ui, state_color);
            ui.label("Status:");
            ui.label(
                RichText::new(record.state.wire_name())
                    .strong()
                    .color(state_color),
            );
        });
        if record.state.is_agitated() {
            ui.horizontal(|ui| {
                ui.label("Anger Level:");
                let track_width = (ui.available_width() - 58.0).max(120.0);
                anger_bar(ui, track_width, record.intensity);
                ui.add_sized(
                    [40.0, 18.0],
                    egui::Label::new(
                        RichText::new(format!("{}%", record.intensity))
                            .strong()
                            .monospace()
                            .color(theme::COLOR_WARNING),
                    ),
                );
            });
        }
        let local = record.observed_at.with_timezone(&Local);
        ui.label(
            RichText::new(format!("Last Check: {}", local.format("%Y-%m-%d %H:%M:%S")))
                .small()
                .color(egui::Color32::from_rgb(140, 140, 140)),
        );
        if record.state.is_agitated() {
            ui.add_space(4.0);
            ui.label(
                RichText::new("Go commit something before the grass consumes you!")
                    .color(theme::COLOR_WARNING),
            );
        }
    });
}

fn draw_settings_card(app: &mut AppState, ui: &mut Ui) {
    let mut config_changed = false;
    theme::card(ui, "Settings", |ui| {
        ui.horizontal(|ui| {
            ui.label("Endpoint:");
            if ui
                .add_sized(
                    [(ui.available_width()).max(180.0), 28.0],
                    egui::TextEdit::singleline(&mut app.config.endpoint_url),
                )
                .changed()
            {
                config_changed = true;
            }
        });
        ui.horizontal(|ui| {
            ui.label("Poll every:");
            let slider_w = (ui.available_width() - 58.0).max(120.0);
            if ui
                .add_sized(
                    [slider_w, 24.0],
                    Slider::new(&mut app.config.poll_minutes, 1..=120).suffix(" min"),
                )
                .changed()
            {
                config_changed = true;
            }
        });
        if ui
            .checkbox(&mut app.config.overlay_enabled, "Show grass overlay")
            .changed()
        {
            config_changed = true;
        }
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            if theme::primary_button(ui, "Save & Apply").clicked() {
                app.settings_status = Some(match app.save_settings_now() {
                    Ok(()) => "Settings saved.".to_owned(),
                    Err(err) => format!("Save failed: {err}"),
                });
            }
            if theme::small_button(ui, "Check now").clicked() {
                app.request_check_now();
            }
        });
        if let Some(status) = &app.settings_status {
            ui.label(
                RichText::new(status)
                    .small()
                    .color(egui::Color32::from_rgb(140, 140, 140)),
            );
        }
    });
    if config_changed {
        app.request_settings_save();
    }
}

fn draw_preview_card(app: &mut AppState, ui: &mut Ui) {
    theme::card(ui, "Overlay Preview", |ui| {
        ui.label(
            RichText::new("Feed the monster a fake status to preview the overlay drawing.")
                .small()
                .color(egui::Color32::from_rgb(140, 140, 140)),
        );
        ui.horizontal(|ui| {
            if theme::small_button(ui, "Preview hungry").clicked() {
                app.preview_status(MonsterState::Hungry, 70);
            }
            if theme::small_button(ui, "Preview satisfied").clicked() {
                app.preview_status(MonsterState::Satisfied, 0);
            }
        });
    });
}

fn anger_bar(ui: &mut Ui, width: f32, intensity: u8) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(width, 14.0), egui::Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 3.0, theme::COLOR_BAR_TRACK);
    if intensity > 0 {
        let fill = egui::Rect::from_min_size(
            rect.min,
            egui::vec2(bar_fill_width(rect.width(), intensity), rect.height()),
        );
        painter.rect_filled(fill, 3.0, theme::COLOR_BAR_FILL);
    }
    painter.rect_stroke(rect, 3.0, egui::Stroke::new(1.0, theme::COLOR_BORDER));
}

fn bar_fill_width(track_width: f32, intensity: u8) -> f32 {
    track_width * f32::from(intensity.min(100)) / 100.0
}
