use eframe::egui::{self, Color32, Context, Frame, RichText, Style, Ui, Visuals};

pub const COLOR_BG: Color32 = Color32::from_rgb(17, 17, 17); // #111111
pub const COLOR_PANEL: Color32 = Color32::from_rgb(17, 17, 17); // #111111
pub const COLOR_ACCENT: Color32 = Color32::from_rgb(74, 222, 128); // #4ade80
pub const COLOR_TEXT: Color32 = Color32::from_rgb(220, 220, 220);
pub const COLOR_BORDER: Color32 = Color32::from_rgb(51, 51, 51); // #333333
pub const COLOR_CARD_BG: Color32 = Color32::from_rgb(22, 22, 22);
pub const COLOR_HUNGRY: Color32 = Color32::from_rgb(220, 60, 60);
pub const COLOR_SATISFIED: Color32 = COLOR_ACCENT;
pub const COLOR_WARNING: Color32 = Color32::from_rgb(248, 113, 113); // #f87171
pub const COLOR_BAR_TRACK: Color32 = Color32::from_rgb(34, 34, 34); // #222222
pub const COLOR_BAR_FILL: Color32 = Color32::from_rgb(220, 38, 38); // #dc2626

pub fn apply_theme(ctx: &Context) {
    let mut style = Style::default();
    let mut visuals = Visuals::dark();

    // Backgrounds
    visuals.window_fill = COLOR_BG;
    visuals.panel_fill = COLOR_PANEL;

    // Widgets
    visuals.widgets.noninteractive.bg_fill = COLOR_PANEL;
    visuals.widgets.noninteractive.fg_stroke = egui::Stroke::new(1.0, COLOR_TEXT);

    // Buttons (Inactive)
    visuals.widgets.inactive.bg_fill = Color32::from_rgb(34, 34, 34);
    visuals.widgets.inactive.fg_stroke = egui::Stroke::new(1.0, COLOR_TEXT);
    visuals.widgets.inactive.bg_stroke = egui::Stroke::new(1.0, COLOR_BORDER);
    visuals.widgets.inactive.weak_bg_fill = Color32::from_rgb(34, 34, 34);

    // Buttons (Hover)
    visuals.widgets.hovered.bg_fill = Color32::from_rgb(45, 45, 45); // #2d2d2d
    visuals.widgets.hovered.fg_stroke = egui::Stroke::new(1.0, Color32::WHITE);
    visuals.widgets.hovered.bg_stroke = egui::Stroke::new(1.0, Color32::from_rgb(90, 90, 90));
    visuals.widgets.hovered.expansion = 0.0;

    // Buttons (Active)
    visuals.widgets.active.bg_fill = Color32::from_rgb(22, 78, 40); // green pressed
    visuals.widgets.active.fg_stroke = egui::Stroke::new(1.0, COLOR_ACCENT);
    visuals.widgets.active.bg_stroke = egui::Stroke::new(1.0, COLOR_ACCENT);

    // Selection
    visuals.selection.bg_fill = COLOR_ACCENT.linear_multiply(0.3);
    visuals.selection.stroke = egui::Stroke::new(1.0, COLOR_ACCENT);

    // Separators
    visuals.widgets.noninteractive.bg_stroke = egui::Stroke::new(1.0, COLOR_BORDER);

    style.visuals = visuals;

    // Spacing
    style.spacing.item_spacing = egui::vec2(10.0, 8.0);
    style.spacing.window_margin = egui::Margin::same(0.0);
    style.spacing.button_padding = egui::vec2(12.0, 8.0);
    style.spacing.interact_size.y = 30.0;

    ctx.set_style(style);
}

pub fn card_frame() -> Frame {
    Frame::none()
        .fill(COLOR_CARD_BG)
        .stroke(egui::Stroke::new(1.0, COLOR_BORDER))
        .inner_margin(egui::Margin::same(14.0))
}

pub fn card(ui: &mut Ui, title: &str, add_contents: impl FnOnce(&mut Ui)) {
    card_frame().show(ui, |ui| {
        ui.label(
            RichText::new(title.to_ascii_uppercase())
                .size(13.0)
                .strong()
                .color(COLOR_ACCENT),
        );
        ui.add_space(8.0);
        add_contents(ui);
    });
    ui.add_space(8.0);
}

pub fn small_button(ui: &mut Ui, text: &str) -> egui::Response {
    let width = (text.chars().count() as f32 * 7.2 + 26.0).clamp(108.0, 240.0);
    ui.add_sized([width, 30.0], egui::Button::new(text.to_ascii_uppercase()))
}

pub fn primary_button(ui: &mut Ui, text: &str) -> egui::Response {
    ui.scope(|ui| {
        let visuals = &mut ui.style_mut().visuals;
        visuals.widgets.inactive.bg_fill = Color32::from_rgb(22, 101, 52); // #166534
        visuals.widgets.inactive.bg_stroke = egui::Stroke::new(1.0, Color32::from_rgb(22, 101, 52));
        visuals.widgets.hovered.bg_fill = Color32::from_rgb(21, 128, 61); // #15803d
        visuals.widgets.hovered.bg_stroke = egui::Stroke::new(1.0, COLOR_ACCENT);
        visuals.widgets.active.bg_fill = Color32::from_rgb(20, 83, 45); // #14532d
        ui.add_sized(
            [164.0, 34.0],
            egui::Button::new(RichText::new(text.to_ascii_uppercase()).strong()),
        )
    })
    .inner
}

pub fn status_dot(ui: &mut Ui, color: Color32) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
    ui.painter().circle_filled(rect.center(), 5.0, color);
}
