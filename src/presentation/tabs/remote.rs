use crate::domain::models::JoystickVector;
use crate::presentation::app::{PadStyle, WheelchairApp};
use crate::presentation::pad::PadDirection;
use crate::presentation::components::Components;
use eframe::egui;

pub fn render(app: &mut WheelchairApp, ui: &mut egui::Ui) {
    Components::heading(ui, "Remote Control");
    ui.add_space(10.0);

    if !app.snapshot.state.is_connected() {
        ui.label(
            egui::RichText::new("No device connected, commands will be rejected.")
                .color(egui::Color32::from_rgb(200, 150, 0)),
        );
        ui.add_space(10.0);
    }

    ui_drive_panel(app, ui);
    ui.add_space(15.0);

    ui_pad_panel(app, ui);
    ui.add_space(15.0);

    ui_accessory_panel(app, ui);
}

fn ui_drive_panel(app: &mut WheelchairApp, ui: &mut egui::Ui) {
    let threshold = app.controls().joystick_threshold;
    Components::brutalist_card(ui, "Drive", |ui| {
        if let Some(vector) = app.drive_stick.show(ui, threshold) {
            app.session.joystick_move(app.drive_stick.surface, vector);
        }
        ui.label(format_vector(app.drive_stick.vector()));
    });
}

fn ui_pad_panel(app: &mut WheelchairApp, ui: &mut egui::Ui) {
    let threshold = app.controls().pad_threshold;
    Components::brutalist_card(ui, "Direction Pad", |ui| {
        ui.horizontal(|ui| {
            ui.selectable_value(&mut app.pad_style, PadStyle::Buttons, "Buttons");
            ui.selectable_value(&mut app.pad_style, PadStyle::Stick, "Stick");
        });

        match app.pad_style {
            PadStyle::Buttons => {
                let held = pad_buttons(ui);
                app.update_pad(held);
                if ui.button("■ STOP").clicked() {
                    app.session.stop_moving();
                }
            }
            PadStyle::Stick => {
                app.update_pad(None);
                if let Some(vector) = app.pad_stick.show(ui, threshold) {
                    app.session.joystick_move(app.pad_stick.surface, vector);
                }
            }
        }
    });
}

/// Lays out the four direction buttons and reports which one is held.
fn pad_buttons(ui: &mut egui::Ui) -> Option<PadDirection> {
    let size = egui::vec2(70.0, 50.0);
    let mut held = None;
    let mut pad_button = |ui: &mut egui::Ui, text: &str, direction: PadDirection| {
        if ui.add_sized(size, egui::Button::new(text)).is_pointer_button_down_on() {
            held = Some(direction);
        }
    };

    egui::Grid::new("pad_grid").spacing([6.0, 6.0]).show(ui, |ui| {
        ui.label("");
        pad_button(ui, "▲", PadDirection::Up);
        ui.label("");
        ui.end_row();

        pad_button(ui, "◀", PadDirection::Left);
        ui.label("");
        pad_button(ui, "▶", PadDirection::Right);
        ui.end_row();

        ui.label("");
        pad_button(ui, "▼", PadDirection::Down);
        ui.label("");
        ui.end_row();
    });
    held
}

fn ui_accessory_panel(app: &mut WheelchairApp, ui: &mut egui::Ui) {
    Components::brutalist_card(ui, "Accessories", |ui| {
        ui.horizontal(|ui| {
            if ui.toggle_value(&mut app.light_on, "💡 Light").changed() {
                if app.light_on {
                    app.session.light_on();
                } else {
                    app.session.light_off();
                }
            }
            if ui.toggle_value(&mut app.alarm_on, "🔔 Alarm").changed() {
                if app.alarm_on {
                    app.session.alarm_on();
                } else {
                    app.session.alarm_off();
                }
            }
        });

        ui.horizontal(|ui| {
            ui.label("Speed:");
            if ui.button("−").clicked() {
                app.session.speed_decrease();
            }
            if ui.button("+").clicked() {
                app.session.speed_increase();
            }
        });

        ui.horizontal(|ui| {
            ui.label("Mode:");
            ui.text_edit_singleline(&mut app.mode_input);
            if ui.button("Select").clicked() {
                let mode = app.mode_input.trim();
                let mode = (!mode.is_empty()).then(|| mode.to_string());
                app.session.select_mode(mode);
            }
        });

        ui.separator();
        if ui.button("Reset device").clicked() {
            app.light_on = false;
            app.alarm_on = false;
            app.session.reset();
        }
    });
}

fn format_vector(v: JoystickVector) -> String {
    format!("x {:+.2}  y {:+.2}", v.x, v.y)
}
