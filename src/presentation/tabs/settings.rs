use crate::domain::dispatcher::ReversalPolicy;
use crate::domain::models::{MessageSeverity, OperatorRole};
use crate::domain::settings::ControlSettings;
use crate::presentation::app::WheelchairApp;
use crate::presentation::components::Components;
use eframe::egui;

pub fn render(app: &mut WheelchairApp, ui: &mut egui::Ui) {
    Components::heading(ui, "Global Settings");
    ui.add_space(20.0);

    let mut controls_changed = false;
    let mut dirty = false;
    let mut new_controls = None;

    if let Ok(mut settings) = app.settings.lock() {
        let settings_mut = settings.get_mut();

        Components::brutalist_card(ui, "Operator", |ui| {
            ui.horizontal(|ui| {
                ui.label("Role:");
                egui::ComboBox::from_id_salt("operator_role")
                    .selected_text(settings_mut.operator_role.name())
                    .show_ui(ui, |ui| {
                        for role in [OperatorRole::Controlling, OperatorRole::Controlled] {
                            dirty |= ui
                                .selectable_value(&mut settings_mut.operator_role, role, role.name())
                                .changed();
                        }
                    });
            });

            if settings_mut.operator_role.requires_device_authorization() {
                let token = settings_mut.access_token.get_or_insert_with(String::new);
                ui.horizontal(|ui| {
                    ui.label("Access token:");
                    ui.add(egui::TextEdit::singleline(token).password(true));
                });
                if token.is_empty() {
                    settings_mut.access_token = None;
                }
                ui.label(
                    egui::RichText::new("The token is kept for this run only.")
                        .italics()
                        .size(12.0),
                );
            }
        });

        ui.add_space(10.0);

        Components::brutalist_card(ui, "Joystick Tuning", |ui| {
            let controls = &mut settings_mut.controls;
            let range = ControlSettings::MIN_THRESHOLD..=ControlSettings::MAX_THRESHOLD;

            ui.horizontal(|ui| {
                ui.label("Drive neutral band:");
                controls_changed |= ui
                    .add(egui::Slider::new(&mut controls.joystick_threshold, range.clone()))
                    .changed();
            });
            ui.horizontal(|ui| {
                ui.label("Pad neutral band:");
                controls_changed |= ui
                    .add(egui::Slider::new(&mut controls.pad_threshold, range))
                    .changed();
            });

            ui.horizontal(|ui| {
                ui.label("On direction reversal:");
                egui::ComboBox::from_id_salt("reversal_policy")
                    .selected_text(policy_label(controls.reversal_policy))
                    .show_ui(ui, |ui| {
                        for policy in [ReversalPolicy::StopThenRestart, ReversalPolicy::ContinueMotion] {
                            controls_changed |= ui
                                .selectable_value(
                                    &mut controls.reversal_policy,
                                    policy,
                                    policy_label(policy),
                                )
                                .changed();
                        }
                    });
            });

            if controls_changed {
                new_controls = Some(controls.clone());
            }
        });

        ui.add_space(10.0);

        Components::brutalist_card(ui, "Logging & Debug", |ui| {
            ui.horizontal(|ui| {
                ui.label("Verbosity Level:");
                egui::ComboBox::from_id_salt("log_level")
                    .selected_text(&settings_mut.log_settings.level)
                    .show_ui(ui, |ui| {
                        for level in &["trace", "debug", "info", "warn", "error"] {
                            dirty |= ui
                                .selectable_value(
                                    &mut settings_mut.log_settings.level,
                                    level.to_string(),
                                    *level,
                                )
                                .changed();
                        }
                    });
            });

            dirty |= ui
                .checkbox(
                    &mut settings_mut.log_settings.console_logging_enabled,
                    "Standard Console Logs",
                )
                .changed();
            dirty |= ui
                .checkbox(
                    &mut settings_mut.log_settings.file_logging_enabled,
                    "Persistent File Logs",
                )
                .changed();

            if settings_mut.log_settings.file_logging_enabled {
                ui.indent("file_logs", |ui| {
                    ui.horizontal(|ui| {
                        ui.label("Save Path:");
                        dirty |= ui
                            .text_edit_singleline(&mut settings_mut.log_settings.log_dir)
                            .lost_focus();
                    });
                    ui.horizontal(|ui| {
                        ui.label("Rotation:");
                        egui::ComboBox::from_id_salt("log_rot")
                            .selected_text(&settings_mut.log_settings.rotation)
                            .show_ui(ui, |ui| {
                                for rot in &["daily", "hourly", "never"] {
                                    dirty |= ui
                                        .selectable_value(
                                            &mut settings_mut.log_settings.rotation,
                                            rot.to_string(),
                                            *rot,
                                        )
                                        .changed();
                                }
                            });
                    });
                });
                ui.label(
                    egui::RichText::new("Restart required for log changes.")
                        .italics()
                        .size(12.0),
                );
            }
        });

        if dirty || controls_changed {
            if let Err(e) = settings.save() {
                tracing::warn!("Failed to save settings: {}", e);
            }
        }
    }

    if let Some(controls) = new_controls {
        if let Err(e) = app.session.update_controls(controls) {
            app.set_status(e.to_string(), MessageSeverity::Error);
        }
    }
}

fn policy_label(policy: ReversalPolicy) -> &'static str {
    match policy {
        ReversalPolicy::StopThenRestart => "Stop, then restart",
        ReversalPolicy::ContinueMotion => "Keep moving",
    }
}
