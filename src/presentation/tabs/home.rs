use crate::domain::models::{EndpointAddress, MessageSeverity};
use crate::presentation::app::WheelchairApp;
use crate::presentation::components::Components;
use crate::presentation::theme;
use eframe::egui;

pub fn render(app: &mut WheelchairApp, ui: &mut egui::Ui) {
    Components::heading(ui, "Wheelchair Remote");
    ui.add_space(20.0);

    ui_connection_panel(app, ui);
    ui.add_space(15.0);

    ui_saved_endpoints(app, ui);
    ui.add_space(15.0);

    ui_status_panel(app, ui);
    ui.add_space(15.0);

    ui_telemetry_panel(app, ui);
}

fn ui_connection_panel(app: &mut WheelchairApp, ui: &mut egui::Ui) {
    Components::brutalist_card(ui, "Connection Control", |ui| {
        let state = app.snapshot.state;
        let (bg_color, text_color) = theme::state_colors(state);
        Components::status_banner(ui, state.label(), bg_color, text_color);

        if let Some(url) = &app.snapshot.url {
            ui.label(egui::RichText::new(url).monospace());
        }

        ui.add_space(10.0);

        egui::Grid::new("endpoint_form")
            .num_columns(2)
            .spacing([10.0, 10.0])
            .show(ui, |ui| {
                ui.label("Name:");
                ui.text_edit_singleline(&mut app.name_input);
                ui.end_row();

                ui.label("Host:");
                ui.text_edit_singleline(&mut app.host_input);
                ui.end_row();

                ui.label("Port:");
                ui.text_edit_singleline(&mut app.port_input);
                ui.end_row();
            });

        ui.horizontal(|ui| {
            if state.is_active() {
                if ui.button("Disconnect").clicked() {
                    if let Err(e) = app.session.disconnect() {
                        app.set_status(e.to_string(), MessageSeverity::Error);
                    }
                }
            } else if ui.button("Connect").clicked() {
                let name = if app.name_input.trim().is_empty() {
                    app.host_input.trim().to_string()
                } else {
                    app.name_input.trim().to_string()
                };
                let target = EndpointAddress::new(name, &app.host_input, &app.port_input);
                app.connect(target);
            }
        });
    });
}

fn ui_saved_endpoints(app: &mut WheelchairApp, ui: &mut egui::Ui) {
    let endpoints = match app.settings.lock() {
        Ok(settings) => settings.endpoints().to_vec(),
        Err(_) => return,
    };
    if endpoints.is_empty() {
        return;
    }

    let mut chosen = None;
    let mut forget = None;

    Components::brutalist_card(ui, "Saved Devices", |ui| {
        egui::ScrollArea::vertical()
            .id_salt("saved_endpoints")
            .max_height(160.0)
            .show(ui, |ui| {
                for endpoint in &endpoints {
                    ui.horizontal(|ui| {
                        ui.label(format!(
                            "{} ({}:{})",
                            endpoint.name, endpoint.host, endpoint.port
                        ));
                        if ui.button("Connect").clicked() {
                            chosen = Some(endpoint.clone());
                        }
                        if ui.button("Forget").clicked() {
                            forget = Some(endpoint.id);
                        }
                    });
                }
            });
    });

    if let Some(endpoint) = chosen {
        app.name_input = endpoint.name.clone();
        app.host_input = endpoint.host.clone();
        app.port_input = endpoint.port.to_string();
        app.connect(EndpointAddress::from(&endpoint));
    }

    if let Some(id) = forget {
        let result = match app.settings.lock() {
            Ok(mut settings) => settings.remove_endpoint(id).map(|_| ()),
            Err(_) => Ok(()),
        };
        if let Err(e) = result {
            app.set_status(format!("Could not forget device: {}", e), MessageSeverity::Error);
        }
    }
}

fn ui_status_panel(app: &mut WheelchairApp, ui: &mut egui::Ui) {
    let current_msg = app.status_message.clone();
    if let Some(msg) = current_msg {
        Components::brutalist_card(ui, "System Status", |ui| {
            let color = match msg.severity {
                MessageSeverity::Info => egui::Color32::BLUE,
                MessageSeverity::Success => egui::Color32::from_rgb(0, 150, 0),
                MessageSeverity::Warning => egui::Color32::from_rgb(200, 150, 0),
                MessageSeverity::Error => egui::Color32::RED,
            };

            ui.label(egui::RichText::new(&msg.message).color(color).strong());

            if app.snapshot.last_error.is_some() && ui.button("Dismiss").clicked() {
                match app.session.clear_error() {
                    Ok(()) => app.status_message = None,
                    Err(e) => app.set_status(e.to_string(), MessageSeverity::Error),
                }
            }
        });
    }
}

fn ui_telemetry_panel(app: &mut WheelchairApp, ui: &mut egui::Ui) {
    let sample = app.telemetry;
    Components::brutalist_card(ui, "Vital Signs", |ui| {
        ui.columns(3, |columns| {
            Components::reading(&mut columns[0], "Heart rate", sample.heart_rate, "bpm", 0);
            Components::reading(&mut columns[1], "Blood oxygen", sample.blood_oxygen, "%", 0);
            Components::reading(&mut columns[2], "Temperature", sample.temperature, "°C", 1);
        });
        if !app.snapshot.state.is_connected() && sample != Default::default() {
            ui.label(egui::RichText::new("Last known values").italics());
        }
    });
}
