use eframe::egui;
use wheelchair_remote::presentation::app::WheelchairApp;

fn main() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([820.0, 720.0])
            .with_title("Wheelchair Remote"),
        ..Default::default()
    };

    eframe::run_native(
        "Wheelchair Remote",
        options,
        Box::new(|cc| Ok(Box::new(WheelchairApp::new(cc)))),
    )
}
