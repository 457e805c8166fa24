#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use studio_timeline::app::StudioApp;

fn main() -> eframe::Result<()> {
    studio_timeline::logging::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 760.0])
            .with_min_inner_size([900.0, 420.0])
            .with_title("Studio Timeline"),
        ..Default::default()
    };

    eframe::run_native(
        "Studio Timeline",
        options,
        Box::new(|cc| Ok(Box::new(StudioApp::new(cc)))),
    )
}
