use egui::{menu, RichText, Ui};
use egui_phosphor::regular as icon;

use crate::app::StudioApp;
use crate::model::{ScaleMode, Status};
use crate::ui::theme;

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut StudioApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  Arquivo  ").font(theme::font_menu()), |ui| {
            if ui.button(format!("{}  Novo cronograma", icon::FILE)).clicked() {
                app.new_schedule();
                ui.close_menu();
            }
            if ui.button(format!("{}  Abrir...", icon::FOLDER_OPEN)).clicked() {
                app.open_schedule();
                ui.close_menu();
            }
            ui.separator();
            if ui.button(format!("{}  Salvar          Ctrl+S", icon::FLOPPY_DISK)).clicked() {
                app.save_schedule();
                ui.close_menu();
            }
            if ui.button("     Salvar como...").clicked() {
                app.save_schedule_as();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("     Importar CSV...").clicked() {
                app.import_csv();
                ui.close_menu();
            }
            if ui.button("     Exportar CSV...").clicked() {
                app.export_csv();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  Filtro  ").font(theme::font_menu()), |ui| {
            ui.label(RichText::new("Status visíveis").small().weak());
            let mut changed = false;
            for status in Status::ALL {
                let mut shown = app
                    .filter
                    .statuses
                    .as_ref()
                    .map_or(true, |set| set.contains(&status));
                if ui.checkbox(&mut shown, status.label()).changed() {
                    let set = app
                        .filter
                        .statuses
                        .get_or_insert_with(|| Status::ALL.into_iter().collect());
                    if shown {
                        set.insert(status);
                    } else {
                        set.remove(&status);
                    }
                    changed = true;
                }
            }
            ui.separator();
            if ui.button("Mostrar todos").clicked() {
                app.filter.statuses = None;
                changed = true;
                ui.close_menu();
            }
            if changed {
                app.refresh_snapshot();
            }
        });

        ui.separator();

        // Scale switcher
        for mode in ScaleMode::ALL {
            if ui.selectable_label(app.scale.mode == mode, mode.label()).clicked() {
                app.set_scale(mode);
            }
        }

        ui.separator();
        if ui.button(icon::CARET_LEFT).on_hover_text("Período anterior").clicked() {
            app.shift_window(-1);
        }
        if ui.button(format!("{} Hoje", icon::CALENDAR)).clicked() {
            app.go_today();
        }
        if ui.button(icon::CARET_RIGHT).on_hover_text("Próximo período").clicked() {
            app.shift_window(1);
        }
        ui.label(
            RichText::new(format!(
                "{} – {}",
                app.scale.window_start().format("%d/%m/%Y"),
                app.scale.window_end().format("%d/%m/%Y")
            ))
            .size(11.0)
            .color(theme::TEXT_SECONDARY),
        );

        ui.separator();
        let search = ui.add(
            egui::TextEdit::singleline(&mut app.filter.search)
                .hint_text(format!("{} Buscar", icon::MAGNIFYING_GLASS))
                .desired_width(140.0),
        );
        if search.changed() {
            app.refresh_snapshot();
        }

        // Right-aligned schedule name
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let unsaved = if app.file_path.is_some() { "" } else { " (não salvo)" };
            ui.label(
                RichText::new(format!("{}{}", app.schedule.name, unsaved))
                    .size(11.0)
                    .weak(),
            );
        });
    });
}
