use std::path::PathBuf;

use chrono::{Duration, Months, NaiveDate};

use crate::config::{DataPaths, EngineConfig};
use crate::engine::store::{GroupPatch, OverrideChange};
use crate::engine::{
    apply_status_edit, BarDragController, BoardState, ItemFilter, ListReorderController, OverrideStore,
    ReorderOutcome, ScheduleStore, SessionGate, TimelineLayout,
};
use crate::error::EngineError;
use crate::io::{JsonOrderStore, JsonlAuditLog};
use crate::model::{GroupSet, ItemId, ScaleConfig, ScaleMode, Schedule, ScheduleItem, Status};
use crate::ui;
use crate::ui::overlay::OverlayPort;
use crate::ui::task_table::COLUMN_KEYS;

/// Main application state.
pub struct StudioApp {
    pub config: EngineConfig,
    pub paths: DataPaths,
    pub schedule: Schedule,
    /// Flattened, filtered items the engine works on.
    pub snapshot: Vec<ScheduleItem>,
    pub filter: ItemFilter,
    pub file_path: Option<PathBuf>,
    pub anchor: NaiveDate,
    pub scale: ScaleConfig,
    pub selected: Option<ItemId>,

    pub board: BoardState,
    pub overrides: OverrideStore,
    pub orders: JsonOrderStore,
    pub audit: JsonlAuditLog,
    pub bar_drag: BarDragController,
    pub reorder: ListReorderController,
    pub port: OverlayPort,

    pub status_message: String,
}

impl StudioApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Register Phosphor icon font as a fallback so icons render inline with text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        let paths = DataPaths::resolve();
        let config = EngineConfig::load(&paths.settings());
        tracing::info!(dir = %paths.config_dir.display(), "using config directory");
        let today = chrono::Local::now().date_naive();
        Self::with_parts(config, paths, Schedule::sample(today), today)
    }

    /// Wire the engine around `schedule` without touching the UI context.
    pub fn with_parts(config: EngineConfig, paths: DataPaths, schedule: Schedule, anchor: NaiveDate) -> Self {
        let overrides = OverrideStore::open(paths.overrides()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "group overrides unreadable, starting empty");
            OverrideStore::new()
        });
        let orders = JsonOrderStore::open(paths.orders());
        let audit = JsonlAuditLog::new(paths.audit_log());

        let mut board = BoardState::new(
            GroupSet::studio_default(),
            vec!["task".to_string()],
            COLUMN_KEYS.iter().map(|c| c.to_string()).collect(),
            config.view.clone(),
            config.user.clone(),
        );
        board.restore(&orders);

        let gate = SessionGate::new();
        let scale = ScaleConfig::build_with(
            config.default_scale,
            anchor,
            chrono::Local::now().date_naive(),
            &config.cell_widths,
        );
        let mut app = Self {
            bar_drag: BarDragController::new(gate.clone(), config.bar_drag_threshold),
            reorder: ListReorderController::new(gate, config.reorder_threshold),
            config,
            paths,
            schedule,
            snapshot: Vec::new(),
            filter: ItemFilter::default(),
            file_path: None,
            anchor,
            scale,
            selected: None,
            board,
            overrides,
            orders,
            audit,
            port: OverlayPort::default(),
            status_message: "Pronto".to_string(),
        };
        app.refresh_snapshot();
        app
    }

    pub fn refresh_snapshot(&mut self) {
        self.snapshot = self.schedule.visible_items(&self.filter);
    }

    // --- Timeline navigation ---

    fn rebuild_scale(&mut self) {
        self.scale = ScaleConfig::build_with(
            self.scale.mode,
            self.anchor,
            chrono::Local::now().date_naive(),
            &self.config.cell_widths,
        );
    }

    pub fn set_scale(&mut self, mode: ScaleMode) {
        if self.scale.mode == mode {
            return;
        }
        self.scale.mode = mode;
        self.rebuild_scale();
        self.config.default_scale = mode;
        if let Err(e) = self.config.save(&self.paths.settings()) {
            tracing::warn!(error = %e, "failed to save settings");
        }
        tracing::debug!(?mode, "scale changed");
    }

    /// Move the window one period back (`-1`) or forward (`1`).
    pub fn shift_window(&mut self, direction: i32) {
        let months = match self.scale.mode {
            ScaleMode::Day | ScaleMode::Month => 1,
            ScaleMode::Quarter => 3,
            ScaleMode::Week => 0,
        };
        self.anchor = if months == 0 {
            self.anchor + Duration::weeks(4 * i64::from(direction))
        } else if direction < 0 {
            self.anchor.checked_sub_months(Months::new(months)).unwrap_or(self.anchor)
        } else {
            self.anchor.checked_add_months(Months::new(months)).unwrap_or(self.anchor)
        };
        self.rebuild_scale();
    }

    pub fn go_today(&mut self) {
        self.anchor = chrono::Local::now().date_naive();
        self.rebuild_scale();
    }

    // --- File operations ---

    fn replace_schedule(&mut self, schedule: Schedule, path: Option<PathBuf>) {
        self.bar_drag.cancel();
        self.reorder.cancel(&mut self.port);
        self.schedule = schedule;
        self.file_path = path;
        self.selected = None;
        self.refresh_snapshot();
        if let Some(first) = self.snapshot.iter().map(|i| i.start).min() {
            self.anchor = first;
            self.rebuild_scale();
        }
    }

    pub fn new_schedule(&mut self) {
        self.replace_schedule(Schedule::default(), None);
        self.status_message = "Novo cronograma criado".to_string();
    }

    pub fn open_schedule(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Cronograma", &["json"])
            .pick_file()
        {
            match crate::io::load_schedule(&path) {
                Ok(schedule) => {
                    self.replace_schedule(schedule, Some(path));
                    self.status_message = "Cronograma carregado".to_string();
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to load schedule");
                    self.status_message = format!("Erro ao abrir: {}", e);
                }
            }
        }
    }

    pub fn save_schedule(&mut self) {
        match self.file_path.clone() {
            Some(path) => self.write_schedule(path),
            None => self.save_schedule_as(),
        }
    }

    pub fn save_schedule_as(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Cronograma", &["json"])
            .set_file_name(format!("{}.json", self.schedule.name))
            .save_file()
        {
            self.file_path = Some(path.clone());
            self.write_schedule(path);
        }
    }

    fn write_schedule(&mut self, path: PathBuf) {
        self.schedule.touch();
        self.status_message = match crate::io::save_schedule(&self.schedule, &path) {
            Ok(()) => "Cronograma salvo".to_string(),
            Err(e) => format!("Erro ao salvar: {}", e),
        };
    }

    pub fn import_csv(&mut self) {
        if !self.schedule.items.is_empty() {
            let confirm = rfd::MessageDialog::new()
                .set_title("Importar CSV")
                .set_description("Isto substitui o cronograma atual. Continuar?")
                .set_buttons(rfd::MessageButtons::YesNo)
                .show();
            if confirm != rfd::MessageDialogResult::Yes {
                return;
            }
        }

        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv", "txt"])
            .pick_file()
        else {
            return;
        };
        match crate::io::import_csv(&path) {
            Ok(import) => {
                let name = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("Cronograma importado")
                    .to_string();
                let count = import.items.len();
                let mut schedule = Schedule::new(name);
                schedule.items = import.items;
                self.replace_schedule(schedule, None);
                self.status_message = if import.skipped > 0 {
                    format!("{} itens importados ({} linhas ignoradas)", count, import.skipped)
                } else {
                    format!("{} itens importados", count)
                };
            }
            Err(e) => {
                self.status_message = format!("Falha ao importar CSV: {}", e);
            }
        }
    }

    pub fn export_csv(&mut self) {
        if self.schedule.items.is_empty() {
            self.status_message = "Nada para exportar".to_string();
            return;
        }
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .set_file_name(format!("{}.csv", self.schedule.name))
            .save_file()
        {
            self.status_message = match crate::io::export_csv(&self.schedule.items, &path) {
                Ok(count) => format!("{} itens exportados", count),
                Err(e) => format!("Falha ao exportar CSV: {}", e),
            };
        }
    }

    /// Status change outside of a drop: the override goes and status
    /// matching decides the group again.
    pub fn set_item_status(&mut self, id: ItemId, status: Status) -> Result<(), EngineError> {
        let item = self
            .snapshot
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(EngineError::UnknownItem(id))?;
        apply_status_edit(item, status, &mut self.overrides);
        let patch = GroupPatch {
            status: Some(status),
            override_group: OverrideChange::Clear,
        };
        self.status_message = match self.schedule.update_item_group(id, patch) {
            Ok(()) => format!("Status alterado para {}", status),
            Err(e) => {
                tracing::warn!(item = %id, error = %e, "failed to persist status change");
                format!("Não foi possível salvar o status: {}", e)
            }
        };
        Ok(())
    }

    fn item_name(&self, id: ItemId) -> String {
        self.snapshot
            .iter()
            .find(|i| i.id == id)
            .map(|i| i.name.clone())
            .unwrap_or_default()
    }
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ui::theme::apply_theme(ctx);

        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::S)) {
            self.save_schedule();
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(22.0)
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .size(11.0)
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            egui::RichText::new(format!(
                                "{} · Itens: {}",
                                self.scale.mode.label(),
                                self.snapshot.len()
                            ))
                            .size(10.5)
                            .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });

        // Left panel: grouped list
        let mut list = ui::task_table::ListInteraction::default();
        egui::SidePanel::left("task_panel")
            .default_width(560.0)
            .min_width(320.0)
            .resizable(true)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_PANEL)
                    .inner_margin(egui::Margin::same(6.0))
                    .stroke(egui::Stroke::new(1.0, ui::theme::BORDER_SUBTLE)),
            )
            .show(ctx, |ui| {
                list = ui::task_table::show_task_table(
                    ui::task_table::ListState {
                        board: &mut self.board,
                        items: &mut self.snapshot,
                        overrides: &mut self.overrides,
                        store: &mut self.schedule,
                        orders: &mut self.orders,
                        audit: &mut self.audit,
                        reorder: &mut self.reorder,
                        port: &mut self.port,
                        selected: &mut self.selected,
                    },
                    ui,
                );
            });

        match list.outcome {
            Some(ReorderOutcome::Resolved { reconcile, notice }) => {
                self.status_message = notice.unwrap_or_else(|| match reconcile.items.iter().next() {
                    Some(id) => format!("'{}' movido", self.item_name(*id)),
                    None if reconcile.columns => "Colunas reordenadas".to_string(),
                    None => "Seções reordenadas".to_string(),
                });
            }
            Some(ReorderOutcome::Noop) | None => {}
        }
        if let Some((id, status)) = list.status_edit {
            if let Err(e) = self.set_item_status(id, status) {
                tracing::warn!(error = %e, "status edit ignored");
            }
        }
        if list.cancelled {
            self.status_message = "Arraste cancelado".to_string();
        }

        // Central panel: Gantt chart
        let today = chrono::Local::now().date_naive();
        let layout = TimelineLayout::compute(&self.snapshot, &self.scale, today, &self.config.layout);
        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);
        let mut chart = ui::gantt_chart::ChartInteraction::default();
        egui::CentralPanel::default().frame(chart_frame).show(ctx, |ui| {
            chart = ui::gantt_chart::show_gantt_chart(
                ui::gantt_chart::ChartState {
                    scale: &self.scale,
                    layout: &layout,
                    items: &mut self.snapshot,
                    drag: &mut self.bar_drag,
                    store: &mut self.schedule,
                    audit: &mut self.audit,
                    selected: &mut self.selected,
                    row_height: self.config.layout.row_height,
                },
                ui,
            );
        });

        if let Some(commit) = chart.committed {
            self.status_message = commit.notice.unwrap_or_else(|| {
                format!(
                    "'{}' {} → {}",
                    self.item_name(commit.item_id),
                    commit.to.0.format("%d/%m/%Y"),
                    commit.to.1.format("%d/%m/%Y"),
                )
            });
        }
        if chart.cancelled {
            self.status_message = "Arraste cancelado".to_string();
        }
        if let Some(reason) = list.refused.or(chart.refused) {
            self.status_message = reason;
        }

        self.port.paint(ctx);
    }
}
