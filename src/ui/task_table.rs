use egui::{Align2, Color32, Key, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};
use egui_phosphor::regular as icon;

use crate::engine::{
    AuditSink, BoardState, DragSubject, DropSurfaces, GroupSurface, ListReorderController, OrderStore,
    OverrideStore, ReorderContext, ReorderKind, ReorderOutcome, ScheduleStore, Slot,
};
use crate::model::{Group, ItemId, PxRect, ScheduleItem, Status};
use crate::ui::overlay::{px_point, px_rect, OverlayPort};
use crate::ui::{theme, MOUSE_POINTER};

const GRIP_WIDTH: f32 = 18.0;

/// Column keys the list knows how to render.
pub const COLUMN_KEYS: [&str; 5] = ["task", "start", "end", "status", "progress"];

pub fn column_label(key: &str) -> &str {
    match key {
        "task" => "TAREFA",
        "start" => "INÍCIO",
        "end" => "FIM",
        "status" => "STATUS",
        "progress" => "PROGRESSO",
        other => other,
    }
}

fn column_width(key: &str) -> f32 {
    if key == "task" {
        theme::TASK_COLUMN_WIDTH
    } else {
        theme::COLUMN_WIDTH
    }
}

/// Everything the grouped list reads and writes during one frame.
pub struct ListState<'a> {
    pub board: &'a mut BoardState,
    pub items: &'a mut [ScheduleItem],
    pub overrides: &'a mut OverrideStore,
    pub store: &'a mut dyn ScheduleStore,
    pub orders: &'a mut dyn OrderStore,
    pub audit: &'a mut dyn AuditSink,
    pub reorder: &'a mut ListReorderController,
    pub port: &'a mut OverlayPort,
    pub selected: &'a mut Option<ItemId>,
}

#[derive(Debug, Default)]
pub struct ListInteraction {
    pub outcome: Option<ReorderOutcome>,
    pub cancelled: bool,
    pub refused: Option<String>,
    /// Status picked from a row's context menu.
    pub status_edit: Option<(ItemId, Status)>,
}

/// Render the grouped task list: a column strip, then one section per group.
/// Rows, section headers and non-pinned column headers are drag handles.
pub fn show_task_table(state: ListState<'_>, ui: &mut Ui) -> ListInteraction {
    let ListState {
        board,
        items,
        overrides,
        store,
        orders,
        audit,
        reorder,
        port,
        selected,
    } = state;
    let mut interaction = ListInteraction::default();

    let sections: Vec<(Group, Vec<ScheduleItem>)> = board
        .sections(items, overrides)
        .into_iter()
        .map(|s| (s.group, s.items.into_iter().cloned().collect()))
        .collect();
    let columns = board.display_columns();
    let row_width = GRIP_WIDTH + columns.iter().map(|c| column_width(c)).sum::<f32>();
    let dragged_key = reorder
        .session()
        .filter(|_| reorder.is_active())
        .map(|s| s.subject.key.clone());

    let mut labels: Vec<(String, String)> = Vec::new();
    let mut surfaces = DropSurfaces::default();
    let mut pressed: Option<(DragSubject, Pos2)> = None;
    let press_origin = ui.input(|i| i.pointer.press_origin());

    // Header area
    ui.add_space(2.0);
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new("Entregas").strong().size(15.0).color(theme::TEXT_PRIMARY));
        ui.add_space(4.0);
        let count: usize = sections.iter().map(|(_, rows)| rows.len()).sum();
        ui.label(egui::RichText::new(format!("({})", count)).size(11.0).color(theme::TEXT_DIM));
    });
    ui.add_space(4.0);

    egui::ScrollArea::both()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            // ── Column strip ──
            let (strip, _) = ui.allocate_exact_size(Vec2::new(row_width, 20.0), Sense::hover());
            let painter = ui.painter().clone();
            painter.rect_filled(strip, 0.0, theme::BG_HEADER);
            let mut x = strip.left() + GRIP_WIDTH;
            let mut pinned: Option<Rect> = None;
            for key in &columns {
                let rect = Rect::from_min_size(Pos2::new(x, strip.top()), Vec2::new(column_width(key), strip.height()));
                x += rect.width();
                let is_dragged = dragged_key.as_deref() == Some(key.as_str());
                painter.text(
                    Pos2::new(rect.left() + 4.0, rect.center().y),
                    Align2::LEFT_CENTER,
                    column_label(key),
                    theme::font_small(),
                    if is_dragged { theme::TEXT_DIM } else { theme::TEXT_SECONDARY },
                );
                labels.push((key.clone(), column_label(key).to_string()));
                if board.is_pinned(key) {
                    pinned = Some(pinned.map_or(rect, |p| p.union(rect)));
                    continue;
                }
                let resp = ui.interact(rect, ui.make_persistent_id(("column", key.as_str())), Sense::drag());
                if resp.hovered() && reorder.session().is_none() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::Grab);
                }
                if resp.drag_started() {
                    pressed = Some((
                        DragSubject {
                            kind: ReorderKind::Column,
                            key: key.clone(),
                            source_group: None,
                            rect: px_rect(rect),
                        },
                        press_origin.unwrap_or(rect.center()),
                    ));
                }
                surfaces.columns.push(Slot {
                    key: key.clone(),
                    rect: px_rect(rect),
                });
            }
            surfaces.pinned_zone = pinned.map(px_rect);
            ui.add_space(4.0);

            // ── Sections ──
            for (group, rows) in &sections {
                let section_top = ui.cursor().top();
                let (header, header_resp) = ui.allocate_exact_size(
                    Vec2::new(row_width, theme::SECTION_HEADER_HEIGHT),
                    Sense::drag(),
                );
                let header_dragged = dragged_key.as_deref() == Some(group.id.as_str());
                painter.rect_filled(
                    header,
                    Rounding::same(4.0),
                    if header_dragged { theme::BG_DARK } else { theme::BG_HEADER },
                );
                painter.text(
                    Pos2::new(header.left() + 4.0, header.center().y),
                    Align2::LEFT_CENTER,
                    icon::DOTS_SIX_VERTICAL,
                    theme::font_bar(),
                    theme::TEXT_DIM,
                );
                painter.text(
                    Pos2::new(header.left() + GRIP_WIDTH + 4.0, header.center().y),
                    Align2::LEFT_CENTER,
                    format!("{}  ({})", group.label, rows.len()),
                    theme::font_header(),
                    theme::TEXT_PRIMARY,
                );
                labels.push((group.id.clone(), group.label.clone()));
                if header_resp.drag_started() {
                    pressed = Some((
                        DragSubject {
                            kind: ReorderKind::Group,
                            key: group.id.clone(),
                            source_group: None,
                            rect: px_rect(header),
                        },
                        press_origin.unwrap_or(header.center()),
                    ));
                }

                let body_top = header.bottom();
                let mut slots = Vec::with_capacity(rows.len());
                for (i, item) in rows.iter().enumerate() {
                    let (row, resp) = ui.allocate_exact_size(
                        Vec2::new(row_width, theme::LIST_ROW_HEIGHT),
                        Sense::click_and_drag(),
                    );
                    let key = item.id.to_string();
                    let is_dragged = dragged_key.as_deref() == Some(key.as_str());
                    let is_selected = *selected == Some(item.id);
                    let fill = if is_selected {
                        theme::BG_SELECTED
                    } else if resp.hovered() {
                        theme::BG_ROW_HOVER
                    } else if i % 2 == 0 {
                        theme::BG_PANEL
                    } else {
                        theme::BG_DARK
                    };
                    painter.rect_filled(row, Rounding::same(3.0), fill);
                    draw_row(&painter, row, item, &columns, is_dragged);

                    if resp.clicked() {
                        *selected = Some(item.id);
                    }
                    resp.context_menu(|ui| {
                        ui.label(egui::RichText::new("Alterar status").small().weak());
                        for status in Status::ALL {
                            if ui.radio(item.status == status, status.label()).clicked() {
                                interaction.status_edit = Some((item.id, status));
                                ui.close_menu();
                            }
                        }
                    });
                    if resp.drag_started() {
                        pressed = Some((
                            DragSubject {
                                kind: ReorderKind::Item,
                                key: key.clone(),
                                source_group: Some(group.id.clone()),
                                rect: px_rect(row),
                            },
                            press_origin.unwrap_or(row.center()),
                        ));
                    }
                    labels.push((key.clone(), item.name.clone()));
                    slots.push(Slot { key, rect: px_rect(row) });
                }
                if rows.is_empty() {
                    let (empty, _) = ui.allocate_exact_size(
                        Vec2::new(row_width, theme::LIST_ROW_HEIGHT),
                        Sense::hover(),
                    );
                    painter.text(
                        Pos2::new(empty.left() + GRIP_WIDTH + 4.0, empty.center().y),
                        Align2::LEFT_CENTER,
                        "Arraste entregas para cá",
                        theme::font_small(),
                        theme::TEXT_DIM,
                    );
                }
                let bottom = ui.cursor().top();
                let body = PxRect::new(header.left(), body_top, row_width, (bottom - body_top).max(0.0));
                surfaces.groups.push(GroupSurface {
                    group: group.id.clone(),
                    header: px_rect(header),
                    body,
                    rows: slots,
                });
                surfaces.sections.push(Slot {
                    key: group.id.clone(),
                    rect: PxRect::new(header.left(), section_top, row_width, bottom - section_top),
                });
                ui.add_space(6.0);
            }
        });

    port.set_labels(labels);

    // ── Session ──
    if let Some((subject, at)) = pressed {
        if reorder.session().is_none() {
            if let Err(e) = reorder.press(subject, MOUSE_POINTER, px_point(at)) {
                tracing::debug!(error = %e, "reorder refused");
                interaction.refused = Some(e.to_string());
            }
        }
    }
    if reorder.session().is_some() {
        let (pointer, released, escape, focused) = ui.input(|i| {
            (
                i.pointer.interact_pos(),
                i.pointer.any_released(),
                i.key_pressed(Key::Escape),
                i.focused,
            )
        });
        if escape || !focused {
            interaction.cancelled = reorder.cancel(port);
        } else {
            if let Some(pos) = pointer {
                reorder.pointer_move(MOUSE_POINTER, px_point(pos), &surfaces, port);
            }
            if released {
                let ctx = ReorderContext {
                    board,
                    items,
                    overrides,
                    store,
                    orders,
                    audit,
                };
                interaction.outcome = Some(reorder.release(MOUSE_POINTER, port, ctx));
            }
        }
        ui.ctx().request_repaint();
    }

    interaction
}

fn draw_row(painter: &egui::Painter, row: Rect, item: &ScheduleItem, columns: &[String], dimmed: bool) {
    let text_color = if dimmed { theme::TEXT_DIM } else { theme::TEXT_PRIMARY };
    painter.text(
        Pos2::new(row.left() + 4.0, row.center().y),
        Align2::LEFT_CENTER,
        icon::DOTS_SIX_VERTICAL,
        theme::font_bar(),
        theme::TEXT_DIM,
    );

    let mut x = row.left() + GRIP_WIDTH;
    for key in columns {
        let cell = Rect::from_min_size(Pos2::new(x, row.top()), Vec2::new(column_width(key), row.height()));
        x += cell.width();
        let clipped = painter.with_clip_rect(cell.shrink2(Vec2::new(2.0, 0.0)));
        let left = Pos2::new(cell.left() + 4.0, cell.center().y);
        match key.as_str() {
            "task" => {
                clipped.circle_filled(Pos2::new(cell.left() + 6.0, cell.center().y), 3.0, theme::item_color(item.color));
                clipped.text(
                    Pos2::new(cell.left() + 14.0, cell.center().y),
                    Align2::LEFT_CENTER,
                    &item.name,
                    theme::font_bar(),
                    text_color,
                );
            }
            "start" | "end" => {
                let date = if key == "start" { item.start } else { item.end };
                clipped.text(left, Align2::LEFT_CENTER, date.format("%d/%m/%Y"), theme::font_sub(), theme::TEXT_SECONDARY);
            }
            "status" => {
                clipped.text(left, Align2::LEFT_CENTER, item.status.label(), theme::font_sub(), theme::status_color(item.status));
            }
            "progress" => {
                let track = Rect::from_min_size(
                    Pos2::new(cell.left() + 4.0, cell.center().y - 3.0),
                    Vec2::new(cell.width() - 12.0, 6.0),
                );
                clipped.rect_filled(track, Rounding::same(3.0), theme::BORDER_SUBTLE);
                let done = Rect::from_min_size(track.min, Vec2::new(track.width() * item.progress(), track.height()));
                clipped.rect_filled(done, Rounding::same(3.0), theme::item_color(item.color));
            }
            _ => {}
        }
    }

    if dimmed {
        painter.rect_stroke(row, Rounding::same(3.0), Stroke::new(1.0, Color32::from_white_alpha(30)));
    }
}
