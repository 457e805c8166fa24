use chrono::Datelike;
use egui::{Align2, Color32, Key, Pos2, Rect, Rounding, Sense, Shape, Stroke, Ui, Vec2};

use crate::engine::{AuditSink, BarDragController, BarGeometry, DragCommit, DragMode, ScheduleStore, TimelineLayout};
use crate::model::{HeaderBand, ItemId, ItemKind, PxRect, ScaleConfig, ScaleMode, ScheduleItem};
use crate::ui::{overlay, theme, MOUSE_POINTER};

const HEADER_HEIGHT: f32 = theme::HEADER_HEIGHT;
const HANDLE_WIDTH: f32 = theme::HANDLE_WIDTH;

/// Everything the chart reads and writes during one frame.
pub struct ChartState<'a> {
    pub scale: &'a ScaleConfig,
    pub layout: &'a TimelineLayout,
    pub items: &'a mut [ScheduleItem],
    pub drag: &'a mut BarDragController,
    pub store: &'a mut dyn ScheduleStore,
    pub audit: &'a mut dyn AuditSink,
    pub selected: &'a mut Option<ItemId>,
    pub row_height: f32,
}

/// Result details from interactions in the Gantt chart.
#[derive(Debug, Default)]
pub struct ChartInteraction {
    pub committed: Option<DragCommit>,
    pub cancelled: bool,
    /// A drag could not start (another session owns the pointer).
    pub refused: Option<String>,
}

/// Render the Gantt chart area (right panel).
pub fn show_gantt_chart(state: ChartState<'_>, ui: &mut Ui) -> ChartInteraction {
    let ChartState {
        scale,
        layout,
        items,
        drag,
        store,
        audit,
        selected,
        row_height,
    } = state;
    let mut interaction = ChartInteraction::default();

    // ── Live session ──
    let (pointer, press_origin, released, escape, focused) = ui.input(|i| {
        (
            i.pointer.interact_pos(),
            i.pointer.press_origin(),
            i.pointer.any_released(),
            i.key_pressed(Key::Escape),
            i.focused,
        )
    });
    let mut preview = None;
    if drag.session().is_some() {
        if escape {
            interaction.cancelled = drag.cancel().is_some();
        } else if !focused {
            interaction.cancelled = drag.pointer_lost(MOUSE_POINTER).is_some();
        } else {
            if let (Some(pos), Some(press)) = (pointer, press_origin) {
                preview = drag.update(MOUSE_POINTER, pos.x - press.x, scale);
            }
            if released {
                interaction.committed = drag.commit(MOUSE_POINTER, scale, items, store, audit);
                preview = None;
            }
        }
        ui.ctx().request_repaint();
    }
    let dragged: Option<(ItemId, PxRect)> = drag
        .session()
        .filter(|_| drag.is_dragging())
        .map(|s| (s.item_id, s.current));

    let available = ui.available_size();
    let chart_width = layout.width.max(available.x);
    let chart_height = HEADER_HEIGHT + layout.height + 40.0;

    egui::ScrollArea::both()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            let (response, painter) = ui.allocate_painter(
                Vec2::new(chart_width, chart_height.max(available.y)),
                Sense::click(),
            );
            let origin = response.rect.min;
            let body_top = origin.y + HEADER_HEIGHT;
            let body_bottom = response.rect.bottom();
            let mut consumed_click = false;

            painter.rect_filled(response.rect, 0.0, theme::BG_DARK);

            // Row stripes
            for i in 0..items.len() {
                let y = body_top + i as f32 * row_height;
                if i % 2 == 0 {
                    painter.rect_filled(
                        Rect::from_min_size(Pos2::new(origin.x, y), Vec2::new(chart_width, row_height)),
                        0.0,
                        theme::BG_PANEL,
                    );
                }
                painter.line_segment(
                    [Pos2::new(origin.x, y + row_height), Pos2::new(origin.x + chart_width, y + row_height)],
                    Stroke::new(0.5, theme::BORDER_SUBTLE),
                );
            }

            draw_grid(&painter, origin, scale, body_top, body_bottom);
            draw_timeline_header(&painter, origin, scale, chart_width);

            if let Some(x) = layout.today_x {
                draw_today_line(&painter, Pos2::new(origin.x + x, body_top), body_bottom);
            }

            for arrow in &layout.arrows {
                let points: Vec<Pos2> = arrow
                    .path
                    .iter()
                    .map(|p| Pos2::new(origin.x + p.x, body_top + p.y))
                    .collect();
                draw_arrow(&painter, points);
            }

            // ── Bars ──
            for bar in &layout.bars {
                let Some(item) = items.iter().find(|i| i.id == bar.id) else {
                    continue;
                };
                let is_selected = *selected == Some(item.id);
                let to_screen = |r: PxRect| {
                    Rect::from_min_size(
                        Pos2::new(origin.x + r.left, body_top + r.top),
                        Vec2::new(r.width, r.height),
                    )
                };
                let bar_rect = to_screen(bar.rect);

                let live = dragged.filter(|(id, _)| *id == item.id).map(|(_, r)| to_screen(r));
                if let Some(live_rect) = live {
                    // Original position stays as a faint outline while dragging.
                    painter.rect_stroke(bar_rect, Rounding::same(theme::BAR_ROUNDING), Stroke::new(1.0, theme::TEXT_DIM));
                    draw_bar(&painter, item, bar, live_rect, true);
                } else {
                    draw_bar(&painter, item, bar, bar_rect, is_selected);
                }

                let bar_response = ui.interact(
                    bar_rect,
                    ui.make_persistent_id(("item-bar", item.id)),
                    Sense::click_and_drag(),
                );
                let left_response = ui.interact(
                    handle_rect(bar_rect, bar_rect.left()).expand(4.0),
                    ui.make_persistent_id(("item-resize-left", item.id)),
                    Sense::drag(),
                );
                let right_response = ui.interact(
                    handle_rect(bar_rect, bar_rect.right()).expand(4.0),
                    ui.make_persistent_id(("item-resize-right", item.id)),
                    Sense::drag(),
                );

                if bar_response.clicked() {
                    *selected = Some(item.id);
                    consumed_click = true;
                }

                let started = if left_response.drag_started() {
                    Some(DragMode::ResizeLeft)
                } else if right_response.drag_started() {
                    Some(DragMode::ResizeRight)
                } else if bar_response.drag_started() {
                    Some(DragMode::Move)
                } else {
                    None
                };
                if let Some(mode) = started {
                    *selected = Some(item.id);
                    consumed_click = true;
                    if let Err(e) = drag.begin(item, mode, MOUSE_POINTER, bar.rect) {
                        tracing::debug!(item = %item.id, error = %e, "bar drag refused");
                        interaction.refused = Some(e.to_string());
                    }
                }

                let handle_hovered = left_response.hovered() || right_response.hovered();
                if handle_hovered || left_response.dragged() || right_response.dragged() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
                } else if bar_response.dragged() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
                } else if bar_response.hovered() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::Grab);
                }

                if live.is_none() && (is_selected || handle_hovered) {
                    draw_handles(&painter, bar_rect);
                }

                if live.is_none() && drag.session().is_none() && (bar_response.hovered() || handle_hovered) {
                    egui::show_tooltip_at_pointer(
                        ui.ctx(),
                        ui.layer_id(),
                        egui::Id::new(("item-tip", item.id)),
                        |ui| {
                            ui.strong(&item.name);
                            ui.label(format!(
                                "{} → {}",
                                item.start.format("%d/%m/%Y"),
                                item.end.format("%d/%m/%Y"),
                            ));
                            ui.label(format!("{} · {}%", item.status, (item.progress() * 100.0).round() as i32));
                        },
                    );
                }
            }

            if let Some(preview) = &preview {
                let anchor = overlay::egui_rect(preview.rect)
                    .translate(Vec2::new(origin.x, body_top))
                    .left_top();
                egui::show_tooltip_at(
                    ui.ctx(),
                    ui.layer_id(),
                    egui::Id::new("drag-preview"),
                    anchor - Vec2::new(0.0, 28.0),
                    |ui| {
                        ui.label(egui::RichText::new(&preview.label).font(theme::font_bar()));
                    },
                );
            }

            if response.clicked() && !consumed_click {
                *selected = None;
            }
        });

    interaction
}

fn handle_rect(bar_rect: Rect, x: f32) -> Rect {
    Rect::from_min_max(
        Pos2::new(x - HANDLE_WIDTH * 0.5, bar_rect.top()),
        Pos2::new(x + HANDLE_WIDTH * 0.5, bar_rect.bottom()),
    )
}

fn draw_timeline_header(painter: &egui::Painter, origin: Pos2, scale: &ScaleConfig, width: f32) {
    painter.rect_filled(
        Rect::from_min_size(origin, Vec2::new(width, HEADER_HEIGHT)),
        0.0,
        theme::BG_HEADER,
    );
    painter.line_segment(
        [
            Pos2::new(origin.x, origin.y + HEADER_HEIGHT),
            Pos2::new(origin.x + width, origin.y + HEADER_HEIGHT),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    let cw = scale.cell_width;
    let rows: Vec<(f32, &Vec<HeaderBand>)> = if scale.week_bands.is_empty() {
        vec![(11.0, &scale.month_bands)]
    } else {
        vec![(8.0, &scale.month_bands), (21.0, &scale.week_bands)]
    };
    for (y, bands) in rows {
        for band in bands {
            let x = origin.x + band.first_column as f32 * cw;
            painter.line_segment(
                [Pos2::new(x, origin.y), Pos2::new(x, origin.y + HEADER_HEIGHT)],
                Stroke::new(0.5, theme::GRID_LINE),
            );
            let clip = Rect::from_min_size(Pos2::new(x, origin.y), Vec2::new(band.span as f32 * cw, HEADER_HEIGHT));
            painter.with_clip_rect(clip).text(
                Pos2::new(x + 4.0, origin.y + y),
                Align2::LEFT_CENTER,
                &band.label,
                theme::font_header(),
                theme::TEXT_PRIMARY,
            );
        }
    }

    let label_y = origin.y + HEADER_HEIGHT - 9.0;
    for col in &scale.columns {
        let text = match scale.mode {
            ScaleMode::Quarter => col.start.format("%d/%m").to_string(),
            _ => col.start.day().to_string(),
        };
        let color = if col.is_today {
            theme::TODAY_LINE
        } else if col.is_weekend {
            theme::TEXT_DIM
        } else {
            theme::TEXT_SECONDARY
        };
        painter.text(
            Pos2::new(origin.x + col.x + col.width / 2.0, label_y),
            Align2::CENTER_CENTER,
            text,
            theme::font_small(),
            color,
        );
    }
}

fn draw_grid(painter: &egui::Painter, origin: Pos2, scale: &ScaleConfig, top: f32, bottom: f32) {
    for col in &scale.columns {
        let x = origin.x + col.x;
        if col.is_weekend {
            painter.rect_filled(
                Rect::from_min_max(Pos2::new(x, top), Pos2::new(x + col.width, bottom)),
                0.0,
                theme::WEEKEND_SHADE,
            );
        }
        painter.line_segment(
            [Pos2::new(x, top), Pos2::new(x, bottom)],
            Stroke::new(0.5, theme::GRID_LINE),
        );
    }
}

fn draw_today_line(painter: &egui::Painter, top: Pos2, bottom: f32) {
    painter.line_segment([top, Pos2::new(top.x, bottom)], Stroke::new(1.5, theme::TODAY_LINE));

    let badge_w = 42.0;
    let badge_rect = Rect::from_min_size(Pos2::new(top.x - badge_w / 2.0, top.y - 1.0), Vec2::new(badge_w, 14.0));
    painter.rect_filled(badge_rect, Rounding::same(3.0), theme::TODAY_LINE);
    painter.text(
        badge_rect.center(),
        Align2::CENTER_CENTER,
        "Hoje",
        theme::font_small(),
        Color32::WHITE,
    );
}

fn draw_arrow(painter: &egui::Painter, points: Vec<Pos2>) {
    let Some(&tip) = points.last() else {
        return;
    };
    let stroke = Stroke::new(1.2, theme::ARROW_COLOR);
    painter.add(Shape::line(points, stroke));
    painter.add(Shape::convex_polygon(
        vec![tip, tip + Vec2::new(-6.0, -3.5), tip + Vec2::new(-6.0, 3.5)],
        theme::ARROW_COLOR,
        Stroke::NONE,
    ));
}

fn draw_handles(painter: &egui::Painter, bar_rect: Rect) {
    let handle_h = bar_rect.height() * 0.55;
    let handle_y = bar_rect.center().y - handle_h / 2.0;
    for x in [bar_rect.left() - 1.5, bar_rect.right() - 2.5] {
        painter.rect_filled(
            Rect::from_min_size(Pos2::new(x, handle_y), Vec2::new(4.0, handle_h)),
            Rounding::same(2.0),
            theme::HANDLE_COLOR,
        );
    }
}

fn draw_bar(painter: &egui::Painter, item: &ScheduleItem, bar: &BarGeometry, rect: Rect, highlighted: bool) {
    let fill = theme::bar_fill(item.kind, item.color);
    let rounding = Rounding::same(theme::BAR_ROUNDING);

    if item.kind == ItemKind::Group {
        // Summary bracket: thin bar with end ticks.
        let band = Rect::from_min_size(rect.min, Vec2::new(rect.width(), (rect.height() * 0.4).max(4.0)));
        painter.rect_filled(band, Rounding::same(2.0), fill);
        for x in [rect.left(), rect.right() - 4.0] {
            painter.rect_filled(
                Rect::from_min_size(Pos2::new(x, rect.top()), Vec2::new(4.0, rect.height() * 0.75)),
                0.0,
                fill,
            );
        }
    } else {
        painter.rect_filled(rect.translate(Vec2::new(1.0, 2.0)), rounding, Color32::from_black_alpha(35));
        painter.rect_filled(rect, rounding, fill);
        let highlight = Rect::from_min_size(rect.min, Vec2::new(rect.width(), (rect.height() * 0.45).max(4.0)));
        painter.rect_filled(
            highlight,
            Rounding {
                nw: theme::BAR_ROUNDING,
                ne: theme::BAR_ROUNDING,
                sw: 0.0,
                se: 0.0,
            },
            Color32::from_white_alpha(25),
        );

        let progress = (bar.progress_width / bar.width.max(1.0)).clamp(0.0, 1.0);
        if progress > 0.0 {
            let progress_width = rect.width() * progress;
            painter.rect_filled(
                Rect::from_min_size(rect.min, Vec2::new(progress_width, rect.height())),
                rounding,
                theme::PROGRESS_OVERLAY,
            );
            if progress < 0.98 {
                let tick_x = rect.left() + progress_width;
                painter.line_segment(
                    [Pos2::new(tick_x, rect.top() + 2.0), Pos2::new(tick_x, rect.bottom() - 2.0)],
                    Stroke::new(1.0, Color32::from_white_alpha(60)),
                );
            }
        }
    }

    if highlighted {
        painter.rect_stroke(
            rect.expand(1.5),
            Rounding::same(theme::BAR_ROUNDING + 1.5),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
    }

    if rect.width() > 30.0 && item.is_leaf() {
        let galley = painter.layout_no_wrap(item.name.clone(), theme::font_bar(), theme::TEXT_ON_BAR);
        let text_y = rect.top() + (rect.height() - galley.size().y) / 2.0;
        painter
            .with_clip_rect(rect)
            .galley(Pos2::new(rect.left() + 6.0, text_y), galley, Color32::TRANSPARENT);
    } else if item.kind == ItemKind::Group {
        painter.text(
            Pos2::new(rect.right() + 6.0, rect.center().y),
            Align2::LEFT_CENTER,
            &item.name,
            theme::font_bar(),
            theme::TEXT_SECONDARY,
        );
    }
}
