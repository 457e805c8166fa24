use egui::{Align2, Color32, Id, LayerId, Order, Pos2, Rect, Rounding, Stroke, Vec2};

use crate::engine::{DropIndicator, PresentationPort};
use crate::model::{PxPoint, PxRect};
use crate::ui::theme;

#[derive(Debug, Clone)]
struct Ghost {
    label: String,
    size: Vec2,
    /// Grab point relative to the ghost's top-left corner.
    grab: Vec2,
    at: Pos2,
}

/// egui side of the reorder port: remembers what the engine asked for and
/// paints it on a foreground layer each frame. Coordinates are screen points.
#[derive(Debug, Default)]
pub struct OverlayPort {
    ghost: Option<Ghost>,
    indicator: Option<DropIndicator>,
    labels: Vec<(String, String)>,
}

impl OverlayPort {
    /// Register display text for a drag key; unknown keys show the key itself.
    pub fn set_labels(&mut self, labels: Vec<(String, String)>) {
        self.labels = labels;
    }

    pub fn paint(&self, ctx: &egui::Context) {
        if self.ghost.is_none() && self.indicator.is_none() {
            return;
        }
        let painter = ctx.layer_painter(LayerId::new(Order::Tooltip, Id::new("reorder-overlay")));

        match self.indicator {
            Some(DropIndicator::Line { left, y, width }) => {
                painter.line_segment(
                    [Pos2::new(left, y), Pos2::new(left + width, y)],
                    Stroke::new(2.0, theme::DROP_INDICATOR),
                );
                painter.circle_filled(Pos2::new(left, y), 3.0, theme::DROP_INDICATOR);
            }
            Some(DropIndicator::Column { x, top, height }) => {
                painter.line_segment(
                    [Pos2::new(x, top), Pos2::new(x, top + height)],
                    Stroke::new(2.0, theme::DROP_INDICATOR),
                );
            }
            None => {}
        }

        if let Some(ghost) = &self.ghost {
            let rect = Rect::from_min_size(ghost.at - ghost.grab, ghost.size);
            painter.rect_filled(rect.translate(Vec2::new(2.0, 3.0)), Rounding::same(4.0), Color32::from_black_alpha(60));
            painter.rect(rect, Rounding::same(4.0), theme::GHOST_FILL, Stroke::new(1.0, theme::BORDER_ACCENT));
            painter.with_clip_rect(rect).text(
                Pos2::new(rect.left() + 8.0, rect.center().y),
                Align2::LEFT_CENTER,
                &ghost.label,
                theme::font_bar(),
                theme::TEXT_ON_BAR,
            );
        }
    }
}

impl PresentationPort for OverlayPort {
    fn create_ghost(&mut self, key: &str, source: PxRect, at: PxPoint) {
        let label = self
            .labels
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, l)| l.clone())
            .unwrap_or_else(|| key.to_string());
        self.ghost = Some(Ghost {
            label,
            size: Vec2::new(source.width, source.height),
            grab: Vec2::new(at.x - source.left, at.y - source.top),
            at: Pos2::new(at.x, at.y),
        });
    }

    fn move_ghost(&mut self, at: PxPoint) {
        if let Some(ghost) = &mut self.ghost {
            ghost.at = Pos2::new(at.x, at.y);
        }
    }

    fn remove_ghost(&mut self) {
        self.ghost = None;
    }

    fn set_indicator_position(&mut self, indicator: Option<DropIndicator>) {
        self.indicator = indicator;
    }
}

/// Conversions between egui rects and the engine's pixel types.
pub fn px_rect(rect: Rect) -> PxRect {
    PxRect::new(rect.left(), rect.top(), rect.width(), rect.height())
}

pub fn px_point(pos: Pos2) -> PxPoint {
    PxPoint::new(pos.x, pos.y)
}

pub fn egui_rect(rect: PxRect) -> Rect {
    Rect::from_min_size(Pos2::new(rect.left, rect.top), Vec2::new(rect.width, rect.height))
}
