use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{ItemId, ItemKind, PxPoint, PxRect, ScaleConfig, ScheduleItem};

/// Vertical metrics of the chart body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub row_height: f32,
    /// Vertical inset so bars don't touch row edges.
    pub bar_inset: f32,
    /// Horizontal run of an arrow before it turns.
    pub arrow_stub: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            row_height: 32.0,
            bar_inset: 5.0,
            arrow_stub: 8.0,
        }
    }
}

/// Paint geometry of one item.
#[derive(Debug, Clone, PartialEq)]
pub struct BarGeometry {
    pub id: ItemId,
    pub kind: ItemKind,
    pub row: usize,
    pub left: f32,
    pub width: f32,
    /// Width of the filled (completed) part.
    pub progress_width: f32,
    pub rect: PxRect,
}

impl BarGeometry {
    pub fn right(&self) -> f32 {
        self.left + self.width
    }
}

/// Orthogonal connector from a predecessor's end to a successor's start.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyArrow {
    pub from: ItemId,
    pub to: ItemId,
    pub from_row: usize,
    pub to_row: usize,
    pub from_x: f32,
    pub to_x: f32,
    pub path: Vec<PxPoint>,
}

/// Everything the canvas needs to paint one frame.
#[derive(Debug, Clone, Default)]
pub struct TimelineLayout {
    pub bars: Vec<BarGeometry>,
    pub arrows: Vec<DependencyArrow>,
    pub today_x: Option<f32>,
    pub width: f32,
    pub height: f32,
    index: HashMap<ItemId, usize>,
}

impl TimelineLayout {
    /// Lay out `items` (already flattened and filtered, one per row) on `scale`.
    pub fn compute(
        items: &[ScheduleItem],
        scale: &ScaleConfig,
        today: NaiveDate,
        opts: &LayoutOptions,
    ) -> Self {
        let cw = scale.cell_width;
        let bar_height = (opts.row_height - opts.bar_inset * 2.0).max(1.0);

        let bars: Vec<BarGeometry> = items
            .iter()
            .enumerate()
            .map(|(row, item)| {
                let left = scale.date_to_pixel(item.start);
                let right = scale.date_to_pixel(item.end) + cw;
                let width = (right - left).max(cw / 2.0);
                BarGeometry {
                    id: item.id,
                    kind: item.kind,
                    row,
                    left,
                    width,
                    progress_width: width * item.progress(),
                    rect: PxRect::new(
                        left,
                        row as f32 * opts.row_height + opts.bar_inset,
                        width,
                        bar_height,
                    ),
                }
            })
            .collect();

        let index: HashMap<ItemId, usize> =
            bars.iter().enumerate().map(|(i, b)| (b.id, i)).collect();

        let mut arrows = Vec::new();
        for item in items.iter().filter(|i| i.is_leaf()) {
            let Some(&to_idx) = index.get(&item.id) else {
                continue;
            };
            for dep in &item.depends_on {
                let Some(&from_idx) = index.get(dep) else {
                    tracing::trace!(item = %item.id, dependency = %dep, "dependency not visible, arrow omitted");
                    continue;
                };
                arrows.push(route_arrow(&bars[from_idx], &bars[to_idx], opts));
            }
        }

        let today_x = scale
            .contains(today)
            .then(|| scale.date_to_pixel(today) + cw / 2.0)
            .filter(|x| *x <= scale.total_width());

        Self {
            bars,
            arrows,
            today_x,
            width: scale.total_width(),
            height: items.len() as f32 * opts.row_height,
            index,
        }
    }

    pub fn bar(&self, id: ItemId) -> Option<&BarGeometry> {
        self.index.get(&id).map(|&i| &self.bars[i])
    }
}

fn route_arrow(from: &BarGeometry, to: &BarGeometry, opts: &LayoutOptions) -> DependencyArrow {
    let from_x = from.right();
    let to_x = to.left;
    let fy = from.rect.center().y;
    let ty = to.rect.center().y;
    let out_x = from_x + opts.arrow_stub;

    let path = if to_x - opts.arrow_stub >= out_x {
        vec![
            PxPoint::new(from_x, fy),
            PxPoint::new(out_x, fy),
            PxPoint::new(out_x, ty),
            PxPoint::new(to_x, ty),
        ]
    } else {
        // Successor starts before the predecessor ends: run back along the
        // row boundary and come in from the left.
        let boundary = if to.row > from.row {
            (from.row + 1) as f32 * opts.row_height
        } else {
            from.row as f32 * opts.row_height
        };
        let in_x = to_x - opts.arrow_stub;
        vec![
            PxPoint::new(from_x, fy),
            PxPoint::new(out_x, fy),
            PxPoint::new(out_x, boundary),
            PxPoint::new(in_x, boundary),
            PxPoint::new(in_x, ty),
            PxPoint::new(to_x, ty),
        ]
    };

    DependencyArrow {
        from: from.id,
        to: to.id,
        from_row: from.row,
        to_row: to.row,
        from_x,
        to_x,
        path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellWidths, ScaleMode};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn month() -> ScaleConfig {
        ScaleConfig::build_with(ScaleMode::Month, d(2025, 3, 1), d(2025, 3, 12), &CellWidths::default())
    }

    #[test]
    fn bar_spans_start_to_end_inclusive() {
        let item = ScheduleItem::new_leaf("Storyboard", d(2025, 3, 3), d(2025, 3, 5));
        let layout = TimelineLayout::compute(&[item.clone()], &month(), d(2025, 3, 12), &LayoutOptions::default());
        let bar = layout.bar(item.id).unwrap();
        assert_eq!(bar.left, 56.0);
        assert_eq!(bar.width, 84.0);
        assert_eq!(bar.row, 0);
    }

    #[test]
    fn zero_duration_item_still_visible() {
        let item = ScheduleItem::new_leaf("Entrega", d(2025, 3, 10), d(2025, 3, 10));
        let layout = TimelineLayout::compute(&[item.clone()], &month(), d(2025, 3, 12), &LayoutOptions::default());
        assert!(layout.bar(item.id).unwrap().width >= 14.0);
    }

    #[test]
    fn arrow_runs_from_dependency_end_to_dependent_start() {
        let a = ScheduleItem::new_leaf("Roteiro", d(2025, 3, 3), d(2025, 3, 4));
        let mut b = ScheduleItem::new_leaf("Gravação", d(2025, 3, 7), d(2025, 3, 9));
        b.depends_on.insert(a.id);
        let layout = TimelineLayout::compute(&[a.clone(), b.clone()], &month(), d(2025, 3, 12), &LayoutOptions::default());

        assert_eq!(layout.arrows.len(), 1);
        let arrow = &layout.arrows[0];
        let a_bar = layout.bar(a.id).unwrap();
        let b_bar = layout.bar(b.id).unwrap();
        assert_eq!(arrow.from_x, a_bar.right());
        assert_eq!(arrow.to_x, b_bar.left);
        assert_eq!((arrow.from_row, arrow.to_row), (0, 1));
        assert_eq!(arrow.path.first().unwrap().x, a_bar.right());
        assert_eq!(arrow.path.last().unwrap().x, b_bar.left);
    }

    #[test]
    fn backward_arrow_detours_along_row_boundary() {
        let a = ScheduleItem::new_leaf("Edição", d(2025, 3, 3), d(2025, 3, 10));
        let mut b = ScheduleItem::new_leaf("Cor", d(2025, 3, 5), d(2025, 3, 6));
        b.depends_on.insert(a.id);
        let opts = LayoutOptions::default();
        let layout = TimelineLayout::compute(&[a, b], &month(), d(2025, 3, 12), &opts);
        let arrow = &layout.arrows[0];
        assert_eq!(arrow.path.len(), 6);
        assert_eq!(arrow.path[2].y, opts.row_height);
    }

    #[test]
    fn hidden_dependency_emits_no_arrow() {
        let hidden = ScheduleItem::new_leaf("Oculto", d(2025, 3, 1), d(2025, 3, 2));
        let mut b = ScheduleItem::new_leaf("Visível", d(2025, 3, 7), d(2025, 3, 9));
        b.depends_on.insert(hidden.id);
        let layout = TimelineLayout::compute(&[b], &month(), d(2025, 3, 12), &LayoutOptions::default());
        assert!(layout.arrows.is_empty());
    }

    #[test]
    fn today_marker_inside_and_outside_window() {
        let scale = month();
        let inside = TimelineLayout::compute(&[], &scale, d(2025, 3, 12), &LayoutOptions::default());
        assert_eq!(inside.today_x, Some(11.0 * 28.0 + 14.0));
        let outside = TimelineLayout::compute(&[], &scale, d(2025, 6, 1), &LayoutOptions::default());
        assert_eq!(outside.today_x, None);
    }
}
