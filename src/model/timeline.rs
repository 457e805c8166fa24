use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Controls what granularity the timeline displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMode {
    Day,
    Week,
    #[default]
    Month,
    Quarter,
}

impl ScaleMode {
    pub const ALL: [ScaleMode; 4] = [
        ScaleMode::Day,
        ScaleMode::Week,
        ScaleMode::Month,
        ScaleMode::Quarter,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ScaleMode::Day => "Dia",
            ScaleMode::Week => "Semana",
            ScaleMode::Month => "Mês",
            ScaleMode::Quarter => "Trimestre",
        }
    }

    /// Days covered by one column.
    pub fn column_days(self) -> u32 {
        match self {
            ScaleMode::Quarter => 7,
            _ => 1,
        }
    }
}

/// Pixel width of one column per scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellWidths {
    pub day: f32,
    pub week: f32,
    pub month: f32,
    pub quarter: f32,
}

impl Default for CellWidths {
    fn default() -> Self {
        Self {
            day: 40.0,
            week: 16.0,
            month: 28.0,
            quarter: 35.0,
        }
    }
}

impl CellWidths {
    pub fn for_mode(&self, mode: ScaleMode) -> f32 {
        let w = match mode {
            ScaleMode::Day => self.day,
            ScaleMode::Week => self.week,
            ScaleMode::Month => self.month,
            ScaleMode::Quarter => self.quarter,
        };
        w.max(1.0)
    }
}

/// One column of the time grid: a single day or a 7-day range.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeColumn {
    pub start: NaiveDate,
    pub days: u32,
    pub x: f32,
    pub width: f32,
    pub is_weekend: bool,
    pub is_today: bool,
}

impl TimeColumn {
    /// Last day covered by this column (inclusive).
    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(i64::from(self.days) - 1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end()
    }
}

/// A labelled run of adjacent columns in a header row.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderBand {
    pub label: String,
    pub first_column: usize,
    pub span: usize,
}

/// The built time axis for one scale and anchor: columns, header bands and
/// all date/pixel conversions. Layout and drag math both go through here.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleConfig {
    pub mode: ScaleMode,
    pub columns: Vec<TimeColumn>,
    pub cell_width: f32,
    /// Month bands, present for every scale.
    pub month_bands: Vec<HeaderBand>,
    /// ISO week bands; only the week scale shows them.
    pub week_bands: Vec<HeaderBand>,
}

impl ScaleConfig {
    /// Build the axis for `mode` around `anchor`, marking `today`.
    pub fn build_with(mode: ScaleMode, anchor: NaiveDate, today: NaiveDate, widths: &CellWidths) -> Self {
        let cell_width = widths.for_mode(mode);
        let first_of_month = first_of_month(anchor);
        let (start, count) = match mode {
            ScaleMode::Day | ScaleMode::Month => (first_of_month, 35),
            ScaleMode::Week => (monday_on_or_before(anchor), 84),
            ScaleMode::Quarter => {
                let start = monday_on_or_before(first_of_month);
                let until = first_of_month
                    .checked_add_months(Months::new(6))
                    .unwrap_or(first_of_month + Duration::days(183));
                let days = (until - start).num_days();
                (start, ((days + 6) / 7) as usize)
            }
        };

        let days = mode.column_days();
        let columns: Vec<TimeColumn> = (0..count)
            .map(|i| {
                let col_start = start + Duration::days(i as i64 * i64::from(days));
                let col = TimeColumn {
                    start: col_start,
                    days,
                    x: i as f32 * cell_width,
                    width: cell_width,
                    is_weekend: days == 1 && col_start.weekday().num_days_from_monday() >= 5,
                    is_today: false,
                };
                TimeColumn {
                    is_today: col.contains(today),
                    ..col
                }
            })
            .collect();

        let month_bands = bands(&columns, |c| c.start.format("%b %Y").to_string());
        let week_bands = if mode == ScaleMode::Week {
            bands(&columns, |c| c.start.format("S%V").to_string())
        } else {
            Vec::new()
        };

        Self {
            mode,
            columns,
            cell_width,
            month_bands,
            week_bands,
        }
    }

    pub fn total_width(&self) -> f32 {
        self.columns.len() as f32 * self.cell_width
    }

    /// First visible day.
    pub fn window_start(&self) -> NaiveDate {
        self.columns.first().map(|c| c.start).unwrap_or_default()
    }

    /// Last visible day (inclusive).
    pub fn window_end(&self) -> NaiveDate {
        self.columns.last().map(TimeColumn::end).unwrap_or_default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        !self.columns.is_empty() && date >= self.window_start() && date <= self.window_end()
    }

    /// Left edge of `date`, interpolated by day-fraction inside its column and
    /// clamped to `[0, total_width]` for dates outside the window.
    pub fn date_to_pixel(&self, date: NaiveDate) -> f32 {
        if self.columns.is_empty() || date < self.window_start() {
            return 0.0;
        }
        if date > self.window_end() {
            return self.total_width();
        }
        let offset = (date - self.window_start()).num_days();
        let days = i64::from(self.mode.column_days());
        let col = &self.columns[(offset / days) as usize];
        let fraction = (date - col.start).num_days() as f32 / col.days as f32;
        col.x + fraction * col.width
    }

    /// Inverse of [`date_to_pixel`](Self::date_to_pixel), rounded to the
    /// nearest whole day.
    pub fn pixel_to_date(&self, px: f32) -> NaiveDate {
        let Some(col) = self.column_at(px) else {
            return NaiveDate::default();
        };
        let px = self.clamp_px(px);
        let fraction = ((px - col.x) / col.width).clamp(0.0, 1.0);
        let days = (fraction * col.days as f32).round() as i64;
        col.start + Duration::days(days)
    }

    /// Column under `px`; positions past either end resolve to the edge column.
    pub fn column_at(&self, px: f32) -> Option<&TimeColumn> {
        if self.columns.is_empty() {
            return None;
        }
        let idx = (self.clamp_px(px) / self.cell_width).floor() as usize;
        self.columns.get(idx.min(self.columns.len() - 1))
    }

    /// Round to the nearest grid line.
    pub fn snap(&self, px: f32) -> f32 {
        (px / self.cell_width).round() * self.cell_width
    }

    pub fn clamp_px(&self, px: f32) -> f32 {
        px.clamp(0.0, self.total_width())
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

fn monday_on_or_before(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Group consecutive columns sharing the same label.
fn bands(columns: &[TimeColumn], label: impl Fn(&TimeColumn) -> String) -> Vec<HeaderBand> {
    let mut out: Vec<HeaderBand> = Vec::new();
    for (i, col) in columns.iter().enumerate() {
        let text = label(col);
        match out.last_mut() {
            Some(band) if band.label == text => band.span += 1,
            _ => out.push(HeaderBand {
                label: text,
                first_column: i,
                span: 1,
            }),
        }
    }
    out
}
