//! # Icon Layout
//!
//! Packs the icons of an edge group into a near-square grid centred on the
//! edge midpoint.

use glam::DVec2;

use crate::geometry::Rect;

/// One cell of an icon panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IconSlot {
    Named(String),
    /// Stands for the icons beyond the cap.
    Overflow,
}

/// Distinct icon names in order of first appearance, at most `cap` of them,
/// followed by [`IconSlot::Overflow`] when more were offered.
pub fn collect_icons<'a>(names: impl IntoIterator<Item = &'a str>, cap: usize) -> Vec<IconSlot> {
    let mut slots: Vec<IconSlot> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();
    for name in names {
        if seen.contains(&name) {
            continue;
        }
        if seen.len() >= cap {
            slots.push(IconSlot::Overflow);
            break;
        }
        seen.push(name);
        slots.push(IconSlot::Named(name.to_string()));
    }
    slots
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IconGrid {
    pub columns: usize,
    pub rows: usize,
}

impl IconGrid {
    /// Grid for `count` icons: one row below four icons, otherwise
    /// `ceil(sqrt(count))` columns and as many rows as needed.
    pub fn for_count(count: usize) -> Self {
        if count < 4 {
            return Self {
                columns: count,
                rows: usize::from(count > 0),
            };
        }
        let mut columns = (count as f64).sqrt().floor() as usize;
        if columns * columns < count {
            columns += 1;
        }
        Self {
            columns,
            rows: count.div_ceil(columns),
        }
    }

    pub fn cells(&self) -> usize {
        self.columns * self.rows
    }
}

/// Placement of an icon panel on screen.
#[derive(Clone, Debug, PartialEq)]
pub struct IconPanel {
    pub grid: IconGrid,
    /// Panel background, padding included.
    pub bounds: Rect,
    /// Top-left corner of each icon, row-major.
    pub cells: Vec<DVec2>,
}

/// Lays out `count` icons of `icon_size` with `padding` around and between
/// them. `None` when there is nothing to lay out.
pub fn layout_panel(count: usize, icon_size: DVec2, padding: DVec2, center: DVec2) -> Option<IconPanel> {
    if count == 0 {
        return None;
    }
    let grid = IconGrid::for_count(count);
    let size = DVec2::new(
        grid.columns as f64 * icon_size.x + (grid.columns + 1) as f64 * padding.x,
        grid.rows as f64 * icon_size.y + (grid.rows + 1) as f64 * padding.y,
    );
    let bounds = Rect::from_center(center, size / 2.0);

    let step = icon_size + padding;
    let cells = (0..count)
        .map(|i| {
            let (row, col) = (i / grid.columns, i % grid.columns);
            bounds.min + padding + DVec2::new(col as f64 * step.x, row as f64 * step.y)
        })
        .collect();

    Some(IconPanel { grid, bounds, cells })
}
