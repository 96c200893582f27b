//! Rendering and export of the activity log
//!
//! Everything here reads the log through [`LogTable`] and never mutates it.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};
use unicode_width::UnicodeWidthStr;

use crate::activity_log::ActivityLog;
use crate::error::{ExportError, Result};

pub const HEADERS: [&str; 6] = [
    "Segment",
    "Code",
    "Activity",
    "Points per Unit",
    "Count",
    "Total Points",
];

/// Columns holding numbers are right-aligned
const NUMERIC_COLUMNS: [bool; 6] = [false, false, false, true, true, true];

/// Read-only, display-ready snapshot of the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTable {
    pub rows: Vec<[String; 6]>,
    pub total: u64,
}

impl LogTable {
    pub fn from_log(log: &ActivityLog) -> Self {
        let rows = log
            .entries()
            .iter()
            .map(|e| {
                [
                    e.segment.clone(),
                    e.code.clone(),
                    e.activity_label.clone(),
                    e.points_per_unit.to_string(),
                    e.count.to_string(),
                    e.total_points.to_string(),
                ]
            })
            .collect();
        Self {
            rows,
            total: log.total(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Display width of each column, header included
    fn column_widths(&self) -> [usize; 6] {
        let mut widths = HEADERS.map(|h| h.width());
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.width());
            }
        }
        widths
    }
}

fn pad(text: &str, width: usize, right_align: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(text.width()));
    if right_align {
        format!("{}{}", fill, text)
    } else {
        format!("{}{}", text, fill)
    }
}

/// Plain-text rendering of the table, or `None` when the log is empty
pub fn render_text(table: &LogTable) -> Option<String> {
    if table.is_empty() {
        return None;
    }

    let widths = table.column_widths();
    let line = |cells: [&str; 6]| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| pad(cell, widths[i], NUMERIC_COLUMNS[i]))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(HEADERS));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in &table.rows {
        out.push_str(&line(std::array::from_fn(|i| row[i].as_str())));
        out.push('\n');
    }
    out.push_str(&format!("Total Points: {}\n", table.total));
    Some(out)
}

/// Timestamped default export name, e.g. `activity-log-20250101-093000.png`
pub fn default_file_name(extension: &str) -> String {
    format!(
        "{}.{}",
        Local::now().format("activity-log-%Y%m%d-%H%M%S"),
        extension
    )
}

/// Default export path inside `dir`
pub fn default_export_path(dir: &Path, extension: &str) -> PathBuf {
    dir.join(default_file_name(extension))
}

const SCALE: u32 = 2;
const GLYPH: u32 = 8 * SCALE;
const LINE_HEIGHT: u32 = GLYPH + 8;
const MARGIN: u32 = 12;
const CELL_PAD: u32 = 6;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([20, 20, 20]);
const GRID: Rgb<u8> = Rgb([190, 190, 190]);
const HEADER_BG: Rgb<u8> = Rgb([225, 235, 245]);

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let x_end = (x + w).min(img.width());
    let y_end = (y + h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, color);
        }
    }
}

fn draw_text(img: &mut RgbImage, x: u32, y: u32, text: &str, color: Rgb<u8>) {
    for (i, c) in text.chars().enumerate() {
        let glyph = BASIC_FONTS
            .get(c)
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8]);
        let gx = x + i as u32 * GLYPH;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..8u32 {
                // bit 0 is the leftmost pixel
                if bits & (1 << col) != 0 {
                    fill_rect(
                        img,
                        gx + col * SCALE,
                        y + row as u32 * SCALE,
                        SCALE,
                        SCALE,
                        color,
                    );
                }
            }
        }
    }
}

/// Rasterize the table. Each character occupies one fixed-width glyph cell.
pub fn render_image(table: &LogTable) -> std::result::Result<RgbImage, ExportError> {
    if table.is_empty() {
        return Err(ExportError::EmptyLog);
    }

    let char_widths: Vec<u32> = (0..HEADERS.len())
        .map(|i| {
            std::iter::once(HEADERS[i])
                .chain(table.rows.iter().map(|r| r[i].as_str()))
                .map(|s| s.chars().count() as u32)
                .max()
                .unwrap_or(0)
        })
        .collect();
    let col_px: Vec<u32> = char_widths
        .iter()
        .map(|w| w * GLYPH + 2 * CELL_PAD)
        .collect();

    let grid_width: u32 = col_px.iter().sum();
    let total_text = format!("Total Points: {}", table.total);
    let width = 2 * MARGIN + grid_width.max(total_text.chars().count() as u32 * GLYPH);
    let grid_rows = table.rows.len() as u32 + 1;
    let height = 2 * MARGIN + (grid_rows + 1) * LINE_HEIGHT + CELL_PAD;

    let mut img = RgbImage::from_pixel(width, height, WHITE);
    fill_rect(&mut img, MARGIN, MARGIN, grid_width, LINE_HEIGHT, HEADER_BG);

    let text_offset = (LINE_HEIGHT - GLYPH) / 2;
    let draw_row = |img: &mut RgbImage, row_index: u32, cells: [&str; 6]| {
        let y = MARGIN + row_index * LINE_HEIGHT + text_offset;
        let mut x = MARGIN;
        for (i, cell) in cells.iter().enumerate() {
            let text_px = cell.chars().count() as u32 * GLYPH;
            let tx = if NUMERIC_COLUMNS[i] {
                x + col_px[i] - CELL_PAD - text_px
            } else {
                x + CELL_PAD
            };
            draw_text(img, tx, y, cell, INK);
            x += col_px[i];
        }
    };

    draw_row(&mut img, 0, HEADERS);
    for (i, row) in table.rows.iter().enumerate() {
        let cells = std::array::from_fn(|col| row[col].as_str());
        draw_row(&mut img, i as u32 + 1, cells);
    }

    // grid
    for r in 0..=grid_rows {
        fill_rect(&mut img, MARGIN, MARGIN + r * LINE_HEIGHT, grid_width, 1, GRID);
    }
    let mut x = MARGIN;
    for w in std::iter::once(&0).chain(col_px.iter()) {
        x += w;
        fill_rect(
            &mut img,
            x.min(MARGIN + grid_width - 1),
            MARGIN,
            1,
            grid_rows * LINE_HEIGHT,
            GRID,
        );
    }

    draw_text(
        &mut img,
        MARGIN + CELL_PAD,
        MARGIN + grid_rows * LINE_HEIGHT + CELL_PAD + text_offset,
        &total_text,
        INK,
    );

    Ok(img)
}

/// Write the table as a PNG image
pub fn export_png(table: &LogTable, path: &Path) -> Result<()> {
    let img = render_image(table)?;
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(ExportError::Image)?;
    tracing::info!(path = %path.display(), rows = table.rows.len(), "Exported PNG");
    Ok(())
}

/// Write the log entries as pretty-printed JSON
pub fn export_json(log: &ActivityLog, path: &Path) -> Result<()> {
    if log.is_empty() {
        return Err(ExportError::EmptyLog.into());
    }
    let data = serde_json::to_string_pretty(log)?;
    fs::write(path, data)?;
    tracing::info!(path = %path.display(), rows = log.len(), "Exported JSON");
    Ok(())
}

/// Put the text rendering on the system clipboard
pub fn copy_to_clipboard(table: &LogTable) -> Result<()> {
    let text = render_text(table).ok_or(ExportError::EmptyLog)?;
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| ExportError::Clipboard(e.to_string()))?;
    clipboard
        .set_text(text)
        .map_err(|e| ExportError::Clipboard(e.to_string()))?;
    tracing::debug!(rows = table.rows.len(), "Copied activity log to clipboard");
    Ok(())
}
