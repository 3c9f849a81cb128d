use std::path::{Path, PathBuf};

use tracing::info;

use super::raster::{text_width, Canvas, BLACK, GLYPH_SIZE, GRID, HEADER_FILL, STRIPE_FILL, WHITE};
use super::{RenderError, Renderer};
use crate::types::{Artifact, PresentedTable};

const SCALE: u32 = 2;
const PAD: u32 = 10;
const ROW_HEIGHT: u32 = GLYPH_SIZE * SCALE + 2 * PAD;

/// Grid image: a title line, a shaded header row, then one row per namespace.
pub struct TableImageRenderer {
    output: PathBuf,
}

/// Column widths and overall size of a table image.
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    pub columns: Vec<u32>,
    pub width: u32,
    pub height: u32,
}

impl TableImageRenderer {
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            output: output.as_ref().to_path_buf(),
        }
    }

    fn header(table: &PresentedTable) -> Vec<String> {
        let mut header = vec!["Namespace".to_string()];
        header.extend(table.fields.iter().map(|f| f.header().to_string()));
        header
    }

    fn body(table: &PresentedTable) -> Vec<Vec<String>> {
        table
            .rows
            .iter()
            .map(|row| {
                let mut cells = vec![row.namespace.clone()];
                cells.extend(
                    table
                        .fields
                        .iter()
                        .map(|f| row.cell(*f).unwrap_or("-").to_string()),
                );
                cells
            })
            .collect()
    }

    pub fn layout(table: &PresentedTable) -> TableLayout {
        let header = Self::header(table);
        let body = Self::body(table);
        let columns: Vec<u32> = (0..header.len())
            .map(|col| {
                let widest = std::iter::once(&header[col])
                    .chain(body.iter().map(|r| &r[col]))
                    .map(|s| text_width(s, SCALE))
                    .max()
                    .unwrap_or(0);
                widest + 2 * PAD
            })
            .collect();
        let grid_width: u32 = columns.iter().sum();
        let width = grid_width.max(text_width(&table.title, SCALE) + 2 * PAD) + 1;
        // title + header + rows
        let height = ROW_HEIGHT * (2 + body.len() as u32) + 1;
        TableLayout { columns, width, height }
    }

    pub fn draw(table: &PresentedTable) -> Canvas {
        let layout = Self::layout(table);
        let mut canvas = Canvas::new(layout.width, layout.height, WHITE);
        canvas.draw_text(PAD, PAD, &table.title, SCALE, BLACK);

        let mut rows = vec![Self::header(table)];
        rows.extend(Self::body(table));

        for (r, cells) in rows.iter().enumerate() {
            let y = ROW_HEIGHT * (r as u32 + 1);
            let grid_width: u32 = layout.columns.iter().sum();
            if r == 0 {
                canvas.fill_rect(0, y, grid_width, ROW_HEIGHT, HEADER_FILL);
            } else if r % 2 == 0 {
                canvas.fill_rect(0, y, grid_width, ROW_HEIGHT, STRIPE_FILL);
            }

            let mut x = 0;
            for (c, text) in cells.iter().enumerate() {
                let col_width = layout.columns[c];
                // Namespace left-aligned, values right-aligned.
                let tx = if c == 0 || r == 0 {
                    x + PAD
                } else {
                    x + col_width - PAD - text_width(text, SCALE)
                };
                canvas.draw_text(tx, y + PAD, text, SCALE, BLACK);
                canvas.stroke_rect(x, y, col_width + 1, ROW_HEIGHT + 1, GRID);
                x += col_width;
            }
        }
        canvas
    }
}

impl Renderer for TableImageRenderer {
    fn render(&self, table: &PresentedTable) -> Result<Artifact, RenderError> {
        let canvas = Self::draw(table);
        canvas.save_png(&self.output)?;
        info!(
            "Wrote {}x{} table image to {}",
            canvas.width(),
            canvas.height(),
            self.output.display()
        );
        Ok(Artifact::File(self.output.clone()))
    }
}
