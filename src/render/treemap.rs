use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use image::Rgb;
use tracing::info;

use super::color::{hex, weighted_mean, DivergingScale, NO_DATA};
use super::raster::{contrast_color, text_width, truncate, Canvas, BLACK, GLYPH_SIZE, HEADER_FILL, WHITE};
use super::{RenderError, Renderer};
use crate::formatting::format_field;
use crate::types::{Artifact, MetricField, PresentedRow, PresentedTable};

pub const ROOT_LABEL: &str = "Namespaces";
pub const HOVER_TOTAL_COST: &str = "Total Cost";
pub const HOVER_TOTAL_EFFICIENCY: &str = "Total Efficiency";

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 800;
const SCALE: u32 = 2;
const HEADER_HEIGHT: u32 = 40;
const LABEL_PAD: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    fn area(&self) -> f64 {
        self.w * self.h
    }
}

/// A namespace tile. `hover` holds the per-leaf metadata shown on inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct TreemapLeaf {
    pub namespace: String,
    pub cost: f64,
    pub efficiency: Option<f64>,
    pub color: Rgb<u8>,
    pub hover: Vec<(String, String)>,
    pub rect: Rect,
}

impl TreemapLeaf {
    /// Hover entry by label, `n/a` when the leaf has none.
    pub fn hover_entry(&self, label: &str) -> &str {
        self.hover
            .iter()
            .find(|(k, _)| k == label)
            .map(|(_, v)| v.as_str())
            .unwrap_or("n/a")
    }
}

/// Root node plus its leaves, laid out in pixel space.
#[derive(Debug, Clone, PartialEq)]
pub struct Treemap {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub midpoint: Option<f64>,
    pub leaves: Vec<TreemapLeaf>,
}

/// Squarified layout of `values` (largest first) inside `bounds`.
/// Returns one rectangle per value, areas proportional to the values.
pub fn squarify(values: &[f64], bounds: Rect) -> Vec<Rect> {
    let total: f64 = values.iter().sum();
    if values.is_empty() || total <= 0.0 || bounds.area() <= 0.0 {
        return Vec::new();
    }
    let areas: Vec<f64> = values.iter().map(|v| v / total * bounds.area()).collect();

    let mut out = Vec::with_capacity(areas.len());
    let mut free = bounds;
    let mut start = 0;
    while start < areas.len() {
        let short = free.w.min(free.h);
        let mut end = start + 1;
        let mut best = worst_ratio(&areas[start..end], short);
        while end < areas.len() {
            let candidate = worst_ratio(&areas[start..end + 1], short);
            if candidate > best {
                break;
            }
            best = candidate;
            end += 1;
        }

        let row = &areas[start..end];
        let row_sum: f64 = row.iter().sum();
        if free.w >= free.h {
            let col_w = row_sum / free.h;
            let mut y = free.y;
            for a in row {
                let h = a / col_w;
                out.push(Rect { x: free.x, y, w: col_w, h });
                y += h;
            }
            free = Rect { x: free.x + col_w, y: free.y, w: free.w - col_w, h: free.h };
        } else {
            let row_h = row_sum / free.w;
            let mut x = free.x;
            for a in row {
                let w = a / row_h;
                out.push(Rect { x, y: free.y, w, h: row_h });
                x += w;
            }
            free = Rect { x: free.x, y: free.y + row_h, w: free.w, h: free.h - row_h };
        }
        start = end;
    }
    out
}

fn worst_ratio(row: &[f64], short: f64) -> f64 {
    let sum: f64 = row.iter().sum();
    let side2 = short * short;
    let sum2 = sum * sum;
    row.iter()
        .map(|&a| (side2 * a / sum2).max(sum2 / (side2 * a)))
        .fold(0.0, f64::max)
}

fn hover_value(row: &PresentedRow, field: MetricField) -> String {
    row.cell(field)
        .map(str::to_string)
        .or_else(|| row.metric.number(field).map(|v| format_field(field, v)))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Build the two-level hierarchy: root → one leaf per namespace with a
/// positive cost. Colors are centred on the cost-weighted mean efficiency.
pub fn build_treemap(table: &PresentedTable, width: u32, height: u32) -> Treemap {
    let leaves_in: Vec<&PresentedRow> = table
        .rows
        .iter()
        .filter(|r| r.metric.total_cost_or_zero() > 0.0)
        .collect();

    let weighted: Vec<(f64, f64)> = table
        .rows
        .iter()
        .filter_map(|r| {
            r.metric
                .number(MetricField::TotalEfficiency)
                .map(|e| (e, r.metric.total_cost_or_zero().max(0.0)))
        })
        .collect();
    let midpoint = weighted_mean(&weighted);
    let efficiencies: Vec<f64> = weighted.iter().map(|(e, _)| *e).collect();
    let scale = midpoint.map(|mid| DivergingScale::centered(&efficiencies, mid));

    let costs: Vec<f64> = leaves_in.iter().map(|r| r.metric.total_cost_or_zero()).collect();
    let bounds = Rect {
        x: 0.0,
        y: HEADER_HEIGHT as f64,
        w: width as f64,
        h: height.saturating_sub(HEADER_HEIGHT) as f64,
    };
    let rects = squarify(&costs, bounds);

    let leaves = leaves_in
        .iter()
        .zip(rects)
        .map(|(row, rect)| {
            let efficiency = row.metric.number(MetricField::TotalEfficiency);
            let color = match (efficiency, scale) {
                (Some(e), Some(s)) => s.color(e),
                _ => NO_DATA,
            };
            TreemapLeaf {
                namespace: row.namespace.clone(),
                cost: row.metric.total_cost_or_zero(),
                efficiency,
                color,
                hover: vec![
                    (HOVER_TOTAL_COST.to_string(), hover_value(row, MetricField::TotalCost)),
                    (HOVER_TOTAL_EFFICIENCY.to_string(), hover_value(row, MetricField::TotalEfficiency)),
                    ("CPU Efficiency".to_string(), hover_value(row, MetricField::CpuEfficiency)),
                    ("RAM Efficiency".to_string(), hover_value(row, MetricField::RamEfficiency)),
                ],
                rect,
            }
        })
        .collect();

    Treemap {
        title: table.title.clone(),
        width,
        height,
        midpoint,
        leaves,
    }
}

fn root_label(treemap: &Treemap) -> String {
    match treemap.midpoint {
        Some(mid) => format!(
            "{} - {} (color midpoint {})",
            ROOT_LABEL,
            treemap.title,
            format_field(MetricField::TotalEfficiency, mid)
        ),
        None => format!("{} - {}", ROOT_LABEL, treemap.title),
    }
}

pub fn draw_png(treemap: &Treemap) -> Canvas {
    let mut canvas = Canvas::new(treemap.width, treemap.height, WHITE);
    canvas.fill_rect(0, 0, treemap.width, HEADER_HEIGHT, HEADER_FILL);
    let max_chars = (treemap.width.saturating_sub(2 * LABEL_PAD) / (GLYPH_SIZE * SCALE)) as usize;
    canvas.draw_text(
        LABEL_PAD,
        (HEADER_HEIGHT - GLYPH_SIZE * SCALE) / 2,
        &truncate(&root_label(treemap), max_chars),
        SCALE,
        BLACK,
    );

    for leaf in &treemap.leaves {
        let x = leaf.rect.x.round() as u32;
        let y = leaf.rect.y.round() as u32;
        let w = ((leaf.rect.x + leaf.rect.w).round() as u32).saturating_sub(x);
        let h = ((leaf.rect.y + leaf.rect.h).round() as u32).saturating_sub(y);
        canvas.fill_rect(x, y, w, h, leaf.color);
        canvas.stroke_rect(x, y, w, h, WHITE);

        let ink = contrast_color(leaf.color);
        let line_height = GLYPH_SIZE * SCALE + 4;
        let fits_chars = (w.saturating_sub(2 * LABEL_PAD) / (GLYPH_SIZE * SCALE)) as usize;
        let fits_lines = (h.saturating_sub(2 * LABEL_PAD) / line_height) as usize;
        let lines = [
            leaf.namespace.clone(),
            leaf.hover_entry(HOVER_TOTAL_COST).to_string(),
            leaf.hover_entry(HOVER_TOTAL_EFFICIENCY).to_string(),
        ];
        for (i, line) in lines.iter().take(fits_lines).enumerate() {
            if fits_chars == 0 {
                break;
            }
            let text = truncate(line, fits_chars);
            if text_width(&text, SCALE) == 0 {
                continue;
            }
            canvas.draw_text(x + LABEL_PAD, y + LABEL_PAD + i as u32 * line_height, &text, SCALE, ink);
        }
    }
    canvas
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// SVG rendering; each leaf carries a `<title>` tooltip with its metadata.
pub fn to_svg(treemap: &Treemap) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
        w = treemap.width,
        h = treemap.height
    );
    let _ = writeln!(
        svg,
        r#"<rect x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
        treemap.width,
        HEADER_HEIGHT,
        hex(HEADER_FILL)
    );
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" font-size="16">{}</text>"#,
        LABEL_PAD,
        HEADER_HEIGHT / 2 + 6,
        escape_xml(&root_label(treemap))
    );
    for leaf in &treemap.leaves {
        let tooltip = std::iter::once(leaf.namespace.clone())
            .chain(leaf.hover.iter().map(|(k, v)| format!("{}: {}", k, v)))
            .collect::<Vec<_>>()
            .join("\n");
        let ink = hex(contrast_color(leaf.color));
        let _ = writeln!(svg, "<g>");
        let _ = writeln!(svg, "<title>{}</title>", escape_xml(&tooltip));
        let _ = writeln!(
            svg,
            r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" stroke="#ffffff"/>"##,
            leaf.rect.x,
            leaf.rect.y,
            leaf.rect.w,
            leaf.rect.h,
            hex(leaf.color)
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="14" fill="{}">{}</text>"#,
            leaf.rect.x + LABEL_PAD as f64,
            leaf.rect.y + 20.0,
            ink,
            escape_xml(&leaf.namespace)
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="12" fill="{}">{}</text>"#,
            leaf.rect.x + LABEL_PAD as f64,
            leaf.rect.y + 38.0,
            ink,
            escape_xml(leaf.hover_entry(HOVER_TOTAL_COST))
        );
        let _ = writeln!(svg, "</g>");
    }
    svg.push_str("</svg>\n");
    svg
}

/// Treemap image; SVG when the output path ends in `.svg`, PNG otherwise.
pub struct TreemapRenderer {
    output: PathBuf,
    width: u32,
    height: u32,
}

impl TreemapRenderer {
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            output: output.as_ref().to_path_buf(),
            width: WIDTH,
            height: HEIGHT,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(HEADER_HEIGHT + 1);
        self
    }

    fn wants_svg(&self) -> bool {
        self.output
            .extension()
            .map(|e| e.eq_ignore_ascii_case("svg"))
            .unwrap_or(false)
    }
}

impl Renderer for TreemapRenderer {
    fn render(&self, table: &PresentedTable) -> Result<Artifact, RenderError> {
        let treemap = build_treemap(table, self.width, self.height);
        if self.wants_svg() {
            if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&self.output, to_svg(&treemap))?;
        } else {
            draw_png(&treemap).save_png(&self.output)?;
        }
        info!(
            "Wrote treemap with {} leaves to {}",
            treemap.leaves.len(),
            self.output.display()
        );
        Ok(Artifact::File(self.output.clone()))
    }
}
