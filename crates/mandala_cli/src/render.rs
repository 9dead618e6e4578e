//! Plain-text grid rendering.

use mandala_core::{GridSlot, MandalaChart, GRID_SIZE};
use std::fmt::Write;

const CELL_WIDTH: usize = 24;

/// Renders breadcrumb, back hint and the visible 3x3 grid.
///
/// Markers: `*` active center, `+` cell with expanded detail.
pub fn render_chart(chart: &MandalaChart) -> String {
    let mut out = String::new();
    let path: Vec<String> = chart
        .breadcrumb()
        .into_iter()
        .map(|cell| cell.display_text())
        .collect();
    let _ = writeln!(out, "{}", path.join(" > "));
    if let Some(parent) = chart.parent_of_active() {
        let _ = writeln!(out, "(back to \"{}\")", parent.display_text());
    }

    let border = format!(
        "+{}\n",
        format!("{}+", "-".repeat(CELL_WIDTH + 2)).repeat(GRID_SIZE as usize)
    );
    let grid = chart.current_grid();
    out.push_str(&border);
    for row in &grid.rows {
        let mut labels = String::from("|");
        let mut ids = String::from("|");
        for slot in row {
            let (label, id) = match slot {
                GridSlot::Cell(cell) => {
                    let marker = if cell.is_center_topic {
                        "* "
                    } else if chart.has_expanded_detail(&cell.id) {
                        "+ "
                    } else {
                        ""
                    };
                    (format!("{marker}{}", cell.display_text()), cell.id.clone())
                }
                GridSlot::Empty => (String::new(), String::new()),
            };
            let _ = write!(labels, " {} |", fit(&label));
            let _ = write!(ids, " {} |", fit(&id));
        }
        out.push_str(&labels);
        out.push('\n');
        out.push_str(&ids);
        out.push('\n');
        out.push_str(&border);
    }
    out
}

fn fit(value: &str) -> String {
    let flattened = value.replace(['\n', '\r'], " ");
    let count = flattened.chars().count();
    if count <= CELL_WIDTH {
        return format!("{flattened}{}", " ".repeat(CELL_WIDTH - count));
    }
    let mut truncated: String = flattened.chars().take(CELL_WIDTH - 3).collect();
    truncated.push_str("...");
    truncated
}
