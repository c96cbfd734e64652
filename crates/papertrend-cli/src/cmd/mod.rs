pub mod figure;
pub mod merge;
pub mod parse;

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

/// Two-column table in the style of `papertrend config`.
pub fn summary_table(header: &str, rows: Vec<(&str, String)>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new(header).fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    for (name, value) in rows {
        table.add_row(vec![name.to_string(), value]);
    }
    table
}

pub fn pct(part: usize, whole: usize) -> String {
    if whole > 0 {
        format!("{part} ({:.1}%)", part as f64 / whole as f64 * 100.0)
    } else {
        part.to_string()
    }
}
