//! Terminal output utilities: status notes and simple aligned tables.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM").map(|t| t != "dumb").unwrap_or(false))
}

fn note(symbol: &str, color: &str, plain: &str, msg: &str) -> String {
    if supports_color() {
        format!("{color}{BOLD}{symbol}{RESET} {msg}")
    } else {
        format!("{plain}: {msg}")
    }
}

pub fn note_info(msg: &str) {
    println!("{}", note("ℹ", CYAN, "INFO", msg));
}

pub fn note_warn(msg: &str) {
    println!("{}", note("⚠", YELLOW, "WARN", msg));
}

pub fn note_error(msg: &str) {
    eprintln!("{}", note("✗", RED, "ERROR", msg));
}

pub fn note_success(msg: &str) {
    println!("{}", note("✓", GREEN, "OK", msg));
}

/// Render rows as left-aligned columns under a header.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        format!("  {}", padded.join("  ").trim_end())
    };

    let mut out = String::new();
    out.push_str(&line(headers.to_vec()));
    out.push('\n');
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&line(separator.iter().map(String::as_str).collect()));
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_aligns_columns() {
        let rows = vec![
            vec!["models/gemini-2.0-flash".to_string(), "Gemini 2.0 Flash".to_string()],
            vec!["gpt-4o".to_string(), "gpt-4o".to_string()],
        ];
        let table = render_table(&["NAME", "DISPLAY NAME"], &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], format!("  {:<23}  DISPLAY NAME", "NAME"));
        assert_eq!(lines[3], format!("  {:<23}  gpt-4o", "gpt-4o"));
    }
}
