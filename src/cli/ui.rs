use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    TotalValue,
    Error,
    Subtle,
    Notice,
}

/// Terminal palette; the dashboard toggles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Dark => write!(f, "dark"),
            Theme::Light => write!(f, "light"),
        }
    }
}

static LIGHT_THEME: AtomicBool = AtomicBool::new(false);

pub fn theme() -> Theme {
    if LIGHT_THEME.load(Ordering::Relaxed) {
        Theme::Light
    } else {
        Theme::Dark
    }
}

/// Flips the palette and returns the new theme.
pub fn toggle_theme() -> Theme {
    let was_light = LIGHT_THEME.fetch_xor(true, Ordering::Relaxed);
    if was_light { Theme::Dark } else { Theme::Light }
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let light = theme() == Theme::Light;
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::TotalValue if light => style(text).blue().bold(),
        StyleType::TotalValue => style(text).yellow().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
        StyleType::Notice if light => style(text).white().on_blue(),
        StyleType::Notice => style(text).black().on_green(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    let color = match theme() {
        Theme::Dark => Color::Cyan,
        Theme::Light => Color::DarkBlue,
    };
    Cell::new(text)
        .fg(color)
        .add_attribute(Attribute::Bold)
}

/// Right-aligned amount with two decimals.
pub fn amount_cell(value: f64) -> Cell {
    Cell::new(format!("{value:.2}")).set_alignment(CellAlignment::Right)
}

/// Creates a cell for displaying percentage change with color coding.
pub fn change_cell(change: f64) -> Cell {
    let text = format!("{change:.2}%");
    if change >= 0.0 {
        Cell::new(text)
            .fg(Color::Green)
            .set_alignment(CellAlignment::Right)
    } else {
        Cell::new(text)
            .fg(Color::Red)
            .set_alignment(CellAlignment::Right)
    }
}

/// `$64,250.5` style: thousands separators, trailing zeros trimmed, at most
/// three decimals.
pub fn format_dollars(value: f64) -> String {
    let formatted = format!("{:.3}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let frac = frac_part.trim_end_matches('0');
    let sign = if value < 0.0 { "-" } else { "" };
    if frac.is_empty() {
        format!("{sign}${grouped}")
    } else {
        format!("{sign}${grouped}.{frac}")
    }
}

/// Bar for a task measured in percent; `{pos}` is the rounded percentage.
pub fn new_percent_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    if let Ok(bar_style) =
        ProgressStyle::default_bar().template("[{bar:40.cyan/blue}] {pos}% Completed {msg}")
    {
        pb.set_style(bar_style.progress_chars("#>-"));
    }
    pb.set_message(message.to_string());
    pb
}

/// `50% Completed` style caption matching the bar's template.
pub fn percent_caption(percent: f64) -> String {
    format!("{}% Completed", percent.clamp(0.0, 100.0).round())
}

/// Spinner shown while the first fetch of a screen is in flight.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Prints a separator line matching the terminal width.
pub fn print_separator() {
    let term_width = console::Term::stdout()
        .size_checked()
        .map(|(_, w)| w as usize)
        .unwrap_or(80);
    println!("\n{}", "─".repeat(term_width));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_dollars() {
        assert_eq!(format_dollars(64250.5), "$64,250.5");
        assert_eq!(format_dollars(1234567.0), "$1,234,567");
        assert_eq!(format_dollars(999.0), "$999");
        assert_eq!(format_dollars(0.4512), "$0.451");
        assert_eq!(format_dollars(-1000.0), "-$1,000");
    }

    #[test]
    fn test_percent_bar() {
        let pb = new_percent_bar("Hong Kong Port");
        assert_eq!(pb.length(), Some(100));
        pb.set_position(50);
        assert_eq!(pb.position(), 50);
        assert_eq!(pb.message(), "Hong Kong Port");
        pb.finish_and_clear();
    }

    #[test]
    fn test_percent_caption() {
        assert_eq!(percent_caption(0.0), "0% Completed");
        assert_eq!(percent_caption(37.5), "38% Completed");
        assert_eq!(percent_caption(100.0), "100% Completed");
    }
}
