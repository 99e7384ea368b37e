//! Output helpers: fuzzy-relative timestamps, color mapping, and URL
//! trimming for "Opening … in your browser" lines.

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use comfy_table::Color;
use ghagent_core::ColorRole;

/// Human-friendly approximate age, e.g. "about 6 hours ago".
pub fn fuzzy_ago(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    let seconds = elapsed.num_seconds();

    if seconds < 60 {
        return "less than a minute ago".to_string();
    }

    let minutes = elapsed.num_minutes();
    if minutes < 60 {
        return format!("about {} {} ago", minutes, plural(minutes, "minute"));
    }

    let hours = elapsed.num_hours();
    if hours < 24 {
        return format!("about {} {} ago", hours, plural(hours, "hour"));
    }

    let days = elapsed.num_days();
    if days < 30 {
        return format!("about {} {} ago", days, plural(days, "day"));
    }

    let months = days / 30;
    if months < 12 {
        return format!("about {} {} ago", months, plural(months, "month"));
    }

    let years = days / 365;
    format!("about {} {} ago", years, plural(years, "year"))
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        unit.to_string()
    } else {
        format!("{unit}s")
    }
}

/// Apply a semantic color role with `colored`.
pub fn paint(role: ColorRole, text: &str) -> ColoredString {
    match role {
        ColorRole::Success => text.green(),
        ColorRole::Warning => text.yellow(),
        ColorRole::Error => text.red(),
        ColorRole::Muted => text.dimmed(),
    }
}

/// The same mapping for comfy-table cells.
pub fn table_color(role: ColorRole) -> Color {
    match role {
        ColorRole::Success => Color::Green,
        ColorRole::Warning => Color::Yellow,
        ColorRole::Error => Color::Red,
        ColorRole::Muted => Color::DarkGrey,
    }
}

/// Table color for a pull request's state, draft-aware.
pub fn pr_table_color(state: &str, is_draft: bool) -> Color {
    match state {
        "OPEN" if is_draft => Color::DarkGrey,
        "OPEN" => Color::Green,
        "CLOSED" => Color::Red,
        "MERGED" => Color::Magenta,
        _ => Color::DarkGrey,
    }
}

/// The same mapping for inline text.
pub fn paint_pr_state(state: &str, is_draft: bool, text: &str) -> ColoredString {
    match state {
        "OPEN" if is_draft => text.dimmed(),
        "OPEN" => text.green(),
        "CLOSED" => text.red(),
        "MERGED" => text.magenta(),
        _ => text.dimmed(),
    }
}

/// Trim the scheme for display, the way browsers elide it.
pub fn display_url(url: &str) -> &str {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
}
