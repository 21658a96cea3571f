//! Output formatting helpers for CLI commands

use crate::api::LiveUpdate;
use crate::telemetry::{Overview, ServerView};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

/// Format server views as a table
pub fn format_servers_table(servers: &[ServerView]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "ID", "Name", "Region", "Status", "CPU", "Mem", "Disk", "Up", "Down", "Uptime",
    ]);

    for s in servers {
        let status_str = if s.online {
            "Online".green().to_string()
        } else {
            "Offline".red().to_string()
        };

        table.add_row(vec![
            Cell::new(s.id),
            Cell::new(&s.name),
            Cell::new(&s.country_code),
            Cell::new(status_str),
            Cell::new(format!("{:.1}%", s.cpu)),
            Cell::new(format!("{:.1}%", s.mem)),
            Cell::new(format!("{:.1}%", s.disk)),
            Cell::new(format!("{:.2} MiB/s", s.up)),
            Cell::new(format!("{:.2} MiB/s", s.down)),
            Cell::new(format_uptime(s.uptime)),
        ]);
    }

    table.to_string()
}

/// One-line fleet summary
pub fn format_overview(overview: &Overview) -> String {
    let online = format!("{} online", overview.online).green();
    let offline = if overview.offline > 0 {
        format!("{} offline", overview.offline).red()
    } else {
        format!("{} offline", overview.offline).normal()
    };
    format!(
        "{} servers: {}, {} | up {:.2} MiB/s, down {:.2} MiB/s",
        overview.total, online, offline, overview.up, overview.down
    )
}

/// Format an update as JSON
pub fn format_update_json(update: &LiveUpdate) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(update)
}

/// `3d 4h`, `5h 12m` or `42m`
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    match (days, hours) {
        (0, 0) => format!("{}m", minutes),
        (0, h) => format!("{}h {}m", h, minutes),
        (d, h) => format!("{}d {}h", d, h),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::decode_frame;

    fn update() -> LiveUpdate {
        let snapshot = decode_frame(
            r#"{"now":60000,"servers":[
                {"id":1,"name":"tokyo-1","country_code":"JP","last_active":"1970-01-01T00:00:50Z","state":{"uptime":90000}},
                {"id":2,"name":"berlin-1","country_code":"de"}
            ]}"#,
        )
        .unwrap();
        LiveUpdate::from(&snapshot)
    }

    #[test]
    fn test_format_servers_table_contains_rows() {
        colored::control::set_override(false);
        let output = format_servers_table(&update().snapshot.servers);
        assert!(output.contains("tokyo-1"));
        assert!(output.contains("berlin-1"));
        assert!(output.contains("Online"));
        assert!(output.contains("Offline"));
        assert!(output.contains("1d 1h"));
    }

    #[test]
    fn test_format_overview_counts() {
        colored::control::set_override(false);
        let line = format_overview(&update().overview);
        assert!(line.starts_with("2 servers: 1 online, 1 offline"));
    }

    #[test]
    fn test_format_update_json_is_valid() {
        let json = format_update_json(&update()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["servers"].as_array().unwrap().len(), 2);
        assert_eq!(value["overview"]["online"], 1);
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(59), "0m");
        assert_eq!(format_uptime(3_660), "1h 1m");
        assert_eq!(format_uptime(90_000), "1d 1h");
    }
}
