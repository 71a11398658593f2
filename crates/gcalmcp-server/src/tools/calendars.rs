//! Calendar-level tools: calendar list, color palette and free/busy.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use gcalmcp_google::{
    AuthorizedClient, CalendarListEntry, CalendarService, ColorDefinition, FreeBusyResponse,
};

use super::ToolOutput;
use crate::args::FreeBusyArgs;

pub(super) fn list_calendars_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

pub(super) fn list_colors_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

pub(super) fn free_busy_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "timeMin": {"type": "string", "format": "date-time"},
            "timeMax": {"type": "string", "format": "date-time"},
            "timeZone": {"type": "string"},
            "items": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "properties": {"id": {"type": "string"}},
                    "required": ["id"]
                }
            }
        },
        "required": ["timeMin", "timeMax", "items"]
    })
}

pub(super) async fn list_calendars(client: &dyn AuthorizedClient) -> ToolOutput {
    let calendars = CalendarService::new(client).list_calendars().await?;
    Ok(render_calendars(&calendars))
}

pub(super) async fn list_colors(client: &dyn AuthorizedClient) -> ToolOutput {
    let palette = CalendarService::new(client).list_colors().await?;
    Ok(format!(
        "Available event colors:\n{}",
        render_colors(&palette.event)
    ))
}

pub(super) async fn free_busy(client: &dyn AuthorizedClient, arguments: &Map<String, Value>) -> ToolOutput {
    let args = FreeBusyArgs::parse(arguments)?;
    let response = CalendarService::new(client).free_busy(&args.request).await?;
    Ok(render_free_busy(&response))
}

fn render_calendars(calendars: &[CalendarListEntry]) -> String {
    if calendars.is_empty() {
        return "No calendars found.".to_string();
    }
    calendars
        .iter()
        .map(|c| format!("{} ({})", c.display_name(), c.id))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Color ids are numeric strings; list them in numeric order.
fn render_colors(colors: &BTreeMap<String, ColorDefinition>) -> String {
    let mut entries: Vec<(&String, &ColorDefinition)> = colors.iter().collect();
    entries.sort_by(|(a, _), (b, _)| {
        let numeric = |id: &str| id.parse::<u32>().unwrap_or(u32::MAX);
        numeric(a).cmp(&numeric(b)).then_with(|| a.cmp(b))
    });
    entries
        .into_iter()
        .map(|(id, color)| {
            format!(
                "Color ID: {} - background {}, foreground {}",
                id, color.background, color.foreground
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_free_busy(response: &FreeBusyResponse) -> String {
    let mut sections = Vec::new();
    for (calendar_id, calendar) in &response.calendars {
        let mut lines = vec![format!("{}:", calendar_id)];
        if !calendar.errors.is_empty() {
            for error in &calendar.errors {
                lines.push(format!("  Error: {}", error.reason));
            }
        } else if calendar.busy.is_empty() {
            lines.push("  Available for the entire period".to_string());
        } else {
            for period in &calendar.busy {
                lines.push(format!("  Busy: {} to {}", period.start, period.end));
            }
        }
        sections.push(lines.join("\n"));
    }

    if sections.is_empty() {
        return "No free/busy information returned.".to_string();
    }
    format!("Free/busy information:\n\n{}", sections.join("\n\n"))
}
