//! Plain-text rendering of views for the terminal.

use pantry_core::Entity;
use pantry_infra::Receipt;
use pantry_inventory::{ListedItem, Recap, Registry, StockView};

/// One aligned line per listed item.
pub fn stock_lines(view: &StockView<'_>) -> Vec<String> {
    view.iter().map(stock_line).collect()
}

fn stock_line(row: &ListedItem<'_>) -> String {
    let item = row.item;
    format!(
        "#{:<4} {:<24} {:>4} {:<9} {:<16} {:<12} {:<12} [{}]",
        item.id(),
        item.name(),
        item.quantity(),
        item.unit(),
        item.category(),
        item.location(),
        item.container(),
        row.status.label()
    )
}

/// Location heading, one line per item, and the alert when something is due.
pub fn recap_lines(recap: &Recap<'_>) -> Vec<String> {
    let mut lines = vec![format!("{}:", recap.location())];
    if recap.is_empty() {
        lines.push("  (empty)".to_string());
        return lines;
    }
    lines.extend(recap.lines().iter().map(|line| format!("  {line}")));
    if let Some(alert) = recap.alert() {
        lines.push(format!("To eat soon: {alert}"));
    }
    lines
}

pub fn registry_lines(registry: &Registry) -> Vec<String> {
    registry.sorted().into_iter().map(str::to_string).collect()
}

/// Warnings for files that could not be pushed.
pub fn sync_warnings(receipt: &Receipt) -> Vec<String> {
    receipt
        .failures()
        .map(|(file, reason)| format!("warning: {file} saved locally but not synced: {reason}"))
        .collect()
}
