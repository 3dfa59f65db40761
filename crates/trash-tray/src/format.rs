//! Human-readable text for menu labels, tooltip and notifications.

use trash_tray_core::TrashState;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with one decimal in 1024-based units.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Text of the disabled "Items" menu label.
pub fn items_label(state: &TrashState) -> String {
    format!("Items: {}", state.item_count)
}

/// Text of the disabled "Size" menu label.
pub fn size_label(state: &TrashState) -> String {
    format!("Size: {}", format_bytes(state.byte_size))
}

/// Tray tooltip for a snapshot.
pub fn tooltip(state: &TrashState) -> String {
    if state.is_empty {
        return "Trash is empty".to_string();
    }
    match state.item_count {
        0 => "Trash contains items".to_string(),
        1 => format!("Trash: 1 item, {}", format_bytes(state.byte_size)),
        n => format!("Trash: {n} items, {}", format_bytes(state.byte_size)),
    }
}
