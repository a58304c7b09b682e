//! Output formatting for CLI operations.

use std::path::Path;

/// Formats a byte count with a binary unit suffix
pub fn humanize_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.1} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// One row of the volume table printed by `info`.
pub struct VolumeRow<'a> {
    pub number: u32,
    pub path: &'a Path,
    pub offset: u64,
    pub size: u64,
}

/// Formats the volume layout of a split stream
pub fn format_volume_table(rows: &[VolumeRow<'_>], total: u64) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:>6} {:>14} {:>12}  {}\n",
        "Volume", "Offset", "Size", "Path"
    ));
    output.push_str(&"-".repeat(70));
    output.push('\n');

    for row in rows {
        output.push_str(&format!(
            "{:>6} {:>14} {:>12}  {}\n",
            row.number,
            row.offset,
            humanize_bytes(row.size),
            row.path.display()
        ));
    }

    output.push_str(&"-".repeat(70));
    output.push('\n');
    output.push_str(&format!(
        "{} volume(s), {} ({} bytes)\n",
        rows.len(),
        humanize_bytes(total),
        total
    ));
    output
}
