//! Output formatting for CLI operations.

use chunkzip::{DosDateTime, Entry, EntryDescriptor, TestResult};

/// Formats a list of entries.
pub fn format_list(entries: &[Entry], technical: bool) -> String {
    let mut output = String::new();

    if technical {
        output.push_str(&format!(
            "{:>12} {:>12} {:>19} {:>10} {:>8} {}\n",
            "Size", "Packed", "Modified", "CRC", "Method", "Name"
        ));
    } else {
        output.push_str(&format!("{:>12} {:>19} {}\n", "Size", "Modified", "Name"));
    }
    output.push_str(&"-".repeat(70));
    output.push('\n');

    let mut total_size: u64 = 0;
    let mut total_packed: u64 = 0;

    for entry in entries {
        total_size += entry.size;
        total_packed += entry.compressed_size;
        let zip64 = if entry.is_zip64 { " [zip64]" } else { "" };

        if technical {
            let method = entry
                .method()
                .map(|m| m.name().to_string())
                .unwrap_or_else(|_| format!("#{}", entry.method_id));
            output.push_str(&format!(
                "{:>12} {:>12} {:>19} {:>10} {:>8} {}{}\n",
                humanize_bytes(entry.size),
                humanize_bytes(entry.compressed_size),
                format_timestamp(entry.modified),
                format!("{:08X}", entry.crc32),
                method,
                entry.name,
                zip64
            ));
        } else {
            output.push_str(&format!(
                "{:>12} {:>19} {}{}\n",
                humanize_bytes(entry.size),
                format_timestamp(entry.modified),
                entry.name,
                zip64
            ));
        }
    }

    output.push_str(&"-".repeat(70));
    output.push('\n');
    output.push_str(&format!(
        "{} files, {} total, {} packed\n",
        entries.len(),
        humanize_bytes(total_size),
        humanize_bytes(total_packed)
    ));

    output
}

/// Formats the result of adding a file.
pub fn format_add_result(entry: &EntryDescriptor) -> String {
    let ratio = if entry.uncompressed_size == 0 {
        100.0
    } else {
        entry.compressed_size as f64 / entry.uncompressed_size as f64 * 100.0
    };
    format!(
        "Added {} ({}): {} -> {} ({:.1}%)\n",
        entry.filename,
        entry.method,
        humanize_bytes(entry.uncompressed_size),
        humanize_bytes(entry.compressed_size),
        ratio
    )
}

/// Formats test results.
pub fn format_test_result(result: &TestResult) -> String {
    let mut output = String::new();

    if result.is_ok() {
        output.push_str(&format!(
            "OK - {} files tested, all passed\n",
            result.entries_tested
        ));
    } else {
        output.push_str("Test completed with errors:\n");
        output.push_str(&format!("  Tested: {}\n", result.entries_tested));
        output.push_str(&format!("  Passed: {}\n", result.entries_passed));
        output.push_str(&format!("  Failed: {}\n", result.entries_failed));

        if !result.failures.is_empty() {
            output.push_str("\nFailures:\n");
            for (path, error) in &result.failures {
                output.push_str(&format!("  {}: {}\n", path, error));
            }
        }
    }

    output
}

/// Converts bytes to a human-readable string
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

/// Formats a DOS timestamp as a datetime string.
pub fn format_timestamp(time: DosDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        time.year(),
        time.month(),
        time.day(),
        time.hour(),
        time.minute(),
        time.second()
    )
}
