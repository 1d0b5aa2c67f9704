//! Text rendering of scan results.

use std::fmt::Write;

use lansniff_core::ResolvedDevice;

use crate::config::ReportMode;

/// Printed instead of a table when nothing was found.
pub const NO_DEVICES: &str = "No devices found.";

const HOSTNAME_WIDTH: usize = 25;
const VENDOR_WIDTH: usize = 20;

/// Sort devices by numeric address, so `10.0.0.9` precedes `10.0.0.10`.
pub fn assemble(mut devices: Vec<ResolvedDevice>) -> Vec<ResolvedDevice> {
    devices.sort_by_key(|d| u32::from(d.address()));
    devices
}

pub fn render(devices: &[ResolvedDevice], mode: ReportMode) -> String {
    match mode {
        ReportMode::Summary => render_summary(devices),
        ReportMode::Detailed => render_detailed(devices),
    }
}

/// One fixed-width row per device.
pub fn render_summary(devices: &[ResolvedDevice]) -> String {
    if devices.is_empty() {
        return NO_DEVICES.to_string();
    }

    let rule = "-".repeat(85);
    let mut out = String::new();
    let _ = writeln!(out, "Found {}:", device_count(devices.len()));
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(
        out,
        "{}",
        row("IP Address", "MAC Address", "Hostname", "Vendor")
    );
    let _ = writeln!(out, "{rule}");

    for device in sorted(devices) {
        let line = row(
            &device.address().to_string(),
            &device.hardware_address().to_string(),
            &truncate(device.hostname(), HOSTNAME_WIDTH - 1),
            &truncate(device.vendor(), VENDOR_WIDTH - 1),
        );
        let _ = writeln!(out, "{line}");
    }

    out
}

/// One numbered block per device with every field at full length.
pub fn render_detailed(devices: &[ResolvedDevice]) -> String {
    if devices.is_empty() {
        return NO_DEVICES.to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Found {} (detailed):", device_count(devices.len()));
    let _ = writeln!(out, "{}", "=".repeat(100));

    for (i, device) in sorted(devices).iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Device {}:", i + 1);
        let _ = writeln!(out, "  IP Address:   {}", device.address());
        let _ = writeln!(out, "  MAC Address:  {}", device.hardware_address());
        let _ = writeln!(out, "  Hostname:     {}", device.hostname());
        let _ = writeln!(out, "  Vendor:       {}", device.vendor());
        let _ = writeln!(out, "  Resolved via: {}", device.strategy());
        let _ = writeln!(out, "{}", "-".repeat(50));
    }

    out
}

fn row(address: &str, mac: &str, hostname: &str, vendor: &str) -> String {
    let line = format!(
        "{address:<15} {mac:<20} {hostname:<w_host$} {vendor:<w_vendor$}",
        w_host = HOSTNAME_WIDTH,
        w_vendor = VENDOR_WIDTH
    );
    line.trim_end().to_string()
}

fn device_count(n: usize) -> String {
    match n {
        1 => "1 device".to_string(),
        n => format!("{n} devices"),
    }
}

fn sorted(devices: &[ResolvedDevice]) -> Vec<&ResolvedDevice> {
    let mut refs: Vec<&ResolvedDevice> = devices.iter().collect();
    refs.sort_by_key(|d| u32::from(d.address()));
    refs
}

/// Keep the first `max` characters, appending `...` only if something was cut.
fn truncate(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_string(),
    }
}
