//! Hardware vendor lookup by OUI prefix.
//!
//! The built-in table is deliberately small. Sites that want better coverage
//! point `oui_file` at a manuf-style file (Wireshark `manuf`, or the same
//! `PREFIX  Vendor` layout used below), which is layered over it.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use lansniff_core::{MacAddress, UNKNOWN};

use crate::error::{DiscoverError, Result};

/// Prefixes shipped with the tool. One line per prefix.
const BUILTIN_MANUF: &str = r#"
00:0C:29   VMware
00:1C:14   VMware
00:50:56   VMware
00:1B:AE   Nokia Danmark A/S
00:1C:4D   Dell
00:21:9B   Dell
00:24:E8   Samsung
00:11:75   Apple
00:14:51   Apple
00:17:F2   Apple
00:1B:63   Apple
00:1C:B3   Apple
00:1D:4F   Apple
00:1D:DB   Apple
00:1E:42   Apple
00:1E:C2   Apple
00:1F:5B   Apple
00:1F:F3   Apple
00:21:E9   Apple
00:22:41   Apple
00:23:12   Apple
00:23:1D   Apple
00:23:32   Apple
00:23:3F   Apple
00:23:6C   Apple
00:23:DF   Apple
00:24:36   Apple
00:24:F7   Apple
00:25:00   Apple
00:25:4B   Apple
00:25:BC   Apple
00:26:08   Apple
00:26:4A   Apple
00:26:B0   Apple
00:26:B6   Apple
00:26:BB   Apple
00:26:C6   Apple
00:00:0C   Cisco Systems, Inc
00:15:5D   Microsoft Corporation
B8:27:EB   Raspberry Pi Foundation
"#;

static BUILTIN: OnceLock<VendorTable> = OnceLock::new();

/// Immutable OUI → vendor map. Keys are `"AA:BB:CC"`.
#[derive(Debug, Clone, Default)]
pub struct VendorTable {
    entries: HashMap<String, String>,
}

impl VendorTable {
    /// Build a table from `(prefix, vendor)` pairs. When a prefix appears
    /// more than once, the later pair wins. Unparsable prefixes are skipped.
    pub fn from_entries<I, P, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, V)>,
        P: AsRef<str>,
        V: Into<String>,
    {
        let mut table = Self::default();
        table.extend(entries);
        table
    }

    /// The table shipped with the binary, built on first use.
    pub fn builtin() -> &'static VendorTable {
        BUILTIN.get_or_init(|| Self::from_entries(parse_manuf(BUILTIN_MANUF)))
    }

    /// Built-in entries overlaid with the contents of a manuf-style file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            DiscoverError::Config(format!("cannot read OUI file {}: {e}", path.display()))
        })?;

        let mut table = Self::builtin().clone();
        let before = table.len();
        table.extend(parse_manuf(&text));
        tracing::debug!(
            path = %path.display(),
            entries = table.len(),
            added = table.len().saturating_sub(before),
            "Vendor table loaded"
        );
        Ok(table)
    }

    pub fn lookup(&self, mac: &MacAddress) -> &str {
        self.entries
            .get(&mac.oui())
            .map(String::as_str)
            .unwrap_or(UNKNOWN)
    }

    /// Look up a prefix given as text, e.g. `"00:1c:b3"` or `"001CB3"`.
    pub fn lookup_prefix(&self, prefix: &str) -> &str {
        normalize_prefix(prefix)
            .and_then(|key| self.entries.get(&key))
            .map(String::as_str)
            .unwrap_or(UNKNOWN)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn extend<I, P, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (P, V)>,
        P: AsRef<str>,
        V: Into<String>,
    {
        for (prefix, vendor) in entries {
            if let Some(key) = normalize_prefix(prefix.as_ref()) {
                self.entries.insert(key, vendor.into());
            }
        }
    }
}

/// Parse manuf-style text: `PREFIX<whitespace>Vendor`, `#` starts a comment.
///
/// Wireshark's file has an optional third column with the long name; only the
/// short name is kept. Masked prefixes (`00:1B:C5:00:00:00/36`) are skipped.
pub fn parse_manuf(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            let line = line.split('#').next()?.trim();
            let (prefix, rest) = line.split_once(char::is_whitespace)?;
            if prefix.contains('/') {
                return None;
            }
            let vendor = rest.trim().split('\t').next()?.trim();
            if vendor.is_empty() {
                return None;
            }
            Some((prefix.to_string(), vendor.to_string()))
        })
        .collect()
}

/// `"00-1c-b3"`, `"00:1C:B3:11:22:33"` or `"001cb3"` → `"00:1C:B3"`.
fn normalize_prefix(raw: &str) -> Option<String> {
    let hex: String = raw
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | '.'))
        .take(6)
        .collect();
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let hex = hex.to_ascii_uppercase();
    Some(format!("{}:{}:{}", &hex[0..2], &hex[2..4], &hex[4..6]))
}
