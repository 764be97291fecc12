//! Drive capacity figures.

use std::fmt;

use serde::Deserialize;

/// Storage quota of a drive, in bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Quota {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub used: u64,
    #[serde(default)]
    pub remaining: u64,
    /// Bytes held by the recycle bin.
    #[serde(default)]
    pub deleted: u64,
}

impl Quota {
    /// Get usage percentage.
    pub fn usage_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.used as f64 / self.total as f64) * 100.0
        }
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Total:     {}", format_bytes(self.total))?;
        writeln!(
            f,
            "  Used:      {} ({:.2}%)",
            format_bytes(self.used),
            self.usage_percent()
        )?;
        writeln!(f, "  Remaining: {}", format_bytes(self.remaining))?;
        write!(f, "  Deleted:   {}", format_bytes(self.deleted))
    }
}

/// Format a byte count in binary units: `"512 B"`, `"1.500 KiB"`, ...
pub fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    const PREFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

    if bytes < UNIT {
        return format!("{} B", bytes);
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!("{:.3} {}iB", bytes as f64 / div as f64, PREFIXES[exp])
}
