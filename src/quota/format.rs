use crate::config::GIB;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable size with 1024-based units and at most one decimal
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 10.0).round() / 10.0;
    format!("{} {}", rounded, UNITS[unit])
}

/// Bytes to gibibytes, rounded to two decimals
pub fn bytes_to_gb(bytes: u64) -> f64 {
    ((bytes as f64 / GIB as f64) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIB;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(100 * MIB), "100 MB");
        assert_eq!(format_bytes(GIB + GIB / 4), "1.3 GB");
        assert_eq!(format_bytes(3 * 1024 * GIB), "3 TB");
    }

    #[test]
    fn test_bytes_to_gb() {
        assert_eq!(bytes_to_gb(0), 0.0);
        assert_eq!(bytes_to_gb(50 * GIB), 50.0);
        assert_eq!(bytes_to_gb(GIB / 2), 0.5);
        assert_eq!(bytes_to_gb((13.2 * GIB as f64) as u64), 13.2);
    }
}
