//! Naming rules for timelapse folders, inputs, and jobs.

use crate::types::Timestamp;

/// Width of the zero-padded ordinal prefix on ranked input names.
pub const ORDINAL_WIDTH: usize = 5;

/// Name of the child folder that receives input images.
pub const INPUT_FOLDER_NAME: &str = "_input";

/// Name of the child folder that receives job outputs.
pub const OUTPUT_FOLDER_NAME: &str = "_output";

/// Zero-padded ordinal prefix including the separator, e.g. `00007_`.
///
/// Indices wider than [`ORDINAL_WIDTH`] digits are written in full.
pub fn ordinal_prefix(index: u64) -> String {
    format!("{index:0width$}_", width = ORDINAL_WIDTH)
}

/// Prefix `name` with its zero-padded ordinal, e.g. `00007_scan.png`.
pub fn ordinal_name(index: u64, name: &str) -> String {
    format!("{}{name}", ordinal_prefix(index))
}

/// Default name for a timelapse created without one.
pub fn default_timelapse_name(now: Timestamp) -> String {
    format!("Timelapse {}", now.format("%Y-%m-%d %H:%M:%S%.6f"))
}

/// Title shown for the engine job processing `folder_name`.
pub fn job_title(folder_name: &str) -> String {
    format!("Timelapse creation: {folder_name}")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn ordinal_prefix_is_zero_padded() {
        assert_eq!(ordinal_name(7, "scan.png"), "00007_scan.png");
        assert_eq!(ordinal_name(0, "a.jpg"), "00000_a.jpg");
        assert_eq!(ordinal_name(12345, "b.jpg"), "12345_b.jpg");
    }

    #[test]
    fn ordinal_prefix_widens_past_five_digits() {
        assert_eq!(ordinal_name(123456, "c.jpg"), "123456_c.jpg");
        assert_eq!(ordinal_name(5_000_000_000, "d.jpg"), "5000000000_d.jpg");
    }

    #[test]
    fn default_name_includes_timestamp() {
        let now = chrono::Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(
            default_timelapse_name(now),
            "Timelapse 2024-03-09 14:05:00.000000"
        );
    }

    #[test]
    fn job_title_names_the_folder() {
        assert_eq!(job_title("Garden"), "Timelapse creation: Garden");
    }
}
