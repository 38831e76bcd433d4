//! "MM:SS" timestamp text, the format video platforms expect in chapter
//! listings. Minutes are unbounded rather than clamped to 59, so a
//! 90-minute mark renders as "90:00".

use crate::error::{Error, Result};

/// Render a seconds count as zero-padded "MM:SS".
pub fn format_mmss(total_seconds: u64) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Parse "MM:SS" back into seconds. Fails unless the text splits into
/// exactly two integer colon-separated parts.
pub fn parse_mmss(text: &str) -> Result<u64> {
    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() != 2 {
        return Err(Error::Format {
            text: text.to_string(),
        });
    }

    let minutes: u64 = parts[0].parse().map_err(|_| Error::Format {
        text: text.to_string(),
    })?;
    let seconds: u64 = parts[1].parse().map_err(|_| Error::Format {
        text: text.to_string(),
    })?;

    Ok(minutes * 60 + seconds)
}
