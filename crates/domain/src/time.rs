//! Time values: wall-clock time of day, zoned timestamps and duration helpers.

mod duration;
mod time_of_day;
mod zoned;

pub use duration::{from_seconds, parse_duration};
pub use time_of_day::TimeOfDay;
pub use zoned::ZonedDateTime;

pub use chrono::TimeDelta;

/// Split a strict `HH:MM` or `HH:MM:SS` clock string into its fields.
///
/// Every field must be exactly two ASCII digits. Ranges are not checked here.
fn split_clock(input: &str) -> Option<(u32, u32, u32)> {
    let mut fields = [0_u32; 3];
    let mut count = 0;
    for part in input.split(':') {
        if count == 3 || part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        fields[count] = part.parse().ok()?;
        count += 1;
    }
    if count < 2 {
        return None;
    }
    Some((fields[0], fields[1], fields[2]))
}
