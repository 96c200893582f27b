//! Numeric point extraction from the free-text `Points` column

/// Parse a free-text points cell into a point value.
///
/// Every ASCII digit in the text is concatenated in order and the result is
/// parsed, so `"5 per member"` yields 5. Missing, empty, or digit-free text
/// yields 0; rule tables carry descriptive-only rows and those score nothing.
///
/// Known limitation: text holding several numbers is read as one, so
/// `"1 per 2 members"` yields 12.
pub fn extract_points(raw: Option<&str>) -> u64 {
    let Some(raw) = raw else {
        return 0;
    };

    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return 0;
    }

    match digits.parse::<u64>() {
        Ok(points) => points,
        Err(e) => {
            tracing::warn!(raw, error = %e, "Points value out of range, treating as 0");
            0
        }
    }
}
