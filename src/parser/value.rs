/// Characters that introduce an alternative or derived value inside a cell.
const DIVIDERS: &[char] = &['=', '\\', '/'];

/// Parse a pt-BR formatted number ("1.234,5") into an `f64`.
///
/// Dots are thousands separators and are dropped, commas become the decimal
/// point. Only the text before the first divider counts. Anything that still
/// does not parse is `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let normalized = raw.replace('.', "").replace(',', ".");
    let first = match normalized.find(DIVIDERS) {
        Some(idx) => &normalized[..idx],
        None => normalized.as_str(),
    };
    first.trim().parse::<f64>().ok()
}

/// Cell value as stored in a record: unparseable text counts as zero.
pub fn normalize(raw: &str) -> f64 {
    parse_number(raw).unwrap_or(0.0)
}
