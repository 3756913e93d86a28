use chrono::NaiveDate;

/// Format a float as euros the es-ES way: `1234,56 €`, `12.345,67 €`.
/// Thousands are only grouped once the integer part reaches five digits.
pub fn euro(val: f64) -> String {
    let negative = val < 0.0 && (val * 100.0).round() != 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((&cents, "00"));

    let grouped = if int_part.len() >= 5 {
        let mut out = String::new();
        for (i, c) in int_part.chars().rev().enumerate() {
            if i > 0 && i % 3 == 0 {
                out.push('.');
            }
            out.push(c);
        }
        out.chars().rev().collect()
    } else {
        int_part.to_string()
    };

    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped},{dec_part} €")
}

/// Dates arrive as `DD/MM/YYYY`, `YYYY-MM-DD` or `DDMMYYYY`.
pub fn parse_fecha(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    ["%d/%m/%Y", "%Y-%m-%d", "%d%m%Y"]
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
}

/// Display form `DD/MM/YYYY`; unrecognised input is shown unchanged.
pub fn fecha(raw: &str) -> String {
    match parse_fecha(raw) {
        Some(d) if !raw.trim().chars().all(|c| c.is_ascii_digit()) => d.format("%d/%m/%Y").to_string(),
        _ => raw.to_string(),
    }
}
