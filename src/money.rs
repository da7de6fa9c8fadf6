/// Round to cents
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn format_grouped_int(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    let mut grouped: String = out.chars().rev().collect();
    if negative {
        grouped.insert(0, '-');
    }
    grouped
}

/// Format a money amount with two decimal places and thousands separators
pub fn format_amount(value: f64, currency_symbol: &str) -> String {
    let cents = (value * 100.0).round() as i64;
    let whole = format_grouped_int((cents / 100).abs());
    let frac = (cents % 100).abs();
    let sign = if cents < 0 { "-" } else { "" };
    format!("{sign}{currency_symbol}{whole}.{frac:02}")
}
