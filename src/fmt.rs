fn group_thousands(int_part: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// Whole-unit amount with thousands separators: ₹1,234,567
pub fn money(val: f64, symbol: &str) -> String {
    let rounded = format!("{:.0}", val.abs());
    let grouped = group_thousands(&rounded);
    if val < 0.0 && rounded != "0" {
        format!("-{symbol}{grouped}")
    } else {
        format!("{symbol}{grouped}")
    }
}

/// Like `money` but always carries a sign, for deltas: +₹1,200
pub fn signed_money(val: f64, symbol: &str) -> String {
    let body = money(val, symbol);
    if body.starts_with('-') {
        body
    } else {
        format!("+{body}")
    }
}

/// Fit a description into a table column.
pub fn wrap(text: &str, width: usize) -> String {
    textwrap::fill(text, width)
}
