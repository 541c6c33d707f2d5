use rust_decimal::{Decimal, RoundingStrategy};

/// `$1,234.5000` style: four decimals and comma thousands separators.
pub fn money(value: Decimal) -> String {
    format!("${}", fixed(value, 4))
}

pub fn fixed(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    group(&format!("{:.*}", decimals as usize, rounded))
}

/// Thousands-separated with no forced decimals, for volumes.
pub fn count(value: Decimal) -> String {
    group(&value.normalize().to_string())
}

fn group(plain: &str) -> String {
    let (sign, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (index, digit) in int_part.chars().enumerate() {
        if index > 0 && (int_part.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}
