use rust_decimal::{Decimal, RoundingStrategy};

/// Formats an amount as Brazilian reais: `R$ 1.234,50`.
///
/// The separators are fixed and never depend on the host locale.
pub fn format_brl(amount: Decimal) -> String {
    let fixed = fixed_point(amount, 2, RoundingStrategy::MidpointAwayFromZero);
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (integer, fraction) = digits.split_once('.').unwrap_or((digits, "00"));

    format!("R$ {sign}{},{fraction}", group_thousands(integer))
}

/// Renders `value` with exactly `places` decimals, using `.` as the decimal point.
pub fn fixed_point(value: Decimal, places: u32, strategy: RoundingStrategy) -> String {
    let mut rounded = value.round_dp_with_strategy(places, strategy);
    rounded.rescale(places);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.to_string()
}

/// Rounds half-to-even to a whole number.
pub fn whole(value: Decimal) -> String {
    fixed_point(value, 0, RoundingStrategy::MidpointNearestEven)
}

fn group_thousands(integer: &str) -> String {
    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use rust_decimal::{Decimal, RoundingStrategy};

    use super::{fixed_point, format_brl, whole};

    fn dec(value: &str) -> Decimal {
        value.parse().expect("valid decimal literal")
    }

    #[test]
    fn formats_with_brazilian_separators() {
        assert_eq!(format_brl(dec("1234.5")), "R$ 1.234,50");
        assert_eq!(format_brl(dec("5000")), "R$ 5.000,00");
        assert_eq!(format_brl(dec("2047.5")), "R$ 2.047,50");
        assert_eq!(format_brl(dec("1234567.891")), "R$ 1.234.567,89");
    }

    #[test]
    fn small_amounts_have_no_group_separator() {
        assert_eq!(format_brl(Decimal::ZERO), "R$ 0,00");
        assert_eq!(format_brl(dec("150")), "R$ 150,00");
        assert_eq!(format_brl(dec("999.999")), "R$ 1.000,00");
    }

    #[test]
    fn negative_amounts_keep_sign_after_prefix() {
        assert_eq!(format_brl(dec("-1234.5")), "R$ -1.234,50");
        assert_eq!(format_brl(dec("-0.001")), "R$ 0,00");
    }

    #[test]
    fn fixed_point_pads_and_rounds() {
        assert_eq!(fixed_point(dec("1.1"), 2, RoundingStrategy::MidpointAwayFromZero), "1.10");
        assert_eq!(fixed_point(dec("1.5125"), 3, RoundingStrategy::MidpointAwayFromZero), "1.513");
        assert_eq!(whole(dec("52.5")), "52");
        assert_eq!(whole(dec("53.5")), "54");
        assert_eq!(whole(dec("20.00")), "20");
    }
}
