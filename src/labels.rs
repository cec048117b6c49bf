/// Short relative-day token for a signed day count.
///
/// Future days read `D-n` and past days `D+n`.
pub fn d_day_label(days_remaining: i64) -> String {
    match days_remaining {
        0 => "오늘".to_string(),
        1 => "내일".to_string(),
        -1 => "어제".to_string(),
        n if n > 0 => format!("D-{}", n),
        n => format!("D+{}", n.unsigned_abs()),
    }
}

/// Splits a `#RRGGBB` swatch into its channels.
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_swatches() {
        assert_eq!(parse_hex_color("#E6F4EA"), Some((0xE6, 0xF4, 0xEA)));
        assert_eq!(parse_hex_color("E6F4EA"), None);
        assert_eq!(parse_hex_color("#fff"), None);
    }

    #[test]
    fn named_days() {
        assert_eq!(d_day_label(0), "오늘");
        assert_eq!(d_day_label(1), "내일");
        assert_eq!(d_day_label(-1), "어제");
    }

    #[test]
    fn future_counts_down_and_past_counts_up() {
        assert_eq!(d_day_label(26), "D-26");
        assert_eq!(d_day_label(2), "D-2");
        assert_eq!(d_day_label(-3), "D+3");
        assert_eq!(d_day_label(-25), "D+25");
    }
}
