//! Status-line formatting helpers.

/// Width of the rating and purity gauges in display cells.
pub const GAUGE_WIDTH: usize = 5;

/// Renders a signed score as a fixed-width symbol gauge.
///
/// Positive values fill from the left, negative values mark with `-`, and
/// values past the gauge width end in `+` so the column never widens.
#[must_use]
pub fn gauge(value: i32, filled: char, empty: char) -> String {
    let magnitude = value.unsigned_abs() as usize;
    let mark = if value < 0 { '-' } else { filled };

    let mut out = String::with_capacity(GAUGE_WIDTH * 4);
    for _ in 0..magnitude.min(GAUGE_WIDTH) {
        out.push(mark);
    }
    for _ in magnitude.min(GAUGE_WIDTH)..GAUGE_WIDTH {
        out.push(empty);
    }
    if magnitude > GAUGE_WIDTH {
        out.pop();
        out.push('+');
    }
    out
}

/// A wallpaper rating as stars.
#[must_use]
pub fn rating_gauge(rating: i32) -> String {
    gauge(rating, '★', '☆')
}

/// A purity score as hearts.
#[must_use]
pub fn purity_gauge(purity: i32) -> String {
    gauge(purity, '♥', '♡')
}

/// Crops or pads `text` to exactly `width` display cells, cropping from the
/// left so the filename end stays visible.
#[must_use]
pub fn fit_left(text: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let chars: Vec<char> = text.chars().collect();
    if chars.len() > width {
        let mut out = String::from("…");
        out.extend(&chars[chars.len() - width + 1..]);
        out
    } else {
        let mut out: String = chars.into_iter().collect();
        out.extend(std::iter::repeat_n(' ', width - text.chars().count()));
        out
    }
}

/// Formats the rotation interval for the header.
#[must_use]
pub fn interval_label(secs: f64) -> String {
    format!("{secs:.2}s")
}
