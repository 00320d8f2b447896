use ratatui::style::Color;

// Colours used when painting a layout. Kept as small helpers so a host can
// swap the palette in one place.

pub const ACCENT_RGB: (u8, u8, u8) = (200, 100, 0);
pub const ACCENT_ALT_RGB: (u8, u8, u8) = (255, 165, 0);

pub fn rgb_to_color(rgb: (u8, u8, u8)) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Drop highlight.
pub fn accent() -> Color {
    rgb_to_color(ACCENT_RGB)
}

/// Splitter being dragged, selected item outline.
pub fn accent_alt() -> Color {
    rgb_to_color(ACCENT_ALT_RGB)
}

// Header
pub fn header_bg() -> Color {
    Color::DarkGray
}
pub fn tab_fg() -> Color {
    Color::White
}
pub fn tab_active_bg() -> Color {
    Color::Gray
}
pub fn tab_active_fg() -> Color {
    Color::Black
}
pub fn control_fg() -> Color {
    Color::White
}

// Splitters
pub fn splitter_fg() -> Color {
    Color::DarkGray
}
pub fn splitter_hover_fg() -> Color {
    Color::Gray
}

// Drag proxy
pub fn proxy_border() -> Color {
    accent_alt()
}
pub fn proxy_bg() -> Color {
    Color::Black
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accents_are_rgb() {
        assert_eq!(accent(), Color::Rgb(200, 100, 0));
        assert!(matches!(accent_alt(), Color::Rgb(255, 165, 0)));
    }
}
