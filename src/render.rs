//! Paints a layout into a ratatui buffer.
//!
//! Components render themselves through [`crate::items::Panel::render`];
//! everything else (tab strips, splitters, the drop highlight and the drag
//! proxy) is drawn here directly into buffer cells.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect as CellRect;
use ratatui::style::{Modifier, Style};

use crate::controls::{Header, HeaderControl, Splitter};
use crate::geometry::Rect;
use crate::items::{NodeId, Orientation};
use crate::manager::LayoutManager;
use crate::theme;

fn fill(buffer: &mut Buffer, area: CellRect, symbol: &str, style: Style) {
    let clip = area.intersection(buffer.area);
    for y in clip.y..clip.y.saturating_add(clip.height) {
        for x in clip.x..clip.x.saturating_add(clip.width) {
            if let Some(cell) = buffer.cell_mut((x, y)) {
                cell.reset();
                cell.set_symbol(symbol);
                cell.set_style(style);
            }
        }
    }
}

/// Writes `text` along the long axis of `area`, clipped to it.
fn put_text(buffer: &mut Buffer, area: CellRect, text: &str, vertical: bool, style: Style) {
    let clip = area.intersection(buffer.area);
    if clip.width == 0 || clip.height == 0 {
        return;
    }
    if !vertical {
        buffer.set_stringn(clip.x, clip.y, text, clip.width as usize, style);
        return;
    }
    for (offset, ch) in text.chars().take(clip.height as usize).enumerate() {
        if let Some(cell) = buffer.cell_mut((clip.x, clip.y + offset as u16)) {
            cell.set_char(ch);
            cell.set_style(style);
        }
    }
}

fn outline(buffer: &mut Buffer, area: CellRect, style: Style) {
    if area.width < 2 || area.height < 2 {
        fill(buffer, area, " ", style);
        return;
    }
    let right = area.x + area.width - 1;
    let bottom = area.y + area.height - 1;
    for x in area.x..=right {
        for (y, symbol) in [(area.y, "─"), (bottom, "─")] {
            if let Some(cell) = buffer.cell_mut((x, y)) {
                cell.set_symbol(symbol);
                cell.set_style(style);
            }
        }
    }
    for y in area.y..=bottom {
        for (x, symbol) in [(area.x, "│"), (right, "│")] {
            if let Some(cell) = buffer.cell_mut((x, y)) {
                cell.set_symbol(symbol);
                cell.set_style(style);
            }
        }
    }
    for (x, y, symbol) in [
        (area.x, area.y, "┌"),
        (right, area.y, "┐"),
        (area.x, bottom, "└"),
        (right, bottom, "┘"),
    ] {
        if let Some(cell) = buffer.cell_mut((x, y)) {
            cell.set_symbol(symbol);
            cell.set_style(style);
        }
    }
}

fn render_header(buffer: &mut Buffer, header: &Header, maximised: bool) {
    let strip = header.rect.to_cells();
    if !header.show || strip.width == 0 || strip.height == 0 {
        return;
    }
    let vertical = header.side.is_sided();
    fill(buffer, strip, " ", Style::default().bg(theme::header_bg()));

    for tab in &header.tabs {
        if tab.rect.is_empty() {
            continue;
        }
        let style = if tab.is_active {
            Style::default()
                .bg(theme::tab_active_bg())
                .fg(theme::tab_active_fg())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().bg(theme::header_bg()).fg(theme::tab_fg())
        };
        let area = tab.rect.to_cells();
        fill(buffer, area, " ", style);
        put_text(buffer, area, &tab.title, vertical, style);
        if let Some(close) = tab.close_rect {
            fill(buffer, close.to_cells(), "×", style);
        }
    }

    let style = Style::default()
        .bg(theme::header_bg())
        .fg(theme::control_fg());
    for (control, rect) in &header.controls {
        let symbol = match control {
            HeaderControl::Popout => "⧉",
            HeaderControl::Maximise if maximised => "▪",
            HeaderControl::Maximise => "□",
            HeaderControl::Close => "×",
        };
        fill(buffer, rect.to_cells(), symbol, style);
    }
}

fn render_splitter(buffer: &mut Buffer, splitter: &Splitter, hovered: bool, dragging: bool) {
    let area = splitter.displayed_rect().to_cells();
    if area.width == 0 || area.height == 0 {
        return;
    }
    let style = if dragging {
        Style::default()
            .fg(theme::accent_alt())
            .add_modifier(Modifier::BOLD)
    } else if hovered {
        Style::default()
            .fg(theme::splitter_hover_fg())
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .fg(theme::splitter_fg())
            .add_modifier(Modifier::DIM)
    };
    let symbol = match splitter.orientation {
        Orientation::Row => "│",
        Orientation::Column => "─",
    };
    fill(buffer, area, symbol, style);
}

impl LayoutManager {
    /// Draws the visible layout. `hover` is the cell under the pointer, used
    /// to highlight splitters.
    pub fn render(&mut self, buffer: &mut Buffer, hover: Option<(u16, u16)>) {
        let scope = self.maximised_item().unwrap_or_else(|| self.root());
        let mut ids = vec![scope];
        ids.extend(self.tree().get_items_by_filter(scope, |_| true));
        let hover_point = hover.map(|(x, y)| (x as f64 + 0.5, y as f64 + 0.5));

        for id in ids {
            if !self.tree().is_visible(id) {
                continue;
            }
            self.render_item(buffer, id, hover_point);
        }

        if let Some(proxy) = self.drag() {
            if let Some(highlight) = proxy.highlight()
                && proxy.area().is_some()
            {
                fill(
                    buffer,
                    highlight.to_cells(),
                    " ",
                    Style::default().bg(theme::accent()),
                );
            }
            let rect = proxy.rect().to_cells();
            let title = self
                .tree()
                .get(proxy.item())
                .map(|item| item.state.title.clone())
                .unwrap_or_default();
            fill(buffer, rect, " ", Style::default().bg(theme::proxy_bg()));
            outline(buffer, rect, Style::default().fg(theme::proxy_border()));
            let inner = CellRect {
                x: rect.x.saturating_add(1),
                y: rect.y,
                width: rect.width.saturating_sub(2),
                height: 1,
            };
            put_text(
                buffer,
                inner,
                &title,
                false,
                Style::default().fg(theme::proxy_border()),
            );
        }
    }

    fn render_item(&mut self, buffer: &mut Buffer, id: NodeId, hover: Option<(f64, f64)>) {
        let maximised = self.maximised_item() == Some(id);
        let Some(item) = self.tree_mut().get_mut(id) else {
            return;
        };
        let rect: Rect = item.rect();
        if let Some(stack) = item.as_stack() {
            render_header(buffer, &stack.header, maximised);
        } else if let Some(row) = item.as_row_or_column() {
            let dragging = row.drag().map(|drag| drag.index);
            for (index, splitter) in row.splitters.iter().enumerate() {
                let hovered = hover.is_some_and(|(x, y)| splitter.hit(x, y));
                render_splitter(buffer, splitter, hovered, dragging == Some(index));
            }
        } else if let Some(component) = item.as_component_mut() {
            let area = rect.to_cells().intersection(buffer.area);
            if area.width > 0 && area.height > 0 {
                component.render(buffer, area);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Dimensions, ItemConfig, LayoutConfig};
    use crate::items::{ComponentRegistry, ItemContainer, Panel};

    struct Letter(char);

    impl Panel for Letter {
        fn render(&mut self, buffer: &mut Buffer, area: CellRect, _container: &ItemContainer) {
            fill(buffer, area, &self.0.to_string(), Style::default());
        }
    }

    fn manager() -> LayoutManager {
        let config = LayoutConfig::new(vec![ItemConfig::row(vec![
            ItemConfig::component("a").with_title("alpha"),
            ItemConfig::component("b").with_title("beta"),
        ])])
        .with_dimensions(Dimensions::terminal());
        let mut registry = ComponentRegistry::default();
        registry.register("a", |_| Box::new(Letter('a')));
        registry.register("b", |_| Box::new(Letter('b')));
        let mut manager = LayoutManager::new(config, registry).unwrap();
        manager.init(Rect::new(0.0, 0.0, 41.0, 10.0)).unwrap();
        manager
    }

    fn row_text(buffer: &Buffer, y: u16) -> String {
        (0..buffer.area.width)
            .map(|x| buffer[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn panels_tabs_and_splitters_are_drawn() {
        let mut m = manager();
        let mut buffer = Buffer::empty(CellRect::new(0, 0, 41, 10));
        m.render(&mut buffer, None);

        assert!(row_text(&buffer, 0).starts_with("alpha"));
        let body = row_text(&buffer, 5);
        assert_eq!(&body[..20], "a".repeat(20));
        assert_eq!(buffer[(20, 5)].symbol(), "│");
        assert!(body.ends_with(&"b".repeat(20)));
    }

    #[test]
    fn maximised_items_cover_the_buffer() {
        let mut m = manager();
        let a = m.tree().get_components_by_name(m.root(), "a")[0];
        let stack = m.tree().parent(a).unwrap();
        m.toggle_maximise(stack).unwrap();
        let mut buffer = Buffer::empty(CellRect::new(0, 0, 41, 10));
        m.render(&mut buffer, None);
        assert_eq!(row_text(&buffer, 5), "a".repeat(41));
    }
}
