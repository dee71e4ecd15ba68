//! Decorative landing background: a twinkling star field and the title.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// Roughly one cell in this many holds a star
const STAR_DENSITY: u64 = 37;

pub struct Landing<'a> {
    pub title: &'a str,
    pub tick: u64,
}

impl Widget for Landing<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                let seed = cell_hash(x, y);
                if seed % STAR_DENSITY != 0 {
                    continue;
                }
                let (symbol, color) = star(seed, self.tick);
                buf.get_mut(x, y).set_symbol(symbol).set_fg(color);
            }
        }

        render_title(self.title, self.tick, area, buf);
    }
}

/// Stable per-cell pseudo-random value
fn cell_hash(x: u16, y: u16) -> u64 {
    let mut h = (x as u64) << 32 | y as u64;
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^ (h >> 33)
}

fn star(seed: u64, tick: u64) -> (&'static str, Color) {
    // Each star twinkles on its own phase
    let phase = (tick + seed % 97) % 40;
    match (seed / STAR_DENSITY % 3, phase) {
        (_, 0..=2) => ("✦", Color::White),
        (0, _) => ("·", Color::DarkGray),
        (1, _) => ("⋅", Color::Magenta),
        _ => ("˙", Color::Blue),
    }
}

fn render_title(title: &str, tick: u64, area: Rect, buf: &mut Buffer) {
    if area.height < 4 {
        return;
    }

    let spaced: String = title
        .chars()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    let width = spaced.chars().count() as u16;
    if width > area.width {
        return;
    }

    let x = area.x + (area.width - width) / 2;
    let y = area.y + area.height / 2 - 1;

    // Glow pulses between two shades
    let glow = if (tick / 20) % 2 == 0 {
        Color::Magenta
    } else {
        Color::LightMagenta
    };

    let rule = "─".repeat(width as usize);
    buf.set_line(x, y - 1, &Line::from(Span::styled(rule.clone(), Style::default().fg(Color::DarkGray))), width);
    buf.set_line(
        x,
        y,
        &Line::from(Span::styled(
            spaced,
            Style::default().fg(glow).add_modifier(Modifier::BOLD),
        )),
        width,
    );
    buf.set_line(x, y + 1, &Line::from(Span::styled(rule, Style::default().fg(Color::DarkGray))), width);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_centered() {
        let area = Rect::new(0, 0, 40, 9);
        let mut buf = Buffer::empty(area);
        Landing { title: "iFLUX", tick: 0 }.render(area, &mut buf);

        let row: String = (0..40).map(|x| buf.get(x, 3).symbol().to_string()).collect();
        assert!(row.contains("i F L U X"));
    }

    #[test]
    fn tiny_areas_do_not_panic() {
        for (w, h) in [(0, 0), (1, 1), (3, 2), (5, 3)] {
            let area = Rect::new(0, 0, w, h);
            let mut buf = Buffer::empty(area);
            Landing { title: "iFLUXONE", tick: 7 }.render(area, &mut buf);
        }
    }
}
