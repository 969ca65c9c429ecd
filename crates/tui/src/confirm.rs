use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

const WIDTH: u16 = 44;
const HEIGHT: u16 = 7;

/// Yes/No modal. Starts on No so a stray Enter never confirms.
pub struct ConfirmDialog {
    pub message: String,
    pub yes: bool,
}

impl ConfirmDialog {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), yes: false }
    }

    pub fn toggle(&mut self) {
        self.yes = !self.yes;
    }

    pub fn render(&self, f: &mut Frame) {
        let area = centered_rect(WIDTH, HEIGHT, f.area());
        f.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Confirm ");
        let inner = block.inner(area);
        f.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1), // message
                Constraint::Length(1),
                Constraint::Length(1), // buttons
            ])
            .split(inner);

        let msg = Paragraph::new(Line::from(Span::styled(self.message.as_str(), Style::default().fg(Color::White))))
            .alignment(Alignment::Center);
        f.render_widget(msg, rows[1]);

        let buttons = Line::from(vec![
            Span::styled("  [Yes]  ", button_style(self.yes, Color::Green)),
            Span::raw("   "),
            Span::styled("  [No]  ", button_style(!self.yes, Color::Red)),
        ]);
        f.render_widget(Paragraph::new(buttons).alignment(Alignment::Center), rows[3]);
    }
}

fn button_style(active: bool, bg: Color) -> Style {
    if active {
        Style::default().fg(Color::Black).bg(bg).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

/// A `width` x `height` rect centered in `area`, shrunk to fit.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
