use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use automine_core::logger::{COLOR_BLUE, COLOR_GRAY, COLOR_GREEN};
use automine_core::EngineState;

use crate::App;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = if app.log_visible {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(f.area())
    } else {
        Layout::default()
            .constraints([Constraint::Percentage(100)])
            .split(f.area())
    };

    draw_control_panel(f, app, chunks[0]);
    if app.log_visible && chunks.len() > 1 {
        draw_logs(f, app, chunks[1]);
    }
    if let Some(dialog) = &app.confirm {
        dialog.render(f);
    }
}

fn banner(state: EngineState) -> (&'static str, Color) {
    match state {
        EngineState::Idle => ("IDLE (d to find the game)", Color::DarkGray),
        EngineState::Detecting => ("SEARCHING...", Color::Yellow),
        EngineState::Ready => ("READY (s / F6 to start)", Color::Cyan),
        EngineState::Mining => ("MINING (s / F6 to stop, F8 emergency)", Color::Green),
        EngineState::Paused => ("PAUSED (p to resume)", Color::Yellow),
        EngineState::Error => ("ERROR (d to retry)", Color::Red),
    }
}

fn key(k: &str) -> Span<'_> {
    Span::styled(k, Style::default().fg(Color::Yellow))
}

fn heading(text: &str) -> Line<'_> {
    Line::from(Span::styled(text, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)))
}

fn draw_control_panel(f: &mut Frame, app: &App, area: Rect) {
    let (label, bg) = banner(app.state);
    let cfg = &app.settings.config;
    let dim = Style::default().fg(Color::DarkGray);
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(format!(" {}", app.status), Style::default().fg(bg))));
    lines.push(Line::from(""));

    let window = match app.engine.window_title() {
        Some(title) => Span::styled(title, Style::default().fg(Color::Yellow)),
        None => Span::styled("not found", Style::default().fg(Color::Red)),
    };
    lines.push(Line::from(vec![Span::raw(" Window   "), window]));

    let profile = app.engine.material_profile();
    let swatch = Color::Rgb(profile.reference.r, profile.reference.g, profile.reference.b);
    let material = if app.engine.is_calibrated() { "calibrated" } else { "default (obsidian)" };
    lines.push(Line::from(vec![
        Span::raw(" Material "),
        Span::styled("██", Style::default().fg(swatch)),
        Span::raw(format!(
            " {},{},{} ±{} ",
            profile.reference.r, profile.reference.g, profile.reference.b, profile.tolerance
        )),
        Span::styled(material, dim),
    ]));

    let progress = match app.expected_blocks() {
        Some(total) => format!("{} / {}", app.progress, total),
        None => app.progress.to_string(),
    };
    lines.push(Line::from(vec![
        Span::raw(" Blocks   "),
        Span::styled(progress, Style::default().fg(Color::Cyan)),
    ]));
    lines.push(Line::from(""));

    lines.push(heading(" Settings"));
    lines.push(Line::from(Span::styled(format!(" {}", cfg.pattern.description()), dim)));
    let locked = app.state.is_active();
    for (i, field) in app.fields().iter().enumerate() {
        let selected = i == app.selected;
        let prefix = if selected { " > " } else { "   " };
        let value_style = if locked {
            dim
        } else if selected {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::Cyan)
        };
        lines.push(Line::from(vec![
            Span::raw(prefix),
            Span::raw(format!("{:<18}", field.label())),
            Span::styled(format!(" {} ", field.value(cfg)), value_style),
        ]));
    }
    lines.push(Line::from(""));

    let quick: Vec<_> = app.settings.quick_commands.iter().filter(|c| c.enabled).take(9).collect();
    if !quick.is_empty() {
        lines.push(heading(" Quick commands"));
        for (i, cmd) in quick.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::raw("   "),
                Span::styled((i + 1).to_string(), Style::default().fg(Color::Yellow)),
                Span::raw(format!("  {:<10}", cmd.name)),
                Span::styled(cmd.command.clone(), dim),
            ]));
        }
        lines.push(Line::from(""));
    }

    lines.push(Line::from(vec![
        Span::raw(" "),
        key("d"),
        Span::raw(" find  "),
        key("c"),
        Span::raw(" calibrate  "),
        key("s"),
        Span::raw(" start/stop  "),
        key("p"),
        Span::raw(" pause  "),
        key("x"),
        Span::raw(" emergency"),
    ]));
    lines.push(Line::from(vec![
        Span::raw(" "),
        key("tab"),
        Span::raw(" pattern  "),
        key("j/k"),
        Span::raw(" select  "),
        key("←/→"),
        Span::raw(" change  "),
        key("l"),
        Span::raw(" log  "),
        key("q"),
        Span::raw(" quit"),
    ]));

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    let width = rows[0].width as usize;
    let pad_total = width.saturating_sub(label.chars().count());
    let pad_left = pad_total / 2;
    let centered = format!("{}{}{}", " ".repeat(pad_left), label, " ".repeat(pad_total - pad_left));
    let banner = Paragraph::new(Line::from(Span::styled(
        centered,
        Style::default().fg(Color::Black).bg(bg).add_modifier(Modifier::BOLD),
    )));
    f.render_widget(banner, rows[0]);

    let body = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::LEFT | Borders::RIGHT | Borders::BOTTOM)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(body, rows[1]);
}

fn draw_logs(f: &mut Frame, app: &App, area: Rect) {
    let visible_height = area.height.saturating_sub(2) as usize;
    let total = app.log_messages.len();
    let scroll = app.log_scroll.min(total.saturating_sub(visible_height));
    let start = total.saturating_sub(visible_height + scroll);
    let end = total.saturating_sub(scroll);
    let log_lines: Vec<Line> = app.log_messages[start..end].iter().map(|m| parse_log_line(m)).collect();

    let title = if scroll > 0 { format!(" Logs (+{}) ", scroll) } else { " Logs ".to_string() };
    let panel = Paragraph::new(log_lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(panel, area);
}

/// Turn a logger UI line (level\x1fprefix\x1fcolor\x1ftimestamp\x1fmessage)
/// into a colored Line. Anything else is shown as is.
fn parse_log_line(raw: &str) -> Line<'_> {
    let parts: Vec<&str> = raw.splitn(5, '\x1f').collect();
    let [level, prefix, color, timestamp, message] = parts[..] else {
        return Line::from(raw);
    };

    let line_color = match color.parse::<u8>().unwrap_or(0) {
        COLOR_GRAY => Color::DarkGray,
        COLOR_BLUE => Color::LightBlue,
        COLOR_GREEN => Color::Green,
        _ => Color::White,
    };

    let mut spans = vec![
        Span::styled(timestamp, Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
    ];
    match level {
        "ERROR" => spans.push(Span::styled("error ", Style::default().fg(Color::Red))),
        "WARN" => spans.push(Span::styled("warn ", Style::default().fg(Color::Yellow))),
        _ => {}
    }
    if !prefix.is_empty() {
        spans.push(Span::styled(prefix, Style::default().fg(line_color).add_modifier(Modifier::BOLD)));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(message, Style::default().fg(line_color)));
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_structured_line() {
        let line = parse_log_line("WARN\x1fengine\x1f3\x1f12:00:01\x1fEMERGENCY STOP!");
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "12:00:01 warn engine EMERGENCY STOP!");
        assert_eq!(line.spans.last().unwrap().style.fg, Some(Color::Green));
    }

    #[test]
    fn test_parse_plain_line() {
        let line = parse_log_line("hello");
        assert_eq!(line.spans.len(), 1);
    }
}
