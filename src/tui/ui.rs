//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::cpu::Opcode;
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Percentage(55),
        ])
        .split(frame.area());

    draw_memory(frame, chunks[0], app);

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(10),
            Constraint::Length(3),
            Constraint::Min(4),
        ])
        .split(chunks[1]);

    draw_registers(frame, right_chunks[0], app);
    draw_status(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

/// Draw memory view with PC and breakpoint markers.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);

    let items: Vec<ListItem> = app
        .memory_rows(visible_rows)
        .into_iter()
        .map(|(addr, value, is_pc)| {
            let prefix = if is_pc { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(&addr) { "●" } else { " " };
            let hint = Opcode::mnemonic(value).unwrap_or("");
            let text = format!("{} {}{:02}: 0x{:02X} {:>3}  {}", bp, prefix, addr, value, value, hint);

            let style = if is_pc {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(&addr) {
                Style::default().fg(Color::Red)
            } else if value != 0 {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw register state.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let cpu = &app.cpu;

    let mut content: Vec<Line> = cpu.regs.values()
        .iter()
        .enumerate()
        .map(|(i, value)| {
            Line::from(vec![
                Span::raw(format!("R{}: ", i)),
                Span::styled(format!("{:>3}", value), Style::default().fg(Color::White)),
                Span::raw(format!("  0x{:02X}", value)),
            ])
        })
        .collect();

    content.push(Line::from(vec![
        Span::raw("PC: "),
        Span::styled(format!("{:>3}", cpu.pc()), Style::default().fg(Color::Yellow)),
        Span::raw("   IR: "),
        Span::styled(format!("0x{:02X}", cpu.ir()), Style::default().fg(Color::White)),
        Span::raw("   Z: "),
        Span::styled(
            format!("{}", cpu.flags()),
            if cpu.zero_flag() {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            },
        ),
    ]));
    content.push(Line::from(vec![
        Span::raw("Cycles: "),
        Span::styled(format!("{}", cpu.cycles), Style::default().fg(Color::Cyan)),
        Span::raw("   State: "),
        if cpu.is_finished() {
            Span::styled("Finished", Style::default().fg(Color::Red))
        } else if app.running {
            Span::styled("Running", Style::default().fg(Color::Green))
        } else {
            Span::styled("Ready", Style::default().fg(Color::Green))
        },
    ]));
    if let Some(instr) = cpu.last_instruction() {
        content.push(Line::from(format!("Last: {}", instr)));
    }

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  r: Run  p: Pause  b: Breakpoint"),
        Line::from("x: Reset  ↑↓: Scroll memory  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
