//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph},
};
use super::app::{DebuggerApp, MEM_ROW_BYTES};
use crate::cpu::memory::MEMORY_SIZE;

const KEYS: &str = "s step  r run  p pause  b break  x reset  ↑↓ scroll  q quit";

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp<'_>) {
    let [main, footer] = Layout::vertical([Constraint::Min(8), Constraint::Length(4)])
        .areas(frame.area());
    let [code, memory] = Layout::horizontal([Constraint::Length(30), Constraint::Min(40)])
        .areas(main);
    let [disasm, registers] = Layout::vertical([Constraint::Min(4), Constraint::Length(5)])
        .areas(code);

    draw_disassembly(frame, disasm, app);
    draw_registers(frame, registers, app);
    draw_memory(frame, memory, app);
    draw_footer(frame, footer, app);
}

fn titled(title: &str, color: Color) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp<'_>) {
    let items: Vec<ListItem> = app
        .get_disassembly((area.height as usize).saturating_sub(2))
        .into_iter()
        .map(|(addr, text, is_pc)| {
            let marker = match (is_pc, app.breakpoints.contains(&addr)) {
                (true, true) => "●▶",
                (true, false) => " ▶",
                (false, true) => "● ",
                (false, false) => "  ",
            };
            let style = if is_pc {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!("{} {:03X}  {}", marker, addr, text)).style(style)
        })
        .collect();

    frame.render_widget(List::new(items).block(titled(" Code ", Color::Cyan)), area);
}

/// PC, IR and AC in the same four-digit hex as the console debug block.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp<'_>) {
    let regs = app.cpu.snapshot();
    let lines: Vec<Line> = [("PC", regs.pc), ("IR", regs.ir), ("AC", regs.ac)]
        .into_iter()
        .map(|(name, value)| Line::from(format!("{}: {:04X}  ({})", name, value, value)))
        .collect();

    frame.render_widget(Paragraph::new(lines).block(titled(" Registers ", Color::Green)), area);
}

fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp<'_>) {
    let rows = MEMORY_SIZE / MEM_ROW_BYTES;
    let end = (app.mem_scroll + (area.height as usize).saturating_sub(2)).min(rows);
    let bytes = app.cpu.memory().bytes();
    let pc = app.cpu.registers().pc.read() as usize;

    let lines: Vec<Line> = (app.mem_scroll..end)
        .map(|row| {
            let base = row * MEM_ROW_BYTES;
            let mut spans = vec![Span::styled(
                format!("{:03X} ", base),
                Style::default().fg(Color::DarkGray),
            )];
            // The word under the PC is highlighted byte by byte.
            for (i, byte) in bytes[base..base + MEM_ROW_BYTES].iter().enumerate() {
                let addr = base + i;
                let style = if addr == pc || addr == pc + 1 {
                    Style::default().fg(Color::Black).bg(Color::Yellow)
                } else if *byte == 0 {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default()
                };
                spans.push(Span::raw(" "));
                spans.push(Span::styled(format!("{:02X}", byte), style));
            }
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(titled(" Memory ", Color::Magenta)), area);
}

/// Status message, cycle count and key bindings under a mode title.
fn draw_footer(frame: &mut Frame, area: Rect, app: &DebuggerApp<'_>) {
    let mode_color = match app.mode() {
        "FAULTED" => Color::Red,
        "RUNNING" => Color::Green,
        _ => Color::Yellow,
    };
    let lines = vec![
        Line::from(vec![
            Span::styled(format!("cycle {:>6}  ", app.cpu.cycles()), Style::default().fg(Color::Cyan)),
            Span::raw(app.status.as_str()),
        ]),
        Line::styled(KEYS, Style::default().fg(Color::DarkGray)),
    ];

    let title = format!(" {} ", app.mode());
    frame.render_widget(Paragraph::new(lines).block(titled(&title, mode_color)), area);
}
