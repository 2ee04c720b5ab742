//! TUI layout and widget rendering.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Block, Borders, Cell, Chart, Dataset, List, ListItem, ListState, Paragraph, Row, Table,
    Wrap,
};

use super::runtime::{AdvisorPanel, App};
use super::style;
use crate::advisor::AdvisoryLine;
use crate::sim::types::{HistoryPoint, PhaseId, Status};
use crate::view::{BuildingOverview, DashboardSnapshot, ResolvedView};

/// Renders the full TUI frame.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Min(10),   // body
            Constraint::Length(1), // notice
            Constraint::Length(1), // footer
        ])
        .split(frame.area());

    let resolved = app.resolved();
    render_header(frame, app, &resolved, chunks[0]);
    match &resolved {
        ResolvedView::Landing { buildings } => render_landing(frame, app, buildings, chunks[1]),
        ResolvedView::Dashboard(snapshot) => render_dashboard(frame, app, snapshot, chunks[1]),
    }
    render_notice(frame, app, chunks[2]);
    render_footer(frame, &resolved, chunks[3]);
}

/// Header bar: screen title, tick count, run state.
fn render_header(frame: &mut Frame, app: &App, resolved: &ResolvedView, area: Rect) {
    let title = match resolved {
        ResolvedView::Landing { .. } => "Select a building".to_string(),
        ResolvedView::Dashboard(s) => s.name.clone(),
    };
    let (icon, state) = if app.paused {
        ("‖", "PAUSED")
    } else {
        ("▶", "LIVE")
    };

    let header = Line::from(vec![
        Span::styled(
            " PANEL-SIM ",
            Style::default()
                .fg(style::HEADER_FG)
                .bg(style::HEADER_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            " │ tick {} │ {}ms │ {icon} {state} ",
            app.simulator().ticks(),
            app.tick_interval().as_millis(),
        )),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

/// Building list with health and load.
fn render_landing(frame: &mut Frame, app: &App, buildings: &[BuildingOverview], area: Rect) {
    let items: Vec<ListItem> = buildings
        .iter()
        .map(|b| {
            ListItem::new(Line::from(vec![
                Span::raw(format!("{:<28}", b.name)),
                Span::styled(
                    format!("{:<16}", b.health.label()),
                    Style::default().fg(style::status_color(b.health)),
                ),
                Span::raw(format!(
                    "{:>7.2} kW   imbalance {:>5.1}%",
                    b.total_power, b.load_imbalance_pct
                )),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().title(" Buildings ").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .fg(style::ACCENT)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("› ");
    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Dashboard: status and totals, phase table, trend chart, advisor panel.
fn render_dashboard(frame: &mut Frame, app: &App, snapshot: &DashboardSnapshot, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(area);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // status + totals
            Constraint::Length(6), // phase table
            Constraint::Min(8),    // chart
        ])
        .split(columns[0]);

    render_status(frame, snapshot, left[0]);
    render_phases(frame, snapshot, left[1]);
    render_chart(frame, &snapshot.history, left[2]);
    render_advisor(frame, &app.panel, columns[1]);
}

fn render_status(frame: &mut Frame, snapshot: &DashboardSnapshot, area: Rect) {
    let m = &snapshot.metrics;
    let line = Line::from(vec![
        Span::styled(
            format!(" ● {} ", m.health.label()),
            Style::default()
                .fg(style::status_color(m.health))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " │ {:.2} kW │ {:.1} V avg │ {:.1} A │ imbalance {:.1}%",
            m.total_power, m.avg_voltage, m.total_current, m.load_imbalance_pct
        )),
    ]);
    let block = Block::default().title(" System Status ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_phases(frame: &mut Frame, snapshot: &DashboardSnapshot, area: Rect) {
    let rows = snapshot.phases.iter().map(|p| {
        Row::new(vec![
            Cell::from(Span::styled(
                format!("Phase {}", p.name),
                Style::default().fg(style::phase_color(p.name)),
            )),
            Cell::from(format!("{:.1} V", p.voltage)),
            Cell::from(format!("{:.1} A", p.current)),
            Cell::from(format!("{:.2} kW", p.power)),
            Cell::from(format!("{:.2}", p.power_factor)),
            Cell::from(Span::styled(
                p.status.label(),
                Style::default().fg(style::status_color(p.status)),
            )),
        ])
    });
    let header = Row::new(vec!["", "Voltage", "Current", "Power", "PF", "Status"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let table = Table::new(
        rows,
        [
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(8),
            Constraint::Length(9),
            Constraint::Length(5),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(Block::default().title(" Phases ").borders(Borders::ALL));
    frame.render_widget(table, area);
}

/// Per-phase power trend over the retained history.
fn render_chart(frame: &mut Frame, history: &[HistoryPoint], area: Rect) {
    let series: Vec<Vec<(f64, f64)>> = PhaseId::ALL
        .iter()
        .map(|&phase| {
            history
                .iter()
                .enumerate()
                .map(|(i, p)| (i as f64, p.power(phase)))
                .collect()
        })
        .collect();

    let slices: Vec<&[(f64, f64)]> = series.iter().map(Vec::as_slice).collect();
    let y_bounds = style::auto_bounds_y(&slices);
    let x_hi = (history.len().saturating_sub(1) as f64).max(1.0);

    let datasets = PhaseId::ALL
        .iter()
        .zip(&series)
        .map(|(&phase, data)| {
            Dataset::default()
                .name(format!("Phase {phase}"))
                .marker(symbols::Marker::Braille)
                .style(Style::default().fg(style::phase_color(phase)))
                .data(data)
        })
        .collect();

    let first = history.first().map_or("", |p| p.timestamp.as_str());
    let last = history.last().map_or("", |p| p.timestamp.as_str());

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(" Power Trend ")
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .bounds([0.0, x_hi])
                .labels(vec![first.to_string(), last.to_string()]),
        )
        .y_axis(
            Axis::default()
                .title("kW")
                .bounds(y_bounds)
                .labels(vec![
                    format!("{:.1}", y_bounds[0]),
                    format!("{:.1}", y_bounds[1]),
                ]),
        );

    frame.render_widget(chart, area);
}

fn advisory_line(line: &AdvisoryLine) -> Line<'static> {
    let accent = Style::default()
        .fg(style::ACCENT)
        .add_modifier(Modifier::BOLD);
    match line {
        AdvisoryLine::Heading { text } => Line::from(Span::styled(text.clone(), accent)),
        AdvisoryLine::Numbered {
            number,
            label,
            body,
            bold,
        } => {
            let label_style = if *bold { accent } else { Style::default() };
            let mut spans = vec![Span::styled(format!("{number}. {label}:"), label_style)];
            if let Some(body) = body {
                spans.push(Span::raw(format!(" {body}")));
            }
            Line::from(spans)
        }
        AdvisoryLine::Bullet { text } => Line::from(format!("  • {text}")),
        AdvisoryLine::Text { text } => Line::from(text.clone()),
    }
}

fn render_advisor(frame: &mut Frame, panel: &AdvisorPanel, area: Rect) {
    let lines: Vec<Line> = match panel {
        AdvisorPanel::Idle => vec![Line::from(Span::styled(
            "Press 'a' for an AI analysis of the current readings.",
            Style::default().fg(style::FOOTER_FG),
        ))],
        AdvisorPanel::Loading => vec![Line::from("Analyzing data...")],
        AdvisorPanel::Ready(advisory) => advisory.lines.iter().map(advisory_line).collect(),
        AdvisorPanel::Failed(message) => vec![Line::from(Span::styled(
            message.clone(),
            Style::default().fg(style::status_color(Status::Critical)),
        ))],
    };
    let block = Block::default()
        .title(" AI Energy Advisor ")
        .borders(Borders::ALL);
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_notice(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(notice) = &app.notice {
        frame.render_widget(Paragraph::new(format!(" {notice}")), area);
    }
}

/// Footer with keybinding hints for the current screen.
fn render_footer(frame: &mut Frame, resolved: &ResolvedView, area: Rect) {
    let hints = match resolved {
        ResolvedView::Landing { .. } => " q:Quit  ↑/↓:Select  Enter:Open  Space:Pause",
        ResolvedView::Dashboard(_) => " q:Quit  h/Esc:Home  a:Advisor  e:Export  Space:Pause",
    };
    let footer = Paragraph::new(Line::from(Span::styled(
        hints,
        Style::default().fg(style::FOOTER_FG),
    )));
    frame.render_widget(footer, area);
}
