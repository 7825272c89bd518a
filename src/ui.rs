use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Paragraph, Row, Sparkline, Table, TableState},
    Frame, Terminal,
};
use retail_pulse::{DashboardSession, DashboardView};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Consumption,
    Records,
    Segments,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Consumption => Page::Records,
            Page::Records => Page::Segments,
            Page::Segments => Page::Consumption,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Consumption => Page::Segments,
            Page::Records => Page::Consumption,
            Page::Segments => Page::Records,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Consumption => "Consumption",
            Page::Records => "Records",
            Page::Segments => "Segments",
        }
    }
}

pub struct App {
    pub session: DashboardSession,
    pub view: DashboardView,
    pub current_page: Page,
    pub records_state: TableState,
    pub segments_state: TableState,
}

impl App {
    pub fn new(session: DashboardSession) -> Self {
        let view = session.view();

        let mut records_state = TableState::default();
        if !view.filtered_sales.is_empty() {
            records_state.select(Some(0));
        }
        let mut segments_state = TableState::default();
        if !view.filtered_segments.is_empty() {
            segments_state.select(Some(0));
        }

        Self {
            session,
            view,
            current_page: Page::Consumption,
            records_state,
            segments_state,
        }
    }

    /// Rerun the filter → aggregate pipeline after a selection change.
    fn recompute(&mut self) {
        self.view = self.session.view();
        self.records_state
            .select(if self.view.filtered_sales.is_empty() { None } else { Some(0) });
        self.segments_state
            .select(if self.view.filtered_segments.is_empty() { None } else { Some(0) });
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    /// Step the selected year through the year list (wrapping).
    pub fn cycle_year(&mut self, forward: bool) {
        let years = self.session.years();
        if let Some(year) = cycle(&years, self.session.selection().year, forward) {
            self.session.select_year(year);
            self.recompute();
        }
    }

    pub fn cycle_month(&mut self, forward: bool) {
        let months = self.session.months();
        if let Some(month) = cycle(&months, self.session.selection().month, forward) {
            self.session.select_month(month);
            self.recompute();
        }
    }

    pub fn cycle_fiscal_year(&mut self, forward: bool) {
        let years = self.session.fiscal_years();
        if let Some(year) = cycle(&years, self.session.selection().fiscal_year, forward) {
            self.session.select_fiscal_year(year);
            self.recompute();
        }
    }

    pub fn cycle_region(&mut self) {
        let regions = self.session.regions();
        let current = self.session.selection().region_id.clone();
        if let Some(region) = cycle(&regions, current, true) {
            self.session.select_region(&region);
            self.recompute();
        }
    }

    pub fn scroll_down(&mut self) {
        let (state, len) = self.active_table();
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(i) => i,
            None => 0,
        };
        if len > 0 {
            state.select(Some(i));
        }
    }

    pub fn scroll_up(&mut self) {
        let (state, len) = self.active_table();
        let i = state.selected().map(|i| i.saturating_sub(1)).unwrap_or(0);
        if len > 0 {
            state.select(Some(i));
        }
    }

    fn active_table(&mut self) -> (&mut TableState, usize) {
        match self.current_page {
            Page::Segments => (&mut self.segments_state, self.view.filtered_segments.len()),
            _ => (&mut self.records_state, self.view.filtered_sales.len()),
        }
    }
}

/// Next (or previous) entry of `values` relative to `current`, wrapping.
fn cycle<T: Clone + PartialEq>(values: &[T], current: Option<T>, forward: bool) -> Option<T> {
    if values.is_empty() {
        return None;
    }

    let len = values.len();
    let position = current.and_then(|c| values.iter().position(|v| *v == c));

    let next = match position {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None => 0,
    };
    Some(values[next].clone())
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => app.next_page(),
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Up => app.cycle_year(true),
                KeyCode::Down => app.cycle_year(false),
                KeyCode::Right => app.cycle_month(true),
                KeyCode::Left => app.cycle_month(false),
                KeyCode::Char(']') => app.cycle_fiscal_year(true),
                KeyCode::Char('[') => app.cycle_fiscal_year(false),
                KeyCode::Char('r') => app.cycle_region(),
                KeyCode::Char('j') => app.scroll_down(),
                KeyCode::Char('k') => app.scroll_up(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Consumption => render_consumption(f, chunks[1], app),
        Page::Records => render_records(f, chunks[1], app),
        Page::Segments => render_segments(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(
            " Retail Pulse ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
    ];

    for page in [Page::Consumption, Page::Records, Page::Segments] {
        let style = if page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!(" {} ", page.title()), style));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn render_consumption(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(8),
            Constraint::Min(8),
        ])
        .split(area);

    render_sales_kpis(f, chunks[0], app);
    render_monthly_sparkline(f, chunks[1], app);
    render_category_chart(f, chunks[2], app);
}

fn render_sales_kpis(f: &mut Frame, area: Rect, app: &App) {
    let tiles = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let total = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("${}", format_thousands(app.view.kpis.total_sales)),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title("Total Sales"));
    f.render_widget(total, tiles[0]);

    let count = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("{} records", app.view.kpis.record_count),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title("Transactions"));
    f.render_widget(count, tiles[1]);
}

fn render_monthly_sparkline(f: &mut Frame, area: Rect, app: &App) {
    let data: Vec<u64> = app
        .view
        .monthly
        .iter()
        .map(|m| m.total_sales.max(0.0) as u64)
        .collect();

    let title = match (app.view.monthly.first(), app.view.monthly.last()) {
        (Some(first), Some(last)) => {
            format!("Monthly Sales ({} → {})", first.period, last.period)
        }
        _ => "Monthly Sales".to_string(),
    };

    let sparkline = Sparkline::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .data(&data)
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(sparkline, area);
}

fn render_category_chart(f: &mut Frame, area: Rect, app: &App) {
    let bars: Vec<(&str, u64)> = app
        .view
        .categories
        .iter()
        .map(|c| (c.category.abbrev(), c.total.max(0.0) as u64))
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Sales by Category"),
        )
        .data(&bars)
        .bar_width(7)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Green))
        .value_style(Style::default().fg(Color::Black).bg(Color::Green));
    f.render_widget(chart, area);
}

fn render_records(f: &mut Frame, area: Rect, app: &mut App) {
    let header = Row::new(vec![
        Cell::from("Period"),
        Cell::from("Total"),
        Cell::from("Fuel"),
        Cell::from("Food"),
        Cell::from("Pharmacy"),
        Cell::from("Electronics"),
        Cell::from("Auto"),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .view
        .filtered_sales
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.period.clone()),
                Cell::from(format_thousands(r.total_sales)),
                Cell::from(format_thousands(r.fuel)),
                Cell::from(format_thousands(r.food)),
                Cell::from(format_thousands(r.pharmacy_cosmetics)),
                Cell::from(format_thousands(r.home_electronics)),
                Cell::from(format_thousands(r.auto_parts)),
            ])
        })
        .collect();

    let title = format!("Filtered Records ({})", app.view.filtered_sales.len());
    let table = Table::new(
        rows,
        [
            Constraint::Length(9),
            Constraint::Length(14),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title))
    .highlight_style(Style::default().bg(Color::DarkGray));

    f.render_stateful_widget(table, area, &mut app.records_state);
}

fn render_segments(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(10),
            Constraint::Min(6),
        ])
        .split(area);

    render_segment_kpis(f, chunks[0], app);
    render_segment_chart(f, chunks[1], app);
    render_segment_table(f, chunks[2], app);
}

fn render_segment_kpis(f: &mut Frame, area: Rect, app: &App) {
    let tiles = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(area);

    let summary = &app.view.segment_summary;
    let kpis = [
        ("Businesses", format_thousands(summary.num_businesses as f64), Color::White),
        ("Workers", format_thousands(summary.num_employees as f64), Color::White),
        ("Sales (UF)", format!("{:.2}", summary.sales_uf), Color::Green),
    ];

    for (i, (title, value, color)) in kpis.into_iter().enumerate() {
        let tile = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                value,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(tile, tiles[i]);
    }
}

fn render_segment_chart(f: &mut Frame, area: Rect, app: &App) {
    let bars: Vec<(&str, u64)> = app
        .view
        .segment_employees
        .iter()
        .map(|(segment, employees)| (segment.as_str(), (*employees).max(0) as u64))
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Workers by Segment"),
        )
        .data(&bars)
        .bar_width(9)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Magenta))
        .value_style(Style::default().fg(Color::Black).bg(Color::Magenta));
    f.render_widget(chart, area);
}

fn render_segment_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header = Row::new(vec![
        Cell::from("Year"),
        Cell::from("Region"),
        Cell::from("Segment"),
        Cell::from("Businesses"),
        Cell::from("Workers"),
        Cell::from("Sales (UF)"),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .view
        .filtered_segments
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.fiscal_year.to_string()),
                Cell::from(r.region_id.clone()),
                Cell::from(r.segment_id.clone()),
                Cell::from(format_thousands(r.num_businesses as f64)),
                Cell::from(format_thousands(r.num_employees as f64)),
                Cell::from(format!("{:.2}", r.sales_uf)),
            ])
        })
        .collect();

    let title = format!("Segments ({})", app.view.filtered_segments.len());
    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title))
    .highlight_style(Style::default().bg(Color::DarkGray));

    f.render_stateful_widget(table, area, &mut app.segments_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selection = app.session.selection();
    let period = match (selection.year, selection.month) {
        (Some(year), Some(month)) => retail_pulse::period_label(year, month),
        _ => "—".to_string(),
    };
    let segment_scope = format!(
        "{} / {}",
        selection
            .fiscal_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "—".to_string()),
        selection.region_id.as_deref().unwrap_or("—")
    );

    let status = Paragraph::new(Line::from(vec![
        Span::styled("Period: ", Style::default().fg(Color::DarkGray)),
        Span::styled(period, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled("Region/FY: ", Style::default().fg(Color::DarkGray)),
        Span::styled(segment_scope, Style::default().fg(Color::Yellow)),
        Span::raw("  │  "),
        Span::styled(
            "↑↓ year  ←→ month  [ ] fiscal year  r region  Tab page  q quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, area);
}

/// "1234567.8" → "1,234,568" (display only, no decimals).
fn format_thousands(value: f64) -> String {
    let negative = value < 0.0;
    let rounded = value.abs().round() as u64;

    let digits = rounded.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
