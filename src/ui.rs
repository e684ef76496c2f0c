use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use rusqlite::Connection;
use std::io;

use tender_desk::catalog;
use tender_desk::db;
use tender_desk::filter::{organizations, Selection};
use tender_desk::{
    compose, AiPrompt, ListQuery, ListView, Page, Presentation, PromptField, PromptSet, RowTarget,
    SortConfig, SortField, SortOrder, TenderStatus, TenderSummary, Vendor,
};

const CARD_HEIGHT: u16 = 6;
const CARD_COLUMNS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Tenders,
    Ted,
    Vendors,
    Prompts,
}

impl Screen {
    pub fn next(&self) -> Self {
        match self {
            Screen::Tenders => Screen::Ted,
            Screen::Ted => Screen::Vendors,
            Screen::Vendors => Screen::Prompts,
            Screen::Prompts => Screen::Tenders,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Screen::Tenders => Screen::Prompts,
            Screen::Ted => Screen::Tenders,
            Screen::Vendors => Screen::Ted,
            Screen::Prompts => Screen::Vendors,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Screen::Tenders => "Tenders",
            Screen::Ted => "TED Tenders",
            Screen::Vendors => "Vendors",
            Screen::Prompts => "AI Prompts",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

pub struct App {
    conn: Connection,
    pub page_size: usize,
    /// Normalized snapshot; every view is recomputed from this
    pub tenders: Vec<TenderSummary>,
    pub rejected: usize,
    pub organizations: Vec<String>,
    pub query: ListQuery,
    pub view: ListView,
    pub state: TableState,
    pub ted: Page<TenderSummary>,
    pub ted_state: TableState,
    pub vendors: Vec<Vendor>,
    pub vendors_state: TableState,
    pub prompts: Vec<AiPrompt>,
    pub current_screen: Screen,
    pub input_mode: InputMode,
    pub show_detail: bool,
    pub message: Option<String>,
}

impl App {
    pub fn new(conn: Connection, page_size: usize) -> Result<Self> {
        let (tenders, issues) = catalog::local_snapshot(&conn)?;
        let query = ListQuery::default();
        let view = compose(&tenders, &query)?;
        let ted = catalog::ted_page(&conn, 1, page_size)?;
        let vendors = db::get_validated_vendors(&conn)?;
        let prompts = db::get_ai_prompts(&conn, &[])?;

        let mut app = Self {
            organizations: organizations(&tenders),
            rejected: issues.iter().filter(|i| i.rejected).count(),
            tenders,
            conn,
            page_size,
            query,
            view,
            state: TableState::default(),
            ted,
            ted_state: TableState::default(),
            vendors,
            vendors_state: TableState::default(),
            prompts,
            current_screen: Screen::Tenders,
            input_mode: InputMode::Normal,
            show_detail: false,
            message: None,
        };
        app.reset_selection();
        if !app.ted.items.is_empty() {
            app.ted_state.select(Some(0));
        }
        if !app.vendors.is_empty() {
            app.vendors_state.select(Some(0));
        }
        Ok(app)
    }

    fn reset_selection(&mut self) {
        self.state
            .select(if self.view.tenders.is_empty() { None } else { Some(0) });
    }

    /// Re-run filter → sort over the snapshot
    pub fn recompute(&mut self) {
        match compose(&self.tenders, &self.query) {
            Ok(view) => self.view = view,
            Err(err) => self.message = Some(err.to_string()),
        }
        self.reset_selection();
    }

    pub fn cycle_status(&mut self) {
        self.query.filter.status = self.query.filter.status.cycle();
        self.recompute();
    }

    /// all → each known organization → all
    pub fn cycle_organization(&mut self) {
        let next = match &self.query.filter.organization {
            Selection::All => self.organizations.first().cloned(),
            Selection::Only(current) => self
                .organizations
                .iter()
                .position(|o| o == current)
                .and_then(|i| self.organizations.get(i + 1))
                .cloned(),
        };
        self.query.filter.organization = next.map(Selection::Only).unwrap_or(Selection::All);
        self.recompute();
    }

    pub fn sort_by(&mut self, field: SortField) {
        self.query.sort = Some(match self.query.sort {
            Some(config) => config.toggle(field),
            None => SortConfig::new(field, SortOrder::Asc),
        });
        self.recompute();
    }

    pub fn toggle_presentation(&mut self) {
        self.query.presentation = self.query.presentation.toggled();
        self.view.presentation = self.query.presentation;
    }

    pub fn push_search(&mut self, c: char) {
        self.query.filter.search_text.push(c);
        self.recompute();
    }

    pub fn pop_search(&mut self) {
        self.query.filter.search_text.pop();
        self.recompute();
    }

    pub fn clear_filters(&mut self) {
        self.query.filter = Default::default();
        self.recompute();
    }

    /// Load a TED page; out-of-range requests keep the current page
    pub fn goto_ted_page(&mut self, number: usize) {
        match catalog::ted_page(&self.conn, number, self.page_size) {
            Ok(page) => {
                self.ted_state
                    .select(if page.items.is_empty() { None } else { Some(0) });
                self.ted = page;
                self.message = None;
            }
            Err(err) => self.message = Some(format!("{:#}", err)),
        }
    }

    pub fn next_ted_page(&mut self) {
        if self.ted.has_next() {
            self.goto_ted_page(self.ted.page_number + 1);
        }
    }

    pub fn previous_ted_page(&mut self) {
        if self.ted.has_previous() {
            self.goto_ted_page(self.ted.page_number - 1);
        }
    }

    fn active_list(&mut self) -> (usize, &mut TableState) {
        match self.current_screen {
            Screen::Ted => (self.ted.items.len(), &mut self.ted_state),
            Screen::Vendors => (self.vendors.len(), &mut self.vendors_state),
            _ => (self.view.tenders.len(), &mut self.state),
        }
    }

    /// Grid moves by a full row of cards
    fn step(&self) -> usize {
        if self.current_screen == Screen::Tenders && self.view.presentation == Presentation::Grid {
            CARD_COLUMNS
        } else {
            1
        }
    }

    pub fn next(&mut self) {
        let step = self.step();
        let (len, state) = self.active_list();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) if i + step < len => i + step,
            Some(i) if step > 1 => i,
            _ => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let step = self.step();
        let (len, state) = self.active_list();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) if i >= step => i - step,
            Some(i) if step > 1 => i,
            _ => len - 1,
        };
        state.select(Some(i));
    }

    pub fn selected_tender(&self) -> Option<&TenderSummary> {
        match self.current_screen {
            Screen::Tenders => self.state.selected().and_then(|i| self.view.tenders.get(i)),
            Screen::Ted => self.ted_state.selected().and_then(|i| self.ted.items.get(i)),
            _ => None,
        }
    }

    /// Returns true when the app should quit
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.input_mode == InputMode::Search {
            match code {
                KeyCode::Enter | KeyCode::Esc => self.input_mode = InputMode::Normal,
                KeyCode::Backspace => self.pop_search(),
                KeyCode::Char(c) => self.push_search(c),
                _ => {}
            }
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => self.current_screen = self.current_screen.next(),
            KeyCode::BackTab => self.current_screen = self.current_screen.previous(),
            KeyCode::Enter => self.show_detail = !self.show_detail,
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            _ => {}
        }

        match self.current_screen {
            Screen::Tenders => match code {
                KeyCode::Char('/') => self.input_mode = InputMode::Search,
                KeyCode::Char('s') => self.cycle_status(),
                KeyCode::Char('o') => self.cycle_organization(),
                KeyCode::Char('g') => self.toggle_presentation(),
                KeyCode::Char('c') => self.clear_filters(),
                KeyCode::Char(c @ '1'..='5') => {
                    let index = c as usize - '1' as usize;
                    self.sort_by(SortField::ALL[index]);
                }
                _ => {}
            },
            Screen::Ted => match code {
                KeyCode::Char('n') | KeyCode::Right => self.next_ted_page(),
                KeyCode::Char('p') | KeyCode::Left => self.previous_ted_page(),
                _ => {}
            },
            _ => {}
        }

        false
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

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

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && app.handle_key(key.code) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Length(3), // Filters / paging
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_toolbar(f, chunks[1], app);

    let has_detail = app.show_detail && app.selected_tender().is_some();
    let content = if has_detail {
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
            .split(chunks[2]);
        render_detail_panel(f, split[1], app);
        split[0]
    } else {
        chunks[2]
    };

    match app.current_screen {
        Screen::Tenders => match app.view.presentation {
            Presentation::Table => render_tender_table(f, content, app),
            Presentation::Grid => render_tender_grid(f, content, app),
        },
        Screen::Ted => render_ted(f, content, app),
        Screen::Vendors => render_vendors(f, content, app),
        Screen::Prompts => render_prompts(f, content, app),
    }

    render_status_bar(f, chunks[3], app);
}

fn status_color(status: TenderStatus) -> Color {
    match status {
        TenderStatus::Draft => Color::Gray,
        TenderStatus::Active => Color::Green,
        TenderStatus::Closed => Color::Red,
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let screens = [Screen::Tenders, Screen::Ted, Screen::Vendors, Screen::Prompts];

    let mut spans = vec![];
    for (i, screen) in screens.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let style = if *screen == app.current_screen {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(screen.title(), style));
    }

    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Total: {}", app.view.total),
        Style::default().fg(Color::White),
    ));
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        format!("Active: {}", app.view.active),
        Style::default().fg(Color::Green),
    ));
    if app.rejected > 0 {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("Rejected: {}", app.rejected),
            Style::default().fg(Color::Red),
        ));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));
    f.render_widget(header, area);
}

fn render_toolbar(f: &mut Frame, area: Rect, app: &App) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let line = match app.current_screen {
        Screen::Tenders => {
            let filter = &app.query.filter;
            let status = match filter.status {
                Selection::All => "all".to_string(),
                Selection::Only(s) => s.to_string(),
            };
            let organization = match &filter.organization {
                Selection::All => "all",
                Selection::Only(o) => o.as_str(),
            };
            let sort = match app.query.sort {
                Some(config) => format!("{} {}", config.field.label(), config.order.arrow()),
                None => "newest".to_string(),
            };
            let search_style = if app.input_mode == InputMode::Search {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };

            Line::from(vec![
                key("/"),
                Span::raw(" Search: "),
                Span::styled(format!("[{}]", filter.search_text), search_style),
                Span::raw("  "),
                key("s"),
                Span::raw(format!(" Status: {}  ", status)),
                key("o"),
                Span::raw(format!(" Org: {}  ", organization)),
                key("1-5"),
                Span::raw(format!(" Sort: {}  ", sort)),
                key("g"),
                Span::raw(match app.view.presentation {
                    Presentation::Grid => " Grid",
                    Presentation::Table => " Table",
                }),
            ])
        }
        Screen::Ted => {
            let range = match app.ted.item_range() {
                Some((first, last)) => format!("{}-{} of {}", first, last, app.ted.total_items),
                None => "no notices".to_string(),
            };
            Line::from(vec![
                Span::raw(format!(
                    " Page {} of {}  ({})  ",
                    app.ted.page_number, app.ted.total_pages, range
                )),
                key("p"),
                Span::raw(" Previous  "),
                key("n"),
                Span::raw(" Next"),
            ])
        }
        Screen::Vendors => Line::from(format!(" {} validated vendors", app.vendors.len())),
        Screen::Prompts => {
            let set = PromptSet::from_rows(&app.prompts);
            let missing: Vec<&str> = set.missing().iter().map(|f| f.label()).collect();
            if missing.is_empty() {
                Line::from(format!(" All {} fields configured", set.len()))
            } else {
                Line::from(format!(" Not configured: {}", missing.join(", ")))
            }
        }
    };

    let toolbar = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(toolbar, area);
}

fn header_row(labels: &[&str]) -> Row<'static> {
    let cells: Vec<Cell> = labels
        .iter()
        .map(|h| {
            Cell::from(h.to_string()).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        })
        .collect();
    Row::new(cells).style(Style::default().bg(Color::DarkGray)).height(1)
}

fn summary_row(tender: &TenderSummary) -> Row<'static> {
    Row::new(vec![
        Cell::from(truncate(&tender.title, 40)),
        Cell::from(truncate(&tender.organization, 24)),
        Cell::from(tender.deadline_display.clone()),
        Cell::from(tender.budget_display.clone()),
        Cell::from(tender.status.to_string()).style(Style::default().fg(status_color(tender.status))),
    ])
    .height(1)
}

const SUMMARY_WIDTHS: [Constraint; 5] = [
    Constraint::Min(20),
    Constraint::Length(26),
    Constraint::Length(16),
    Constraint::Length(18),
    Constraint::Length(8),
];

fn render_tender_table(f: &mut Frame, area: Rect, app: &mut App) {
    let labels: Vec<String> = SortField::ALL
        .iter()
        .enumerate()
        .map(|(i, field)| match app.query.sort {
            Some(config) if config.field == *field => {
                format!("{} {} {}", i + 1, field.label(), config.order.arrow())
            }
            _ => format!("{} {}", i + 1, field.label()),
        })
        .collect();
    let labels: Vec<&str> = labels.iter().map(String::as_str).collect();

    let rows: Vec<Row> = app.view.tenders.iter().map(summary_row).collect();
    let title = if rows.is_empty() {
        " No tenders match the current filters ".to_string()
    } else {
        format!(" Tenders ({}) ", app.view.total)
    };

    let table = Table::new(rows, SUMMARY_WIDTHS)
        .header(header_row(&labels))
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_tender_grid(f: &mut Frame, area: Rect, app: &App) {
    let outer = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Tenders ({}) ", app.view.total));
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    if app.view.tenders.is_empty() {
        f.render_widget(Paragraph::new(" No tenders match the current filters"), inner);
        return;
    }

    let visible_rows = (inner.height / CARD_HEIGHT).max(1) as usize;
    let selected = app.state.selected().unwrap_or(0);
    let first_row = (selected / CARD_COLUMNS).saturating_sub(visible_rows - 1);

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); visible_rows])
        .split(inner);

    for (r, row_area) in row_areas.iter().enumerate() {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, CARD_COLUMNS as u32); CARD_COLUMNS])
            .split(*row_area);

        for (c, card_area) in columns.iter().enumerate() {
            let index = (first_row + r) * CARD_COLUMNS + c;
            let Some(tender) = app.view.tenders.get(index) else {
                continue;
            };

            let border = if index == selected {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let card = Paragraph::new(vec![
                Line::from(Span::styled(tender.organization.clone(), Style::default().fg(Color::Cyan))),
                Line::from(format!("Deadline: {}", tender.deadline_display)),
                Line::from(format!("Budget:   {}", tender.budget_display)),
                Line::from(Span::styled(
                    tender.status.to_string(),
                    Style::default().fg(status_color(tender.status)),
                )),
            ])
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title(truncate(&tender.title, card_area.width.saturating_sub(4) as usize)),
            );
            f.render_widget(card, *card_area);
        }
    }
}

fn render_ted(f: &mut Frame, area: Rect, app: &mut App) {
    let rows: Vec<Row> = app.ted.items.iter().map(summary_row).collect();
    let title = if rows.is_empty() {
        " No TED tenders found. Run `tender-desk ted-sync` to fetch notices ".to_string()
    } else {
        format!(" TED Tenders - page {} ", app.ted.page_number)
    };

    let table = Table::new(rows, SUMMARY_WIDTHS)
        .header(header_row(&["Title", "Buyer", "Published", "Value", "Status"]))
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.ted_state);
}

fn render_vendors(f: &mut Frame, area: Rect, app: &mut App) {
    let rows: Vec<Row> = app
        .vendors
        .iter()
        .map(|vendor| {
            Row::new(vec![
                Cell::from(vendor.display_name().to_string()),
                Cell::from(vendor.created_display()),
                Cell::from("Validated").style(Style::default().fg(Color::Green)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Min(30), Constraint::Length(20), Constraint::Length(12)],
    )
    .header(header_row(&["Organization Name", "Registration Date", "Status"]))
    .block(Block::default().borders(Borders::ALL).title(" Validated Vendors "))
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.vendors_state);
}

fn render_prompts(f: &mut Frame, area: Rect, app: &App) {
    let set = PromptSet::from_rows(&app.prompts);
    let mut lines = Vec::new();

    for field in PromptField::ALL {
        lines.push(Line::from(Span::styled(
            format!(" {} ({})", field.label(), field.as_str()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        match set.get(field) {
            Some(text) => lines.push(Line::from(format!("   {}", text))),
            None => lines.push(Line::from(Span::styled(
                "   (not configured)",
                Style::default().fg(Color::DarkGray),
            ))),
        }
        lines.push(Line::from(""));
    }

    let prompts = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" AI Prompt Configuration "));
    f.render_widget(prompts, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let Some(tender) = app.selected_tender() else {
        return;
    };
    let target = RowTarget::for_tender(tender);
    let label = |s: &'static str| Span::styled(s, Style::default().fg(Color::Yellow));

    let mut lines = vec![
        Line::from(Span::styled(
            tender.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![label("Organization: "), Span::raw(tender.organization.clone())]),
        Line::from(vec![label("Deadline:     "), Span::raw(tender.deadline_display.clone())]),
        Line::from(vec![label("Budget:       "), Span::raw(tender.budget_display.clone())]),
        Line::from(vec![
            label("Status:       "),
            Span::styled(tender.status.to_string(), Style::default().fg(status_color(tender.status))),
        ]),
    ];
    if let Some(country) = &tender.country {
        lines.push(Line::from(vec![label("Country:      "), Span::raw(country.clone())]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        label(match target {
            RowTarget::Editor { .. } => "Edit:  ",
            RowTarget::External { .. } => "Open:  ",
        }),
        Span::styled(target.describe().to_string(), Style::default().fg(Color::Cyan)),
    ]));

    let panel = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Details "));
    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![];

    if let Some(message) = &app.message {
        spans.push(Span::styled(format!(" {} ", message), Style::default().fg(Color::Red)));
        spans.push(Span::raw(" | "));
    }

    spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Details | "));
    spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Page | "));
    spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Nav | "));
    if app.current_screen == Screen::Tenders {
        spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(" Clear filters | "));
    }
    spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
