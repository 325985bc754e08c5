use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap},
};
use std::future::Future;
use std::io::{stdout, Stdout};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

use crate::config::Settings;
use crate::filter::{self, CompanyColumn, CompanyQuery, JobQuery};
use crate::loader::{self, LoadError};
use crate::models::{Company, Job, Manifest, ManifestEntry};
use crate::options::{self, FilterOptions};
use crate::source::DataSource;
use crate::state::{Board, LoadOutcome, LoadTicket, Phase, Status};
use crate::view::{self, CompanyRow, JobCard, Links};

type Completed<T> = (LoadTicket, Result<Vec<T>, LoadError>);

#[derive(Debug, PartialEq, Eq)]
enum Action {
    None,
    Quit,
    Load(LoadTicket),
}

fn spawn_load<T, F>(handle: &Handle, tx: &Sender<Completed<T>>, ticket: LoadTicket, load: F)
where
    T: Send + 'static,
    F: Future<Output = Result<Vec<T>, LoadError>> + Send + 'static,
{
    let tx = tx.clone();
    handle.spawn(async move {
        let outcome = load.await;
        // Receiver is gone once the view has closed
        let _ = tx.send((ticket, outcome));
    });
}

fn with_terminal<F>(f: F) -> Result<()>
where
    F: FnOnce(&mut Terminal<CrosstermBackend<Stdout>>) -> Result<()>,
{
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = f(&mut terminal);

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn status_style(status: &Status) -> Style {
    match status {
        Status::Failed { .. } => Style::default().fg(Color::Red),
        Status::Loading { .. } => Style::default().fg(Color::Yellow),
        _ => Style::default().fg(Color::DarkGray),
    }
}

// --- Job browser ---

struct JobBrowser {
    board: Board<Job>,
    options: FilterOptions,
    query: JobQuery,
    visible: Vec<Job>,
    selected: usize,
    scroll_offset: u16,
    sources: Vec<ManifestEntry>,
    source_index: usize,
    editing: bool,
    label_max: usize,
    links: Links,
}

impl JobBrowser {
    fn new(manifest: Manifest, source_index: usize, settings: &Settings) -> Self {
        Self {
            board: Board::new(),
            options: FilterOptions::default(),
            query: JobQuery::default(),
            visible: Vec::new(),
            selected: 0,
            scroll_offset: 0,
            sources: manifest.entries,
            source_index,
            editing: false,
            label_max: settings.tag_label_max,
            links: Links::new(settings),
        }
    }

    fn source_label(&self) -> &str {
        self.sources
            .get(self.source_index)
            .map(|e| e.label())
            .unwrap_or("-")
    }

    fn current_job(&self) -> Option<&Job> {
        self.visible.get(self.selected)
    }

    fn status(&self) -> Status {
        self.board.status(self.visible.len())
    }

    /// Starts loading the current source with the filters cleared.
    ///
    /// The list stays empty until the load completes.
    fn start_load(&mut self) -> Option<LoadTicket> {
        let filename = self.sources.get(self.source_index)?.filename.clone();
        self.query.reset_filters();
        self.editing = false;
        self.visible.clear();
        self.selected = 0;
        self.scroll_offset = 0;
        Some(self.board.begin_load(filename))
    }

    fn switch_source(&mut self, forward: bool) -> Option<LoadTicket> {
        let len = self.sources.len();
        if len == 0 {
            return None;
        }
        self.source_index = if forward {
            (self.source_index + 1) % len
        } else {
            (self.source_index + len - 1) % len
        };
        self.start_load()
    }

    fn apply_load(&mut self, ticket: LoadTicket, outcome: Result<Vec<Job>, LoadError>) {
        match self.board.finish_load(ticket, outcome) {
            LoadOutcome::Stale => return,
            LoadOutcome::Applied | LoadOutcome::Failed => {
                self.options = FilterOptions::from_jobs(self.board.records(), self.label_max);
            }
        }
        self.selected = 0;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.visible = filter::filter_jobs(self.board.records(), &self.query)
            .into_iter()
            .cloned()
            .collect();
        if self.selected >= self.visible.len() {
            self.selected = self.visible.len().saturating_sub(1);
        }
        self.scroll_offset = 0;
    }

    fn next(&mut self) {
        if !self.visible.is_empty() && self.selected < self.visible.len() - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    fn handle_key(&mut self, code: KeyCode) -> Action {
        if self.editing {
            match code {
                KeyCode::Enter | KeyCode::Esc => self.editing = false,
                KeyCode::Backspace => {
                    self.query.text.pop();
                    self.refresh();
                }
                KeyCode::Char(c) => {
                    self.query.text.push(c);
                    self.refresh();
                }
                _ => {}
            }
            return Action::None;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.prev(),
            KeyCode::Char('J') | KeyCode::PageDown => self.scroll_down(),
            KeyCode::Char('K') | KeyCode::PageUp => self.scroll_up(),
            KeyCode::Char('/') => self.editing = true,
            KeyCode::Char('t') | KeyCode::Char('T') => {
                let forward = code == KeyCode::Char('t');
                self.query.tag = options::cycle(&self.options.tags, &self.query.tag, forward);
                self.refresh();
            }
            KeyCode::Char('w') | KeyCode::Char('W') => {
                let forward = code == KeyCode::Char('w');
                self.query.working =
                    options::cycle(&self.options.working, &self.query.working, forward);
                self.refresh();
            }
            KeyCode::Char('s') => {
                self.query.sort = self.query.sort.next();
                self.refresh();
            }
            KeyCode::Char('c') => {
                self.query.reset_filters();
                self.refresh();
            }
            KeyCode::Char('d') | KeyCode::Char('D') => {
                if let Some(ticket) = self.switch_source(code == KeyCode::Char('d')) {
                    return Action::Load(ticket);
                }
            }
            KeyCode::Char('r') => {
                if let Some(ticket) = self.start_load() {
                    return Action::Load(ticket);
                }
            }
            _ => {}
        }
        Action::None
    }
}

pub fn run_browse(
    handle: Handle,
    source: Arc<dyn DataSource>,
    settings: &Settings,
    manifest: Manifest,
    source_index: usize,
) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut browser = JobBrowser::new(manifest, source_index, settings);

    let load = |browser_ticket: LoadTicket| {
        let source = source.clone();
        let path = settings.feed_path(browser_ticket.source());
        spawn_load(&handle, &tx, browser_ticket, async move {
            loader::load_jobs(source.as_ref(), &path).await
        });
    };

    if let Some(ticket) = browser.start_load() {
        load(ticket);
    }

    with_terminal(|terminal| {
        let mut list_state = ListState::default();
        loop {
            drain_jobs(&rx, &mut browser);
            list_state.select((!browser.visible.is_empty()).then_some(browser.selected));
            terminal.draw(|frame| draw_jobs(frame, &browser, &mut list_state))?;

            if !event::poll(Duration::from_millis(150))? {
                continue;
            }
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match browser.handle_key(key.code) {
                    Action::Quit => break,
                    Action::Load(ticket) => {
                        debug!("Switching data source to {}", ticket.source());
                        load(ticket);
                    }
                    Action::None => {}
                }
            }
        }
        Ok(())
    })
}

fn drain_jobs(rx: &Receiver<Completed<Job>>, browser: &mut JobBrowser) {
    while let Ok((ticket, outcome)) = rx.try_recv() {
        browser.apply_load(ticket, outcome);
    }
}

fn draw_jobs(frame: &mut Frame, browser: &JobBrowser, list_state: &mut ListState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    // Header: source, active filters, status
    let status = browser.status();
    let search = if browser.editing {
        format!("/{}_", browser.query.text)
    } else if browser.query.text.is_empty() {
        "-".to_string()
    } else {
        browser.query.text.clone()
    };
    let header = Paragraph::new(vec![
        Line::from(format!(
            "Tag: {}  |  Work: {}  |  Sort: {}  |  Search: {}",
            options::label_for(&browser.options.tags, &browser.query.tag),
            options::label_for(&browser.options.working, &browser.query.working),
            browser.query.sort,
            search
        )),
        Line::from(Span::styled(view::job_status_text(&status), status_style(&status))),
    ])
    .block(Block::default().borders(Borders::ALL).title(format!(" {} ", browser.source_label())));
    frame.render_widget(header, rows[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[1]);

    // Left panel: job list
    let items: Vec<ListItem> = browser
        .visible
        .iter()
        .map(|job| {
            let company = if job.company_name().is_empty() { "?" } else { job.company_name() };
            ListItem::new(format!("{} | {}", options::display_label(job.title(), 32), company))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Jobs ({}/{}) ",
            browser.visible.len(),
            browser.board.records().len()
        )))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, body[0], list_state);

    // Right panel: job detail
    let detail = Paragraph::new(build_job_detail(browser))
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((browser.scroll_offset, 0));
    frame.render_widget(detail, body[1]);

    let help = if browser.editing {
        " type to search  Enter/Esc:done  Backspace:delete"
    } else {
        " j/k:navigate  J/K:scroll  /:search  t/T:tag  w/W:work  s:sort  c:clear  d/D:source  r:reload  q:quit"
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        rows[2],
    );
}

fn build_job_detail(browser: &JobBrowser) -> Text<'static> {
    let Some(job) = browser.current_job() else {
        return Text::raw(view::NO_JOBS_FOUND);
    };
    let card = JobCard::from_job(job, &browser.links, usize::MAX);

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        card.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(card.company_name.clone()));
    if let Some(location) = &card.location {
        lines.push(Line::from(format!("@ {}", location.label)));
    }
    lines.push(Line::from(""));

    let pay_style = if card.pay.is_some() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    lines.push(Line::from(Span::styled(card.pay_text(), pay_style)));
    if !card.meta.is_empty() {
        let spans: Vec<Span> = card
            .meta
            .iter()
            .enumerate()
            .flat_map(|(i, m)| {
                let sep = (i > 0).then(|| Span::styled(" • ", Style::default().fg(Color::DarkGray)));
                let style = if m.emphasis {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                sep.into_iter().chain(std::iter::once(Span::styled(m.text.clone(), style)))
            })
            .collect();
        lines.push(Line::from(spans));
    }

    if !card.tags.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Tags", Style::default().fg(Color::Cyan))));
        for line in textwrap::fill(&card.tags.join(", "), 70).lines() {
            lines.push(Line::from(format!("  {}", line)));
        }
    }

    lines.push(Line::from(""));
    let link_style = Style::default().fg(Color::DarkGray);
    if let Some(url) = &card.opening_url {
        lines.push(Line::from(Span::styled(format!("Opening: {}", url), link_style)));
    }
    if let Some(url) = &card.company_url {
        lines.push(Line::from(Span::styled(format!("Company: {}", url), link_style)));
    }
    if let Some(url) = card.location.as_ref().and_then(|l| l.map_url.as_ref()) {
        lines.push(Line::from(Span::styled(format!("Map: {}", url), link_style)));
    }

    Text::from(lines)
}

// --- Company directory ---

struct CompanyBrowser {
    board: Board<Company>,
    query: CompanyQuery,
    visible: Vec<Company>,
    selected: usize,
    editing: bool,
}

impl CompanyBrowser {
    fn new() -> Self {
        Self {
            board: Board::new(),
            query: CompanyQuery::default(),
            visible: Vec::new(),
            selected: 0,
            editing: false,
        }
    }

    fn status(&self) -> Status {
        self.board.status(self.visible.len())
    }

    fn apply_load(&mut self, ticket: LoadTicket, outcome: Result<Vec<Company>, LoadError>) {
        if self.board.finish_load(ticket, outcome) != LoadOutcome::Stale {
            self.selected = 0;
            self.refresh();
        }
    }

    fn refresh(&mut self) {
        self.visible = filter::filter_companies(self.board.records(), &self.query)
            .into_iter()
            .cloned()
            .collect();
        if self.selected >= self.visible.len() {
            self.selected = self.visible.len().saturating_sub(1);
        }
    }

    fn sort_by(&mut self, column: CompanyColumn) {
        self.query.sort = self.query.sort.toggle(column);
        self.refresh();
    }

    fn handle_key(&mut self, code: KeyCode, source: &str) -> Action {
        if self.editing {
            match code {
                KeyCode::Enter | KeyCode::Esc => self.editing = false,
                KeyCode::Backspace => {
                    self.query.text.pop();
                    self.refresh();
                }
                KeyCode::Char(c) => {
                    self.query.text.push(c);
                    self.refresh();
                }
                _ => {}
            }
            return Action::None;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.visible.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Char('/') => self.editing = true,
            KeyCode::Char('1') => self.sort_by(CompanyColumn::NameTh),
            KeyCode::Char('2') => self.sort_by(CompanyColumn::NameEn),
            KeyCode::Char('3') => self.sort_by(CompanyColumn::Kind),
            KeyCode::Char('4') => self.sort_by(CompanyColumn::Province),
            KeyCode::Char('r') => return Action::Load(self.board.begin_load(source)),
            _ => {}
        }
        Action::None
    }
}

pub fn run_directory(handle: Handle, source: Arc<dyn DataSource>, settings: &Settings) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut browser = CompanyBrowser::new();

    let load = |ticket: LoadTicket| {
        let source = source.clone();
        let path = ticket.source().to_string();
        let missing_type = settings.missing_type.clone();
        let province = settings.default_province.clone();
        spawn_load(&handle, &tx, ticket, async move {
            loader::load_companies(source.as_ref(), &path, &missing_type, &province).await
        });
    };

    load(browser.board.begin_load(settings.company_file.as_str()));

    with_terminal(|terminal| {
        let mut table_state = TableState::default();
        loop {
            while let Ok((ticket, outcome)) = rx.try_recv() {
                browser.apply_load(ticket, outcome);
            }
            table_state.select((!browser.visible.is_empty()).then_some(browser.selected));
            terminal.draw(|frame| draw_companies(frame, &browser, &mut table_state))?;

            if !event::poll(Duration::from_millis(150))? {
                continue;
            }
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match browser.handle_key(key.code, &settings.company_file) {
                    Action::Quit => break,
                    Action::Load(ticket) => load(ticket),
                    Action::None => {}
                }
            }
        }
        Ok(())
    })
}

fn draw_companies(frame: &mut Frame, browser: &CompanyBrowser, table_state: &mut TableState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let status = browser.status();
    let searching = !browser.query.text.trim().is_empty();
    let search = if browser.editing {
        format!("  /{}_", browser.query.text)
    } else if searching {
        format!("  search: {}", browser.query.text)
    } else {
        String::new()
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(view::company_status_text(&status, searching), status_style(&status)),
        Span::raw(search),
    ]))
    .block(Block::default().borders(Borders::ALL).title(match browser.board.phase() {
        Phase::Idle => " Companies ".to_string(),
        Phase::Loading { source } | Phase::Ready { source } | Phase::Failed { source, .. } => {
            format!(" Companies ({}) ", source)
        }
    }));
    frame.render_widget(header, rows[0]);

    let sort = browser.query.sort;
    let header_row = Row::new(
        CompanyColumn::ALL
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{}.{} {}", i + 1, view::column_label(*c), view::sort_indicator(sort, *c)))
            .chain(std::iter::once("Links".to_string())),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));

    let table_rows: Vec<Row> = browser
        .visible
        .iter()
        .map(CompanyRow::from_company)
        .map(|row| {
            let links: Vec<&str> = [
                row.website.as_ref().map(|_| "Web"),
                row.facebook.as_ref().map(|_| "FB"),
                row.line.as_ref().map(|_| "Line"),
            ]
            .into_iter()
            .flatten()
            .collect();
            Row::new(vec![
                row.name_th,
                row.name_en,
                row.kind,
                row.province,
                links.join(" "),
            ])
        })
        .collect();

    let table = Table::new(
        table_rows,
        [
            Constraint::Percentage(30),
            Constraint::Percentage(25),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
        ],
    )
    .header(header_row)
    .block(Block::default().borders(Borders::ALL))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("> ");
    frame.render_stateful_widget(table, rows[1], table_state);

    let help = if browser.editing {
        " type to search  Enter/Esc:done  Backspace:delete"
    } else {
        " j/k:navigate  /:search  1-4:sort column (again to reverse)  r:reload  q:quit"
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        rows[2],
    );
}
