use crate::entities::{BeanLot, RoastLevel};
use crate::menu::format_currency;
use crate::repository::BeanRepository;
use crate::validation::{Field, FieldError, RawLot};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Add,
    Update,
}

impl FormKind {
    pub fn title(&self) -> &str {
        match self {
            FormKind::Add => " Add Bean Lot ",
            FormKind::Update => " Update Bean Lot ",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormState {
    pub kind: FormKind,
    pub raw: RawLot,
    pub focus: usize,
    pub errors: Vec<FieldError>,
}

impl FormState {
    fn new(kind: FormKind, raw: RawLot) -> Self {
        // the id of an existing lot is fixed, start on the next field
        let focus = if kind == FormKind::Update { 1 } else { 0 };
        FormState {
            kind,
            raw,
            focus,
            errors: Vec::new(),
        }
    }

    pub fn focused_field(&self) -> Field {
        Field::ALL[self.focus]
    }

    fn is_locked(&self, field: Field) -> bool {
        self.kind == FormKind::Update && field == Field::BeanId
    }

    fn next_field(&mut self) {
        self.focus = (self.focus + 1) % Field::ALL.len();
        if self.is_locked(self.focused_field()) {
            self.next_field();
        }
    }

    fn previous_field(&mut self) {
        self.focus = (self.focus + Field::ALL.len() - 1) % Field::ALL.len();
        if self.is_locked(self.focused_field()) {
            self.previous_field();
        }
    }
}

#[derive(Debug, Clone)]
pub enum Mode {
    Browse,
    Form(FormState),
    Import(String),
    ConfirmDelete(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

pub struct App {
    pub lots: Vec<BeanLot>,
    pub total_value: String,
    pub backend: &'static str,
    pub state: TableState,
    pub mode: Mode,
    pub show_detail: bool,
    pub status: Option<(String, StatusKind)>,
}

impl App {
    pub fn new(repo: &dyn BeanRepository) -> Self {
        let mut app = Self {
            lots: Vec::new(),
            total_value: format_currency(rust_decimal::Decimal::ZERO),
            backend: repo.backend_name(),
            state: TableState::default(),
            mode: Mode::Browse,
            show_detail: false,
            status: None,
        };
        app.refresh(repo);
        app
    }

    /// Reload the snapshot and total from the repository
    pub fn refresh(&mut self, repo: &dyn BeanRepository) {
        match repo.find_all() {
            Ok(lots) => self.lots = lots,
            Err(e) => self.set_status(format!("Error loading lots: {}", e), StatusKind::Error),
        }
        self.total_value = match repo.total_inventory_value() {
            Ok(total) => format_currency(total),
            Err(e) => {
                tracing::warn!(error = %e, "total inventory value unavailable");
                "n/a".to_string()
            }
        };

        let selected = match self.state.selected() {
            _ if self.lots.is_empty() => None,
            Some(i) if i >= self.lots.len() => Some(self.lots.len() - 1),
            Some(i) => Some(i),
            None => Some(0),
        };
        self.state.select(selected);
    }

    pub fn selected_lot(&self) -> Option<&BeanLot> {
        self.state.selected().and_then(|i| self.lots.get(i))
    }

    fn set_status(&mut self, message: impl Into<String>, kind: StatusKind) {
        self.status = Some((message.into(), kind));
    }

    /// Apply one key press; returns true when the user quits
    pub fn handle_key(&mut self, repo: &mut dyn BeanRepository, key: KeyEvent) -> bool {
        match std::mem::replace(&mut self.mode, Mode::Browse) {
            Mode::Browse => return self.handle_browse_key(repo, key),
            Mode::Form(form) => self.handle_form_key(repo, form, key),
            Mode::Import(path) => self.handle_import_key(repo, path, key),
            Mode::ConfirmDelete(bean_id) => self.handle_delete_key(repo, bean_id, key),
        }
        false
    }

    fn handle_browse_key(&mut self, repo: &mut dyn BeanRepository, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Enter => self.show_detail = !self.show_detail,
            KeyCode::Char('a') => {
                self.mode = Mode::Form(FormState::new(FormKind::Add, RawLot::default()));
            }
            KeyCode::Char('u') => match self.selected_lot() {
                Some(lot) => {
                    let raw = RawLot::from_lot(lot);
                    self.mode = Mode::Form(FormState::new(FormKind::Update, raw));
                }
                None => self.set_status("No lot selected", StatusKind::Info),
            },
            KeyCode::Char('d') => match self.selected_lot() {
                Some(lot) => self.mode = Mode::ConfirmDelete(lot.bean_id().to_string()),
                None => self.set_status("No lot selected", StatusKind::Info),
            },
            KeyCode::Char('i') => self.mode = Mode::Import(String::new()),
            KeyCode::Char('r') => {
                self.refresh(repo);
                self.set_status("Refreshed", StatusKind::Info);
            }
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home if !self.lots.is_empty() => self.state.select(Some(0)),
            KeyCode::End if !self.lots.is_empty() => self.state.select(Some(self.lots.len() - 1)),
            _ => {}
        }
        false
    }

    fn handle_form_key(
        &mut self,
        repo: &mut dyn BeanRepository,
        mut form: FormState,
        key: KeyEvent,
    ) {
        match key.code {
            KeyCode::Esc => {
                self.set_status("Cancelled", StatusKind::Info);
                return;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => {
                let field = form.focused_field();
                form.raw.get_mut(field).pop();
            }
            KeyCode::Char(' ') if form.focused_field() == Field::RoastLevel => {
                let next = form
                    .raw
                    .roast_level
                    .parse::<RoastLevel>()
                    .map(|level| level.next())
                    .unwrap_or(RoastLevel::Light);
                form.raw.roast_level = next.to_string();
            }
            KeyCode::Char(c) => {
                let field = form.focused_field();
                form.raw.get_mut(field).push(c);
            }
            KeyCode::Enter => {
                if self.submit_form(repo, &mut form) {
                    return;
                }
            }
            _ => {}
        }
        self.mode = Mode::Form(form);
    }

    /// Returns true when the form is finished and should close
    fn submit_form(&mut self, repo: &mut dyn BeanRepository, form: &mut FormState) -> bool {
        let lot = match form.raw.validate() {
            Ok(lot) => lot,
            Err(errors) => {
                if let Some(first) = errors.first() {
                    form.focus = Field::ALL.iter().position(|f| *f == first.field()).unwrap_or(0);
                }
                form.errors = errors;
                self.set_status("Fix the highlighted fields", StatusKind::Error);
                return false;
            }
        };

        let bean_id = lot.bean_id().to_string();
        let outcome = match form.kind {
            FormKind::Add => repo.add(lot),
            FormKind::Update => repo.update(lot),
        };

        match (form.kind, outcome) {
            (FormKind::Add, Ok(true)) => {
                self.set_status(format!("Bean {} added", bean_id), StatusKind::Success)
            }
            (FormKind::Add, Ok(false)) => {
                form.errors.clear();
                self.set_status(format!("Bean ID {} already exists", bean_id), StatusKind::Error);
                return false;
            }
            (FormKind::Update, Ok(true)) => {
                self.set_status(format!("Bean {} updated", bean_id), StatusKind::Success)
            }
            (FormKind::Update, Ok(false)) => {
                self.set_status(format!("Bean {} no longer exists", bean_id), StatusKind::Error)
            }
            (_, Err(e)) => {
                self.set_status(format!("Error: {}", e), StatusKind::Error);
                return false;
            }
        }

        self.refresh(repo);
        true
    }

    fn handle_import_key(
        &mut self,
        repo: &mut dyn BeanRepository,
        mut path: String,
        key: KeyEvent,
    ) {
        match key.code {
            KeyCode::Esc => {
                self.set_status("Import cancelled", StatusKind::Info);
                return;
            }
            KeyCode::Backspace => {
                path.pop();
            }
            KeyCode::Char(c) => path.push(c),
            KeyCode::Enter => {
                self.import_from_path(repo, path.trim());
                return;
            }
            _ => {}
        }
        self.mode = Mode::Import(path);
    }

    fn import_from_path(&mut self, repo: &mut dyn BeanRepository, path: &str) {
        match repo.import_file_report(Path::new(path)) {
            Ok(report) => {
                let kind = if report.skipped.is_empty() {
                    StatusKind::Success
                } else {
                    StatusKind::Info
                };
                self.set_status(
                    format!(
                        "{} bean(s) imported, {} line(s) skipped",
                        report.imported.len(),
                        report.skipped.len()
                    ),
                    kind,
                );
            }
            Err(e) => self.set_status(format!("Error: {}", e), StatusKind::Error),
        }
        self.refresh(repo);
    }

    fn handle_delete_key(&mut self, repo: &mut dyn BeanRepository, bean_id: String, key: KeyEvent) {
        if !matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
            self.set_status("Delete cancelled", StatusKind::Info);
            return;
        }

        match repo.remove_by_id(&bean_id) {
            Ok(true) => self.set_status(format!("Bean {} removed", bean_id), StatusKind::Success),
            Ok(false) => self.set_status("No bean with that ID", StatusKind::Error),
            Err(e) => self.set_status(format!("Error: {}", e), StatusKind::Error),
        }
        self.refresh(repo);
    }

    pub fn next(&mut self) {
        let len = self.lots.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.lots.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.lots.len();
        if len == 0 {
            return;
        }
        let i = self.state.selected().map(|i| (i + 20).min(len - 1)).unwrap_or(0);
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.lots.is_empty() {
            return;
        }
        let i = self.state.selected().map(|i| i.saturating_sub(20)).unwrap_or(0);
        self.state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App, repo: &mut dyn BeanRepository) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, repo);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    repo: &mut dyn BeanRepository,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle_key(repo, key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Lots
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);

    match &app.mode {
        Mode::Form(form) => render_form(f, form),
        Mode::Import(path) => render_prompt(f, " Batch Import ", "File path: ", path),
        Mode::ConfirmDelete(bean_id) => render_prompt(
            f,
            " Remove Bean Lot ",
            &format!("Remove {}? (y/N) ", bean_id),
            "",
        ),
        Mode::Browse => {}
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let spans = vec![
        Span::styled(
            "Coffee Bean DMS",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(format!("Storage: {}", app.backend), Style::default().fg(Color::DarkGray)),
        Span::raw("  |  "),
        Span::styled(format!("Lots: {}", app.lots.len()), Style::default().fg(Color::White)),
        Span::raw("  |  "),
        Span::styled(
            format!("Total value: {}", app.total_value),
            Style::default().fg(Color::Green),
        ),
    ];

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn roast_color(lot: &BeanLot) -> Color {
    match lot.roast_level() {
        RoastLevel::Light => Color::Yellow,
        RoastLevel::Medium => Color::LightRed,
        RoastLevel::Dark => Color::Magenta,
    }
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = [
        "Bean ID",
        "Origin",
        "Farm",
        "Roast",
        "Roast Date",
        "Qty (kg)",
        "Cost/kg",
        "Notes",
        "Caffeine mg/g",
    ]
    .iter()
    .map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.lots.iter().map(|lot| {
        let cells = vec![
            Cell::from(lot.bean_id().to_string()),
            Cell::from(truncate(lot.origin_country(), 14)),
            Cell::from(truncate(lot.farm_name(), 18)),
            Cell::from(lot.roast_level().as_str()).style(Style::default().fg(roast_color(lot))),
            Cell::from(lot.roast_date().format("%Y-%m-%d").to_string()),
            Cell::from(format!("{:.2}", lot.quantity_kg())),
            Cell::from(format!("${}", lot.cost_per_kg())),
            Cell::from(truncate(lot.flavor_notes(), 24)),
            Cell::from(format!("{:.2}", lot.caffeine_mg_per_g())),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(15),
            Constraint::Length(19),
            Constraint::Length(7),
            Constraint::Length(11),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(25),
            Constraint::Length(13),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Bean Lots "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Lot Details ");

    let Some(lot) = app.selected_lot() else {
        f.render_widget(Paragraph::new("No lot selected").block(block), area);
        return;
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let value = lot
        .value()
        .map(format_currency)
        .unwrap_or_else(|e| e.to_string());

    let content = vec![
        Line::from(""),
        Line::from(vec![Span::styled("  Bean ID: ", label), Span::raw(lot.bean_id())]),
        Line::from(vec![Span::styled("  Origin: ", label), Span::raw(lot.origin_country())]),
        Line::from(vec![Span::styled("  Farm: ", label), Span::raw(lot.farm_name())]),
        Line::from(vec![
            Span::styled("  Roast: ", label),
            Span::styled(lot.roast_level().as_str(), Style::default().fg(roast_color(lot))),
            Span::raw(format!(" ({})", lot.roast_date().format("%Y-%m-%d"))),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Quantity: ", label),
            Span::raw(format!("{:.2} kg", lot.quantity_kg())),
        ]),
        Line::from(vec![
            Span::styled("  Cost: ", label),
            Span::raw(format!("${}/kg", lot.cost_per_kg())),
        ]),
        Line::from(vec![
            Span::styled("  Lot value: ", label),
            Span::styled(value, Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![
            Span::styled("  Caffeine: ", label),
            Span::raw(format!("{:.2} mg/g", lot.caffeine_mg_per_g())),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  FLAVOR NOTES",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )]),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(
                wrap_text(lot.flavor_notes(), 30),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ]),
    ];

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn render_form(f: &mut Frame, form: &FormState) {
    let area = centered_rect(60, 16, f.size());
    f.render_widget(Clear, area);

    let mut lines = vec![Line::from("")];
    for (i, field) in Field::ALL.iter().enumerate() {
        let focused = i == form.focus;
        let has_error = form.errors.iter().any(|e| e.field() == *field);

        let label_style = if has_error {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };

        let mut value = form.raw.get(*field).to_string();
        if focused {
            value.push('▏');
        }
        let value_style = if form.is_locked(*field) {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::White)
        };

        lines.push(Line::from(vec![
            Span::styled(if focused { " → " } else { "   " }, label_style),
            Span::styled(format!("{:<34}", field.label()), label_style),
            Span::styled(value, value_style),
        ]));
    }

    lines.push(Line::from(""));
    for error in &form.errors {
        lines.push(Line::from(Span::styled(
            format!("   {}", error),
            Style::default().fg(Color::Red),
        )));
    }

    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(form.kind.title()),
    );
    f.render_widget(popup, area);
}

fn render_prompt(f: &mut Frame, title: &str, label: &str, input: &str) {
    let area = centered_rect(50, 3, f.size());
    f.render_widget(Clear, area);

    let line = Line::from(vec![
        Span::styled(label.to_string(), Style::default().fg(Color::Cyan)),
        Span::raw(format!("{}▏", input)),
    ]);
    let prompt = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title.to_string()),
    );
    f.render_widget(prompt, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, app.lots.len()),
        Style::default().fg(Color::Cyan),
    )];

    if let Some((message, kind)) = &app.status {
        let color = match kind {
            StatusKind::Info => Color::White,
            StatusKind::Success => Color::Green,
            StatusKind::Error => Color::Red,
        };
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(message.clone(), Style::default().fg(color)));
    }

    let hints: &[(&str, &str)] = match app.mode {
        Mode::Form(_) => &[
            ("Tab", " Next"),
            ("Space", " Cycle roast"),
            ("Enter", " Save"),
            ("Esc", " Cancel"),
        ],
        Mode::Import(_) => &[("Enter", " Import"), ("Esc", " Cancel")],
        Mode::ConfirmDelete(_) => &[("y", " Confirm"), ("any", " Cancel")],
        Mode::Browse => &[
            ("a", " Add"),
            ("u", " Update"),
            ("d", " Delete"),
            ("i", " Import"),
            ("Enter", " Details"),
            ("q", " Quit"),
        ],
    };
    for (key, action) in hints {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(*action));
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let width = r.width * percent_x / 100;
    let height = height.min(r.height);
    Rect {
        x: r.x + (r.width.saturating_sub(width)) / 2,
        y: r.y + (r.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len - 3).collect();
        format!("{}...", cut)
    }
}

fn wrap_text(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if !current_line.is_empty() && current_line.len() + word.len() + 1 > width {
            if !result.is_empty() {
                result.push_str("\n  ");
            }
            result.push_str(&current_line);
            current_line.clear();
        }
        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }

    if !current_line.is_empty() {
        if !result.is_empty() {
            result.push_str("\n  ");
        }
        result.push_str(&current_line);
    }

    result
}
