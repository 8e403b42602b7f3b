use std::cell::Cell;
use std::cell::RefCell;
use std::io;
use std::panic;
use std::rc::Rc;
use std::sync::mpsc::Receiver;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use crossterm::event;
use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use crossterm::execute;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::Backend;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Constraint;
use ratatui::layout::Direction;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Tabs;
use ratatui::widgets::Wrap;
use ratatui::Frame;
use ratatui::Terminal;
use tern_bridge::event_for;
use tern_bridge::FeedUpdate;
use tern_core::bind_exit;
use tern_core::bind_store;
use tern_core::neighbour_key;
use tern_core::panic_message;
use tern_core::sanitize_text;
use tern_core::Binding;
use tern_core::ConfirmationDecision;
use tern_core::EventBus;
use tern_core::MessageStore;
use tern_core::MultiBinding;
use tern_core::Store;
use tern_core::Transcript;
use tern_core::UiAction;
use tern_core::UiConfig;
use tern_core::UiEvent;
use tern_core::UiState;
use tern_core::UiTheme;
use tern_core::ViewType;
use tracing::debug;
use tracing::error;
use tracing::warn;

use crate::blocks::BlockContext;
use crate::stream::render_stream;
use crate::stream::respond;
use crate::stream::visible_capacity;
use crate::stream::StreamViewport;
use crate::theme::agent_glyph;
use crate::theme::palette_for;
use crate::theme::step_glyph;
use crate::theme::UiPalette;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

struct TuiGuard {
    restore_panic_hook: Option<Box<dyn FnOnce()>>,
}

impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
        if let Some(restore) = self.restore_panic_hook.take() {
            restore();
        }
    }
}

/// Sends panic reports to the log instead of stderr, which the alternate
/// screen owns. The returned closure puts the previous hook back.
fn route_panics_to_log() -> impl FnOnce() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(|info| {
        error!(
            panic = %sanitize_text(&panic_message(info.payload())),
            "panic while the terminal ui was active"
        );
    }));
    move || {
        // set_hook is not allowed from a panicking thread
        if !thread::panicking() {
            panic::set_hook(previous);
        }
    }
}

pub struct App {
    bus: EventBus,
    store: Rc<RefCell<Store>>,
    transcript: Transcript,
    viewport: StreamViewport,
    theme: UiTheme,
    config: UiConfig,
    exit_requested: Rc<Cell<bool>>,
    tick: usize,
    _store_binding: MultiBinding,
    _exit_binding: Binding,
}

impl App {
    pub fn new(config: UiConfig) -> Self {
        let bus = EventBus::new();
        let store = Rc::new(RefCell::new(Store::default()));
        let store_binding = bind_store(&bus, &store);
        let exit_requested = Rc::new(Cell::new(false));
        let flag = Rc::clone(&exit_requested);
        let exit_binding = bind_exit(&bus, Some(Box::new(move || flag.set(true))));
        Self {
            bus,
            store,
            transcript: Transcript::new(),
            viewport: StreamViewport::new(config.auto_scroll),
            theme: config.theme,
            config,
            exit_requested,
            tick: 0,
            _store_binding: store_binding,
            _exit_binding: exit_binding,
        }
    }

    pub fn should_exit(&self) -> bool {
        self.exit_requested.get()
    }

    pub fn theme(&self) -> UiTheme {
        self.theme
    }

    pub fn state(&self) -> UiState {
        self.store.borrow().snapshot().as_ref().clone()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    fn dispatch(&self, action: UiAction) {
        self.store.borrow_mut().dispatch(action);
    }

    pub fn apply_update(&mut self, update: FeedUpdate) {
        match update {
            FeedUpdate::Message(message) => {
                self.transcript.push(message);
                self.viewport.sync(self.transcript.messages().len());
            }
            FeedUpdate::Loading(loading) => self.dispatch(UiAction::SetLoading { loading }),
            other => {
                if let Some(event) = event_for(&other, Utc::now()) {
                    self.bus.publish(event);
                }
            }
        }
    }

    fn current_view(&self) -> ViewType {
        self.store.borrow().state().current_view
    }

    fn select_agent(&self, forward: bool) {
        let next = {
            let store = self.store.borrow();
            let state = store.state();
            neighbour_key(
                state.agents.keys(),
                state.selected_agent_id.as_deref(),
                forward,
            )
        };
        if next.is_some() {
            self.dispatch(UiAction::SelectAgent { id: next });
        }
    }

    fn select_workflow(&self, forward: bool) {
        let next = {
            let store = self.store.borrow();
            let state = store.state();
            neighbour_key(
                state.workflows.keys(),
                state.selected_workflow_id.as_deref(),
                forward,
            )
        };
        if next.is_some() {
            self.dispatch(UiAction::SelectWorkflow { id: next });
        }
    }

    fn resolve_confirmation(&mut self, decision: ConfirmationDecision) {
        match respond(&mut self.transcript, decision) {
            Ok(Some(id)) => debug!(confirmation = %id, "resolved from keyboard"),
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "confirmation could not be resolved");
                self.bus.publish(UiEvent::ErrorRaised(err.to_string()));
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.bus.publish(UiEvent::Exit);
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.bus.publish(UiEvent::Exit),
            KeyCode::Tab => self
                .bus
                .publish(UiEvent::ViewChanged(self.current_view().next())),
            KeyCode::BackTab => self
                .bus
                .publish(UiEvent::ViewChanged(self.current_view().prev())),
            KeyCode::Char(c @ '1'..='3') => {
                let index = usize::from(c as u8 - b'1');
                self.bus.publish(UiEvent::ViewChanged(ViewType::ALL[index]));
            }
            KeyCode::Char('a') => {
                let enabled = !self.viewport.auto_scroll();
                self.viewport.set_auto_scroll(enabled);
                self.viewport.sync(self.transcript.messages().len());
            }
            KeyCode::Char('y') => self.resolve_confirmation(ConfirmationDecision::Accept),
            KeyCode::Char('n') => self.resolve_confirmation(ConfirmationDecision::Decline),
            KeyCode::Char('t') => self.theme = self.theme.next(),
            KeyCode::Char('c') => self.dispatch(UiAction::ClearError),
            KeyCode::Char('L') => self.dispatch(UiAction::ClearLogs),
            KeyCode::Down => self.select_agent(true),
            KeyCode::Up => self.select_agent(false),
            KeyCode::Char(']') => self.select_workflow(true),
            KeyCode::Char('[') => self.select_workflow(false),
            _ => {}
        }
    }

    fn advance_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.tick % SPINNER_FRAMES.len()]
    }
}

pub fn run(mut app: App, updates: Receiver<FeedUpdate>) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, crossterm::cursor::Hide)?;
    let _guard = TuiGuard {
        restore_panic_hook: Some(Box::new(route_panics_to_log())),
    };

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    run_app(&mut terminal, &mut app, &updates).map_err(|e| e.into())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    updates: &Receiver<FeedUpdate>,
) -> io::Result<()> {
    loop {
        while let Ok(update) = updates.try_recv() {
            app.apply_update(update);
        }
        app.advance_tick();
        terminal.draw(|f| draw(f, app))?;

        if event::poll(Duration::from_millis(80))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }
        if app.should_exit() {
            return Ok(());
        }
    }
}

pub fn draw(f: &mut Frame, app: &App) {
    let palette = palette_for(app.theme);
    let store = app.store.borrow();
    let state = store.state();
    let banner_h = if state.error.is_some() { 1 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(banner_h),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, chunks[0], app, state, palette);
    if let Some(error) = state.error.as_deref() {
        let banner = Paragraph::new(Line::from(vec![
            Span::styled(
                " ✗ ",
                Style::default()
                    .fg(palette.danger)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(error.to_string(), Style::default().fg(palette.danger)),
            Span::styled("  (c to dismiss)", palette.muted()),
        ]));
        f.render_widget(banner, chunks[1]);
    }
    match state.current_view {
        ViewType::Chat => render_chat(f, chunks[2], app, palette),
        ViewType::Dashboard => render_dashboard(f, chunks[2], state, palette),
        ViewType::Logs => render_logs(f, chunks[2], state, app.config.log_tail, palette),
    }
    render_footer(f, chunks[3], app, state, palette);
}

fn render_header(f: &mut Frame, area: Rect, app: &App, state: &UiState, palette: UiPalette) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(34)])
        .split(area);

    let selected = ViewType::ALL
        .iter()
        .position(|view| *view == state.current_view)
        .unwrap_or(0);
    let titles: Vec<Line> = ViewType::ALL
        .iter()
        .enumerate()
        .map(|(index, view)| Line::from(format!("{} {}", index + 1, view.label())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(selected)
        .style(palette.muted())
        .highlight_style(
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border))
                .title(" tern "),
        );
    f.render_widget(tabs, columns[0]);

    let activity = if state.is_loading {
        format!("{} working", app.spinner())
    } else {
        "idle".to_string()
    };
    let status = Paragraph::new(Line::from(vec![
        Span::styled(activity, palette.accent()),
        Span::styled(
            format!(" | agents {}/{}", state.active_agent_count(), state.agents.len()),
            palette.muted(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title(format!(" {} ", app.theme.label())),
    );
    f.render_widget(status, columns[1]);
}

fn bottom_scroll(lines: usize, rows: u16) -> u16 {
    u16::try_from(lines.saturating_sub(usize::from(rows))).unwrap_or(u16::MAX)
}

fn render_chat(f: &mut Frame, area: Rect, app: &App, palette: UiPalette) {
    let messages = app.transcript.messages();
    let inner_rows = usize::from(area.height.saturating_sub(2));
    let min = app.config.min_visible_messages.max(1);
    let ctx = BlockContext {
        palette,
        theme: app.theme,
        show_commands: app.config.show_commands,
        show_parameters: app.config.show_parameters,
        width: area.width.saturating_sub(6),
        highlight: true,
    };

    let (mut lines, older) = if messages.is_empty() {
        (
            vec![Line::from(Span::styled("No messages yet.", palette.muted()))],
            0,
        )
    } else {
        // Shrink the window until the rendered messages fit the pane.
        let mut capacity = visible_capacity(inner_rows, min);
        loop {
            let window = app.viewport.window(messages.len(), capacity);
            let lines = render_stream(messages, window, &ctx);
            if lines.len() <= inner_rows || capacity <= min {
                break (lines, window.older());
            }
            capacity -= 1;
        }
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(" Chat ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    // The older-messages indicator stays pinned while the body scrolls.
    let body_area = if older > 0 && !lines.is_empty() && inner.height > 1 {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(inner);
        let indicator = lines.remove(0);
        f.render_widget(Paragraph::new(indicator), rows[0]);
        rows[1]
    } else {
        inner
    };
    let scroll = bottom_scroll(lines.len(), body_area.height);
    f.render_widget(Paragraph::new(lines).scroll((scroll, 0)), body_area);
}

fn render_dashboard(f: &mut Frame, area: Rect, state: &UiState, palette: UiPalette) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let mut agent_lines = Vec::new();
    for agent in state.agents.values() {
        let selected = state.selected_agent_id.as_deref() == Some(agent.id.as_str());
        let row_style = if selected {
            Style::default()
                .bg(palette.selected_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        agent_lines.push(
            Line::from(vec![
                Span::styled(
                    format!("{} ", agent_glyph(agent.status)),
                    palette.agent_status(agent.status),
                ),
                Span::raw(agent.name.clone()),
                Span::styled(format!("  {}", agent.status.label()), palette.muted()),
            ])
            .style(row_style),
        );
        if selected {
            for (key, value) in &agent.metadata {
                agent_lines.push(Line::from(Span::styled(
                    format!("    {key}: {value}"),
                    palette.muted(),
                )));
            }
        }
    }
    if agent_lines.is_empty() {
        agent_lines.push(Line::from(Span::styled("No agents.", palette.muted())));
    }
    let agents = Paragraph::new(agent_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title(" Agents (↑/↓) "),
    );
    f.render_widget(agents, columns[0]);

    let mut workflow_lines = Vec::new();
    for workflow in state.workflows.values() {
        let selected = state.selected_workflow_id.as_deref() == Some(workflow.id.as_str());
        let row_style = if selected {
            Style::default()
                .bg(palette.selected_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        workflow_lines.push(
            Line::from(vec![
                Span::raw(workflow.name.clone()),
                Span::styled(
                    format!("  {}", workflow.status.label()),
                    palette.workflow_status(workflow.status),
                ),
                Span::styled(
                    format!("  {}/{}", workflow.completed_steps(), workflow.steps.len()),
                    palette.muted(),
                ),
            ])
            .style(row_style),
        );
        if selected {
            for step in &workflow.steps {
                workflow_lines.push(Line::from(vec![
                    Span::styled(
                        format!("    {} ", step_glyph(step.status)),
                        palette.step_status(step.status),
                    ),
                    Span::raw(step.name.clone()),
                ]));
            }
        }
    }
    if workflow_lines.is_empty() {
        workflow_lines.push(Line::from(Span::styled("No workflows.", palette.muted())));
    }
    let workflows = Paragraph::new(workflow_lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border))
                .title(" Workflows ([/]) "),
        );
    f.render_widget(workflows, columns[1]);
}

fn render_logs(f: &mut Frame, area: Rect, state: &UiState, tail: usize, palette: UiPalette) {
    let lines: Vec<Line> = state
        .log_tail(tail)
        .iter()
        .map(|entry| {
            let mut spans = vec![
                Span::styled(
                    entry.timestamp.format("%H:%M:%S%.3f ").to_string(),
                    palette.muted(),
                ),
                Span::styled(
                    format!("{:<5} ", entry.level.label()),
                    palette.log_level(entry.level),
                ),
            ];
            if let Some(source) = entry.source.as_deref() {
                spans.push(Span::styled(format!("{source}: "), palette.muted()));
            }
            spans.push(Span::raw(entry.message.clone()));
            Line::from(spans)
        })
        .collect();
    let scroll = bottom_scroll(lines.len(), area.height.saturating_sub(2));
    let logs = Paragraph::new(lines).scroll((scroll, 0)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title(format!(" Logs ({}) ", state.logs.len())),
    );
    f.render_widget(logs, area);
}

fn render_footer(f: &mut Frame, area: Rect, app: &App, state: &UiState, palette: UiPalette) {
    let hints = match state.current_view {
        ViewType::Chat => "y/n confirm  a auto-scroll",
        ViewType::Dashboard => "↑/↓ agent  [/] workflow",
        ViewType::Logs => "L clear logs",
    };
    let scroll = if app.viewport.auto_scroll() {
        "auto-scroll on"
    } else {
        "auto-scroll off"
    };
    let footer = Paragraph::new(Line::from(vec![
        Span::styled(format!(" {hints}"), palette.accent()),
        Span::styled(
            format!("  tab view  t theme  q quit  | {scroll}"),
            palette.muted(),
        ),
    ]));
    f.render_widget(footer, area);
}
