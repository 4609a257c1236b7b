use anyhow::Result;
use std::{io::stdout, time::Duration};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::info;
use crate::{
    app::{Command, Message, Screen, Session, MENU_ITEMS},
    repository::ProjectRepository,
    utils,
    worker::Worker,
};
use crossterm::{
    cursor,
    execute,
    terminal,
    event::{self, Event},
};
use ratatui::{
    Frame,
    Terminal,
    backend::Backend,
    backend::CrosstermBackend,
    style::{Color as RatauiColor, Modifier, Style},
    text::{Span, Spans},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const COMPACT_HEIGHT: u16 = 20;

pub struct InteractiveUI {
    session: Session,
    worker: Worker,
    receiver: UnboundedReceiver<Message>,
    tick: usize,
}

impl InteractiveUI {
    pub fn new(session: Session, repository: ProjectRepository) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            session,
            worker: Worker::new(repository, sender),
            receiver,
            tick: 0,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let backend = CrosstermBackend::new(stdout());
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_interactive_loop(&mut terminal).await;

        execute!(terminal.backend_mut(), terminal::LeaveAlternateScreen, cursor::Show)?;
        terminal::disable_raw_mode()?;

        result
    }

    async fn run_interactive_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let (width, height) = terminal::size()?;
        self.session.update(Message::Resize { width, height });

        if let Some(command) = self.session.start() {
            self.dispatch(command);
        }

        loop {
            terminal.draw(|f| draw_ui(f, &self.session, self.tick))?;

            while let Ok(message) = self.receiver.try_recv() {
                if let ControlFlow::Exit = self.fold(message) {
                    return Ok(());
                }
            }

            if event::poll(Duration::from_millis(100))? {
                let message = match event::read()? {
                    Event::Key(key_event) => Some(Message::Key(key_event)),
                    Event::Resize(width, height) => Some(Message::Resize { width, height }),
                    _ => None,
                };

                if let Some(message) = message {
                    if let ControlFlow::Exit = self.fold(message) {
                        return Ok(());
                    }
                }
            }

            self.tick = self.tick.wrapping_add(1);
        }
    }

    fn fold(&mut self, message: Message) -> ControlFlow {
        match self.session.update(message) {
            Some(command) => self.dispatch(command),
            None => ControlFlow::Continue,
        }
    }

    fn dispatch(&mut self, command: Command) -> ControlFlow {
        if command == Command::Quit {
            info!("quit requested");
            return ControlFlow::Exit;
        }

        self.worker.launch(command);
        ControlFlow::Continue
    }
}

enum ControlFlow {
    Continue,
    Exit,
}

/// Render one frame. Reads the session, never changes it.
pub fn draw_ui<B: Backend>(f: &mut Frame<B>, session: &Session, tick: usize) {
    let size = f.size();
    let (_, height) = session.terminal_size();
    let header_height = if height != 0 && height < COMPACT_HEIGHT { 1 } else { 3 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(header_height),
            Constraint::Min(5),
            Constraint::Length(6),
        ])
        .split(size);

    draw_header(f, chunks[0], session);

    match session.screen() {
        Screen::FirstRunSetup => draw_first_run(f, chunks[1], session),
        Screen::MainMenu { .. } => draw_main_menu(f, chunks[1], session),
        Screen::ProjectList { .. } => draw_project_list(f, chunks[1], session),
        Screen::ProjectDetail => draw_project_detail(f, chunks[1], session),
        Screen::NewProjectInput { .. } => draw_new_project(f, chunks[1], session, tick),
    }

    draw_footer(f, chunks[2], session, tick);
}

fn title_style() -> Style {
    Style::default().fg(RatauiColor::Cyan).add_modifier(Modifier::BOLD)
}

fn selected_style() -> Style {
    Style::default()
        .fg(RatauiColor::Black)
        .bg(RatauiColor::Cyan)
        .add_modifier(Modifier::BOLD)
}

fn draw_header<B: Backend>(f: &mut Frame<B>, area: Rect, session: &Session) {
    let subtitle = match session.screen() {
        Screen::FirstRunSetup => "First Time Setup".to_string(),
        _ => format!(
            "{}  (tool: {})",
            utils::display_path(session.root()),
            session.config().tool
        ),
    };

    let mut lines = vec![Spans::from(Span::styled(
        "TUV - Terminal UV Environment Manager",
        title_style(),
    ))];
    if area.height > 1 {
        lines.push(Spans::from(Span::styled(
            subtitle,
            Style::default().fg(RatauiColor::DarkGray),
        )));
    }

    let header = Paragraph::new(lines).alignment(Alignment::Center);
    f.render_widget(header, area);
}

fn draw_text_input<B: Backend>(f: &mut Frame<B>, area: Rect, title: &str, session: &Session) {
    let input = session.input();
    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    let offset = input.cursor().saturating_sub(inner_width - 1);
    let visible: String = input.value().chars().skip(offset).take(inner_width).collect();

    let widget = Paragraph::new(visible)
        .style(Style::default().fg(RatauiColor::White))
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    f.render_widget(widget, area);

    f.set_cursor(area.x + 1 + (input.cursor() - offset) as u16, area.y + 1);
}

fn draw_first_run<B: Backend>(f: &mut Frame<B>, area: Rect, session: &Session) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let welcome = Paragraph::new(vec![
        Spans::from(Span::styled("Welcome to TUV!", title_style())),
        Spans::from(""),
        Spans::from("This appears to be your first time running TUV."),
        Spans::from("Please configure the parent directory where your Python projects are located."),
    ])
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).title("Setup"));
    f.render_widget(welcome, chunks[0]);

    draw_text_input(f, chunks[1], "Parent Directory", session);
}

fn draw_main_menu<B: Backend>(f: &mut Frame<B>, area: Rect, session: &Session) {
    let items: Vec<ListItem> = MENU_ITEMS
        .iter()
        .map(|item| ListItem::new(item.to_string()))
        .collect();

    let mut state = ListState::default();
    state.select(Some(session.selected_menu_item()));

    let menu = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Menu"))
        .highlight_style(selected_style())
        .highlight_symbol("> ");

    f.render_stateful_widget(menu, area, &mut state);
}

fn draw_project_list<B: Backend>(f: &mut Frame<B>, area: Rect, session: &Session) {
    let projects = session.projects();

    if projects.is_empty() {
        let empty = Paragraph::new(
            "No uv projects found.\n\nPress 's' to rescan for projects or 'Esc' to go back to the main menu.",
        )
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("UV Projects"));
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = projects
        .iter()
        .map(|p| {
            let last_mod = p
                .days_since_modified()
                .map(|days| match days {
                    0 => "Today".to_string(),
                    1 => "1 day ago".to_string(),
                    days => format!("{} days ago", days),
                })
                .unwrap_or_else(|| "Unknown".to_string());

            ListItem::new(format!(
                "{:<30} {:>12}   {:<10} {}",
                utils::truncate_string(&p.name, 30),
                p.format_size(),
                p.python_version,
                last_mod
            ))
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(session.selected_project_index()));

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Found {} uv projects", projects.len())),
        )
        .highlight_style(selected_style())
        .highlight_symbol("> ");

    f.render_stateful_widget(list, area, &mut state);
}

fn draw_project_detail<B: Backend>(f: &mut Frame<B>, area: Rect, session: &Session) {
    let Some(project) = session.selected_project() else {
        return;
    };

    let label = Style::default().fg(RatauiColor::Yellow).add_modifier(Modifier::BOLD);
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };
    let row = |name: &'static str, value: String| {
        Spans::from(vec![Span::styled(format!("{:<16}", name), label), Span::raw(value)])
    };

    let lines = vec![
        row("Name:", project.name.clone()),
        row("Last Modified:", project.format_modified()),
        row("Python Version:", project.python_version.clone()),
        row("Size:", project.format_size()),
        row("Virtualenv:", yes_no(project.has_venv).to_string()),
        row("Lock file:", yes_no(project.has_lock).to_string()),
        row("Path:", project.path.display().to_string()),
    ];

    let details = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(project.name.clone()));
    f.render_widget(details, area);
}

fn draw_new_project<B: Backend>(f: &mut Frame<B>, area: Rect, session: &Session, tick: usize) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    if let Some(label) = session.pending_label() {
        let busy = Paragraph::new(format!("{} {}", spinner(tick), label))
            .block(Block::default().borders(Borders::ALL).title("Create New UV Project"));
        f.render_widget(busy, area);
        return;
    }

    let prompt = Paragraph::new(Spans::from(Span::styled(
        "Enter the name for your new UV project:",
        title_style(),
    )));
    f.render_widget(prompt, chunks[0]);

    draw_text_input(f, chunks[1], "Project Name", session);
}

fn draw_footer<B: Backend>(f: &mut Frame<B>, area: Rect, session: &Session, tick: usize) {
    let mut lines = Vec::new();

    if let Some(label) = session.pending_label() {
        lines.push(Spans::from(format!("{} {}", spinner(tick), label)));
    } else if let Some(status) = session.last_status() {
        lines.push(Spans::from(Span::styled(
            status.to_string(),
            Style::default().fg(RatauiColor::Green),
        )));
    }

    if let Some(error) = session.last_error() {
        let error_style = Style::default().fg(RatauiColor::Red);
        for (i, line) in error.lines().enumerate() {
            let text = if i == 0 { format!("Error: {}", line) } else { line.to_string() };
            lines.push(Spans::from(Span::styled(text, error_style)));
        }
    }

    lines.push(Spans::from(Span::styled(
        help_text(session),
        Style::default().fg(RatauiColor::DarkGray),
    )));

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Status"));

    f.render_widget(paragraph, area);
}

fn help_text(session: &Session) -> &'static str {
    if session.pending().is_some() {
        return "working... | ctrl+c: quit";
    }

    match session.screen() {
        Screen::FirstRunSetup => "enter: save configuration | ctrl+c: quit",
        Screen::MainMenu { .. } => "↑↓/jk: navigate | enter: select | s: rescan | q: quit",
        Screen::ProjectList { .. } => "↑↓/jk: navigate | enter: details | s: rescan | esc: back | q: quit",
        Screen::ProjectDetail => "esc: back | q: quit",
        Screen::NewProjectInput { .. } => "enter: create project | esc: back | ctrl+c: quit",
    }
}

fn spinner(tick: usize) -> &'static str {
    SPINNER_FRAMES[tick % SPINNER_FRAMES.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use tempfile::tempdir;

    fn frame_text(session: &Session) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw_ui(f, session, 0)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(&buffer.get(x, y).symbol);
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_main_menu_frame() {
        let temp_dir = tempdir().unwrap();
        let mut config = Config::with_defaults(temp_dir.path().join("config.toml"));
        config.parent_directory = temp_dir.path().to_path_buf();
        let mut session = Session::new(config, false);
        session.start();

        let text = frame_text(&session);
        assert!(text.contains("List projects"));
        assert!(text.contains("Scanning for uv projects..."));
    }

    #[test]
    fn test_first_run_frame() {
        let temp_dir = tempdir().unwrap();
        let config = Config::with_defaults(temp_dir.path().join("config.toml"));
        let mut session = Session::new(config, true);
        session.update(Message::Key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE)));

        let text = frame_text(&session);
        assert!(text.contains("Welcome to TUV!"));
        assert!(text.contains("Parent Directory"));
    }

    #[test]
    fn test_help_follows_pending_task() {
        let temp_dir = tempdir().unwrap();
        let mut config = Config::with_defaults(temp_dir.path().join("config.toml"));
        config.parent_directory = temp_dir.path().to_path_buf();
        let mut session = Session::new(config, false);
        assert!(help_text(&session).contains("rescan"));

        session.start();
        assert_eq!(help_text(&session), "working... | ctrl+c: quit");
        assert_eq!(spinner(0), spinner(SPINNER_FRAMES.len()));
    }
}
