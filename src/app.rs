//! Session state and the fold that drives it.
//!
//! Every input (keys, resizes, worker results) enters through
//! [`Session::update`]. The fold never blocks; slow work is returned as a
//! [`Command`] for the host loop to hand to the worker, and its result comes
//! back later as a [`Message`].

use std::path::{Path, PathBuf};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, info, warn};
use crate::{
    config::{self, Config},
    error::RepositoryError,
    input::TextInput,
    project::Project,
    repository::validate_name,
};

pub const MENU_ITEMS: [&str; 3] = ["List projects", "New project", "Quit"];

const MENU_LIST_PROJECTS: usize = 0;
const MENU_NEW_PROJECT: usize = 1;
const MENU_QUIT: usize = 2;

/// The one in-flight background task a session may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOperation {
    Scanning,
    Provisioning,
}

/// Current screen. A pending task only exists on the screens that can own one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    FirstRunSetup,
    MainMenu { scanning: bool },
    ProjectList { scanning: bool },
    ProjectDetail,
    NewProjectInput { provisioning: Option<String> },
}

impl Screen {
    pub fn pending(&self) -> Option<PendingOperation> {
        match self {
            Screen::MainMenu { scanning: true } | Screen::ProjectList { scanning: true } => {
                Some(PendingOperation::Scanning)
            }
            Screen::NewProjectInput { provisioning: Some(_) } => Some(PendingOperation::Provisioning),
            _ => None,
        }
    }

    fn is_text_entry(&self) -> bool {
        matches!(self, Screen::FirstRunSetup | Screen::NewProjectInput { .. })
    }

    fn settled(&self) -> Screen {
        match self {
            Screen::MainMenu { .. } => Screen::MainMenu { scanning: false },
            Screen::ProjectList { .. } => Screen::ProjectList { scanning: false },
            Screen::NewProjectInput { .. } => Screen::NewProjectInput { provisioning: None },
            other => other.clone(),
        }
    }
}

/// Everything that can be folded into a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Key(KeyEvent),
    Resize { width: u16, height: u16 },
    Scanned(Vec<Project>),
    Created { projects: Vec<Project>, name: String },
    Failed(String),
}

/// Work the host loop must carry out on the session's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Scan { root: PathBuf },
    Create { root: PathBuf, name: String },
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Up,
    Down,
    Select,
    Back,
    Rescan,
    Quit,
    Edit(KeyCode),
    Ignore,
}

fn action_for(key: &KeyEvent, text_entry: bool) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Action::Quit,
            _ => Action::Ignore,
        };
    }

    match key.code {
        KeyCode::Up => Action::Up,
        KeyCode::Down => Action::Down,
        KeyCode::Enter => Action::Select,
        KeyCode::Esc => Action::Back,
        code if text_entry => Action::Edit(code),
        KeyCode::Char('k') => Action::Up,
        KeyCode::Char('j') => Action::Down,
        KeyCode::Char('s') | KeyCode::Char('r') => Action::Rescan,
        KeyCode::Char('q') => Action::Quit,
        _ => Action::Ignore,
    }
}

pub struct Session {
    screen: Screen,
    config: Config,
    fallback_root: Result<PathBuf, String>,
    projects: Vec<Project>,
    selected_menu_item: usize,
    selected_project: usize,
    input: TextInput,
    last_error: Option<String>,
    last_status: Option<String>,
    terminal_size: (u16, u16),
}

impl Session {
    pub fn new(config: Config, first_run: bool) -> Self {
        let mut session = Self {
            screen: Screen::MainMenu { scanning: false },
            config,
            fallback_root: config::default_root().map_err(|e| e.to_string()),
            projects: Vec::new(),
            selected_menu_item: 0,
            selected_project: 0,
            input: TextInput::default(),
            last_error: None,
            last_status: None,
            terminal_size: (0, 0),
        };

        if first_run {
            let suggestion = match &session.fallback_root {
                Ok(root) => root.display().to_string(),
                Err(_) => session.config.parent_directory.display().to_string(),
            };
            session.input.reset(suggestion);
            session.screen = Screen::FirstRunSetup;
        }

        session
    }

    #[cfg(test)]
    fn with_fallback_root(mut self, root: PathBuf) -> Self {
        self.fallback_root = Ok(root);
        self
    }

    /// Initial scan for a configured session; nothing during first run setup.
    pub fn start(&mut self) -> Option<Command> {
        match self.screen {
            Screen::MainMenu { .. } => self.launch_scan(),
            _ => None,
        }
    }

    pub fn update(&mut self, message: Message) -> Option<Command> {
        match message {
            Message::Key(key) => self.handle_key(key),
            Message::Resize { width, height } => {
                self.terminal_size = (width, height);
                None
            }
            Message::Scanned(projects) => {
                self.finish_scan(projects);
                None
            }
            Message::Created { projects, name } => {
                self.finish_create(projects, name);
                None
            }
            Message::Failed(error) => {
                warn!(%error, "background task failed");
                self.screen = self.screen.settled();
                self.last_error = Some(error);
                None
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.kind == KeyEventKind::Release {
            return None;
        }

        let action = action_for(&key, self.screen.is_text_entry());
        if action == Action::Quit {
            return Some(Command::Quit);
        }
        if self.screen.pending().is_some() {
            return None;
        }

        match self.screen {
            Screen::FirstRunSetup => match action {
                Action::Select => self.submit_root(),
                Action::Edit(code) => {
                    self.input.edit(code);
                    None
                }
                _ => None,
            },
            Screen::MainMenu { .. } => match action {
                Action::Up => {
                    self.selected_menu_item = self.selected_menu_item.saturating_sub(1);
                    None
                }
                Action::Down => {
                    self.selected_menu_item = step_down(self.selected_menu_item, MENU_ITEMS.len());
                    None
                }
                Action::Select => self.select_menu_item(),
                Action::Rescan => self.launch_scan(),
                _ => None,
            },
            Screen::ProjectList { .. } => match action {
                Action::Up => {
                    self.selected_project = self.selected_project.saturating_sub(1);
                    None
                }
                Action::Down => {
                    self.selected_project = step_down(self.selected_project, self.projects.len());
                    None
                }
                Action::Select => {
                    if !self.projects.is_empty() {
                        self.transition(Screen::ProjectDetail);
                    }
                    None
                }
                Action::Back => {
                    self.transition(Screen::MainMenu { scanning: false });
                    None
                }
                Action::Rescan => self.launch_scan(),
                _ => None,
            },
            Screen::ProjectDetail => {
                if action == Action::Back {
                    self.transition(Screen::ProjectList { scanning: false });
                }
                None
            }
            Screen::NewProjectInput { .. } => match action {
                Action::Back => {
                    self.transition(Screen::MainMenu { scanning: false });
                    None
                }
                Action::Select => self.submit_name(),
                Action::Edit(code) => {
                    self.input.edit(code);
                    None
                }
                _ => None,
            },
        }
    }

    fn select_menu_item(&mut self) -> Option<Command> {
        match self.selected_menu_item {
            MENU_LIST_PROJECTS if self.projects.is_empty() => self.launch_scan(),
            MENU_LIST_PROJECTS => {
                self.transition(Screen::ProjectList { scanning: false });
                None
            }
            MENU_NEW_PROJECT => {
                self.input.reset("");
                self.transition(Screen::NewProjectInput { provisioning: None });
                None
            }
            MENU_QUIT => Some(Command::Quit),
            _ => None,
        }
    }

    /// Move to `next`, dropping messages left over from the previous screen.
    fn transition(&mut self, next: Screen) {
        debug!(from = ?self.screen, to = ?next, "transition");
        self.screen = next;
        self.last_error = None;
        self.last_status = None;
    }

    /// Start a background task unless one is already outstanding.
    fn launch(&mut self, next: Screen, command: Command) -> Option<Command> {
        if let Some(pending) = self.screen.pending() {
            debug!(?pending, ?command, "task already pending, ignoring launch");
            return None;
        }

        self.transition(next);
        Some(command)
    }

    fn launch_scan(&mut self) -> Option<Command> {
        let next = match self.screen {
            Screen::ProjectList { .. } => Screen::ProjectList { scanning: true },
            _ => Screen::MainMenu { scanning: true },
        };
        let root = self.root().to_path_buf();
        self.launch(next, Command::Scan { root })
    }

    fn submit_root(&mut self) -> Option<Command> {
        let input = self.input.value().trim().to_string();
        if input.is_empty() {
            return None;
        }

        let original = match self.config.adopt_parent_directory(&input) {
            Ok(root) => {
                info!(root = %root.display(), "parent directory configured");
                return self.launch(Screen::MainMenu { scanning: true }, Command::Scan { root });
            }
            Err(err) => err,
        };

        warn!(%original, input = %input, "falling back to default directory");
        let fallback = match &self.fallback_root {
            Ok(root) => self.config.adopt_path(root).map_err(|e| e.to_string()),
            Err(err) => Err(err.clone()),
        };

        match fallback {
            Ok(root) => {
                let command = self.launch(Screen::MainMenu { scanning: true }, Command::Scan { root });
                self.last_error = Some(format!("{}\nUsing default directory instead.", original));
                command
            }
            Err(err) => {
                self.last_error = Some(format!("{}\nDefault directory unusable: {}", original, err));
                None
            }
        }
    }

    fn submit_name(&mut self) -> Option<Command> {
        if self.input.value().trim().is_empty() {
            return None;
        }

        let name = match validate_name(self.input.value()) {
            Ok(name) => name,
            Err(err) => {
                self.last_error = Some(err.to_string());
                return None;
            }
        };

        let root = self.root().to_path_buf();
        if root.join(&name).exists() {
            self.last_error = Some(RepositoryError::AlreadyExists(name).to_string());
            return None;
        }

        self.launch(
            Screen::NewProjectInput {
                provisioning: Some(name.clone()),
            },
            Command::Create { root, name },
        )
    }

    fn finish_scan(&mut self, projects: Vec<Project>) {
        info!(count = projects.len(), "scan completed");
        self.replace_projects(projects);
        self.last_status = Some(format!("Found {} uv projects", self.projects.len()));

        self.screen = match self.screen.settled() {
            Screen::ProjectList { .. } if self.projects.is_empty() => Screen::MainMenu { scanning: false },
            other => other,
        };
    }

    fn finish_create(&mut self, projects: Vec<Project>, name: String) {
        info!(project = %name, "project created");
        self.replace_projects(projects);
        self.input.reset("");
        self.transition(Screen::MainMenu { scanning: false });
        self.last_status = Some(format!("Project '{}' created successfully!", name));
    }

    fn replace_projects(&mut self, projects: Vec<Project>) {
        self.projects = projects;
        self.selected_project = self
            .selected_project
            .min(self.projects.len().saturating_sub(1));
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn pending(&self) -> Option<PendingOperation> {
        self.screen.pending()
    }

    /// Spinner caption for the outstanding task.
    pub fn pending_label(&self) -> Option<String> {
        match &self.screen {
            Screen::NewProjectInput {
                provisioning: Some(name),
            } => Some(format!("Creating new project: {}", name)),
            screen if screen.pending() == Some(PendingOperation::Scanning) => {
                Some("Scanning for uv projects...".to_string())
            }
            _ => None,
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn selected_menu_item(&self) -> usize {
        self.selected_menu_item
    }

    pub fn selected_project_index(&self) -> usize {
        self.selected_project
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.projects.get(self.selected_project)
    }

    pub fn input(&self) -> &TextInput {
        &self.input
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }

    pub fn root(&self) -> &Path {
        &self.config.parent_directory
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }
}

fn step_down(index: usize, len: usize) -> usize {
    if index + 1 < len {
        index + 1
    } else {
        index
    }
}

impl From<RepositoryError> for Message {
    fn from(err: RepositoryError) -> Self {
        Message::Failed(err.to_string())
    }
}
