use tokio::{sync::mpsc::UnboundedSender, task};
use tracing::{debug, error};
use crate::{
    app::{Command, Message},
    repository::ProjectRepository,
};

/// Runs scans and provisioning off the input loop. Each launch answers with
/// exactly one message on `sender`.
#[derive(Clone)]
pub struct Worker {
    repository: ProjectRepository,
    sender: UnboundedSender<Message>,
}

impl Worker {
    pub fn new(repository: ProjectRepository, sender: UnboundedSender<Message>) -> Self {
        Self { repository, sender }
    }

    /// Returns false for commands that are not background work.
    pub fn launch(&self, command: Command) -> bool {
        let (root, job) = match command {
            Command::Scan { root } => (root, Job::Scan),
            Command::Create { root, name } => (root, Job::Create(name)),
            Command::Quit => return false,
        };

        let repository = self.repository.with_root(root);
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let message = match task::spawn_blocking(move || job.run(&repository)).await {
                Ok(message) => message,
                Err(err) => {
                    error!(%err, "background task panicked");
                    Message::Failed(format!("background task failed: {}", err))
                }
            };

            if sender.send(message).is_err() {
                debug!("session gone, dropping task result");
            }
        });

        true
    }
}

enum Job {
    Scan,
    Create(String),
}

impl Job {
    fn run(self, repository: &ProjectRepository) -> Message {
        let result = match self {
            Job::Scan => repository.scan().map(Message::Scanned),
            Job::Create(name) => repository
                .create(&name)
                .map(|(projects, name)| Message::Created { projects, name }),
        };
        result.unwrap_or_else(Message::from)
    }
}
