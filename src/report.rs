use anyhow::Result;
use colored::Colorize;
use spinoff::{spinners, Spinner};
use tokio::task;
use crate::{project::Project, repository::ProjectRepository, utils};

/// Scan once and print the result without entering the interactive UI.
pub async fn print_projects(repository: &ProjectRepository, json: bool) -> Result<()> {
    let spinner = Spinner::new(
        spinners::Dots,
        format!("Scanning for uv projects in: {}", repository.root().display()),
        spinoff::Color::White,
    );

    let scanner = repository.clone();
    let result = task::spawn_blocking(move || scanner.scan()).await;
    spinner.clear();
    let projects = result??;

    if json {
        println!("{}", serde_json::to_string_pretty(&projects)?);
    } else {
        println!("{}", render_table(&projects));
    }

    Ok(())
}

fn render_table(projects: &[Project]) -> String {
    if projects.is_empty() {
        return "No uv projects found.".to_string();
    }

    let mut out = format!(
        "\n{:<30} {:<12} {:<12} {:<12} {}\n",
        "Project Name".bold(),
        "Size".bold(),
        "Python".bold(),
        "Modified".bold(),
        "Env".bold()
    );
    out.push_str(&"─".repeat(80));
    out.push('\n');

    for project in projects {
        let last_mod = project
            .last_modified
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        let env = match (project.has_venv, project.has_lock) {
            (true, true) => "venv+lock".green(),
            (true, false) => "venv".yellow(),
            (false, true) => "lock".yellow(),
            (false, false) => "none".red(),
        };

        let version = if project.has_known_version() {
            project.python_version.normal()
        } else {
            project.python_version.dimmed()
        };

        out.push_str(&format!(
            "{:<30} {:<12} {:<12} {:<12} {}\n",
            utils::truncate_string(&project.name, 30),
            project.format_size().cyan(),
            version,
            last_mod,
            env
        ));
    }

    let total: u64 = projects.iter().map(|p| p.size).sum();
    out.push_str(&format!(
        "\n{} projects, {} total",
        projects.len(),
        utils::format_size(total).bold().green()
    ));
    out
}
