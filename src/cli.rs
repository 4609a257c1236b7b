use std::path::PathBuf;
use clap::Parser;

#[derive(Parser, Clone, Debug)]
#[command(
    name = "tuv",
    about = "Browse and create uv Python projects from the terminal",
    version
)]
pub struct Cli {
    /// configuration file (default: ~/.config/tuv/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// just list projects without interactive mode
    #[arg(short, long)]
    pub list: bool,

    /// print the project list as JSON (with --list)
    #[arg(long, requires = "list")]
    pub json: bool,

    /// write logs here instead of next to the configuration file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn log_path(&self, config_location: &std::path::Path) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| {
            config_location
                .parent()
                .map(|dir| dir.join("tuv.log"))
                .unwrap_or_else(|| PathBuf::from("tuv.log"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from(["tuv", "--list", "--json", "-c", "/tmp/tuv.toml"]);
        assert!(cli.list && cli.json);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/tuv.toml")));
    }

    #[test]
    fn test_json_requires_list() {
        assert!(Cli::try_parse_from(["tuv", "--json"]).is_err());
    }

    #[test]
    fn test_log_path() {
        let cli = Cli::parse_from(["tuv"]);
        assert_eq!(
            cli.log_path(Path::new("/home/me/.config/tuv/config.toml")),
            PathBuf::from("/home/me/.config/tuv/tuv.log")
        );

        let cli = Cli::parse_from(["tuv", "--log-file", "/tmp/x.log"]);
        assert_eq!(cli.log_path(Path::new("config.toml")), PathBuf::from("/tmp/x.log"));
    }
}
