use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use material_sensei::{
    config::default_dict_path, matcher::DEFAULT_MIN_SIMILARITY, penguin::DEFAULT_PENGUIN_URL,
    MatcherOptions, SenseiConfig,
};

#[derive(Parser)]
#[command(name = "material-sensei")]
#[command(about = "Material lookup and farming recommendations backed by Penguin Statistics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Game-data corpus (JSON with materials, materials_map, materials_made,
    /// materials_source and stages)
    #[arg(long, env = "SENSEI_GAME_DATA")]
    pub game_data: PathBuf,

    /// Penguin Statistics drop matrix endpoint
    #[arg(long, env = "SENSEI_PENGUIN_URL", default_value = DEFAULT_PENGUIN_URL)]
    pub penguin_url: String,

    /// Saved drop matrix JSON; when set it replaces the endpoint
    #[arg(long, env = "SENSEI_PENGUIN_FILE")]
    pub penguin_file: Option<PathBuf>,

    /// Seconds between drop-data refreshes
    #[arg(long, env = "SENSEI_REFRESH_INTERVAL", default_value_t = 3600)]
    pub refresh_interval: u64,

    /// Material dictionary file (defaults to the user cache directory)
    #[arg(long, env = "SENSEI_DICT_PATH")]
    pub dict_path: Option<PathBuf>,

    /// SQLite URL for the drop table (e.g. sqlite://penguin.db); kept in
    /// memory when omitted
    #[arg(long, env = "SENSEI_DATABASE")]
    pub database: Option<String>,

    /// Minimum similarity score for a fuzzy material match
    #[arg(long, env = "SENSEI_MIN_SIMILARITY", default_value_t = DEFAULT_MIN_SIMILARITY)]
    pub min_similarity: f64,
}

#[derive(Subcommand, PartialEq)]
pub enum Command {
    /// Answer a single material query and exit
    Query {
        /// Free-text query, e.g. "固源岩怎么刷"
        text: String,
    },
    /// Fetch the drop matrix once and report the row count
    Refresh,
    /// Write the material dictionary file and exit
    BuildDict,
}

impl Cli {
    pub fn sensei_config(&self) -> SenseiConfig {
        SenseiConfig {
            dict_path: self.dict_path.clone().or_else(default_dict_path),
            matcher: MatcherOptions {
                min_similarity: self.min_similarity,
                ..MatcherOptions::default()
            },
            refresh_interval: Duration::from_secs(self.refresh_interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn penguin_file_is_optional() {
        let cli = Cli::try_parse_from(["material-sensei", "--game-data", "g.json"]).unwrap();
        assert_eq!(cli.penguin_file, None);
        assert_eq!(cli.penguin_url, DEFAULT_PENGUIN_URL);

        let cli = Cli::try_parse_from([
            "material-sensei",
            "--game-data",
            "g.json",
            "--penguin-file",
            "matrix.json",
            "refresh",
        ])
        .unwrap();
        assert_eq!(cli.penguin_file, Some(PathBuf::from("matrix.json")));
        assert!(cli.command == Some(Command::Refresh));
    }
}
