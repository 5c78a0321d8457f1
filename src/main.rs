mod cli;
mod repl;

use std::sync::Arc;

use clap::Parser;
use material_sensei::{
    penguin::{
        DropFeed, DropStore, HttpDropFeed, Ingestor, MemoryDropStore, SqliteDropStore,
        StaticDropFeed,
    },
    GameData, Sensei,
};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let rt = tokio::runtime::Runtime::new()?;

    let data = Arc::new(GameData::load(&cli.game_data)?);
    let store: Arc<dyn DropStore> = match cli.database.as_deref() {
        Some(url) => Arc::new(rt.block_on(SqliteDropStore::connect(url))?),
        None => Arc::new(MemoryDropStore::new()),
    };
    let feed: Arc<dyn DropFeed> = match cli.penguin_file.as_deref() {
        Some(path) => Arc::new(StaticDropFeed::from_file(path)?),
        None => Arc::new(HttpDropFeed::new(cli.penguin_url.clone())?),
    };
    let ingestor = Arc::new(Ingestor::new(Arc::clone(&feed), Arc::clone(&store)));
    let sensei = Arc::new(Sensei::new(data, Arc::clone(&store), cli.sensei_config()));

    match cli.command {
        Some(Command::BuildDict) => {
            let vocabulary = sensei.rebuild_vocabulary();
            match &sensei.config().dict_path {
                Some(path) => println!("Wrote {} names to {}", vocabulary.len(), path.display()),
                None => println!("Built {} names (no dictionary path)", vocabulary.len()),
            }
        }
        Some(Command::Refresh) => {
            repl::refresh_with_spinner(&rt, &ingestor);
        }
        Some(Command::Query { text }) => {
            sensei.rebuild_vocabulary();
            if rt.block_on(store.len())? == 0 {
                repl::refresh_with_spinner(&rt, &ingestor);
            }
            let outcome = rt.block_on(sensei.resolve_and_recommend(&text));
            repl::print_outcome(&outcome);
        }
        None => {
            let tasks = rt.block_on(async { sensei.start(feed) });
            eprintln!("{DIM}Building material vocabulary...{RESET}");
            rt.block_on(sensei.wait_ready());
            eprintln!(
                "{DIM}Ready: {} materials. Type /help for commands (Ctrl+D to quit).{RESET}\n",
                sensei.data().materials_map.len()
            );

            repl::run(&rt, &sensei, &ingestor)?;
            tasks.refresh.abort();
        }
    }

    Ok(())
}
