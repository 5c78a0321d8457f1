pub mod config;
pub mod error;
pub mod gamedata;
pub mod matcher;
pub mod penguin;
pub mod ranker;
pub mod resolver;
pub mod sensei;
pub mod tokenizer;
pub mod vocabulary;

pub use config::SenseiConfig;
pub use error::SenseiError;
pub use gamedata::GameData;
pub use matcher::{Matcher, MatcherOptions, Verdict};
pub use sensei::{MaterialReport, QueryOutcome, Sensei};
pub use vocabulary::Vocabulary;
