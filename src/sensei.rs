//! Query orchestration: text in, one merged material report out.
//!
//! A [`Sensei`] owns the current corpus, the drop table and the current
//! matcher. Corpus and matcher are snapshots swapped as a pair by
//! [`Sensei::replace_data`]. The matcher slot starts empty and is filled by
//! [`Sensei::rebuild_vocabulary`]; until then every query is ignored, so a
//! message that arrives during startup fails closed instead of racing the
//! vocabulary build.

use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    config::SenseiConfig,
    gamedata::{GameData, Material},
    matcher::Matcher,
    penguin::{DropFeed, DropStore, Ingestor},
    ranker::{self, Recommendation, Sources},
    resolver::{self, MaterialNode},
    tokenizer::Tokenizer,
    vocabulary::Vocabulary,
};

/// Everything known about one material, ready for rendering.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MaterialReport {
    pub name: String,
    pub info: Material,
    pub children: Vec<MaterialNode>,
    pub source: Sources,
    pub recommend: Vec<Recommendation>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Found(Box<MaterialReport>),
    /// The text asked about materials but named none; ask the user which one
    /// and pass the reply to [`Sensei::clarify`].
    NeedsName,
    /// A name was given but nothing in the corpus matches it.
    NotFound(String),
    /// The text is not a material query, or the vocabulary is not ready.
    Ignored,
}

/// Handles of the background tasks launched by [`Sensei::start`].
pub struct StartupTasks {
    pub vocabulary: JoinHandle<()>,
    pub refresh: JoinHandle<()>,
}

pub struct Sensei {
    data: RwLock<Arc<GameData>>,
    store: Arc<dyn DropStore>,
    config: SenseiConfig,
    matcher: RwLock<Option<Arc<Matcher>>>,
    ready: watch::Sender<bool>,
}

impl Sensei {
    pub fn new(data: Arc<GameData>, store: Arc<dyn DropStore>, config: SenseiConfig) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            data: RwLock::new(data),
            store,
            config,
            matcher: RwLock::new(None),
            ready,
        }
    }

    /// The corpus snapshot queries currently run against.
    pub fn data(&self) -> Arc<GameData> {
        match self.data.read() {
            Ok(data) => Arc::clone(&data),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Swap in a new corpus and rebuild the vocabulary from it.
    ///
    /// Queries already in flight finish against the snapshot they started
    /// with.
    pub fn replace_data(&self, data: Arc<GameData>) -> Arc<Vocabulary> {
        tracing::info!(materials = data.materials.len(), "game data replaced");
        match self.data.write() {
            Ok(mut slot) => *slot = data,
            Err(poisoned) => *poisoned.into_inner() = data,
        }
        self.rebuild_vocabulary()
    }

    pub fn config(&self) -> &SenseiConfig {
        &self.config
    }

    /// Launch vocabulary construction and the drop-data refresh loop.
    ///
    /// Neither task is awaited here; use [`Sensei::wait_ready`] to block on
    /// the vocabulary.
    pub fn start(self: &Arc<Self>, feed: Arc<dyn DropFeed>) -> StartupTasks {
        let this = Arc::clone(self);
        let vocabulary = tokio::task::spawn_blocking(move || {
            this.rebuild_vocabulary();
        });

        let ingestor = Arc::new(Ingestor::new(feed, Arc::clone(&self.store)));
        let refresh = ingestor.spawn(self.config.refresh_interval);

        StartupTasks {
            vocabulary,
            refresh,
        }
    }

    /// Build a fresh vocabulary from the corpus, persist the dictionary, and
    /// swap in a matcher over it. Marks the sensei ready.
    ///
    /// If the dictionary cannot be written or read back, the matcher is built
    /// from the in-memory vocabulary instead.
    pub fn rebuild_vocabulary(&self) -> Arc<Vocabulary> {
        let vocabulary = Arc::new(Vocabulary::build(&self.data()));
        let options = self.config.matcher.clone();

        let matcher = match self.dict_tokenizer(&vocabulary) {
            Some(tokenizer) => Matcher::with_tokenizer(Arc::clone(&vocabulary), tokenizer, options),
            None => Matcher::new(Arc::clone(&vocabulary), options),
        };

        let matcher = Arc::new(matcher);
        match self.matcher.write() {
            Ok(mut slot) => *slot = Some(matcher),
            Err(poisoned) => *poisoned.into_inner() = Some(matcher),
        }
        self.ready.send_replace(true);
        tracing::info!(words = vocabulary.len(), "material vocabulary ready");

        vocabulary
    }

    fn dict_tokenizer(&self, vocabulary: &Vocabulary) -> Option<Tokenizer> {
        let path = self.config.dict_path.as_deref()?;
        let loaded = vocabulary
            .persist(path)
            .and_then(|()| Tokenizer::from_dict(path));
        match loaded {
            Ok(tokenizer) => Some(tokenizer),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "material dict unavailable, using in-memory vocabulary");
                None
            }
        }
    }

    /// The current matcher, or `None` before the first vocabulary build.
    pub fn matcher(&self) -> Option<Arc<Matcher>> {
        match self.matcher.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Resolve once the first vocabulary build has finished.
    pub async fn wait_ready(&self) {
        let mut rx = self.ready.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// Match `text` to a material and build its report.
    pub async fn resolve_and_recommend(&self, text: &str) -> QueryOutcome {
        let Some(matcher) = self.matcher() else {
            tracing::debug!("vocabulary not ready, ignoring query");
            return QueryOutcome::Ignored;
        };

        match matcher.verify(text) {
            None => QueryOutcome::Ignored,
            Some(verdict) => match verdict.name {
                None => QueryOutcome::NeedsName,
                Some(name) => self.report_or_not_found(name).await,
            },
        }
    }

    /// Handle the user's reply to a [`QueryOutcome::NeedsName`] prompt. The
    /// reply is matched without the keyword gate.
    pub async fn clarify(&self, reply: &str) -> QueryOutcome {
        let name = self.matcher().and_then(|m| m.most_similar(reply));
        match name {
            Some(name) => self.report_or_not_found(name).await,
            None => QueryOutcome::NotFound(reply.to_string()),
        }
    }

    async fn report_or_not_found(&self, name: String) -> QueryOutcome {
        match self.check_material(&name).await {
            Some(report) => QueryOutcome::Found(Box::new(report)),
            None => QueryOutcome::NotFound(name),
        }
    }

    /// Full report for an exact material name, or `None` if the name is not
    /// in the corpus. A failing drop table degrades to an empty
    /// recommendation list.
    pub async fn check_material(&self, name: &str) -> Option<MaterialReport> {
        let data = self.data();
        let material_id = data.material_id(name)?;
        let info = data.material(material_id)?.clone();

        let ranked = match ranker::recommend(&data, self.store.as_ref(), material_id).await {
            Ok(ranked) => ranked?,
            Err(e) => {
                tracing::error!(material_id, error = %e, "drop data query failed");
                ranker::Recommendations {
                    source: ranker::official_sources(&data, material_id),
                    recommend: Vec::new(),
                }
            }
        };

        Some(MaterialReport {
            name: name.to_string(),
            info,
            children: resolver::expand(&data, material_id),
            source: ranked.source,
            recommend: ranked.recommend,
        })
    }
}
