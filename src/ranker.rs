//! Farming recommendations for a single material.
//!
//! Two sources are merged: the official stage list from the game data, and
//! the observed drop rates from the Penguin matrix. Only the highest-yield
//! stages from the matrix are ranked, by expected action points per unit.

use std::cmp::Ordering;

use serde::Serialize;

use crate::{
    error::SenseiError,
    gamedata::GameData,
    penguin::{DropStore, TOP_RATES_LIMIT},
};

/// Suffix marking the permanent re-run copy of an event stage.
const PERM_SUFFIX: &str = "_perm";

/// Appended to the display name of high-difficulty stages ("Tough").
const TOUGH_MARK: &str = "（磨难）";

/// An officially listed drop source.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SourceInfo {
    pub code: String,
    pub name: String,
    pub rate: String,
}

/// Official sources split into main-story and event stages.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Sources {
    pub main: Vec<SourceInfo>,
    pub act: Vec<SourceInfo>,
}

/// A stage ranked by observed cost efficiency.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub stage_id: String,
    pub stage_type: String,
    pub ap_cost: u32,
    pub code: String,
    pub name: String,
    /// Observed units per run.
    pub rate: f64,
    /// Expected action points per unit; `None` when the rate is zero.
    pub desired: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Recommendations {
    pub source: Sources,
    pub recommend: Vec<Recommendation>,
}

/// Official sources and ranked drop stages for `material_id`, or `None` when
/// the material is unknown.
pub async fn recommend(
    data: &GameData,
    store: &dyn DropStore,
    material_id: &str,
) -> Result<Option<Recommendations>, SenseiError> {
    if data.material(material_id).is_none() {
        return Ok(None);
    }

    let rates = store.top_rates(material_id, TOP_RATES_LIMIT).await?;
    let recommend = rank(
        rates
            .into_iter()
            .filter_map(|r| decorate(data, &r.stage_id, r.rate))
            .collect(),
    );

    Ok(Some(Recommendations {
        source: official_sources(data, material_id),
        recommend,
    }))
}

/// Official drop sources in corpus order. Stage ids containing `main` are
/// main-story stages; everything else counts as an event stage.
pub fn official_sources(data: &GameData, material_id: &str) -> Sources {
    let mut sources = Sources::default();
    let Some(rates) = data.sources(material_id) else {
        return sources;
    };

    for (stage_id, source) in rates {
        let Some(stage) = data.stage(stage_id) else {
            tracing::warn!(material_id, %stage_id, "source references unknown stage, skipping");
            continue;
        };
        let info = SourceInfo {
            code: stage.code.clone(),
            name: stage.name.clone(),
            rate: source.source_rate.clone(),
        };
        if stage_id.contains("main") {
            sources.main.push(info);
        } else {
            sources.act.push(info);
        }
    }

    sources
}

/// Strip the permanent-stage suffix so a re-run maps to its base stage.
pub fn normalize_stage_id(stage_id: &str) -> &str {
    stage_id.strip_suffix(PERM_SUFFIX).unwrap_or(stage_id)
}

fn decorate(data: &GameData, raw_stage_id: &str, rate: f64) -> Option<Recommendation> {
    let stage_id = normalize_stage_id(raw_stage_id);
    let Some(stage) = data.stage(stage_id) else {
        tracing::debug!(stage_id, "drop data references unknown stage, skipping");
        return None;
    };

    let mut name = stage.name.clone();
    if stage_id.contains("tough") {
        name.push_str(TOUGH_MARK);
    }

    Some(Recommendation {
        stage_id: stage_id.to_string(),
        stage_type: stage.stage_type.clone(),
        ap_cost: stage.ap_cost,
        code: stage.code.clone(),
        name,
        rate,
        desired: (rate > 0.0).then(|| f64::from(stage.ap_cost) / rate),
    })
}

/// Sort cheapest expected cost first. Stages without an estimate go last.
fn rank(mut recommend: Vec<Recommendation>) -> Vec<Recommendation> {
    recommend.sort_by(|a, b| match (a.desired, b.desired) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    recommend
}
