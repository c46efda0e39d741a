use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use legend_cache::config::Config;
use legend_cache::{
    CacheMetrics, InMemoryRegistry, LegendCacheManager, MemoryStats, StorageTier, TierHint,
};
use serde::{Deserialize, Serialize};

use crate::error::CliResult;
use crate::output::{OutputFormat, format_percent, format_size};

/// One processing unit of a replayed trace
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TraceStep {
    pub unit: u64,
    #[serde(default)]
    pub characters: Vec<String>,
    /// Tier requested for every lookup in this unit
    #[serde(default)]
    pub hint: Option<TierHint>,
}

/// Totals gathered while replaying a trace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub units: usize,
    pub lookups: usize,
    pub preloaded: usize,
    /// Ids the registry had no record for
    pub not_found: Vec<String>,
    pub demoted_to_warm: usize,
    pub evicted: usize,
    pub rejected: usize,
    pub hit_rate: f64,
    pub metrics: CacheMetrics,
    pub memory: MemoryStats,
    pub hot: Vec<String>,
    pub warm: Vec<String>,
}

#[derive(Parser)]
pub struct SimulateCommand {
    #[clap(long, help = "JSON file with the character records")]
    pub registry: PathBuf,

    #[clap(long, help = "JSON file with the access trace")]
    pub trace: PathBuf,

    #[clap(
        long,
        default_value_t = 0,
        help = "Preload up to N active characters into Warm before replaying"
    )]
    pub preload: usize,
}

impl SimulateCommand {
    pub async fn execute(&self, config_path: Option<&Path>, format: OutputFormat) -> CliResult<()> {
        let config = Config::load(config_path)?;
        let registry = InMemoryRegistry::from_json_file(&self.registry)?;
        let steps = load_trace(&self.trace)?;

        let cache = LegendCacheManager::new(Arc::new(registry), config)?;
        let summary = replay(&cache, &steps, self.preload).await?;

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            OutputFormat::Table => print_summary(&summary),
        }

        Ok(())
    }
}

/// Read a JSON array of trace steps
pub fn load_trace(path: &Path) -> CliResult<Vec<TraceStep>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read trace file {}: {e}", path.display()))?;
    let steps: Vec<TraceStep> = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse trace file {}: {e}", path.display()))?;
    Ok(steps)
}

/// Replay `steps` against `cache`: every referenced character is looked up,
/// then the unit is recorded.
///
/// Characters missing from the registry are collected rather than aborting
/// the replay; any other registry error does abort it.
pub async fn replay(
    cache: &LegendCacheManager,
    steps: &[TraceStep],
    preload: usize,
) -> CliResult<SimulationSummary> {
    let preloaded = if preload > 0 {
        cache.preload_active(preload).await?
    } else {
        0
    };

    let mut lookups = 0;
    let mut not_found = Vec::new();
    let mut demoted_to_warm = 0;
    let mut evicted = 0;
    let mut rejected = 0;

    for step in steps {
        for id in &step.characters {
            lookups += 1;
            match cache.get_character_data(id, step.hint).await {
                Ok(_) => {}
                Err(e) if e.is_not_found() => {
                    tracing::warn!(character_id = %id, unit = step.unit, "Character not in registry");
                    if !not_found.contains(id) {
                        not_found.push(id.clone());
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        let report = cache
            .update_access_pattern(step.unit, step.characters.iter().cloned())
            .await;
        demoted_to_warm += report.demoted_to_warm.len();
        evicted += report.evicted.len();
        rejected += report.rejected.len();
    }

    Ok(SimulationSummary {
        units: steps.len(),
        lookups,
        preloaded,
        not_found,
        demoted_to_warm,
        evicted,
        rejected,
        hit_rate: cache.get_cache_hit_rate(),
        metrics: cache.get_cache_metrics(),
        memory: cache.get_memory_stats(),
        hot: cache.resident_ids(StorageTier::Hot),
        warm: cache.resident_ids(StorageTier::Warm),
    })
}

fn print_summary(summary: &SimulationSummary) {
    println!("Legend Cache Simulation");
    println!("=======================\n");

    println!(
        "Replayed {} units, {} lookups ({} preloaded)\n",
        summary.units, summary.lookups, summary.preloaded
    );

    let metrics = &summary.metrics;
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(["Tier", "Entries", "Hits", "Misses", "Promotions", "Demotions"]);

    table.add_row([
        "Hot",
        &summary.memory.hot_entries.to_string(),
        &metrics.hits.hot.to_string(),
        &metrics.misses.hot.to_string(),
        &metrics.promotions.hot.to_string(),
        &metrics.demotions.hot.to_string(),
    ]);
    table.add_row([
        "Warm",
        &summary.memory.warm_entries.to_string(),
        &metrics.hits.warm.to_string(),
        &metrics.misses.warm.to_string(),
        &metrics.promotions.warm.to_string(),
        &metrics.demotions.warm.to_string(),
    ]);

    println!("{table}\n");

    println!("Hit rate:        {}", format_percent(summary.hit_rate));
    println!(
        "Memory:          {} of {}",
        format_size(summary.memory.total_bytes),
        format_size(summary.memory.configured_limit_bytes)
    );
    println!(
        "Reduction:       {}",
        format_percent(summary.memory.reduction_ratio)
    );
    println!(
        "Transitions:     {} demoted, {} evicted, {} out-of-order",
        summary.demoted_to_warm, summary.evicted, summary.rejected
    );

    if !summary.not_found.is_empty() {
        println!("Not found:       {}", summary.not_found.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legend_cache::testing::sample_record;

    fn step(unit: u64, characters: &[&str]) -> TraceStep {
        TraceStep {
            unit,
            characters: characters.iter().map(|c| c.to_string()).collect(),
            hint: None,
        }
    }

    fn cache(ids: &[&str]) -> LegendCacheManager {
        let registry = InMemoryRegistry::from_records(ids.iter().map(|id| sample_record(id)));
        LegendCacheManager::with_defaults(Arc::new(registry)).unwrap()
    }

    #[tokio::test]
    async fn test_replay_counts_lookups_and_transitions() {
        let cache = cache(&["char_001", "char_002"]);
        let steps = vec![
            step(0, &["char_001", "char_002"]),
            step(1, &["char_001"]),
            step(2, &["char_001"]),
            step(15, &["char_001"]),
            step(25, &["char_001"]),
        ];

        let summary = replay(&cache, &steps, 0).await.unwrap();

        assert_eq!(summary.units, 5);
        assert_eq!(summary.lookups, 6);
        assert_eq!(summary.demoted_to_warm, 1);
        assert_eq!(summary.hot, vec!["char_001".to_string()]);
        assert_eq!(summary.warm, vec!["char_002".to_string()]);
        assert!((summary.hit_rate - 4.0 / 6.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_replay_collects_missing_characters() {
        let cache = cache(&["char_001"]);
        let steps = vec![step(0, &["char_001", "char_404"]), step(1, &["char_404"])];

        let summary = replay(&cache, &steps, 0).await.unwrap();

        assert_eq!(summary.not_found, vec!["char_404".to_string()]);
        assert_eq!(summary.memory.hot_entries, 1);
    }

    #[tokio::test]
    async fn test_replay_with_preload() {
        let cache = cache(&["char_001", "char_002"]);

        let summary = replay(&cache, &[step(0, &["char_001"])], 2).await.unwrap();

        assert_eq!(summary.preloaded, 2);
        assert_eq!(summary.metrics.hits.warm, 1);
        assert_eq!(summary.warm.len(), 2);
    }

    #[test]
    fn test_load_trace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.json");
        std::fs::write(
            &path,
            r#"[{ "unit": 0, "characters": ["char_001"] }, { "unit": 3, "hint": "hot" }]"#,
        )
        .unwrap();

        let steps = load_trace(&path).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].characters, vec!["char_001".to_string()]);
        assert!(steps[1].characters.is_empty());
        assert_eq!(steps[1].hint, Some(TierHint::Hot));
    }

    #[test]
    fn test_load_trace_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.json");
        std::fs::write(&path, "{").unwrap();

        let err = load_trace(&path).unwrap_err();
        assert!(err.0.contains("Failed to parse trace file"));
    }
}
