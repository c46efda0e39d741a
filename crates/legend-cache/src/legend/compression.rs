//! Legend compression for the Warm tier
//!
//! Reduces a full legend to a smaller compressed one. The transform is pure
//! and deterministic, and re-applying it to its own output changes nothing.

use crate::config::CompressionConfig;
use crate::legend::types::{ColdRecord, CompressedLegend, FullLegend, Relationship};

/// Suffix appended to summaries that were cut short
const TRUNCATION_MARKER: &str = "...";

/// Build a full legend from a registry record.
///
/// The voice cap applies here too: it is a global normalization, not a
/// compression effect.
pub fn build_full(record: &ColdRecord, config: &CompressionConfig) -> FullLegend {
    FullLegend {
        name: record.canonical_name.clone(),
        voice: cap_voice(&record.voice_style, config.voice_max_length),
        summary: record.summary.clone(),
        relationships: record.relationships.clone(),
        aliases: record.aliases.clone(),
    }
}

/// Compress a full legend for the Warm tier
///
/// - Voice re-capped at `voice_max_length`
/// - Summary truncated to `summary_max_length` when configured
/// - Only the `max_relationships` strongest relationships kept when configured
pub fn compress(full: &FullLegend, config: &CompressionConfig) -> CompressedLegend {
    CompressedLegend {
        name: full.name.clone(),
        voice: cap_voice(&full.voice, config.voice_max_length),
        summary: shorten_summary(&full.summary, config.summary_max_length),
        relationships: strongest_relationships(&full.relationships, config.max_relationships),
    }
}

/// Re-apply compression bounds to an already compressed legend.
///
/// Yields the input unchanged when it was produced under the same config.
pub fn recompress(compressed: &CompressedLegend, config: &CompressionConfig) -> CompressedLegend {
    CompressedLegend {
        name: compressed.name.clone(),
        voice: cap_voice(&compressed.voice, config.voice_max_length),
        summary: shorten_summary(&compressed.summary, config.summary_max_length),
        relationships: strongest_relationships(&compressed.relationships, config.max_relationships),
    }
}

/// Cap voice text at `max_chars` characters
fn cap_voice(voice: &str, max_chars: usize) -> String {
    voice.chars().take(max_chars).collect()
}

/// Truncate summary to at most `max_chars` characters, marking the cut
fn shorten_summary(summary: &str, max_chars: Option<usize>) -> String {
    let Some(max_chars) = max_chars else {
        return summary.to_string();
    };

    if summary.chars().count() <= max_chars {
        return summary.to_string();
    }

    let marker_len = TRUNCATION_MARKER.chars().count();
    if max_chars <= marker_len {
        return summary.chars().take(max_chars).collect();
    }

    let kept: String = summary.chars().take(max_chars - marker_len).collect();
    format!("{}{}", kept.trim_end(), TRUNCATION_MARKER)
}

/// Keep the `limit` strongest relationships, strongest first.
///
/// Ties keep their original relative order.
fn strongest_relationships(relationships: &[Relationship], limit: Option<usize>) -> Vec<Relationship> {
    let mut sorted = relationships.to_vec();
    sorted.sort_by(|a, b| b.strength.total_cmp(&a.strength));
    if let Some(limit) = limit {
        sorted.truncate(limit);
    }
    sorted
}
