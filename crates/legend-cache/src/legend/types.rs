//! Legend types for the legend cache
//!
//! Defines the registry's cold record snapshot, the two in-memory legend
//! representations (full and compressed), and the tier enum that classifies
//! where a character currently lives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a character in the registry (e.g. `char_001`)
pub type CharacterId = String;

/// Fixed bookkeeping cost charged to every legend, regardless of content
const LEGEND_OVERHEAD_BYTES: usize = 64;
/// Cost of one relationship on top of its string contents (strength + framing)
const RELATIONSHIP_OVERHEAD_BYTES: usize = 16;
/// Cost of one alias on top of its string contents
const ALIAS_OVERHEAD_BYTES: usize = 8;

/// Authoritative character record as supplied by the registry.
///
/// The cache never mutates or writes these back; it only builds legends from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColdRecord {
    /// Unique identifier for this character
    pub id: CharacterId,
    /// Name the character is referred to by
    pub canonical_name: String,
    /// Alternative names seen in the source text
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Prose summary of the character
    #[serde(default)]
    pub summary: String,
    /// Description of how the character speaks
    #[serde(default)]
    pub voice_style: String,
    /// Links to other characters
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    /// Registry's confidence in this record
    #[serde(default)]
    pub confidence_score: f32,
    /// Whether the character is still active in the document
    #[serde(default)]
    pub status: CharacterStatus,
    /// Importance score in 0..1
    #[serde(default)]
    pub importance: f32,
    /// When the registry first saw this character
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// When the registry last changed this record
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl ColdRecord {
    /// Create a record with the given id and name and empty profile fields
    pub fn new(id: impl Into<CharacterId>, canonical_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            canonical_name: canonical_name.into(),
            aliases: Vec::new(),
            summary: String::new(),
            voice_style: String::new(),
            relationships: Vec::new(),
            confidence_score: 1.0,
            status: CharacterStatus::Active,
            importance: 0.5,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the registry marks this character as active
    pub fn is_active(&self) -> bool {
        self.status == CharacterStatus::Active
    }
}

/// Directed, weighted relationship between two characters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// The related character
    pub target_id: CharacterId,
    /// Human-readable description ("sister", "rival", ...)
    pub label: String,
    /// Strength of the relationship, higher is stronger
    pub strength: f32,
}

impl Relationship {
    pub fn new(target_id: impl Into<CharacterId>, label: impl Into<String>, strength: f32) -> Self {
        Self {
            target_id: target_id.into(),
            label: label.into(),
            strength,
        }
    }

    fn estimated_size(&self) -> usize {
        self.target_id.len() + self.label.len() + RELATIONSHIP_OVERHEAD_BYTES
    }
}

/// Registry status of a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterStatus {
    #[default]
    Active,
    Inactive,
}

/// Full-fidelity legend, held in the Hot tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullLegend {
    pub name: String,
    /// Voice description, always capped at the configured voice length
    pub voice: String,
    pub summary: String,
    pub relationships: Vec<Relationship>,
    pub aliases: Vec<String>,
}

/// Reduced-fidelity legend, held in the Warm tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedLegend {
    pub name: String,
    /// Voice description, always capped at the configured voice length
    pub voice: String,
    /// Summary truncated to the configured summary length
    pub summary: String,
    /// Strongest relationships only
    pub relationships: Vec<Relationship>,
}

/// In-memory legend handed out to callers, tagged by fidelity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "legend", rename_all = "lowercase")]
pub enum Legend {
    Full(FullLegend),
    Compressed(CompressedLegend),
}

impl Legend {
    /// Fidelity of this legend
    pub fn kind(&self) -> LegendKind {
        match self {
            Legend::Full(_) => LegendKind::Full,
            Legend::Compressed(_) => LegendKind::Compressed,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Legend::Full(l) => &l.name,
            Legend::Compressed(l) => &l.name,
        }
    }

    pub fn voice(&self) -> &str {
        match self {
            Legend::Full(l) => &l.voice,
            Legend::Compressed(l) => &l.voice,
        }
    }

    pub fn summary(&self) -> &str {
        match self {
            Legend::Full(l) => &l.summary,
            Legend::Compressed(l) => &l.summary,
        }
    }

    pub fn relationships(&self) -> &[Relationship] {
        match self {
            Legend::Full(l) => &l.relationships,
            Legend::Compressed(l) => &l.relationships,
        }
    }

    /// Resident tier this legend belongs to (Hot for full, Warm for compressed)
    pub fn tier(&self) -> StorageTier {
        match self {
            Legend::Full(_) => StorageTier::Hot,
            Legend::Compressed(_) => StorageTier::Warm,
        }
    }

    /// Deterministic byte estimate of this legend's in-memory footprint.
    ///
    /// Grows monotonically with every string and relationship it holds.
    pub fn estimated_size(&self) -> usize {
        let (name, voice, summary, relationships, aliases) = match self {
            Legend::Full(l) => (
                &l.name,
                &l.voice,
                &l.summary,
                l.relationships.as_slice(),
                l.aliases.as_slice(),
            ),
            Legend::Compressed(l) => (
                &l.name,
                &l.voice,
                &l.summary,
                l.relationships.as_slice(),
                <&[String]>::default(),
            ),
        };

        LEGEND_OVERHEAD_BYTES
            + name.len()
            + voice.len()
            + summary.len()
            + relationships.iter().map(Relationship::estimated_size).sum::<usize>()
            + aliases
                .iter()
                .map(|a| a.len() + ALIAS_OVERHEAD_BYTES)
                .sum::<usize>()
    }
}

impl From<FullLegend> for Legend {
    fn from(legend: FullLegend) -> Self {
        Legend::Full(legend)
    }
}

impl From<CompressedLegend> for Legend {
    fn from(legend: CompressedLegend) -> Self {
        Legend::Compressed(legend)
    }
}

/// Fidelity of a legend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendKind {
    Full,
    Compressed,
}

/// Residency tier of a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageTier {
    /// Recently referenced, full legend resident
    Hot,
    /// Less recently referenced, compressed legend resident
    Warm,
    /// Not resident; the registry is the source of truth
    Cold,
}

impl std::fmt::Display for StorageTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageTier::Hot => write!(f, "hot"),
            StorageTier::Warm => write!(f, "warm"),
            StorageTier::Cold => write!(f, "cold"),
        }
    }
}
