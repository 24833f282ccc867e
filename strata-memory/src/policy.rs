//! Statically typed memory policy, loaded from YAML. Per the design note on
//! dynamic config objects: unknown keys and out-of-range values are
//! rejected at construction, not silently ignored — unlike the dict-based
//! policy the original loads straight from `yaml.safe_load`.

use crate::error::MemoryError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamespaceRule {
    pub patterns: Vec<String>,
    pub isolation: String,
    #[serde(default)]
    pub cross_read: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct L1Config {
    pub primary: String,
    pub ttl_default: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct L2Config {
    pub primary: String,
    pub hybrid_alpha: f64,
    /// Dimension every stored embedding must match. `None` (the default when
    /// absent from YAML) means no embedder is configured and dimension
    /// checks are skipped.
    #[serde(default)]
    pub embedding_dimension: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct L3Config {
    pub primary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct L4Config {
    pub primary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TiersConfig {
    #[serde(rename = "L1_ephemeral")]
    pub l1_ephemeral: L1Config,
    #[serde(rename = "L2_vector")]
    pub l2_vector: L2Config,
    #[serde(rename = "L3_structured")]
    pub l3_structured: L3Config,
    #[serde(rename = "L4_cold")]
    pub l4_cold: L4Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchSizes {
    pub embedding: usize,
    pub upsert: usize,
    pub search: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    pub search_ttl: u64,
    pub fact_ttl: u64,
    pub embedding_ttl: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerformanceConfig {
    pub batch_sizes: BatchSizes,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryPolicy {
    pub namespaces: HashMap<String, NamespaceRule>,
    pub tiers: TiersConfig,
    pub performance: PerformanceConfig,
}

impl MemoryPolicy {
    pub fn from_yaml(text: &str) -> Result<Self, MemoryError> {
        let policy: MemoryPolicy = serde_yaml::from_str(text)
            .map_err(|e| MemoryError::InvalidPolicy(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    fn validate(&self) -> Result<(), MemoryError> {
        let alpha = self.tiers.l2_vector.hybrid_alpha;
        if !(0.0..=1.0).contains(&alpha) {
            return Err(MemoryError::InvalidPolicy(format!(
                "tiers.L2_vector.hybrid_alpha must be in [0.0, 1.0], got {alpha}"
            )));
        }
        Ok(())
    }

    /// The default policy, matching the original's hardcoded fallback when
    /// no policy file is present on disk.
    pub fn default_policy() -> Self {
        let mut namespaces = HashMap::new();
        namespaces.insert(
            "bi".to_string(),
            NamespaceRule {
                patterns: vec!["bi/*".into(), "sales/*".into()],
                isolation: "strict".into(),
                cross_read: vec!["shared/*".into()],
            },
        );
        namespaces.insert(
            "code".to_string(),
            NamespaceRule {
                patterns: vec!["code/*".into(), "tech/*".into()],
                isolation: "strict".into(),
                cross_read: vec!["shared/*".into()],
            },
        );
        namespaces.insert(
            "shared".to_string(),
            NamespaceRule {
                patterns: vec!["shared/*".into(), "company/*".into()],
                isolation: "none".into(),
                cross_read: vec!["*".into()],
            },
        );

        Self {
            namespaces,
            tiers: TiersConfig {
                l1_ephemeral: L1Config {
                    primary: "redis".into(),
                    ttl_default: 3600,
                },
                l2_vector: L2Config {
                    primary: "weaviate".into(),
                    hybrid_alpha: 0.65,
                    embedding_dimension: None,
                },
                l3_structured: L3Config {
                    primary: "neon".into(),
                },
                l4_cold: L4Config {
                    primary: "s3".into(),
                },
            },
            performance: PerformanceConfig {
                batch_sizes: BatchSizes {
                    embedding: 32,
                    upsert: 100,
                    search: 10,
                },
                cache: CacheConfig {
                    search_ttl: 300,
                    fact_ttl: 3600,
                    embedding_ttl: 86400,
                },
            },
        }
    }
}
