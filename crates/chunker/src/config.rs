use serde::{Deserialize, Serialize};

/// Configuration for chunk extraction behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Minimum chunk size in lines; smaller units are discarded because
    /// they are too small to usefully deduplicate and would dominate
    /// pairwise-comparison cost
    pub min_chunk_lines: usize,

    /// Scan brace-delimited blocks not covered by any parser boundary
    pub fallback_blocks: bool,

    /// Maximum nesting depth considered when scanning fallback blocks
    pub max_block_depth: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_chunk_lines: 5,
            fallback_blocks: true,
            max_block_depth: 3,
        }
    }
}

impl ExtractorConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.min_chunk_lines == 0 {
            return Err("min_chunk_lines must be > 0".to_string());
        }
        if self.fallback_blocks && self.max_block_depth == 0 {
            return Err("max_block_depth must be > 0 when fallback_blocks is enabled".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ExtractorConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_min_lines_rejected() {
        let config = ExtractorConfig {
            min_chunk_lines: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
