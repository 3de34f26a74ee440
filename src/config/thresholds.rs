use serde::{Deserialize, Serialize};

/// Per-function warning cutoffs and the project rating buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityThresholds {
    #[serde(default = "default_max_cyclomatic")]
    pub max_cyclomatic: u32,

    #[serde(default = "default_max_cognitive")]
    pub max_cognitive: u32,

    #[serde(default = "default_max_nesting")]
    pub max_nesting: u32,

    /// Upper bounds for excellent, good, moderate and complex; anything above is very complex.
    #[serde(default = "default_rating_buckets")]
    pub rating_buckets: [f64; 4],
}

impl Default for ComplexityThresholds {
    fn default() -> Self {
        Self {
            max_cyclomatic: default_max_cyclomatic(),
            max_cognitive: default_max_cognitive(),
            max_nesting: default_max_nesting(),
            rating_buckets: default_rating_buckets(),
        }
    }
}

impl ComplexityThresholds {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_cyclomatic == 0 {
            return Err("complexity.max_cyclomatic must be at least 1".to_string());
        }
        let ascending = self
            .rating_buckets
            .windows(2)
            .all(|pair| pair[0] < pair[1]);
        if !ascending || self.rating_buckets.iter().any(|b| !b.is_finite() || *b < 0.0) {
            return Err("complexity.rating_buckets must be finite, non-negative and ascending".to_string());
        }
        Ok(())
    }
}

fn default_max_cyclomatic() -> u32 {
    10
}

fn default_max_cognitive() -> u32 {
    15
}

fn default_max_nesting() -> u32 {
    4
}

fn default_rating_buckets() -> [f64; 4] {
    [5.0, 10.0, 15.0, 25.0]
}

/// Minimum literal lengths for the line-based secret detectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretThresholds {
    #[serde(default = "default_api_key_min_len")]
    pub api_key_min_len: usize,

    #[serde(default = "default_secret_min_len")]
    pub secret_min_len: usize,

    #[serde(default = "default_password_min_len")]
    pub password_min_len: usize,

    #[serde(default = "default_token_min_len")]
    pub token_min_len: usize,
}

impl Default for SecretThresholds {
    fn default() -> Self {
        Self {
            api_key_min_len: default_api_key_min_len(),
            secret_min_len: default_secret_min_len(),
            password_min_len: default_password_min_len(),
            token_min_len: default_token_min_len(),
        }
    }
}

impl SecretThresholds {
    pub fn validate(&self) -> Result<(), String> {
        let lengths = [
            ("api_key_min_len", self.api_key_min_len),
            ("secret_min_len", self.secret_min_len),
            ("password_min_len", self.password_min_len),
            ("token_min_len", self.token_min_len),
        ];
        match lengths.iter().find(|(_, len)| *len == 0 || *len > 512) {
            Some((name, len)) => Err(format!("secrets.{name} = {len} is outside 1..=512")),
            None => Ok(()),
        }
    }
}

fn default_api_key_min_len() -> usize {
    16
}

fn default_secret_min_len() -> usize {
    10
}

fn default_password_min_len() -> usize {
    3
}

fn default_token_min_len() -> usize {
    10
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceThresholds {
    /// Array literals with more elements than this are flagged
    #[serde(default = "default_large_array_elements")]
    pub large_array_elements: usize,
}

impl Default for PerformanceThresholds {
    fn default() -> Self {
        Self {
            large_array_elements: default_large_array_elements(),
        }
    }
}

fn default_large_array_elements() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_defaults() {
        let thresholds = ComplexityThresholds::default();
        assert_eq!(thresholds.max_cyclomatic, 10);
        assert_eq!(thresholds.max_cognitive, 15);
        assert_eq!(thresholds.max_nesting, 4);
        assert!(thresholds.validate().is_ok());
    }

    #[test]
    fn test_unordered_buckets_rejected() {
        let thresholds = ComplexityThresholds {
            rating_buckets: [5.0, 4.0, 15.0, 25.0],
            ..Default::default()
        };
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_zero_secret_length_rejected() {
        let thresholds = SecretThresholds {
            token_min_len: 0,
            ..Default::default()
        };
        let err = thresholds.validate().unwrap_err();
        assert!(err.contains("token_min_len"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let thresholds: ComplexityThresholds = toml::from_str("max_cyclomatic = 20").unwrap();
        assert_eq!(thresholds.max_cyclomatic, 20);
        assert_eq!(thresholds.max_cognitive, 15);
    }
}
