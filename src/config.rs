//! Configuration for a [ConcurrentCache](crate::ConcurrentCache).
use crate::CacheError;

#[derive(Clone, Debug, Default, derive_builder::Builder)]
#[builder(default)]
pub struct CacheConfig {
    /// Maximum bytes held before evicting.  Keys count towards this as well as values.  0 means unbounded.
    pub max_bytes: u64,
}

impl CacheConfig {
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }
}

impl CacheConfigBuilder {
    /// Like `build`, but folding the failure into [CacheError].
    pub fn finish(&self) -> Result<CacheConfig, CacheError> {
        Ok(self.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_unbounded() {
        let cfg = CacheConfig::builder().build().expect("Should build");
        assert_eq!(cfg.max_bytes, 0);
    }

    #[test]
    fn test_builder_sets_budget() {
        let cfg = CacheConfig::builder()
            .max_bytes(4096)
            .finish()
            .expect("Should build");
        assert_eq!(cfg.max_bytes, 4096);
    }
}
