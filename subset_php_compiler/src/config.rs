//! Compiler configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! [codegen]
//! indent = "  "
//! emit_comments = false
//!
//! [cache]
//! enabled = true
//! ```
//!
//! Every key is optional. `SUBSET_PHP_DISABLE_CACHE` turns the compiled
//! unit cache off regardless of the file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codegen::CodegenConfig;
use crate::error::{CompileError, CompileResult};

/// Check if the cache is disabled via environment variable
pub(crate) fn is_cache_disabled() -> bool {
    std::env::var("SUBSET_PHP_DISABLE_CACHE").is_ok()
}

/// Compiled unit cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    pub codegen: CodegenConfig,
    pub cache: CacheConfig,
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release settings: no statement comments
    pub fn release() -> Self {
        Self {
            codegen: CodegenConfig::release(),
            cache: CacheConfig::default(),
        }
    }

    pub fn from_toml_str(source: &str) -> CompileResult<Self> {
        toml::from_str(source).map_err(|e| CompileError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> CompileResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| CompileError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    /// Whether compiled units are cached, after the environment override
    pub fn cache_enabled(&self) -> bool {
        self.cache.enabled && !is_cache_disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_is_default() {
        let config = CompilerConfig::from_toml_str("").unwrap();
        assert_eq!(config, CompilerConfig::default());
        assert!(config.codegen.emit_comments);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_partial_tables() {
        let config = CompilerConfig::from_toml_str(
            r#"
            [codegen]
            emit_comments = false
            "#,
        )
        .unwrap();
        assert!(!config.codegen.emit_comments);
        assert_eq!(config.codegen.indent, "    ");
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = CompilerConfig::from_toml_str("[codegen]\ncolour = true\n").unwrap_err();
        assert!(matches!(err, CompileError::Config(_)), "got {:?}", err);
    }

    #[test]
    fn test_release() {
        let config = CompilerConfig::release();
        assert!(!config.codegen.emit_comments);
    }
}
