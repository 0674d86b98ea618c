//! Compiled unit cache
//!
//! Compiled units are keyed by [`source_hash`], a SHA-256 over the unit,
//! the codegen configuration and the signature table fingerprint.
//!
//! - Each thread has its own in-memory cache (`thread_local!`)
//! - [`CompiledUnit::to_bytes`] / [`CompiledUnit::from_bytes`] persist a
//!   unit with bincode; loading checks the format version and the hash
//!
//! `SUBSET_PHP_CACHE_DEBUG` logs hits and misses to stderr.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::analyze::SignatureLookup;
use crate::api::{compile_unit, CompiledUnit};
use crate::codegen::CodegenConfig;
use crate::config::CompilerConfig;
use crate::debug::{cache_debug_enabled, debug_log};
use crate::error::{CompileError, CompileResult};
use crate::ir::CompilationUnit;

/// Version of the serialized unit format. Bump when `CompiledUnit` or the
/// generated code shape changes.
const CACHE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SerializedUnit {
    version: u32,
    unit: CompiledUnit,
}

thread_local! {
    /// Compiled units by source hash
    static UNIT_CACHE: RefCell<HashMap<String, CompiledUnit>> = RefCell::new(HashMap::new());
}

fn log_cache(args: std::fmt::Arguments<'_>) {
    if cache_debug_enabled() {
        debug_log(args);
    }
}

/// Cache key of `unit` compiled with `config` against `signatures`, as 64
/// lowercase hex characters
pub fn source_hash(
    unit: &CompilationUnit,
    signatures: &dyn SignatureLookup,
    config: &CodegenConfig,
) -> CompileResult<String> {
    let unit_bytes = bincode::serialize(unit)
        .map_err(|e| CompileError::Cache(format!("Serialization failed: {}", e)))?;
    let config_bytes = bincode::serialize(config)
        .map_err(|e| CompileError::Cache(format!("Serialization failed: {}", e)))?;
    let mut hasher = Sha256::new();
    hasher.update(CACHE_VERSION.to_le_bytes());
    hasher.update(&unit_bytes);
    hasher.update(&config_bytes);
    hasher.update(signatures.fingerprint().as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

impl CompiledUnit {
    pub fn to_bytes(&self) -> CompileResult<Vec<u8>> {
        let serialized = SerializedUnit {
            version: CACHE_VERSION,
            unit: self.clone(),
        };
        bincode::serialize(&serialized)
            .map_err(|e| CompileError::Cache(format!("Serialization failed: {}", e)))
    }

    /// Load a unit written by [`CompiledUnit::to_bytes`]. Fails when the
    /// format version differs or the unit was compiled from other input.
    pub fn from_bytes(bytes: &[u8], expected_hash: &str) -> CompileResult<Self> {
        let serialized: SerializedUnit = bincode::deserialize(bytes)
            .map_err(|e| CompileError::Cache(format!("Deserialization failed: {}", e)))?;
        if serialized.version != CACHE_VERSION {
            return Err(CompileError::Cache(format!(
                "Cache version mismatch: expected {}, got {}",
                CACHE_VERSION, serialized.version
            )));
        }
        if serialized.unit.source_hash != expected_hash {
            return Err(CompileError::Cache(format!(
                "Source hash mismatch: expected {}, got {}",
                expected_hash, serialized.unit.source_hash
            )));
        }
        Ok(serialized.unit)
    }
}

/// Compile `unit`, reusing this thread's earlier result for identical
/// input. Faulted units are never cached.
pub fn compile_unit_cached(
    unit: &CompilationUnit,
    signatures: &dyn SignatureLookup,
    config: &CompilerConfig,
) -> CompileResult<CompiledUnit> {
    if !config.cache_enabled() {
        log_cache(format_args!("[Cache] DISABLED"));
        return compile_unit(unit, signatures, &config.codegen);
    }

    let hash = source_hash(unit, signatures, &config.codegen)?;
    let cached = UNIT_CACHE.with(|cache| cache.borrow().get(&hash).cloned());
    if let Some(compiled) = cached {
        log_cache(format_args!("[Cache] HIT {}", &hash[..12]));
        return Ok(compiled);
    }

    let compiled = compile_unit(unit, signatures, &config.codegen)?;
    log_cache(format_args!(
        "[Cache] MISS {} - compiled {} functions",
        &hash[..12],
        compiled.functions.len()
    ));
    UNIT_CACHE.with(|cache| {
        cache.borrow_mut().insert(hash, compiled.clone());
    });
    Ok(compiled)
}

/// Number of units cached on this thread
pub fn cached_unit_count() -> usize {
    UNIT_CACHE.with(|cache| cache.borrow().len())
}

/// Drop every cached unit on this thread
pub fn clear_cache() {
    UNIT_CACHE.with(|cache| cache.borrow_mut().clear());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{Signature, SignatureTable};
    use crate::ir::{ExprFactory, FunctionDecl};

    fn sample_unit(value: i64) -> CompilationUnit {
        let f = ExprFactory::new(Some("c.php"));
        let loc = f.location(1, 1);
        let body = vec![f.create_assign(
            loc.clone(),
            f.create_var(loc.clone(), "x"),
            f.create_long(loc.clone(), value),
        )];
        let result = f.create_var(loc, "x");
        CompilationUnit::new(Some("c.php"), vec![FunctionDecl::new("c", vec![], body, Some(result))])
    }

    #[test]
    fn test_source_hash_is_64_lowercase_hex() {
        let hash = source_hash(&sample_unit(1), &SignatureTable::new(), &CodegenConfig::new()).unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_source_hash_tracks_every_input() {
        let signatures = SignatureTable::new();
        let config = CodegenConfig::new();
        let base = source_hash(&sample_unit(1), &signatures, &config).unwrap();
        assert_eq!(base, source_hash(&sample_unit(1), &signatures, &config).unwrap());
        assert_ne!(base, source_hash(&sample_unit(2), &signatures, &config).unwrap());
        assert_ne!(
            base,
            source_hash(&sample_unit(1), &signatures, &CodegenConfig::release()).unwrap()
        );
        let mut other = SignatureTable::new();
        other.add_function("f", Signature::with_refs(&[0]));
        assert_ne!(base, source_hash(&sample_unit(1), &other, &config).unwrap());
    }

    #[test]
    fn test_bytes_round_trip_checks_hash() {
        let compiled =
            compile_unit(&sample_unit(3), &SignatureTable::new(), &CodegenConfig::new()).unwrap();
        let bytes = compiled.to_bytes().unwrap();
        let loaded = CompiledUnit::from_bytes(&bytes, &compiled.source_hash).unwrap();
        assert_eq!(loaded, compiled);

        let err = CompiledUnit::from_bytes(&bytes, "0000").unwrap_err();
        assert!(matches!(err, CompileError::Cache(_)), "got {:?}", err);
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        let err = CompiledUnit::from_bytes(b"not a compiled unit", "x").unwrap_err();
        assert!(matches!(err, CompileError::Cache(_)), "got {:?}", err);
        assert!(CompiledUnit::from_bytes(&[], "x").is_err());
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let compiled =
            compile_unit(&sample_unit(4), &SignatureTable::new(), &CodegenConfig::new()).unwrap();
        let hash = compiled.source_hash.clone();
        let bytes = bincode::serialize(&SerializedUnit {
            version: CACHE_VERSION + 1,
            unit: compiled,
        })
        .unwrap();
        let err = CompiledUnit::from_bytes(&bytes, &hash).unwrap_err();
        assert!(err.to_string().contains("version mismatch"), "got {}", err);
    }

    #[test]
    fn test_cached_compile_reuses_result() {
        clear_cache();
        let config = CompilerConfig::new();
        let signatures = SignatureTable::new();
        let first = compile_unit_cached(&sample_unit(5), &signatures, &config).unwrap();
        let second = compile_unit_cached(&sample_unit(5), &signatures, &config).unwrap();
        assert_eq!(first, second);
        if config.cache_enabled() {
            assert_eq!(cached_unit_count(), 1);
        }
        clear_cache();
        assert_eq!(cached_unit_count(), 0);
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        clear_cache();
        let mut config = CompilerConfig::new();
        config.cache.enabled = false;
        compile_unit_cached(&sample_unit(6), &SignatureTable::new(), &config).unwrap();
        assert_eq!(cached_unit_count(), 0);
    }
}
