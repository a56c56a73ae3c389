//! Build-time configuration (ADDED ambient stack): seeds its defaults from
//! `DOCARC_*` environment variables, the same `from_env()` precedent the
//! CLI's flag parsing overrides afterward — env vars set the baseline,
//! explicit CLI flags (docarc-cli) win over whatever this returns.

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ParseConfigError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compressor {
    None,
    Huffman,
}

impl FromStr for Compressor {
    type Err = ParseConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Compressor::None),
            "huffman" => Ok(Compressor::Huffman),
            other => Err(ParseConfigError(format!("unknown compressor {other:?}, expected 'none' or 'huffman'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictType {
    Sync,
    Async,
}

impl FromStr for DictType {
    type Err = ParseConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sync" => Ok(DictType::Sync),
            "async" => Ok(DictType::Async),
            other => Err(ParseConfigError(format!("unknown dictionary type {other:?}, expected 'sync' or 'async'"))),
        }
    }
}

/// Every knob `docarc build` exposes, gathered in one place so the CLI's
/// subcommand handler doesn't thread six separate arguments through the
/// pipeline.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub compressor: Compressor,
    pub dict_type: DictType,
    pub async_threads: usize,
    pub read_optimized: bool,
    pub bake_string_id_index: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            compressor: Compressor::None,
            dict_type: DictType::Sync,
            async_threads: 4,
            read_optimized: false,
            bake_string_id_index: false,
        }
    }
}

impl BuildConfig {
    /// Reads `DOCARC_COMPRESSOR`, `DOCARC_DIC_TYPE`, `DOCARC_THREADS`,
    /// `DOCARC_READ_OPTIMIZED`, and `DOCARC_BAKE_STRING_ID_INDEX`; an unset
    /// or unparseable variable leaves the corresponding default untouched.
    pub fn from_env() -> Self {
        let mut cfg = BuildConfig::default();
        if let Ok(v) = std::env::var("DOCARC_COMPRESSOR") {
            if let Ok(c) = v.parse() {
                cfg.compressor = c;
            }
        }
        if let Ok(v) = std::env::var("DOCARC_DIC_TYPE") {
            if let Ok(d) = v.parse() {
                cfg.dict_type = d;
            }
        }
        if let Ok(v) = std::env::var("DOCARC_THREADS") {
            if let Ok(n) = v.parse() {
                cfg.async_threads = n;
            }
        }
        if let Ok(v) = std::env::var("DOCARC_READ_OPTIMIZED") {
            cfg.read_optimized = is_truthy(&v);
        }
        if let Ok(v) = std::env::var("DOCARC_BAKE_STRING_ID_INDEX") {
            cfg.bake_string_id_index = is_truthy(&v);
        }
        cfg
    }
}

fn is_truthy(v: &str) -> bool {
    matches!(v, "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_plain_sync() {
        let cfg = BuildConfig::default();
        assert_eq!(cfg.compressor, Compressor::None);
        assert_eq!(cfg.dict_type, DictType::Sync);
        assert!(!cfg.read_optimized);
        assert!(!cfg.bake_string_id_index);
    }

    #[test]
    fn compressor_parses_known_values() {
        assert_eq!("none".parse::<Compressor>().unwrap(), Compressor::None);
        assert_eq!("huffman".parse::<Compressor>().unwrap(), Compressor::Huffman);
        assert!("zstd".parse::<Compressor>().is_err());
    }

    #[test]
    fn dict_type_parses_known_values() {
        assert_eq!("sync".parse::<DictType>().unwrap(), DictType::Sync);
        assert_eq!("async".parse::<DictType>().unwrap(), DictType::Async);
        assert!("weird".parse::<DictType>().is_err());
    }
}
