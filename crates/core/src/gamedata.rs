//! Gamedata: per-game, per-platform native entry-point data
//!
//! The two counter functions are located from a JSON data file deployed with
//! the plugin, keyed by game name and then platform. On Windows the entries
//! are space-separated hex signature patterns scanned over the server module;
//! on Linux they are exported symbol names. Shipping the data as a file
//! allows updating offsets without recompiling.
//!
//! A missing game/platform combination is fatal at load time: the plugin
//! refuses to load rather than run with undefined entry points.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

/// Gamedata entry name for the frag-counter function
pub const FRAG_COUNT_ENTRY: &str = "IncrementFragCount";

/// Gamedata entry name for the death-counter function
pub const DEATH_COUNT_ENTRY: &str = "IncrementDeathCount";

/// Errors that can occur when loading or resolving gamedata
#[derive(Debug, Error)]
pub enum GamedataError {
    #[error("Failed to read gamedata file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse gamedata JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Game \"{game}\" on platform \"{platform}\" not currently supported")]
    UnsupportedGame { game: String, platform: String },

    #[error("Gamedata entry not found: {0}")]
    EntryNotFound(String),

    #[error("Invalid signature pattern: {0}")]
    InvalidSignature(String),

    #[error("Failed to find signature in module: {0}")]
    ScanFailed(String),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),
}

/// How one native entry point is located
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallPointSpec {
    /// Byte pattern scanned over the server module image (Windows data)
    Signature(Vec<Option<u8>>),
    /// Exported symbol name resolved from the loaded server binary (Linux data)
    Symbol(String),
}

/// Gamedata loaded for one game/platform combination
#[derive(Debug, Default)]
pub struct Gamedata {
    entries: HashMap<String, CallPointSpec>,
}

impl Gamedata {
    /// Load gamedata for `game` on `platform` from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(
        path: P,
        game: &str,
        platform: &str,
    ) -> Result<Self, GamedataError> {
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, game, platform)
    }

    /// Load gamedata for `game` on `platform` from a JSON string.
    ///
    /// The file layout is `{ game: { platform: { entry: value } } }`.
    /// Windows values are hex signature patterns; all other platforms carry
    /// symbol names.
    pub fn load_from_str(json: &str, game: &str, platform: &str) -> Result<Self, GamedataError> {
        let raw: Value = serde_json::from_str(json)?;

        let section = raw
            .get(game)
            .and_then(|g| g.get(platform))
            .and_then(Value::as_object)
            .filter(|section| !section.is_empty())
            .ok_or_else(|| GamedataError::UnsupportedGame {
                game: game.to_string(),
                platform: platform.to_string(),
            })?;

        let mut entries = HashMap::new();
        for (name, value) in section {
            let Some(text) = value.as_str() else {
                return Err(GamedataError::InvalidSignature(format!(
                    "{}: expected string value",
                    name
                )));
            };
            let spec = if platform == "windows" {
                CallPointSpec::Signature(parse_signature(text)?)
            } else {
                CallPointSpec::Symbol(text.to_string())
            };
            entries.insert(name.clone(), spec);
        }

        tracing::info!(
            "Loaded gamedata for {}/{}: {} entries",
            game,
            platform,
            entries.len()
        );

        Ok(Gamedata { entries })
    }

    /// Get the spec for a named entry point
    pub fn entry(&self, name: &str) -> Result<&CallPointSpec, GamedataError> {
        self.entries
            .get(name)
            .ok_or_else(|| GamedataError::EntryNotFound(name.to_string()))
    }
}

/// The platform key used in gamedata files for the running build
pub fn current_platform() -> &'static str {
    #[cfg(target_os = "windows")]
    {
        "windows"
    }
    #[cfg(not(target_os = "windows"))]
    {
        "linux"
    }
}

/// Parse a signature pattern string into bytes
///
/// Supports:
/// - Hex bytes: "55 48 89 E5"
/// - Wildcards: "55 ? 89 E5" or "55 ?? 89 E5"
pub fn parse_signature(pattern: &str) -> Result<Vec<Option<u8>>, GamedataError> {
    let mut result = Vec::new();

    for part in pattern.split_whitespace() {
        if part == "?" || part == "??" {
            result.push(None); // Wildcard
        } else {
            let byte = u8::from_str_radix(part, 16).map_err(|_| {
                GamedataError::InvalidSignature(format!("Invalid hex byte: {}", part))
            })?;
            result.push(Some(byte));
        }
    }

    if result.is_empty() {
        return Err(GamedataError::InvalidSignature(
            "Empty signature pattern".to_string(),
        ));
    }

    Ok(result)
}

/// Scan memory for a signature pattern
///
/// # Safety
/// The memory region must be valid and readable.
pub unsafe fn scan_signature(
    start: *const u8,
    size: usize,
    pattern: &[Option<u8>],
) -> Option<*const u8> {
    if pattern.is_empty() || size < pattern.len() {
        return None;
    }

    let end = size - pattern.len();

    'outer: for offset in 0..=end {
        for (i, expected) in pattern.iter().enumerate() {
            if let Some(byte) = expected {
                let actual = *start.add(offset + i);
                if actual != *byte {
                    continue 'outer;
                }
            }
        }
        // All bytes matched
        return Some(start.add(offset));
    }

    None
}
