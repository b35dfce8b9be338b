//! Interceptable native call points
//!
//! A call point is one of the two counter-increment entry points in the
//! server binary. Locating it is a per-platform concern: Windows gamedata
//! carries raw byte signatures scanned over the module image, Linux gamedata
//! carries exported symbol names. Both strategies implement
//! [`CallPointResolver`]; the right one is selected at initialization from
//! what the gamedata entry carries.

#[cfg(unix)]
use std::ffi::CString;

use crate::gamedata::{scan_signature, CallPointSpec, GamedataError};

/// A loaded module's memory image, as handed over by the host loader
#[derive(Debug, Clone, Copy)]
pub struct ModuleImage {
    /// Base address of the mapped image
    pub base: usize,
    /// Mapped size in bytes
    pub len: usize,
}

impl ModuleImage {
    /// Describe a mapped module.
    ///
    /// # Safety
    /// The range `[base, base + len)` must stay valid and readable for the
    /// lifetime of any resolver built from this image.
    pub unsafe fn new(base: usize, len: usize) -> Self {
        Self { base, len }
    }
}

/// Strategy for turning a gamedata entry into a function entry-point address
pub trait CallPointResolver {
    /// Resolve `spec` to a raw entry-point address.
    ///
    /// `name` is the gamedata entry name, used only for error reporting.
    fn resolve(&self, name: &str, spec: &CallPointSpec) -> Result<usize, GamedataError>;
}

/// Raw-address strategy: scan a byte signature over the server module image
#[derive(Debug, Clone, Copy)]
pub struct SignatureScan {
    image: ModuleImage,
}

impl SignatureScan {
    pub fn new(image: ModuleImage) -> Self {
        Self { image }
    }
}

impl CallPointResolver for SignatureScan {
    fn resolve(&self, name: &str, spec: &CallPointSpec) -> Result<usize, GamedataError> {
        let CallPointSpec::Signature(pattern) = spec else {
            return Err(GamedataError::InvalidSignature(format!(
                "{}: signature scan requires a byte pattern",
                name
            )));
        };

        // SAFETY: the ModuleImage contract guarantees the range is readable.
        let found = unsafe {
            scan_signature(self.image.base as *const u8, self.image.len, pattern)
        };

        match found {
            Some(ptr) => {
                let address = ptr as usize;
                tracing::info!("Resolved {} via signature scan at {:#x}", name, address);
                Ok(address)
            }
            None => Err(GamedataError::ScanFailed(name.to_string())),
        }
    }
}

/// Named-symbol strategy: look the entry point up in the loaded server binary
#[derive(Debug, Clone, Copy, Default)]
pub struct NamedSymbol;

impl CallPointResolver for NamedSymbol {
    #[cfg(unix)]
    fn resolve(&self, name: &str, spec: &CallPointSpec) -> Result<usize, GamedataError> {
        let CallPointSpec::Symbol(symbol) = spec else {
            return Err(GamedataError::SymbolNotFound(format!(
                "{}: symbol resolution requires a symbol name",
                name
            )));
        };

        let c_symbol = CString::new(symbol.as_str())
            .map_err(|_| GamedataError::SymbolNotFound(symbol.clone()))?;

        // SAFETY: dlsym with RTLD_DEFAULT searches the already-loaded images.
        let address = unsafe { libc::dlsym(libc::RTLD_DEFAULT, c_symbol.as_ptr()) };

        if address.is_null() {
            return Err(GamedataError::SymbolNotFound(symbol.clone()));
        }

        let address = address as usize;
        tracing::info!("Resolved {} via symbol {} at {:#x}", name, symbol, address);
        Ok(address)
    }

    #[cfg(not(unix))]
    fn resolve(&self, name: &str, spec: &CallPointSpec) -> Result<usize, GamedataError> {
        let _ = spec;
        Err(GamedataError::SymbolNotFound(format!(
            "{}: symbol resolution unavailable on this platform",
            name
        )))
    }
}

/// Resolve a call point with the strategy matching what the gamedata carries
pub fn resolve_call_point(
    name: &str,
    spec: &CallPointSpec,
    image: Option<ModuleImage>,
) -> Result<usize, GamedataError> {
    match spec {
        CallPointSpec::Signature(_) => {
            let image = image.ok_or_else(|| {
                GamedataError::ScanFailed(format!("{}: no module image to scan", name))
            })?;
            SignatureScan::new(image).resolve(name, spec)
        }
        CallPointSpec::Symbol(_) => NamedSymbol.resolve(name, spec),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamedata::parse_signature;

    #[test]
    fn test_signature_scan_resolves_into_image() {
        let data: [u8; 8] = [0x90, 0x90, 0x55, 0x8B, 0xEC, 0xC3, 0x90, 0x90];
        let image = unsafe { ModuleImage::new(data.as_ptr() as usize, data.len()) };
        let spec = CallPointSpec::Signature(parse_signature("55 8B EC").unwrap());

        let address = SignatureScan::new(image)
            .resolve("IncrementFragCount", &spec)
            .unwrap();
        assert_eq!(address, data.as_ptr() as usize + 2);
    }

    #[test]
    fn test_signature_scan_failure() {
        let data: [u8; 4] = [0x00, 0x01, 0x02, 0x03];
        let image = unsafe { ModuleImage::new(data.as_ptr() as usize, data.len()) };
        let spec = CallPointSpec::Signature(parse_signature("AA BB").unwrap());

        let err = SignatureScan::new(image)
            .resolve("IncrementFragCount", &spec)
            .unwrap_err();
        assert!(matches!(err, GamedataError::ScanFailed(_)));
    }

    #[test]
    fn test_signature_scan_rejects_symbol_spec() {
        let data: [u8; 1] = [0x90];
        let image = unsafe { ModuleImage::new(data.as_ptr() as usize, data.len()) };
        let spec = CallPointSpec::Symbol("IncrementFragCount".to_string());

        let err = SignatureScan::new(image)
            .resolve("IncrementFragCount", &spec)
            .unwrap_err();
        assert!(matches!(err, GamedataError::InvalidSignature(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_named_symbol_resolves_libc_export() {
        // strlen is exported by every loaded libc
        let spec = CallPointSpec::Symbol("strlen".to_string());
        let address = NamedSymbol.resolve("strlen", &spec).unwrap();
        assert_ne!(address, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_named_symbol_missing() {
        let spec = CallPointSpec::Symbol("ggscore_no_such_symbol_12345".to_string());
        let err = NamedSymbol.resolve("bogus", &spec).unwrap_err();
        assert!(matches!(err, GamedataError::SymbolNotFound(_)));
    }
}
