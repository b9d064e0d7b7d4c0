//! Ring configuration.
//!
//! The ring has a single tunable, its order `m`. It can be given in code or
//! loaded from JSON:
//!
//! ```json
//! { "order": 5 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::space::{IdSpace, MAX_ORDER};

/// Order used when none is configured (a 32-slot ring).
pub const DEFAULT_ORDER: u32 = 5;

/// Parameters fixed at ring construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Ring order `m`; the identifier space is `[0, 2^m)`.
    pub order: u32,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
        }
    }
}

impl RingConfig {
    pub fn with_order(order: u32) -> Self {
        Self { order }
    }

    /// Checks the order and returns the identifier space it describes.
    pub fn validate(&self) -> Result<IdSpace> {
        if self.order == 0 || self.order > MAX_ORDER {
            return Err(Error::InvalidOrder(self.order));
        }
        IdSpace::new(self.order)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }
}
