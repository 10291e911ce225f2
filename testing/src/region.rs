//! Fixed region directory.

use async_trait::async_trait;
use registrar_core::region::{RegionDirectory, RegionError, RegionPaymentInfo};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Region directory backed by a map. Unknown webnames get [`RegionPaymentInfo::default`].
#[derive(Debug, Default)]
pub struct StaticRegionDirectory {
    regions: HashMap<String, RegionPaymentInfo>,
    unavailable: bool,
    lookups: AtomicUsize,
}

impl StaticRegionDirectory {
    /// Empty directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a region
    #[must_use]
    pub fn with_region(mut self, webname: &str, info: RegionPaymentInfo) -> Self {
        self.regions.insert(webname.to_string(), info);
        self
    }

    /// Directory whose every lookup fails
    #[must_use]
    pub fn unavailable() -> Self {
        Self { unavailable: true, ..Self::default() }
    }

    /// Number of lookups served
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegionDirectory for StaticRegionDirectory {
    async fn payment_info(&self, webname: &str) -> Result<RegionPaymentInfo, RegionError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(RegionError::Unavailable("directory offline".to_string()));
        }
        Ok(self.regions.get(webname).cloned().unwrap_or_default())
    }
}
