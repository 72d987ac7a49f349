//! Total dimension-to-probe dispatch.
//!
//! An evidence producer that specializes per dimension registers its
//! probes here. Lookup is total: a dimension with no registered probe
//! resolves to the declared default instead of being string-matched or
//! silently skipped.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::domain::{Dimension, Evidence};

/// One inspection strategy for a dimension, run against a local checkout.
pub trait DimensionProbe: Send + Sync {
    fn inspect(&self, root: &Path, dimension: &Dimension) -> Vec<Evidence>;
}

/// Blanket impl so plain functions and closures can be registered.
impl<F> DimensionProbe for F
where
    F: Fn(&Path, &Dimension) -> Vec<Evidence> + Send + Sync,
{
    fn inspect(&self, root: &Path, dimension: &Dimension) -> Vec<Evidence> {
        self(root, dimension)
    }
}

/// Registry mapping dimension ids to specialized probes, with a declared
/// default used when no entry exists.
pub struct ProbeRegistry {
    probes: HashMap<String, Arc<dyn DimensionProbe>>,
    default: Arc<dyn DimensionProbe>,
}

impl ProbeRegistry {
    /// Create a registry with the given default probe.
    pub fn new(default: Arc<dyn DimensionProbe>) -> Self {
        Self {
            probes: HashMap::new(),
            default,
        }
    }

    /// Register a specialized probe for one dimension id.
    pub fn register(
        mut self,
        dimension_id: impl Into<String>,
        probe: Arc<dyn DimensionProbe>,
    ) -> Self {
        self.probes.insert(dimension_id.into(), probe);
        self
    }

    /// Resolve the probe for a dimension id. Total: unknown ids get the
    /// default probe.
    pub fn resolve(&self, dimension_id: &str) -> &Arc<dyn DimensionProbe> {
        self.probes.get(dimension_id).unwrap_or(&self.default)
    }

    /// Whether a specialized probe is registered for this id.
    pub fn has_specialized(&self, dimension_id: &str) -> bool {
        self.probes.contains_key(dimension_id)
    }
}
