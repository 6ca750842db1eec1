//! The engine value carrying configuration and merge-field metadata.

use devtemplate_core::PatchMeta;

use crate::config::EngineConfig;

/// Override and merge engine.
///
/// Holds no state between calls: every operation clones its inputs and
/// returns a new document. The default engine uses
/// [`EngineConfig::default`] and [`PatchMeta::template_content`].
///
/// # Examples
///
/// ```
/// use devtemplate_overriding::{EngineConfig, EventOrder, TemplateEngine};
///
/// let engine = TemplateEngine::new(EngineConfig {
///     event_order: EventOrder::Sorted,
///     ..EngineConfig::default()
/// });
/// assert_eq!(engine.config().event_order, EventOrder::Sorted);
/// ```
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    pub(crate) config: EngineConfig,
    pub(crate) meta: PatchMeta,
}

impl TemplateEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            meta: PatchMeta::template_content(),
        }
    }

    /// Replaces the merge-field metadata table.
    pub fn with_meta(mut self, meta: PatchMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn meta(&self) -> &PatchMeta {
        &self.meta
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
