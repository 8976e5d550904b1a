use std::sync::Arc;

use super::Dictionary;

/// A dictionary that answers from multiple layers (system, user, ...).
///
/// A value is known if any layer knows it.
pub struct CompositeDictionary {
    layers: Vec<Arc<dyn Dictionary>>,
}

impl CompositeDictionary {
    pub fn new(layers: Vec<Arc<dyn Dictionary>>) -> Self {
        Self { layers }
    }

    pub fn push_layer(&mut self, layer: Arc<dyn Dictionary>) {
        self.layers.push(layer);
    }
}

impl Dictionary for CompositeDictionary {
    fn has_value(&self, value: &str) -> bool {
        self.layers.iter().any(|layer| layer.has_value(value))
    }
}
