//! Multi-Layer Compositing State
//!
//! Each layer draws its own spectrum slice with its own theme and flags.
//! Layers are composited back to front following a z-order that is always a
//! permutation of the layer indices.

use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::theme::Theme;

/// Smallest and largest energy boost a layer accepts
pub const BOOST_RANGE: (f32, f32) = (0.1, 8.0);

#[derive(Debug, Clone, PartialEq)]
pub struct LayerState {
    pub name: String,
    pub theme: Theme,
    pub bars: bool,
    pub gradient: bool,
    pub overflow: bool,
    pub peaks: bool,
    pub visible: bool,
    /// Multiplier applied to this layer's bar values before drawing
    pub energy_boost: f32,
}

impl LayerState {
    pub fn new(name: impl Into<String>, theme: Theme) -> Self {
        Self {
            name: name.into(),
            theme,
            bars: true,
            gradient: true,
            overflow: false,
            peaks: false,
            visible: true,
            energy_boost: 1.0,
        }
    }
}

/// Ordered set of layers plus their z-order
#[derive(Debug, Clone, Default)]
pub struct LayerStack {
    layers: Vec<LayerState>,
    /// Layer indices, back (drawn first) to front
    order: Vec<usize>,
    selected: usize,
}

impl LayerStack {
    pub fn new(layers: Vec<LayerState>) -> Self {
        let order = (0..layers.len()).collect();
        Self {
            layers,
            order,
            selected: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[LayerState] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&LayerState> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> RenderResult<&mut LayerState> {
        let count = self.layers.len();
        self.layers
            .get_mut(index)
            .ok_or(RenderError::LayerOutOfRange { index, count })
    }

    /// Layer indices back to front
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Position of a layer in the z-order (0 = back)
    pub fn z_index(&self, index: usize) -> Option<usize> {
        self.order.iter().position(|&i| i == index)
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn select(&mut self, index: usize) -> RenderResult<()> {
        self.check(index)?;
        self.selected = index;
        Ok(())
    }

    fn check(&self, index: usize) -> RenderResult<usize> {
        self.z_index(index).ok_or(RenderError::LayerOutOfRange {
            index,
            count: self.layers.len(),
        })
    }

    /// Move a layer one step toward the front. Returns false if already frontmost.
    pub fn bring_forward(&mut self, index: usize) -> RenderResult<bool> {
        let z = self.check(index)?;
        if z + 1 >= self.order.len() {
            return Ok(false);
        }
        self.order.swap(z, z + 1);
        debug!("Layer {} moved forward to z {}", index, z + 1);
        Ok(true)
    }

    /// Move a layer one step toward the back. Returns false if already backmost.
    pub fn send_backward(&mut self, index: usize) -> RenderResult<bool> {
        let z = self.check(index)?;
        if z == 0 {
            return Ok(false);
        }
        self.order.swap(z, z - 1);
        debug!("Layer {} moved backward to z {}", index, z - 1);
        Ok(true)
    }

    pub fn bring_to_front(&mut self, index: usize) -> RenderResult<()> {
        let z = self.check(index)?;
        let id = self.order.remove(z);
        self.order.push(id);
        Ok(())
    }

    pub fn send_to_back(&mut self, index: usize) -> RenderResult<()> {
        let z = self.check(index)?;
        let id = self.order.remove(z);
        self.order.insert(0, id);
        Ok(())
    }

    /// Flip visibility; returns the new state
    pub fn toggle_visible(&mut self, index: usize) -> RenderResult<bool> {
        let layer = self.layer_mut(index)?;
        layer.visible = !layer.visible;
        Ok(layer.visible)
    }

    /// Scale a layer's energy boost by `factor`, clamped to [`BOOST_RANGE`]
    pub fn scale_boost(&mut self, index: usize, factor: f32) -> RenderResult<f32> {
        let layer = self.layer_mut(index)?;
        let boosted = layer.energy_boost * factor;
        if boosted.is_finite() {
            layer.energy_boost = boosted.clamp(BOOST_RANGE.0, BOOST_RANGE.1);
        }
        Ok(layer.energy_boost)
    }

    /// Iterate visible layers back to front
    pub fn back_to_front(&self) -> impl Iterator<Item = (usize, &LayerState)> {
        self.order
            .iter()
            .map(move |&i| (i, &self.layers[i]))
            .filter(|(_, layer)| layer.visible)
    }
}
