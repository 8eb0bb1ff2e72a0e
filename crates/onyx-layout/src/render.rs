//! Widget renderer lookup.
//!
//! The engine never interprets the props bundle handed to renderers. It only
//! finds the renderer registered for a widget id and passes the bundle on.

use std::fmt;

use rustc_hash::FxHashMap;

use onyx_core::WidgetId;

use crate::grid::GridItem;

/// Turns one planned grid item plus the shared props into output `Self::Output`.
pub trait WidgetRenderer<P: ?Sized> {
    type Output;

    fn render(&self, item: &GridItem, props: &P) -> Self::Output;
}

impl<P, O, F> WidgetRenderer<P> for F
where
    P: ?Sized,
    F: Fn(&GridItem, &P) -> O,
{
    type Output = O;

    fn render(&self, item: &GridItem, props: &P) -> O {
        self(item, props)
    }
}

/// Renderers keyed by widget id.
pub struct RendererRegistry<P: ?Sized, O> {
    renderers: FxHashMap<WidgetId, Box<dyn WidgetRenderer<P, Output = O>>>,
}

impl<P: ?Sized, O> Default for RendererRegistry<P, O> {
    fn default() -> Self {
        Self {
            renderers: FxHashMap::default(),
        }
    }
}

impl<P: ?Sized, O> fmt::Debug for RendererRegistry<P, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.renderers.keys().map(WidgetId::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("RendererRegistry")
            .field("widgets", &ids)
            .finish()
    }
}

impl<P: ?Sized, O> RendererRegistry<P, O> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the renderer for a widget id.
    pub fn register<R>(&mut self, widget: impl Into<WidgetId>, renderer: R)
    where
        R: WidgetRenderer<P, Output = O> + 'static,
    {
        self.renderers.insert(widget.into(), Box::new(renderer));
    }

    #[must_use]
    pub fn with<R>(mut self, widget: impl Into<WidgetId>, renderer: R) -> Self
    where
        R: WidgetRenderer<P, Output = O> + 'static,
    {
        self.register(widget, renderer);
        self
    }

    #[must_use]
    pub fn get(&self, widget: &str) -> Option<&dyn WidgetRenderer<P, Output = O>> {
        self.renderers.get(widget).map(|renderer| &**renderer)
    }

    #[must_use]
    pub fn contains(&self, widget: &str) -> bool {
        self.renderers.contains_key(widget)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

/// Output of one rendered grid item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedWidget<O> {
    pub id: WidgetId,
    pub output: O,
}
