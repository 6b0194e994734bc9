//! Designer session: the state behind one design canvas.
//!
//! DESIGN
//! ======
//! The session owns everything a canvas needs between events: the measured
//! scene, the snap-guide cache and its thresholds, the mouse selection, the
//! element being dragged in from the palette, the ghost containers, and the
//! form cache with its reconciler. Every input is a method call; every
//! output is queued in an [`Outbox`] that the host drains and posts back
//! across the frame boundary. Nothing here blocks or awaits.
//!
//! The outbox is also the reconciler's [`DesignFormCallbacks`] receiver, so
//! the signals of an edit batch come out in the same queue as snap replies.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use convert::Converter;
use formcache::{DesignFormCallbacks, FormCache, ReconcileReport, Reconciler};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;
use wire::{DesignBatch, DesignerMessage, SnapProperties};

use crate::geometry::{Point, Size};
use crate::ghosts::{GhostContainer, GhostFrame, RenderedContainer, layout_ghosts};
use crate::guides::{DynamicGuides, SnapThresholds};
use crate::hit::ResizeAnchor;
use crate::scene::{ElementBox, Scene};
use crate::selection::{Modifiers, MouseSelection};

// =============================================================================
// OUTBOX
// =============================================================================

/// Something the session wants the host to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    /// Post this event to the other side of the frame.
    Message(DesignerMessage),
    /// Re-render the form.
    Refresh,
    /// Reload the whole editor content.
    ContentRefresh,
}

/// Queue of [`Outgoing`] items, in the order they were produced.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: Vec<Outgoing>,
}

impl Outbox {
    pub fn push(&mut self, item: Outgoing) {
        self.queue.push(item);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Outgoing> {
        std::mem::take(&mut self.queue)
    }
}

impl DesignFormCallbacks for Outbox {
    fn render_ghosts(&mut self) {
        self.push(Outgoing::Message(DesignerMessage::RenderGhosts));
    }

    fn refresh(&mut self) {
        self.push(Outgoing::Refresh);
    }

    fn redraw_decorators(&mut self) {
        self.push(Outgoing::Message(DesignerMessage::RedrawDecorators));
    }

    #[allow(clippy::cast_precision_loss)]
    fn update_form(&mut self, width: i64, height: i64) {
        self.push(Outgoing::Message(DesignerMessage::UpdateFormSize { width: width as f64, height: height as f64 }));
    }

    fn content_refresh(&mut self) {
        self.push(Outgoing::ContentRefresh);
    }
}

// =============================================================================
// DRAGGED ELEMENT
// =============================================================================

/// Preview of a palette item being dragged onto the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct DraggedElement {
    /// Client-side id of the preview element.
    pub id: String,
    pub name: String,
    pub model: Map<String, Value>,
    /// From `model.size`, when the palette supplied one.
    pub size: Option<Size>,
    /// Container the preview currently sits in (responsive forms).
    pub drop_target: Option<String>,
    pub insert_before: Option<String>,
}

impl DraggedElement {
    #[must_use]
    pub fn new(name: &str, model: Map<String, Value>) -> Self {
        let size = model.get("size").and_then(|v| match serde_json::from_value::<Size>(v.clone()) {
            Ok(size) => Some(size),
            Err(e) => {
                warn!(name, error = %e, "ignoring malformed palette size");
                None
            }
        });
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_owned(),
            model,
            size,
            drop_target: None,
            insert_before: None,
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

pub struct DesignerSession {
    scene: Scene,
    guides: DynamicGuides,
    selection: MouseSelection,
    dragged: Option<DraggedElement>,
    ghost_containers: Vec<GhostContainer>,
    rendered_ghosts: Vec<RenderedContainer>,
    ghosts_visible: bool,
    /// Form size the ghosts are laid out around, as last reported by the editor.
    form_size: Size,
    cache: FormCache,
    reconciler: Reconciler,
    outbox: Outbox,
}

impl DesignerSession {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(cache: FormCache, reconciler: Reconciler) -> Self {
        let form_size = Size::new(cache.size.width as f64, cache.size.height as f64);
        Self {
            scene: Scene::new(),
            guides: DynamicGuides::default(),
            selection: MouseSelection::new(),
            dragged: None,
            ghost_containers: Vec::new(),
            rendered_ghosts: Vec::new(),
            ghosts_visible: true,
            form_size,
            cache,
            reconciler,
            outbox: Outbox::default(),
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub fn cache(&self) -> &FormCache {
        &self.cache
    }

    #[must_use]
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    #[must_use]
    pub fn thresholds(&self) -> SnapThresholds {
        self.guides.thresholds()
    }

    #[must_use]
    pub fn dragged(&self) -> Option<&DraggedElement> {
        self.dragged.as_ref()
    }

    #[must_use]
    pub fn selection(&self) -> &[String] {
        self.selection.selection()
    }

    /// Ghost containers as last laid out; empty while hidden.
    #[must_use]
    pub fn ghosts(&self) -> &[RenderedContainer] {
        if self.ghosts_visible { &self.rendered_ghosts } else { &[] }
    }

    #[must_use]
    pub fn ghosts_visible(&self) -> bool {
        self.ghosts_visible
    }

    /// Take everything queued for the host.
    pub fn drain(&mut self) -> Vec<Outgoing> {
        self.outbox.drain()
    }

    // --- Data inputs ---

    /// Replace the measured element boxes. The snap cache is dropped.
    pub fn load_scene(&mut self, elements: Vec<ElementBox>) {
        self.scene.load_snapshot(elements);
        self.guides.clear();
    }

    /// Store the server's ghost containers and lay them out.
    pub fn set_ghosts(&mut self, containers: Vec<GhostContainer>) {
        self.ghost_containers = containers;
        self.layout_ghosts();
    }

    /// Apply one edit batch to the form cache.
    pub fn apply_batch(&mut self, batch: &DesignBatch, conv: &Converter<'_>) -> ReconcileReport {
        let report = self.reconciler.update_form_data(&mut self.cache, batch, &mut self.outbox, conv);
        if report.render_ghosts {
            self.layout_ghosts();
        }
        report
    }

    /// The editor resized the form.
    #[allow(clippy::cast_precision_loss)]
    pub fn resize_form(&mut self, width: i64, height: i64) {
        self.reconciler.update_form(&mut self.cache, &mut self.outbox, width, height);
        self.form_size = Size::new(width as f64, height as f64);
        self.layout_ghosts();
    }

    pub fn content_refresh(&mut self) {
        self.reconciler.content_refresh(&mut self.outbox);
    }

    // --- Mouse ---

    pub fn mouse_down(&mut self, p: Point, modifiers: Modifiers) {
        if self.selection.on_mouse_down(&self.scene, p, modifiers) {
            self.selection_changed();
        }
    }

    pub fn mouse_move(&mut self, p: Point) {
        if let Some(lasso) = self.selection.on_mouse_move(p) {
            debug!(?lasso, "lasso moved");
        }
    }

    pub fn mouse_up(&mut self, p: Point) {
        if self.selection.on_mouse_up(&self.scene, p) {
            self.selection_changed();
        }
    }

    fn selection_changed(&mut self) {
        self.outbox.redraw_decorators();
        self.layout_ghosts();
    }

    // --- Snap ---

    /// Run one snap query against the current scene.
    pub fn snap_target(&mut self, point: Point, resizing: Option<ResizeAnchor>) -> Option<SnapProperties> {
        let dragged = self.dragged.as_ref().and_then(|d| d.size);
        self.guides.snap_target(&self.scene, point, resizing, dragged)
    }

    // --- Events ---

    /// Handle one event from the editor host.
    pub fn handle(&mut self, message: DesignerMessage) {
        if !matches!(message, DesignerMessage::HideGhostContainer | DesignerMessage::Snap { .. }) {
            self.ghosts_visible = true;
        }
        match message {
            DesignerMessage::CreateElement { name, model, .. } => {
                let element = DraggedElement::new(&name, model);
                debug!(name = %element.name, id = %element.id, "dragged element created");
                self.dragged = Some(element);
            }
            DesignerMessage::DestroyElement => {
                if let Some(element) = self.dragged.take() {
                    debug!(name = %element.name, "dragged element destroyed");
                }
            }
            DesignerMessage::InsertDraggedComponent { drop_target, insert_before } => match &mut self.dragged {
                Some(element) => {
                    element.drop_target = drop_target;
                    element.insert_before = insert_before;
                }
                None => warn!("insertDraggedComponent without a dragged element"),
            },
            DesignerMessage::RenderGhosts => self.layout_ghosts(),
            DesignerMessage::UpdateFormSize { width, height } => {
                self.form_size = Size::new(width, height);
                if self.cache.is_absolute() {
                    self.layout_ghosts();
                }
            }
            DesignerMessage::RedrawDecorators => {
                let selected = self.selection.selection();
                let has_selected_ghost =
                    self.ghost_containers.iter().flat_map(|c| &c.ghosts).any(|g| selected.contains(&g.uuid));
                if has_selected_ghost {
                    self.layout_ghosts();
                }
            }
            DesignerMessage::HideGhostContainer => self.ghosts_visible = false,
            DesignerMessage::SnapThresholds { value } => {
                let thresholds = SnapThresholds::from(value);
                info!(alignment = thresholds.alignment, distance = thresholds.distance, "snap thresholds set");
                self.guides.set_thresholds(thresholds);
            }
            DesignerMessage::GetSnapTarget { p1, resizing } => {
                let anchor = resizing.as_deref().and_then(|r| match r.parse::<ResizeAnchor>() {
                    Ok(anchor) => Some(anchor),
                    Err(e) => {
                        warn!(error = %e, "treating unknown resize anchor as a move");
                        None
                    }
                });
                let properties = self.snap_target(p1.into(), anchor);
                self.outbox.push(Outgoing::Message(DesignerMessage::Snap { properties }));
            }
            DesignerMessage::ClearSnapCache => self.guides.clear(),
            DesignerMessage::Snap { .. } => warn!("ignoring inbound snap reply"),
        }
    }

    fn layout_ghosts(&mut self) {
        let frame = GhostFrame { absolute: self.cache.is_absolute(), form_size: self.form_size };
        self.rendered_ghosts = layout_ghosts(&self.ghost_containers, frame, &self.scene, self.selection.selection());
    }
}
