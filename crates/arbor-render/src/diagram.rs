//! `TreeDiagram`: construction, the update pipeline and the interaction controller.
//!
//! Every state change re-drives the same pass: extent, layout, ids, node join, link join,
//! optional re-centering. Animations are scheduled, not awaited; [`TreeDiagram::tick`]
//! advances them and applies the sampled values to the scene.

use crate::binder::{LinkDash, LinkElement, NodeElement, Scene, ensure_ids, join};
use crate::image::node_image;
use crate::label::node_label;
use crate::layout::{self, LayoutEdge, LayoutMode, PositionedNode, TreeLayout};
use crate::link;
use crate::shape::{ShapeGeometry, node_shape};
use crate::svg::{SvgRenderOptions, render_svg};
use crate::text::TextMeasurer;
use crate::transition::{AnimValue, Ease, Frame, Scheduler, TweenProperty, TweenTarget};
use crate::viewport::{self, SizingMode, ZoomBehavior, ZoomGesture, ZoomTransform};
use crate::{DiagramOptions, Error, Result};
use arbor_core::{
    Hierarchy, IdAllocator, NodeId, NodeState, RenderId, Toggle, TreeDatum, TreeProperties,
    collapse,
};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionState {
    Idle,
    /// A toggle pass has animations in flight; clicks are dropped.
    Retoggling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClickOutcome {
    Toggled(Toggle),
    Leaf,
    Busy,
    /// `click_at` hit no node.
    Missed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BulkOutcome {
    /// Number of nodes whose visibility flipped; zero means no pass ran.
    Applied(usize),
    Busy,
}

pub struct TreeDiagram {
    props: TreeProperties,
    options: DiagramOptions,
    hierarchy: Hierarchy,
    ids: IdAllocator,
    mode: SizingMode,
    zoom: Option<ZoomBehavior>,
    scheduler: Scheduler,
    scene: Scene,
    layout: TreeLayout,
    state: InteractionState,
}

impl TreeDiagram {
    /// Builds the hierarchy, applies the initial collapse depth and runs the first pass.
    /// In auto-extent mode the first centering (on the root) is scheduled before returning.
    pub fn create(
        data: Arc<TreeDatum>,
        props: TreeProperties,
        options: DiagramOptions,
    ) -> Result<Self> {
        props.validate()?;
        let mut hierarchy = Hierarchy::build(data);
        collapse::apply_max_depth(&mut hierarchy, props.general.default_max_depth);

        let mode = SizingMode::from_properties(&props.general);
        let zoom = (mode == SizingMode::Auto).then(|| ZoomBehavior::from_properties(&props.general));
        let container = viewport::container(&props.general);
        let scene = Scene::new(
            container.width,
            container.height,
            viewport::initial_transform(mode, &props.general),
        );
        let scheduler = Scheduler::new(options.start_ms);

        let mut diagram = Self {
            props,
            options,
            hierarchy,
            ids: IdAllocator::new(),
            mode,
            zoom,
            scheduler,
            scene,
            layout: TreeLayout::default(),
            state: InteractionState::Idle,
        };
        let root = diagram.hierarchy.root();
        diagram.refresh(Some(root));
        tracing::debug!(
            nodes = diagram.hierarchy.len(),
            visible = diagram.layout.nodes.len(),
            ?mode,
            "created tree diagram"
        );
        Ok(diagram)
    }

    pub fn from_json_str(data: &str, props: &str, options: DiagramOptions) -> Result<Self> {
        let data = TreeDatum::from_json_str(data)?;
        let props = TreeProperties::from_json_str(props)?;
        Self::create(Arc::new(data), props, options)
    }

    pub fn properties(&self) -> &TreeProperties {
        &self.props
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn sizing_mode(&self) -> SizingMode {
        self.mode
    }

    pub fn transform(&self) -> ZoomTransform {
        self.scene.transform
    }

    pub fn interaction_state(&self) -> InteractionState {
        self.state
    }

    pub fn is_animating(&self) -> bool {
        !self.scheduler.is_idle()
    }

    pub fn now_ms(&self) -> f64 {
        self.scheduler.now_ms()
    }

    pub fn ids_issued(&self) -> u64 {
        self.ids.issued()
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.hierarchy.find_by_name(name)
    }

    /// Toggles a visible node. Leaves and clicks during a running toggle are no-ops.
    pub fn click(&mut self, id: NodeId) -> Result<ClickOutcome> {
        let node = self.hierarchy.node(id)?;
        if !self.hierarchy.is_visible(id) {
            return Err(Error::NodeNotVisible {
                name: node.name().to_string(),
            });
        }
        if self.state == InteractionState::Retoggling {
            tracing::debug!(node = node.name(), "click dropped while retoggling");
            return Ok(ClickOutcome::Busy);
        }
        if node.state() == NodeState::Leaf {
            return Ok(ClickOutcome::Leaf);
        }

        let outcome = collapse::toggle(&mut self.hierarchy, id)?;
        self.state = InteractionState::Retoggling;
        self.refresh(Some(id));
        self.settle_state();
        Ok(ClickOutcome::Toggled(outcome))
    }

    pub fn click_by_name(&mut self, name: &str) -> Result<ClickOutcome> {
        let id = self
            .hierarchy
            .find_by_name(name)
            .ok_or_else(|| Error::NodeNotFound {
                name: name.to_string(),
            })?;
        self.click(id)
    }

    /// Clicks whatever node is drawn under a canvas point.
    pub fn click_at(&mut self, x: f64, y: f64) -> Result<ClickOutcome> {
        match self.scene.hit_test((x, y)).map(|n| n.node) {
            Some(id) => self.click(id),
            None => Ok(ClickOutcome::Missed),
        }
    }

    /// Feeds a pointer gesture to the zoom behavior. Returns `false` in fixed-extent mode or
    /// when the gesture is filtered out.
    pub fn gesture(&mut self, gesture: &ZoomGesture) -> bool {
        let Some(zoom) = self.zoom.as_mut() else {
            return false;
        };
        zoom.set_transform(self.scene.transform);
        let Some(t) = zoom.handle(gesture) else {
            return false;
        };
        self.scheduler
            .cancel(&TweenTarget::Viewport, TweenProperty::Transform);
        self.scene.transform = t;
        self.settle_state();
        true
    }

    /// Schedules a viewport move that centers `id`. No-op in fixed-extent mode.
    pub fn center_node(&mut self, id: NodeId) -> Result<()> {
        let node = self.hierarchy.node(id)?;
        if !self.hierarchy.is_visible(id) {
            return Err(Error::NodeNotVisible {
                name: node.name().to_string(),
            });
        }
        self.center_on(id);
        Ok(())
    }

    /// Expands every collapsed node. Dropped like a click while a toggle pass is animating.
    pub fn expand_all(&mut self) -> BulkOutcome {
        if self.state == InteractionState::Retoggling {
            tracing::debug!("expand all dropped while retoggling");
            return BulkOutcome::Busy;
        }
        let changed = collapse::expand_all(&mut self.hierarchy);
        self.after_bulk(changed);
        BulkOutcome::Applied(changed)
    }

    pub fn collapse_all(&mut self) -> BulkOutcome {
        if self.state == InteractionState::Retoggling {
            tracing::debug!("collapse all dropped while retoggling");
            return BulkOutcome::Busy;
        }
        let changed = collapse::collapse_all(&mut self.hierarchy);
        self.after_bulk(changed);
        BulkOutcome::Applied(changed)
    }

    /// Advances the animation clock and applies every sampled value to the scene.
    pub fn tick(&mut self, now_ms: f64) -> InteractionState {
        for frame in self.scheduler.advance(now_ms) {
            self.apply_frame(frame);
        }
        self.settle_state();
        self.state
    }

    /// Runs every in-flight animation to completion.
    pub fn settle(&mut self) -> InteractionState {
        let end = self.scheduler.end_ms().unwrap_or(self.scheduler.now_ms());
        self.tick(end)
    }

    pub fn to_svg(&self) -> String {
        render_svg(&self.scene, &SvgRenderOptions::default())
    }

    pub fn to_svg_with(&self, options: &SvgRenderOptions) -> String {
        render_svg(&self.scene, options)
    }

    fn after_bulk(&mut self, changed: usize) {
        if changed == 0 {
            return;
        }
        self.state = InteractionState::Retoggling;
        let root = self.hierarchy.root();
        self.refresh(Some(root));
        self.settle_state();
    }

    fn settle_state(&mut self) {
        if self.scheduler.is_idle() {
            self.state = InteractionState::Idle;
        }
    }

    fn refresh(&mut self, center: Option<NodeId>) {
        let general = &self.props.general;
        let extent = match self.mode {
            SizingMode::Fixed => viewport::fixed_extent(general),
            SizingMode::Auto => viewport::content_extent(
                &self.hierarchy,
                &self.props,
                self.options.text_measurer.as_ref(),
            ),
        };
        let mut laid_out = layout::layout(
            &mut self.hierarchy,
            extent,
            LayoutMode::from_cluster_flag(general.is_cluster_layout),
            general.orientation,
        );
        let issued = ensure_ids(&mut self.hierarchy, &mut laid_out, &mut self.ids);

        self.bind_nodes(&laid_out);
        self.bind_links(&laid_out);
        self.layout = laid_out;
        if let Some(id) = center {
            self.center_on(id);
        }
        tracing::debug!(
            visible = self.layout.nodes.len(),
            issued,
            pending_tweens = self.scheduler.len(),
            "pipeline pass"
        );
    }

    fn bind_nodes(&mut self, laid_out: &TreeLayout) {
        let general = &self.props.general;
        let animate = general.enable_animation && general.animation_duration > 0.0;
        let duration = general.animation_duration;
        let measurer = self.options.text_measurer.as_ref();

        let by_id: FxHashMap<RenderId, &PositionedNode> = laid_out
            .nodes
            .iter()
            .filter_map(|n| Some((n.render_id?, n)))
            .collect();
        let joined = join(
            self.scene.nodes.keys().copied(),
            laid_out.nodes.iter().filter_map(|n| n.render_id),
        );
        tracing::trace!(
            enter = joined.enter.len(),
            update = joined.update.len(),
            exit = joined.exit.len(),
            "node join"
        );

        for rid in joined.enter {
            let Some(p) = by_id.get(&rid) else { continue };
            let opacity = if animate { 0.0 } else { 1.0 };
            let element = node_element(&self.hierarchy, &self.props, measurer, p, rid, opacity);
            self.scene.nodes.insert(rid, element);
            if animate {
                self.scheduler.start(
                    TweenTarget::Node(rid),
                    TweenProperty::Opacity,
                    AnimValue::Number(0.0),
                    AnimValue::Number(1.0),
                    duration,
                    Ease::CubicInOut,
                );
            }
        }

        for rid in joined.update {
            let Some(p) = by_id.get(&rid) else { continue };
            let mut fresh = node_element(&self.hierarchy, &self.props, measurer, p, rid, 1.0);
            let Some(el) = self.scene.nodes.get_mut(&rid) else {
                continue;
            };
            let target = TweenTarget::Node(rid);
            let moved = (el.x - fresh.x).abs() > 1e-9 || (el.y - fresh.y).abs() > 1e-9;
            if animate && moved {
                self.scheduler.start(
                    target.clone(),
                    TweenProperty::Position,
                    AnimValue::Point(el.x, el.y),
                    AnimValue::Point(fresh.x, fresh.y),
                    duration,
                    Ease::CubicInOut,
                );
                fresh.x = el.x;
                fresh.y = el.y;
            } else {
                self.scheduler.cancel(&target, TweenProperty::Position);
            }

            if animate && el.opacity < 1.0 {
                // Entering or exiting before this pass; fade back in from where it is.
                self.scheduler.start(
                    target,
                    TweenProperty::Opacity,
                    AnimValue::Number(el.opacity),
                    AnimValue::Number(1.0),
                    duration,
                    Ease::CubicInOut,
                );
                fresh.opacity = el.opacity;
            } else {
                self.scheduler.cancel(&target, TweenProperty::Opacity);
            }
            *el = fresh;
        }

        for rid in joined.exit {
            let Some(el) = self.scene.nodes.get_mut(&rid) else {
                continue;
            };
            if el.exiting {
                continue;
            }
            if animate {
                el.exiting = true;
                self.scheduler.start(
                    TweenTarget::Node(rid),
                    TweenProperty::Opacity,
                    AnimValue::Number(el.opacity),
                    AnimValue::Number(0.0),
                    duration,
                    Ease::CubicInOut,
                );
            } else {
                self.scene.nodes.shift_remove(&rid);
                self.scheduler.cancel_target(&TweenTarget::Node(rid));
            }
        }
    }

    fn bind_links(&mut self, laid_out: &TreeLayout) {
        let link_props = &self.props.link_properties;
        let animate = link_props.enable_animation && link_props.animation_duration > 0.0;
        let duration = link_props.animation_duration;
        let style = link_props.tree_node_link_type;
        let orientation = self.props.general.orientation;
        let shape_half = ShapeGeometry::from_properties(&self.props.node_properties.shape_properties)
            .half_along(orientation);

        let mut by_key: FxHashMap<&str, &LayoutEdge> = FxHashMap::default();
        for edge in &laid_out.edges {
            by_key.entry(edge.key.as_str()).or_insert(edge);
        }
        let joined = join(
            self.scene.links.keys().cloned(),
            laid_out.edges.iter().map(|e| e.key.clone()),
        );
        tracing::trace!(
            enter = joined.enter.len(),
            update = joined.update.len(),
            exit = joined.exit.len(),
            "link join"
        );

        let element = |edge: &LayoutEdge| {
            let (s, t) = ((edge.sx, edge.sy), (edge.tx, edge.ty));
            LinkElement {
                key: edge.key.clone(),
                source: edge.source,
                target: edge.target,
                d: link::path_d(style, orientation, s, t, shape_half),
                length: link::path_length(style, orientation, s, t, shape_half),
                stroke: link_props.stroke_color.clone(),
                stroke_width: link::stroke_width(link_props, &self.hierarchy.get(edge.target).data),
                dash: None,
                exiting: false,
            }
        };

        let mut entered = Vec::new();
        for key in joined.enter {
            let Some(&edge) = by_key.get(key.as_str()) else {
                continue;
            };
            let mut el = element(edge);
            if animate {
                el.dash = Some(LinkDash {
                    length: el.length,
                    offset: el.length,
                });
            }
            entered.push(el);
        }

        let mut updated = Vec::new();
        for key in joined.update {
            let Some(&edge) = by_key.get(key.as_str()) else {
                continue;
            };
            updated.push(element(edge));
        }

        for el in entered {
            if let Some(dash) = el.dash {
                self.scheduler.start(
                    TweenTarget::Link(el.key.clone()),
                    TweenProperty::DashOffset,
                    AnimValue::Number(dash.offset),
                    AnimValue::Number(0.0),
                    duration,
                    Ease::CubicInOut,
                );
            }
            self.scene.links.insert(el.key.clone(), el);
        }

        for mut fresh in updated {
            let Some(el) = self.scene.links.get_mut(&fresh.key) else {
                continue;
            };
            fresh.dash = el.dash;
            if el.exiting {
                let target = TweenTarget::Link(fresh.key.clone());
                match el.dash {
                    Some(dash) if animate => self.scheduler.start(
                        target,
                        TweenProperty::DashOffset,
                        AnimValue::Number(dash.offset),
                        AnimValue::Number(0.0),
                        duration,
                        Ease::CubicInOut,
                    ),
                    _ => {
                        self.scheduler.cancel(&target, TweenProperty::DashOffset);
                        fresh.dash = None;
                    }
                }
            }
            *el = fresh;
        }

        for key in joined.exit {
            let Some(el) = self.scene.links.get_mut(&key) else {
                continue;
            };
            if el.exiting {
                continue;
            }
            if animate {
                let length = el.length;
                let offset = el.dash.map(|d| d.offset).unwrap_or(0.0);
                el.exiting = true;
                el.dash = Some(LinkDash { length, offset });
                self.scheduler.start(
                    TweenTarget::Link(key),
                    TweenProperty::DashOffset,
                    AnimValue::Number(offset),
                    AnimValue::Number(length),
                    duration,
                    Ease::CubicInOut,
                );
            } else {
                self.scheduler.cancel_target(&TweenTarget::Link(key.clone()));
                self.scene.links.shift_remove(&key);
            }
        }
    }

    fn center_on(&mut self, id: NodeId) {
        if self.mode != SizingMode::Auto {
            return;
        }
        let general = &self.props.general;
        let node = self.hierarchy.get(id);
        let from = self.scene.transform;
        let to = viewport::center_transform(
            node.x,
            node.y,
            from.k,
            viewport::container(general),
        );
        tracing::debug!(node = node.name(), x = to.x, y = to.y, k = to.k, "centering viewport");

        if general.enable_animation && general.center_duration > 0.0 {
            self.scheduler.start(
                TweenTarget::Viewport,
                TweenProperty::Transform,
                AnimValue::Transform(from),
                AnimValue::Transform(to),
                general.center_duration,
                Ease::CubicInOut,
            );
        } else {
            self.scheduler
                .cancel(&TweenTarget::Viewport, TweenProperty::Transform);
            self.scene.transform = to;
            if let Some(zoom) = self.zoom.as_mut() {
                zoom.set_transform(to);
            }
        }
    }

    fn apply_frame(&mut self, frame: Frame) {
        match (frame.target, frame.property, frame.value) {
            (TweenTarget::Node(rid), TweenProperty::Position, AnimValue::Point(x, y)) => {
                if let Some(el) = self.scene.nodes.get_mut(&rid) {
                    el.x = x;
                    el.y = y;
                }
            }
            (TweenTarget::Node(rid), TweenProperty::Opacity, AnimValue::Number(o)) => {
                let Some(el) = self.scene.nodes.get_mut(&rid) else {
                    return;
                };
                el.opacity = o;
                if frame.done && el.exiting {
                    self.scene.nodes.shift_remove(&rid);
                    self.scheduler.cancel_target(&TweenTarget::Node(rid));
                }
            }
            (TweenTarget::Link(key), TweenProperty::DashOffset, AnimValue::Number(o)) => {
                let Some(el) = self.scene.links.get_mut(&key) else {
                    return;
                };
                if frame.done && el.exiting {
                    self.scene.links.shift_remove(&key);
                } else if frame.done {
                    el.dash = None;
                } else if let Some(dash) = el.dash.as_mut() {
                    dash.offset = o;
                }
            }
            (TweenTarget::Viewport, TweenProperty::Transform, AnimValue::Transform(t)) => {
                self.scene.transform = t;
                if let Some(zoom) = self.zoom.as_mut() {
                    zoom.set_transform(t);
                }
            }
            (target, property, _) => {
                tracing::warn!(?target, ?property, "unexpected animation frame");
            }
        }
    }
}

fn node_element(
    hierarchy: &Hierarchy,
    props: &TreeProperties,
    measurer: &dyn TextMeasurer,
    p: &PositionedNode,
    render_id: RenderId,
    opacity: f64,
) -> NodeElement {
    let data = &hierarchy.get(p.node).data;
    let node_props = &props.node_properties;
    let shape = node_shape(&node_props.shape_properties, data, p.state);
    let label = node_label(
        measurer,
        data,
        p.state,
        &shape.geometry,
        &node_props.text_properties,
        props.general.orientation,
    );
    let image = node_image(&node_props.image_properties, &shape.geometry, data);
    NodeElement {
        render_id,
        node: p.node,
        name: p.name.clone(),
        state: p.state,
        x: p.x,
        y: p.y,
        opacity,
        exiting: false,
        shape,
        label,
        image,
    }
}
