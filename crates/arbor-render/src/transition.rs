//! Time-based property interpolation.
//!
//! The scheduler holds at most one tween per (target, property). Scheduling onto an occupied
//! slot replaces the running tween, so the latest write always owns the final value.

use crate::viewport::ZoomTransform;
use arbor_core::RenderId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Ease {
    Linear,
    #[default]
    CubicInOut,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::CubicInOut => {
                let t2 = t * 2.0;
                if t2 <= 1.0 {
                    t2 * t2 * t2 / 2.0
                } else {
                    let u = t2 - 2.0;
                    (u * u * u + 2.0) / 2.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TweenTarget {
    Node(RenderId),
    Link(String),
    Viewport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TweenProperty {
    Position,
    Opacity,
    DashOffset,
    Transform,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnimValue {
    Number(f64),
    Point(f64, f64),
    Transform(ZoomTransform),
}

impl AnimValue {
    /// Mismatched kinds jump straight to `to`.
    pub fn lerp(&self, to: &Self, t: f64) -> Self {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        match (*self, *to) {
            (Self::Number(a), Self::Number(b)) => Self::Number(mix(a, b)),
            (Self::Point(ax, ay), Self::Point(bx, by)) => Self::Point(mix(ax, bx), mix(ay, by)),
            (Self::Transform(a), Self::Transform(b)) => Self::Transform(a.interpolate(&b, t)),
            (_, to) => to,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tween {
    pub from: AnimValue,
    pub to: AnimValue,
    pub start_ms: f64,
    pub duration_ms: f64,
    pub ease: Ease,
}

impl Tween {
    pub fn end_ms(&self) -> f64 {
        self.start_ms + self.duration_ms
    }

    /// Value at `now` and whether the tween has finished.
    pub fn sample(&self, now_ms: f64) -> (AnimValue, bool) {
        if self.duration_ms <= 0.0 || now_ms >= self.end_ms() {
            return (self.to, true);
        }
        let t = ((now_ms - self.start_ms) / self.duration_ms).max(0.0);
        (self.from.lerp(&self.to, self.ease.apply(t)), false)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub target: TweenTarget,
    pub property: TweenProperty,
    pub value: AnimValue,
    pub done: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    tweens: IndexMap<(TweenTarget, TweenProperty), Tween>,
    now_ms: f64,
}

impl Scheduler {
    pub fn new(now_ms: f64) -> Self {
        Self {
            tweens: IndexMap::new(),
            now_ms,
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn is_idle(&self) -> bool {
        self.tweens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    /// Latest end time over all running tweens.
    pub fn end_ms(&self) -> Option<f64> {
        self.tweens.values().map(Tween::end_ms).reduce(f64::max)
    }

    pub fn get(&self, target: &TweenTarget, property: TweenProperty) -> Option<&Tween> {
        self.tweens.get(&(target.clone(), property))
    }

    /// Starts a tween at the scheduler's current time, replacing any tween already running
    /// on the same target and property.
    pub fn start(
        &mut self,
        target: TweenTarget,
        property: TweenProperty,
        from: AnimValue,
        to: AnimValue,
        duration_ms: f64,
        ease: Ease,
    ) {
        let tween = Tween {
            from,
            to,
            start_ms: self.now_ms,
            duration_ms,
            ease,
        };
        if let Some(old) = self.tweens.insert((target.clone(), property), tween) {
            tracing::trace!(?target, ?property, superseded_end = old.end_ms(), "tween replaced");
        }
    }

    pub fn cancel(&mut self, target: &TweenTarget, property: TweenProperty) -> Option<Tween> {
        self.tweens.shift_remove(&(target.clone(), property))
    }

    pub fn cancel_target(&mut self, target: &TweenTarget) -> usize {
        let before = self.tweens.len();
        self.tweens.retain(|(t, _), _| t != target);
        before - self.tweens.len()
    }

    /// Moves the clock to `now_ms` (never backwards) and samples every tween. Finished tweens
    /// report `done` once and are dropped.
    pub fn advance(&mut self, now_ms: f64) -> Vec<Frame> {
        self.now_ms = self.now_ms.max(now_ms);
        let now = self.now_ms;
        let mut frames = Vec::with_capacity(self.tweens.len());
        self.tweens.retain(|(target, property), tween| {
            let (value, done) = tween.sample(now);
            frames.push(Frame {
                target: target.clone(),
                property: *property,
                value,
                done,
            });
            !done
        });
        frames
    }
}
