//! Scene state: owned primitives, the display list and the record/replay timeline.
//!
//! A scene starts in [`Phase::Recording`]. Every mutating call made while the
//! script sets the scene up is captured as a [`ScheduledAction`] stamped with
//! the running timeline offset. [`Scene::finish_recording`] switches to
//! [`Phase::Playing`], after which [`Scene::update`] advances the live clock
//! and fires whatever has come due before animating the displayed primitives.

pub mod primitive;
pub mod timeline;

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::animation::{morph::close_loops, Animatable, Easing, Property, ShapeAnimation, ShapeCommit};
use crate::dsl::FuncDef;
use crate::geometry::centered;
use crate::render::Renderer;
use crate::runtime::Value;

pub use primitive::{Align, Primitive, PrimitiveId, PrimitiveKind, Shape};
pub use timeline::{ScheduledAction, Timeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Recording,
    Playing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Recording => f.write_str("recording"),
            Phase::Playing => f.write_str("playing"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("no primitive with id {0:?}")]
    UnknownPrimitive(PrimitiveId),
    #[error("{op} is not allowed while {phase}")]
    WrongPhase { op: &'static str, phase: Phase },
    #[error("script error: {0}")]
    Script(String),
}

/// A call back into the script, made when a scheduled action fires.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub func: Rc<FuncDef>,
    pub args: Vec<Value>,
}

/// A deferred scene mutation.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Put a primitive on the display list.
    Show(PrimitiveId),
    /// Take a primitive off the display list and drop it with its animations.
    Remove(PrimitiveId),
    /// Tween several properties together, each from its value at fire time.
    Tween {
        id: PrimitiveId,
        targets: Vec<(Property, f64)>,
        duration: f64,
        easing: Easing,
    },
    /// Tween `source`'s outline into `target`'s. With `replace`, `target`
    /// takes `source`'s place in the display list when the tween ends.
    ShapeTween {
        source: PrimitiveId,
        target: PrimitiveId,
        duration: f64,
        easing: Easing,
        replace: bool,
    },
    /// Set properties immediately.
    Set {
        id: PrimitiveId,
        values: Vec<(Property, f64)>,
    },
    SetVelocity {
        id: PrimitiveId,
        velocity: [f32; 2],
    },
    Invoke(Invocation),
}

/// Executes effects that need the script, such as scheduled function calls.
pub trait EffectHost {
    fn invoke(&mut self, scene: &mut Scene, call: Invocation) -> Result<(), SceneError>;
}

/// A host with no script attached. Invocations fail.
impl EffectHost for () {
    fn invoke(&mut self, _scene: &mut Scene, call: Invocation) -> Result<(), SceneError> {
        Err(SceneError::Script(format!(
            "no script to run {}()",
            call.func.name
        )))
    }
}

pub struct Scene {
    primitives: HashMap<PrimitiveId, Primitive>,
    display: Vec<PrimitiveId>,
    timeline: Timeline,
    phase: Phase,
    offset: f64,
    current_time: f64,
    next_id: u64,
    bounds: [f32; 2],
    failures: usize,
}

impl Scene {
    /// An empty scene in the recording phase. `bounds` are the half-extents of
    /// the box moving primitives bounce inside.
    pub fn new(bounds: [f32; 2]) -> Self {
        Self {
            primitives: HashMap::new(),
            display: Vec::new(),
            timeline: Timeline::new(),
            phase: Phase::Recording,
            offset: 0.0,
            current_time: 0.0,
            next_id: 0,
            bounds,
            failures: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Accumulated recording offset in seconds.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Live playback clock in seconds.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// The time new effects are stamped relative to: the offset while
    /// recording, the live clock while playing.
    pub fn now(&self) -> f64 {
        match self.phase {
            Phase::Recording => self.offset,
            Phase::Playing => self.current_time,
        }
    }

    /// Number of actions still waiting to fire.
    pub fn pending(&self) -> usize {
        self.timeline.len()
    }

    /// Number of scheduled actions that failed when they fired.
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Take ownership of a primitive. It is not drawn until shown.
    pub fn insert(&mut self, primitive: Primitive) -> PrimitiveId {
        let id = PrimitiveId(self.next_id);
        self.next_id += 1;
        self.primitives.insert(id, primitive);
        id
    }

    pub fn get(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.primitives.get(&id)
    }

    pub fn get_mut(&mut self, id: PrimitiveId) -> Option<&mut Primitive> {
        self.primitives.get_mut(&id)
    }

    pub fn contains(&self, id: PrimitiveId) -> bool {
        self.primitives.contains_key(&id)
    }

    pub fn is_displayed(&self, id: PrimitiveId) -> bool {
        self.display.contains(&id)
    }

    /// Displayed primitives in draw order.
    pub fn displayed(&self) -> impl Iterator<Item = (PrimitiveId, &Primitive)> + '_ {
        self.display
            .iter()
            .filter_map(|id| self.primitives.get(id).map(|p| (*id, p)))
    }

    /// Schedule `effect` to fire `delay` seconds after [`Scene::now`].
    pub fn schedule(&mut self, delay: f64, effect: Effect) {
        let time = self.now() + delay.max(0.0);
        log::trace!("schedule at {time:.3}s: {effect:?}");
        self.timeline.insert(ScheduledAction { time, effect });
    }

    /// Schedule several effects at the same time, in order.
    pub fn schedule_all(&mut self, delay: f64, effects: impl IntoIterator<Item = Effect>) {
        let time = self.now() + delay.max(0.0);
        self.timeline
            .insert_batch(effects.into_iter().map(|effect| ScheduledAction { time, effect }));
    }

    /// Advance the recording offset without running anything.
    pub fn schedule_delay(&mut self, seconds: f64) -> Result<(), SceneError> {
        if self.phase != Phase::Recording {
            return Err(SceneError::WrongPhase {
                op: "schedule_delay",
                phase: self.phase,
            });
        }
        self.offset += seconds.max(0.0);
        Ok(())
    }

    /// Synchronously advance the live clock, firing and animating as a frame would.
    pub fn advance_clock(&mut self, seconds: f64, host: &mut dyn EffectHost) -> Result<(), SceneError> {
        if self.phase != Phase::Playing {
            return Err(SceneError::WrongPhase {
                op: "advance_clock",
                phase: self.phase,
            });
        }
        self.update(seconds.max(0.0), host);
        Ok(())
    }

    /// Leave the recording phase. Calling it again has no effect.
    pub fn finish_recording(&mut self) {
        if self.phase == Phase::Recording {
            log::info!(
                "recording finished: {} primitives, {} actions over {:.2}s",
                self.primitives.len(),
                self.timeline.len(),
                self.offset
            );
            self.phase = Phase::Playing;
        }
    }

    /// Advance one frame: fire due actions in time order, then animate.
    ///
    /// Only actions pending when the frame starts fire; anything they schedule
    /// waits for the next frame. Failing actions are logged and counted; they
    /// never stop the frame.
    pub fn update(&mut self, dt: f64, host: &mut dyn EffectHost) {
        self.current_time += dt;
        for action in self.timeline.drain_due(self.current_time) {
            if let Err(e) = self.apply(action.effect, host) {
                self.failures += 1;
                log::warn!("scheduled action at {:.3}s failed: {e}", action.time);
            }
        }
        self.animate(dt);
    }

    /// Run one effect now.
    pub fn apply(&mut self, effect: Effect, host: &mut dyn EffectHost) -> Result<(), SceneError> {
        match effect {
            Effect::Show(id) => {
                self.require(id)?;
                if !self.display.contains(&id) {
                    self.display.push(id);
                }
            }
            Effect::Remove(id) => self.remove(id)?,
            Effect::Tween {
                id,
                targets,
                duration,
                easing,
            } => {
                let primitive = self.require_mut(id)?;
                for (property, to) in targets {
                    primitive.start_tween(property, to, duration, easing);
                }
            }
            Effect::ShapeTween {
                source,
                target,
                duration,
                easing,
                replace,
            } => self.start_shape_tween(source, target, duration, easing, replace)?,
            Effect::Set { id, values } => {
                let primitive = self.require_mut(id)?;
                for (property, value) in values {
                    primitive.set(property, value);
                }
            }
            Effect::SetVelocity { id, velocity } => {
                self.require_mut(id)?.velocity = velocity;
            }
            Effect::Invoke(call) => host.invoke(self, call)?,
        }
        Ok(())
    }

    /// Take a primitive off the display list and drop it. Its tweens and
    /// any shape tween go with it.
    pub fn remove(&mut self, id: PrimitiveId) -> Result<(), SceneError> {
        self.primitives
            .remove(&id)
            .ok_or(SceneError::UnknownPrimitive(id))?;
        self.display.retain(|d| *d != id);
        Ok(())
    }

    fn start_shape_tween(
        &mut self,
        source: PrimitiveId,
        target: PrimitiveId,
        duration: f64,
        easing: Easing,
        replace: bool,
    ) -> Result<(), SceneError> {
        let goal = self.require(target)?;
        let goal_boundary = goal.boundary.clone();
        let commit = ShapeCommit {
            boundary: centered(&goal_boundary),
            filled: goal.filled,
            replace_with: replace.then_some(target),
        };
        let primitive = self.require_mut(source)?;
        let start = if primitive.closed {
            close_loops(&primitive.boundary)
        } else {
            primitive.boundary.clone()
        };
        let animation = ShapeAnimation::new(&start, &close_loops(&goal_boundary), duration, easing, commit);
        log::debug!(
            "shape tween {:?} -> {:?} over {duration}s with {} vertices",
            source,
            target,
            animation.vertex_count()
        );
        primitive.start_shape_tween(animation);
        Ok(())
    }

    fn animate(&mut self, dt: f64) {
        let mut swaps = Vec::new();
        for id in &self.display {
            let Some(primitive) = self.primitives.get_mut(id) else {
                continue;
            };
            if let Some(ShapeCommit {
                replace_with: Some(target),
                ..
            }) = primitive.advance(dt, self.bounds)
            {
                swaps.push((*id, target));
            }
        }
        for (source, target) in swaps {
            self.swap(source, target);
        }
    }

    /// Put `target` where `source` was, at `source`'s transform, and drop `source`.
    fn swap(&mut self, source: PrimitiveId, target: PrimitiveId) {
        let Some(old) = self.primitives.remove(&source) else {
            return;
        };
        let Some(new) = self.primitives.get_mut(&target) else {
            log::warn!("morph target {target:?} vanished; keeping {source:?}");
            self.primitives.insert(source, old);
            return;
        };
        new.transform = old.transform;
        self.display.retain(|d| *d != target);
        match self.display.iter().position(|d| *d == source) {
            Some(slot) => self.display[slot] = target,
            None => self.display.push(target),
        }
    }

    /// Draw every displayed primitive in order.
    pub fn render(&self, renderer: &mut dyn Renderer) {
        for (_, primitive) in self.displayed() {
            let loops = primitive.visible_loops();
            if loops.is_empty() {
                continue;
            }
            renderer.draw(&loops, &primitive.transform, primitive.color, primitive.fill_mode());
        }
    }

    fn require(&self, id: PrimitiveId) -> Result<&Primitive, SceneError> {
        self.primitives.get(&id).ok_or(SceneError::UnknownPrimitive(id))
    }

    fn require_mut(&mut self, id: PrimitiveId) -> Result<&mut Primitive, SceneError> {
        self.primitives
            .get_mut(&id)
            .ok_or(SceneError::UnknownPrimitive(id))
    }
}
