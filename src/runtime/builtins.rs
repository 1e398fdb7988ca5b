//! Standard globals, primitive operations and constructor hooks.
//!
//! Operations never touch the scene directly: each one schedules an
//! [`Effect`] `start:` seconds after the scene's current stamp time, so the
//! same call records during setup and acts on the next frame during playback.

use std::rc::Rc;

use rand::Rng;

use super::host;
use super::registry::{CallArgs, CommandRegistry, MethodHandler, Operation, TypeTag};
use super::value::{ObjectRef, Value};
use super::Runtime;
use crate::animation::{Easing, Property};
use crate::scene::{Effect, Invocation, PrimitiveId, Scene};

/// The registry every runtime starts with.
pub fn standard_registry() -> CommandRegistry {
    let mut reg = CommandRegistry::new();

    reg.register_global("Add", global_add);
    reg.register_global("Remove", global_remove);
    reg.register_global("Wait", global_wait);
    reg.register_global("Schedule", global_schedule);
    reg.register_global("Print", global_print);
    reg.register_global("Log", global_print);
    reg.register_global("Random", global_random);
    reg.register_global("Len", global_len);
    reg.register_global("Rgb", global_rgb);
    reg.register_global("Time", global_time);

    let ops: [(Operation, MethodHandler); 12] = [
        (Operation::Move, op_move),
        (Operation::Scale, op_scale),
        (Operation::Rotate, op_rotate),
        (Operation::Color, op_color),
        (Operation::Fade, op_fade),
        (Operation::Draw, op_draw),
        (Operation::Morph, op_morph),
        (Operation::MorphTo, op_morph_to),
        (Operation::SetColor, op_set_color),
        (Operation::SetPosition, op_set_position),
        (Operation::Velocity, op_velocity),
        (Operation::Remove, op_remove),
    ];
    for (op, handler) in ops {
        reg.register_method(TypeTag::Any, op, handler);
    }

    for type_name in host::type_names() {
        reg.register_hook(type_name, apply_common_props);
    }
    reg
}

/// Delay, duration and easing shared by every animated operation.
struct Timing {
    delay: f64,
    duration: f64,
    easing: Easing,
}

impl Timing {
    /// `duration_at` is the positional slot of the duration, if the
    /// operation takes one.
    fn from_args(rt: &Runtime, args: &CallArgs, duration_at: Option<usize>) -> Self {
        let config = rt.config();
        let duration = args
            .named("duration")
            .or_else(|| duration_at.and_then(|i| args.at(i)))
            .map(Value::to_number)
            .unwrap_or(config.default_duration);
        let easing = match args.named("easing") {
            Some(Value::String(name)) => Easing::from_name(name).unwrap_or_else(|| {
                log::warn!("unknown easing `{name}`, using {:?}", config.default_easing);
                config.default_easing
            }),
            _ => config.default_easing,
        };
        Self {
            delay: start_delay(args),
            duration,
            easing,
        }
    }

    fn tween(&self, id: PrimitiveId, targets: Vec<(Property, f64)>) -> Effect {
        Effect::Tween {
            id,
            targets,
            duration: self.duration,
            easing: self.easing,
        }
    }
}

fn start_delay(args: &CallArgs) -> f64 {
    args.named("start").map(Value::to_number).unwrap_or(0.0)
}

/// The primitive behind `obj`, or a warning when it has none.
fn host_of(obj: &ObjectRef, op: &str) -> Option<PrimitiveId> {
    let obj = obj.borrow();
    if obj.host.is_none() {
        log::warn!("{op}: <{}#{}> has no primitive", obj.type_name, obj.id);
    }
    obj.host
}

/// Schedule `effect` and return the receiver so calls chain.
fn scheduled(scene: &mut Scene, delay: f64, effect: Effect, target: &ObjectRef) -> Value {
    scene.schedule(delay, effect);
    Value::Object(Rc::clone(target))
}

fn color_targets(value: &Value) -> Vec<(Property, f64)> {
    Property::COLOR.into_iter().zip(value.numbers()).collect()
}

/// `move(duration, x, y)` or `move(to: [x, y])`.
fn op_move(rt: &mut Runtime, scene: &mut Scene, target: &ObjectRef, args: &CallArgs) -> Value {
    let Some(id) = host_of(target, "move") else {
        return Value::Null;
    };
    let timing = Timing::from_args(rt, args, Some(0));
    let (x, y) = match args.named("to").map(Value::numbers) {
        Some(to) => (to.first().copied(), to.get(1).copied()),
        None => (args.number(1, "x"), args.number(2, "y")),
    };
    let targets: Vec<(Property, f64)> = [(Property::X, x), (Property::Y, y)]
        .into_iter()
        .filter_map(|(p, v)| v.map(|v| (p, v)))
        .collect();
    scheduled(scene, timing.delay, timing.tween(id, targets), target)
}

/// `scale(duration, factor)`; the factor may be `[sx, sy]`.
fn op_scale(rt: &mut Runtime, scene: &mut Scene, target: &ObjectRef, args: &CallArgs) -> Value {
    let Some(id) = host_of(target, "scale") else {
        return Value::Null;
    };
    let timing = Timing::from_args(rt, args, Some(0));
    let targets = match args.get(1, "to") {
        Some(v @ Value::Array(_)) => [Property::ScaleX, Property::ScaleY]
            .into_iter()
            .zip(v.numbers())
            .collect(),
        Some(v) => {
            let f = v.to_number();
            vec![(Property::ScaleX, f), (Property::ScaleY, f)]
        }
        None => Vec::new(),
    };
    scheduled(scene, timing.delay, timing.tween(id, targets), target)
}

/// `rotate(duration, degrees)`.
fn op_rotate(rt: &mut Runtime, scene: &mut Scene, target: &ObjectRef, args: &CallArgs) -> Value {
    let Some(id) = host_of(target, "rotate") else {
        return Value::Null;
    };
    let timing = Timing::from_args(rt, args, Some(0));
    let targets = args
        .number(1, "to")
        .map(|deg| vec![(Property::Rotation, deg)])
        .unwrap_or_default();
    scheduled(scene, timing.delay, timing.tween(id, targets), target)
}

/// `color(duration, [r, g, b, a])` or `aColor(to: [r, g, b, a])`.
fn op_color(rt: &mut Runtime, scene: &mut Scene, target: &ObjectRef, args: &CallArgs) -> Value {
    let Some(id) = host_of(target, "color") else {
        return Value::Null;
    };
    let timing = Timing::from_args(rt, args, Some(0));
    let targets = args.get(1, "to").map(color_targets).unwrap_or_default();
    scheduled(scene, timing.delay, timing.tween(id, targets), target)
}

/// `fade(duration, alpha)`.
fn op_fade(rt: &mut Runtime, scene: &mut Scene, target: &ObjectRef, args: &CallArgs) -> Value {
    let Some(id) = host_of(target, "fade") else {
        return Value::Null;
    };
    let timing = Timing::from_args(rt, args, Some(0));
    let targets = args
        .number(1, "to")
        .map(|a| vec![(Property::Alpha, a)])
        .unwrap_or_default();
    scheduled(scene, timing.delay, timing.tween(id, targets), target)
}

/// `draw(duration)`: hide the outline, then reveal it progressively.
fn op_draw(rt: &mut Runtime, scene: &mut Scene, target: &ObjectRef, args: &CallArgs) -> Value {
    let Some(id) = host_of(target, "draw") else {
        return Value::Null;
    };
    let timing = Timing::from_args(rt, args, Some(0));
    scene.schedule_all(
        timing.delay,
        [
            Effect::Set {
                id,
                values: vec![(Property::Reveal, 0.0)],
            },
            timing.tween(id, vec![(Property::Reveal, 1.0)]),
        ],
    );
    Value::Object(Rc::clone(target))
}

fn morph(scene: &mut Scene, rt: &Runtime, target: &ObjectRef, args: &CallArgs, replace: bool) -> Value {
    let op = if replace { "morph" } else { "morphTo" };
    let Some(source) = host_of(target, op) else {
        return Value::Null;
    };
    let Some(goal) = args.get(0, "target").and_then(Value::as_object) else {
        log::warn!("{op}: expected a target object");
        return Value::Null;
    };
    let Some(goal_id) = host_of(goal, op) else {
        return Value::Null;
    };
    let timing = Timing::from_args(rt, args, Some(1));
    let effect = Effect::ShapeTween {
        source,
        target: goal_id,
        duration: timing.duration,
        easing: timing.easing,
        replace,
    };
    scene.schedule(timing.delay, effect);
    // After a full morph the target stands in for the source.
    if replace {
        Value::Object(Rc::clone(goal))
    } else {
        Value::Object(Rc::clone(target))
    }
}

/// `morph(target)`: tween into `target`'s outline, then swap `target` in.
fn op_morph(rt: &mut Runtime, scene: &mut Scene, target: &ObjectRef, args: &CallArgs) -> Value {
    morph(scene, rt, target, args, true)
}

/// `morphTo(target)`: tween into `target`'s outline and keep it.
fn op_morph_to(rt: &mut Runtime, scene: &mut Scene, target: &ObjectRef, args: &CallArgs) -> Value {
    morph(scene, rt, target, args, false)
}

/// `setColor([r, g, b, a])` or `setColor(r, g, b, a)`.
fn op_set_color(_rt: &mut Runtime, scene: &mut Scene, target: &ObjectRef, args: &CallArgs) -> Value {
    let Some(id) = host_of(target, "setColor") else {
        return Value::Null;
    };
    let values = match args.get(0, "to") {
        Some(v @ Value::Array(_)) => color_targets(v),
        _ => Property::COLOR
            .into_iter()
            .zip(args.positional.iter().map(Value::to_number))
            .collect(),
    };
    scheduled(scene, start_delay(args), Effect::Set { id, values }, target)
}

/// `setPosition(x, y)`.
fn op_set_position(_rt: &mut Runtime, scene: &mut Scene, target: &ObjectRef, args: &CallArgs) -> Value {
    let Some(id) = host_of(target, "setPosition") else {
        return Value::Null;
    };
    let values = [(Property::X, args.number(0, "x")), (Property::Y, args.number(1, "y"))]
        .into_iter()
        .filter_map(|(p, v)| v.map(|v| (p, v)))
        .collect();
    scheduled(scene, start_delay(args), Effect::Set { id, values }, target)
}

/// `velocity(vx, vy)`.
fn op_velocity(_rt: &mut Runtime, scene: &mut Scene, target: &ObjectRef, args: &CallArgs) -> Value {
    let Some(id) = host_of(target, "velocity") else {
        return Value::Null;
    };
    let velocity = [
        args.number(0, "x").unwrap_or(0.0) as f32,
        args.number(1, "y").unwrap_or(0.0) as f32,
    ];
    scheduled(scene, start_delay(args), Effect::SetVelocity { id, velocity }, target)
}

/// `remove()`.
fn op_remove(_rt: &mut Runtime, scene: &mut Scene, target: &ObjectRef, args: &CallArgs) -> Value {
    if let Some(id) = host_of(target, "remove") {
        scene.schedule(start_delay(args), Effect::Remove(id));
    }
    Value::Null
}

/// Primitives referenced by `value`, looking through arrays.
fn collect_hosts(value: &Value, op: &str, out: &mut Vec<PrimitiveId>) {
    match value {
        Value::Object(obj) => out.extend(host_of(obj, op)),
        Value::Array(items) => {
            for item in items {
                collect_hosts(item, op, out);
            }
        }
        other => log::warn!("{op}: cannot use {} as a primitive", other.type_name()),
    }
}

/// `Add(obj)`, `Add([a, b])` or `Add { a, b }`. Returns its argument.
fn global_add(_rt: &mut Runtime, scene: &mut Scene, args: &CallArgs) -> Value {
    let mut ids = Vec::new();
    for value in &args.positional {
        collect_hosts(value, "Add", &mut ids);
    }
    scene.schedule_all(start_delay(args), ids.into_iter().map(Effect::Show));
    match args.positional.as_slice() {
        [single] => single.clone(),
        many => Value::Array(many.to_vec()),
    }
}

fn global_remove(_rt: &mut Runtime, scene: &mut Scene, args: &CallArgs) -> Value {
    let mut ids = Vec::new();
    for value in &args.positional {
        collect_hosts(value, "Remove", &mut ids);
    }
    scene.schedule_all(start_delay(args), ids.into_iter().map(Effect::Remove));
    Value::Null
}

fn global_wait(rt: &mut Runtime, scene: &mut Scene, args: &CallArgs) -> Value {
    let seconds = args.number(0, "seconds").unwrap_or(0.0);
    rt.wait(scene, seconds);
    Value::Null
}

/// `Schedule(delay, func, args...)`. The function may be given by name.
fn global_schedule(rt: &mut Runtime, scene: &mut Scene, args: &CallArgs) -> Value {
    let delay = args.number(0, "delay").unwrap_or(0.0);
    let func = match args.get(1, "func") {
        Some(Value::Func(f)) => Rc::clone(f),
        Some(Value::String(name)) => match rt.lookup(name) {
            Some(Value::Func(f)) => Rc::clone(f),
            _ => {
                log::warn!("Schedule: no function named `{name}`");
                return Value::Null;
            }
        },
        other => {
            log::warn!(
                "Schedule: expected a function, got {}",
                other.map_or("nothing", Value::type_name)
            );
            return Value::Null;
        }
    };
    let call_args = args.positional.iter().skip(2).cloned().collect();
    scene.schedule(delay, Effect::Invoke(Invocation { func, args: call_args }));
    Value::Null
}

fn global_print(rt: &mut Runtime, _scene: &mut Scene, args: &CallArgs) -> Value {
    let line = args
        .positional
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    rt.print(line);
    Value::Null
}

/// `Random()` in `[0, 1)`, or `Random(min, max)`.
fn global_random(rt: &mut Runtime, _scene: &mut Scene, args: &CallArgs) -> Value {
    let min = args.number(0, "min").unwrap_or(0.0);
    let max = args.number(1, "max").unwrap_or(1.0);
    if !min.is_finite() {
        return Value::Number(0.0);
    }
    if !max.is_finite() || max <= min || !(max - min).is_finite() {
        return Value::Number(min);
    }
    Value::Number(rt.rng().gen_range(min..max))
}

fn global_len(_rt: &mut Runtime, _scene: &mut Scene, args: &CallArgs) -> Value {
    let len = match args.at(0) {
        Some(Value::Array(items)) => items.len(),
        Some(Value::String(s)) => s.chars().count(),
        _ => 0,
    };
    Value::Number(len as f64)
}

/// `Rgb(r, g, b[, a])`. Components above 1 are read on a 0-255 scale.
fn global_rgb(_rt: &mut Runtime, _scene: &mut Scene, args: &CallArgs) -> Value {
    let mut rgb = [0.0f64; 3];
    for (i, c) in rgb.iter_mut().enumerate() {
        *c = args.at(i).map(Value::to_number).unwrap_or(0.0);
    }
    if rgb.iter().any(|c| *c > 1.0) {
        for c in &mut rgb {
            *c /= 255.0;
        }
    }
    let alpha = args.at(3).map(Value::to_number).unwrap_or(1.0);
    Value::Array(
        rgb.into_iter()
            .chain([alpha])
            .map(Value::Number)
            .collect(),
    )
}

fn global_time(_rt: &mut Runtime, scene: &mut Scene, _args: &CallArgs) -> Value {
    Value::Number(scene.now())
}

/// Apply `x`, `y`, `rotation`, `scale`, `color` and `velocity` properties to
/// a freshly built primitive.
fn apply_common_props(_rt: &mut Runtime, scene: &mut Scene, obj: &ObjectRef) {
    let obj = obj.borrow();
    let Some(p) = obj.host.and_then(|id| scene.get_mut(id)) else {
        return;
    };
    let props = &obj.props;
    if let Some(x) = props.get_ignore_case("x") {
        p.transform.x = x.to_number() as f32;
    }
    if let Some(y) = props.get_ignore_case("y") {
        p.transform.y = y.to_number() as f32;
    }
    if let Some(r) = props.get_ignore_case("rotation") {
        p.transform.rotation = r.to_number() as f32;
    }
    match props.get_ignore_case("scale") {
        Some(v @ Value::Array(_)) => {
            let s = v.numbers();
            if let [sx, sy, ..] = s.as_slice() {
                p.transform.scale_x = *sx as f32;
                p.transform.scale_y = *sy as f32;
            }
        }
        Some(v) => {
            let s = v.to_number() as f32;
            p.transform.scale_x = s;
            p.transform.scale_y = s;
        }
        None => {}
    }
    if let Some(color) = props.get_ignore_case("color") {
        for (slot, c) in p.color.iter_mut().zip(color.numbers()) {
            *slot = c as f32;
        }
    }
    if let Some(v) = props.get_ignore_case("velocity") {
        if let [vx, vy, ..] = v.numbers().as_slice() {
            p.velocity = [*vx as f32, *vy as f32];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlaybackConfig;
    use crate::dsl::Script;
    use crate::render::BoxGlyphs;
    use std::sync::Arc;

    fn record(source: &str) -> (Runtime, Scene) {
        let script = Script::parse(source);
        assert!(script.diagnostics.is_empty(), "{:?}", script.diagnostics);
        let mut rt = Runtime::new(PlaybackConfig::default(), Arc::new(BoxGlyphs));
        let mut scene = Scene::new([1.0, 1.0]);
        rt.run(&mut scene, &script.statements);
        (rt, scene)
    }

    #[test]
    fn standard_globals_are_registered() {
        let reg = standard_registry();
        for name in ["add", "remove", "wait", "schedule", "print", "log", "random", "len", "rgb", "time"] {
            assert!(reg.global(name).is_some(), "{name}");
        }
        assert!(reg.hook("circle").is_some());
        assert!(reg.resolve("text", "aColor").is_some());
    }

    #[test]
    fn operations_record_actions() {
        let (_, scene) = record("r = Add(rect())\nr.move(1, 0.5, 0.5).rotate(1, 90)\nwait(1)\nr.fade(0.5, 0)");
        assert_eq!(scene.pending(), 4);
        assert_eq!(scene.offset(), 1.0);
    }

    #[test]
    fn missing_host_skips_operation() {
        let (rt, scene) = record("p = polygon()\nx = p.move(1, 1, 1)");
        assert_eq!(scene.pending(), 0);
        assert_eq!(rt.lookup("x"), Some(&Value::Null));
    }

    #[test]
    fn add_returns_its_argument() {
        let (rt, scene) = record("a = rect()\nb = circle()\nboth = Add { a, b }\nsame = Add(a)");
        assert_eq!(rt.lookup("same"), rt.lookup("a"));
        assert_eq!(rt.lookup("both").and_then(Value::as_array).map(<[Value]>::len), Some(2));
        assert_eq!(scene.pending(), 3);
    }

    #[test]
    fn random_is_seeded_and_in_range() {
        let (a, _) = record("r = Random(2, 3)\ns = Random(5, 5)");
        let (b, _) = record("r = Random(2, 3)");
        let r = a.lookup("r").map(Value::to_number).unwrap();
        assert!((2.0..3.0).contains(&r));
        assert_eq!(a.lookup("r"), b.lookup("r"));
        assert_eq!(a.lookup("s"), Some(&Value::Number(5.0)));
    }

    #[test]
    fn random_with_non_finite_bounds_does_not_panic() {
        let (rt, _) = record("a = Random(<nan>, 1)\nb = Random(0, <inf>)\nc = Random(2, 1 / 0)");
        let a = rt.lookup("a").map(Value::to_number).unwrap_or(f64::NAN);
        assert!((0.0..1.0).contains(&a));
        assert_eq!(rt.lookup("b"), Some(&Value::Number(0.0)));
        assert_eq!(rt.lookup("c"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn len_and_rgb() {
        let (rt, _) = record("a = Len([1, 2, 3])\nb = Len(<héllo>)\nc = Rgb(255, 0, 51)\nd = Rgb(1, 0.5, 0, 0.25)");
        assert_eq!(rt.lookup("a"), Some(&Value::Number(3.0)));
        assert_eq!(rt.lookup("b"), Some(&Value::Number(5.0)));
        assert_eq!(
            rt.lookup("c").map(Value::numbers),
            Some(vec![1.0, 0.0, 0.2, 1.0])
        );
        assert_eq!(
            rt.lookup("d").map(Value::numbers),
            Some(vec![1.0, 0.5, 0.0, 0.25])
        );
    }

    #[test]
    fn time_follows_recording_offset() {
        let (rt, _) = record("wait(0.75)\nt = Time()");
        assert_eq!(rt.lookup("t"), Some(&Value::Number(0.75)));
    }

    #[test]
    fn print_joins_arguments() {
        let (rt, _) = record("Print(<a>, 1, true)\nLog([1, 2])");
        assert_eq!(rt.output(), ["a 1 true", "[1, 2]"]);
    }

    #[test]
    fn schedule_by_name_or_value() {
        let (rt, scene) = record("func hi(n) { Print(n) }\nSchedule(1, hi, 3)\nSchedule(2, <hi>)\nSchedule(1, <nope>)");
        assert_eq!(scene.pending(), 2);
        assert!(rt.output().is_empty());
    }
}
