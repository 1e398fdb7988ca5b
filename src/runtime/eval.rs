//! Tree-walking evaluator.
//!
//! Evaluation never fails. Unbound names read as null, unregistered calls
//! are counted dispatch misses that return null, and host failures are
//! logged where they happen.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::builtins;
use super::host::{self, HostContext, HostError};
use super::registry::{CallArgs, CommandRegistry};
use super::scope::Scopes;
use super::value::{ObjectRef, PropertyMap, RuntimeObject, Value};
use crate::animation::{Animatable, Property};
use crate::config::PlaybackConfig;
use crate::dsl::{Arg, Expr, ExprKind, FuncDef, InterpPart, Stmt, StmtKind};
use crate::render::GlyphSource;
use crate::scene::{EffectHost, Invocation, Phase, Scene, SceneError};

/// Nested user-function calls beyond this depth return null.
pub const MAX_CALL_DEPTH: usize = 64;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

pub struct Runtime {
    scopes: Scopes,
    objects: Vec<ObjectRef>,
    next_object_id: u64,
    registry: Rc<CommandRegistry>,
    config: PlaybackConfig,
    rng: ChaCha8Rng,
    glyphs: Arc<dyn GlyphSource>,
    dispatch_misses: usize,
    output: Vec<String>,
    depth: usize,
}

impl Runtime {
    /// A runtime with the standard globals, operations and constructor hooks.
    pub fn new(config: PlaybackConfig, glyphs: Arc<dyn GlyphSource>) -> Self {
        Self::with_registry(config, glyphs, builtins::standard_registry())
    }

    pub fn with_registry(
        config: PlaybackConfig,
        glyphs: Arc<dyn GlyphSource>,
        registry: CommandRegistry,
    ) -> Self {
        Self {
            scopes: Scopes::new(),
            objects: Vec::new(),
            next_object_id: 0,
            registry: Rc::new(registry),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            glyphs,
            dispatch_misses: 0,
            output: Vec::new(),
            depth: 0,
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Every object constructed so far, oldest first.
    pub fn objects(&self) -> &[ObjectRef] {
        &self.objects
    }

    /// Read a binding, innermost scope first.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.scopes.get(name)
    }

    /// Calls that found no handler.
    pub fn dispatch_misses(&self) -> usize {
        self.dispatch_misses
    }

    /// Lines written by `Print`/`Log`.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub(crate) fn print(&mut self, line: String) {
        log::info!(target: "tweenscript::script", "{line}");
        self.output.push(line);
    }

    fn dispatch_miss(&mut self, what: &str) {
        self.dispatch_misses += 1;
        log::debug!("no handler for {what}; evaluating to null");
    }

    /// Execute top-level statements. A top-level `return` stops the script.
    pub fn run(&mut self, scene: &mut Scene, statements: &[Stmt]) {
        for stmt in statements {
            if let Flow::Return(_) = self.exec(scene, stmt) {
                log::debug!("script returned at line {}", stmt.line);
                break;
            }
        }
    }

    fn exec_block(&mut self, scene: &mut Scene, body: &[Stmt]) -> Flow {
        for stmt in body {
            if let flow @ Flow::Return(_) = self.exec(scene, stmt) {
                return flow;
            }
        }
        Flow::Normal
    }

    pub fn exec(&mut self, scene: &mut Scene, stmt: &Stmt) -> Flow {
        match &stmt.kind {
            StmtKind::Assignment { target, value } => {
                let value = self.eval(scene, value);
                self.assign(scene, target, value);
            }
            StmtKind::Expr(expr) => {
                self.eval(scene, expr);
            }
            StmtKind::Wait(expr) => {
                let seconds = self.eval(scene, expr).to_number();
                self.wait(scene, seconds);
            }
            StmtKind::Repeat { count, body } => {
                let n = self.eval(scene, count).to_number().trunc();
                if n > 0.0 {
                    for _ in 0..n as u64 {
                        if let flow @ Flow::Return(_) = self.exec_block(scene, body) {
                            return flow;
                        }
                    }
                }
            }
            StmtKind::FuncDef(func) => {
                self.scopes.assign(func.name.clone(), Value::Func(Rc::clone(func)));
            }
            StmtKind::Return(expr) => {
                let value = match expr {
                    Some(e) => self.eval(scene, e),
                    None => Value::Null,
                };
                return Flow::Return(value);
            }
        }
        Flow::Normal
    }

    fn assign(&mut self, scene: &mut Scene, target: &Expr, value: Value) {
        match &target.kind {
            ExprKind::Ident(name) => self.scopes.assign(name.clone(), value),
            ExprKind::Member { target, name } => match self.eval(scene, target) {
                Value::Object(obj) => {
                    obj.borrow_mut().props.insert(name.clone(), value);
                }
                other => log::debug!(
                    "[{}:{}] cannot set `{name}` on {}",
                    target.line,
                    target.col,
                    other.type_name()
                ),
            },
            _ => log::debug!("[{}:{}] invalid assignment target", target.line, target.col),
        }
    }

    /// `wait` while recording advances the timeline offset; while playing it
    /// advances the live clock, firing whatever comes due.
    pub fn wait(&mut self, scene: &mut Scene, seconds: f64) {
        let result = match scene.phase() {
            Phase::Recording => scene.schedule_delay(seconds),
            Phase::Playing => scene.advance_clock(seconds, self),
        };
        if let Err(e) = result {
            log::warn!("wait({seconds}): {e}");
        }
    }

    pub fn eval(&mut self, scene: &mut Scene, expr: &Expr) -> Value {
        match &expr.kind {
            ExprKind::Number(n) => Value::Number(*n),
            ExprKind::Bool(b) => Value::Bool(*b),
            ExprKind::String(s) => Value::String(s.clone()),
            ExprKind::Array(items) => {
                Value::Array(items.iter().map(|e| self.eval(scene, e)).collect())
            }
            ExprKind::Ident(name) => match self.scopes.get(name) {
                Some(v) => v.clone(),
                None => {
                    log::debug!("[{}:{}] unbound name `{name}`", expr.line, expr.col);
                    Value::Null
                }
            },
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.eval(scene, lhs);
                let rhs = self.eval(scene, rhs);
                Value::binary(*op, &lhs, &rhs)
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.eval(scene, operand);
                Value::unary(*op, &operand)
            }
            ExprKind::Member { target, name } => match self.eval(scene, target) {
                Value::Object(obj) => self.member(scene, &obj, name),
                _ => Value::Null,
            },
            ExprKind::Call { callee, args } => self.eval_call(scene, callee, args),
            ExprKind::ObjectConstructor {
                type_name,
                args,
                props,
            } => {
                let args = self.eval_args(scene, args);
                let props: PropertyMap = props
                    .iter()
                    .map(|(name, e)| (name.clone(), self.eval(scene, e)))
                    .collect();
                self.construct(scene, type_name, &args, props)
            }
            ExprKind::Interp(parts) => {
                let mut text = String::new();
                for part in parts {
                    match part {
                        InterpPart::Text(t) => text.push_str(t),
                        InterpPart::Expr(e) => text.push_str(&self.eval(scene, e).to_string()),
                    }
                }
                Value::String(text)
            }
        }
    }

    fn eval_args(&mut self, scene: &mut Scene, args: &[Arg]) -> CallArgs {
        let mut out = CallArgs::default();
        for arg in args {
            match arg {
                Arg::Positional(e) => {
                    let v = self.eval(scene, e);
                    out.positional.push(v);
                }
                Arg::Named(name, e) => {
                    let v = self.eval(scene, e);
                    out.named.push((name.clone(), v));
                }
            }
        }
        out
    }

    /// Property first, then the live value of a bound primitive.
    fn member(&self, scene: &Scene, obj: &ObjectRef, name: &str) -> Value {
        let obj = obj.borrow();
        if let Some(v) = obj.props.get(name) {
            return v.clone();
        }
        match (obj.host.and_then(|id| scene.get(id)), Property::from_name(name)) {
            (Some(primitive), Some(property)) => Value::Number(primitive.get(property)),
            _ => Value::Null,
        }
    }

    fn eval_call(&mut self, scene: &mut Scene, callee: &Expr, args: &[Arg]) -> Value {
        match &callee.kind {
            ExprKind::Member { target, name } => {
                let target = self.eval(scene, target);
                let args = self.eval_args(scene, args);
                match target {
                    Value::Object(obj) => self.call_method(scene, &obj, name, &args),
                    other => {
                        self.dispatch_miss(&format!("{}.{name}", other.type_name()));
                        Value::Null
                    }
                }
            }
            ExprKind::Ident(name) => {
                let args = self.eval_args(scene, args);
                self.call_named(scene, name, args)
            }
            _ => {
                let callee = self.eval(scene, callee);
                let args = self.eval_args(scene, args);
                match callee {
                    Value::Func(func) => self.call_function(scene, &func, args),
                    other => {
                        self.dispatch_miss(&format!("call of {}", other.type_name()));
                        Value::Null
                    }
                }
            }
        }
    }

    /// Resolve a bare call: user function, then global, then host constructor.
    fn call_named(&mut self, scene: &mut Scene, name: &str, args: CallArgs) -> Value {
        if let Some(Value::Func(func)) = self.scopes.get(name).cloned() {
            return self.call_function(scene, &func, args);
        }
        let registry = Rc::clone(&self.registry);
        if let Some(handler) = registry.global(name) {
            return handler(self, scene, &args);
        }
        if host::adapter(name).is_some() {
            return self.construct(scene, name, &args, PropertyMap::new());
        }
        self.dispatch_miss(&format!("{name}()"));
        Value::Null
    }

    /// Dispatch `target.method(args)` through the registry.
    pub fn call_method(
        &mut self,
        scene: &mut Scene,
        target: &ObjectRef,
        method: &str,
        args: &CallArgs,
    ) -> Value {
        let type_name = target.borrow().type_name.clone();
        let registry = Rc::clone(&self.registry);
        match registry.resolve(&type_name, method) {
            Some(handler) => handler(self, scene, target, args),
            None => {
                self.dispatch_miss(&format!("{type_name}.{method}"));
                Value::Null
            }
        }
    }

    /// Call a user function. Positional arguments bind first, then named
    /// ones by parameter name; parameters left over are null.
    pub fn call_function(&mut self, scene: &mut Scene, func: &Rc<FuncDef>, args: CallArgs) -> Value {
        if self.depth >= MAX_CALL_DEPTH {
            log::warn!("{}(): call depth limit of {MAX_CALL_DEPTH} reached", func.name);
            return Value::Null;
        }
        let CallArgs {
            positional,
            mut named,
        } = args;
        let mut positional = positional.into_iter();

        self.scopes.push();
        for param in &func.params {
            let value = match positional.next() {
                Some(v) => v,
                None => named
                    .iter()
                    .position(|(n, _)| n == param)
                    .map(|i| named.swap_remove(i).1)
                    .unwrap_or_default(),
            };
            self.scopes.assign(param.clone(), value);
        }

        self.depth += 1;
        let flow = self.exec_block(scene, &func.body);
        self.depth -= 1;
        self.scopes.pop();

        match flow {
            Flow::Return(v) => v,
            Flow::Normal => Value::Null,
        }
    }

    /// Build an object: properties in declaration order, then host binding,
    /// then the type's constructor hook. Named arguments count as properties.
    pub fn construct(
        &mut self,
        scene: &mut Scene,
        type_name: &str,
        args: &CallArgs,
        mut props: PropertyMap,
    ) -> Value {
        for (name, value) in &args.named {
            props.insert(name.clone(), value.clone());
        }
        let adapter = host::adapter(type_name);
        let type_name = adapter.map_or(type_name, |a| a.type_name);
        if let Some(adapter) = adapter {
            for (param, value) in adapter.params.iter().zip(&args.positional) {
                if !value.is_null() && !props.contains_ignore_case(param.name) {
                    props.insert(param.name, value.clone());
                }
            }
        }

        self.next_object_id += 1;
        let mut object = RuntimeObject::new(self.next_object_id, type_name, props);
        let ctx = HostContext {
            config: &self.config,
            glyphs: self.glyphs.as_ref(),
        };
        match host::build(type_name, &args.positional, &object.props, &ctx) {
            Ok(primitive) => object.host = Some(scene.insert(primitive)),
            Err(HostError::UnknownType(_)) => {
                log::debug!("`{type_name}` has no host type; keeping a plain object")
            }
            Err(e) => log::warn!("cannot construct {type_name}: {e}"),
        }

        let object = Rc::new(RefCell::new(object));
        self.objects.push(Rc::clone(&object));
        let registry = Rc::clone(&self.registry);
        if let Some(hook) = registry.hook(type_name) {
            hook(self, scene, &object);
        }
        Value::Object(object)
    }
}

impl EffectHost for Runtime {
    fn invoke(&mut self, scene: &mut Scene, call: Invocation) -> Result<(), SceneError> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(SceneError::Script(format!(
                "{}(): call depth limit reached",
                call.func.name
            )));
        }
        self.call_function(scene, &call.func, CallArgs::positional(call.args));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::Script;
    use crate::render::BoxGlyphs;

    fn run(source: &str) -> (Runtime, Scene) {
        let script = Script::parse(source);
        assert!(script.diagnostics.is_empty(), "{:?}", script.diagnostics);
        let mut rt = Runtime::new(PlaybackConfig::default(), Arc::new(BoxGlyphs));
        let mut scene = Scene::new([1.0, 1.0]);
        rt.run(&mut scene, &script.statements);
        (rt, scene)
    }

    fn num(rt: &Runtime, name: &str) -> f64 {
        rt.lookup(name).map(Value::to_number).unwrap_or(f64::NAN)
    }

    #[test]
    fn arithmetic_and_precedence() {
        let (rt, _) = run("a = 1 + 2 * 3\nb = (1 + 2) * 3\nc = -2 * 3 + 10 % 4");
        assert_eq!(num(&rt, "a"), 7.0);
        assert_eq!(num(&rt, "b"), 9.0);
        assert_eq!(num(&rt, "c"), -4.0);
    }

    #[test]
    fn division_by_zero_yields_zero() {
        let (rt, _) = run("a = 5 / 0\nb = 5 % 0\nc = 1 / 4");
        assert_eq!(rt.lookup("a"), Some(&Value::Number(0.0)));
        assert_eq!(rt.lookup("b"), Some(&Value::Number(0.0)));
        assert_eq!(num(&rt, "c"), 0.25);
    }

    #[test]
    fn logical_operators_evaluate_both_sides() {
        let (rt, _) = run("func side() { Print(<called>)\nreturn 1 }\nx = 0 && side()\ny = 1 || side()");
        assert_eq!(rt.output(), ["called", "called"]);
        assert_eq!(rt.lookup("x"), Some(&Value::Bool(false)));
        assert_eq!(rt.lookup("y"), Some(&Value::Bool(true)));
    }

    #[test]
    fn functions_bind_positional_then_named() {
        let (rt, _) = run(
            "func f(a, b, c) { return a + b * 10 + c * 100 }\nx = f(1, c: 3)\ny = f(1, 2)\nz = f(c: 1, b: 2, a: 3)",
        );
        assert_eq!(num(&rt, "x"), 301.0);
        assert_eq!(num(&rt, "y"), 21.0);
        assert_eq!(num(&rt, "z"), 123.0);
    }

    #[test]
    fn function_scope_pops_and_shadows() {
        let (rt, _) = run("v = 1\nfunc f(v) { w = v\nreturn v * 2 }\nr = f(5)");
        assert_eq!(num(&rt, "v"), 1.0);
        assert_eq!(num(&rt, "r"), 10.0);
        assert!(rt.lookup("w").is_none());
    }

    #[test]
    fn early_return_stops_body() {
        let (rt, _) = run("func f() { return 1\nPrint(<unreachable>) }\nr = f()\nfunc g() { }\ns = g()");
        assert_eq!(num(&rt, "r"), 1.0);
        assert!(rt.output().is_empty());
        assert_eq!(rt.lookup("s"), Some(&Value::Null));
    }

    #[test]
    fn repeat_truncates_count() {
        let (rt, _) = run("n = 0\nrepeat 3.9 { n = n + 1 }\nrepeat -2 { n = n + 100 }\nrepeat 0 { n = n + 100 }");
        assert_eq!(num(&rt, "n"), 3.0);
    }

    #[test]
    fn recursion_is_bounded() {
        let (rt, _) = run("func f(n) { return f(n + 1) }\nr = f(0)");
        assert_eq!(rt.lookup("r"), Some(&Value::Null));
    }

    #[test]
    fn unbound_names_and_unknown_calls_are_null() {
        let (rt, _) = run("a = missing\nb = nothing(1, 2)\nc = a.b");
        assert_eq!(rt.lookup("a"), Some(&Value::Null));
        assert_eq!(rt.lookup("b"), Some(&Value::Null));
        assert_eq!(rt.lookup("c"), Some(&Value::Null));
        assert_eq!(rt.dispatch_misses(), 1);
    }

    #[test]
    fn constructor_props_and_host_binding() {
        let (rt, scene) = run("r = rect { width: 0.2, height: 0.1 }");
        let obj = rt.lookup("r").and_then(Value::as_object).unwrap().borrow().clone();
        assert_eq!(obj.type_name, "rect");
        assert_eq!(obj.props.keys(), vec!["width", "height"]);
        assert_eq!(obj.props.get("width"), Some(&Value::Number(0.2)));
        let prim = scene.get(obj.host.unwrap()).unwrap();
        assert_eq!(
            prim.shape,
            crate::scene::Shape::Rect {
                width: 0.2,
                height: 0.1
            }
        );
    }

    #[test]
    fn positional_constructor_args_are_recorded() {
        let (rt, _) = run("c = circle(0.3)\nd = circle(0.3) { radius: 0.9 }");
        let c = rt.lookup("c").and_then(Value::as_object).unwrap().borrow().clone();
        assert_eq!(c.props.get("radius"), Some(&Value::Number(0.3)));
        let d = rt.lookup("d").and_then(Value::as_object).unwrap().borrow().clone();
        assert_eq!(d.props.get("radius"), Some(&Value::Number(0.9)));
    }

    #[test]
    fn object_ids_are_unique_and_increasing() {
        let (rt, _) = run("a = rect()\nb = Thing { k: 1 }\nc = circle()");
        let ids: Vec<u64> = rt.objects().iter().map(|o| o.borrow().id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        let thing = rt.objects()[1].borrow();
        assert_eq!(thing.type_name, "Thing");
        assert!(thing.host.is_none());
    }

    #[test]
    fn failed_host_binding_keeps_object() {
        let (rt, scene) = run("p = polygon()");
        let p = rt.lookup("p").and_then(Value::as_object).unwrap().borrow().clone();
        assert!(p.host.is_none());
        assert_eq!(scene.displayed().count(), 0);
    }

    #[test]
    fn member_assignment_only_touches_properties() {
        let (rt, scene) = run("r = rect(0.5, 0.5)\nr.width = 2\nw = r.width\nx = r.x");
        assert_eq!(num(&rt, "w"), 2.0);
        assert_eq!(num(&rt, "x"), 0.0);
        let host = rt.lookup("r").and_then(Value::host).unwrap();
        assert_eq!(
            scene.get(host).unwrap().shape,
            crate::scene::Shape::Rect {
                width: 0.5,
                height: 0.5
            }
        );
    }

    #[test]
    fn common_props_apply_to_primitive() {
        let (rt, scene) = run("r = rect { x: 0.25, y: -0.5, rotation: 45, color: [1, 0, 0], velocity: [0.1, 0] }");
        let host = rt.lookup("r").and_then(Value::host).unwrap();
        let p = scene.get(host).unwrap();
        assert_eq!((p.transform.x, p.transform.y, p.transform.rotation), (0.25, -0.5, 45.0));
        assert_eq!(p.color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(p.velocity, [0.1, 0.0]);
    }

    #[test]
    fn interpolated_strings() {
        let (rt, _) = run("n = 3\ns = $<n is {n + 1}!>\nt = &<raw {n} {n + 1}>");
        assert_eq!(rt.lookup("s"), Some(&Value::from("n is 4!")));
        assert_eq!(rt.lookup("t").map(Value::to_string).as_deref(), Some("raw 3 {n + 1}"));
    }

    #[test]
    fn wait_advances_recording_offset() {
        let (_, scene) = run("wait(1.5)\nWait(0.5)\nwait(-3)");
        assert_eq!(scene.offset(), 2.0);
    }

    #[test]
    fn method_on_unknown_type_is_a_miss() {
        let (rt, _) = run("t = Thing { }\nt.move(1, 2, 3)\nr = rect()\nr.explode()");
        assert_eq!(rt.dispatch_misses(), 2);
    }
}
