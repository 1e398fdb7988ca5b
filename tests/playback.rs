//! End-to-end playback: scripts recorded into a scene, then stepped frame by frame.

use std::sync::Arc;

use assert_approx_eq::assert_approx_eq;

use tweenscript::render::{BoxGlyphs, TraceRenderer};
use tweenscript::runtime::Value;
use tweenscript::scene::{PrimitiveId, Shape};
use tweenscript::{PlaybackConfig, Player};

fn load(source: &str) -> Player {
    let player = Player::load(source, PlaybackConfig::default(), Arc::new(BoxGlyphs));
    assert!(player.diagnostics().is_empty(), "{:?}", player.diagnostics());
    player
}

fn host(player: &Player, name: &str) -> PrimitiveId {
    player
        .runtime()
        .lookup(name)
        .and_then(Value::host)
        .unwrap_or_else(|| panic!("`{name}` has no primitive"))
}

#[test]
fn color_tween_hits_eased_midpoint_and_target() {
    let mut player = load(
        "r = Add(rect(0.6, 0.4, \"true\"))\n\
         r.aColor(to: [1, 0, 0, 1], start: 0, duration: 1)",
    );
    let id = host(&player, "r");

    player.update(0.5);
    let color = player.scene().get(id).unwrap().color;
    assert_approx_eq!(color[0], 1.0);
    assert_approx_eq!(color[1], 0.5);
    assert_approx_eq!(color[2], 0.5);
    assert_approx_eq!(color[3], 1.0);

    player.update(0.5);
    let rect = player.scene().get(id).unwrap();
    assert_eq!(rect.color, [1.0, 0.0, 0.0, 1.0]);
    assert!(rect.tweens().is_empty());
    assert_eq!(rect.shape, Shape::Rect { width: 0.6, height: 0.4 });
}

#[test]
fn move_lands_exactly_and_stops() {
    let mut player = load("c = Add(circle())\nc.move(2, 0.5, 0.5)");
    let id = host(&player, "c");

    player.update(1.0);
    let midway = player.scene().get(id).unwrap().transform;
    assert!(midway.x > 0.0 && midway.x < 0.5);

    player.update(1.0);
    let circle = player.scene().get(id).unwrap();
    assert_eq!((circle.transform.x, circle.transform.y), (0.5, 0.5));
    assert!(circle.tweens().is_empty());
}

#[test]
fn brace_constructor_binds_dimensions() {
    let player = load("r = rect { width: 0.2, height: 0.1 }");
    let value = player.runtime().lookup("r").unwrap();
    let obj = value.as_object().unwrap().borrow();
    assert_eq!(obj.props.keys(), ["width", "height"]);
    assert_eq!(obj.props.get("width"), Some(&Value::Number(0.2)));

    let rect = player.scene().get(obj.host.unwrap()).unwrap();
    assert_eq!(rect.shape, Shape::Rect { width: 0.2, height: 0.1 });
    assert!(!player.scene().is_displayed(obj.host.unwrap()));
}

#[test]
fn wait_while_recording_delays_later_actions() {
    let mut player = load("Wait(1)\nr = Add(rect())");
    let id = host(&player, "r");

    player.update(0.5);
    assert!(!player.scene().is_displayed(id));
    player.update(0.6);
    assert!(player.scene().is_displayed(id));
    assert!(player.is_finished());
}

#[test]
fn scheduled_function_runs_at_its_time() {
    let mut player = load("func hi(n) { Print(<hi>, n) }\nSchedule(1, hi, 3)");
    player.update(0.5);
    assert!(player.runtime().output().is_empty());
    player.update(0.6);
    assert_eq!(player.runtime().output(), ["hi 3"]);
}

#[test]
fn wait_while_playing_advances_the_clock() {
    let mut player = load(
        "func later() {\n\
           t0 = Time()\n\
           Wait(0.5)\n\
           Print(Time() - t0)\n\
         }\n\
         Schedule(1, later)",
    );
    player.update(1.0);
    assert_eq!(player.runtime().output(), ["0.5"]);
    assert_approx_eq!(player.scene().current_time(), 1.5);
}

#[test]
fn morph_swaps_in_the_target() {
    let mut player = load("a = Add(rect())\na.setPosition(0.3, 0)\nb = circle()\nc = a.morph(b, 1)");
    let (a, b) = (host(&player, "a"), host(&player, "b"));
    assert_eq!(player.runtime().lookup("c"), player.runtime().lookup("b"));

    player.update(0.6);
    assert!(player.scene().is_displayed(a));
    assert!(player.scene().get(a).unwrap().shape_tween().is_some());

    player.update(0.6);
    assert!(!player.scene().contains(a));
    assert!(player.scene().is_displayed(b));
    assert_approx_eq!(player.scene().get(b).unwrap().transform.x, 0.3);
}

#[test]
fn morph_to_keeps_the_source() {
    let mut player = load("a = Add(rect())\nb = circle()\na.morphTo(b, 1)");
    let (a, b) = (host(&player, "a"), host(&player, "b"));

    player.update(1.5);
    assert!(player.scene().is_displayed(a));
    assert!(!player.scene().is_displayed(b));
    let morphed = player.scene().get(a).unwrap();
    assert!(morphed.shape_tween().is_none());
    assert_eq!(morphed.boundary.len(), player.scene().get(b).unwrap().boundary.len());
}

#[test]
fn remove_drops_pending_animation() {
    let mut player = load("r = Add(rect())\nr.move(2, 1, 0)\nWait(1)\nRemove(r)");
    let id = host(&player, "r");

    player.update(1.1);
    assert!(!player.scene().contains(id));
    player.update(1.0);
    let mut renderer = TraceRenderer::new();
    player.render(&mut renderer);
    assert!(renderer.calls.is_empty());
    assert_eq!(player.scene().failures(), 0);
}

#[test]
fn failing_action_does_not_stop_the_frame() {
    let mut player = load("r = Add(rect())\nRemove(r)\nRemove(r)\ns = Add(circle())");
    player.update(0.0);
    assert_eq!(player.scene().failures(), 1);
    assert!(player.scene().is_displayed(host(&player, "s")));
}

#[test]
fn draw_reveals_outline_progressively() {
    let mut player = load("r = Add(rect())\nr.draw(1, easing: <linear>)");
    let id = host(&player, "r");

    player.update(0.5);
    let rect = player.scene().get(id).unwrap();
    assert_approx_eq!(rect.reveal, 0.5);
    let full: usize = rect.boundary.len();
    let visible: usize = rect.visible_loops().iter().map(Vec::len).sum();
    assert!(visible < full);

    player.update(0.6);
    assert_eq!(player.scene().get(id).unwrap().reveal, 1.0);
}

#[test]
fn velocity_bounces_off_bounds() {
    let mut player = load("r = Add(rect())\nr.velocity(1, 0)");
    let id = host(&player, "r");

    player.update(0.5);
    assert_approx_eq!(player.scene().get(id).unwrap().transform.x, 0.5);
    player.update(0.75);
    let r = player.scene().get(id).unwrap();
    assert_approx_eq!(r.transform.x, 1.0);
    assert_eq!(r.velocity, [-1.0, 0.0]);
    player.update(0.5);
    assert_approx_eq!(player.scene().get(id).unwrap().transform.x, 0.5);
}

#[test]
fn render_reports_each_displayed_primitive() {
    let mut player = load("Add { rect(), circle(), text { content: <hi> } }");
    player.update(0.0);
    let mut renderer = TraceRenderer::new();
    player.render(&mut renderer);
    assert_eq!(renderer.calls.len(), 3);
    assert!(renderer.vertex_count() > 0);
}

#[test]
fn zero_delay_reschedule_waits_for_next_frame() {
    let mut player = load("func tick() {\n  Print(<tick>)\n  Schedule(0, tick)\n}\nSchedule(0, tick)");
    for frame in 1..=3 {
        player.update(0.016);
        assert_eq!(player.runtime().output().len(), frame);
        assert_eq!(player.scene().pending(), 1);
    }
}

#[test]
fn removing_morph_source_midway_drops_the_morph() {
    let mut player = load("a = Add(rect())\nb = circle()\na.morph(b, 1)\nWait(0.5)\nRemove(a)");
    let (a, b) = (host(&player, "a"), host(&player, "b"));

    player.update(0.25);
    assert!(player.scene().get(a).unwrap().shape_tween().is_some());

    player.update(0.5);
    assert!(!player.scene().contains(a));
    player.update(1.0);
    assert!(player.scene().contains(b));
    assert!(!player.scene().is_displayed(b));
    assert_eq!(player.scene().displayed().count(), 0);
    assert_eq!(player.scene().failures(), 0);
}

#[test]
fn removing_morph_target_midway_keeps_the_source() {
    let mut player = load("a = Add(rect())\nb = circle()\na.morph(b, 1)\nWait(0.5)\nRemove(b)");
    let (a, b) = (host(&player, "a"), host(&player, "b"));

    player.update(0.75);
    assert!(!player.scene().contains(b));
    player.update(0.5);

    let shown: Vec<PrimitiveId> = player.scene().displayed().map(|(id, _)| id).collect();
    assert_eq!(shown, vec![a]);
    let source = player.scene().get(a).unwrap();
    assert!(source.shape_tween().is_none());
    assert_eq!(player.scene().failures(), 0);
}
