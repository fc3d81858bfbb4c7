//! End-to-end walk of the navigation protocol through the public API:
//! bindings register interest, navigation requests drive gated
//! blur-then-focus handoffs, and observers watch it all through channels
//! and signals.
//!
//! Run with: cargo test --test navigation

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use scenic::{Cleanup, MatchOptions, ScenicRoot, TransitionGuard, scene_match};
use spark_signals::flush_sync;

// =============================================================================
// Helpers
// =============================================================================

fn event_log() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn()>) {
    let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let log_clone = log.clone();
    let push = move |label: &str| {
        let log = log_clone.clone();
        let label = label.to_string();
        Box::new(move || log.borrow_mut().push(label.clone())) as Box<dyn Fn()>
    };
    (log, push)
}

// =============================================================================
// Navigation Walk
// =============================================================================

#[test]
fn browse_forward_back_and_branch() {
    let root = ScenicRoot::new("/home");
    let bindings = [
        root.bind("/inbox"),
        root.bind("/message"),
        root.bind("/compose"),
    ];

    root.visit("/inbox");
    root.visit("/message");
    assert_eq!(root.path(), "/message");
    assert_eq!(root.history_index(), 2);

    root.back();
    assert_eq!(root.path(), "/inbox");
    // Forward entry still mounted until a branch truncates it.
    let message = bindings[1].scene().clone();
    assert!(message.is_mounted());

    root.visit("/compose");
    assert_eq!(root.path(), "/compose");
    assert!(!message.is_mounted());
    assert_eq!(root.history_index(), 2);
    assert_eq!(root.relative(-1).unwrap().path(), "/inbox");
    assert_eq!(root.relative(-2).unwrap().path(), "/home");
    assert!(root.relative(1).is_none());
}

#[test]
fn exactly_one_scene_focused_at_every_settled_state() {
    let root = ScenicRoot::new("/");
    let bindings = [root.bind("/a"), root.bind("/b"), root.bind("/c")];
    let home = root.current();

    let check = |root: &Rc<ScenicRoot>, scenes: &[&scenic::Scene]| {
        let focused: Vec<_> = scenes.iter().filter(|s| s.is_focused()).collect();
        assert_eq!(focused.len(), 1);
        assert_eq!(focused[0].path(), root.path());
        assert!(root.relative(0).unwrap().is_focused());
    };

    let scenes: Vec<scenic::Scene> = bindings.iter().map(|b| b.scene().clone()).collect();
    let all: Vec<&scenic::Scene> = std::iter::once(&home).chain(scenes.iter()).collect();

    check(&root, &all);
    root.visit("/a");
    check(&root, &all);
    root.visit("/b");
    check(&root, &all);
    root.back();
    check(&root, &all);
    root.visit("/c");
    check(&root, &all);
    root.back();
    root.back();
    check(&root, &all);
}

// =============================================================================
// Deferred Navigation
// =============================================================================

#[test]
fn deferred_visit_resumes_when_content_binds() {
    let root = ScenicRoot::new("/");

    // Nothing is prepared to render /profile yet: the visit parks.
    root.visit("/profile");
    assert_eq!(root.path(), "/");
    assert_eq!(root.pending().unwrap().path(), "/profile");

    // Mounting content for the path completes the navigation, no second
    // visit call needed.
    let rendered = Rc::new(Cell::new(false));
    let rendered_clone = rendered.clone();
    let _cleanup = scene_match(&root, "/profile", MatchOptions::default(), move |_| {
        rendered_clone.set(true);
        Box::new(|| {}) as Cleanup
    });
    flush_sync();

    assert_eq!(root.path(), "/profile");
    assert!(root.pending().is_none());
    assert!(rendered.get());
}

// =============================================================================
// Gated Handoff & Races
// =============================================================================

#[test]
fn exit_effect_delays_focus_handoff() {
    let root = ScenicRoot::new("/");
    let _binding = root.bind("/next");
    let home = root.current();

    let (log, push) = event_log();

    let guard: Rc<RefCell<Option<TransitionGuard>>> = Rc::new(RefCell::new(None));
    let guard_slot = guard.clone();
    let on_blur = push("will_blur");
    let _s1 = home.will_blur().subscribe(move |event| {
        on_blur();
        // Simulate an exit animation: hold the handoff open.
        *guard_slot.borrow_mut() = Some(event.defer());
    });
    let on_did_blur = push("did_blur");
    let _s2 = home.did_blur().subscribe(move |_| on_did_blur());
    let on_focus = push("root_focus");
    let _s3 = root.on_focus().subscribe(move |_| on_focus());

    root.visit("/next");
    assert_eq!(root.path(), "/");
    assert!(home.is_leaving());
    assert_eq!(*log.borrow(), ["will_blur"]);

    // Animation done: release the guard and the commit lands.
    guard.borrow_mut().take();
    assert_eq!(root.path(), "/next");
    assert!(!home.is_leaving());
    assert_eq!(*log.borrow(), ["will_blur", "did_blur", "root_focus"]);
}

#[test]
fn later_visit_wins_a_race() {
    let root = ScenicRoot::new("/");
    let bindings = [root.bind("/a"), root.bind("/b")];
    let a = bindings[0].scene().clone();
    let home = root.current();

    let a_committed = Rc::new(Cell::new(false));
    let flag = a_committed.clone();
    let _s1 = a.will_focus().subscribe(move |_| flag.set(true));
    let flag = a_committed.clone();
    let _s2 = a.did_focus().subscribe(move |_| flag.set(true));

    // Every blur of the home scene is held open.
    let guards: Rc<RefCell<Vec<TransitionGuard>>> = Rc::new(RefCell::new(Vec::new()));
    let guards_clone = guards.clone();
    let _s3 = home.will_blur().subscribe(move |event| {
        guards_clone.borrow_mut().push(event.defer());
    });

    root.visit("/a");
    root.visit("/b");
    assert_eq!(root.path(), "/"); // both suspended

    // Both exit effects finish; only the later transition commits.
    guards.borrow_mut().clear();
    assert_eq!(root.path(), "/b");
    assert!(!a_committed.get());
    assert!(!a.is_focused());
    assert!(!a.is_entering());
}

#[test]
fn back_racing_visit_loses_to_the_later_visit() {
    let root = ScenicRoot::new("/");
    let bindings = [root.bind("/a"), root.bind("/b")];
    root.visit("/a");
    let a = bindings[0].scene().clone();

    let guards: Rc<RefCell<Vec<TransitionGuard>>> = Rc::new(RefCell::new(Vec::new()));
    let guards_clone = guards.clone();
    let _s = a.will_blur().subscribe(move |event| {
        guards_clone.borrow_mut().push(event.defer());
    });

    root.back(); // suspended on /a's blur
    assert_eq!(root.path(), "/a");
    root.visit("/b"); // races it and must win

    guards.borrow_mut().clear();
    assert_eq!(root.path(), "/b");
}

// =============================================================================
// Cache Lifecycle
// =============================================================================

#[test]
fn unreferenced_scene_is_swept_after_next_transition() {
    let root = ScenicRoot::new("/");
    let stale = {
        let short_lived = root.bind("/stale");
        short_lived.scene().clone()
    };
    assert_eq!(stale.matches(), 0);

    // Idempotent until evicted: same instance comes back.
    assert!(root.get("/stale").ptr_eq(&stale));

    let _binding = root.bind("/next");
    root.visit("/next");

    // The sweep ran; a new lookup constructs a fresh scene.
    assert!(!root.get("/stale").ptr_eq(&stale));
}

#[test]
fn bound_scenes_survive_sweeps() {
    let root = ScenicRoot::new("/");
    let held = root.bind("/held");
    let scene = held.scene().clone();

    let _binding = root.bind("/next");
    root.visit("/next");
    root.back();

    assert!(root.get("/held").ptr_eq(&scene));
}

// =============================================================================
// Render Binding
// =============================================================================

#[test]
fn content_follows_mount_state() {
    let root = ScenicRoot::new("/");
    let alive = Rc::new(Cell::new(false));

    let alive_clone = alive.clone();
    let _cleanup = scene_match(&root, "/panel", MatchOptions::default(), move |scene| {
        assert_eq!(scene.path(), "/panel");
        alive_clone.set(true);
        let alive_inner = alive_clone.clone();
        Box::new(move || alive_inner.set(false)) as Cleanup
    });
    flush_sync();
    assert!(!alive.get());

    root.visit("/panel");
    flush_sync();
    assert!(alive.get());

    // Branch away: /panel is truncated out of history and unmounts.
    root.back();
    let _other = root.bind("/other");
    root.visit("/other");
    flush_sync();
    assert!(!alive.get());
}
