//! End-to-end scenarios against the recording host.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Instant;

use spark_fiber::*;

// =============================================================================
// Helpers
// =============================================================================

fn setup() -> (Engine<RecordingHost>, NodeId) {
    let mut host = RecordingHost::new();
    let container = host.container();
    (Engine::new(host), container)
}

fn el(tag: &str, children: Vec<Child>) -> Element {
    build(tag, Props::new(), children)
}

fn creates_of_kind(host: &RecordingHost, text: bool) -> usize {
    host.count(|call| match call {
        HostCall::CreateTextNode { .. } => text,
        HostCall::CreateNode { .. } => !text,
        _ => false,
    })
}

fn set_properties(host: &RecordingHost) -> usize {
    host.count(|call| matches!(call, HostCall::SetProperty { .. }))
}

type Log = Rc<RefCell<Vec<String>>>;

/// Counter whose setter is stashed for the test to drive.
fn counter(stash: Rc<RefCell<Option<Setter<i64>>>>, renders: Rc<RefCell<Vec<i64>>>) -> Component {
    Component::new("Counter", move |_props: &Props, hooks: &mut Hooks| {
        let (count, set_count) = hooks.use_state(0i64)?;
        renders.borrow_mut().push(count);
        *stash.borrow_mut() = Some(set_count);
        Ok(build("span", Props::new(), children![count]))
    })
}

/// Logs effect runs and cleanups for its `dep` prop.
fn watcher(log: Log) -> Component {
    Component::new("Watcher", move |props: &Props, hooks: &mut Hooks| {
        let dep = props.get("dep").and_then(PropValue::as_int).unwrap_or(0);
        let log = log.clone();
        hooks.use_effect(
            move || {
                log.borrow_mut().push(format!("run:{dep}"));
                let log = log.clone();
                Some(Box::new(move || log.borrow_mut().push(format!("cleanup:{dep}"))) as Cleanup)
            },
            Some(deps![dep]),
        )?;
        Ok(build("i", Props::new(), children![]))
    })
}

// =============================================================================
// Host Tree Scenarios
// =============================================================================

fn greeting(last: &str) -> Element {
    el(
        "div",
        children![el("p", children!["hi"]), el("span", children![last])],
    )
}

#[test]
fn test_initial_mount_creates_and_appends() {
    let (mut engine, container) = setup();
    engine.render(greeting("x"), container);
    let stats = engine.flush().unwrap();

    let host = engine.host();
    assert_eq!(creates_of_kind(host, false), 3);
    assert_eq!(creates_of_kind(host, true), 2);
    let div = host.children_of(container)[0];
    assert_eq!(host.appends_into(div), 2);
    assert_eq!(host.appends_into(container), 1);
    assert_eq!(host.markup(container), "<div><p>hi</p><span>x</span></div>");
    assert_eq!(stats.placements, 5);
    assert_eq!(stats.deletions, 0);
}

#[test]
fn test_text_change_is_single_update() {
    let (mut engine, container) = setup();
    engine.render(greeting("x"), container);
    engine.flush().unwrap();
    engine.host_mut().clear_calls();

    engine.render(greeting("y"), container);
    let stats = engine.flush().unwrap();

    let host = engine.host();
    assert_eq!(set_properties(host), 1);
    assert_eq!(host.creates(), 0);
    assert_eq!(host.removes(), 0);
    assert_eq!(host.markup(container), "<div><p>hi</p><span>y</span></div>");
    assert!(!stats.is_structural());
}

#[test]
fn test_identical_rerender_is_silent() {
    let (mut engine, container) = setup();
    let tree = || {
        build(
            "ul",
            Props::new().with("class", "list"),
            children![el("li", children![1]), el("li", children![2])],
        )
    };
    engine.render(tree(), container);
    engine.flush().unwrap();
    engine.host_mut().clear_calls();

    engine.render(tree(), container);
    let stats = engine.flush().unwrap();

    assert!(engine.host().calls().is_empty());
    assert_eq!(stats.placements, 0);
    assert_eq!(stats.deletions, 0);
    assert_eq!(engine.fiber_count(), engine.committed_fiber_count());
}

#[test]
fn test_same_type_keeps_host_nodes() {
    let (mut engine, container) = setup();
    engine.render(greeting("x"), container);
    engine.flush().unwrap();
    let div = engine.host().children_of(container)[0];
    let before = engine.host().children_of(div).to_vec();

    engine.render(greeting("z"), container);
    engine.flush().unwrap();

    assert_eq!(engine.host().children_of(container), &[div]);
    assert_eq!(engine.host().children_of(div), before.as_slice());
}

#[test]
fn test_type_change_deletes_and_places() {
    let (mut engine, container) = setup();
    engine.render(el("div", children![el("p", children!["a"])]), container);
    engine.flush().unwrap();
    let div = engine.host().children_of(container)[0];
    engine.host_mut().clear_calls();

    engine.render(el("div", children![el("span", children!["a"])]), container);
    let stats = engine.flush().unwrap();

    let host = engine.host();
    assert_eq!(stats.deletions, 1);
    assert_eq!(host.removes(), 1);
    assert_eq!(host.appends_into(div), 1);
    assert_eq!(set_properties(host), 0);
    assert_eq!(host.markup(container), "<div><span>a</span></div>");
}

#[test]
fn test_shrinking_and_growing_children() {
    let (mut engine, container) = setup();
    engine.render(el("div", children!["a", "b", "c"]), container);
    engine.flush().unwrap();

    engine.render(el("div", children!["a"]), container);
    let stats = engine.flush().unwrap();
    assert_eq!(stats.deletions, 2);
    assert_eq!(engine.host().markup(container), "<div>a</div>");

    engine.render(el("div", children!["a", "d"]), container);
    let stats = engine.flush().unwrap();
    assert_eq!(stats.placements, 1);
    assert_eq!(engine.host().markup(container), "<div>ad</div>");
    assert_eq!(engine.fiber_count(), engine.committed_fiber_count());
}

#[test]
fn test_prop_changes_reach_host() {
    let (mut engine, container) = setup();
    engine.render(
        build("a", Props::new().with("href", "/one").with("title", "t"), children![]),
        container,
    );
    engine.flush().unwrap();

    engine.render(build("a", Props::new().with("href", "/two"), children![]), container);
    engine.flush().unwrap();

    let link = engine.host().children_of(container)[0];
    assert_eq!(engine.host().markup(container), "<a href=\"/two\"></a>");
    assert!(engine.host().property(link, "title").is_none());
}

#[test]
fn test_deleting_component_removes_its_host_nodes() {
    let (mut engine, container) = setup();
    let badge = Component::new("Badge", |_props: &Props, _hooks: &mut Hooks| {
        Ok(build("b", Props::new(), children!["new"]))
    });

    engine.render(el("div", children![build(&badge, Props::new(), children![])]), container);
    engine.flush().unwrap();
    assert_eq!(engine.host().markup(container), "<div><b>new</b></div>");

    engine.render(el("div", children![]), container);
    let stats = engine.flush().unwrap();
    assert_eq!(stats.deletions, 1);
    assert_eq!(engine.host().removes(), 1);
    assert_eq!(engine.host().markup(container), "<div></div>");
}

// =============================================================================
// Scheduling
// =============================================================================

#[test]
fn test_yield_and_resume_without_rework() {
    let (mut engine, container) = setup();
    engine.render(el("div", children![el("p", children!["a"]), el("p", children!["b"]), el("p", children!["c"])]), container);

    // 8 units: root, div, then p and text three times.
    assert_eq!(engine.work_loop(&UnitBudget::new(3)).unwrap(), WorkStatus::Yielded);
    assert_eq!(engine.phase(), Phase::Reconciling);
    assert_eq!(engine.host().markup(container), "");
    assert_eq!(engine.work_loop(&UnitBudget::new(3)).unwrap(), WorkStatus::Yielded);
    assert!(matches!(
        engine.work_loop(&UnitBudget::new(3)).unwrap(),
        WorkStatus::Committed(_)
    ));

    assert_eq!(engine.host().creates(), 7);
    assert_eq!(engine.host().markup(container), "<div><p>a</p><p>b</p><p>c</p></div>");
    assert_eq!(engine.phase(), Phase::Idle);
    assert_eq!(engine.work_loop(&Unbounded).unwrap(), WorkStatus::Idle);
}

#[test]
fn test_exhausted_budget_still_progresses() {
    let (mut engine, container) = setup();
    engine.render(el("div", children!["a"]), container);

    let expired = Deadline::at(Instant::now());
    let mut calls = 0;
    loop {
        calls += 1;
        if let WorkStatus::Committed(_) = engine.work_loop(&expired).unwrap() {
            break;
        }
    }
    assert_eq!(calls, 3);
    assert_eq!(engine.host().markup(container), "<div>a</div>");
}

#[test]
fn test_new_render_supersedes_inflight_pass() {
    let (mut engine, container) = setup();
    engine.render(el("section", children!["x"]), container);
    assert_eq!(engine.work_loop(&UnitBudget::new(2)).unwrap(), WorkStatus::Yielded);

    engine.render(el("main", children![]), container);
    engine.flush().unwrap();

    let host = engine.host();
    assert_eq!(host.markup(container), "<main></main>");
    assert_eq!(host.count(|c| matches!(c, HostCall::DiscardNode { .. })), 1);
    assert!(host.is_discarded(NodeId(1)));
    assert_eq!(engine.fiber_count(), engine.committed_fiber_count());
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_host_failure_aborts_pass() {
    let (mut engine, container) = setup();
    engine.host_mut().fail_on_create("canvas");
    engine.render(el("div", children![el("canvas", children![])]), container);

    let err = engine.flush().unwrap_err();
    assert!(matches!(err, Error::Host(_)));
    assert_eq!(engine.phase(), Phase::Idle);
    assert_eq!(engine.fiber_count(), 0);
    assert_eq!(engine.host().markup(container), "");
    assert_eq!(engine.host().count(|c| matches!(c, HostCall::DiscardNode { .. })), 1);

    // A fresh render is the way back.
    engine.render(el("div", children![]), container);
    engine.flush().unwrap();
    assert_eq!(engine.host().markup(container), "<div></div>");
}

#[test]
fn test_failed_append_marks_tree_stale_and_rebuilds() {
    let (mut engine, container) = setup();
    let tree = |tag: &str, label: &str| el("div", children![el(tag, children![label])]);
    engine.render(tree("p", "a"), container);
    engine.flush().unwrap();

    // The old <p> is removed before the <span> append fails.
    engine.host_mut().fail_on_append("span");
    engine.render(tree("span", "b"), container);
    assert!(matches!(engine.flush(), Err(Error::Host(_))));
    assert!(engine.is_stale());
    assert_eq!(engine.phase(), Phase::Idle);
    assert_eq!(engine.fiber_count(), engine.committed_fiber_count());
    assert_eq!(engine.host().markup(container), "<div></div>");
    assert!(engine.host().is_discarded(NodeId(4)));
    assert!(engine.host().is_discarded(NodeId(5)));

    // Diffing against the old tree would reuse the removed <p>.
    engine.render(tree("p", "a"), container);
    engine.flush().unwrap();
    assert!(!engine.is_stale());
    assert_eq!(engine.host().markup(container), "<div><p>a</p></div>");
    assert_eq!(engine.fiber_count(), engine.committed_fiber_count());
}

#[test]
fn test_failed_commit_detaches_what_it_attached() {
    let (mut engine, container) = setup();
    engine.render(el("p", children!["a"]), container);
    engine.flush().unwrap();

    // <section> reaches the container, then its <span> child is rejected.
    engine.host_mut().fail_on_append("span");
    engine.render(el("section", children![el("span", children!["b"])]), container);
    assert!(engine.flush().is_err());
    let host = engine.host();
    assert_eq!(host.markup(container), "");
    assert!(host.calls().contains(&HostCall::RemoveChild {
        parent: container,
        child: NodeId(3),
    }));
    assert_eq!(host.count(|c| matches!(c, HostCall::DiscardNode { .. })), 3);

    // The old <p> is already gone from the host; the rebuild tolerates that.
    engine.render(el("p", children!["a"]), container);
    engine.flush().unwrap();
    assert_eq!(engine.host().markup(container), "<p>a</p>");
    assert!(!engine.is_stale());
}

#[test]
fn test_state_update_on_stale_tree_is_dropped() {
    let (mut engine, container) = setup();
    let stash = Rc::new(RefCell::new(None));
    let renders = Rc::new(RefCell::new(Vec::new()));
    let counter = counter(stash.clone(), renders.clone());
    let app = |extra: bool| {
        let mut kids = children![build(&counter, Props::new(), children![])];
        if extra {
            kids.extend(children![el("section", children![])]);
        }
        el("div", kids)
    };
    engine.render(app(false), container);
    engine.flush().unwrap();

    engine.host_mut().fail_on_append("section");
    engine.render(app(true), container);
    assert!(engine.flush().is_err());
    assert_eq!(renders.borrow().len(), 2);

    stash.borrow().clone().unwrap().set(9);
    assert_eq!(engine.flush().unwrap(), CommitStats::default());
    assert_eq!(renders.borrow().len(), 2);
    assert_eq!(engine.host().markup(container), "<div><span>0</span></div>");

    // The rebuild mounts a fresh instance whose setter works again.
    engine.render(app(false), container);
    engine.flush().unwrap();
    assert_eq!(*renders.borrow(), vec![0, 0, 0]);
    stash.borrow().clone().unwrap().set(3);
    engine.flush().unwrap();
    assert_eq!(engine.host().markup(container), "<div><span>3</span></div>");
}

#[test]
fn test_component_must_render_one_element() {
    let (mut engine, container) = setup();
    let twins = Component::new("Twins", |_props: &Props, _hooks: &mut Hooks| {
        Ok(vec![el("a", children![]), el("b", children![])])
    });
    engine.render(build(&twins, Props::new(), children![]), container);
    assert!(matches!(
        engine.flush(),
        Err(Error::MalformedTree { count: 2, .. })
    ));

    let nothing = Component::new("Nothing", |_props: &Props, _hooks: &mut Hooks| {
        Ok(None::<Element>)
    });
    engine.render(build(&nothing, Props::new(), children![]), container);
    assert!(matches!(
        engine.flush(),
        Err(Error::MalformedTree { count: 0, .. })
    ));
}

#[test]
fn test_hook_reorder_is_rejected() {
    let (mut engine, container) = setup();
    let swapped = Rc::new(Cell::new(false));
    let flag = swapped.clone();
    let shifty = Component::new("Shifty", move |_props: &Props, hooks: &mut Hooks| {
        if flag.get() {
            hooks.use_effect(|| None, None)?;
            hooks.use_state(0i64)?;
        } else {
            hooks.use_state(0i64)?;
            hooks.use_effect(|| None, None)?;
        }
        Ok(el("div", children![]))
    });

    engine.render(build(&shifty, Props::new(), children![]), container);
    engine.flush().unwrap();

    swapped.set(true);
    engine.render(build(&shifty, Props::new(), children![]), container);
    assert!(matches!(engine.flush(), Err(Error::HookOrder { .. })));
    // Committed tree untouched.
    assert_eq!(engine.host().markup(container), "<div></div>");
}

#[test]
fn test_hook_count_drift_is_rejected() {
    let (mut engine, container) = setup();
    let extra = Rc::new(Cell::new(false));
    let flag = extra.clone();
    let drifting = Component::new("Drifting", move |_props: &Props, hooks: &mut Hooks| {
        hooks.use_state(0i64)?;
        if flag.get() {
            hooks.use_state(1i64)?;
        }
        Ok(el("div", children![]))
    });

    engine.render(build(&drifting, Props::new(), children![]), container);
    engine.flush().unwrap();
    extra.set(true);
    engine.render(build(&drifting, Props::new(), children![]), container);
    assert!(matches!(engine.flush(), Err(Error::HookOrder { .. })));
}

// =============================================================================
// State
// =============================================================================

#[test]
fn test_queued_actions_apply_in_order() {
    let (mut engine, container) = setup();
    let stash = Rc::new(RefCell::new(None));
    let renders = Rc::new(RefCell::new(Vec::new()));
    let counter = counter(stash.clone(), renders.clone());

    engine.render(build(&counter, Props::new(), children![]), container);
    engine.flush().unwrap();
    let setter = stash.borrow().clone().unwrap();

    setter.update(|n| n + 1);
    setter.set(5);
    assert!(engine.has_pending_work());
    engine.flush().unwrap();

    assert_eq!(*renders.borrow(), vec![0, 5]);
    assert_eq!(engine.host().markup(container), "<span>5</span>");
    assert_eq!(engine.fiber_count(), engine.committed_fiber_count());
}

#[test]
fn test_state_update_rerenders_only_owner_subtree() {
    let (mut engine, container) = setup();
    let stash = Rc::new(RefCell::new(None));
    let renders = Rc::new(RefCell::new(Vec::new()));
    let counter = counter(stash.clone(), renders.clone());
    let static_renders = Rc::new(Cell::new(0));
    let seen = static_renders.clone();
    let label = Component::new("Label", move |_props: &Props, _hooks: &mut Hooks| {
        seen.set(seen.get() + 1);
        Ok(el("em", children!["static"]))
    });

    engine.render(
        el(
            "div",
            children![
                build(&counter, Props::new(), children![]),
                build(&label, Props::new(), children![])
            ],
        ),
        container,
    );
    engine.flush().unwrap();
    engine.host_mut().clear_calls();

    stash.borrow().clone().unwrap().update(|n| n + 41);
    let stats = engine.flush().unwrap();

    assert_eq!(static_renders.get(), 1);
    assert_eq!(stats.placements, 0);
    assert_eq!(set_properties(engine.host()), 1);
    assert_eq!(
        engine.host().markup(container),
        "<div><span>41</span><em>static</em></div>"
    );
    assert_eq!(engine.fiber_count(), engine.committed_fiber_count());

    // The spliced subtree is a normal part of the tree afterwards.
    stash.borrow().clone().unwrap().update(|n| n + 1);
    engine.flush().unwrap();
    assert_eq!(
        engine.host().markup(container),
        "<div><span>42</span><em>static</em></div>"
    );
}

#[test]
fn test_last_state_update_wins() {
    let (mut engine, container) = setup();
    let setters: Rc<RefCell<BTreeMap<String, Setter<i64>>>> = Default::default();
    let stash = setters.clone();
    let tagged = Component::new("Tagged", move |props: &Props, hooks: &mut Hooks| {
        let name = props.get("name").and_then(PropValue::as_str).unwrap_or("").to_string();
        let (count, set_count) = hooks.use_state(0i64)?;
        stash.borrow_mut().insert(name.clone(), set_count);
        Ok(el("span", children![format!("{name}:{count}")]))
    });
    let tree = || {
        el(
            "div",
            children![
                build(&tagged, Props::new().with("name", "a"), children![]),
                build(&tagged, Props::new().with("name", "b"), children![])
            ],
        )
    };

    engine.render(tree(), container);
    engine.flush().unwrap();

    let (a, b) = {
        let setters = setters.borrow();
        (setters["a"].clone(), setters["b"].clone())
    };
    a.set(1);
    b.set(2);
    engine.flush().unwrap();
    assert_eq!(
        engine.host().markup(container),
        "<div><span>a:0</span><span>b:2</span></div>"
    );

    // The overwritten request's action stays queued for the next render.
    engine.render(tree(), container);
    engine.flush().unwrap();
    assert_eq!(
        engine.host().markup(container),
        "<div><span>a:1</span><span>b:2</span></div>"
    );
}

#[test]
fn test_listener_drives_state_update() {
    let (mut engine, container) = setup();
    let clicker = Component::new("Clicker", |_props: &Props, hooks: &mut Hooks| {
        let (count, set_count) = hooks.use_state(0i64)?;
        let on_click = PropValue::listener(move |_| set_count.update(|n| n + 1));
        Ok(build("button", Props::new().with("onClick", on_click), children![count]))
    });

    engine.render(build(&clicker, Props::new(), children![]), container);
    engine.flush().unwrap();
    let button = engine.host().children_of(container)[0];

    assert!(engine.host().dispatch(button, "click", &PropValue::Null));
    assert!(engine.host().dispatch(button, "click", &PropValue::Null));
    engine.flush().unwrap();
    assert_eq!(engine.host().markup(container), "<button>2</button>");

    // The fresh listener from the re-render is the one attached.
    assert!(engine.host().dispatch(button, "click", &PropValue::Null));
    engine.flush().unwrap();
    assert_eq!(engine.host().markup(container), "<button>3</button>");
}

#[test]
fn test_setter_after_unmount_is_ignored() {
    let (mut engine, container) = setup();
    let stash = Rc::new(RefCell::new(None));
    let counter = counter(stash.clone(), Rc::new(RefCell::new(Vec::new())));

    engine.render(build(&counter, Props::new(), children![]), container);
    engine.flush().unwrap();
    engine.unmount();
    engine.flush().unwrap();

    stash.borrow().clone().unwrap().set(9);
    assert!(!engine.has_pending_work());
    assert_eq!(engine.host().markup(container), "");
}

// =============================================================================
// Effects
// =============================================================================

#[test]
fn test_effect_dependency_law() {
    let (mut engine, container) = setup();
    let log: Log = Default::default();
    let watcher = watcher(log.clone());
    let with_dep = |dep: i64| build(&watcher, Props::new().with("dep", dep), children![]);

    engine.render(with_dep(1), container);
    engine.flush().unwrap();
    assert_eq!(*log.borrow(), vec!["run:1"]);

    engine.render(with_dep(1), container);
    let stats = engine.flush().unwrap();
    assert_eq!(*log.borrow(), vec!["run:1"]);
    assert_eq!(stats.effects_run, 0);
    assert_eq!(stats.cleanups_run, 0);

    engine.render(with_dep(2), container);
    engine.flush().unwrap();
    assert_eq!(*log.borrow(), vec!["run:1", "cleanup:1", "run:2"]);

    // The carried-over cleanup is the one that runs on unmount.
    engine.render(with_dep(2), container);
    engine.flush().unwrap();
    engine.unmount();
    let stats = engine.flush().unwrap();
    assert_eq!(*log.borrow(), vec!["run:1", "cleanup:1", "run:2", "cleanup:2"]);
    assert_eq!(stats.cleanups_run, 1);
    assert_eq!(stats.deletions, 1);
}

#[test]
fn test_effect_without_deps_runs_every_commit() {
    let (mut engine, container) = setup();
    let log: Log = Default::default();
    let sink = log.clone();
    let ticker = Component::new("Ticker", move |_props: &Props, hooks: &mut Hooks| {
        let sink = sink.clone();
        hooks.use_effect(
            move || {
                sink.borrow_mut().push("run".to_string());
                let sink = sink.clone();
                Some(Box::new(move || sink.borrow_mut().push("cleanup".to_string())) as Cleanup)
            },
            None,
        )?;
        Ok(el("p", children![]))
    });

    engine.render(build(&ticker, Props::new(), children![]), container);
    engine.flush().unwrap();
    engine.render(build(&ticker, Props::new(), children![]), container);
    engine.flush().unwrap();
    assert_eq!(*log.borrow(), vec!["run", "cleanup", "run"]);
}

#[test]
fn test_unmount_cleanups_respect_flag() {
    let log: Log = Default::default();
    let watcher = watcher(log.clone());

    let mut host = RecordingHost::new();
    let container = host.container();
    let config = EngineConfig::default().with_flags(ConfigFlags::STRICT_HOOKS);
    let mut engine = Engine::with_config(host, config);

    engine.render(build(&watcher, Props::new().with("dep", 7), children![]), container);
    engine.flush().unwrap();
    engine.unmount();
    engine.flush().unwrap();

    assert_eq!(*log.borrow(), vec!["run:7"]);
    assert_eq!(engine.host().markup(container), "");
}

#[test]
fn test_mount_effect_can_set_state() {
    let (mut engine, container) = setup();
    let loader = Component::new("Loader", |_props: &Props, hooks: &mut Hooks| {
        let (value, set_value) = hooks.use_state(0i64)?;
        hooks.use_effect(
            move || {
                set_value.set(10);
                None
            },
            Some(deps![]),
        )?;
        Ok(el("span", children![value]))
    });

    engine.render(build(&loader, Props::new(), children![]), container);
    let stats = engine.flush().unwrap();

    assert_eq!(engine.host().markup(container), "<span>10</span>");
    assert_eq!(stats.effects_run, 1);
    assert!(!engine.has_pending_work());
}

#[test]
fn test_runaway_effect_hits_update_depth() {
    let mut host = RecordingHost::new();
    let container = host.container();
    let mut engine =
        Engine::with_config(host, EngineConfig::default().with_max_flush_passes(5));
    let runaway = Component::new("Runaway", |_props: &Props, hooks: &mut Hooks| {
        let (count, set_count) = hooks.use_state(0i64)?;
        hooks.use_effect(
            move || {
                set_count.update(|n| n + 1);
                None
            },
            None,
        )?;
        Ok(el("span", children![count]))
    });

    engine.render(build(&runaway, Props::new(), children![]), container);
    assert!(matches!(
        engine.flush(),
        Err(Error::UpdateDepthExceeded { passes: 5 })
    ));
    assert_eq!(engine.host().markup(container), "<span>4</span>");
}

#[test]
fn test_render_into_new_container_starts_fresh() {
    let log: Log = Default::default();
    let watcher = watcher(log.clone());

    let mut host = RecordingHost::new();
    let first = host.container();
    let second = host.container();
    let mut engine = Engine::new(host);

    engine.render(build(&watcher, Props::new().with("dep", 1), children![]), first);
    engine.flush().unwrap();
    engine.render(build(&watcher, Props::new().with("dep", 1), children![]), second);
    let stats = engine.flush().unwrap();

    assert_eq!(stats.placements, 2);
    assert_eq!(engine.root_host_node(), Some(&second));
    assert_eq!(*log.borrow(), vec!["run:1", "cleanup:1", "run:1"]);
    assert_eq!(engine.fiber_count(), engine.committed_fiber_count());
}
