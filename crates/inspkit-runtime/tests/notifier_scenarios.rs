//! End-to-end inspector scenarios: two panels, a selection-following panel,
//! and an undo/redo history wired through one bus.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use inspkit_runtime::{
    ChangeOptions, HistoryConfig, ManualClock, NotificationBus, ObjectHandle, OwnerId,
    PropertyBag, PropertyValue, Target, TimerQueue, UndoHistory,
};

struct Editor {
    bus: NotificationBus,
    timers: TimerQueue,
    clock: ManualClock,
    history: UndoHistory,
}

impl Editor {
    fn start() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let clock = ManualClock::new();
        let timers = TimerQueue::with_clock(clock.clone());
        let bus = NotificationBus::new(timers.clone());
        let history = UndoHistory::new(HistoryConfig::default());
        bus.set_recorder(history.clone());
        Self {
            bus,
            timers,
            clock,
            history,
        }
    }

    fn tick(&self, ms: u64) -> usize {
        self.clock.advance_ms(ms);
        self.timers.run_due()
    }
}

fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
    let count = Rc::new(Cell::new(0u32));
    let c = Rc::clone(&count);
    (count, move || c.set(c.get() + 1))
}

fn light() -> ObjectHandle {
    ObjectHandle::new(
        PropertyBag::new("PointLight")
            .with("intensity", 1.0)
            .with("color", PropertyValue::Color([1.0, 1.0, 1.0, 1.0])),
    )
}

#[test]
fn caller_exclusion_then_unregister() {
    let editor = Editor::start();
    let obj = light();
    let a = OwnerId::new();
    let b = OwnerId::new();
    let (inc_a_count, inc_a) = counter();
    let (inc_b_count, inc_b) = counter();
    editor.bus.register(a, &obj, inc_a);
    editor.bus.register(b, &obj, inc_b);

    editor.bus.notify_change(&obj, ChangeOptions::new().caller(a));
    assert_eq!(inc_a_count.get(), 0);
    assert_eq!(inc_b_count.get(), 1);

    editor.bus.unregister(b);
    editor.bus.notify_change(&obj, ChangeOptions::new());
    assert_eq!(inc_a_count.get(), 1);
    assert_eq!(inc_b_count.get(), 1);
}

#[test]
fn two_owners_both_fire_without_caller() {
    let editor = Editor::start();
    let obj = light();
    let (a_count, inc_a) = counter();
    let (b_count, inc_b) = counter();
    editor.bus.register(OwnerId::new(), &obj, inc_a);
    editor.bus.register(OwnerId::new(), &obj, inc_b);

    let report = editor.bus.notify_change(&obj, ChangeOptions::new());
    assert_eq!(report.matched, 2);
    assert_eq!((a_count.get(), b_count.get()), (1, 1));
}

#[test]
fn caller_with_many_registrations_sees_none() {
    let editor = Editor::start();
    let obj = light();
    let panel = OwnerId::new();
    let (count, inc) = counter();
    let inc = Rc::new(inc);
    for _ in 0..4 {
        let inc = Rc::clone(&inc);
        editor.bus.register(panel, &obj, move || inc());
    }
    let (other_count, other) = counter();
    editor.bus.register(OwnerId::new(), &obj, other);

    editor.bus.notify_change(&obj, ChangeOptions::new().caller(panel));
    assert_eq!(count.get(), 0);
    assert_eq!(other_count.get(), 1);
}

#[test]
fn slider_drag_is_debounced_and_recorded() {
    let editor = Editor::start();
    let obj = light();
    let slider = OwnerId::new();
    let (preview_count, preview) = counter();
    editor.bus.register(OwnerId::new(), &obj, preview);

    let mut value = 1.0;
    for _ in 0..10 {
        let old = value;
        value += 0.1;
        obj.set("intensity", value.into()).unwrap();
        editor.bus.notify_change(
            &obj,
            ChangeOptions::new()
                .property("intensity")
                .values(old, value)
                .caller(slider)
                .wait_ms(100),
        );
        editor.tick(16);
    }
    assert_eq!(preview_count.get(), 0);
    assert_eq!(editor.history.undo_depth(), 10);

    // Last notification was 16ms ago.
    editor.tick(83);
    assert_eq!(preview_count.get(), 0);
    editor.tick(1);
    assert_eq!(preview_count.get(), 1);
}

#[test]
fn merged_history_undoes_whole_drag() {
    let clock = ManualClock::new();
    let timers = TimerQueue::with_clock(clock.clone());
    let bus = NotificationBus::new(timers.clone());
    let history = UndoHistory::new(
        HistoryConfig::default().with_merge_window(std::time::Duration::from_secs(10)),
    );
    bus.set_recorder(history.clone());
    let obj = light();

    for step in 1..=5 {
        let old = f64::from(step - 1);
        let new = f64::from(step);
        obj.set("intensity", new.into()).unwrap();
        bus.notify_change(&obj, ChangeOptions::new().property("intensity").values(old, new));
    }
    assert_eq!(history.undo_depth(), 1);

    history.undo().unwrap().unwrap();
    assert_eq!(obj.get("intensity"), Some(PropertyValue::Float(0.0)));
    history.redo().unwrap().unwrap();
    assert_eq!(obj.get("intensity"), Some(PropertyValue::Float(5.0)));
}

#[test]
fn undo_redo_round_trip_refreshes_panels() {
    let editor = Editor::start();
    let obj = light();
    let inspector = OwnerId::new();
    let viewport = OwnerId::new();
    let (inspector_count, inspector_refresh) = counter();
    let (viewport_count, viewport_refresh) = counter();
    editor.bus.register(inspector, &obj, inspector_refresh);
    editor.bus.register(viewport, &obj, viewport_refresh);

    obj.set("intensity", 3.0.into()).unwrap();
    editor.bus.notify_change(
        &obj,
        ChangeOptions::new()
            .property("intensity")
            .values(1.0, 3.0)
            .caller(inspector),
    );
    assert_eq!((inspector_count.get(), viewport_count.get()), (0, 1));
    assert_eq!(editor.history.undo_depth(), 1);

    editor.history.undo().unwrap().unwrap();
    assert_eq!(obj.get("intensity"), Some(PropertyValue::Float(1.0)));
    assert_eq!((inspector_count.get(), viewport_count.get()), (1, 2));

    editor.history.redo().unwrap().unwrap();
    assert_eq!(obj.get("intensity"), Some(PropertyValue::Float(3.0)));
    assert_eq!((inspector_count.get(), viewport_count.get()), (2, 3));

    // Replays never grew the history.
    assert_eq!(editor.history.undo_depth(), 1);
    assert_eq!(editor.history.redo_depth(), 0);
}

#[test]
fn panel_refresh_may_notify_again() {
    let editor = Editor::start();
    let obj = light();
    let derived = light();
    let (derived_count, derived_refresh) = counter();
    editor.bus.register(OwnerId::new(), &derived, derived_refresh);

    // A panel that propagates changes of `obj` to `derived`.
    let bus = editor.bus.downgrade();
    let derived_handle = derived.clone();
    editor.bus.register(OwnerId::new(), &obj, move || {
        if let Some(bus) = bus.upgrade() {
            bus.notify_change(&derived_handle, ChangeOptions::new());
        }
    });

    editor.bus.notify_change(&obj, ChangeOptions::new());
    assert_eq!(derived_count.get(), 1);
}

#[test]
fn selection_following_panel() {
    let editor = Editor::start();
    let first = light();
    let second = light();
    let selection = Rc::new(RefCell::new(Some(first.clone())));
    let sel = Rc::clone(&selection);
    let (count, refresh) = counter();
    editor
        .bus
        .register(OwnerId::new(), Target::resolver(move || sel.borrow().clone()), refresh);

    editor.bus.notify_change(&second, ChangeOptions::new());
    assert_eq!(count.get(), 0);

    *selection.borrow_mut() = Some(second.clone());
    editor.bus.notify_change(&second, ChangeOptions::new());
    assert_eq!(count.get(), 1);

    *selection.borrow_mut() = None;
    editor.bus.notify_change(&second, ChangeOptions::new());
    assert_eq!(count.get(), 1);
}

#[test]
fn typed_objects_through_from_shared() {
    use inspkit_runtime::{Inspectable, PropertyError};

    #[derive(Debug, Default)]
    struct Camera {
        fov: f64,
    }

    impl Inspectable for Camera {
        fn type_name(&self) -> &str {
            "Camera"
        }

        fn property_names(&self) -> Vec<String> {
            vec!["fov".to_string()]
        }

        fn get_property(&self, name: &str) -> Option<PropertyValue> {
            (name == "fov").then(|| PropertyValue::Float(self.fov))
        }

        fn set_property(&mut self, name: &str, value: PropertyValue) -> Result<(), PropertyError> {
            match (name, value.as_float()) {
                ("fov", Some(fov)) => {
                    self.fov = fov;
                    Ok(())
                }
                ("fov", None) => Err(PropertyError::TypeMismatch {
                    property: name.to_string(),
                    expected: "float",
                    found: value.kind(),
                }),
                _ => Err(PropertyError::UnknownProperty {
                    type_name: "Camera".to_string(),
                    property: name.to_string(),
                }),
            }
        }
    }

    let editor = Editor::start();
    let camera = Rc::new(RefCell::new(Camera { fov: 0.8 }));
    let handle = ObjectHandle::from_shared(Rc::clone(&camera));

    camera.borrow_mut().fov = 1.2;
    editor
        .bus
        .notify_change(&handle, ChangeOptions::new().property("fov").values(0.8, 1.2));

    editor.history.undo().unwrap().unwrap();
    assert!((camera.borrow().fov - 0.8).abs() < f64::EPSILON);
    assert_eq!(
        editor.history.next_redo_description().as_deref(),
        Some("Change Camera.fov")
    );
}
