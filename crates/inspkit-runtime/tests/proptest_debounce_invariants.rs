//! Property-based invariant tests for the notification bus.
//!
//! 1. A burst of N notifications whose gaps are all shorter than the debounce
//!    delay W produces exactly one callback, no earlier than W after the last.
//! 2. Immediate notifications invoke each matching callback exactly once.
//! 3. The caller's registrations never fire, whatever the registration mix.
//! 4. After `unregister(owner)`, none of the owner's callbacks ever fire.
//! 5. At most one timer is pending per registration.

use std::cell::Cell;
use std::rc::Rc;

use inspkit_runtime::{
    ChangeOptions, Clock, ManualClock, NotificationBus, ObjectHandle, OwnerId, PropertyBag, TimerQueue,
};
use proptest::prelude::*;

fn setup() -> (NotificationBus, TimerQueue, ManualClock) {
    let clock = ManualClock::new();
    let timers = TimerQueue::with_clock(clock.clone());
    (NotificationBus::new(timers.clone()), timers, clock)
}

fn object() -> ObjectHandle {
    ObjectHandle::new(PropertyBag::new("Node").with("x", 0.0))
}

// ── Strategies ────────────────────────────────────────────────────────────

/// Debounce delay and a burst of gaps strictly shorter than it.
fn burst_strategy() -> impl Strategy<Value = (u64, Vec<u64>)> {
    (2u64..=500).prop_flat_map(|wait| {
        (
            Just(wait),
            proptest::collection::vec(0u64..wait, 1..=40),
        )
    })
}

/// Owner index (0..owners) for each registration.
fn registrations_strategy() -> impl Strategy<Value = (usize, Vec<usize>)> {
    (1usize..=6).prop_flat_map(|owners| {
        (
            Just(owners),
            proptest::collection::vec(0..owners, 1..=24),
        )
    })
}

proptest! {
    #[test]
    fn burst_fires_once_after_quiet_period((wait, gaps) in burst_strategy()) {
        let (bus, timers, clock) = setup();
        let obj = object();
        let fired_at = Rc::new(Cell::new(None));
        let count = Rc::new(Cell::new(0u32));
        {
            let fired_at = Rc::clone(&fired_at);
            let count = Rc::clone(&count);
            let clock = clock.clone();
            bus.register(OwnerId::new(), &obj, move || {
                count.set(count.get() + 1);
                fired_at.set(Some(clock.now()));
            });
        }

        let mut last_notify = clock.now();
        for gap in &gaps {
            bus.notify_change(&obj, ChangeOptions::new().wait_ms(wait));
            last_notify = clock.now();
            prop_assert!(bus.pending_timer_count() <= 1);
            clock.advance_ms(*gap);
            timers.run_due();
            prop_assert_eq!(count.get(), 0);
        }

        // Step through the remaining quiet period one millisecond at a time.
        for _ in 0..=wait {
            timers.run_due();
            clock.advance_ms(1);
        }
        timers.run_due();

        prop_assert_eq!(count.get(), 1);
        let fired = fired_at.get().expect("callback fired");
        prop_assert!(fired.duration_since(last_notify).as_millis() >= u128::from(wait));
        prop_assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn immediate_notify_fires_each_match_once((owners, regs) in registrations_strategy()) {
        let (bus, _timers, _clock) = setup();
        let obj = object();
        let ids: Vec<OwnerId> = (0..owners).map(|_| OwnerId::new()).collect();
        let counts: Vec<Rc<Cell<u32>>> = regs.iter().map(|_| Rc::new(Cell::new(0))).collect();
        for (owner_idx, count) in regs.iter().zip(&counts) {
            let count = Rc::clone(count);
            bus.register(ids[*owner_idx], &obj, move || count.set(count.get() + 1));
        }

        let report = bus.notify_change(&obj, ChangeOptions::new());
        prop_assert_eq!(report.dispatched, regs.len());
        prop_assert!(counts.iter().all(|c| c.get() == 1));
    }

    #[test]
    fn caller_never_notified(
        (owners, regs) in registrations_strategy(),
        caller_pick in any::<prop::sample::Index>(),
    ) {
        let (bus, _timers, _clock) = setup();
        let obj = object();
        let ids: Vec<OwnerId> = (0..owners).map(|_| OwnerId::new()).collect();
        let caller_idx = caller_pick.index(owners);
        let counts: Vec<Rc<Cell<u32>>> = regs.iter().map(|_| Rc::new(Cell::new(0))).collect();
        for (owner_idx, count) in regs.iter().zip(&counts) {
            let count = Rc::clone(count);
            bus.register(ids[*owner_idx], &obj, move || count.set(count.get() + 1));
        }

        bus.notify_change(&obj, ChangeOptions::new().caller(ids[caller_idx]));
        for (owner_idx, count) in regs.iter().zip(&counts) {
            let expected = u32::from(*owner_idx != caller_idx);
            prop_assert_eq!(count.get(), expected);
        }
    }

    #[test]
    fn unregistered_owner_never_fires(
        (owners, regs) in registrations_strategy(),
        victim_pick in any::<prop::sample::Index>(),
        debounced in any::<bool>(),
    ) {
        let (bus, timers, clock) = setup();
        let obj = object();
        let ids: Vec<OwnerId> = (0..owners).map(|_| OwnerId::new()).collect();
        let victim_idx = victim_pick.index(owners);
        let counts: Vec<Rc<Cell<u32>>> = regs.iter().map(|_| Rc::new(Cell::new(0))).collect();
        for (owner_idx, count) in regs.iter().zip(&counts) {
            let count = Rc::clone(count);
            bus.register(ids[*owner_idx], &obj, move || count.set(count.get() + 1));
        }

        let options = || {
            if debounced {
                ChangeOptions::new().wait_ms(10)
            } else {
                ChangeOptions::new()
            }
        };

        // A pending timer from before the unregister must not fire either.
        bus.notify_change(&obj, options());
        let victim_regs = regs.iter().filter(|&&o| o == victim_idx).count();
        prop_assert_eq!(bus.unregister(ids[victim_idx]), victim_regs);
        prop_assert!(bus.registrations_of(ids[victim_idx]).is_empty());

        bus.notify_change(&obj, options());
        clock.advance_ms(10);
        timers.run_due();

        for (owner_idx, count) in regs.iter().zip(&counts) {
            if *owner_idx == victim_idx {
                let before_unregister = u32::from(!debounced);
                prop_assert_eq!(count.get(), before_unregister);
            } else {
                let expected = if debounced { 1 } else { 2 };
                prop_assert_eq!(count.get(), expected);
            }
        }
    }
}
