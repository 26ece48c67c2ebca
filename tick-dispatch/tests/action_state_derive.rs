//! Tests for #[derive(ActionState)] macro

#![allow(dead_code)]

use std::marker::PhantomData;

use tick_dispatch::testing::tick;
use tick_dispatch::{share, Action, ActionCore, ActionState};

#[test]
fn test_core_field_by_name() {
    #[derive(ActionState)]
    struct Blink {
        core: ActionCore,
        count: u32,
    }

    impl Action for Blink {
        fn on_update(&mut self, _dt: f32) {
            self.count += 1;
        }
    }

    let mut blink = Blink {
        core: ActionCore::new(Blink::ACTION_NAME),
        count: 0,
    }
    .with_id(3);
    blink.core_mut().set_name("Blinker");

    assert_eq!(Blink::ACTION_NAME, "Blink");
    assert_eq!(blink.id(), 3);
    assert_eq!(blink.name(), "Blinker");
}

#[test]
fn test_marked_core_field_and_custom_name() {
    #[derive(ActionState)]
    #[action(name = "FadeIn")]
    struct Fade {
        #[action(core)]
        state: ActionCore,
        alpha: f32,
    }

    impl Action for Fade {
        fn on_start(&mut self) {
            self.set_duration(0.5);
        }

        fn on_update(&mut self, dt: f32) {
            self.alpha = (self.alpha + dt * 2.0).min(1.0);
        }
    }

    let fade = share(Fade {
        state: ActionCore::new(Fade::ACTION_NAME),
        alpha: 0.0,
    });
    fade.borrow_mut().run_start();
    tick(&fade, 0.25, 3);

    assert_eq!(fade.borrow().name(), "FadeIn");
    assert_eq!(fade.borrow().alpha, 0.5);
    assert!(fade.borrow().is_all_done());
}

#[test]
fn test_generic_action() {
    #[derive(ActionState)]
    struct Hold<T: 'static> {
        core: ActionCore,
        value: Option<T>,
        _marker: PhantomData<T>,
    }

    impl<T: 'static> Action for Hold<T> {
        fn on_start(&mut self) {
            self.set_manual();
        }
    }

    let hold = share(Hold::<String> {
        core: ActionCore::new(Hold::<String>::ACTION_NAME),
        value: Some("kept".to_string()),
        _marker: PhantomData,
    });
    hold.borrow_mut().run_start();
    tick(&hold, 10.0, 5);
    assert!(!hold.borrow().is_self_done());

    hold.borrow_mut().mark_as_done();
    assert!(hold.borrow().is_all_done());
    assert_eq!(hold.borrow().value.as_deref(), Some("kept"));
}
