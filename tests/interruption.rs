mod common;

use std::sync::Arc;
use std::thread;

use glctx::context::ContextState;
use glctx::interruption::AppEvent;
use glctx::{Driver, ErrorKind};

use common::{init_logger, window, MockGl, FOREIGN_CONTEXT};

fn driver() -> Driver<MockGl> {
    init_logger();
    Driver::new(MockGl::new())
}

fn suspend(driver: &Driver<MockGl>) {
    driver.handle_app_event(AppEvent::WillEnterBackground);
    driver.handle_app_event(AppEvent::DidEnterBackground);
    driver.api().invalidate_all();
}

fn resume(driver: &Driver<MockGl>) {
    driver.handle_app_event(AppEvent::WillEnterForeground);
    driver.handle_app_event(AppEvent::DidEnterForeground);
}

#[test]
fn rendering_resumes_after_restore() {
    let driver = driver();
    let w = window(1);

    let c1 = driver.create_context(&w).unwrap();
    driver.make_current(&w, Some(&c1)).unwrap();
    driver.swap_window(&w).unwrap();

    suspend(&driver);
    assert_eq!(driver.context_state(&c1), Some(ContextState::Suspended));
    assert_eq!(driver.api().native_current(), None);
    // The logical binding survives the interruption.
    assert_eq!(driver.current_context(), Some(c1));

    resume(&driver);
    assert_eq!(driver.context_state(&c1), Some(ContextState::Active));

    driver.restore_current_context().unwrap();
    assert_eq!(driver.current_context(), Some(c1));
    assert!(driver.api().native_current().is_some());
    driver.swap_window(&w).unwrap();
    assert_eq!(driver.api().swaps().len(), 2);
}

#[test]
fn restore_without_interruption_does_nothing() {
    let driver = driver();
    let w = window(1);

    let c1 = driver.create_context(&w).unwrap();
    let calls = driver.api().make_current_calls();

    driver.restore_current_context().unwrap();
    driver.restore_current_context().unwrap();
    assert_eq!(driver.api().make_current_calls(), calls);
    assert_eq!(driver.current_context(), Some(c1));
}

#[test]
fn restore_after_resume_binds_once() {
    let driver = driver();
    let w = window(1);

    driver.create_context(&w).unwrap();
    suspend(&driver);
    resume(&driver);

    let calls = driver.api().make_current_calls();
    driver.restore_current_context().unwrap();
    driver.restore_current_context().unwrap();
    assert_eq!(driver.api().make_current_calls(), calls + 1);
}

#[test]
fn restore_without_binding_is_a_noop() {
    let driver = driver();

    driver.restore_current_context().unwrap();
    assert_eq!(driver.api().make_current_calls(), 0);

    let w = window(1);
    driver.create_context(&w).unwrap();
    driver.make_current(&w, None).unwrap();
    let calls = driver.api().make_current_calls();

    suspend(&driver);
    resume(&driver);
    driver.restore_current_context().unwrap();
    assert_eq!(driver.api().make_current_calls(), calls);
    assert_eq!(driver.current_context(), None);
}

#[test]
fn restore_keeps_a_context_whose_window_is_gone() {
    let driver = driver();
    let w = window(1);

    let c1 = driver.create_context(&w).unwrap();
    driver.window_destroyed(w.id());
    suspend(&driver);
    resume(&driver);

    let calls = driver.api().make_current_calls();
    driver.restore_current_context().unwrap();
    assert_eq!(driver.api().make_current_calls(), calls);
    assert_eq!(driver.context_state(&c1), Some(ContextState::Active));
    assert_eq!(driver.swap_window(&w).unwrap_err().error_kind(), ErrorKind::Swap);

    let w2 = window(2);
    driver.make_current(&w2, Some(&c1)).unwrap();
    driver.swap_window(&w2).unwrap();
}

#[test]
fn restore_waits_for_the_foreground() {
    let driver = driver();
    let w = window(1);

    driver.create_context(&w).unwrap();
    suspend(&driver);
    driver.handle_app_event(AppEvent::WillEnterForeground);
    assert!(driver.is_suspended());

    let calls = driver.api().make_current_calls();
    driver.restore_current_context().unwrap();
    assert_eq!(driver.api().make_current_calls(), calls);
    assert_eq!(driver.api().native_current(), None);

    driver.handle_app_event(AppEvent::DidEnterForeground);
    driver.restore_current_context().unwrap();
    assert!(driver.api().native_current().is_some());
}

#[test]
fn failed_restore_loses_the_context() {
    let driver = driver();
    let w = window(1);

    let c1 = driver.create_context(&w).unwrap();
    suspend(&driver);
    resume(&driver);

    driver.api().fail_make_current(1);
    let err = driver.restore_current_context().unwrap_err();
    assert_eq!(err.error_kind(), ErrorKind::MakeCurrent);
    assert_eq!(err.raw_os_message(), Some("EGL_CONTEXT_LOST"));
    assert_eq!(driver.context_state(&c1), Some(ContextState::Lost));

    // Lost until it's created again.
    let err = driver.restore_current_context().unwrap_err();
    assert_eq!(err.error_kind(), ErrorKind::MakeCurrent);
    let err = driver.make_current(&w, Some(&c1)).unwrap_err();
    assert_eq!(err.error_kind(), ErrorKind::MakeCurrent);
    let err = driver.swap_window(&w).unwrap_err();
    assert_eq!(err.error_kind(), ErrorKind::Swap);
    assert!(driver.api().swaps().is_empty());

    // Further interruptions don't bring it back.
    suspend(&driver);
    resume(&driver);
    assert_eq!(driver.context_state(&c1), Some(ContextState::Lost));

    driver.delete_context(c1).unwrap();
    let c2 = driver.create_context(&w).unwrap();
    assert_eq!(driver.context_state(&c2), Some(ContextState::Active));
    driver.swap_window(&w).unwrap();
}

#[test]
fn context_replaced_by_other_code_is_restored() {
    let driver = driver();
    let w = window(1);

    driver.create_context(&w).unwrap();
    let ours = driver.api().native_current();

    driver.api().clobber_current();
    assert_eq!(driver.api().native_current(), Some(FOREIGN_CONTEXT));

    driver.restore_current_context().unwrap();
    assert_eq!(driver.api().native_current(), ours);
}

#[test]
fn contexts_created_in_the_background_start_suspended() {
    let driver = driver();
    let w = window(1);

    driver.handle_app_event(AppEvent::DidEnterBackground);
    let c1 = driver.create_context(&w).unwrap();
    assert_eq!(driver.context_state(&c1), Some(ContextState::Suspended));

    resume(&driver);
    assert_eq!(driver.context_state(&c1), Some(ContextState::Active));
}

#[test]
fn presenting_while_suspended_is_left_to_the_caller() {
    let driver = driver();
    let w = window(1);

    driver.create_context(&w).unwrap();
    driver.handle_app_event(AppEvent::DidEnterBackground);
    driver.swap_window(&w).unwrap();
    assert_eq!(driver.api().swaps().len(), 1);
}

#[test]
fn every_thread_restores_its_own_context() {
    init_logger();
    let driver = Arc::new(Driver::new(MockGl::new()));
    let c1 = driver.create_context(&window(1)).unwrap();

    let (created_tx, created_rx) = std::sync::mpsc::channel();
    let (resumed_tx, resumed_rx) = std::sync::mpsc::channel();

    let other = Arc::clone(&driver);
    let renderer = thread::spawn(move || {
        let c2 = other.create_context(&window(2)).unwrap();
        created_tx.send(c2).unwrap();
        resumed_rx.recv().unwrap();

        assert_eq!(other.api().native_current(), None);
        other.restore_current_context().unwrap();
        assert!(other.api().native_current().is_some());
        assert_eq!(other.current_context(), Some(c2));
        other.swap_window(&window(2)).unwrap();
    });

    let c2 = created_rx.recv().unwrap();
    suspend(&driver);
    assert_eq!(driver.context_state(&c2), Some(ContextState::Suspended));
    resume(&driver);
    resumed_tx.send(()).unwrap();

    driver.restore_current_context().unwrap();
    assert_eq!(driver.current_context(), Some(c1));
    renderer.join().unwrap();
}
