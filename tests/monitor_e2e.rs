mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use resource_registry::{
    FnHandler, MonitorConfig, RegistryConfig, ResourceCategory, ResourceEvent, ResourceHandler,
    ResourceMonitor, ResourceRegistry, ResourceStream, TracingObserver,
};

use common::EventLog;

fn handler(name: &str, category: &str) -> Arc<dyn ResourceHandler> {
    Arc::new(FnHandler::new(name, vec![ResourceCategory::custom(category)], |_| {
        ResourceStream::empty()
    }))
}

#[test]
fn observer_lifecycle_stops_after_dispose() {
    let registry = ResourceRegistry::new();
    let log = Arc::new(EventLog::default());

    let sub = registry.monitor().add_observer(&log);
    registry.register_dyn(handler("first", "a"));
    assert_eq!(log.len(), 1);

    sub.cancel();
    registry.register_dyn(handler("second", "b"));
    assert_eq!(log.len(), 1);
}

#[test]
fn dropping_subscription_detaches_observer() {
    let registry = ResourceRegistry::new();
    let log = Arc::new(EventLog::default());

    {
        let _sub = registry.monitor().add_observer(&log);
        registry.register_dyn(handler("first", "a"));
    }
    registry.register_dyn(handler("second", "b"));
    assert_eq!(log.kinds(), vec!["handler_added"]);
}

#[test]
fn dropped_observer_receives_nothing() {
    let registry = ResourceRegistry::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let observer = Arc::new(move |_: &ResourceEvent| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let _sub = registry.monitor().add_observer(&observer);
    drop(observer);
    registry.register_dyn(handler("first", "a"));

    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(registry.monitor().observer_count(), 0);
}

#[test]
fn observers_receive_events_in_attach_order() {
    let monitor = ResourceMonitor::new();
    let registry = ResourceRegistry::with_monitor(monitor.clone());
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));

    let first_sink = Arc::clone(&order);
    let first = Arc::new(move |_: &ResourceEvent| first_sink.lock().unwrap().push(1));
    let second_sink = Arc::clone(&order);
    let second = Arc::new(move |_: &ResourceEvent| second_sink.lock().unwrap().push(2));
    let _s1 = monitor.add_observer(&first);
    let _s2 = monitor.add_observer(&second);

    registry.register_dyn(handler("h", "a"));
    assert_eq!(*order.lock().unwrap(), vec![1, 2]);
}

#[test]
fn panicking_observer_does_not_break_registration() {
    let registry = ResourceRegistry::new();
    let bad = Arc::new(|_: &ResourceEvent| panic!("observer failure"));
    let log = Arc::new(EventLog::default());
    let _s1 = registry.monitor().add_observer(&bad);
    let _s2 = registry.monitor().add_observer(&log);

    registry.register_dyn(handler("h", "a"));

    assert!(registry.contains(&ResourceCategory::custom("a")));
    assert_eq!(log.kinds(), vec!["handler_added"]);
}

#[test]
fn registries_can_share_one_monitor() {
    let monitor = ResourceMonitor::with_config(MonitorConfig::default());
    let left = ResourceRegistry::with_parts(
        RegistryConfig {
            log_dispatch: true,
            ..RegistryConfig::default()
        },
        monitor.clone(),
    );
    let right = ResourceRegistry::with_monitor(monitor.clone());
    let log = Arc::new(EventLog::default());
    let _sub = monitor.add_observer(&log);

    left.register_dyn(handler("l", "a"));
    right.register_dyn(handler("r", "a"));

    // Separate tables: neither registration is a duplicate.
    assert_eq!(log.kinds(), vec!["handler_added", "handler_added"]);
}

#[test]
fn tracing_observer_accepts_every_event() {
    let registry = ResourceRegistry::new();
    let tracer = Arc::new(TracingObserver);
    let _sub = registry.monitor().add_observer(&tracer);

    registry.register_dyn(handler("first", "a"));
    registry.register_dyn(handler("second", "a"));
    registry.monitor().record(&ResourceEvent::HandlerNotFound {
        category: ResourceCategory::custom("b"),
    });

    assert_eq!(registry.monitor().observer_count(), 1);
}
