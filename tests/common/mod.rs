//! Resources and handlers shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::thread;

use serde::{Deserialize, Serialize};
use serde_json::json;

use resource_registry::{
    LoadRequest, Resource, ResourceCategory, ResourceEvent, ResourceHandler, ResourceStream,
    ResourceValue, Signal, Subject, Subscription,
};

/// A file by path. Served as its path string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResource {
    pub path: String,
}

impl FileResource {
    pub fn new(path: &str) -> Self {
        Self { path: path.to_string() }
    }
}

impl Resource for FileResource {
    type Extra = ();
    type Response = String;

    fn category() -> ResourceCategory {
        ResourceCategory::File
    }
}

/// File handler backed by a current-value subject.
///
/// Every `load` returns a view of the same subject, so a later `send` reaches
/// every stream still subscribed.
pub struct FileHandler {
    pub subject: Subject<String>,
}

impl FileHandler {
    pub fn new(initial: &str) -> Arc<Self> {
        Arc::new(Self {
            subject: Subject::with_value(initial.to_string()),
        })
    }
}

impl ResourceHandler for FileHandler {
    fn categories(&self) -> Vec<ResourceCategory> {
        vec![ResourceCategory::File]
    }

    fn load(&self, _request: LoadRequest) -> ResourceStream<ResourceValue> {
        self.subject.stream().erase()
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// Fetch options passed as extra data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub status: u16,
}

/// A web page by URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebResource {
    pub url: String,
}

impl Resource for WebResource {
    type Extra = FetchOptions;
    type Response = Page;

    fn category() -> ResourceCategory {
        ResourceCategory::Web
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub status: u16,
}

/// Web handler that answers with JSON from a background thread.
#[derive(Debug, Default)]
pub struct WebHandler;

impl ResourceHandler for WebHandler {
    fn categories(&self) -> Vec<ResourceCategory> {
        vec![ResourceCategory::Web]
    }

    fn load(&self, request: LoadRequest) -> ResourceStream<ResourceValue> {
        let target = match request.decode::<WebResource>() {
            Ok(target) => target,
            Err(err) => return ResourceStream::fail(err),
        };
        let status = request.extra::<FetchOptions>().map_or(200, |options| options.status);
        let body = json!({ "url": target.url, "status": status });

        ResourceStream::from_fn(move |mut subscriber| {
            let body = body.clone();
            thread::spawn(move || {
                subscriber.value(ResourceValue::Json(body));
                subscriber.finish();
            });
            Subscription::new(|| {})
        })
    }

    fn name(&self) -> &str {
        "web"
    }
}

/// Collects every signal of a subscription.
pub fn collect<T: Send + 'static>(stream: &ResourceStream<T>) -> (Arc<Mutex<Vec<Signal<T>>>>, Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = stream.subscribe(move |signal| sink.lock().unwrap().push(signal));
    (seen, subscription)
}

/// Observer recording every event it receives.
#[derive(Default)]
pub struct EventLog {
    pub events: Mutex<Vec<ResourceEvent>>,
}

impl EventLog {
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(ResourceEvent::kind).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

impl resource_registry::ResourceObserver for EventLog {
    fn on_resource_event(&self, event: &ResourceEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
