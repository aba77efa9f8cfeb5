//! Shared test transport

#![allow(dead_code)]

use pmoaudioaddict::{AudioAddictClient, HttpResponse, HttpTransport, UpstreamError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A request seen by the stub: URL and headers
#[derive(Debug, Clone)]
pub struct Recorded {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// Transport answering from a fixed route table and recording every request
#[derive(Clone, Default)]
pub struct StubTransport {
    routes: Rc<RefCell<HashMap<String, HttpResponse>>>,
    requests: Rc<RefCell<Vec<Recorded>>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: &str, response: HttpResponse) {
        self.routes.borrow_mut().insert(url.to_string(), response);
    }

    pub fn json(&self, url: &str, value: serde_json::Value) {
        self.route(url, HttpResponse::ok(value.to_string()));
    }

    /// Number of requests made to `url`
    pub fn count(&self, url: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    pub fn total(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn last(&self) -> Option<Recorded> {
        self.requests.borrow().last().cloned()
    }
}

impl HttpTransport for StubTransport {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, UpstreamError> {
        self.requests.borrow_mut().push(Recorded {
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });

        self.routes
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| UpstreamError::Transport(format!("no route for {url}")))
    }
}

/// Seeded client over `stub`, with `service` selected
pub fn client(stub: &StubTransport, service: &str) -> AudioAddictClient {
    let mut client = AudioAddictClient::builder()
        .transport(stub.clone())
        .seed(1234)
        .build()
        .unwrap();
    client.select_service(service).unwrap();
    client
}
