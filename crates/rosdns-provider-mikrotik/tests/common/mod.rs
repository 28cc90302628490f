//! Shared test utilities for the MikroTik provider contract tests
//!
//! `FakeRouter` is a stateful wiremock responder that behaves like the
//! RouterOS static DNS table, including the part that matters most: `.id`
//! values are positional and get renumbered after every create or delete.

#![allow(dead_code)]

use rosdns_core::RecordDefaults;
use rosdns_provider_mikrotik::{MikrotikProvider, Transport};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{any, basic_auth, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const USER: &str = "admin";
pub const PASS: &str = "router-secret";
pub const TAG: &str = "Managed By ExternalDNS";

const STATIC_PREFIX: &str = "/rest/ip/dns/static";

#[derive(Debug, Default)]
struct State {
    records: Vec<Value>,
    log: Vec<String>,
    puts: usize,
    deletes: usize,
    gets: usize,
    fail_put_at: Option<usize>,
    fail_delete_at: Option<usize>,
    fail_get_at: Option<usize>,
    vanish_after_delete: Option<(usize, String)>,
}

impl State {
    fn renumber(&mut self) {
        for (i, record) in self.records.iter_mut().enumerate() {
            record[".id"] = json!(format!("*{}", i + 1));
        }
    }
}

/// In-memory RouterOS static DNS table
#[derive(Clone, Default)]
pub struct FakeRouter {
    state: Arc<Mutex<State>>,
}

impl FakeRouter {
    /// Insert raw entries as if someone had created them on the router
    pub fn seed(&self, records: impl IntoIterator<Item = Value>) {
        let mut state = self.state.lock().unwrap();
        state.records.extend(records);
        state.renumber();
    }

    /// Current table contents
    pub fn records(&self) -> Vec<Value> {
        self.state.lock().unwrap().records.clone()
    }

    /// Requests against the static table, e.g. `GET`, `PUT`, `DELETE *1`
    pub fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    /// Make the n-th PUT (1-based) fail with a 500
    pub fn fail_put_at(&self, n: usize) {
        self.state.lock().unwrap().fail_put_at = Some(n);
    }

    /// Make the n-th DELETE (1-based) fail with a 500
    pub fn fail_delete_at(&self, n: usize) {
        self.state.lock().unwrap().fail_delete_at = Some(n);
    }

    /// After the n-th successful DELETE, drop the entry with `address` as
    /// if another client had deleted it
    pub fn vanish_after_delete(&self, n: usize, address: &str) {
        self.state.lock().unwrap().vanish_after_delete = Some((n, address.to_string()));
    }

    /// Make the n-th GET of the static table (1-based) fail with a 500
    pub fn fail_get_at(&self, n: usize) {
        self.state.lock().unwrap().fail_get_at = Some(n);
    }

    fn list(state: &mut State, request: &Request) -> ResponseTemplate {
        state.gets += 1;
        state.log.push("GET".to_string());
        if state.fail_get_at == Some(state.gets) {
            return ResponseTemplate::new(500).set_body_string("failure: simulated");
        }

        let mut types: Option<Vec<String>> = None;
        let mut comment: Option<String> = None;
        let mut name: Option<String> = None;
        for (key, value) in request.url.query_pairs() {
            match key.as_ref() {
                "type" => types = Some(value.split(',').map(str::to_string).collect()),
                "comment" => comment = Some(value.into_owned()),
                "name" => name = Some(value.into_owned()),
                _ => {}
            }
        }

        let listed: Vec<Value> = state
            .records
            .iter()
            .filter(|r| {
                let kind = r["type"].as_str().unwrap_or("A");
                types.as_ref().is_none_or(|t| t.iter().any(|k| k == kind))
            })
            .filter(|r| {
                comment
                    .as_deref()
                    .is_none_or(|c| r["comment"].as_str().unwrap_or("") == c)
            })
            .filter(|r| name.as_deref().is_none_or(|n| r["name"].as_str() == Some(n)))
            .cloned()
            .collect();

        ResponseTemplate::new(200).set_body_json(listed)
    }

    fn create(state: &mut State, request: &Request) -> ResponseTemplate {
        state.puts += 1;
        state.log.push("PUT".to_string());
        if state.fail_put_at == Some(state.puts) {
            return ResponseTemplate::new(500).set_body_string("failure: simulated");
        }

        let mut record: Value = match serde_json::from_slice(&request.body) {
            Ok(value @ Value::Object(_)) => value,
            _ => {
                return ResponseTemplate::new(400)
                    .set_body_json(json!({"error": 400, "message": "Bad Request"}));
            }
        };
        record[".id"] = json!("");
        state.records.push(record);
        state.renumber();

        let created = state.records.last().cloned().unwrap_or_default();
        ResponseTemplate::new(201).set_body_json(created)
    }

    fn remove(state: &mut State, id: &str) -> ResponseTemplate {
        state.deletes += 1;
        state.log.push(format!("DELETE {}", id));
        if state.fail_delete_at == Some(state.deletes) {
            return ResponseTemplate::new(500).set_body_string("failure: simulated");
        }

        match state.records.iter().position(|r| r[".id"] == id) {
            Some(index) => {
                state.records.remove(index);
                if let Some((n, address)) = state.vanish_after_delete.clone() {
                    if n == state.deletes {
                        state.records.retain(|r| r["address"] != address.as_str());
                    }
                }
                state.renumber();
                ResponseTemplate::new(204)
            }
            None => ResponseTemplate::new(404).set_body_json(json!({
                "error": 404,
                "message": "Not Found",
                "detail": "no such item"
            })),
        }
    }
}

impl Respond for FakeRouter {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut state = self.state.lock().unwrap();
        let path = request.url.path().replace("%2A", "*");
        let method = request.method.as_str();

        if path == "/rest/system/resource" && method == "GET" {
            return ResponseTemplate::new(200).set_body_json(json!({
                "architecture-name": "arm64",
                "board-name": "RB5009UG+S+",
                "platform": "MikroTik",
                "version": "7.16 (stable)",
                "uptime": "4d19h9m34s",
                "cpu-count": "4"
            }));
        }

        match (method, path.strip_prefix(STATIC_PREFIX)) {
            ("GET", Some("")) => Self::list(&mut state, request),
            ("PUT", Some("")) => Self::create(&mut state, request),
            ("DELETE", Some(rest)) if rest.starts_with('/') => Self::remove(&mut state, &rest[1..]),
            _ => ResponseTemplate::new(400)
                .set_body_json(json!({"error": 400, "message": "Bad Request"})),
        }
    }
}

/// Start a mock server backed by a fresh `FakeRouter`
///
/// Requests without the expected basic-auth credentials get a 401.
pub async fn start_router() -> (MockServer, FakeRouter) {
    let server = MockServer::start().await;
    let router = FakeRouter::default();

    Mock::given(path_regex(r"^/rest/"))
        .and(basic_auth(USER, PASS))
        .respond_with(router.clone())
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": 401,
            "message": "Unauthorized"
        })))
        .with_priority(10)
        .mount(&server)
        .await;

    (server, router)
}

/// Provider pointed at `server` with the shared credentials and tag
pub fn provider_for(server: &MockServer) -> MikrotikProvider {
    provider_with(server, PASS, TAG)
}

/// Provider with explicit password and ownership tag
pub fn provider_with(server: &MockServer, password: &str, tag: &str) -> MikrotikProvider {
    let transport = Transport::new(server.uri(), USER, password, false, Duration::from_secs(5))
        .expect("transport");
    MikrotikProvider::new(transport, RecordDefaults::new(tag)).expect("provider")
}

/// Owned A entry as RouterOS would store it
pub fn owned_a(name: &str, address: &str) -> Value {
    json!({"name": name, "type": "A", "address": address, "ttl": "1h", "comment": TAG})
}

/// A entry carrying someone else's comment
pub fn foreign_a(name: &str, address: &str, comment: &str) -> Value {
    json!({"name": name, "type": "A", "address": address, "ttl": "1h", "comment": comment})
}

/// Sorted `address` values of the A entries named `name`
pub fn addresses(router: &FakeRouter, name: &str) -> Vec<String> {
    let mut found: Vec<String> = router
        .records()
        .iter()
        .filter(|r| r["name"] == name)
        .filter_map(|r| r["address"].as_str().map(str::to_string))
        .collect();
    found.sort();
    found
}
