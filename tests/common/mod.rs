//! Scripted in-memory backend for driving the controller without a network.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::Notify;

use scenario_wizard::api::{ApiReply, Method, ScenarioClient, Transport};
use scenario_wizard::config::{FormVariant, WizardConfig};
use scenario_wizard::error::AppError;
use scenario_wizard::wizard::WizardController;

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
enum Scripted {
    Reply(ApiReply),
    Fail(String),
}

/// Answers requests from per-route scripts. The last scripted answer for a
/// route repeats; unscripted routes answer 404.
#[derive(Default)]
pub struct FakeBackend {
    routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, method: Method, path: &str, answer: Scripted) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(answer);
    }

    pub fn reply(&self, method: Method, path: &str, status: u16, body: Value) {
        self.push(method, path, Scripted::Reply(ApiReply::new(status, body)));
    }

    pub fn fail(&self, method: Method, path: &str, error: &str) {
        self.push(method, path, Scripted::Fail(error.to_string()));
    }

    /// Requests to `path` wait until the returned gate is notified.
    pub fn hold(&self, path: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(path.to_string(), gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.calls().iter().filter(|c| c.path == path).count()
    }

    /// Poll until `pred` holds for the recorded calls, or panic after a second.
    pub async fn wait_for(&self, pred: impl Fn(&[Call]) -> bool) {
        for _ in 0..200 {
            if pred(&self.calls()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached; calls: {:?}", self.paths());
    }
}

#[async_trait::async_trait]
impl Transport for FakeBackend {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiReply, AppError> {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            body,
        });

        let gate = self.gates.lock().unwrap().get(path).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let answer = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(&(method, path.to_string())) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match answer {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Fail(msg)) => Err(AppError::Network(msg)),
            None => Ok(ApiReply::new(404, json!({ "detail": "Not Found" }))),
        }
    }
}

pub fn config(variant: FormVariant) -> WizardConfig {
    WizardConfig {
        variant,
        default_tables: ["A".to_string(), "B".to_string(), "C".to_string()],
        ..Default::default()
    }
}

pub fn controller(backend: &Arc<FakeBackend>, variant: FormVariant) -> WizardController {
    let client = ScenarioClient::new(backend.clone());
    WizardController::new(client, &config(variant))
}

pub fn scenario_json(id: &str, tables: [&str; 3]) -> Value {
    json!({
        "scenario_id": id,
        "created_at": "2025-06-01T12:30:00",
        "scenario_description": "summer peak",
        "inputs_kept": true,
        "param1": 24.0,
        "param2": 1.0,
        "input1": tables[0],
        "input2": tables[1],
        "input3": tables[2],
        "inputComments": json!({
            "input1": { "table": tables[0], "comment": "hist" },
            "input2": { "table": tables[1], "comment": "" },
            "input3": { "table": tables[2], "comment": "" },
        }).to_string(),
    })
}

pub fn summary_json(rows: i64) -> Value {
    json!({
        "row_count": rows,
        "columns": [{ "name": "load_mw", "type": "double" }],
        "stats": { "load_mw": { "min": 1.0, "max": 9.0, "avg": 5.0 } },
        "preview": [{ "load_mw": 4.2 }],
    })
}
