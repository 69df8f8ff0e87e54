//! Scripted collaborators shared by the unit tests.

use crate::api::error::ApiError;
use crate::api::{ApiResponse, RetrievalApi};
use crate::pipeline::convergence::BatchProcessor;
use crate::publish::{EventPublisher, PublishError};
use crate::quota::FixedSpacingGovernor;
use crate::retrieval::gate::RequestGate;
use crate::retrieval::{RetryPolicy, Retriever};
use crate::types::command::CommandId;
use crate::types::station::StationId;
use crate::types::window::RetrievalWindow;
use async_trait::async_trait;
use chrono::{NaiveTime, TimeZone, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One canned answer of the scripted API.
#[derive(Debug, Clone)]
pub enum Scripted {
    Status(u16, String),
    Timeout,
}

impl Scripted {
    pub fn status(status: u16, body: &str) -> Self {
        Scripted::Status(status, body.to_string())
    }
}

/// A request the scripted API received, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(String),
    Fetch(String),
}

/// Answers each station/command from its own script. The last answer repeats once
/// the script runs out; unscripted ids get a 404.
#[derive(Default)]
pub struct ScriptedApi {
    creates: Mutex<HashMap<String, Vec<Scripted>>>,
    fetches: Mutex<HashMap<String, Vec<Scripted>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_create(self, station: &str, script: Vec<Scripted>) -> Self {
        self.creates
            .lock()
            .unwrap()
            .insert(station.to_string(), script);
        self
    }

    pub fn on_fetch(self, command: &str, script: Vec<Scripted>) -> Self {
        self.fetches
            .lock()
            .unwrap()
            .insert(command.to_string(), script);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn next(scripts: &Mutex<HashMap<String, Vec<Scripted>>>, id: &str) -> Scripted {
        let mut scripts = scripts.lock().unwrap();
        match scripts.get_mut(id) {
            Some(script) if script.len() > 1 => script.remove(0),
            Some(script) if !script.is_empty() => script[0].clone(),
            _ => Scripted::status(404, "unknown"),
        }
    }

    fn answer(scripted: Scripted, url: String) -> Result<ApiResponse, ApiError> {
        match scripted {
            Scripted::Status(status, body) => Ok(ApiResponse::new(status, body)),
            Scripted::Timeout => Err(ApiError::Timeout(url)),
        }
    }
}

#[async_trait]
impl RetrievalApi for ScriptedApi {
    async fn create_command(
        &self,
        station: &StationId,
        _window: &RetrievalWindow,
    ) -> Result<ApiResponse, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Create(station.to_string()));
        let scripted = Self::next(&self.creates, station.as_str());
        Self::answer(scripted, format!("commande-station/{}", station))
    }

    async fn fetch_file(&self, command: &CommandId) -> Result<ApiResponse, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Fetch(command.to_string()));
        let scripted = Self::next(&self.fetches, command.as_str());
        Self::answer(scripted, format!("commande/fichier/{}", command))
    }
}

/// A 202 carrying `command` as the accepted command id.
pub fn accepted(command: &str) -> Scripted {
    Scripted::Status(
        202,
        format!(
            r#"{{"elaboreProduitAvecDemandeResponse":{{"return":"{}"}}}}"#,
            command
        ),
    )
}

/// A 201 with an hourly file of `rows` rows, T of row `i` being `i,5`.
pub fn csv_file(rows: usize) -> Scripted {
    let mut body = String::from("POSTE;DATE;T\n");
    for i in 0..rows {
        body.push_str(&format!("20004002;2024030100{:02};{},5\n", i % 24, i));
    }
    Scripted::Status(201, body)
}

/// Full-day window for a cycle run on 2024-03-02 at 12:30 UTC.
pub fn window() -> RetrievalWindow {
    let now = Utc.with_ymd_and_hms(2024, 3, 2, 12, 30, 0).unwrap();
    RetrievalWindow::for_cycle(now, NaiveTime::from_hms_opt(11, 30, 0).unwrap())
}

/// A retriever with no request spacing, so paused-clock tests only see the
/// penalty and backoff waits.
pub fn retriever_for(api: ScriptedApi) -> (Retriever, Arc<ScriptedApi>) {
    let api = Arc::new(api);
    let governor = Arc::new(FixedSpacingGovernor::new(
        Duration::ZERO,
        Duration::from_secs(90),
    ));
    let gate = Arc::new(RequestGate::new(governor, 1));
    let retriever = Retriever::new(api.clone(), gate, RetryPolicy::default(), b';');
    (retriever, api)
}

pub fn processor_for(
    api: ScriptedApi,
    publisher: Arc<RecordingPublisher>,
) -> (BatchProcessor, Arc<ScriptedApi>) {
    let (retriever, api) = retriever_for(api);
    let processor = BatchProcessor::new(
        Arc::new(retriever),
        publisher,
        "weather-verified",
        5,
        Duration::from_secs(60),
    );
    (processor, api)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEvent {
    pub topic: String,
    pub key: Option<String>,
    pub payload: Value,
}

/// Keeps every published event in memory, or rejects them all when failing.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<PublishedEvent>>,
    failing: bool,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<PublishedEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: Value,
    ) -> Result<(), PublishError> {
        if self.failing {
            return Err(PublishError::Write(
                topic.to_string(),
                std::io::Error::other("broker unavailable"),
            ));
        }
        self.events.lock().unwrap().push(PublishedEvent {
            topic: topic.to_string(),
            key: key.map(str::to_string),
            payload,
        });
        Ok(())
    }
}
