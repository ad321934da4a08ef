// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::traits::{TaskCompletion, TaskExecutor, TaskRequest};

/// An executor that runs nothing and reports every declared output at its
/// expected location.
#[derive(Debug, Default)]
pub struct StubExecutor {
    delay: Option<Duration>,
}

impl StubExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend every task takes `delay` to run
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay: Some(delay) }
    }
}

#[async_trait::async_trait]
impl TaskExecutor for StubExecutor {
    async fn execute(&self, request: TaskRequest) -> TaskCompletion {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        TaskCompletion::Succeeded {
            outputs: request.expected_outputs(),
        }
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// An executor that fails the named tasks and stubs the rest.
///
/// Names match either the qualified path (`daylight/simulate`) or the bare
/// task name (`simulate`).
#[derive(Debug, Default)]
pub struct FailingExecutor {
    failing: HashSet<String>,
}

impl FailingExecutor {
    pub fn new<I, S>(failing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            failing: failing.into_iter().map(Into::into).collect(),
        }
    }

    fn should_fail(&self, request: &TaskRequest) -> bool {
        self.failing.contains(&request.task.to_string())
            || request
                .task
                .name()
                .map(|name| self.failing.contains(name))
                .unwrap_or(false)
    }
}

#[async_trait::async_trait]
impl TaskExecutor for FailingExecutor {
    async fn execute(&self, request: TaskRequest) -> TaskCompletion {
        if self.should_fail(&request) {
            TaskCompletion::Failed {
                reason: "Simulated task failure".to_string(),
            }
        } else {
            TaskCompletion::Succeeded {
                outputs: request.expected_outputs(),
            }
        }
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// An executor that succeeds without reporting any outputs, for testing
/// routes whose producer did not deliver.
#[derive(Debug, Default)]
pub struct NoOutputExecutor;

#[async_trait::async_trait]
impl TaskExecutor for NoOutputExecutor {
    async fn execute(&self, _request: TaskRequest) -> TaskCompletion {
        TaskCompletion::Succeeded {
            outputs: Default::default(),
        }
    }

    fn name(&self) -> &'static str {
        "no_output"
    }
}

/// A stub executor that keeps every request it receives and tracks how
/// many ran at once.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    requests: Mutex<Vec<TaskRequest>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    delay: Option<Duration>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Requests in the order they reached the executor
    pub async fn requests(&self) -> Vec<TaskRequest> {
        self.requests.lock().await.clone()
    }

    /// Most tasks that were ever executing at the same time
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TaskExecutor for RecordingExecutor {
    async fn execute(&self, request: TaskRequest) -> TaskCompletion {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);

        self.requests.lock().await.push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        TaskCompletion::Succeeded {
            outputs: request.expected_outputs(),
        }
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputDescriptor, TemplateRef, ValueKind};
    use crate::engine::{ResolvedParameters, TaskPath};
    use std::path::PathBuf;

    fn request(path: TaskPath) -> TaskRequest {
        TaskRequest {
            task: path,
            template: TemplateRef::new("convert-epw"),
            work_dir: PathBuf::from("/run/convert"),
            parameters: ResolvedParameters::new(),
            outputs: vec![OutputDescriptor::new("wea", ValueKind::File).at("weather.wea")],
        }
    }

    #[tokio::test]
    async fn test_stub_reports_expected_outputs() {
        let completion = StubExecutor::new().execute(request(TaskPath::top("convert"))).await;
        match completion {
            TaskCompletion::Succeeded { outputs } => {
                assert_eq!(outputs["wea"], PathBuf::from("/run/convert/weather.wea"))
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failing_matches_bare_and_qualified_names() {
        let executor = FailingExecutor::new(["convert", "daylight/simulate"]);
        let nested = TaskPath::top("weather").child("convert");
        assert!(matches!(
            executor.execute(request(nested)).await,
            TaskCompletion::Failed { .. }
        ));
        assert!(matches!(
            executor.execute(request(TaskPath::top("daylight").child("simulate"))).await,
            TaskCompletion::Failed { .. }
        ));
        assert!(matches!(
            executor.execute(request(TaskPath::top("simulate"))).await,
            TaskCompletion::Succeeded { .. }
        ));
    }

    #[tokio::test]
    async fn test_recording_keeps_requests() {
        let executor = RecordingExecutor::new();
        executor.execute(request(TaskPath::top("a"))).await;
        executor.execute(request(TaskPath::top("b"))).await;

        let seen: Vec<String> = executor
            .requests()
            .await
            .iter()
            .map(|request| request.task.to_string())
            .collect();
        assert_eq!(seen, vec!["a", "b"]);
        assert_eq!(executor.peak_concurrency(), 1);
    }
}
