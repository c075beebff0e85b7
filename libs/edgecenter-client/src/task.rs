// This file is part of the terraform-provider-edgecenter project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::client::Client;
use crate::error::{Error, Result};

/// State of an asynchronous task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    New,
    Running,
    Finished,
    Error,
    #[serde(other)]
    Unknown,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Finished | TaskState::Error)
    }
}

/// Asynchronous operation handle
#[derive(Debug, Clone, Deserialize)]
pub struct Task {
    pub id: String,
    pub state: TaskState,
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    /// Created objects, by kind (eg: `networks`, `loadbalancers`)
    #[serde(default)]
    pub created_resources: Option<HashMap<String, serde_json::Value>>,
}

impl Task {
    /// IDs of the objects of `kind` created by the task
    pub fn created(&self, kind: &str) -> Vec<String> {
        self.created_resources
            .as_ref()
            .and_then(|created| created.get(kind))
            .and_then(serde_json::Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| match id {
                        serde_json::Value::String(id) => Some(id.clone()),
                        serde_json::Value::Object(obj) => {
                            obj.get("id").and_then(|id| id.as_str()).map(str::to_owned)
                        }
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Tasks spawned by a mutating request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskResults {
    #[serde(default)]
    pub tasks: Vec<String>,
}

impl Client {
    pub async fn get_task(&self, task_id: &str) -> Result<Task> {
        self.get(&format!("v1/tasks/{task_id}")).await
    }

    /// Poll a task until it reaches a terminal state or `timeout` expires
    pub async fn wait_for_task(&self, task_id: &str, timeout: Duration) -> Result<Task> {
        let deadline = Instant::now() + timeout;
        info!(task_id, timeout_secs = timeout.as_secs(), "Waiting for task");

        loop {
            let task = self.get_task(task_id).await?;
            debug!(task_id, state = ?task.state, "Polled task");

            match task.state {
                TaskState::Finished => return Ok(task),
                TaskState::Error => {
                    return Err(Error::Task {
                        id: task.id,
                        message: task.error.unwrap_or_else(|| "unknown error".to_owned()),
                    })
                }
                TaskState::New | TaskState::Running | TaskState::Unknown => (),
            }

            if Instant::now() + self.poll_interval > deadline {
                return Err(Error::TaskTimeout {
                    id: task_id.to_owned(),
                    timeout,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Wait for every task of `results`, returning the last one
    pub async fn wait_for_tasks(&self, results: &TaskResults, timeout: Duration) -> Result<Option<Task>> {
        let mut last = None;
        for task_id in &results.tasks {
            last = Some(self.wait_for_task(task_id, timeout).await?);
        }
        Ok(last)
    }

    /// Wait for the first task of `results` and return the ID of the created object of `kind`
    pub async fn wait_for_created(
        &self,
        results: &TaskResults,
        kind: &str,
        timeout: Duration,
    ) -> Result<String> {
        let task_id = results.tasks.first().ok_or_else(|| Error::MissingResource {
            task: "<none>".to_owned(),
            kind: kind.to_owned(),
        })?;
        let task = self.wait_for_task(task_id, timeout).await?;
        task.created(kind)
            .into_iter()
            .next()
            .ok_or_else(|| Error::MissingResource {
                task: task.id,
                kind: kind.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_resources_accept_ids_and_objects() {
        let task: Task = serde_json::from_str(
            r#"{
                "id": "t1",
                "state": "FINISHED",
                "created_resources": {
                    "networks": ["n1"],
                    "members": [{"id": "m1"}],
                    "ports": null
                }
            }"#,
        )
        .unwrap();
        assert_eq!(task.created("networks"), vec!["n1"]);
        assert_eq!(task.created("members"), vec!["m1"]);
        assert!(task.created("ports").is_empty());
        assert!(task.created("subnets").is_empty());
    }

    #[test]
    fn unknown_states_are_not_terminal() {
        let task: Task = serde_json::from_str(r#"{"id": "t", "state": "PENDING"}"#).unwrap();
        assert_eq!(task.state, TaskState::Unknown);
        assert!(!task.state.is_terminal());
        assert!(TaskState::Error.is_terminal());
    }
}
