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

use std::time::Duration;

use thiserror::Error;

/// Errors returned by the EdgeCenter client
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Object does not exist (HTTP 404)
    #[error("not found: {0}")]
    NotFound(String),

    /// Task reached the `ERROR` state
    #[error("task {id} failed: {message}")]
    Task { id: String, message: String },

    /// Task did not reach a terminal state in time
    #[error("task {id} did not finish within {}s", .timeout.as_secs())]
    TaskTimeout { id: String, timeout: Duration },

    /// Task finished without reporting the expected resource
    #[error("task {task} finished without creating any {kind}")]
    MissingResource { task: String, kind: String },

    /// Response body could not be decoded
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Endpoint could not be built
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Client configuration is invalid
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Check if the error means the object does not exist anymore
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
