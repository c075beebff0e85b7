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

//! Client for the EdgeCenter cloud API
//!
//! Only the endpoints needed by the Terraform provider are covered.
//! Mutating calls usually answer with a list of tasks: use [`Client::wait_for_task`]
//! or [`Client::wait_for_created`] to wait for their completion.

mod client;
mod error;
mod task;

pub mod cloud;

pub use client::{
    Client, ClientConfig, Credentials, Location, DEFAULT_CLOUD_API, DEFAULT_PLATFORM_API,
};
pub use error::{Error, Result};
pub use task::{Task, TaskResults, TaskState};
