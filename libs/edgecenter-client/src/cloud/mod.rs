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

//! Typed access to the cloud API, one module per kind of object

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::client::{Client, Location};
use crate::error::Result;

pub mod floatingip;
pub mod image;
pub mod k8s;
pub mod keypair;
pub mod l7policy;
pub mod listener;
pub mod loadbalancer;
pub mod network;
pub mod pool;
pub mod project;
pub mod region;
pub mod reservedfixedip;
pub mod router;
pub mod securitygroup;
pub mod servergroup;
pub mod snapshot;
pub mod subnet;
pub mod volume;

/// Metadata item attached to an object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub read_only: bool,
}

/// Route entry used by subnets and routers
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostRoute {
    pub destination: String,
    pub nexthop: String,
}

impl Client {
    /// Replace all the user metadata of an object
    pub async fn replace_metadata(
        &self,
        location: &Location,
        kind: &str,
        id: &str,
        metadata: &BTreeMap<String, String>,
    ) -> Result<()> {
        self.put(&format!("{}/metadata", location.item(kind, id)), metadata)
            .await
    }
}
