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

use serde::{Deserialize, Serialize};

use crate::client::{Client, Location};
use crate::error::Result;

pub const KIND: &str = "servergroups";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerGroup {
    pub servergroup_id: String,
    pub name: String,
    pub policy: String,
    #[serde(default)]
    pub instances: Vec<ServerGroupInstance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerGroupInstance {
    pub instance_id: String,
    #[serde(default)]
    pub instance_name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateServerGroup {
    pub name: String,
    pub policy: String,
}

impl Client {
    pub async fn list_server_groups(&self, location: &Location) -> Result<Vec<ServerGroup>> {
        self.list(&location.path(KIND), &[]).await
    }

    pub async fn get_server_group(&self, location: &Location, id: &str) -> Result<ServerGroup> {
        self.get(&location.item(KIND, id)).await
    }

    pub async fn create_server_group(&self, location: &Location, opts: &CreateServerGroup) -> Result<ServerGroup> {
        self.post(&location.path(KIND), opts).await
    }

    pub async fn delete_server_group(&self, location: &Location, id: &str) -> Result<()> {
        self.delete(&location.item(KIND, id)).await
    }
}
