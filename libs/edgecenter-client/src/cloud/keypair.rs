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

use crate::client::Client;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Keypair {
    pub sshkey_id: String,
    pub sshkey_name: String,
    pub public_key: String,
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub shared_in_project: bool,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateKeypair {
    pub sshkey_name: String,
    pub public_key: String,
    pub project_id: i64,
    pub shared_in_project: bool,
}

/// Keypairs are project wide and live under the v2 API
impl Client {
    pub async fn list_keypairs(&self, project_id: i64) -> Result<Vec<Keypair>> {
        self.list(&format!("v2/keypairs/{project_id}"), &[]).await
    }

    pub async fn get_keypair(&self, project_id: i64, id: &str) -> Result<Keypair> {
        self.get(&format!("v2/keypairs/{project_id}/{id}")).await
    }

    pub async fn create_keypair(&self, opts: &CreateKeypair) -> Result<Keypair> {
        self.post(&format!("v2/keypairs/{}", opts.project_id), opts)
            .await
    }

    pub async fn delete_keypair(&self, project_id: i64, id: &str) -> Result<()> {
        self.delete(&format!("v2/keypairs/{project_id}/{id}")).await
    }
}
