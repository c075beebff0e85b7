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
use crate::task::TaskResults;

pub const KIND: &str = "l7policies";
/// Kind reported by tasks creating a policy (spelled this way by the API)
pub const CREATED_KIND: &str = "l7polices";
/// Kind reported by tasks creating a rule
pub const RULE_CREATED_KIND: &str = "l7rules";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct L7Policy {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub listener_id: String,
    pub action: String,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub redirect_pool_id: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub redirect_prefix: Option<String>,
    #[serde(default)]
    pub redirect_http_code: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rules: Vec<RuleRef>,
    #[serde(default)]
    pub provisioning_status: Option<String>,
    #[serde(default)]
    pub operating_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct L7Rule {
    pub id: String,
    pub r#type: String,
    pub compare_type: String,
    pub value: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub invert: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub provisioning_status: Option<String>,
    #[serde(default)]
    pub operating_status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct L7PolicyOpts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub listener_id: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_pool_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_http_code: Option<i64>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct L7RuleOpts {
    pub r#type: String,
    pub compare_type: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub invert: bool,
    pub tags: Vec<String>,
}

impl Client {
    pub async fn get_l7_policy(&self, location: &Location, id: &str) -> Result<L7Policy> {
        self.get(&location.item(KIND, id)).await
    }

    pub async fn create_l7_policy(&self, location: &Location, opts: &L7PolicyOpts) -> Result<TaskResults> {
        self.post(&location.path(KIND), opts).await
    }

    pub async fn replace_l7_policy(&self, location: &Location, id: &str, opts: &L7PolicyOpts) -> Result<TaskResults> {
        self.put(&location.item(KIND, id), opts).await
    }

    pub async fn delete_l7_policy(&self, location: &Location, id: &str) -> Result<TaskResults> {
        self.delete(&location.item(KIND, id)).await
    }

    pub async fn get_l7_rule(&self, location: &Location, policy_id: &str, rule_id: &str) -> Result<L7Rule> {
        self.get(&format!("{}/rules/{rule_id}", location.item(KIND, policy_id)))
            .await
    }

    pub async fn create_l7_rule(&self, location: &Location, policy_id: &str, opts: &L7RuleOpts) -> Result<TaskResults> {
        self.post(&format!("{}/rules", location.item(KIND, policy_id)), opts)
            .await
    }

    pub async fn replace_l7_rule(
        &self,
        location: &Location,
        policy_id: &str,
        rule_id: &str,
        opts: &L7RuleOpts,
    ) -> Result<TaskResults> {
        self.put(
            &format!("{}/rules/{rule_id}", location.item(KIND, policy_id)),
            opts,
        )
        .await
    }

    pub async fn delete_l7_rule(&self, location: &Location, policy_id: &str, rule_id: &str) -> Result<TaskResults> {
        self.delete(&format!("{}/rules/{rule_id}", location.item(KIND, policy_id)))
            .await
    }
}
