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

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Metadata;
use crate::client::{Client, Location};
use crate::error::Result;

pub const KIND: &str = "securitygroups";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub security_group_rules: Vec<SecurityGroupRule>,
    #[serde(default)]
    pub metadata: Vec<Metadata>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SecurityGroupRule {
    pub id: String,
    pub direction: String,
    #[serde(default)]
    pub ethertype: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub port_range_min: Option<i64>,
    #[serde(default)]
    pub port_range_max: Option<i64>,
    #[serde(default)]
    pub remote_ip_prefix: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Rule, as sent to the API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleOpts {
    pub direction: String,
    pub ethertype: String,
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_range_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_range_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_ip_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SecurityGroupOpts {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub security_group_rules: Vec<RuleOpts>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSecurityGroup {
    pub security_group: SecurityGroupOpts,
    pub instances: Vec<String>,
}

/// Change applied to the rules of an existing group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ChangedRule {
    Create(RuleOpts),
    Delete { security_group_rule_id: String },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateSecurityGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changed_rules: Vec<ChangedRule>,
}

impl Client {
    pub async fn list_security_groups(&self, location: &Location) -> Result<Vec<SecurityGroup>> {
        self.list(&location.path(KIND), &[]).await
    }

    pub async fn get_security_group(&self, location: &Location, id: &str) -> Result<SecurityGroup> {
        self.get(&location.item(KIND, id)).await
    }

    /// Security groups are created synchronously
    pub async fn create_security_group(
        &self,
        location: &Location,
        opts: &CreateSecurityGroup,
    ) -> Result<SecurityGroup> {
        self.post(&location.path(KIND), opts).await
    }

    pub async fn update_security_group(
        &self,
        location: &Location,
        id: &str,
        opts: &UpdateSecurityGroup,
    ) -> Result<SecurityGroup> {
        self.patch(&location.item(KIND, id), opts).await
    }

    pub async fn delete_security_group(&self, location: &Location, id: &str) -> Result<()> {
        self.delete(&location.item(KIND, id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changed_rules_are_tagged_with_action() {
        let changes = vec![
            ChangedRule::Create(RuleOpts {
                direction: "ingress".into(),
                ethertype: "IPv4".into(),
                protocol: "tcp".into(),
                port_range_min: Some(22),
                port_range_max: Some(22),
                ..Default::default()
            }),
            ChangedRule::Delete {
                security_group_rule_id: "r1".into(),
            },
        ];
        let json = serde_json::to_value(&changes).unwrap();
        assert_eq!(json[0]["action"], "create");
        assert_eq!(json[0]["port_range_min"], 22);
        assert!(json[0].get("remote_ip_prefix").is_none());
        assert_eq!(json[1]["action"], "delete");
        assert_eq!(json[1]["security_group_rule_id"], "r1");
    }
}
