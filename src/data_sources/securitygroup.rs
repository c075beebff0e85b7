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

use async_trait::async_trait;
use edgecenter_client::cloud::securitygroup::{SecurityGroup, SecurityGroupRule};
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeType, Schema};
use tf_provider::value::{Value, ValueEmpty, ValueList, ValueNumber, ValueString};
use tf_provider::{map, DataSource, Diagnostics};

use super::{computed_attribute, computed_objects, selector_attributes};
use crate::attributes::schema;
use crate::location::{impl_location, resolve_location, validate_location};
use crate::lookup::{find_by_name, validate_selector, Selector};
use crate::metadata::{apply_metadata, computed_metadata_attributes, MetadataMap, MetadataReadOnly};
use crate::provider::ClientHandle;
use crate::utils::{check, opt_string, string, ReportError, WithSchema};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct SecurityGroupRuleDataState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub direction: ValueString<'a>,
    pub ethertype: ValueString<'a>,
    pub protocol: ValueString<'a>,
    pub port_range_min: ValueNumber,
    pub port_range_max: ValueNumber,
    pub remote_ip_prefix: ValueString<'a>,
    pub description: ValueString<'a>,
}

impl<'a> From<&SecurityGroupRule> for SecurityGroupRuleDataState<'a> {
    fn from(rule: &SecurityGroupRule) -> Self {
        Self {
            id: string(rule.id.as_str()),
            direction: string(rule.direction.as_str()),
            ethertype: opt_string(rule.ethertype.clone()),
            protocol: opt_string(rule.protocol.clone()),
            port_range_min: rule.port_range_min.into(),
            port_range_max: rule.port_range_max.into(),
            remote_ip_prefix: opt_string(rule.remote_ip_prefix.clone()),
            description: opt_string(rule.description.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SecurityGroupDataSourceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub security_group_rules: ValueList<Value<SecurityGroupRuleDataState<'a>>>,
    pub created_at: ValueString<'a>,
    pub updated_at: ValueString<'a>,
    pub metadata_map: MetadataMap<'a>,
    pub metadata_read_only: MetadataReadOnly<'a>,
}

impl_location!(SecurityGroupDataSourceState);

impl<'a> WithSchema for SecurityGroupDataSourceState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "description" => computed_attribute(AttributeType::String, "Description of the security group"),
            "security_group_rules" => computed_objects(
                map! {
                    "id" => computed_attribute(AttributeType::String, "ID of the rule"),
                    "direction" => computed_attribute(AttributeType::String, "`ingress` or `egress`"),
                    "ethertype" => computed_attribute(AttributeType::String, "`IPv4` or `IPv6`"),
                    "protocol" => computed_attribute(AttributeType::String, "Protocol matched by the rule"),
                    "port_range_min" => computed_attribute(AttributeType::Number, "First port of the range"),
                    "port_range_max" => computed_attribute(AttributeType::Number, "Last port of the range"),
                    "remote_ip_prefix" => computed_attribute(AttributeType::String, "CIDR matched by the rule"),
                    "description" => computed_attribute(AttributeType::String, "Description of the rule"),
                },
                "Rules of the security group",
            ),
            "created_at" => computed_attribute(AttributeType::String, "Creation date"),
            "updated_at" => computed_attribute(AttributeType::String, "Last update date"),
        };
        attributes.extend(selector_attributes("name", "security group"));
        attributes.extend(computed_metadata_attributes());
        schema("EdgeCenter security group", attributes, Default::default())
    }
}

impl<'a> SecurityGroupDataSourceState<'a> {
    fn apply(&mut self, group: &SecurityGroup) {
        self.id = string(group.id.as_str());
        self.name = string(group.name.as_str());
        self.description = opt_string(group.description.clone());
        let mut rules: Vec<_> = group
            .security_group_rules
            .iter()
            .map(SecurityGroupRuleDataState::from)
            .collect();
        // Rule order is not stable across reads
        rules.sort();
        self.security_group_rules = Value::Value(rules.into_iter().map(Value::Value).collect());
        self.created_at = opt_string(group.created_at.clone());
        self.updated_at = opt_string(group.updated_at.clone());
        apply_metadata(&mut self.metadata_map, &mut self.metadata_read_only, &group.metadata);
    }
}

#[derive(Debug, Default, Clone)]
pub struct SecurityGroupDataSource {
    client: ClientHandle,
}

impl SecurityGroupDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for SecurityGroupDataSource {
    type State<'a> = SecurityGroupDataSourceState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(SecurityGroupDataSourceState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        validate_location(diags, &config);
        validate_selector(diags, &config.id, "name", &config.name);
        check(diags)
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = self.client.get(diags)?;
        let mut state = config;
        let location = resolve_location(diags, &client, &mut state).await?;

        let group = match Selector::from_config(diags, &state.id, "name", &state.name)? {
            Selector::Id(id) => client
                .get_security_group(&location, &id)
                .await
                .report(diags, "Failed to read security group")?,
            Selector::Name(name) => {
                let groups = client
                    .list_security_groups(&location)
                    .await
                    .report(diags, "Failed to list security groups")?;
                find_by_name(diags, "security group", &name, groups, |g| &g.name)?
            }
        };
        state.apply(&group);
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_are_sorted() {
        let group: SecurityGroup = serde_json::from_value(serde_json::json!({
            "id": "sg1",
            "name": "web",
            "security_group_rules": [
                {"id": "r2", "direction": "ingress", "protocol": "tcp", "port_range_min": 443, "port_range_max": 443},
                {"id": "r1", "direction": "egress", "ethertype": "IPv4"}
            ]
        }))
        .unwrap();
        let mut state = SecurityGroupDataSourceState::default();
        state.apply(&group);
        let rules = state.security_group_rules.unwrap();
        assert_eq!(rules.len(), 2);
        let first = rules[0].as_ref_option().unwrap();
        assert_eq!(first.direction, string("egress"));
        assert!(first.port_range_min.is_null());
        let second = rules[1].as_ref_option().unwrap();
        assert_eq!(second.port_range_max, Value::Value(443));
    }
}
