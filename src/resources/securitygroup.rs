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

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use edgecenter_client::cloud::securitygroup::{
    self, ChangedRule, CreateSecurityGroup, RuleOpts, SecurityGroup, SecurityGroupOpts,
    SecurityGroupRule, UpdateSecurityGroup,
};
use edgecenter_client::{Client, Location};
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint::*, AttributeType, NestedBlock, Schema};
use tf_provider::value::{Value, ValueEmpty, ValueNumber, ValueSet, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Resource};
use tracing::{debug, info, warn};

use crate::attributes::{attribute, block, resource_attributes, schema};
use crate::import::parse_import_id;
use crate::location::{
    impl_location, known_location, plan_location, resolve_location, validate_location, WithLocation,
};
use crate::metadata::{
    apply_metadata, expand_metadata, metadata_attributes, MetadataMap, MetadataReadOnly,
};
use crate::provider::ClientHandle;
use crate::utils::{
    check, computed, default_to, known, known_non_empty, non_empty_string, now, opt_string,
    report_deleted, requires_replace, string, ReportError, WithNormalize, WithSchema,
};
use crate::validate::{self, conflicts_if, one_of};

const DIRECTIONS: &[&str] = &["ingress", "egress"];
const ETHERTYPES: &[&str] = &["IPv4", "IPv6"];
const PROTOCOLS: &[&str] = &[
    "any", "ah", "dccp", "egp", "esp", "gre", "icmp", "igmp", "ipencap", "ipip", "ospf", "pgm",
    "rsvp", "sctp", "tcp", "udp", "udplite", "vrrp",
];
/// Protocols accepting a port range
const PORT_PROTOCOLS: &[&str] = &["tcp", "udp"];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct RuleState<'a> {
    #[serde(borrow = "'a")]
    pub direction: ValueString<'a>,
    pub ethertype: ValueString<'a>,
    pub protocol: ValueString<'a>,
    pub port_range_min: ValueNumber,
    pub port_range_max: ValueNumber,
    pub remote_ip_prefix: ValueString<'a>,
    pub description: ValueString<'a>,
}

impl<'a> RuleState<'a> {
    /// Identity of the rule: every field except the ones assigned by the platform
    fn key(&self) -> RuleOpts {
        RuleOpts {
            direction: self.direction.to_string(),
            ethertype: known(&self.ethertype).unwrap_or_else(|| "IPv4".to_owned()),
            protocol: known(&self.protocol).unwrap_or_else(|| "any".to_owned()),
            port_range_min: self.port_range_min.as_option(),
            port_range_max: self.port_range_max.as_option(),
            remote_ip_prefix: known_non_empty(&self.remote_ip_prefix),
            description: known_non_empty(&self.description),
        }
    }
}

fn remote_rule_key(rule: &SecurityGroupRule) -> RuleOpts {
    RuleOpts {
        direction: rule.direction.clone(),
        ethertype: rule.ethertype.clone().unwrap_or_else(|| "IPv4".to_owned()),
        protocol: rule.protocol.clone().unwrap_or_else(|| "any".to_owned()),
        port_range_min: rule.port_range_min,
        port_range_max: rule.port_range_max,
        remote_ip_prefix: rule.remote_ip_prefix.clone().filter(|prefix| !prefix.is_empty()),
        description: rule.description.clone().filter(|description| !description.is_empty()),
    }
}

/// Changes turning the `remote` rules into the `desired` ones
pub(crate) fn diff_rules(desired: &[RuleOpts], remote: &[SecurityGroupRule]) -> Vec<ChangedRule> {
    let mut pending = desired.iter().collect::<Vec<_>>();
    let mut changes = Vec::new();
    for rule in remote {
        let key = remote_rule_key(rule);
        if let Some(i) = pending.iter().position(|desired| **desired == key) {
            pending.swap_remove(i);
        } else {
            changes.push(ChangedRule::Delete {
                security_group_rule_id: rule.id.clone(),
            });
        }
    }
    changes.extend(pending.into_iter().cloned().map(ChangedRule::Create));
    changes
}

pub type Rules<'a> = ValueSet<Value<RuleState<'a>>>;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SecurityGroupState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub security_group_rules: Rules<'a>,
    pub metadata_map: MetadataMap<'a>,
    pub metadata_read_only: MetadataReadOnly<'a>,
    pub last_updated: ValueString<'a>,
}

impl_location!(SecurityGroupState);

impl<'a> WithSchema for SecurityGroupState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "name" => attribute(AttributeType::String, Required, "Name of the security group"),
            "description" => attribute(AttributeType::String, Optional, "Description of the security group"),
        };
        attributes.extend(resource_attributes("ID of the security group"));
        attributes.extend(metadata_attributes());
        let blocks: HashMap<String, NestedBlock> = map! {
            "security_group_rules" => NestedBlock::Set(block(
                "Rules of the security group",
                map! {
                    "direction" => attribute(AttributeType::String, Required, "`ingress` or `egress`"),
                    "ethertype" => attribute(AttributeType::String, OptionalComputed, "`IPv4` (default) or `IPv6`"),
                    "protocol" => attribute(AttributeType::String, OptionalComputed, "IP protocol of the rule (default: `any`)"),
                    "port_range_min" => attribute(AttributeType::Number, Optional, "First port of the range, tcp and udp only"),
                    "port_range_max" => attribute(AttributeType::Number, Optional, "Last port of the range, tcp and udp only"),
                    "remote_ip_prefix" => attribute(AttributeType::String, Optional, "CIDR of the remote addresses"),
                    "description" => attribute(AttributeType::String, Optional, "Description of the rule"),
                },
            )),
        };
        schema("EdgeCenter security group", attributes, blocks)
    }
}

impl<'a> WithNormalize for SecurityGroupState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if let Value::Value(rules) = &self.security_group_rules {
            let rules = rules
                .iter()
                .map(|rule| match rule {
                    Value::Value(rule) => {
                        let mut rule = rule.clone();
                        default_to(&mut rule.ethertype, "IPv4".into());
                        default_to(&mut rule.protocol, "any".into());
                        Value::Value(rule)
                    }
                    rule => rule.clone(),
                })
                .collect();
            self.security_group_rules = Value::Value(rules);
        }
        computed(&mut self.metadata_read_only);
    }
}

impl<'a> SecurityGroupState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        validate_location(diags, self);
        if let Value::Value(rules) = &self.security_group_rules {
            if rules.is_empty() {
                diags.error_short(
                    "A security group needs at least one rule",
                    AttributePath::new("security_group_rules"),
                );
            }
        }
        for rule in self.security_group_rules.iter().flatten() {
            let Value::Value(rule) = rule else {
                continue;
            };
            let path = AttributePath::new("security_group_rules");
            one_of(diags, path.clone().attribute("direction"), &rule.direction, DIRECTIONS);
            one_of(diags, path.clone().attribute("ethertype"), &rule.ethertype, ETHERTYPES);
            one_of(diags, path.clone().attribute("protocol"), &rule.protocol, PROTOCOLS);
            validate::cidr(diags, path.clone().attribute("remote_ip_prefix"), &rule.remote_ip_prefix);

            let with_ports = match rule.protocol.as_deref_option() {
                Some(protocol) => PORT_PROTOCOLS.contains(&protocol),
                None => false,
            };
            let without_ports = rule.protocol.is_value() && !with_ports;
            let reason = "for a protocol other than tcp and udp";
            conflicts_if(diags, path.clone().attribute("port_range_min"), &rule.port_range_min, without_ports, reason);
            conflicts_if(diags, path.clone().attribute("port_range_max"), &rule.port_range_max, without_ports, reason);
            validate::port_range(diags, path, &rule.port_range_min, &rule.port_range_max);
        }
    }

    fn rule_keys(&self) -> Vec<RuleOpts> {
        self.security_group_rules
            .iter()
            .flatten()
            .filter_map(|rule| rule.as_ref_option())
            .map(RuleState::key)
            .collect()
    }

    fn apply(&mut self, group: &SecurityGroup) {
        self.id = string(group.id.as_str());
        self.name = string(group.name.as_str());
        self.description = non_empty_string(group.description.clone());
        let rules = group
            .security_group_rules
            .iter()
            .map(|rule| {
                let key = remote_rule_key(rule);
                Value::Value(RuleState {
                    direction: string(key.direction),
                    ethertype: string(key.ethertype),
                    protocol: string(key.protocol),
                    port_range_min: key.port_range_min.into(),
                    port_range_max: key.port_range_max.into(),
                    remote_ip_prefix: opt_string(key.remote_ip_prefix),
                    description: opt_string(key.description),
                })
            })
            .collect::<BTreeSet<_>>();
        self.security_group_rules = Value::Value(rules);
        apply_metadata(
            &mut self.metadata_map,
            &mut self.metadata_read_only,
            &group.metadata,
        );
    }
}

/// Bring the rules of a group in line with the configured ones
async fn sync_rules(
    diags: &mut Diagnostics,
    client: &Client,
    location: &Location,
    group: SecurityGroup,
    desired: &[RuleOpts],
    update: UpdateSecurityGroup,
) -> Option<SecurityGroup> {
    let changed_rules = diff_rules(desired, &group.security_group_rules);
    if changed_rules.is_empty() && update.name.is_none() && update.description.is_none() {
        return Some(group);
    }
    debug!(id = %group.id, changes = changed_rules.len(), "Updating security group rules");
    client
        .update_security_group(
            location,
            &group.id,
            &UpdateSecurityGroup {
                changed_rules,
                ..update
            },
        )
        .await
        .report(diags, "Failed to update security group")
}

#[derive(Debug, Default, Clone)]
pub struct SecurityGroupResource {
    client: ClientHandle,
}

impl SecurityGroupResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for SecurityGroupResource {
    type State<'a> = SecurityGroupState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(SecurityGroupState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        config.validate(diags);
        check(diags)
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.client.get(diags)?;
        let mut state = state;
        let location = known_location(diags, &state)?;

        let Some(group) = client
            .get_security_group(&location, &state.id)
            .await
            .report_found(diags, "Failed to read security group")?
        else {
            warn!(id = %state.id, "Security group does not exist anymore");
            return None;
        };
        state.apply(&group);
        Some((state, private_state))
    }

    async fn plan_create<'a>(
        &self,
        diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state;
        state.id = Value::Unknown;
        state.last_updated = Value::Unknown;
        plan_location(&mut state.project_id, &mut state.region_id);
        state.normalize(diags);
        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let mut state = proposed_state;
        state.normalize(diags);

        let trigger_replace = requires_replace!(
            prior_state,
            state,
            [project_id, project_name, region_id, region_name]
        );
        if state.metadata_map != prior_state.metadata_map {
            state.metadata_read_only = Value::Unknown;
        }
        if state != prior_state {
            state.last_updated = Value::Unknown;
        }
        Some((state, prior_private_state, trigger_replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.client.get(diags)?;
        let mut state = planned_state;
        let location = resolve_location(diags, &client, &mut state).await?;

        let rules = state.rule_keys();
        let opts = CreateSecurityGroup {
            security_group: SecurityGroupOpts {
                name: state.name.to_string(),
                description: known_non_empty(&state.description),
                security_group_rules: rules.clone(),
                metadata: expand_metadata(&state.metadata_map),
            },
            instances: Vec::new(),
        };
        info!(name = %opts.security_group.name, "Creating security group");
        let group = client
            .create_security_group(&location, &opts)
            .await
            .report(diags, "Failed to create security group")?;
        // The platform may add default rules to a new group
        let group = sync_rules(diags, &client, &location, group, &rules, Default::default()).await?;

        state.apply(&group);
        state.last_updated = now();
        Some((state, planned_private_state))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.client.get(diags)?;
        let mut state = planned_state;
        let location = known_location(diags, &prior_state)?;
        let id = prior_state.id.to_string();

        let group = client
            .get_security_group(&location, &id)
            .await
            .report(diags, "Failed to read security group")?;
        let update = UpdateSecurityGroup {
            name: Some(state.name.to_string()).filter(|_| state.name != prior_state.name),
            description: if state.description != prior_state.description {
                Some(known(&state.description).unwrap_or_default())
            } else {
                None
            },
            changed_rules: Vec::new(),
        };
        info!(%id, "Updating security group");
        let mut group = sync_rules(diags, &client, &location, group, &state.rule_keys(), update).await?;

        if state.metadata_map != prior_state.metadata_map {
            client
                .replace_metadata(&location, securitygroup::KIND, &id, &expand_metadata(&state.metadata_map))
                .await
                .report(diags, "Failed to update security group metadata")?;
            group = client
                .get_security_group(&location, &id)
                .await
                .report(diags, "Failed to read security group")?;
        }

        state.apply(&group);
        state.last_updated = now();
        Some((state, planned_private_state))
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let client = self.client.get(diags)?;
        let location = known_location(diags, &state)?;

        info!(id = %state.id, "Deleting security group");
        let result = client.delete_security_group(&location, &state.id).await;
        report_deleted(result, diags, "Failed to delete security group")?;
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let import = parse_import_id(diags, &id, false)?;
        let mut state = SecurityGroupState {
            id: string(import.id),
            ..Default::default()
        };
        state.set_location(&import.location);
        Some((state, Default::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(id: &str, direction: &str, protocol: &str, port: Option<i64>) -> SecurityGroupRule {
        SecurityGroupRule {
            id: id.to_owned(),
            direction: direction.to_owned(),
            ethertype: Some("IPv4".to_owned()),
            protocol: Some(protocol.to_owned()),
            port_range_min: port,
            port_range_max: port,
            remote_ip_prefix: None,
            description: Some(String::new()),
        }
    }

    fn rule<'a>(direction: &'a str, protocol: &'a str, port: Option<i64>) -> RuleState<'a> {
        RuleState {
            direction: direction.into(),
            ethertype: "IPv4".into(),
            protocol: protocol.into(),
            port_range_min: port.into(),
            port_range_max: port.into(),
            ..Default::default()
        }
    }

    #[test]
    fn unchanged_rules_give_no_change() {
        let desired = vec![rule("ingress", "tcp", Some(22)).key()];
        let changes = diff_rules(&desired, &[remote("r1", "ingress", "tcp", Some(22))]);
        assert!(changes.is_empty());
    }

    #[test]
    fn rules_are_diffed_by_key() {
        let desired = vec![
            rule("ingress", "tcp", Some(22)).key(),
            rule("ingress", "tcp", Some(443)).key(),
        ];
        let changes = diff_rules(
            &desired,
            &[
                remote("r1", "ingress", "tcp", Some(22)),
                remote("r2", "egress", "any", None),
            ],
        );
        assert_eq!(
            changes,
            vec![
                ChangedRule::Delete {
                    security_group_rule_id: "r2".to_owned()
                },
                ChangedRule::Create(rule("ingress", "tcp", Some(443)).key()),
            ]
        );
    }

    #[test]
    fn duplicate_remote_rules_are_deleted() {
        let desired = vec![rule("ingress", "tcp", Some(22)).key()];
        let changes = diff_rules(
            &desired,
            &[
                remote("r1", "ingress", "tcp", Some(22)),
                remote("r2", "ingress", "tcp", Some(22)),
            ],
        );
        assert_eq!(
            changes,
            vec![ChangedRule::Delete {
                security_group_rule_id: "r2".to_owned()
            }]
        );
    }

    #[test]
    fn ports_are_validated() {
        let state = SecurityGroupState {
            project_id: Value::Value(1),
            region_id: Value::Value(1),
            security_group_rules: Value::Value(
                [
                    Value::Value(rule("ingress", "icmp", Some(22))),
                    Value::Value(RuleState {
                        port_range_min: Value::Value(443),
                        port_range_max: Value::Value(80),
                        ..rule("ingress", "tcp", None)
                    }),
                    Value::Value(rule("ingress", "udp", Some(70000))),
                ]
                .into_iter()
                .collect(),
            ),
            ..Default::default()
        };
        let mut diags = Diagnostics::default();
        state.validate(&mut diags);
        let summaries = diags
            .errors
            .iter()
            .map(|diag| &*diag.summary)
            .collect::<Vec<_>>();
        assert_eq!(summaries.iter().filter(|s| **s == "Unexpected attribute").count(), 2);
        assert_eq!(summaries.iter().filter(|s| **s == "Invalid port range").count(), 1);
        assert_eq!(summaries.iter().filter(|s| **s == "Value out of range").count(), 2);
    }

    #[test]
    fn empty_rules_are_rejected() {
        let state = SecurityGroupState {
            project_id: Value::Value(1),
            region_id: Value::Value(1),
            security_group_rules: Value::Value(Default::default()),
            ..Default::default()
        };
        let mut diags = Diagnostics::default();
        state.validate(&mut diags);
        assert_eq!(diags.errors.len(), 1);
    }

    #[test]
    fn defaults_are_planned() {
        let mut state = SecurityGroupState {
            security_group_rules: Value::Value(
                [Value::Value(RuleState {
                    direction: "egress".into(),
                    ..Default::default()
                })]
                .into_iter()
                .collect(),
            ),
            ..Default::default()
        };
        state.normalize(&mut Diagnostics::default());
        let keys = state.rule_keys();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].ethertype, "IPv4");
        assert_eq!(keys[0].protocol, "any");
    }
}
