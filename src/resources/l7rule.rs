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
use edgecenter_client::cloud::l7policy::{L7Rule, L7RuleOpts, RULE_CREATED_KIND};
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint::*, AttributeType, Schema};
use tf_provider::value::{Value, ValueBool, ValueEmpty, ValueList, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Resource};
use tracing::{info, warn};

use super::loadbalancer::TIMEOUT;
use crate::attributes::{attribute, list_of, resource_attributes, schema};
use crate::import::parse_import_id;
use crate::location::{
    impl_location, known_location, plan_location, resolve_location, validate_location, WithLocation,
};
use crate::provider::ClientHandle;
use crate::utils::{
    apply_list, check, computed, default_to, known, known_list, now, opt_string, report_deleted,
    requires_replace, string, string_list, ReportError, WithNormalize, WithSchema,
};
use crate::validate::{conflicts_if, one_of, required_if};

const RULE_TYPES: &[&str] = &[
    "COOKIE",
    "FILE_TYPE",
    "HEADER",
    "HOST_NAME",
    "PATH",
    "SSL_CONN_HAS_CERT",
    "SSL_VERIFY_RESULT",
    "SSL_DN_FIELD",
];
const COMPARE_TYPES: &[&str] = &["CONTAINS", "ENDS_WITH", "EQUAL_TO", "REGEX", "STARTS_WITH"];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct L7RuleState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub l7policy_id: ValueString<'a>,
    #[serde(rename = "type")]
    pub rule_type: ValueString<'a>,
    pub compare_type: ValueString<'a>,
    pub value: ValueString<'a>,
    pub key: ValueString<'a>,
    pub invert: ValueBool,
    pub tags: ValueList<ValueString<'a>>,
    pub provisioning_status: ValueString<'a>,
    pub operating_status: ValueString<'a>,
    pub last_updated: ValueString<'a>,
}

impl_location!(L7RuleState);

impl<'a> WithSchema for L7RuleState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "l7policy_id" => attribute(AttributeType::String, Required, "ID of the L7 policy"),
            "type" => attribute(
                AttributeType::String,
                Required,
                "Type of the rule: `COOKIE`, `FILE_TYPE`, `HEADER`, `HOST_NAME`, `PATH`, \
                 `SSL_CONN_HAS_CERT`, `SSL_VERIFY_RESULT` or `SSL_DN_FIELD`",
            ),
            "compare_type" => attribute(
                AttributeType::String,
                Required,
                "Comparison: `CONTAINS`, `ENDS_WITH`, `EQUAL_TO`, `REGEX` or `STARTS_WITH`",
            ),
            "value" => attribute(AttributeType::String, Required, "Value to compare to"),
            "key" => attribute(AttributeType::String, Optional, "Header or cookie name, for `HEADER` and `COOKIE` rules"),
            "invert" => attribute(AttributeType::Bool, OptionalComputed, "Negate the comparison (default: false)"),
            "tags" => attribute(list_of(AttributeType::String), Optional, "Tags of the rule"),
            "provisioning_status" => attribute(AttributeType::String, Computed, "Provisioning status"),
            "operating_status" => attribute(AttributeType::String, Computed, "Operating status"),
        };
        attributes.extend(resource_attributes("ID of the rule"));
        schema("EdgeCenter load balancer L7 rule", attributes, Default::default())
    }
}

impl<'a> WithNormalize for L7RuleState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        default_to(&mut self.invert, false);
        computed(&mut self.provisioning_status);
        computed(&mut self.operating_status);
    }
}

impl<'a> L7RuleState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        validate_location(diags, self);
        one_of(diags, AttributePath::new("type"), &self.rule_type, RULE_TYPES);
        one_of(diags, AttributePath::new("compare_type"), &self.compare_type, COMPARE_TYPES);

        let keyed = matches!(self.rule_type.as_deref_option(), Some("HEADER" | "COOKIE"));
        required_if(
            diags,
            AttributePath::new("key"),
            &self.key,
            keyed,
            "for `HEADER` and `COOKIE` rules",
        );
        conflicts_if(
            diags,
            AttributePath::new("key"),
            &self.key,
            self.rule_type.is_value() && !keyed,
            "for rules other than `HEADER` and `COOKIE`",
        );
    }

    fn opts(&self) -> L7RuleOpts {
        L7RuleOpts {
            r#type: self.rule_type.to_string(),
            compare_type: self.compare_type.to_string(),
            value: self.value.to_string(),
            key: known(&self.key),
            invert: self.invert.unwrap_or(false),
            tags: known_list(&self.tags),
        }
    }

    fn apply(&mut self, rule: &L7Rule) {
        self.id = string(rule.id.as_str());
        self.rule_type = string(rule.r#type.as_str());
        self.compare_type = string(rule.compare_type.as_str());
        self.value = string(rule.value.as_str());
        self.key = opt_string(rule.key.clone());
        self.invert = Value::Value(rule.invert);
        apply_list(&mut self.tags, string_list(rule.tags.clone()).unwrap_or_default());
        self.provisioning_status = opt_string(rule.provisioning_status.clone());
        self.operating_status = opt_string(rule.operating_status.clone());
    }
}

#[derive(Debug, Default, Clone)]
pub struct L7RuleResource {
    client: ClientHandle,
}

impl L7RuleResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for L7RuleResource {
    type State<'a> = L7RuleState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(L7RuleState::schema())
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

        let Some(rule) = client
            .get_l7_rule(&location, &state.l7policy_id, &state.id)
            .await
            .report_found(diags, "Failed to read L7 rule")?
        else {
            warn!(id = %state.id, l7policy_id = %state.l7policy_id, "L7 rule does not exist anymore");
            return None;
        };
        state.apply(&rule);
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
            [project_id, project_name, region_id, region_name, l7policy_id]
        );
        if state != prior_state {
            state.provisioning_status = Value::Unknown;
            state.operating_status = Value::Unknown;
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
        let policy_id = state.l7policy_id.to_string();

        let opts = state.opts();
        info!(%policy_id, rule_type = %opts.r#type, "Creating L7 rule");
        let tasks = client
            .create_l7_rule(&location, &policy_id, &opts)
            .await
            .report(diags, "Failed to create L7 rule")?;
        let id = client
            .wait_for_created(&tasks, RULE_CREATED_KIND, TIMEOUT)
            .await
            .report(diags, "Failed to create L7 rule")?;
        let rule = client
            .get_l7_rule(&location, &policy_id, &id)
            .await
            .report(diags, "Failed to read created L7 rule")?;

        state.apply(&rule);
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
        let policy_id = prior_state.l7policy_id.to_string();
        let id = prior_state.id.to_string();

        info!(%id, %policy_id, "Replacing L7 rule");
        let tasks = client
            .replace_l7_rule(&location, &policy_id, &id, &state.opts())
            .await
            .report(diags, "Failed to update L7 rule")?;
        client
            .wait_for_tasks(&tasks, TIMEOUT)
            .await
            .report(diags, "Failed to update L7 rule")?;

        let rule = client
            .get_l7_rule(&location, &policy_id, &id)
            .await
            .report(diags, "Failed to read L7 rule")?;
        state.apply(&rule);
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

        info!(id = %state.id, l7policy_id = %state.l7policy_id, "Deleting L7 rule");
        let result = client
            .delete_l7_rule(&location, &state.l7policy_id, &state.id)
            .await;
        if let Some(tasks) = report_deleted(result, diags, "Failed to delete L7 rule")? {
            client
                .wait_for_tasks(&tasks, TIMEOUT)
                .await
                .report(diags, "Failed to delete L7 rule")?;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let import = parse_import_id(diags, &id, true)?;
        let mut state = L7RuleState {
            id: string(import.id),
            l7policy_id: opt_string(import.parent_id),
            ..Default::default()
        };
        state.set_location(&import.location);
        Some((state, Default::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule<'a>(rule_type: &'static str) -> L7RuleState<'a> {
        L7RuleState {
            project_id: Value::Value(1),
            region_id: Value::Value(1),
            l7policy_id: "p1".into(),
            rule_type: rule_type.into(),
            compare_type: "EQUAL_TO".into(),
            value: "v".into(),
            ..Default::default()
        }
    }

    fn errors(state: &L7RuleState) -> Vec<AttributePath> {
        let mut diags = Diagnostics::default();
        state.validate(&mut diags);
        diags.errors.into_iter().map(|diag| diag.attribute).collect()
    }

    #[test]
    fn key_only_for_headers_and_cookies() {
        assert!(errors(&rule("PATH")).is_empty());
        assert_eq!(errors(&rule("HEADER")), vec![AttributePath::new("key")]);
        assert!(errors(&L7RuleState {
            key: "X-Env".into(),
            ..rule("HEADER")
        })
        .is_empty());
        assert_eq!(
            errors(&L7RuleState {
                key: "session".into(),
                ..rule("HOST_NAME")
            }),
            vec![AttributePath::new("key")]
        );
    }

    #[test]
    fn invert_defaults_to_false() {
        let mut state = rule("PATH");
        state.normalize(&mut Diagnostics::default());
        assert_eq!(state.invert, Value::Value(false));
        let json = serde_json::to_value(state.opts()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "PATH",
                "compare_type": "EQUAL_TO",
                "value": "v",
                "invert": false,
                "tags": []
            })
        );
    }
}
