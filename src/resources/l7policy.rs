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
use edgecenter_client::cloud::l7policy::{L7Policy, L7PolicyOpts, CREATED_KIND};
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint::*, AttributeType, Schema};
use tf_provider::value::{Value, ValueEmpty, ValueList, ValueNumber, ValueString};
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
    apply_list, check, computed, known, known_list, now, opt_string, report_deleted,
    requires_replace, string, string_list, ReportError, WithNormalize, WithSchema,
};
use crate::validate::{conflicts_if, one_of, required_if};

const ACTIONS: &[&str] = &["REDIRECT_TO_POOL", "REDIRECT_TO_URL", "REDIRECT_PREFIX", "REJECT"];
const REDIRECT_HTTP_CODES: &[i64] = &[301, 302, 303, 307, 308];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct L7PolicyState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub listener_id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub action: ValueString<'a>,
    pub redirect_pool_id: ValueString<'a>,
    pub redirect_url: ValueString<'a>,
    pub redirect_prefix: ValueString<'a>,
    pub redirect_http_code: ValueNumber,
    pub position: ValueNumber,
    pub tags: ValueList<ValueString<'a>>,
    pub rules: ValueList<ValueString<'a>>,
    pub provisioning_status: ValueString<'a>,
    pub operating_status: ValueString<'a>,
    pub last_updated: ValueString<'a>,
}

impl_location!(L7PolicyState);

impl<'a> WithSchema for L7PolicyState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "listener_id" => attribute(AttributeType::String, Required, "ID of the listener"),
            "name" => attribute(AttributeType::String, OptionalComputed, "Name of the policy"),
            "action" => attribute(
                AttributeType::String,
                Required,
                "Action: `REDIRECT_TO_POOL`, `REDIRECT_TO_URL`, `REDIRECT_PREFIX` or `REJECT`",
            ),
            "redirect_pool_id" => attribute(AttributeType::String, OptionalComputed, "Pool requests are redirected to, for `REDIRECT_TO_POOL`"),
            "redirect_url" => attribute(AttributeType::String, OptionalComputed, "URL requests are redirected to, for `REDIRECT_TO_URL`"),
            "redirect_prefix" => attribute(AttributeType::String, OptionalComputed, "URL prefix requests are redirected to, for `REDIRECT_PREFIX`"),
            "redirect_http_code" => attribute(
                AttributeType::Number,
                OptionalComputed,
                "HTTP code of the redirection: 301, 302, 303, 307 or 308",
            ),
            "position" => attribute(AttributeType::Number, OptionalComputed, "Position of the policy in the listener"),
            "tags" => attribute(list_of(AttributeType::String), Optional, "Tags of the policy"),
            "rules" => attribute(list_of(AttributeType::String), Computed, "IDs of the rules of the policy"),
            "provisioning_status" => attribute(AttributeType::String, Computed, "Provisioning status"),
            "operating_status" => attribute(AttributeType::String, Computed, "Operating status"),
        };
        attributes.extend(resource_attributes("ID of the policy"));
        schema("EdgeCenter load balancer L7 policy", attributes, Default::default())
    }
}

impl<'a> WithNormalize for L7PolicyState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        computed(&mut self.name);
        computed(&mut self.position);
        computed(&mut self.rules);
        computed(&mut self.provisioning_status);
        computed(&mut self.operating_status);
        // Only URL and prefix redirections get a default HTTP code
        if matches!(
            self.action.as_deref_option(),
            Some("REDIRECT_TO_URL" | "REDIRECT_PREFIX")
        ) {
            computed(&mut self.redirect_http_code);
        }
    }
}

impl<'a> L7PolicyState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        validate_location(diags, self);
        one_of(diags, AttributePath::new("action"), &self.action, ACTIONS);

        if let Value::Value(action) = &self.action {
            let action = action.as_ref();
            let to_pool = action == "REDIRECT_TO_POOL";
            let to_url = action == "REDIRECT_TO_URL";
            let to_prefix = action == "REDIRECT_PREFIX";
            let reason = format!("with the `{action}` action");

            required_if(diags, AttributePath::new("redirect_pool_id"), &self.redirect_pool_id, to_pool, &reason);
            conflicts_if(diags, AttributePath::new("redirect_pool_id"), &self.redirect_pool_id, !to_pool, &reason);
            required_if(diags, AttributePath::new("redirect_url"), &self.redirect_url, to_url, &reason);
            conflicts_if(diags, AttributePath::new("redirect_url"), &self.redirect_url, !to_url, &reason);
            required_if(diags, AttributePath::new("redirect_prefix"), &self.redirect_prefix, to_prefix, &reason);
            conflicts_if(diags, AttributePath::new("redirect_prefix"), &self.redirect_prefix, !to_prefix, &reason);
            conflicts_if(
                diags,
                AttributePath::new("redirect_http_code"),
                &self.redirect_http_code,
                !(to_url || to_prefix),
                &reason,
            );
        }

        if let Value::Value(code) = self.redirect_http_code {
            if !REDIRECT_HTTP_CODES.contains(&code) {
                diags.error(
                    "Invalid value",
                    format!("Redirect HTTP code {code} must be one of 301, 302, 303, 307 or 308"),
                    AttributePath::new("redirect_http_code"),
                );
            }
        }
        if let Value::Value(position) = self.position {
            if position < 1 {
                diags.error(
                    "Value out of range",
                    format!("Position {position} must be at least 1"),
                    AttributePath::new("position"),
                );
            }
        }
    }

    fn opts(&self) -> L7PolicyOpts {
        L7PolicyOpts {
            name: known(&self.name),
            listener_id: self.listener_id.to_string(),
            action: self.action.to_string(),
            position: self.position.as_option(),
            redirect_pool_id: known(&self.redirect_pool_id),
            redirect_url: known(&self.redirect_url),
            redirect_prefix: known(&self.redirect_prefix),
            redirect_http_code: self.redirect_http_code.as_option(),
            tags: known_list(&self.tags),
        }
    }

    fn apply(&mut self, policy: &L7Policy) {
        self.id = string(policy.id.as_str());
        self.listener_id = string(policy.listener_id.as_str());
        self.name = opt_string(policy.name.clone());
        self.action = string(policy.action.as_str());
        self.position = Value::Value(policy.position);
        self.redirect_pool_id = opt_string(policy.redirect_pool_id.clone());
        self.redirect_url = opt_string(policy.redirect_url.clone());
        self.redirect_prefix = opt_string(policy.redirect_prefix.clone());
        self.redirect_http_code = policy.redirect_http_code.into();
        apply_list(
            &mut self.tags,
            string_list(policy.tags.clone()).unwrap_or_default(),
        );
        self.rules = string_list(policy.rules.iter().map(|rule| rule.id.clone()));
        self.provisioning_status = opt_string(policy.provisioning_status.clone());
        self.operating_status = opt_string(policy.operating_status.clone());
    }
}

#[derive(Debug, Default, Clone)]
pub struct L7PolicyResource {
    client: ClientHandle,
}

impl L7PolicyResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for L7PolicyResource {
    type State<'a> = L7PolicyState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(L7PolicyState::schema())
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

        let Some(policy) = client
            .get_l7_policy(&location, &state.id)
            .await
            .report_found(diags, "Failed to read L7 policy")?
        else {
            warn!(id = %state.id, "L7 policy does not exist anymore");
            return None;
        };
        state.apply(&policy);
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
            [project_id, project_name, region_id, region_name, listener_id]
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

        let opts = state.opts();
        info!(listener_id = %opts.listener_id, action = %opts.action, "Creating L7 policy");
        let tasks = client
            .create_l7_policy(&location, &opts)
            .await
            .report(diags, "Failed to create L7 policy")?;
        let id = client
            .wait_for_created(&tasks, CREATED_KIND, TIMEOUT)
            .await
            .report(diags, "Failed to create L7 policy")?;
        let policy = client
            .get_l7_policy(&location, &id)
            .await
            .report(diags, "Failed to read created L7 policy")?;

        state.apply(&policy);
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

        info!(%id, "Replacing L7 policy");
        let tasks = client
            .replace_l7_policy(&location, &id, &state.opts())
            .await
            .report(diags, "Failed to update L7 policy")?;
        client
            .wait_for_tasks(&tasks, TIMEOUT)
            .await
            .report(diags, "Failed to update L7 policy")?;

        let policy = client
            .get_l7_policy(&location, &id)
            .await
            .report(diags, "Failed to read L7 policy")?;
        state.apply(&policy);
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

        info!(id = %state.id, "Deleting L7 policy");
        let result = client.delete_l7_policy(&location, &state.id).await;
        if let Some(tasks) = report_deleted(result, diags, "Failed to delete L7 policy")? {
            client
                .wait_for_tasks(&tasks, TIMEOUT)
                .await
                .report(diags, "Failed to delete L7 policy")?;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let import = parse_import_id(diags, &id, false)?;
        let mut state = L7PolicyState {
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

    fn policy<'a>(action: &'static str) -> L7PolicyState<'a> {
        L7PolicyState {
            project_id: Value::Value(1),
            region_id: Value::Value(1),
            listener_id: "l1".into(),
            action: action.into(),
            ..Default::default()
        }
    }

    fn errors(state: &L7PolicyState) -> Vec<AttributePath> {
        let mut diags = Diagnostics::default();
        state.validate(&mut diags);
        diags.errors.into_iter().map(|diag| diag.attribute).collect()
    }

    #[test]
    fn redirect_targets_match_the_action() {
        assert!(errors(&policy("REJECT")).is_empty());
        assert_eq!(
            errors(&policy("REDIRECT_TO_POOL")),
            vec![AttributePath::new("redirect_pool_id")]
        );
        assert_eq!(
            errors(&L7PolicyState {
                redirect_url: "https://example.com".into(),
                redirect_pool_id: "p1".into(),
                ..policy("REDIRECT_TO_URL")
            }),
            vec![AttributePath::new("redirect_pool_id")]
        );
        assert_eq!(
            errors(&L7PolicyState {
                redirect_pool_id: "p1".into(),
                redirect_http_code: Value::Value(301),
                ..policy("REDIRECT_TO_POOL")
            }),
            vec![AttributePath::new("redirect_http_code")]
        );
    }

    #[test]
    fn redirect_code_is_validated() {
        assert_eq!(
            errors(&L7PolicyState {
                redirect_prefix: "https://example.com/".into(),
                redirect_http_code: Value::Value(200),
                ..policy("REDIRECT_PREFIX")
            }),
            vec![AttributePath::new("redirect_http_code")]
        );
    }

    #[test]
    fn unused_targets_are_not_computed() {
        let mut state = policy("REDIRECT_TO_URL");
        state.normalize(&mut Diagnostics::default());
        assert!(state.redirect_http_code.is_unknown());
        assert!(state.redirect_pool_id.is_null());
        assert!(state.rules.is_unknown());
    }

    #[test]
    fn rules_are_flattened() {
        let policy: L7Policy = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "listener_id": "l1",
            "action": "REJECT",
            "position": 1,
            "rules": [{"id": "r1"}, {"id": "r2"}]
        }))
        .unwrap();
        let mut state = L7PolicyState::default();
        state.apply(&policy);
        assert_eq!(state.rules, Value::Value(vec![string("r1"), string("r2")]));
        assert!(state.tags.is_null());
        assert_eq!(state.position, Value::Value(1));
    }
}
