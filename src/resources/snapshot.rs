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
use std::time::Duration;

use async_trait::async_trait;
use edgecenter_client::cloud::snapshot::{self, CreateSnapshot, Snapshot};
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint::*, AttributeType, Schema};
use tf_provider::value::{Value, ValueEmpty, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Resource};
use tracing::{info, warn};

use crate::attributes::{attribute, resource_attributes, schema};
use crate::import::parse_import_id;
use crate::location::{
    impl_location, known_location, plan_location, resolve_location, validate_location, WithLocation,
};
use crate::metadata::{
    apply_metadata, expand_metadata, metadata_attributes, MetadataMap, MetadataReadOnly,
};
use crate::provider::ClientHandle;
use crate::utils::{
    check, computed, known_non_empty, non_empty_string, now, opt_string, report_deleted,
    requires_replace, string, ReportError, WithNormalize, WithSchema,
};

const TIMEOUT: Duration = Duration::from_secs(1200);

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SnapshotState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub name: ValueString<'a>,
    pub volume_id: ValueString<'a>,
    pub description: ValueString<'a>,
    pub size: ValueNumber,
    pub status: ValueString<'a>,
    pub metadata_map: MetadataMap<'a>,
    pub metadata_read_only: MetadataReadOnly<'a>,
    pub last_updated: ValueString<'a>,
}

impl_location!(SnapshotState);

impl<'a> WithSchema for SnapshotState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "name" => attribute(AttributeType::String, Required, "Name of the snapshot"),
            "volume_id" => attribute(AttributeType::String, Required, "ID of the snapshotted volume"),
            "description" => attribute(AttributeType::String, Optional, "Description of the snapshot"),
            "size" => attribute(AttributeType::Number, Computed, "Size of the snapshot in GiB"),
            "status" => attribute(AttributeType::String, Computed, "Status of the snapshot"),
        };
        attributes.extend(resource_attributes("ID of the snapshot"));
        attributes.extend(metadata_attributes());
        schema("EdgeCenter volume snapshot", attributes, Default::default())
    }
}

impl<'a> WithNormalize for SnapshotState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        computed(&mut self.size);
        computed(&mut self.status);
        computed(&mut self.metadata_read_only);
    }
}

impl<'a> SnapshotState<'a> {
    fn apply(&mut self, snapshot: &Snapshot) {
        self.id = string(snapshot.id.as_str());
        self.name = string(snapshot.name.as_str());
        self.volume_id = string(snapshot.volume_id.as_str());
        self.description = non_empty_string(snapshot.description.clone());
        self.size = Value::Value(snapshot.size);
        self.status = opt_string(snapshot.status.clone());
        apply_metadata(
            &mut self.metadata_map,
            &mut self.metadata_read_only,
            &snapshot.metadata,
        );
    }
}

#[derive(Debug, Default, Clone)]
pub struct SnapshotResource {
    client: ClientHandle,
}

impl SnapshotResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for SnapshotResource {
    type State<'a> = SnapshotState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(SnapshotState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        validate_location(diags, &config);
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

        let Some(snapshot) = client
            .get_snapshot(&location, &state.id)
            .await
            .report_found(diags, "Failed to read snapshot")?
        else {
            warn!(id = %state.id, "Snapshot does not exist anymore");
            return None;
        };
        state.apply(&snapshot);
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
            [project_id, project_name, region_id, region_name, volume_id, description]
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

        let opts = CreateSnapshot {
            volume_id: state.volume_id.to_string(),
            name: state.name.to_string(),
            description: known_non_empty(&state.description),
            metadata: expand_metadata(&state.metadata_map),
        };
        info!(volume_id = %opts.volume_id, name = %opts.name, "Creating snapshot");
        let tasks = client
            .create_snapshot(&location, &opts)
            .await
            .report(diags, "Failed to create snapshot")?;
        let id = client
            .wait_for_created(&tasks, snapshot::KIND, TIMEOUT)
            .await
            .report(diags, "Failed to create snapshot")?;
        let snapshot = client
            .get_snapshot(&location, &id)
            .await
            .report(diags, "Failed to read created snapshot")?;

        state.apply(&snapshot);
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

        if state.name != prior_state.name {
            info!(%id, name = %state.name, "Renaming snapshot");
            client
                .rename_snapshot(&location, &id, &state.name)
                .await
                .report(diags, "Failed to rename snapshot")?;
        }
        if state.metadata_map != prior_state.metadata_map {
            client
                .replace_metadata(&location, snapshot::KIND, &id, &expand_metadata(&state.metadata_map))
                .await
                .report(diags, "Failed to update snapshot metadata")?;
        }

        let snapshot = client
            .get_snapshot(&location, &id)
            .await
            .report(diags, "Failed to read snapshot")?;
        state.apply(&snapshot);
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

        info!(id = %state.id, "Deleting snapshot");
        let result = client.delete_snapshot(&location, &state.id).await;
        if let Some(tasks) = report_deleted(result, diags, "Failed to delete snapshot")? {
            client
                .wait_for_tasks(&tasks, TIMEOUT)
                .await
                .report(diags, "Failed to delete snapshot")?;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let import = parse_import_id(diags, &id, false)?;
        let mut state = SnapshotState {
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

    #[test]
    fn empty_description_is_null() {
        let snapshot: Snapshot = serde_json::from_value(serde_json::json!({
            "id": "sn1",
            "name": "backup",
            "volume_id": "v1",
            "description": "",
            "size": 10,
            "status": "available"
        }))
        .unwrap();
        let mut state = SnapshotState::default();
        state.apply(&snapshot);
        assert!(state.description.is_null());
        assert_eq!(state.size, Value::Value(10));
        assert_eq!(state.volume_id, string("v1"));
    }
}
