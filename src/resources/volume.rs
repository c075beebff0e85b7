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
use edgecenter_client::cloud::volume::{self, CreateVolume, Volume};
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
    check, computed, known, now, opt_string, report_deleted, requires_replace, string, ReportError,
    WithNormalize, WithSchema,
};
use crate::validate::{conflicts_if, in_range, one_of, required_if};

const TIMEOUT: Duration = Duration::from_secs(1200);
const SOURCES: &[&str] = &["new-volume", "image", "snapshot"];
const VOLUME_TYPES: &[&str] = &["standard", "ssd_hiiops", "cold", "ultra"];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct VolumeState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub name: ValueString<'a>,
    pub source: ValueString<'a>,
    pub image_id: ValueString<'a>,
    pub snapshot_id: ValueString<'a>,
    pub size: ValueNumber,
    pub type_name: ValueString<'a>,
    pub status: ValueString<'a>,
    pub metadata_map: MetadataMap<'a>,
    pub metadata_read_only: MetadataReadOnly<'a>,
    pub last_updated: ValueString<'a>,
}

impl_location!(VolumeState);

impl<'a> WithSchema for VolumeState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "name" => attribute(AttributeType::String, Required, "Name of the volume"),
            "source" => attribute(
                AttributeType::String,
                Required,
                "Source of the volume: `new-volume`, `image` or `snapshot`",
            ),
            "image_id" => attribute(AttributeType::String, Optional, "ID of the source image, for `image`"),
            "snapshot_id" => attribute(AttributeType::String, Optional, "ID of the source snapshot, for `snapshot`"),
            "size" => attribute(
                AttributeType::Number,
                OptionalComputed,
                "Size of the volume in GiB, required for `new-volume`; can only grow",
            ),
            "type_name" => attribute(
                AttributeType::String,
                OptionalComputed,
                "Type of the volume: `standard`, `ssd_hiiops`, `cold` or `ultra`",
            ),
            "status" => attribute(AttributeType::String, Computed, "Status of the volume"),
        };
        attributes.extend(resource_attributes("ID of the volume"));
        attributes.extend(metadata_attributes());
        schema("EdgeCenter volume", attributes, Default::default())
    }
}

impl<'a> WithNormalize for VolumeState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        computed(&mut self.size);
        computed(&mut self.type_name);
        computed(&mut self.status);
        computed(&mut self.metadata_read_only);
    }
}

impl<'a> VolumeState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        validate_location(diags, self);
        one_of(diags, AttributePath::new("source"), &self.source, SOURCES);
        one_of(diags, AttributePath::new("type_name"), &self.type_name, VOLUME_TYPES);
        in_range(diags, AttributePath::new("size"), &self.size, 1, i64::MAX);

        let source = self.source.as_deref_option();
        required_if(
            diags,
            AttributePath::new("size"),
            &self.size,
            source == Some("new-volume"),
            "for a `new-volume` volume",
        );
        required_if(
            diags,
            AttributePath::new("image_id"),
            &self.image_id,
            source == Some("image"),
            "for an `image` volume",
        );
        conflicts_if(
            diags,
            AttributePath::new("image_id"),
            &self.image_id,
            source.is_some() && source != Some("image"),
            "when the source is not `image`",
        );
        required_if(
            diags,
            AttributePath::new("snapshot_id"),
            &self.snapshot_id,
            source == Some("snapshot"),
            "for a `snapshot` volume",
        );
        conflicts_if(
            diags,
            AttributePath::new("snapshot_id"),
            &self.snapshot_id,
            source.is_some() && source != Some("snapshot"),
            "when the source is not `snapshot`",
        );
    }

    fn apply(&mut self, volume: &Volume) {
        self.id = string(volume.id.as_str());
        self.name = string(volume.name.as_str());
        self.size = Value::Value(volume.size);
        self.type_name = opt_string(volume.volume_type.clone());
        self.status = opt_string(volume.status.clone());
        if self.source.is_null() {
            self.apply_source(volume);
        }
        apply_metadata(
            &mut self.metadata_map,
            &mut self.metadata_read_only,
            &volume.metadata,
        );
    }

    /// Recover the source of an imported volume
    fn apply_source(&mut self, volume: &Volume) {
        let image_id = volume
            .volume_image_metadata
            .as_ref()
            .and_then(|metadata| metadata.image_id.clone());
        if let Some(snapshot_id) = &volume.snapshot_id {
            self.source = string("snapshot");
            self.snapshot_id = string(snapshot_id.as_str());
        } else if let Some(image_id) = image_id {
            self.source = string("image");
            self.image_id = string(image_id);
        } else {
            self.source = string("new-volume");
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct VolumeResource {
    client: ClientHandle,
}

impl VolumeResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for VolumeResource {
    type State<'a> = VolumeState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(VolumeState::schema())
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

        let Some(volume) = client
            .get_volume(&location, &state.id)
            .await
            .report_found(diags, "Failed to read volume")?
        else {
            warn!(id = %state.id, "Volume does not exist anymore");
            return None;
        };
        state.apply(&volume);
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

        if let (Value::Value(size), Value::Value(prior_size)) = (state.size, prior_state.size) {
            if size < prior_size {
                diags.error(
                    "Volume cannot shrink",
                    format!("Size can only grow: {prior_size} GiB to {size} GiB requested"),
                    AttributePath::new("size"),
                );
                return None;
            }
        }

        let trigger_replace = requires_replace!(
            prior_state,
            state,
            [project_id, project_name, region_id, region_name, source, image_id, snapshot_id]
        );
        if state.type_name != prior_state.type_name {
            state.status = Value::Unknown;
        }
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

        let opts = CreateVolume {
            source: state.source.to_string(),
            name: state.name.to_string(),
            size: state.size.as_option(),
            type_name: known(&state.type_name),
            image_id: known(&state.image_id),
            snapshot_id: known(&state.snapshot_id),
            metadata: expand_metadata(&state.metadata_map),
        };
        info!(source = %opts.source, name = %opts.name, "Creating volume");
        let tasks = client
            .create_volume(&location, &opts)
            .await
            .report(diags, "Failed to create volume")?;
        let id = client
            .wait_for_created(&tasks, volume::KIND, TIMEOUT)
            .await
            .report(diags, "Failed to create volume")?;
        let volume = client
            .get_volume(&location, &id)
            .await
            .report(diags, "Failed to read created volume")?;

        state.apply(&volume);
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
            info!(%id, name = %state.name, "Renaming volume");
            client
                .rename_volume(&location, &id, &state.name)
                .await
                .report(diags, "Failed to rename volume")?;
        }
        if let Value::Value(size) = state.size {
            if state.size != prior_state.size {
                info!(%id, size, "Extending volume");
                let tasks = client
                    .extend_volume(&location, &id, size)
                    .await
                    .report(diags, "Failed to extend volume")?;
                client
                    .wait_for_tasks(&tasks, TIMEOUT)
                    .await
                    .report(diags, "Failed to extend volume")?;
            }
        }
        if let Some(type_name) = known(&state.type_name) {
            if state.type_name != prior_state.type_name {
                info!(%id, %type_name, "Changing volume type");
                client
                    .retype_volume(&location, &id, &type_name)
                    .await
                    .report(diags, "Failed to change volume type")?;
            }
        }
        if state.metadata_map != prior_state.metadata_map {
            client
                .replace_metadata(&location, volume::KIND, &id, &expand_metadata(&state.metadata_map))
                .await
                .report(diags, "Failed to update volume metadata")?;
        }

        let volume = client
            .get_volume(&location, &id)
            .await
            .report(diags, "Failed to read volume")?;
        state.apply(&volume);
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

        info!(id = %state.id, "Deleting volume");
        let result = client.delete_volume(&location, &state.id).await;
        if let Some(tasks) = report_deleted(result, diags, "Failed to delete volume")? {
            client
                .wait_for_tasks(&tasks, TIMEOUT)
                .await
                .report(diags, "Failed to delete volume")?;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let import = parse_import_id(diags, &id, false)?;
        // Source is recovered on read
        let mut state = VolumeState {
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

    fn volume(source: &str) -> VolumeState<'_> {
        VolumeState {
            project_id: Value::Value(1),
            region_id: Value::Value(1),
            source: source.into(),
            ..Default::default()
        }
    }

    fn errors(state: &VolumeState) -> Vec<AttributePath> {
        let mut diags = Diagnostics::default();
        state.validate(&mut diags);
        diags.errors.into_iter().map(|diag| diag.attribute).collect()
    }

    #[test]
    fn source_drives_required_attributes() {
        assert_eq!(errors(&volume("new-volume")), vec![AttributePath::new("size")]);
        assert_eq!(errors(&volume("image")), vec![AttributePath::new("image_id")]);
        assert_eq!(
            errors(&VolumeState {
                image_id: "i1".into(),
                ..volume("snapshot")
            }),
            vec![AttributePath::new("image_id"), AttributePath::new("snapshot_id")]
        );
        assert!(errors(&VolumeState {
            size: Value::Value(10),
            type_name: "ssd_hiiops".into(),
            ..volume("new-volume")
        })
        .is_empty());
    }

    #[test]
    fn unknown_volume_type_is_rejected() {
        assert_eq!(
            errors(&VolumeState {
                size: Value::Value(10),
                type_name: "nvme".into(),
                ..volume("new-volume")
            }),
            vec![AttributePath::new("type_name")]
        );
    }

    #[test]
    fn imported_volume_source_is_recovered() {
        let remote = |extra: serde_json::Value| -> Volume {
            let mut json = serde_json::json!({"id": "v1", "name": "data", "size": 10});
            if let (Some(json), Some(extra)) = (json.as_object_mut(), extra.as_object()) {
                json.extend(extra.clone());
            }
            serde_json::from_value(json).unwrap()
        };

        let mut state = VolumeState::default();
        state.apply(&remote(serde_json::json!({})));
        assert_eq!(state.source, string("new-volume"));

        let mut state = VolumeState::default();
        state.apply(&remote(serde_json::json!({
            "snapshot_id": "s1",
            "volume_image_metadata": {"image_id": "i1"}
        })));
        assert_eq!(state.source, string("snapshot"));
        assert_eq!(state.snapshot_id, string("s1"));
        assert!(state.image_id.is_null());

        // Configured source is never overwritten
        let mut state = VolumeState {
            image_id: "i2".into(),
            ..volume("image")
        };
        state.apply(&remote(serde_json::json!({"volume_image_metadata": {"image_id": "i1"}})));
        assert_eq!(state.source, string("image"));
        assert_eq!(state.image_id, string("i2"));
    }
}
