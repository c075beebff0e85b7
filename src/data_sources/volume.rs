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
use edgecenter_client::cloud::snapshot::Snapshot;
use edgecenter_client::cloud::volume::Volume;
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint::*, AttributeType, Schema};
use tf_provider::value::{Value, ValueBool, ValueEmpty, ValueList, ValueNumber, ValueString};
use tf_provider::{map, DataSource, Diagnostics};

use super::{computed_attribute, computed_objects, selector_attributes};
use crate::attributes::{attribute, list_of, schema};
use crate::location::{impl_location, resolve_location, validate_location};
use crate::lookup::{find_by_name, validate_selector, Selector};
use crate::metadata::{apply_metadata, computed_metadata_attributes, MetadataMap, MetadataReadOnly};
use crate::provider::ClientHandle;
use crate::utils::{check, known, opt_string, string, string_list, ReportError, WithSchema};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct AttachmentState<'a> {
    #[serde(borrow = "'a")]
    pub server_id: ValueString<'a>,
    pub device: ValueString<'a>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct VolumeDataSourceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub name: ValueString<'a>,
    pub size: ValueNumber,
    pub type_name: ValueString<'a>,
    pub status: ValueString<'a>,
    pub bootable: ValueBool,
    pub snapshot_ids: ValueList<ValueString<'a>>,
    pub attachments: ValueList<Value<AttachmentState<'a>>>,
    pub created_at: ValueString<'a>,
    pub metadata_map: MetadataMap<'a>,
    pub metadata_read_only: MetadataReadOnly<'a>,
}

impl_location!(VolumeDataSourceState);

impl<'a> WithSchema for VolumeDataSourceState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "size" => computed_attribute(AttributeType::Number, "Size of the volume in GiB"),
            "type_name" => computed_attribute(AttributeType::String, "Storage type of the volume"),
            "status" => computed_attribute(AttributeType::String, "Status of the volume"),
            "bootable" => computed_attribute(AttributeType::Bool, "Whether the volume is bootable"),
            "snapshot_ids" => computed_attribute(list_of(AttributeType::String), "Snapshots of the volume"),
            "attachments" => computed_objects(
                map! {
                    "server_id" => computed_attribute(AttributeType::String, "Server the volume is attached to"),
                    "device" => computed_attribute(AttributeType::String, "Device of the attachment"),
                },
                "Servers the volume is attached to",
            ),
            "created_at" => computed_attribute(AttributeType::String, "Creation date"),
        };
        attributes.extend(selector_attributes("name", "volume"));
        attributes.extend(computed_metadata_attributes());
        schema("EdgeCenter volume", attributes, Default::default())
    }
}

impl<'a> VolumeDataSourceState<'a> {
    fn apply(&mut self, volume: &Volume) {
        self.id = string(volume.id.as_str());
        self.name = string(volume.name.as_str());
        self.size = Value::Value(volume.size);
        self.type_name = opt_string(volume.volume_type.clone());
        self.status = opt_string(volume.status.clone());
        self.bootable = Value::Value(volume.bootable);
        self.snapshot_ids = string_list(volume.snapshot_ids.clone());
        self.attachments = Value::Value(
            volume
                .attachments
                .iter()
                .map(|attachment| {
                    Value::Value(AttachmentState {
                        server_id: opt_string(attachment.server_id.clone()),
                        device: opt_string(attachment.device.clone()),
                    })
                })
                .collect(),
        );
        self.created_at = opt_string(volume.created_at.clone());
        apply_metadata(&mut self.metadata_map, &mut self.metadata_read_only, &volume.metadata);
    }
}

#[derive(Debug, Default, Clone)]
pub struct VolumeDataSource {
    client: ClientHandle,
}

impl VolumeDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for VolumeDataSource {
    type State<'a> = VolumeDataSourceState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(VolumeDataSourceState::schema())
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

        let volume = match Selector::from_config(diags, &state.id, "name", &state.name)? {
            Selector::Id(id) => client
                .get_volume(&location, &id)
                .await
                .report(diags, "Failed to read volume")?,
            Selector::Name(name) => {
                let volumes = client
                    .list_volumes(&location)
                    .await
                    .report(diags, "Failed to list volumes")?;
                find_by_name(diags, "volume", &name, volumes, |v| &v.name)?
            }
        };
        state.apply(&volume);
        Some(state)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SnapshotDataSourceState<'a> {
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
    pub created_at: ValueString<'a>,
    pub metadata_map: MetadataMap<'a>,
    pub metadata_read_only: MetadataReadOnly<'a>,
}

impl_location!(SnapshotDataSourceState);

impl<'a> WithSchema for SnapshotDataSourceState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "volume_id" => attribute(
                AttributeType::String,
                OptionalComputed,
                "Volume of the snapshot, restricting the search by name",
            ),
            "description" => computed_attribute(AttributeType::String, "Description of the snapshot"),
            "size" => computed_attribute(AttributeType::Number, "Size of the snapshot in GiB"),
            "status" => computed_attribute(AttributeType::String, "Status of the snapshot"),
            "created_at" => computed_attribute(AttributeType::String, "Creation date"),
        };
        attributes.extend(selector_attributes("name", "snapshot"));
        attributes.extend(computed_metadata_attributes());
        schema("EdgeCenter volume snapshot", attributes, Default::default())
    }
}

impl<'a> SnapshotDataSourceState<'a> {
    fn apply(&mut self, snapshot: &Snapshot) {
        self.id = string(snapshot.id.as_str());
        self.name = string(snapshot.name.as_str());
        self.volume_id = string(snapshot.volume_id.as_str());
        self.description = opt_string(snapshot.description.clone());
        self.size = Value::Value(snapshot.size);
        self.status = opt_string(snapshot.status.clone());
        self.created_at = opt_string(snapshot.created_at.clone());
        apply_metadata(&mut self.metadata_map, &mut self.metadata_read_only, &snapshot.metadata);
    }
}

#[derive(Debug, Default, Clone)]
pub struct SnapshotDataSource {
    client: ClientHandle,
}

impl SnapshotDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for SnapshotDataSource {
    type State<'a> = SnapshotDataSourceState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(SnapshotDataSourceState::schema())
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

        let snapshot = match Selector::from_config(diags, &state.id, "name", &state.name)? {
            Selector::Id(id) => client
                .get_snapshot(&location, &id)
                .await
                .report(diags, "Failed to read snapshot")?,
            Selector::Name(name) => {
                let volume_id = known(&state.volume_id);
                let snapshots = client
                    .list_snapshots(&location, volume_id.as_deref())
                    .await
                    .report(diags, "Failed to list snapshots")?;
                find_by_name(diags, "snapshot", &name, snapshots, |s| &s.name)?
            }
        };
        state.apply(&snapshot);
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_attachments_are_flattened() {
        let volume: Volume = serde_json::from_value(serde_json::json!({
            "id": "v1",
            "name": "data",
            "size": 20,
            "volume_type": "ssd_hiiops",
            "bootable": false,
            "attachments": [{"server_id": "s1", "device": "/dev/vdb"}],
            "snapshot_ids": ["snap1"]
        }))
        .unwrap();
        let mut state = VolumeDataSourceState::default();
        state.apply(&volume);
        assert_eq!(state.type_name, string("ssd_hiiops"));
        assert_eq!(state.size, Value::Value(20));
        let attachments = state.attachments.unwrap();
        assert_eq!(
            attachments[0].as_ref_option().map(|a| a.device.clone()),
            Some(string("/dev/vdb"))
        );
        assert_eq!(state.snapshot_ids.unwrap().len(), 1);
        assert!(state.metadata_map.is_null());
    }
}
