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

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use edgecenter_client::cloud::Metadata;
use serde::{Deserialize, Serialize};
use tf_provider::map;
use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType, Description};
use tf_provider::value::{Value, ValueBool, ValueList, ValueMap, ValueString};

use crate::attributes::map_of;
use crate::utils::{known_map, string};

/// Metadata item as returned by the API, including the read-only ones
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct MetadataItem<'a> {
    #[serde(borrow = "'a")]
    pub key: ValueString<'a>,
    pub value: ValueString<'a>,
    pub read_only: ValueBool,
}

pub type MetadataMap<'a> = ValueMap<'a, ValueString<'a>>;
pub type MetadataReadOnly<'a> = ValueList<Value<MetadataItem<'a>>>;

/// `metadata_map` and `metadata_read_only` attributes
pub(crate) fn metadata_attributes() -> HashMap<String, Attribute> {
    map! {
        "metadata_map" => Attribute {
            attr_type: map_of(AttributeType::String),
            description: Description::plain("User metadata of the object"),
            constraint: AttributeConstraint::Optional,
            ..Default::default()
        },
        "metadata_read_only" => Attribute {
            attr_type: AttributeType::AttributeList(map! {
                "key" => Attribute {
                    attr_type: AttributeType::String,
                    constraint: AttributeConstraint::Computed,
                    ..Default::default()
                },
                "value" => Attribute {
                    attr_type: AttributeType::String,
                    constraint: AttributeConstraint::Computed,
                    ..Default::default()
                },
                "read_only" => Attribute {
                    attr_type: AttributeType::Bool,
                    constraint: AttributeConstraint::Computed,
                    ..Default::default()
                },
            }),
            description: Description::plain("Metadata of the object, including the items set by the platform"),
            constraint: AttributeConstraint::Computed,
            ..Default::default()
        },
    }
}

/// Same as [`metadata_attributes`], with `metadata_map` computed for data sources
pub(crate) fn computed_metadata_attributes() -> HashMap<String, Attribute> {
    let mut attributes = metadata_attributes();
    if let Some(metadata_map) = attributes.get_mut("metadata_map") {
        metadata_map.constraint = AttributeConstraint::Computed;
    }
    attributes
}

/// Metadata to send to the API
pub(crate) fn expand_metadata(metadata_map: &MetadataMap<'_>) -> BTreeMap<String, String> {
    known_map(metadata_map)
}

/// Split the metadata of an object into user items and the full read-only listing
pub(crate) fn flatten_metadata<'a>(metadata: &[Metadata]) -> (MetadataMap<'a>, MetadataReadOnly<'a>) {
    let user = metadata
        .iter()
        .filter(|item| !item.read_only)
        .map(|item| (Cow::Owned(item.key.clone()), string(item.value.as_str())))
        .collect::<BTreeMap<_, _>>();
    let all = metadata
        .iter()
        .map(|item| {
            Value::Value(MetadataItem {
                key: string(item.key.as_str()),
                value: string(item.value.as_str()),
                read_only: Value::Value(item.read_only),
            })
        })
        .collect();

    let user = if user.is_empty() {
        Value::Null
    } else {
        Value::Value(user)
    };
    (user, Value::Value(all))
}

/// Store the metadata of an object into a state
pub(crate) fn apply_metadata<'a>(
    metadata_map: &mut MetadataMap<'a>,
    metadata_read_only: &mut MetadataReadOnly<'a>,
    metadata: &[Metadata],
) {
    let (user, all) = flatten_metadata(metadata);
    // An empty map in the configuration is kept as is
    let keep_empty = user.is_null() && matches!(metadata_map, Value::Value(map) if map.is_empty());
    if !keep_empty {
        *metadata_map = user;
    }
    *metadata_read_only = all;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(key: &str, value: &str, read_only: bool) -> Metadata {
        Metadata {
            key: key.to_owned(),
            value: value.to_owned(),
            read_only,
        }
    }

    #[test]
    fn read_only_items_stay_out_of_the_map() {
        let (map, all) = flatten_metadata(&[
            item("env", "prod", false),
            item("task_id", "abc", true),
        ]);
        let map = map.unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("env"), Some(&string("prod")));

        let all = all.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all
            .iter()
            .any(|item| item.as_ref().unwrap().read_only == Value::Value(true)));
    }

    #[test]
    fn no_user_metadata_is_null() {
        let (map, all) = flatten_metadata(&[item("task_id", "abc", true)]);
        assert!(map.is_null());
        assert_eq!(all.unwrap().len(), 1);

        let (map, all) = flatten_metadata(&[]);
        assert!(map.is_null());
        assert_eq!(all, Value::Value(vec![]));
    }

    #[test]
    fn empty_configured_map_is_kept() {
        let mut map: MetadataMap = Value::Value(Default::default());
        let mut read_only = Value::Unknown;
        apply_metadata(&mut map, &mut read_only, &[]);
        assert_eq!(map, Value::Value(Default::default()));
        assert_eq!(read_only, Value::Value(vec![]));

        let mut map: MetadataMap = Value::Null;
        apply_metadata(&mut map, &mut read_only, &[item("env", "prod", false)]);
        assert_eq!(map.unwrap().len(), 1);
    }

    #[test]
    fn expand_skips_unknown_values() {
        let metadata: MetadataMap = Value::Value(
            [
                (Cow::Borrowed("a"), string("1")),
                (Cow::Borrowed("b"), Value::Unknown),
            ]
            .into_iter()
            .collect(),
        );
        let expanded = expand_metadata(&metadata);
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded["a"], "1");
    }
}
