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

use edgecenter_client::{Client, Location};
use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType, Description};
use tf_provider::value::{Value, ValueNumber, ValueString};
use tf_provider::{AttributePath, Diagnostics};
use tracing::debug;

use crate::lookup::find_by_name;
use crate::utils::{known, ReportError};

/// Project and region attributes as found in a state
pub(crate) struct LocationValues<'s> {
    pub project_id: &'s ValueNumber,
    pub project_name: &'s ValueString<'s>,
    pub region_id: &'s ValueNumber,
    pub region_name: &'s ValueString<'s>,
}

/// State holding the `project_*` and `region_*` attributes
pub(crate) trait WithLocation {
    fn location_values(&self) -> LocationValues<'_>;
    fn set_location(&mut self, location: &Location);

    /// Location once both IDs are known
    fn location(&self) -> Option<Location> {
        let values = self.location_values();
        match (values.project_id, values.region_id) {
            (Value::Value(project_id), Value::Value(region_id)) => {
                Some(Location::new(*project_id, *region_id))
            }
            _ => None,
        }
    }
}

macro_rules! impl_location {
    ($state:ident) => {
        impl<'a> $crate::location::WithLocation for $state<'a> {
            fn location_values(&self) -> $crate::location::LocationValues<'_> {
                $crate::location::LocationValues {
                    project_id: &self.project_id,
                    project_name: &self.project_name,
                    region_id: &self.region_id,
                    region_name: &self.region_name,
                }
            }
            fn set_location(&mut self, location: &edgecenter_client::Location) {
                self.project_id = tf_provider::value::Value::Value(location.project_id);
                self.region_id = tf_provider::value::Value::Value(location.region_id);
            }
        }
    };
}

pub(crate) use impl_location;

/// Check that exactly one of `<id>` and `<name>` is set
pub(crate) fn exactly_one_of<T, U>(
    diags: &mut Diagnostics,
    id_name: &'static str,
    id: &Value<T>,
    name_name: &'static str,
    name: &Value<U>,
) {
    match (id.is_null(), name.is_null()) {
        (true, true) => diags.error(
            format!("Missing {id_name}"),
            format!("One of `{id_name}` or `{name_name}` must be set"),
            AttributePath::new(id_name),
        ),
        (false, false) => diags.error(
            format!("Conflicting {id_name}"),
            format!("Only one of `{id_name}` or `{name_name}` can be set"),
            AttributePath::new(name_name),
        ),
        _ => (),
    }
}

pub(crate) fn validate_location<S: WithLocation>(diags: &mut Diagnostics, state: &S) {
    let values = state.location_values();
    exactly_one_of(
        diags,
        "project_id",
        values.project_id,
        "project_name",
        values.project_name,
    );
    exactly_one_of(
        diags,
        "region_id",
        values.region_id,
        "region_name",
        values.region_name,
    );
}

/// Location of a state that has already been created or imported
pub(crate) fn known_location<S: WithLocation>(diags: &mut Diagnostics, state: &S) -> Option<Location> {
    let location = state.location();
    if location.is_none() {
        diags.root_error_short("Project and region of the resource are unknown");
    }
    location
}

/// Resolve a project given either its ID or its name
pub(crate) async fn resolve_project(
    diags: &mut Diagnostics,
    client: &Client,
    project_id: &ValueNumber,
    project_name: &ValueString<'_>,
) -> Option<i64> {
    if let Value::Value(id) = project_id {
        return Some(*id);
    }
    let Some(name) = known(project_name) else {
        diags.error_short("Project is unknown", AttributePath::new("project_id"));
        return None;
    };
    let projects = client
        .list_projects()
        .await
        .report(diags, "Failed to list projects")?;
    let project = find_by_name(diags, "project", &name, projects, |p| &p.name)?;
    debug!(project_id = project.id, %name, "Resolved project");
    Some(project.id)
}

/// Resolve a region given either its ID or its display name
pub(crate) async fn resolve_region(
    diags: &mut Diagnostics,
    client: &Client,
    region_id: &ValueNumber,
    region_name: &ValueString<'_>,
) -> Option<i64> {
    if let Value::Value(id) = region_id {
        return Some(*id);
    }
    let Some(name) = known(region_name) else {
        diags.error_short("Region is unknown", AttributePath::new("region_id"));
        return None;
    };
    let regions = client
        .list_regions()
        .await
        .report(diags, "Failed to list regions")?;
    let region = find_by_name(diags, "region", &name, regions, |r| &r.display_name)?;
    debug!(region_id = region.id, %name, "Resolved region");
    Some(region.id)
}

/// Resolve the location of a state, and store the resolved IDs into it
pub(crate) async fn resolve_location<S: WithLocation>(
    diags: &mut Diagnostics,
    client: &Client,
    state: &mut S,
) -> Option<Location> {
    if let Some(location) = state.location() {
        return Some(location);
    }
    let values = state.location_values();
    let project_id = resolve_project(diags, client, values.project_id, values.project_name).await;
    let region_id = resolve_region(diags, client, values.region_id, values.region_name).await;
    let location = Location::new(project_id?, region_id?);
    state.set_location(&location);
    Some(location)
}

/// Mark the location IDs as computed when only names are given
pub(crate) fn plan_location<T>(project_id: &mut Value<T>, region_id: &mut Value<T>) {
    if project_id.is_null() {
        *project_id = Value::Unknown;
    }
    if region_id.is_null() {
        *region_id = Value::Unknown;
    }
}

pub(crate) fn project_attributes() -> HashMap<String, Attribute> {
    [
        (
            "project_id",
            Attribute {
                attr_type: AttributeType::Number,
                description: Description::plain("ID of the project"),
                constraint: AttributeConstraint::OptionalComputed,
                ..Default::default()
            },
        ),
        (
            "project_name",
            Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Name of the project, instead of its ID"),
                constraint: AttributeConstraint::Optional,
                ..Default::default()
            },
        ),
    ]
    .into_iter()
    .map(|(name, attr)| (name.to_owned(), attr))
    .collect()
}

/// Schema attributes shared by every regional object
pub(crate) fn location_attributes() -> HashMap<String, Attribute> {
    let mut attributes = project_attributes();
    attributes.insert(
        "region_id".to_owned(),
        Attribute {
            attr_type: AttributeType::Number,
            description: Description::plain("ID of the region"),
            constraint: AttributeConstraint::OptionalComputed,
            ..Default::default()
        },
    );
    attributes.insert(
        "region_name".to_owned(),
        Attribute {
            attr_type: AttributeType::String,
            description: Description::plain("Display name of the region, instead of its ID"),
            constraint: AttributeConstraint::Optional,
            ..Default::default()
        },
    );
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct State<'a> {
        project_id: ValueNumber,
        project_name: ValueString<'a>,
        region_id: ValueNumber,
        region_name: ValueString<'a>,
    }

    impl_location!(State);

    #[test]
    fn location_needs_one_of_id_or_name() {
        let mut diags = Diagnostics::default();
        validate_location(&mut diags, &State::default());
        assert_eq!(diags.errors.len(), 2);

        let mut diags = Diagnostics::default();
        let state = State {
            project_id: Value::Value(1),
            project_name: "demo".into(),
            region_name: "Luxembourg".into(),
            ..Default::default()
        };
        validate_location(&mut diags, &state);
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(diags.errors[0].summary, "Conflicting project_id");
    }

    #[test]
    fn location_is_known_with_both_ids() {
        let mut state = State {
            project_id: Value::Value(1),
            region_name: "Luxembourg".into(),
            ..Default::default()
        };
        assert_eq!(state.location(), None);
        state.set_location(&Location::new(1, 8));
        assert_eq!(state.location(), Some(Location::new(1, 8)));
    }

    #[test]
    fn location_schema_has_ids_and_names() {
        let attributes = location_attributes();
        for name in ["project_id", "project_name", "region_id", "region_name"] {
            assert!(attributes.contains_key(name), "missing {name}");
        }
    }
}
