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

use edgecenter_client::cloud::HostRoute;
use serde::{Deserialize, Serialize};
use tf_provider::map;
use tf_provider::schema::{AttributeConstraint::Required, AttributeType, NestedBlock};
use tf_provider::value::{Value, ValueList, ValueString};
use tf_provider::{AttributePath, Diagnostics};

use crate::attributes::{attribute, block};
use crate::utils::{known, string};
use crate::validate;

/// Static route: `destination` is reached through `nexthop`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct HostRouteState<'a> {
    #[serde(borrow = "'a")]
    pub destination: ValueString<'a>,
    pub nexthop: ValueString<'a>,
}

pub type HostRoutes<'a> = ValueList<Value<HostRouteState<'a>>>;

pub(crate) fn host_routes_block(description: &str) -> NestedBlock {
    NestedBlock::List(block(
        description,
        map! {
            "destination" => attribute(AttributeType::String, Required, "CIDR of the destination"),
            "nexthop" => attribute(AttributeType::String, Required, "IP address of the next hop"),
        },
    ))
}

pub(crate) fn validate_host_routes(diags: &mut Diagnostics, name: &'static str, routes: &HostRoutes<'_>) {
    for (i, route) in routes.iter().flatten().enumerate() {
        if let Value::Value(route) = route {
            let path = AttributePath::new(name).index(i as i64);
            validate::cidr(diags, path.clone().attribute("destination"), &route.destination);
            validate::ip(diags, path.attribute("nexthop"), &route.nexthop);
        }
    }
}

pub(crate) fn expand_host_routes(routes: &HostRoutes<'_>) -> Vec<HostRoute> {
    routes
        .iter()
        .flatten()
        .filter_map(|route| route.as_ref_option())
        .filter_map(|route| {
            Some(HostRoute {
                destination: known(&route.destination)?,
                nexthop: known(&route.nexthop)?,
            })
        })
        .collect()
}

pub(crate) fn flatten_host_routes<'a>(routes: &[HostRoute]) -> Vec<Value<HostRouteState<'a>>> {
    routes
        .iter()
        .map(|route| {
            Value::Value(HostRouteState {
                destination: string(route.destination.as_str()),
                nexthop: string(route.nexthop.as_str()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_routes_are_reported_by_index() {
        let routes: HostRoutes = Value::Value(vec![
            Value::Value(HostRouteState {
                destination: "10.0.3.0/24".into(),
                nexthop: "10.0.0.13".into(),
            }),
            Value::Value(HostRouteState {
                destination: "10.0.4.0".into(),
                nexthop: "10.0.0.13".into(),
            }),
        ]);
        let mut diags = Diagnostics::default();
        validate_host_routes(&mut diags, "host_routes", &routes);
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(
            diags.errors[0].attribute,
            AttributePath::new("host_routes").index(1).attribute("destination")
        );
        assert_eq!(expand_host_routes(&routes).len(), 2);
    }
}
