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

use tf_provider::value::{Value, ValueString};
use tf_provider::{AttributePath, Diagnostics};

use crate::utils::known;

/// How a data source designates the object to look for
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Selector {
    Id(String),
    Name(String),
}

impl Selector {
    /// Selector from the `id` and `<name>` attributes of a data source config
    pub fn from_config(
        diags: &mut Diagnostics,
        id: &ValueString<'_>,
        name_attribute: &'static str,
        name: &ValueString<'_>,
    ) -> Option<Self> {
        match (known(id), known(name)) {
            (Some(_), Some(_)) => {
                diags.error(
                    "Conflicting selectors",
                    format!("Only one of `id` or `{name_attribute}` can be set"),
                    AttributePath::new(name_attribute),
                );
                None
            }
            (Some(id), None) => Some(Selector::Id(id)),
            (None, Some(name)) => Some(Selector::Name(name)),
            (None, None) => {
                if id.is_unknown() || name.is_unknown() {
                    diags.root_error_short("Selector of the data source is unknown");
                } else {
                    diags.error(
                        "Missing selector",
                        format!("One of `id` or `{name_attribute}` must be set"),
                        AttributePath::new(name_attribute),
                    );
                }
                None
            }
        }
    }
}

/// Validate a data source selector without resolving it
pub(crate) fn validate_selector(
    diags: &mut Diagnostics,
    id: &ValueString<'_>,
    name_attribute: &'static str,
    name: &ValueString<'_>,
) {
    match (id, name) {
        (Value::Null, Value::Null) => diags.error(
            "Missing selector",
            format!("One of `id` or `{name_attribute}` must be set"),
            AttributePath::new(name_attribute),
        ),
        (Value::Value(_), Value::Value(_)) => diags.error(
            "Conflicting selectors",
            format!("Only one of `id` or `{name_attribute}` can be set"),
            AttributePath::new(name_attribute),
        ),
        _ => (),
    }
}

/// Find the single item whose name is `name`
pub(crate) fn find_by_name<T, F>(
    diags: &mut Diagnostics,
    kind: &str,
    name: &str,
    items: Vec<T>,
    name_of: F,
) -> Option<T>
where
    F: Fn(&T) -> &str,
{
    let mut found = items.into_iter().filter(|item| name_of(item) == name);
    match (found.next(), found.next()) {
        (Some(item), None) => Some(item),
        (None, _) => {
            diags.root_error(
                format!("{kind} not found"),
                format!("No {kind} with name `{name}` was found"),
            );
            None
        }
        (Some(_), Some(_)) => {
            diags.root_error(
                format!("Multiple {kind}s found"),
                format!("Multiple {kind}s found with name `{name}`, use id instead of name"),
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["a".to_owned(), "b".to_owned(), "b".to_owned()]
    }

    #[test]
    fn unique_name_is_found() {
        let mut diags = Diagnostics::default();
        let found = find_by_name(&mut diags, "network", "a", names(), |s| s.as_str());
        assert_eq!(found.as_deref(), Some("a"));
        assert!(diags.errors.is_empty());
    }

    #[test]
    fn missing_name_is_an_error() {
        let mut diags = Diagnostics::default();
        assert!(find_by_name(&mut diags, "network", "c", names(), |s| s.as_str()).is_none());
        assert_eq!(diags.errors[0].summary, "network not found");
    }

    #[test]
    fn duplicated_name_asks_for_an_id() {
        let mut diags = Diagnostics::default();
        assert!(find_by_name(&mut diags, "network", "b", names(), |s| s.as_str()).is_none());
        assert!(diags.errors[0].detail.contains("use id instead of name"));
    }

    #[test]
    fn selector_needs_exactly_one_attribute() {
        let mut diags = Diagnostics::default();
        let selector = Selector::from_config(&mut diags, &"abc".into(), "name", &Value::Null);
        assert_eq!(selector, Some(Selector::Id("abc".to_owned())));

        let selector = Selector::from_config(&mut diags, &"abc".into(), "name", &"net".into());
        assert_eq!(selector, None);
        assert_eq!(diags.errors.len(), 1);

        let mut diags = Diagnostics::default();
        validate_selector(&mut diags, &Value::Null, "name", &Value::Null);
        assert_eq!(diags.errors[0].summary, "Missing selector");
    }
}
