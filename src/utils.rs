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
use std::collections::BTreeMap;

use edgecenter_client::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tf_provider::schema::Schema;
use tf_provider::value::{Value, ValueList, ValueMap, ValueString};
use tf_provider::Diagnostics;

pub(crate) trait WithSchema {
    fn schema() -> Schema;
}

/// Fill the values the provider is responsible for before planning or applying
pub(crate) trait WithNormalize {
    fn normalize(&mut self, diags: &mut Diagnostics);
}

/// Record a client error into the diagnostics
pub(crate) trait ReportError<T> {
    fn report(self, diags: &mut Diagnostics, summary: &'static str) -> Option<T>;

    /// Same as `report`, but a missing object gives `Some(None)` instead of an error
    fn report_found(self, diags: &mut Diagnostics, summary: &'static str) -> Option<Option<T>>;
}

impl<T> ReportError<T> for Result<T, Error> {
    fn report(self, diags: &mut Diagnostics, summary: &'static str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::error!(error = %err, "{summary}");
                diags.root_error(summary, err.to_string());
                None
            }
        }
    }

    fn report_found(self, diags: &mut Diagnostics, summary: &'static str) -> Option<Option<T>> {
        match self {
            Err(err) if err.is_not_found() => {
                tracing::debug!(error = %err, "{summary}: not found");
                Some(None)
            }
            result => result.report(diags, summary).map(Some),
        }
    }
}

/// Report the outcome of a deletion: an object already gone is only a warning
pub(crate) fn report_deleted<T>(
    result: Result<T, Error>,
    diags: &mut Diagnostics,
    summary: &'static str,
) -> Option<Option<T>> {
    let deleted = result.report_found(diags, summary)?;
    if deleted.is_none() {
        diags.root_warning(
            "Object already deleted",
            format!("{summary}: the object does not exist anymore"),
        );
    }
    Some(deleted)
}

/// Return `Some(())` when no error has been recorded
pub(crate) fn check(diags: &Diagnostics) -> Option<()> {
    if diags.errors.is_empty() {
        Some(())
    } else {
        None
    }
}

/// Current time, as stored in `last_updated`
pub(crate) fn now<'a>() -> ValueString<'a> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map(Into::into)
        .unwrap_or(Value::Null)
}

/// Known string, or `None` when null or unknown
pub(crate) fn known(value: &ValueString<'_>) -> Option<String> {
    value.as_ref_option().map(|s| s.to_string())
}

/// Known non-empty string, or `None`
pub(crate) fn known_non_empty(value: &ValueString<'_>) -> Option<String> {
    known(value).filter(|s| !s.is_empty())
}

pub(crate) fn string<'a>(value: impl Into<String>) -> ValueString<'a> {
    Value::Value(Cow::Owned(value.into()))
}

pub(crate) fn opt_string<'a>(value: Option<String>) -> ValueString<'a> {
    value.map(Cow::Owned).into()
}

/// Like [`opt_string`], but an empty string is stored as null
pub(crate) fn non_empty_string<'a>(value: Option<String>) -> ValueString<'a> {
    opt_string(value.filter(|s| !s.is_empty()))
}

pub(crate) fn string_list<'a>(values: impl IntoIterator<Item = String>) -> ValueList<ValueString<'a>> {
    Value::Value(values.into_iter().map(string).collect())
}

/// Known elements of a list of strings
pub(crate) fn known_list(values: &ValueList<ValueString<'_>>) -> Vec<String> {
    values.iter().flatten().filter_map(known).collect()
}

/// Known entries of a map of strings
pub(crate) fn known_map(values: &ValueMap<'_, ValueString<'_>>) -> BTreeMap<String, String> {
    values
        .iter()
        .flatten()
        .filter_map(|(k, v)| known(v).map(|v| (k.to_string(), v)))
        .collect()
}

/// Replace a null value by unknown: the provider will compute it
pub(crate) fn computed<T>(value: &mut Value<T>) {
    if value.is_null() {
        *value = Value::Unknown;
    }
}

/// Replace a non-known value by a default
pub(crate) fn default_to<T>(value: &mut Value<T>, default: T) {
    if !value.is_value() {
        *value = Value::Value(default);
    }
}

/// Store a remote list, keeping a null value when the remote list is empty
pub(crate) fn apply_list<T>(value: &mut ValueList<T>, remote: Vec<T>) {
    if remote.is_empty() && value.is_null() {
        return;
    }
    *value = Value::Value(remote);
}

/// Build the list of attributes whose change forces the replacement of the resource
macro_rules! requires_replace {
    ($prior:expr, $proposed:expr, [$($field:ident),* $(,)?]) => {{
        #[allow(unused_mut)]
        let mut paths = Vec::<tf_provider::AttributePath>::new();
        $(
            if $prior.$field != $proposed.$field {
                paths.push(tf_provider::AttributePath::new(stringify!($field)));
            }
        )*
        paths
    }};
}

pub(crate) use requires_replace;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Pair {
        a: Value<i64>,
        b: Value<i64>,
    }

    #[test]
    fn replace_only_changed_fields() {
        let prior = Pair {
            a: Value::Value(1),
            b: Value::Value(2),
        };
        let proposed = Pair {
            a: Value::Value(1),
            b: Value::Value(3),
        };
        let paths = requires_replace!(prior, proposed, [a, b]);
        assert_eq!(paths, vec![tf_provider::AttributePath::new("b")]);
    }

    #[test]
    fn computed_keeps_known_values() {
        let mut null: Value<i64> = Value::Null;
        let mut known = Value::Value(4);
        computed(&mut null);
        computed(&mut known);
        assert!(null.is_unknown());
        assert_eq!(known, Value::Value(4));
    }

    #[test]
    fn empty_remote_list_keeps_null() {
        let mut null: ValueList<i64> = Value::Null;
        apply_list(&mut null, vec![]);
        assert!(null.is_null());

        let mut empty: ValueList<i64> = Value::Value(vec![]);
        apply_list(&mut empty, vec![]);
        assert_eq!(empty, Value::Value(vec![]));

        apply_list(&mut null, vec![1]);
        assert_eq!(null, Value::Value(vec![1]));
    }

    #[test]
    fn known_helpers_skip_unknowns() {
        let list: ValueList<ValueString> =
            Value::Value(vec![string("a"), Value::Unknown, Value::Null, string("b")]);
        assert_eq!(known_list(&list), vec!["a", "b"]);
        assert_eq!(known_non_empty(&string("")), None);
        assert_eq!(non_empty_string(Some(String::new())), Value::Null);
    }
}
