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

use edgecenter_client::Location;
use tf_provider::Diagnostics;

/// Parsed import ID: `project_id:region_id:id[:parent_id]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportId {
    pub location: Location,
    pub id: String,
    pub parent_id: Option<String>,
}

fn parse_number(diags: &mut Diagnostics, what: &str, raw: &str, value: &str) -> Option<i64> {
    match value.parse() {
        Ok(number) => Some(number),
        Err(_) => {
            diags.root_error(
                "Invalid import ID",
                format!("`{value}` is not a valid {what} in `{raw}`"),
            );
            None
        }
    }
}

fn parse_parts<'r>(diags: &mut Diagnostics, raw: &'r str, expected: &str, count: usize) -> Option<Vec<&'r str>> {
    let parts = raw.split(':').collect::<Vec<_>>();
    if parts.len() != count || parts.iter().any(|part| part.is_empty()) {
        diags.root_error(
            "Invalid import ID",
            format!("Import ID must be formatted as `{expected}`, got `{raw}`"),
        );
        return None;
    }
    Some(parts)
}

/// Parse a `project_id:region_id:id` import ID, with a trailing parent ID when `with_parent`
pub(crate) fn parse_import_id(diags: &mut Diagnostics, raw: &str, with_parent: bool) -> Option<ImportId> {
    let (expected, count) = if with_parent {
        ("project_id:region_id:id:parent_id", 4)
    } else {
        ("project_id:region_id:id", 3)
    };
    let parts = parse_parts(diags, raw, expected, count)?;
    let project_id = parse_number(diags, "project ID", raw, parts[0]);
    let region_id = parse_number(diags, "region ID", raw, parts[1]);

    Some(ImportId {
        location: Location::new(project_id?, region_id?),
        id: parts[2].to_owned(),
        parent_id: parts.get(3).map(|parent| (*parent).to_owned()),
    })
}

/// Parse a `project_id:id` import ID of a project scoped object
pub(crate) fn parse_project_import_id(diags: &mut Diagnostics, raw: &str) -> Option<(i64, String)> {
    let parts = parse_parts(diags, raw, "project_id:id", 2)?;
    let project_id = parse_number(diags, "project ID", raw, parts[0])?;
    Some((project_id, parts[1].to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regional_import_id() {
        let mut diags = Diagnostics::default();
        let import = parse_import_id(&mut diags, "1:8:abc", false).unwrap();
        assert_eq!(import.location, Location::new(1, 8));
        assert_eq!(import.id, "abc");
        assert_eq!(import.parent_id, None);
    }

    #[test]
    fn import_id_with_parent() {
        let mut diags = Diagnostics::default();
        let import = parse_import_id(&mut diags, "1:8:member:pool", true).unwrap();
        assert_eq!(import.id, "member");
        assert_eq!(import.parent_id.as_deref(), Some("pool"));

        assert!(parse_import_id(&mut diags, "1:8:member", true).is_none());
        assert_eq!(diags.errors.len(), 1);
    }

    #[test]
    fn invalid_import_ids() {
        for raw in ["abc", "1:8", "1:8:", "x:8:abc", "1:y:abc", "1:8:abc:def"] {
            let mut diags = Diagnostics::default();
            assert!(parse_import_id(&mut diags, raw, false).is_none(), "{raw}");
            assert!(!diags.errors.is_empty());
        }
    }

    #[test]
    fn project_import_id() {
        let mut diags = Diagnostics::default();
        assert_eq!(
            parse_project_import_id(&mut diags, "3:my-key"),
            Some((3, "my-key".to_owned()))
        );
        assert!(parse_project_import_id(&mut diags, "3:8:my-key").is_none());
    }
}
