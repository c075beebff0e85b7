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

//! Validators of attribute values
//!
//! Every validator records its error into the diagnostics and ignores
//! null or unknown values: those are checked once they are known.

use std::net::IpAddr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tf_provider::value::{Value, ValueNumber, ValueString};
use tf_provider::{AttributePath, Diagnostics};

/// Value must be one of `allowed`
pub(crate) fn one_of(
    diags: &mut Diagnostics,
    attribute: AttributePath,
    value: &ValueString<'_>,
    allowed: &[&str],
) {
    if let Value::Value(value) = value {
        if !allowed.iter().any(|allowed| value == allowed) {
            diags.error(
                "Invalid value",
                format!("`{value}` must be one of: {}", allowed.join(", ")),
                attribute,
            );
        }
    }
}

/// Value must be within `min..=max`
pub(crate) fn in_range(diags: &mut Diagnostics, attribute: AttributePath, value: &ValueNumber, min: i64, max: i64) {
    if let Value::Value(value) = value {
        if !(min..=max).contains(value) {
            diags.error(
                "Value out of range",
                format!("{value} must be between {min} and {max}"),
                attribute,
            );
        }
    }
}

/// Value must be set when `condition` holds
pub(crate) fn required_if<T>(
    diags: &mut Diagnostics,
    attribute: AttributePath,
    value: &Value<T>,
    condition: bool,
    reason: &str,
) {
    if condition && value.is_null() {
        diags.error(
            "Missing attribute",
            format!("Attribute is required {reason}"),
            attribute,
        );
    }
}

/// Value must not be set when `condition` holds
pub(crate) fn conflicts_if<T>(
    diags: &mut Diagnostics,
    attribute: AttributePath,
    value: &Value<T>,
    condition: bool,
    reason: &str,
) {
    if condition && value.is_value() {
        diags.error(
            "Unexpected attribute",
            format!("Attribute cannot be set {reason}"),
            attribute,
        );
    }
}

pub(crate) fn is_ip(value: &str) -> bool {
    value.parse::<IpAddr>().is_ok()
}

/// `address/prefix` where the prefix fits the address family
pub(crate) fn is_cidr(value: &str) -> bool {
    let Some((address, prefix)) = value.split_once('/') else {
        return false;
    };
    let Ok(address) = address.parse::<IpAddr>() else {
        return false;
    };
    let Ok(prefix) = prefix.parse::<u8>() else {
        return false;
    };
    match address {
        IpAddr::V4(_) => prefix <= 32,
        IpAddr::V6(_) => prefix <= 128,
    }
}

pub(crate) fn ip(diags: &mut Diagnostics, attribute: AttributePath, value: &ValueString<'_>) {
    if let Value::Value(value) = value {
        if !is_ip(value) {
            diags.error("Invalid IP address", format!("`{value}` is not an IP address"), attribute);
        }
    }
}

pub(crate) fn cidr(diags: &mut Diagnostics, attribute: AttributePath, value: &ValueString<'_>) {
    if let Value::Value(value) = value {
        if !is_cidr(value) {
            diags.error("Invalid CIDR", format!("`{value}` is not a valid CIDR"), attribute);
        }
    }
}

/// Port range of a rule: both bounds in 1..=65535 and ordered
pub(crate) fn port_range(
    diags: &mut Diagnostics,
    attribute: AttributePath,
    min: &ValueNumber,
    max: &ValueNumber,
) {
    in_range(diags, attribute.clone().attribute("port_range_min"), min, 1, 65535);
    in_range(diags, attribute.clone().attribute("port_range_max"), max, 1, 65535);
    if let (Value::Value(min), Value::Value(max)) = (min, max) {
        if min > max {
            diags.error(
                "Invalid port range",
                format!("port_range_min ({min}) must not be greater than port_range_max ({max})"),
                attribute.attribute("port_range_min"),
            );
        }
    }
}

/// OpenSSH public key: `<type> <base64 blob> [comment]`
pub(crate) fn ssh_public_key(diags: &mut Diagnostics, attribute: AttributePath, value: &ValueString<'_>) {
    let Value::Value(value) = value else {
        return;
    };
    let mut fields = value.split_whitespace();
    let valid = match (fields.next(), fields.next()) {
        (Some(key_type), Some(blob)) => {
            (key_type.starts_with("ssh-") || key_type.starts_with("ecdsa-"))
                && STANDARD.decode(blob).is_ok()
        }
        _ => false,
    };
    if !valid {
        diags.error(
            "Invalid public key",
            "Public key must be in the OpenSSH format: `<type> <base64 key> [comment]`",
            attribute,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> AttributePath {
        AttributePath::new("test")
    }

    #[test]
    fn cidr_syntax() {
        assert!(is_cidr("192.168.10.0/24"));
        assert!(is_cidr("fd00::/8"));
        assert!(!is_cidr("192.168.10.0"));
        assert!(!is_cidr("192.168.10.0/33"));
        assert!(!is_cidr("300.168.10.0/24"));
        assert!(!is_cidr("10.0.0.0/x"));
    }

    #[test]
    fn unknown_values_are_not_validated() {
        let mut diags = Diagnostics::default();
        cidr(&mut diags, path(), &Value::Unknown);
        ip(&mut diags, path(), &Value::Null);
        one_of(&mut diags, path(), &Value::Unknown, &["a"]);
        assert!(diags.errors.is_empty());
    }

    #[test]
    fn one_of_lists_allowed_values() {
        let mut diags = Diagnostics::default();
        one_of(&mut diags, path(), &"vlan".into(), &["vlan", "vxlan"]);
        assert!(diags.errors.is_empty());
        one_of(&mut diags, path(), &"flat".into(), &["vlan", "vxlan"]);
        assert!(diags.errors[0].detail.contains("vlan, vxlan"));
    }

    #[test]
    fn port_ranges() {
        let mut diags = Diagnostics::default();
        port_range(&mut diags, path(), &Value::Value(22), &Value::Value(22));
        assert!(diags.errors.is_empty());

        port_range(&mut diags, path(), &Value::Value(0), &Value::Value(70000));
        assert_eq!(diags.errors.len(), 2);

        let mut diags = Diagnostics::default();
        port_range(&mut diags, path(), &Value::Value(443), &Value::Value(80));
        assert_eq!(diags.errors[0].summary, "Invalid port range");
    }

    #[test]
    fn required_and_conflicting_attributes() {
        let mut diags = Diagnostics::default();
        required_if(&mut diags, path(), &Value::<i64>::Null, false, "");
        conflicts_if(&mut diags, path(), &Value::Value(1), false, "");
        assert!(diags.errors.is_empty());

        required_if(&mut diags, path(), &Value::<i64>::Null, true, "when source is image");
        conflicts_if(&mut diags, path(), &Value::Value(1), true, "with new-volume");
        assert_eq!(diags.errors.len(), 2);
    }

    #[test]
    fn public_keys() {
        let mut diags = Diagnostics::default();
        ssh_public_key(
            &mut diags,
            path(),
            &"ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIHl1c2VyQGhvc3Q= user@host".into(),
        );
        assert!(diags.errors.is_empty());
        ssh_public_key(&mut diags, path(), &"not a key".into());
        ssh_public_key(&mut diags, path(), &"ssh-rsa".into());
        assert_eq!(diags.errors.len(), 2);
    }
}
