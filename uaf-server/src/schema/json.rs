use serde_json::{Map, Value};
use uaf_types::{encoding, protocol::ASSERTION_SCHEME};

use super::{limits, Diagnostics, ResponseValidator};

fn object<'a>(
    value: &'a Value,
    path: &str,
    diagnostics: &mut Diagnostics,
) -> Option<&'a Map<String, Value>> {
    let object = value.as_object();
    if object.is_none() {
        diagnostics.push(path, "must be an object");
    }
    object
}

fn required<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    path: &str,
    diagnostics: &mut Diagnostics,
) -> Option<&'a Value> {
    let value = object.get(key);
    if value.is_none() {
        diagnostics.push(path, format!("missing required property '{key}'"));
    }
    value
}

fn string<'a>(
    value: &'a Value,
    path: &str,
    (min, max): (usize, usize),
    diagnostics: &mut Diagnostics,
) -> Option<&'a str> {
    let Some(text) = value.as_str() else {
        diagnostics.push(path, "must be a string");
        return None;
    };
    let len = text.chars().count();
    if len < min || len > max {
        diagnostics.push(path, format!("length {len} is outside {min}..={max}"));
        return None;
    }
    Some(text)
}

fn one_of(value: &str, allowed: &[String], path: &str, diagnostics: &mut Diagnostics) {
    if !allowed.iter().any(|a| a == value) {
        diagnostics.push(path, format!("'{value}' is not an allowed value"));
    }
}

fn integer(value: &Value, path: &str, max: u64, diagnostics: &mut Diagnostics) {
    match value.as_u64() {
        Some(n) if n <= max => {}
        Some(n) => diagnostics.push(path, format!("{n} is greater than {max}")),
        None => diagnostics.push(path, "must be a non-negative integer"),
    }
}

fn array<'a>(value: &'a Value, path: &str, diagnostics: &mut Diagnostics) -> Option<&'a [Value]> {
    let items = value.as_array().map(Vec::as_slice);
    if items.is_none() {
        diagnostics.push(path, "must be an array");
    }
    items
}

/// The outer `UafResponse` envelope.
pub(super) fn response(rules: &ResponseValidator, value: &Value, diagnostics: &mut Diagnostics) {
    let Some(response) = object(value, "", diagnostics) else {
        return;
    };

    if let Some(header) = required(response, "header", "", diagnostics) {
        self::header(rules, header, diagnostics);
    }

    if let Some(fc_params) = required(response, "fcParams", "", diagnostics) {
        if !fc_params.is_string() {
            diagnostics.push("/fcParams", "must be a string");
        }
    }

    if let Some(assertions) = required(response, "assertions", "", diagnostics)
        .and_then(|value| array(value, "/assertions", diagnostics))
    {
        if assertions.len() != 1 {
            diagnostics.push(
                "/assertions",
                format!("must contain exactly 1 item, found {}", assertions.len()),
            );
        }
        if let Some(entry) = assertions.first() {
            assertion_entry(entry, "/assertions/0", diagnostics);
        }
    }
}

fn header(rules: &ResponseValidator, value: &Value, diagnostics: &mut Diagnostics) {
    let Some(header) = object(value, "/header", diagnostics) else {
        return;
    };

    if let Some(upv) = required(header, "upv", "/header", diagnostics)
        .and_then(|upv| object(upv, "/header/upv", diagnostics))
    {
        for part in ["major", "minor"] {
            let path = format!("/header/upv/{part}");
            if let Some(number) = required(upv, part, "/header/upv", diagnostics) {
                if number.as_u64() != Some(1) {
                    diagnostics.push(path, "must be 1");
                }
            }
        }
    }

    if let Some(server_data) = required(header, "serverData", "/header", diagnostics) {
        string(
            server_data,
            "/header/serverData",
            (0, limits::SERVER_DATA),
            diagnostics,
        );
    }

    if let Some(app_id) = required(header, "appID", "/header", diagnostics)
        .and_then(|app_id| string(app_id, "/header/appID", (0, limits::APP_ID), diagnostics))
    {
        one_of(app_id, rules.app_ids(), "/header/appID", diagnostics);
    }

    if let Some(op) = required(header, "op", "/header", diagnostics) {
        let allowed = rules
            .operations()
            .iter()
            .any(|allowed| op.as_str() == Some(<&str>::from(*allowed)));
        if !allowed {
            diagnostics.push("/header/op", format!("must be one of {:?}", rules.operations()));
        }
    }

    if let Some(exts) = header.get("exts") {
        extensions(exts, "/header/exts", diagnostics);
    }
}

fn assertion_entry(value: &Value, path: &str, diagnostics: &mut Diagnostics) {
    let Some(entry) = object(value, path, diagnostics) else {
        return;
    };

    if let Some(assertion) = required(entry, "assertion", path, diagnostics) {
        string(
            assertion,
            &format!("{path}/assertion"),
            (0, limits::ASSERTION),
            diagnostics,
        );
    }

    if let Some(scheme) = required(entry, "assertionScheme", path, diagnostics) {
        if scheme.as_str() != Some(ASSERTION_SCHEME) {
            diagnostics.push(
                format!("{path}/assertionScheme"),
                format!("must be '{ASSERTION_SCHEME}'"),
            );
        }
    }

    if let Some(characteristics) = entry.get("tcDisplayPNGCharacteristics") {
        let path = format!("{path}/tcDisplayPNGCharacteristics");
        if let Some(items) = array(characteristics, &path, diagnostics) {
            for (i, item) in items.iter().enumerate() {
                png_characteristics(item, &format!("{path}/{i}"), diagnostics);
            }
        }
    }

    if let Some(exts) = entry.get("exts") {
        extensions(exts, &format!("{path}/exts"), diagnostics);
    }
}

fn png_characteristics(value: &Value, path: &str, diagnostics: &mut Diagnostics) {
    let Some(characteristics) = object(value, path, diagnostics) else {
        return;
    };

    let fields = [
        ("width", u64::from(u32::MAX)),
        ("height", u64::from(u32::MAX)),
        ("bitDepth", u64::from(u8::MAX)),
        ("colorType", u64::from(u8::MAX)),
        ("compression", u64::from(u8::MAX)),
        ("filter", u64::from(u8::MAX)),
        ("interlace", u64::from(u8::MAX)),
    ];
    for (field, max) in fields {
        if let Some(number) = required(characteristics, field, path, diagnostics) {
            integer(number, &format!("{path}/{field}"), max, diagnostics);
        }
    }

    if let Some(plte) = characteristics.get("plte") {
        let path = format!("{path}/plte");
        if let Some(entries) = array(plte, &path, diagnostics) {
            if entries.is_empty() {
                diagnostics.push(path.as_str(), "must contain at least 1 item");
            }
            for (i, entry) in entries.iter().enumerate() {
                let path = format!("{path}/{i}");
                let Some(entry) = object(entry, &path, diagnostics) else {
                    continue;
                };
                for channel in ["r", "g", "b"] {
                    if let Some(number) = required(entry, channel, &path, diagnostics) {
                        integer(
                            number,
                            &format!("{path}/{channel}"),
                            u64::from(u16::MAX),
                            diagnostics,
                        );
                    }
                }
            }
        }
    }
}

fn extensions(value: &Value, path: &str, diagnostics: &mut Diagnostics) {
    let Some(items) = array(value, path, diagnostics) else {
        return;
    };
    for (i, item) in items.iter().enumerate() {
        let path = format!("{path}/{i}");
        let Some(extension) = object(item, &path, diagnostics) else {
            continue;
        };
        if let Some(id) = required(extension, "id", &path, diagnostics) {
            string(id, &format!("{path}/id"), limits::EXTENSION_ID, diagnostics);
        }
        if let Some(data) = required(extension, "data", &path, diagnostics) {
            if !data.is_string() {
                diagnostics.push(format!("{path}/data"), "must be a string");
            }
        }
        if let Some(flag) = required(extension, "fail_if_unknown", &path, diagnostics) {
            if !flag.is_boolean() {
                diagnostics.push(format!("{path}/fail_if_unknown"), "must be a boolean");
            }
        }
    }
}

/// The decoded `fcParams` object.
pub(super) fn final_challenge_params(
    rules: &ResponseValidator,
    value: &Value,
    diagnostics: &mut Diagnostics,
) {
    let Some(params) = object(value, "/fcParams", diagnostics) else {
        return;
    };

    if let Some(app_id) = required(params, "appID", "/fcParams", diagnostics)
        .and_then(|app_id| string(app_id, "/fcParams/appID", (1, limits::APP_ID), diagnostics))
    {
        one_of(app_id, rules.app_ids(), "/fcParams/appID", diagnostics);
    }

    if let Some(facet_id) = required(params, "facetID", "/fcParams", diagnostics).and_then(
        |facet_id| string(facet_id, "/fcParams/facetID", (1, limits::APP_ID), diagnostics),
    ) {
        one_of(facet_id, rules.facet_ids(), "/fcParams/facetID", diagnostics);
    }

    if let Some(challenge) = required(params, "challenge", "/fcParams", diagnostics).and_then(
        |challenge| {
            string(
                challenge,
                "/fcParams/challenge",
                limits::CHALLENGE_TEXT,
                diagnostics,
            )
        },
    ) {
        let (min, max) = limits::CHALLENGE_BYTES;
        match encoding::try_from_any_base64(challenge) {
            Some(bytes) if (min..=max).contains(&bytes.len()) => {}
            Some(bytes) => diagnostics.push(
                "/fcParams/challenge",
                format!("decodes to {} bytes, outside {min}..={max}", bytes.len()),
            ),
            None => diagnostics.push("/fcParams/challenge", "must be base64url encoded"),
        }
    }
}
