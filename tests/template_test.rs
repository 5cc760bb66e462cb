// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Structural tests for the calls page template
//!
//! The page template is a fixed artifact with a token contract: every
//! placeholder occurs exactly once, the form field names are a fixed
//! literal set, and substitution must leave no dangling markers behind.

use std::collections::BTreeSet;

use modbus_simulator::config::DeviceConfig;
use modbus_simulator::dashboard::render_calls_page;
use modbus_simulator::dashboard::templates::CALLS_TEMPLATE;
use modbus_simulator::protocol::{Request, Response};
use modbus_simulator::simulator::{DisplayMode, MonitorFilter, SimulatorState};
use regex::Regex;

/// Every placeholder token the renderer substitutes.
const TOKENS: &[&str] = &[
    "<!--REFRESH-->",
    "<!--FUNCTION_MONITORING_ACTIVE-->",
    "<!--FUNCTION_ERROR-->",
    "<!--FUNCTION_CODES-->",
    "<!--ERROR_CODES-->",
    "<!--FC_ROWS-->",
    "<!--FC_FOOT-->",
    "FUNCTION_RANGE_START",
    "FUNCTION_RANGE_STOP",
    "FUNCTION_SHOW_HEX_CHECKED",
    "FUNCTION_SHOW_DECODED_CHECKED",
    "RESPONSE_NORMAL_CHECKED",
    "RESPONSE_ERROR_CHECKED",
    "RESPONSE_EMPTY_CHECKED",
    "RESPONSE_JUNK_CHECKED",
    "RESPONSE_SPLIT_CHECKED",
    "RESPONSE_SPLIT_DELAY",
    "RESPONSE_CR_CHECKED",
    "RESPONSE_CR_PCT",
    "RESPONSE_DELAY",
    "RESPONSE_JUNK_DATALEN",
    "RESPONSE_CLEAR_AFTER",
];

#[test]
fn every_token_is_present_exactly_once() {
    for token in TOKENS {
        let count = CALLS_TEMPLATE.matches(token).count();
        assert_eq!(count, 1, "token {token} occurs {count} times");
    }
}

#[test]
fn form_field_names_match_the_contract() {
    let expected: BTreeSet<&str> = [
        "range_start",
        "range_stop",
        "function",
        "show_hex",
        "show_decode",
        "submit",
        "response_type",
        "response_split",
        "split_delay",
        "response_cr",
        "response_cr_pct",
        "response_delay",
        "response_junk_datalen",
        "response_error",
        "response_clear_after",
    ]
    .into_iter()
    .collect();

    let name_attr = Regex::new(r#"name="([a-z_]+)""#).unwrap();
    let found: BTreeSet<&str> = name_attr
        .captures_iter(CALLS_TEMPLATE)
        .map(|c| c.get(1).unwrap().as_str())
        .collect();

    assert_eq!(found, expected);
}

#[test]
fn submit_buttons_carry_the_five_actions() {
    let submit = Regex::new(r#"name="submit" value="([A-Za-z]+)""#).unwrap();
    let values: Vec<&str> = submit
        .captures_iter(CALLS_TEMPLATE)
        .map(|c| c.get(1).unwrap().as_str())
        .collect();
    assert_eq!(values, vec!["Monitor", "Clear", "Stop", "Set", "Reset"]);
}

#[test]
fn template_references_the_static_assets() {
    for asset in [
        "/favicon.ico",
        "/apple60.png",
        "/apple76.png",
        "/apple120.png",
        "/apple152.png",
        "/pymodbus.css",
    ] {
        assert!(CALLS_TEMPLATE.contains(asset), "missing asset {asset}");
    }
}

#[test]
fn rendered_page_is_free_of_markers() {
    let state = SimulatorState::new(&DeviceConfig::default());

    // Exercise the renderer with live records in both display modes
    {
        let mut monitor = state.monitor.lock().unwrap();
        monitor.start(
            MonitorFilter::default(),
            DisplayMode {
                show_hex: true,
                show_decode: true,
            },
        );
        let request = Request::ReadHoldingRegisters { addr: 2, count: 2 };
        let response = Response::Registers {
            function: 3,
            values: vec![10, 20],
        };
        monitor.observe(&request, &[0x03, 0x00, 0x02, 0x00, 0x02], &response);
    }

    let page = render_calls_page(&state, 3, "some <error>");

    // No token survives substitution, comment markers included
    let marker = Regex::new(r"<!--[A-Z_]+-->").unwrap();
    assert!(marker.find(&page).is_none());
    for token in TOKENS {
        if !token.starts_with("<!--") {
            assert!(!page.contains(token), "token {token} leaked into output");
        }
    }

    // The captured rows and the refresh tag made it into the page
    assert!(page.contains("read addr=2 count=2"));
    assert!(page.contains("values=[10, 20]"));
    assert!(page.contains(r#"<meta http-equiv="refresh" content="3">"#));
    assert!(page.contains("1 requests seen while monitoring"));
    assert!(page.contains("some &lt;error&gt;"));
}
