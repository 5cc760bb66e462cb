// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Calls page rendering
//!
//! Builds the substitution values for every template token from the current
//! simulator state: the monitoring form reflects the active filter, the
//! injection form reflects the injector configuration, and the table shows
//! the captured call records.

use crate::protocol::{function_name, ExceptionCode, FUNCTION_NAMES};
use crate::simulator::{CallRecord, DisplayMode, ResponseMode, SimulatorState};

use super::templates::{escape, substitute, CALLS_TEMPLATE};

/// Render the complete calls page from the current simulator state.
///
/// `error` is the message shown in the page's error line; empty for none.
pub fn render_calls_page(state: &SimulatorState, refresh_secs: u16, error: &str) -> String {
    let monitor = state.monitor.lock().unwrap();
    let injector = state.injector.lock().unwrap();
    let config = *injector.config();

    let active = monitor.is_active();
    let filter = *monitor.filter();
    let mode = monitor.mode();

    let refresh = if active {
        format!(r#"<meta http-equiv="refresh" content="{}">"#, refresh_secs)
    } else {
        String::new()
    };

    let rows: String = monitor.records().map(|r| call_row(r, mode)).collect();
    let foot = format!(
        "{} requests seen while monitoring, {} rows captured, {} dropped",
        monitor.total_requests(),
        monitor.records().count(),
        monitor.dropped()
    );

    let values: Vec<(&str, String)> = vec![
        ("<!--REFRESH-->", refresh),
        (
            "<!--FUNCTION_MONITORING_ACTIVE-->",
            if active { "active" } else { "stopped" }.to_string(),
        ),
        ("<!--FUNCTION_ERROR-->", escape(error)),
        (
            "FUNCTION_RANGE_START",
            filter.range_start.map(|v| v.to_string()).unwrap_or_default(),
        ),
        (
            "FUNCTION_RANGE_STOP",
            filter.range_stop.map(|v| v.to_string()).unwrap_or_default(),
        ),
        ("<!--FUNCTION_CODES-->", function_options(filter.function)),
        ("FUNCTION_SHOW_HEX_CHECKED", checked(mode.show_hex)),
        ("FUNCTION_SHOW_DECODED_CHECKED", checked(mode.show_decode)),
        (
            "RESPONSE_NORMAL_CHECKED",
            checked(config.mode == ResponseMode::Normal),
        ),
        (
            "RESPONSE_ERROR_CHECKED",
            checked(config.mode == ResponseMode::Error),
        ),
        (
            "RESPONSE_EMPTY_CHECKED",
            checked(config.mode == ResponseMode::Empty),
        ),
        (
            "RESPONSE_JUNK_CHECKED",
            checked(config.mode == ResponseMode::Junk),
        ),
        ("RESPONSE_SPLIT_CHECKED", checked(config.split)),
        ("RESPONSE_SPLIT_DELAY", config.split_delay_secs.to_string()),
        ("RESPONSE_CR_CHECKED", checked(config.change_rate_enabled)),
        ("RESPONSE_CR_PCT", config.change_rate_pct.to_string()),
        ("RESPONSE_DELAY", config.delay_secs.to_string()),
        ("RESPONSE_JUNK_DATALEN", config.junk_len.to_string()),
        ("<!--ERROR_CODES-->", error_options(config.error)),
        ("RESPONSE_CLEAR_AFTER", config.clear_after.to_string()),
        ("<!--FC_ROWS-->", rows),
        ("<!--FC_FOOT-->", foot),
    ];

    substitute(CALLS_TEMPLATE, &values)
}

fn checked(on: bool) -> String {
    if on { "checked".to_string() } else { String::new() }
}

/// `<option>` list for the function filter selector.
fn function_options(selected: Option<u8>) -> String {
    let mut options = String::from("<option value=\"\">Any</option>\n");
    for (code, name) in FUNCTION_NAMES {
        let attr = if selected == Some(*code) { " selected" } else { "" };
        options.push_str(&format!(
            "<option value=\"{code}\"{attr}>{code:02} {name}</option>\n"
        ));
    }
    options
}

/// `<option>` list for the injected exception code selector.
fn error_options(selected: ExceptionCode) -> String {
    let mut options = String::new();
    for code in ExceptionCode::ALL {
        let value = *code as u8;
        let attr = if *code == selected { " selected" } else { "" };
        options.push_str(&format!(
            "<option value=\"{value}\"{attr}>{value:02} {}</option>\n",
            code.label()
        ));
    }
    options
}

/// One table row for a captured call record.
fn call_row(record: &CallRecord, mode: DisplayMode) -> String {
    let data = match (mode.show_decode, mode.show_hex) {
        (true, true) => format!(
            "{} <code>{}</code>",
            escape(&record.summary),
            hex_dump(&record.pdu)
        ),
        (false, true) => format!("<code>{}</code>", hex_dump(&record.pdu)),
        _ => escape(&record.summary),
    };
    format!(
        "<tr class=\"{dir}\"><td>{time}</td><td>{dir}</td><td>{fc:02} {name}</td><td>{addr}</td><td>{count}</td><td>{data}</td></tr>\n",
        dir = record.direction.as_str(),
        time = record.timestamp.format("%H:%M:%S%.3f"),
        fc = record.function,
        name = function_name(record.function),
        addr = record.address.map(|a| a.to_string()).unwrap_or_default(),
        count = record.count.map(|c| c.to_string()).unwrap_or_default(),
    )
}

fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
