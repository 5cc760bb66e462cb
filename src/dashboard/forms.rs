// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Form handling for the calls page
//!
//! Both dashboard forms submit to `/api/calls`; the clicked submit button
//! selects the action. All fields arrive as text so that a bad number can be
//! reported back through the page's error line instead of a 422, and an
//! empty text input means "not set". Checkboxes are simply present or
//! absent.

use std::str::FromStr;

use rocket::form::FromForm;

use crate::protocol::ExceptionCode;
use crate::simulator::{
    DisplayMode, InjectionConfig, MonitorFilter, ResponseMode, SimulatorState,
};

/// The combined field set of the monitoring and injection forms.
#[derive(Debug, Default, FromForm)]
pub struct CallsForm {
    pub range_start: Option<String>,
    pub range_stop: Option<String>,
    pub function: Option<String>,
    pub show_hex: Option<String>,
    pub show_decode: Option<String>,
    pub response_type: Option<String>,
    pub response_split: Option<String>,
    pub split_delay: Option<String>,
    pub response_cr: Option<String>,
    pub response_cr_pct: Option<String>,
    pub response_delay: Option<String>,
    pub response_junk_datalen: Option<String>,
    pub response_error: Option<String>,
    pub response_clear_after: Option<String>,
    pub submit: Option<String>,
}

impl CallsForm {
    /// Apply the submitted action to the simulator state.
    ///
    /// Returns the message for the page's error line; state is left
    /// untouched when any field fails to parse.
    pub fn apply(&self, state: &SimulatorState) -> Result<(), String> {
        match self.submit.as_deref() {
            // A plain page load carries no action
            None => Ok(()),
            Some("Monitor") => {
                let filter = self.parse_filter()?;
                let mode = DisplayMode {
                    show_hex: self.show_hex.is_some(),
                    show_decode: self.show_decode.is_some(),
                };
                state.monitor.lock().unwrap().start(filter, mode);
                Ok(())
            }
            Some("Clear") => {
                state.monitor.lock().unwrap().clear();
                Ok(())
            }
            Some("Stop") => {
                state.monitor.lock().unwrap().stop();
                Ok(())
            }
            Some("Set") => {
                let config = self.parse_injection()?;
                state.injector.lock().unwrap().set(config);
                Ok(())
            }
            Some("Reset") => {
                state.injector.lock().unwrap().reset();
                Ok(())
            }
            Some(other) => Err(format!("Unknown action: {other}")),
        }
    }

    fn parse_filter(&self) -> Result<MonitorFilter, String> {
        let range_start = parse_optional::<u16>("range_start", &self.range_start)?;
        let range_stop = parse_optional::<u16>("range_stop", &self.range_stop)?;
        if let (Some(start), Some(stop)) = (range_start, range_stop) {
            if start > stop {
                return Err(format!("Invalid address range: {start} - {stop}"));
            }
        }
        // Function code 0 means "all functions", like an empty selection
        let function = parse_optional::<u8>("function", &self.function)?.filter(|f| *f != 0);
        Ok(MonitorFilter {
            range_start,
            range_stop,
            function,
        })
    }

    fn parse_injection(&self) -> Result<InjectionConfig, String> {
        let response_type = parse_optional::<u8>("response_type", &self.response_type)?
            .unwrap_or(ResponseMode::Normal.as_u8());
        let mode = ResponseMode::from_u8(response_type)
            .ok_or_else(|| format!("Invalid response_type: {response_type}"))?;

        let error_value =
            parse_optional::<u8>("response_error", &self.response_error)?.unwrap_or(1);
        let error = ExceptionCode::from_u8(error_value)
            .ok_or_else(|| format!("Invalid response_error: {error_value}"))?;

        let change_rate_pct =
            parse_optional::<u8>("response_cr_pct", &self.response_cr_pct)?.unwrap_or(0);
        if change_rate_pct > 100 {
            return Err(format!("Invalid change rate: {change_rate_pct} percent"));
        }

        let defaults = InjectionConfig::default();
        Ok(InjectionConfig {
            mode,
            error,
            delay_secs: parse_optional::<u16>("response_delay", &self.response_delay)?
                .unwrap_or(defaults.delay_secs),
            split: self.response_split.is_some(),
            split_delay_secs: parse_optional::<u16>("split_delay", &self.split_delay)?
                .unwrap_or(defaults.split_delay_secs),
            change_rate_enabled: self.response_cr.is_some(),
            change_rate_pct,
            junk_len: parse_optional::<u16>("response_junk_datalen", &self.response_junk_datalen)?
                .unwrap_or(defaults.junk_len),
            clear_after: parse_optional::<u32>(
                "response_clear_after",
                &self.response_clear_after,
            )?
            .unwrap_or(defaults.clear_after),
        })
    }
}

/// Parse an optional text field, treating an empty input as unset.
fn parse_optional<T: FromStr>(name: &str, field: &Option<String>) -> Result<Option<T>, String> {
    match field.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("Invalid {name}: {text}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;

    fn monitor_form(submit: &str) -> CallsForm {
        CallsForm {
            range_start: Some("10".to_string()),
            range_stop: Some("20".to_string()),
            function: Some("3".to_string()),
            show_hex: Some("on".to_string()),
            submit: Some(submit.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn monitor_starts_capture_with_filter() {
        let state = SimulatorState::new(&DeviceConfig::default());
        monitor_form("Monitor").apply(&state).unwrap();
        let monitor = state.monitor.lock().unwrap();
        assert!(monitor.is_active());
        assert_eq!(monitor.filter().range_start, Some(10));
        assert_eq!(monitor.filter().range_stop, Some(20));
        assert_eq!(monitor.filter().function, Some(3));
        assert!(monitor.mode().show_hex);
        assert!(!monitor.mode().show_decode);
    }

    #[test]
    fn function_zero_means_all() {
        let state = SimulatorState::new(&DeviceConfig::default());
        let mut form = monitor_form("Monitor");
        form.function = Some("0".to_string());
        form.apply(&state).unwrap();
        assert_eq!(state.monitor.lock().unwrap().filter().function, None);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let state = SimulatorState::new(&DeviceConfig::default());
        let mut form = monitor_form("Monitor");
        form.range_start = Some("30".to_string());
        let err = form.apply(&state).unwrap_err();
        assert!(err.contains("Invalid address range"));
        assert!(!state.monitor.lock().unwrap().is_active());
    }

    #[test]
    fn bad_number_is_reported_with_field_name() {
        let state = SimulatorState::new(&DeviceConfig::default());
        let mut form = monitor_form("Monitor");
        form.range_start = Some("ten".to_string());
        let err = form.apply(&state).unwrap_err();
        assert!(err.contains("range_start"));
    }

    #[test]
    fn set_configures_injector() {
        let state = SimulatorState::new(&DeviceConfig::default());
        let form = CallsForm {
            response_type: Some("1".to_string()),
            response_error: Some("6".to_string()),
            response_delay: Some("2".to_string()),
            response_clear_after: Some("5".to_string()),
            submit: Some("Set".to_string()),
            ..Default::default()
        };
        form.apply(&state).unwrap();
        let injector = state.injector.lock().unwrap();
        assert_eq!(injector.config().mode, ResponseMode::Error);
        assert_eq!(injector.config().error, ExceptionCode::ServerDeviceBusy);
        assert_eq!(injector.config().delay_secs, 2);
        assert_eq!(injector.config().clear_after, 5);
    }

    #[test]
    fn invalid_error_code_is_rejected() {
        let state = SimulatorState::new(&DeviceConfig::default());
        let form = CallsForm {
            response_type: Some("1".to_string()),
            response_error: Some("7".to_string()),
            submit: Some("Set".to_string()),
            ..Default::default()
        };
        assert!(form.apply(&state).is_err());
        // State untouched on error
        assert_eq!(
            state.injector.lock().unwrap().config().mode,
            ResponseMode::Normal
        );
    }

    #[test]
    fn reset_restores_defaults() {
        let state = SimulatorState::new(&DeviceConfig::default());
        let form = CallsForm {
            response_type: Some("3".to_string()),
            submit: Some("Set".to_string()),
            ..Default::default()
        };
        form.apply(&state).unwrap();
        assert_eq!(
            state.injector.lock().unwrap().config().mode,
            ResponseMode::Junk
        );

        let reset = CallsForm {
            submit: Some("Reset".to_string()),
            ..Default::default()
        };
        reset.apply(&state).unwrap();
        assert_eq!(
            *state.injector.lock().unwrap().config(),
            InjectionConfig::default()
        );
    }

    #[test]
    fn unknown_submit_is_rejected() {
        let state = SimulatorState::new(&DeviceConfig::default());
        let form = CallsForm {
            submit: Some("Launch".to_string()),
            ..Default::default()
        };
        assert!(form.apply(&state).unwrap_err().contains("Launch"));
    }
}
