// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{ConfigFile, EngineSection, ProtocolConfig, ProtocolSection, RawConfigFile};
use crate::errors::{Result, SupervisorError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SupervisorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_engine(&raw.engine)?;
        let protocol = validate_protocol(raw.protocol)?;
        Ok(ConfigFile::new_unchecked(raw.engine, protocol))
    }
}

fn validate_engine(engine: &EngineSection) -> Result<()> {
    if let Some(program) = &engine.program {
        if program.trim().is_empty() {
            return Err(SupervisorError::ConfigError(
                "[engine].program must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_protocol(protocol: ProtocolSection) -> Result<ProtocolConfig> {
    let token = protocol.ready_token.trim();
    if token.is_empty() {
        return Err(SupervisorError::ConfigError(
            "[protocol].ready_token must not be blank".to_string(),
        ));
    }
    if token.contains(['\n', '\r']) {
        return Err(SupervisorError::ConfigError(
            "[protocol].ready_token must be a single line".to_string(),
        ));
    }

    for (idx, cmd) in protocol.commands.iter().enumerate() {
        if cmd.contains(['\n', '\r']) {
            return Err(SupervisorError::ConfigError(format!(
                "[protocol].commands[{idx}] contains a line break; each command must be one line"
            )));
        }
    }

    let grace_period = match protocol.grace_period.as_deref() {
        Some(s) => parse_duration(s).map_err(|e| {
            SupervisorError::ConfigError(format!("[protocol].grace_period: {e}"))
        })?,
        None => Duration::ZERO,
    };

    Ok(ProtocolConfig {
        ready_token: token.to_string(),
        grace_period,
        commands: protocol.commands,
    })
}

/// Parse a duration like `"250ms"`, `"3s"`, `"1m"` or `"2h"`.
///
/// A bare number is rejected so that `grace_period = "500"` cannot be read
/// as the wrong unit. Values that do not fit a `Duration` are errors.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("'{s}' has no unit; use ms, s, m or h"))?;
    let (digits, unit) = s.split_at(split);

    if digits.is_empty() {
        return Err(format!("'{s}' does not start with a number"));
    }
    let amount: u64 = digits
        .parse()
        .map_err(|_| format!("'{digits}' is too large"))?;

    let seconds_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
        "ms" => return Ok(Duration::from_millis(amount)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        other => return Err(format!("unknown unit '{other}'; use ms, s, m or h")),
    };
    amount
        .checked_mul(seconds_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("'{s}' is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration(" 3s "), Ok(Duration::from_secs(3)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    }

    #[test]
    fn rejects_malformed_durations() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("15").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("3 days").is_err());
    }

    #[test]
    fn oversized_durations_are_errors_not_overflows() {
        assert!(parse_duration("99999999999999999h").unwrap_err().contains("too large"));
        assert!(parse_duration("999999999999999999m").is_err());
        assert!(parse_duration("99999999999999999999999s").is_err());
        assert_eq!(
            parse_duration("18446744073709551615s"),
            Ok(Duration::from_secs(u64::MAX))
        );
    }

    #[test]
    fn oversized_grace_period_is_a_config_error() {
        let mut raw = RawConfigFile::default();
        raw.protocol.grace_period = Some("99999999999999999h".into());
        match ConfigFile::try_from(raw) {
            Err(SupervisorError::ConfigError(msg)) => assert!(msg.contains("grace_period")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn default_raw_config_is_valid_and_immediate() {
        let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
        assert_eq!(cfg.protocol.ready_token, "ENGINE_READY");
        assert_eq!(cfg.protocol.grace_period, Duration::ZERO);
        assert_eq!(cfg.protocol.commands.last().map(String::as_str), Some("SIGHUP"));
        assert!(cfg.engine.program.is_none());
    }

    #[test]
    fn ready_token_is_stored_trimmed() {
        let mut raw = RawConfigFile::default();
        raw.protocol.ready_token = "  GO  ".to_string();
        let cfg = ConfigFile::try_from(raw).unwrap();
        assert_eq!(cfg.protocol.ready_token, "GO");
    }

    #[test]
    fn multi_line_command_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.protocol.commands = vec!["ok".into(), "two\nlines".into()];

        match ConfigFile::try_from(raw) {
            Err(SupervisorError::ConfigError(msg)) => assert!(msg.contains("commands[1]")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn blank_program_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.engine.program = Some("   ".into());
        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(SupervisorError::ConfigError(_))
        ));
    }
}
