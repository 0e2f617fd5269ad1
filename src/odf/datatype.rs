//! Typed value codecs for ODF attribute strings.
//!
//! Cell contents are stored as attribute strings (`office:value`,
//! `office:date-value`, ...). The [`OdfValue`] trait converts between those
//! strings and native types.

use crate::common::{Error, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Conversion between an ODF attribute string and a native value.
pub trait OdfValue: Sized {
    /// Parse the attribute representation.
    fn decode(data: &str) -> Result<Self>;

    /// Produce the attribute representation.
    fn encode(&self) -> String;
}

impl OdfValue for bool {
    /// Only the lowercase literals are valid.
    ///
    /// ```
    /// use longan::odf::datatype::OdfValue;
    /// assert_eq!(bool::decode("true").unwrap(), true);
    /// assert!(bool::decode("TRUE").is_err());
    /// ```
    fn decode(data: &str) -> Result<Self> {
        match data {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(Error::InvalidFormat(format!(
                "boolean '{}' is invalid, expected 'true' or 'false'",
                data
            ))),
        }
    }

    fn encode(&self) -> String {
        let literal = if *self { "true" } else { "false" };
        literal.to_string()
    }
}

impl OdfValue for f64 {
    fn decode(data: &str) -> Result<Self> {
        data.trim()
            .parse::<f64>()
            .map_err(|_| Error::InvalidFormat(format!("'{}' is not a number", data)))
    }

    /// Integral values are written without a fractional part.
    ///
    /// ```
    /// use longan::odf::datatype::OdfValue;
    /// assert_eq!(3.0f64.encode(), "3");
    /// assert_eq!(0.25f64.encode(), "0.25");
    /// ```
    fn encode(&self) -> String {
        if self.is_finite() && self.fract() == 0.0 && self.abs() < 1e15 {
            itoa::Buffer::new().format(*self as i64).to_string()
        } else if self.is_finite() {
            ryu::Buffer::new().format_finite(*self).to_string()
        } else {
            self.to_string()
        }
    }
}

impl OdfValue for NaiveDate {
    fn decode(data: &str) -> Result<Self> {
        NaiveDate::parse_from_str(data, "%Y-%m-%d")
            .map_err(|e| Error::InvalidFormat(format!("invalid date '{}': {}", data, e)))
    }

    fn encode(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }
}

impl OdfValue for NaiveDateTime {
    /// Accepts an optional fractional part and ignores a trailing `Z`.
    fn decode(data: &str) -> Result<Self> {
        let trimmed = data.trim_end_matches('Z');
        NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|e| Error::InvalidFormat(format!("invalid datetime '{}': {}", data, e)))
    }

    fn encode(&self) -> String {
        self.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
    }
}

impl OdfValue for Duration {
    /// ISO 8601 durations without year/month fields, e.g. `PT1H30M`,
    /// `P1DT2H`, `-PT5M`, `PT0.5S`.
    fn decode(data: &str) -> Result<Self> {
        let invalid = || Error::InvalidFormat(format!("invalid duration '{}'", data));

        let (negative, body) = match data.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, data),
        };
        let body = body.strip_prefix('P').ok_or_else(invalid)?;

        let mut millis: i64 = 0;
        let mut number = String::new();
        let mut in_time = false;
        for c in body.chars() {
            match c {
                '0'..='9' | '.' => number.push(c),
                'T' if !in_time && number.is_empty() => in_time = true,
                'D' | 'H' | 'M' | 'S' => {
                    let unit_ms = match (c, in_time) {
                        ('D', false) => 86_400_000.0,
                        ('H', true) => 3_600_000.0,
                        ('M', true) => 60_000.0,
                        ('S', true) => 1_000.0,
                        _ => return Err(invalid()),
                    };
                    let amount: f64 = number.parse().map_err(|_| invalid())?;
                    millis += (amount * unit_ms).round() as i64;
                    number.clear();
                },
                _ => return Err(invalid()),
            }
        }
        if !number.is_empty() {
            return Err(invalid());
        }

        let duration = Duration::milliseconds(millis);
        Ok(if negative { -duration } else { duration })
    }

    /// Always written as hours, minutes and seconds: `PT26H30M0S`.
    fn encode(&self) -> String {
        let total_ms = self.num_milliseconds();
        let sign = if total_ms < 0 { "-" } else { "" };
        let abs_ms = total_ms.unsigned_abs();

        let hours = abs_ms / 3_600_000;
        let minutes = (abs_ms % 3_600_000) / 60_000;
        let ms = abs_ms % 60_000;
        let seconds = if ms % 1000 == 0 {
            (ms / 1000).to_string()
        } else {
            (ms as f64 / 1000.0).encode()
        };

        format!("{}PT{}H{}M{}S", sign, hours, minutes, seconds)
    }
}
