// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hydrowatch_core::{warn, SensorId};
use hydrowatch_error::ConfigError;
use reqwest::Url;
use std::collections::BTreeMap;
use std::fmt;

/// Default base URL of the telemetry cloud.
pub const DEFAULT_BASE_URL: &str = "https://blynk.cloud/external/api";

/// Default virtual pin of each sensor.
pub const DEFAULT_PINS: [(SensorId, &str); 4] = [
    (SensorId::Tds, "V0"),
    (SensorId::Ec, "V7"),
    (SensorId::Temperature, "V2"),
    (SensorId::Humidity, "V3"),
];

/// Authentication token, kept out of `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Decodes the configured token.
///
/// Tokens are normally stored base64-encoded. A value that is not valid
/// base64, or that decodes to something other than non-empty UTF-8, is used
/// verbatim and a warning is logged.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidToken`] if the token is empty.
pub fn decode_token(raw: &str) -> Result<Token, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ConfigError::invalid_token("token is empty"));
    }

    let decoded = STANDARD
        .decode(raw)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty());

    match decoded {
        Some(token) => Ok(Token(token)),
        None => {
            warn!("Auth token is not base64-encoded; using it as-is");
            Ok(Token(raw.to_owned()))
        }
    }
}

/// Where and how to ask for each sensor's value.
#[derive(Debug, Clone)]
pub struct Endpoint {
    base: Url,
    token: Token,
    pins: BTreeMap<SensorId, String>,
}

impl Endpoint {
    /// # Errors
    ///
    /// - [`ConfigError::InvalidEndpoint`] if `base` is not an http(s) URL.
    /// - [`ConfigError::InvalidValue`] if a sensor has no pin, or a pin is blank.
    pub fn new(
        base: &str,
        token: Token,
        pins: BTreeMap<SensorId, String>,
    ) -> Result<Self, ConfigError> {
        let trimmed = base.trim().trim_end_matches('/');
        let url = Url::parse(trimmed).map_err(|e| ConfigError::InvalidEndpoint {
            url: base.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint {
                url: base.to_owned(),
                reason: format!("unsupported scheme `{}`", url.scheme()),
            });
        }

        for sensor in SensorId::ALL {
            match pins.get(&sensor) {
                Some(pin) if !pin.trim().is_empty() => {}
                _ => {
                    return Err(ConfigError::invalid_value(
                        "pins",
                        format!("no pin mapped for {sensor}"),
                    ))
                }
            }
        }

        Ok(Self {
            base: url,
            token,
            pins,
        })
    }

    /// Endpoint with the default pin mapping.
    ///
    /// # Errors
    ///
    /// See [`Endpoint::new`].
    pub fn with_default_pins(base: &str, token: Token) -> Result<Self, ConfigError> {
        let pins = DEFAULT_PINS
            .iter()
            .map(|(id, pin)| (*id, (*pin).to_owned()))
            .collect();
        Self::new(base, token, pins)
    }

    #[must_use]
    pub fn pin(&self, sensor: SensorId) -> Option<&str> {
        self.pins.get(&sensor).map(String::as_str)
    }

    /// `<base>/get?token=<T>&<pin>`
    #[must_use]
    pub fn sample_url(&self, sensor: SensorId) -> Option<Url> {
        let pin = self.pin(sensor)?;
        let mut url = self.path("get");
        url.query_pairs_mut()
            .append_pair("token", self.token.expose())
            .append_key_only(pin.trim());
        Some(url)
    }

    /// `<base>/isHardwareConnected?token=<T>`
    #[must_use]
    pub fn hardware_url(&self) -> Url {
        let mut url = self.path("isHardwareConnected");
        url.query_pairs_mut().append_pair("token", self.token.expose());
        url
    }

    fn path(&self, leaf: &str) -> Url {
        let mut url = self.base.clone();
        let joined = format!("{}/{leaf}", url.path().trim_end_matches('/'));
        url.set_path(&joined);
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(raw: &str) -> Token {
        Token(raw.to_owned())
    }

    #[test]
    fn decodes_base64_token() {
        // "secret-token"
        let decoded = decode_token("c2VjcmV0LXRva2Vu").unwrap();
        assert_eq!(decoded.expose(), "secret-token");
    }

    #[test]
    fn falls_back_to_raw_token() {
        let decoded = decode_token("not*base64!").unwrap();
        assert_eq!(decoded.expose(), "not*base64!");
    }

    #[test]
    fn rejects_empty_token() {
        assert!(matches!(decode_token("  "), Err(ConfigError::InvalidToken { .. })));
    }

    #[test]
    fn debug_hides_token() {
        assert_eq!(format!("{:?}", token("abc")), "Token(***)");
    }

    #[test]
    fn builds_sample_and_probe_urls() {
        let endpoint = Endpoint::with_default_pins("https://example.test/external/api/", token("abc")).unwrap();

        assert_eq!(
            endpoint.sample_url(SensorId::Ec).unwrap().as_str(),
            "https://example.test/external/api/get?token=abc&V7"
        );
        assert_eq!(
            endpoint.hardware_url().as_str(),
            "https://example.test/external/api/isHardwareConnected?token=abc"
        );
    }

    #[test]
    fn requires_every_sensor_pin() {
        let pins = BTreeMap::from([(SensorId::Tds, "V0".to_owned())]);
        assert!(Endpoint::new("https://example.test", token("abc"), pins).is_err());
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(matches!(
            Endpoint::with_default_pins("ftp://example.test", token("abc")),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
        assert!(Endpoint::with_default_pins("not a url", token("abc")).is_err());
    }
}
