#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;

use std::fmt;
use std::str::FromStr;

use serde_derive::Serialize;
use strum::EnumString;
use strum::EnumVariantNames;
use strum::VariantNames;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum SettingsError {
    #[error("Model {0} is not supported. Possible values are: {1}")]
    UnknownModel(String, String),
    #[error("Temperature {0} is not supported. Possible values are: {1}")]
    UnsupportedTemperature(String, String),
}

#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    EnumString,
    EnumVariantNames,
    strum::Display,
)]
pub enum ModelName {
    #[default]
    #[strum(serialize = "gpt-4o")]
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[strum(serialize = "gpt-4o-mini")]
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
}

impl ModelName {
    pub fn parse(name: &str) -> Result<ModelName, SettingsError> {
        return ModelName::from_str(name.trim()).map_err(|_| {
            return SettingsError::UnknownModel(
                name.to_string(),
                ModelName::VARIANTS.join(", "),
            );
        });
    }
}

/// Sampling temperature restricted to the values the backend accepts.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Temperature(f64);

impl Temperature {
    pub const ALLOWED: [f64; 3] = [0.2, 0.7, 0.9];

    pub fn new(value: f64) -> Result<Temperature, SettingsError> {
        if let Some(allowed) = Temperature::ALLOWED
            .iter()
            .find(|allowed| return (**allowed - value).abs() < f64::EPSILON)
        {
            return Ok(Temperature(*allowed));
        }

        return Err(SettingsError::UnsupportedTemperature(
            value.to_string(),
            Temperature::allowed_strings().join(", "),
        ));
    }

    pub fn parse(value: &str) -> Result<Temperature, SettingsError> {
        let parsed = value.trim().parse::<f64>().map_err(|_| {
            return SettingsError::UnsupportedTemperature(
                value.to_string(),
                Temperature::allowed_strings().join(", "),
            );
        })?;

        return Temperature::new(parsed);
    }

    pub fn value(&self) -> f64 {
        return self.0;
    }

    pub fn allowed_strings() -> Vec<String> {
        return Temperature::ALLOWED
            .iter()
            .map(|value| return value.to_string())
            .collect();
    }
}

impl Default for Temperature {
    fn default() -> Temperature {
        return Temperature(0.7);
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}", self.0);
    }
}

/// Applies to every send issued after it changes. Already sent messages are
/// never touched.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ConversationSettings {
    pub model: ModelName,
    pub temperature: Temperature,
}

impl ConversationSettings {
    pub fn parse(model: &str, temperature: &str) -> Result<ConversationSettings, SettingsError> {
        return Ok(ConversationSettings {
            model: ModelName::parse(model)?,
            temperature: Temperature::parse(temperature)?,
        });
    }
}
