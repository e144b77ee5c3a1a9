use super::ConversationSettings;
use super::ModelName;
use super::SettingsError;
use super::Temperature;

#[test]
fn it_parses_allowed_models() {
    assert_eq!(ModelName::parse("gpt-4o").unwrap(), ModelName::Gpt4o);
    assert_eq!(ModelName::parse("gpt-4o-mini").unwrap(), ModelName::Gpt4oMini);
    assert_eq!(ModelName::Gpt4oMini.to_string(), "gpt-4o-mini");
}

#[test]
fn it_rejects_unknown_models() {
    let res = ModelName::parse("gpt-2").unwrap_err();
    insta::assert_snapshot!(res.to_string(), @"Model gpt-2 is not supported. Possible values are: gpt-4o, gpt-4o-mini");
}

#[test]
fn it_accepts_allowed_temperatures() {
    for value in Temperature::ALLOWED {
        assert_eq!(Temperature::new(value).unwrap().value(), value);
    }
    assert_eq!(Temperature::parse("0.9").unwrap().value(), 0.9);
}

#[test]
fn it_rejects_other_temperatures() {
    let res = Temperature::new(1.5).unwrap_err();
    assert_eq!(
        res,
        SettingsError::UnsupportedTemperature("1.5".to_string(), "0.2, 0.7, 0.9".to_string())
    );
    assert!(Temperature::parse("warm").is_err());
}

#[test]
fn it_serializes_temperature_as_a_number() {
    let res = serde_json::to_string(&Temperature::new(0.2).unwrap()).unwrap();
    assert_eq!(res, "0.2");
}

#[test]
fn it_defaults_settings() {
    let settings = ConversationSettings::default();
    assert_eq!(settings.model, ModelName::Gpt4o);
    assert_eq!(settings.temperature.value(), 0.7);
}

#[test]
fn it_parses_settings() {
    let settings = ConversationSettings::parse("gpt-4o-mini", "0.2").unwrap();
    assert_eq!(settings.model, ModelName::Gpt4oMini);
    assert_eq!(settings.temperature.to_string(), "0.2");
}
