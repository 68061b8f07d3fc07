use std::borrow::Cow;

use serde::Deserialize;
use serde_json::Value;

use crate::error::PayloadError;
use crate::models::{AlertFeature, ForecastPeriod};

/// Formats one alert feature into a readable block.
///
/// Missing or `null` properties fall back to placeholder text. A feature without a
/// `properties` object is rejected.
pub fn format_alert(feature: &Value) -> Result<String, PayloadError> {
    let feature =
        AlertFeature::deserialize(feature).map_err(PayloadError::malformed("alert feature"))?;
    let props = &feature.properties;

    Ok(format!(
        "Event: {}\nArea: {}\nSeverity: {}\nDescription: {}\nInstructions: {}",
        or_default(&props.event, "Unknown"),
        or_default(&props.area_desc, "Unknown"),
        or_default(&props.severity, "Unknown"),
        or_default(&props.description, "No description available."),
        or_default(&props.instruction, "No specific instruction provided."),
    ))
}

/// Formats one forecast period. Every field is required.
pub fn format_period(period: &Value) -> Result<String, PayloadError> {
    let period =
        ForecastPeriod::deserialize(period).map_err(PayloadError::malformed("forecast period"))?;

    Ok(format!(
        "{}:\nTemperature: {}\u{00b0}{}\nWind: {} {}\nForecast: {}",
        period.name,
        period.temperature,
        period.temperature_unit,
        period.wind_speed,
        period.wind_direction,
        period.detailed_forecast
    ))
}

fn or_default<'a>(value: &'a Option<Value>, default: &'static str) -> Cow<'a, str> {
    match value {
        Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
        Some(other) => Cow::Owned(other.to_string()),
        None => Cow::Borrowed(default),
    }
}
