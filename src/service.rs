use anyhow::Result;
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters, ServerHandler},
    model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    ErrorData as McpError,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::NwsClient;
use crate::config::WeatherConfig;
use crate::constants::{
    ALERTS_UNAVAILABLE, BLOCK_SEPARATOR, FORECAST_PERIODS, FORECAST_UNAVAILABLE,
    NO_ACTIVE_ALERTS, POINTS_UNAVAILABLE,
};
use crate::error::PayloadError;
use crate::formatters::{format_alert, format_period};
use crate::models::{
    ForecastResponse, GetAlertsRequest, GetForecastRequest, Payload, PointsResponse,
};

/// Main weather service that handles MCP requests
#[derive(Clone)]
pub struct Weather {
    client: NwsClient,
    tool_router: ToolRouter<Self>,
}

impl Weather {
    /// Creates a new Weather service instance
    pub fn new(config: WeatherConfig) -> Result<Self> {
        Ok(Self {
            client: NwsClient::new(&config)?,
            tool_router: Self::tool_router(),
        })
    }

    /// Fetches `url`, logging and discarding the failure reason.
    async fn fetch_or_none(&self, url: &str) -> Option<Payload> {
        match self.client.fetch(url).await {
            Ok(payload) if !payload.is_empty() => Some(payload),
            Ok(_) => {
                tracing::warn!(url, "provider returned an empty payload");
                None
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "provider request failed");
                None
            }
        }
    }

    /// Active alerts for `state`, one block per feature.
    pub async fn alerts_for_state(&self, state: &str) -> Result<String, PayloadError> {
        let url = self.client.alerts_url(state);
        let Some(payload) = self.fetch_or_none(&url).await else {
            return Ok(ALERTS_UNAVAILABLE.to_string());
        };

        let features = match payload.get("features") {
            None => return Ok(ALERTS_UNAVAILABLE.to_string()),
            Some(Value::Null) => return Ok(NO_ACTIVE_ALERTS.to_string()),
            Some(Value::Array(features)) if features.is_empty() => {
                return Ok(NO_ACTIVE_ALERTS.to_string())
            }
            Some(Value::Array(features)) => features,
            Some(_) => {
                return Err(PayloadError::UnexpectedShape {
                    what: "alert collection",
                    expected: "an array of features",
                })
            }
        };

        let alerts = features
            .iter()
            .map(format_alert)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(alerts.join(BLOCK_SEPARATOR))
    }

    /// Forecast for the first few periods at a coordinate pair.
    ///
    /// Resolves the point to its forecast locator first, then reads the forecast itself.
    pub async fn forecast_for_point(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<String, PayloadError> {
        let points_url = self.client.points_url(latitude, longitude);
        let Some(points) = self.fetch_or_none(&points_url).await else {
            return Ok(POINTS_UNAVAILABLE.to_string());
        };

        let points = PointsResponse::deserialize(Value::Object(points))
            .map_err(PayloadError::malformed("points lookup"))?;

        let Some(forecast) = self.fetch_or_none(&points.properties.forecast).await else {
            return Ok(FORECAST_UNAVAILABLE.to_string());
        };

        let forecast = ForecastResponse::deserialize(Value::Object(forecast))
            .map_err(PayloadError::malformed("forecast"))?;

        let periods = forecast
            .properties
            .periods
            .iter()
            .take(FORECAST_PERIODS)
            .map(format_period)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(periods.join(BLOCK_SEPARATOR))
    }
}

fn invocation_error(e: PayloadError) -> McpError {
    tracing::error!(error = %e, "tool invocation failed");
    McpError::internal_error(
        "Error: malformed provider response",
        Some(json!({"reason": e.to_string()})),
    )
}

#[tool_handler]
impl ServerHandler for Weather {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "weather".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                title: None,
                website_url: None,
            },
            instructions: Some(
                "Weather alerts and short-range forecasts from the National Weather Service API. \
                Use get_alerts with a two-letter US state code, or get_forecast with a latitude and longitude."
                    .to_string(),
            ),
        }
    }
}

#[tool_router]
impl Weather {
    /// Gets active weather alerts for a US state
    #[tool(description = "Get weather alerts for a US state. Provide a two-letter US state code (e.g. CA, NY).")]
    async fn get_alerts(
        &self,
        Parameters(request): Parameters<GetAlertsRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!("Getting alerts for state: {}", request.state);

        let text = self
            .alerts_for_state(&request.state)
            .await
            .map_err(invocation_error)?;

        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Gets the forecast for a latitude/longitude pair
    #[tool(description = "Get weather forecast for a location. Provide the latitude and longitude of the location.")]
    async fn get_forecast(
        &self,
        Parameters(request): Parameters<GetForecastRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            "Getting forecast for coordinates: {}, {}",
            request.latitude,
            request.longitude
        );

        let text = self
            .forecast_for_point(request.latitude, request.longitude)
            .await
            .map_err(invocation_error)?;

        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use rmcp::model::{ErrorCode, RawContent};

    fn service(server: &MockServer) -> Weather {
        Weather::new(WeatherConfig {
            api_base: server.base_url(),
            ..Default::default()
        })
        .unwrap()
    }

    fn only_text(result: &CallToolResult) -> &str {
        assert_eq!(result.content.len(), 1);
        match &result.content[0].raw {
            RawContent::Text(text) => text.text.as_str(),
            other => panic!("expected text content, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn get_alerts_returns_fallback_as_single_text_item() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/alerts/active/area/CA");
                then.status(200).json_body(json!({ "features": [] }));
            })
            .await;

        let result = service(&server)
            .get_alerts(Parameters(GetAlertsRequest {
                state: "CA".into(),
            }))
            .await
            .unwrap();

        assert_eq!(only_text(&result), NO_ACTIVE_ALERTS);
        assert_ne!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn get_alerts_malformed_feature_is_internal_error_with_reason() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/alerts/active/area/WA");
                then.status(200)
                    .json_body(json!({ "features": [{ "id": "urn:oid:2" }] }));
            })
            .await;

        let err = service(&server)
            .get_alerts(Parameters(GetAlertsRequest {
                state: "WA".into(),
            }))
            .await
            .unwrap_err();

        assert_eq!(err.code.0, ErrorCode::INTERNAL_ERROR.0);
        let reason = err.data.as_ref().unwrap()["reason"].as_str().unwrap();
        assert!(reason.contains("alert feature"));
    }

    #[tokio::test]
    async fn get_forecast_returns_fallback_as_single_text_item() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/points/39.7456,-97.0892");
                then.status(500);
            })
            .await;

        let result = service(&server)
            .get_forecast(Parameters(GetForecastRequest {
                latitude: 39.7456,
                longitude: -97.0892,
            }))
            .await
            .unwrap();

        assert_eq!(only_text(&result), POINTS_UNAVAILABLE);
    }
}
