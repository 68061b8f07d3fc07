/// User agent string for HTTP requests
pub const USER_AGENT: &str = "weather-app/1.0";

/// National Weather Service API base URL
pub const NWS_API_BASE: &str = "https://api.weather.gov";

/// Media type requested from the NWS API
pub const GEO_JSON: &str = "application/geo+json";

/// Per-request timeout in seconds
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Number of forecast periods rendered by `get_forecast`
pub const FORECAST_PERIODS: usize = 5;

/// Separator placed between formatted blocks
pub const BLOCK_SEPARATOR: &str = "\n---\n";

pub const ALERTS_UNAVAILABLE: &str = "Unable to fetch alerts or no alerts found.";
pub const NO_ACTIVE_ALERTS: &str = "No active alerts for this state.";
pub const POINTS_UNAVAILABLE: &str = "Unable to fetch forecast data for this location.";
pub const FORECAST_UNAVAILABLE: &str = "Unable to fetch detailed forecast.";
