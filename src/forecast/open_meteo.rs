//! Open-Meteo forecast client
//!
//! Weather data is provided by <https://open-meteo.com/> under CC BY 4.0.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime};
use rand::RngExt;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::ForecastSource;
use crate::cache::ForecastCache;
use crate::config::WeatherConfig;
use crate::models::{DailyForecast, HourlySeries, Mountain, WeatherRecord};
use crate::{NavigatorError, Result};

pub const HOURLY_FIELDS: &str = "temperature_2m,apparent_temperature,precipitation,visibility";
pub const DAILY_FIELDS: &str =
    "precipitation_sum,weathercode,windspeed_10m_max,windgusts_10m_max,winddirection_10m_dominant";

const HOURLY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
const DAILY_DATE_FORMAT: &str = "%Y-%m-%d";

/// Forecast response from the Open-Meteo API
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    timezone: Option<String>,
    #[serde(default)]
    utc_offset_seconds: i32,
    hourly: Option<HourlyData>,
    daily: Option<DailyData>,
}

#[derive(Debug, Deserialize)]
struct HourlyData {
    time: Vec<String>,
    #[serde(rename = "temperature_2m", default)]
    temperature: Vec<Option<f64>>,
    #[serde(default)]
    apparent_temperature: Vec<Option<f64>>,
    #[serde(default)]
    precipitation: Vec<Option<f64>>,
    #[serde(default)]
    visibility: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct DailyData {
    time: Vec<String>,
    #[serde(rename = "precipitation_sum", default)]
    precipitation: Vec<Option<f64>>,
    #[serde(rename = "weathercode", default)]
    weather_code: Vec<Option<f64>>,
    #[serde(rename = "windspeed_10m_max", default)]
    wind_speed: Vec<Option<f64>>,
    #[serde(rename = "windgusts_10m_max", default)]
    wind_gusts: Vec<Option<f64>>,
    #[serde(rename = "winddirection_10m_dominant", default)]
    wind_direction: Vec<Option<f64>>,
}

/// Error body returned with non-success statuses
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    reason: String,
}

fn check_len(group: &str, field: &str, len: usize, expected: usize) -> Result<()> {
    if len == expected {
        Ok(())
    } else {
        Err(NavigatorError::validation(format!(
            "{group} field '{field}' has {len} entries, expected {expected}"
        )))
    }
}

impl HourlyData {
    fn into_series(self) -> Result<HourlySeries> {
        let date_times = self
            .time
            .iter()
            .map(|t| {
                NaiveDateTime::parse_from_str(t, HOURLY_TIME_FORMAT)
                    .map_err(|e| NavigatorError::parse(format!("Invalid hourly time '{t}': {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        HourlySeries::new(
            date_times,
            self.temperature,
            self.apparent_temperature,
            self.precipitation,
            self.visibility,
        )
    }
}

impl DailyData {
    fn into_rows(self) -> Result<Vec<DailyForecast>> {
        let expected = self.time.len();
        check_len("daily", "precipitation_sum", self.precipitation.len(), expected)?;
        check_len("daily", "weathercode", self.weather_code.len(), expected)?;
        check_len("daily", "windspeed_10m_max", self.wind_speed.len(), expected)?;
        check_len("daily", "windgusts_10m_max", self.wind_gusts.len(), expected)?;
        check_len("daily", "winddirection_10m_dominant", self.wind_direction.len(), expected)?;

        self.time
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let date = NaiveDate::parse_from_str(t, DAILY_DATE_FORMAT)
                    .map_err(|e| NavigatorError::parse(format!("Invalid daily date '{t}': {e}")))?;

                Ok(DailyForecast::new(
                    date,
                    self.weather_code[i].map(|code| code.round() as i64),
                    self.wind_direction[i].map(|deg| deg.round() as i32),
                    self.wind_gusts[i],
                    self.wind_speed[i],
                    self.precipitation[i],
                ))
            })
            .collect()
    }
}

/// Parse an Open-Meteo forecast body into a record.
///
/// Rejects empty objects, payloads without `hourly` or `daily`, unequal
/// array lengths within a group and unparseable timestamps.
pub fn parse_forecast(body: &str) -> Result<WeatherRecord> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    match value.as_object() {
        Some(object) if !object.is_empty() => {}
        _ => return Err(NavigatorError::parse("Forecast payload is not a non-empty JSON object")),
    }

    let response: ForecastResponse = serde_json::from_value(value)?;

    let hourly = response
        .hourly
        .ok_or_else(|| NavigatorError::parse("Forecast payload has no 'hourly' object"))?
        .into_series()?;
    let daily = response
        .daily
        .ok_or_else(|| NavigatorError::parse("Forecast payload has no 'daily' object"))?
        .into_rows()?;

    WeatherRecord::new(response.timezone, response.utc_offset_seconds, hourly, daily)
}

/// Forecast source backed by the Open-Meteo `/forecast` endpoint
pub struct OpenMeteoForecastSource {
    client: Client,
    base_url: String,
    cache: Option<ForecastCache>,
    cache_ttl: Duration,
}

impl OpenMeteoForecastSource {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("conditions-navigator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NavigatorError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache: None,
            cache_ttl: Duration::ZERO,
        })
    }

    /// Serve fresh payloads from `cache` and store new ones for about `ttl`
    #[must_use]
    pub fn with_cache(mut self, cache: ForecastCache, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    #[must_use]
    pub fn request_url(&self, mountain: &Mountain) -> String {
        format!(
            "{}/forecast?latitude={}&longitude={}&elevation={}&timezone=auto\
             &hourly={HOURLY_FIELDS}&daily={DAILY_FIELDS}",
            self.base_url,
            mountain.latitude(),
            mountain.longitude(),
            mountain.elevation(),
        )
    }

    async fn fetch_body(&self, url: &str) -> Result<String> {
        debug!("Open-Meteo request URL: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let reason = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.reason)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });
        Err(NavigatorError::api(format!(
            "Forecast request failed with status {status}: {reason}"
        )))
    }

    async fn cached_body(&self, mountain: &Mountain, date: NaiveDate) -> Option<String> {
        let cache = self.cache.as_ref()?;
        match cache.load_forecast(mountain, date).await {
            Ok(body) => body,
            Err(e) => {
                warn!("{}", NavigatorError::cache(format!("lookup failed: {e:#}")));
                None
            }
        }
    }

    async fn store_body(&self, mountain: &Mountain, date: NaiveDate, body: String) {
        let Some(cache) = &self.cache else {
            return;
        };

        let jitter: f32 = rand::rng().random_range(0.9..1.1);
        let ttl = self.cache_ttl.mul_f32(jitter);
        if let Err(e) = cache.store_forecast(mountain, date, body, ttl).await {
            warn!("{}", NavigatorError::cache(format!("store failed: {e:#}")));
        }
    }
}

#[async_trait]
impl ForecastSource for OpenMeteoForecastSource {
    #[instrument(skip(self, mountain), fields(mountain = %mountain.name()))]
    async fn fetch(&self, mountain: &Mountain) -> Result<WeatherRecord> {
        let today = Local::now().date_naive();

        if let Some(body) = self.cached_body(mountain, today).await {
            debug!("Using cached forecast");
            return parse_forecast(&body);
        }

        let start_time = Instant::now();
        let body = self.fetch_body(&self.request_url(mountain)).await?;
        let record = parse_forecast(&body)?;

        info!(
            "Retrieved forecast with {} hours and {} days in {:.3}s",
            record.hourly().len(),
            record.daily_len(),
            start_time.elapsed().as_secs_f64()
        );

        self.store_body(mountain, today, body).await;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(days: usize) -> serde_json::Value {
        let start = NaiveDate::from_ymd_opt(2023, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let hours = days * 24;
        let time: Vec<String> = (0..hours)
            .map(|h| {
                (start + chrono::Duration::hours(h as i64))
                    .format(HOURLY_TIME_FORMAT)
                    .to_string()
            })
            .collect();
        let dates: Vec<String> = (0..days)
            .map(|d| {
                (start.date() + chrono::Duration::days(d as i64))
                    .format(DAILY_DATE_FORMAT)
                    .to_string()
            })
            .collect();

        json!({
            "latitude": 56.8,
            "longitude": -5.0,
            "elevation": 1345.0,
            "utc_offset_seconds": 3600,
            "timezone": "Europe/London",
            "timezone_abbreviation": "BST",
            "hourly": {
                "time": time,
                "temperature_2m": (0..hours).map(|h| h as f64 / 10.0).collect::<Vec<_>>(),
                "apparent_temperature": (0..hours).map(|h| -(h as f64) / 10.0).collect::<Vec<_>>(),
                "precipitation": (0..hours).map(|h| (h % 5) as f64).collect::<Vec<_>>(),
                "visibility": vec![24140.0; hours],
            },
            "daily": {
                "time": dates,
                "precipitation_sum": vec![0.5; days],
                "weathercode": vec![3; days],
                "windspeed_10m_max": vec![12.4; days],
                "windgusts_10m_max": vec![30.2; days],
                "winddirection_10m_dominant": vec![225; days],
            }
        })
    }

    #[test]
    fn test_parse_full_week() {
        let record = parse_forecast(&payload(7).to_string()).unwrap();

        assert_eq!(record.hourly().len(), 168);
        assert_eq!(record.hourly().date_times().len(), 169);
        assert_eq!(record.hourly().temperature()[10], Some(1.0));
        assert_eq!(record.daily_len(), 7);
        assert_eq!(
            record.days(),
            vec!["Thu", "Fri", "Sat", "Sun", "Mon", "Tue", "Wed"]
        );
        assert_eq!(record.daily_weather_conditions()[0], "Overcast");
        assert_eq!(record.daily_wind_direction()[0], "SW");
        assert_eq!(record.timezone.as_deref(), Some("Europe/London"));
        assert_eq!(record.utc_offset_seconds, 3600);
    }

    #[test]
    fn test_parse_null_values_are_kept_as_missing() {
        let mut value = payload(1);
        value["hourly"]["temperature_2m"][3] = serde_json::Value::Null;
        value["daily"]["weathercode"][0] = serde_json::Value::Null;
        value["daily"]["windspeed_10m_max"][0] = serde_json::Value::Null;

        let record = parse_forecast(&value.to_string()).unwrap();
        assert_eq!(record.hourly().temperature()[3], None);
        let day = record.day(0).unwrap();
        assert_eq!(day.condition, "Unknown");
        assert_eq!(day.wind_speed, None);
    }

    #[test]
    fn test_parse_rejects_empty_object() {
        let result = parse_forecast("{}");
        assert!(matches!(result, Err(NavigatorError::Parse { .. })));

        let result = parse_forecast("[]");
        assert!(matches!(result, Err(NavigatorError::Parse { .. })));
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        let result = parse_forecast("not json");
        assert!(matches!(result, Err(NavigatorError::Parse { .. })));
    }

    #[test]
    fn test_parse_requires_both_groups() {
        let mut value = payload(1);
        value.as_object_mut().unwrap().remove("daily");
        let err = parse_forecast(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("daily"));
    }

    #[test]
    fn test_parse_rejects_unequal_daily_arrays() {
        let mut value = payload(2);
        value["daily"]["windgusts_10m_max"] = json!([10.0]);
        let err = parse_forecast(&value.to_string()).unwrap_err();
        assert!(matches!(err, NavigatorError::Validation { .. }));
        assert!(err.to_string().contains("windgusts_10m_max"));
    }

    #[test]
    fn test_parse_rejects_bad_timestamp() {
        let mut value = payload(1);
        value["hourly"]["time"][0] = json!("yesterday");
        let err = parse_forecast(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn test_request_url() {
        let config = WeatherConfig {
            base_url: "https://api.open-meteo.com/v1/".to_string(),
            timeout_seconds: 5,
        };
        let source = OpenMeteoForecastSource::new(&config).unwrap();
        let mountain = Mountain::new("Ben Nevis", 56.7969, -5.0036, 1345.0);

        assert_eq!(
            source.request_url(&mountain),
            "https://api.open-meteo.com/v1/forecast\
             ?latitude=56.7969&longitude=-5.0036&elevation=1345&timezone=auto\
             &hourly=temperature_2m,apparent_temperature,precipitation,visibility\
             &daily=precipitation_sum,weathercode,windspeed_10m_max,windgusts_10m_max,\
             winddirection_10m_dominant"
        );
    }

    /// Local stand-in for the forecast endpoint, answering under three prefixes
    async fn serve_forecasts() -> String {
        use axum::{Router, http::StatusCode, routing::get};

        let app = Router::new()
            .route("/ok/forecast", get(|| async { payload(7).to_string() }))
            .route(
                "/invalid/forecast",
                get(|| async {
                    (
                        StatusCode::BAD_REQUEST,
                        axum::Json(json!({"error": true, "reason": "Latitude must be in range"})),
                    )
                }),
            )
            .route(
                "/down/forecast",
                get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn source_for(base_url: String) -> OpenMeteoForecastSource {
        let config = WeatherConfig {
            base_url,
            timeout_seconds: 5,
        };
        OpenMeteoForecastSource::new(&config).unwrap()
    }

    fn ben_nevis() -> Mountain {
        Mountain::new("Ben Nevis", 56.7969, -5.0036, 1345.0)
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = serve_forecasts().await;
        let record = source_for(format!("{server}/ok"))
            .fetch(&ben_nevis())
            .await
            .unwrap();
        assert_eq!(record.daily_len(), 7);
    }

    #[tokio::test]
    async fn test_fetch_error_status_reports_reason() {
        let server = serve_forecasts().await;
        let err = source_for(format!("{server}/invalid"))
            .fetch(&ben_nevis())
            .await
            .unwrap_err();

        match err {
            NavigatorError::Api { message } => {
                assert!(message.contains("400"), "{message}");
                assert!(message.contains("Latitude must be in range"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_error_status_without_body_uses_status_text() {
        let server = serve_forecasts().await;
        let err = source_for(format!("{server}/down"))
            .fetch(&ben_nevis())
            .await
            .unwrap_err();

        match err {
            NavigatorError::Api { message } => {
                assert!(message.contains("503"), "{message}");
                assert!(message.ends_with("Service Unavailable"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_prefers_fresh_cache_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ForecastCache::open(dir.path()).unwrap();
        let today = Local::now().date_naive();
        cache
            .store_forecast(&ben_nevis(), today, payload(7).to_string(), Duration::from_secs(600))
            .await
            .unwrap();

        // Nothing listens on the discard port: a network request would fail
        let source = source_for("http://127.0.0.1:9".to_string())
            .with_cache(cache, Duration::from_secs(600));

        let record = source.fetch(&ben_nevis()).await.unwrap();
        assert_eq!(record.daily_len(), 7);
    }

    #[tokio::test]
    async fn test_fetch_stores_body_after_successful_parse() {
        let server = serve_forecasts().await;
        let dir = tempfile::tempdir().unwrap();
        let cache = ForecastCache::open(dir.path()).unwrap();
        let source =
            source_for(format!("{server}/ok")).with_cache(cache.clone(), Duration::from_secs(600));

        source.fetch(&ben_nevis()).await.unwrap();

        let stored = cache
            .load_forecast(&ben_nevis(), Local::now().date_naive())
            .await
            .unwrap();
        assert!(stored.is_some_and(|body| body.contains("Europe/London")));
    }
}
