use crate::tools::format_amount;
use crate::traits::{ParamSpec, Tool, ToolArgs};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
/// The free forecast feed has 3-hour samples for five days.
pub const FORECAST_MAX_DAYS: i64 = 5;
const SAMPLES_PER_DAY: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDay {
    pub date: String,
    pub temperature: f64,
    pub description: String,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, city: &str) -> anyhow::Result<CurrentWeather>;

    async fn forecast(&self, city: &str, days: usize) -> anyhow::Result<Vec<ForecastDay>>;
}

#[derive(Debug, Deserialize)]
struct OwmCurrent {
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmCondition>,
}

#[derive(Debug, Deserialize)]
struct OwmForecast {
    list: Vec<OwmSample>,
}

#[derive(Debug, Deserialize)]
struct OwmSample {
    dt_txt: String,
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmCondition>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: String,
}

fn first_description(conditions: &[OwmCondition]) -> String {
    conditions
        .first()
        .map(|c| c.description.clone())
        .unwrap_or_else(|| "N/A".to_string())
}

pub struct OpenWeatherMap {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenWeatherMap {
    pub fn new(api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            base_url: OPENWEATHER_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> anyhow::Result<T> {
        let api_key = self
            .api_key
            .as_deref()
            .context("no OpenWeatherMap API key configured")?;

        let response = self
            .client
            .get(format!("{}/{}", self.base_url, endpoint))
            .query(query)
            .query(&[("appid", api_key), ("units", "metric")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenWeatherMap error {}: {}", status, body);
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherMap {
    async fn current(&self, city: &str) -> anyhow::Result<CurrentWeather> {
        let data: OwmCurrent = self.get("weather", &[("q", city.to_string())]).await?;
        Ok(CurrentWeather {
            temperature: data.main.temp,
            description: first_description(&data.weather),
        })
    }

    async fn forecast(&self, city: &str, days: usize) -> anyhow::Result<Vec<ForecastDay>> {
        let data: OwmForecast = self
            .get(
                "forecast",
                &[
                    ("q", city.to_string()),
                    ("cnt", (days * SAMPLES_PER_DAY).to_string()),
                ],
            )
            .await?;

        Ok(data
            .list
            .iter()
            .step_by(SAMPLES_PER_DAY)
            .take(days)
            .map(|sample| ForecastDay {
                date: sample
                    .dt_txt
                    .split(' ')
                    .next()
                    .unwrap_or(&sample.dt_txt)
                    .to_string(),
                temperature: sample.main.temp,
                description: first_description(&sample.weather),
            })
            .collect())
    }
}

pub struct CurrentWeatherTool {
    provider: Arc<dyn WeatherProvider>,
}

impl CurrentWeatherTool {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for CurrentWeatherTool {
    fn name(&self) -> &str {
        "get_current_weather"
    }

    fn description(&self) -> &str {
        "Get current weather for a city"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::string("city", "Name of the city")]
    }

    async fn execute(&self, args: ToolArgs) -> anyhow::Result<String> {
        let city = args.str("city")?;
        let weather = self
            .provider
            .current(city)
            .await
            .with_context(|| format!("Could not fetch weather for {city}"))?;

        Ok(format!(
            "Current weather in {}: {}°C, {}",
            city,
            format_amount(weather.temperature),
            weather.description
        ))
    }
}

pub struct WeatherForecastTool {
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherForecastTool {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for WeatherForecastTool {
    fn name(&self) -> &str {
        "get_weather_forecast"
    }

    fn description(&self) -> &str {
        "Get the daily weather forecast for a city (up to 5 days ahead)"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::string("city", "Name of the city"),
            ParamSpec::integer("days", "Number of days to forecast (1-5)").with_default(5),
        ]
    }

    async fn execute(&self, args: ToolArgs) -> anyhow::Result<String> {
        let city = args.str("city")?;
        let days = args.i64("days")?;
        if !(1..=FORECAST_MAX_DAYS).contains(&days) {
            anyhow::bail!("days must be between 1 and {FORECAST_MAX_DAYS}, got {days}");
        }

        let forecast = self
            .provider
            .forecast(city, days as usize)
            .await
            .with_context(|| format!("Could not fetch forecast for {city}"))?;

        if forecast.is_empty() {
            anyhow::bail!("Could not fetch forecast for {city}: no samples returned");
        }

        let lines: Vec<String> = forecast
            .iter()
            .map(|day| {
                format!(
                    "{}: {}°C, {}",
                    day.date,
                    format_amount(day.temperature),
                    day.description
                )
            })
            .collect();

        Ok(format!("Weather forecast for {}:\n{}", city, lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedWeather;

    #[async_trait]
    impl WeatherProvider for FixedWeather {
        async fn current(&self, city: &str) -> anyhow::Result<CurrentWeather> {
            if city == "Atlantis" {
                anyhow::bail!("city not found");
            }
            Ok(CurrentWeather {
                temperature: 29.456,
                description: "clear sky".into(),
            })
        }

        async fn forecast(&self, _city: &str, days: usize) -> anyhow::Result<Vec<ForecastDay>> {
            Ok((0..days)
                .map(|i| ForecastDay {
                    date: format!("2025-08-{:02}", 8 + i),
                    temperature: 30.0 - i as f64,
                    description: "light rain".into(),
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn current_weather_formats_observation() {
        let tool = CurrentWeatherTool::new(Arc::new(FixedWeather));
        let out = tool
            .execute(ToolArgs::from_value(json!({"city": "Venice"})))
            .await
            .unwrap();
        assert_eq!(out, "Current weather in Venice: 29.46°C, clear sky");
    }

    #[tokio::test]
    async fn current_weather_failure_names_city() {
        let tool = CurrentWeatherTool::new(Arc::new(FixedWeather));
        let err = tool
            .execute(ToolArgs::from_value(json!({"city": "Atlantis"})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Could not fetch weather for Atlantis"));
    }

    #[tokio::test]
    async fn forecast_lists_one_line_per_day() {
        let tool = WeatherForecastTool::new(Arc::new(FixedWeather));
        let out = tool
            .execute(ToolArgs::from_value(json!({"city": "Venice", "days": 3})))
            .await
            .unwrap();
        assert!(out.starts_with("Weather forecast for Venice:\n"));
        assert_eq!(out.lines().count(), 4);
        assert!(out.contains("2025-08-10: 28°C, light rain"));
    }

    #[tokio::test]
    async fn forecast_rejects_out_of_range_days() {
        let tool = WeatherForecastTool::new(Arc::new(FixedWeather));
        let err = tool
            .execute(ToolArgs::from_value(json!({"city": "Venice", "days": 9})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("between 1 and 5"));
    }

    #[tokio::test]
    async fn missing_api_key_is_an_error() {
        let owm = OpenWeatherMap::new(None);
        let err = owm.current("Venice").await.unwrap_err();
        assert!(err.to_string().contains("API key"));
    }
}
