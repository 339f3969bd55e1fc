use crate::agent::ToolRegistry;
use crate::config::Config;
use crate::error::RegistryError;
use std::sync::Arc;
use std::time::Duration;

pub mod calculator;
pub mod currency;
pub mod planning;
pub mod search;
pub mod weather;

pub use calculator::{CalcOp, CalculatorTool};
pub use currency::{ConvertCurrencyTool, CurrencyProvider, ExchangeRateApi, ExchangeRateTool};
pub use planning::{CompleteTravelPlanTool, DailyPlanTool};
pub use search::{
    DEFAULT_SEARCH_BUDGET, DuckDuckGoSearch, SearchChain, SearchKind, SearchProvider,
    SearchProviders, SearchTool, SerpApiSearch, SerperSearch,
};
pub use weather::{
    CurrentWeather, CurrentWeatherTool, ForecastDay, OpenWeatherMap, WeatherForecastTool,
    WeatherProvider,
};

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Renders a rounded amount without trailing zeros (`500`, `33.33`).
pub fn format_amount(value: f64) -> String {
    format!("{}", round2(value))
}

/// Upstream clients shared by every session. Built once at startup and handed
/// to the tools that need them.
#[derive(Clone)]
pub struct TravelServices {
    pub weather: Arc<dyn WeatherProvider>,
    pub currency: Arc<dyn CurrencyProvider>,
    pub search: SearchProviders,
}

impl TravelServices {
    pub fn from_config(config: &Config) -> Self {
        let keys = &config.api_keys;

        Self {
            weather: Arc::new(OpenWeatherMap::new(keys.openweather.clone())),
            currency: Arc::new(ExchangeRateApi::new(keys.exchange_rate.clone())),
            search: SearchProviders {
                serpapi: keys
                    .serpapi
                    .clone()
                    .map(|key| Arc::new(SerpApiSearch::new(key)) as Arc<dyn SearchProvider>),
                serper: keys
                    .serper
                    .clone()
                    .map(|key| Arc::new(SerperSearch::new(key)) as Arc<dyn SearchProvider>),
                baseline: Arc::new(DuckDuckGoSearch::new()),
            },
        }
    }
}

/// Registers the full travel toolset in the order the model sees it.
/// `search_budget` bounds each search chain and must stay below the tool
/// timeout so the baseline provider always gets its turn.
pub fn build_registry(
    services: &TravelServices,
    min_search_chars: usize,
    search_budget: Duration,
) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();

    for kind in [
        SearchKind::Attractions,
        SearchKind::Restaurants,
        SearchKind::Transportation,
    ] {
        registry.register(Arc::new(SearchTool::new(
            kind,
            services.search.chain_for(kind, min_search_chars, search_budget),
        )))?;
    }

    registry.register(Arc::new(CurrentWeatherTool::new(services.weather.clone())))?;
    registry.register(Arc::new(WeatherForecastTool::new(services.weather.clone())))?;
    registry.register(Arc::new(SearchTool::new(
        SearchKind::Hotels,
        services.search.chain_for(SearchKind::Hotels, min_search_chars, search_budget),
    )))?;

    for op in CalcOp::ALL {
        registry.register(Arc::new(CalculatorTool::new(op)))?;
    }

    registry.register(Arc::new(ExchangeRateTool::new(services.currency.clone())))?;
    registry.register(Arc::new(ConvertCurrencyTool::new(services.currency.clone())))?;
    registry.register(Arc::new(DailyPlanTool))?;
    registry.register(Arc::new(CompleteTravelPlanTool))?;

    Ok(registry)
}
