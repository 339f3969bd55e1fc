use crate::tools::{format_amount, round2};
use crate::traits::{ParamSpec, Tool, ToolArgs};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

const EXCHANGERATE_BASE_URL: &str = "https://api.exchangerate-api.com/v4/latest";

#[async_trait]
pub trait CurrencyProvider: Send + Sync {
    /// Units of `to` per one unit of `from`.
    async fn rate(&self, from: &str, to: &str) -> anyhow::Result<f64>;

    async fn convert(&self, amount: f64, from: &str, to: &str) -> anyhow::Result<f64> {
        Ok(amount * self.rate(from, to).await?)
    }
}

fn currency_code(raw: &str) -> anyhow::Result<String> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        anyhow::bail!("'{raw}' is not a three-letter currency code");
    }
    Ok(code)
}

#[derive(Debug, Deserialize)]
struct LatestRates {
    rates: HashMap<String, f64>,
}

/// exchangerate-api.com. The v4 endpoint is keyless; a key, when configured,
/// is sent as a bearer token.
pub struct ExchangeRateApi {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl ExchangeRateApi {
    pub fn new(api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            base_url: EXCHANGERATE_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl CurrencyProvider for ExchangeRateApi {
    async fn rate(&self, from: &str, to: &str) -> anyhow::Result<f64> {
        let from = currency_code(from)?;
        let to = currency_code(to)?;

        let mut request = self.client.get(format!("{}/{}", self.base_url, from));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("exchange rate service returned {}", status);
        }

        let latest: LatestRates = response
            .json()
            .await
            .context("malformed exchange rate response")?;

        latest
            .rates
            .get(&to)
            .copied()
            .with_context(|| format!("no exchange rate from {from} to {to}"))
    }
}

pub struct ExchangeRateTool {
    provider: Arc<dyn CurrencyProvider>,
}

impl ExchangeRateTool {
    pub fn new(provider: Arc<dyn CurrencyProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for ExchangeRateTool {
    fn name(&self) -> &str {
        "get_exchange_rate"
    }

    fn description(&self) -> &str {
        "Get the exchange rate between two currencies (ISO codes such as USD, JPY, EUR)"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::string("from_currency", "The currency to convert from"),
            ParamSpec::string("to_currency", "The currency to convert to"),
        ]
    }

    async fn execute(&self, args: ToolArgs) -> anyhow::Result<String> {
        let from = args.str("from_currency")?;
        let to = args.str("to_currency")?;
        let rate = self.provider.rate(from, to).await?;
        Ok(format!(
            "1 {} = {} {}",
            from.to_ascii_uppercase(),
            rate,
            to.to_ascii_uppercase()
        ))
    }
}

pub struct ConvertCurrencyTool {
    provider: Arc<dyn CurrencyProvider>,
}

impl ConvertCurrencyTool {
    pub fn new(provider: Arc<dyn CurrencyProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for ConvertCurrencyTool {
    fn name(&self) -> &str {
        "convert_currency"
    }

    fn description(&self) -> &str {
        "Convert an amount from one currency to another"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::number("amount", "The amount to convert"),
            ParamSpec::string("from_currency", "The currency to convert from"),
            ParamSpec::string("to_currency", "The currency to convert to"),
        ]
    }

    async fn execute(&self, args: ToolArgs) -> anyhow::Result<String> {
        let amount = args.f64("amount")?;
        let from = args.str("from_currency")?;
        let to = args.str("to_currency")?;
        let converted = round2(self.provider.convert(amount, from, to).await?);
        Ok(format_amount(converted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedRates;

    #[async_trait]
    impl CurrencyProvider for FixedRates {
        async fn rate(&self, from: &str, to: &str) -> anyhow::Result<f64> {
            match (currency_code(from)?.as_str(), currency_code(to)?.as_str()) {
                ("USD", "JPY") => Ok(147.2318),
                (f, t) => anyhow::bail!("no exchange rate from {f} to {t}"),
            }
        }
    }

    #[test]
    fn currency_code_normalizes() {
        assert_eq!(currency_code(" jpy ").unwrap(), "JPY");
        assert!(currency_code("yen").is_ok());
        assert!(currency_code("US$").is_err());
        assert!(currency_code("EURO").is_err());
    }

    #[tokio::test]
    async fn convert_multiplies_by_rate() {
        let tool = ConvertCurrencyTool::new(Arc::new(FixedRates));
        let out = tool
            .execute(ToolArgs::from_value(
                json!({"amount": 500, "from_currency": "usd", "to_currency": "JPY"}),
            ))
            .await
            .unwrap();
        assert_eq!(out, "73615.9");
    }

    #[tokio::test]
    async fn rate_tool_reports_pair() {
        let tool = ExchangeRateTool::new(Arc::new(FixedRates));
        let out = tool
            .execute(ToolArgs::from_value(
                json!({"from_currency": "USD", "to_currency": "jpy"}),
            ))
            .await
            .unwrap();
        assert_eq!(out, "1 USD = 147.2318 JPY");
    }

    #[tokio::test]
    async fn unknown_pair_is_an_error() {
        let tool = ConvertCurrencyTool::new(Arc::new(FixedRates));
        let err = tool
            .execute(ToolArgs::from_value(
                json!({"amount": 1, "from_currency": "EUR", "to_currency": "GBP"}),
            ))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("EUR to GBP"));
    }
}
