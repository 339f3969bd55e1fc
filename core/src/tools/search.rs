//! Web search tools backed by a fallback chain of providers.

use crate::traits::{ParamSpec, Tool, ToolArgs};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Results this short are treated as noise and the next provider is tried.
pub const DEFAULT_MIN_RESULT_CHARS: usize = 50;
/// Wall-clock allowance for a whole chain, kept under the default tool timeout.
pub const DEFAULT_SEARCH_BUDGET: Duration = Duration::from_secs(24);
const MAX_RESULTS: usize = 6;

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> anyhow::Result<String>;
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("Mozilla/5.0 (compatible; wayfarer/0.1)")
        .timeout(std::time::Duration::from_secs(20))
        .build()
        .unwrap_or_default()
}

fn format_hit(title: &str, snippet: &str, link: &str) -> String {
    if link.is_empty() {
        format!("**{}**\n{}", title.trim(), snippet.trim())
    } else {
        format!("**{}**\n{}\nURL: {}", title.trim(), snippet.trim(), link.trim())
    }
}

#[derive(Debug, Deserialize)]
struct OrganicHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    link: String,
}

#[derive(Debug, Default, Deserialize)]
struct AnswerBox {
    answer: Option<String>,
    snippet: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct KnowledgeGraph {
    title: Option<String>,
    description: Option<String>,
}

/// Renders the shared Google-style result shape used by SerpAPI and Serper.
fn render_google_results(
    answer_box: Option<AnswerBox>,
    knowledge_graph: Option<KnowledgeGraph>,
    organic: Vec<OrganicHit>,
) -> String {
    let mut parts = Vec::new();

    if let Some(answer) = answer_box.and_then(|a| a.answer.or(a.snippet)) {
        parts.push(answer);
    }
    if let Some(kg) = knowledge_graph
        && let Some(description) = kg.description
    {
        match kg.title {
            Some(title) => parts.push(format!("{title}: {description}")),
            None => parts.push(description),
        }
    }
    parts.extend(
        organic
            .iter()
            .filter(|hit| !hit.title.is_empty())
            .take(MAX_RESULTS)
            .map(|hit| format_hit(&hit.title, &hit.snippet, &hit.link)),
    );

    parts.join("\n\n")
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    error: Option<String>,
    answer_box: Option<AnswerBox>,
    knowledge_graph: Option<KnowledgeGraph>,
    #[serde(default)]
    organic_results: Vec<OrganicHit>,
}

pub struct SerpApiSearch {
    client: reqwest::Client,
    api_key: String,
}

impl SerpApiSearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl SearchProvider for SerpApiSearch {
    fn name(&self) -> &str {
        "serpapi"
    }

    async fn search(&self, query: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .get("https://serpapi.com/search.json")
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("SerpAPI error {}", status);
        }

        let body: SerpApiResponse = response.json().await?;
        if let Some(error) = body.error {
            anyhow::bail!("SerpAPI error: {}", error);
        }

        Ok(render_google_results(
            body.answer_box,
            body.knowledge_graph,
            body.organic_results,
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SerperResponse {
    answer_box: Option<AnswerBox>,
    knowledge_graph: Option<KnowledgeGraph>,
    #[serde(default)]
    organic: Vec<OrganicHit>,
}

/// Google results through serper.dev.
pub struct SerperSearch {
    client: reqwest::Client,
    api_key: String,
}

impl SerperSearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl SearchProvider for SerperSearch {
    fn name(&self) -> &str {
        "serper"
    }

    async fn search(&self, query: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .post("https://google.serper.dev/search")
            .header("X-API-KEY", &self.api_key)
            .json(&json!({ "q": query }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Serper error {}", status);
        }

        let body: SerperResponse = response.json().await?;
        Ok(render_google_results(
            body.answer_box,
            body.knowledge_graph,
            body.organic,
        ))
    }
}

/// Keyless DuckDuckGo HTML search, the last resort of every chain.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
}

impl Default for DuckDuckGoSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl DuckDuckGoSearch {
    pub fn new() -> Self {
        Self {
            client: http_client(),
        }
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str) -> anyhow::Result<String> {
        let html = self
            .client
            .get("https://html.duckduckgo.com/html/")
            .query(&[("q", query)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let results = extract_ddg_results(&html);
        if results.is_empty() {
            Ok(format!("No results found for: {}", query))
        } else {
            Ok(results.join("\n\n"))
        }
    }
}

fn extract_between<'a>(chunk: &'a str, class: &str) -> Option<&'a str> {
    chunk
        .split(class)
        .nth(1)
        .and_then(|s| s.split_once('>'))
        .and_then(|(_, rest)| rest.split('<').next())
}

fn extract_ddg_results(html: &str) -> Vec<String> {
    html.split("class=\"result__body\"")
        .skip(1)
        .filter_map(|chunk| {
            let title = extract_between(chunk, "class=\"result__a\"")?;
            if title.trim().is_empty() {
                return None;
            }
            let snippet = extract_between(chunk, "class=\"result__snippet\"").unwrap_or("");
            let url = extract_between(chunk, "class=\"result__url\"").unwrap_or("");
            Some(format_hit(
                &html_decode(title),
                &html_decode(snippet),
                url,
            ))
        })
        .take(MAX_RESULTS)
        .collect()
}

fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
}

/// Ordered providers tried until one returns a plausible result. The
/// baseline is consulted last and its answer is used whatever it is.
#[derive(Clone)]
pub struct SearchChain {
    tiers: Vec<(Arc<dyn SearchProvider>, &'static str)>,
    baseline: Arc<dyn SearchProvider>,
    min_chars: usize,
    budget: Duration,
}

impl SearchChain {
    pub fn new(baseline: Arc<dyn SearchProvider>) -> Self {
        Self {
            tiers: Vec::new(),
            baseline,
            min_chars: DEFAULT_MIN_RESULT_CHARS,
            budget: DEFAULT_SEARCH_BUDGET,
        }
    }

    /// Adds a provider ahead of the baseline. `label` prefixes its results.
    pub fn then(mut self, provider: Arc<dyn SearchProvider>, label: &'static str) -> Self {
        self.tiers.push((provider, label));
        self
    }

    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    /// Total time the chain may take. Each keyed tier and the baseline get an
    /// equal slice, so a hanging tier can never starve the baseline.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    fn slice(&self) -> Duration {
        self.budget / (self.tiers.len() as u32 + 1)
    }

    pub async fn search(&self, query: &str) -> String {
        let slice = self.slice();

        for (provider, label) in &self.tiers {
            let reply = match tokio::time::timeout(slice, provider.search(query)).await {
                Ok(reply) => reply,
                Err(_) => {
                    warn!(
                        provider = provider.name(),
                        slice_ms = slice.as_millis() as u64,
                        "search provider timed out, trying next provider"
                    );
                    continue;
                }
            };

            match reply {
                Ok(text) if text.trim().chars().count() > self.min_chars => {
                    debug!(provider = provider.name(), "search result accepted");
                    return format!("{label}: {text}");
                }
                Ok(text) => {
                    debug!(
                        provider = provider.name(),
                        chars = text.chars().count(),
                        "search result too short, trying next provider"
                    );
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "search provider failed");
                }
            }
        }

        match tokio::time::timeout(slice, self.baseline.search(query)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(provider = self.baseline.name(), error = %e, "baseline search failed");
                format!("No search data is available for '{query}' right now ({e}).")
            }
            Err(_) => {
                warn!(provider = self.baseline.name(), "baseline search timed out");
                format!(
                    "No search data is available for '{query}' right now (timed out after {}s).",
                    slice.as_secs_f32()
                )
            }
        }
    }
}

/// The configured providers. Keyed providers are absent when no key is set.
#[derive(Clone)]
pub struct SearchProviders {
    pub serpapi: Option<Arc<dyn SearchProvider>>,
    pub serper: Option<Arc<dyn SearchProvider>>,
    pub baseline: Arc<dyn SearchProvider>,
}

impl SearchProviders {
    pub fn chain_for(&self, kind: SearchKind, min_chars: usize, budget: Duration) -> SearchChain {
        let mut chain = SearchChain::new(self.baseline.clone())
            .with_min_chars(min_chars)
            .with_budget(budget);

        let (serpapi_label, serper_label) = match kind {
            SearchKind::Attractions => (Some("Latest search results"), Some("Current search data")),
            SearchKind::Restaurants => (Some("Latest restaurant results"), None),
            SearchKind::Transportation => (None, Some("Latest transport data")),
            SearchKind::Hotels => (Some("Real-time hotel data"), Some("Latest hotel availability")),
        };

        if let (Some(provider), Some(label)) = (&self.serpapi, serpapi_label) {
            chain = chain.then(provider.clone(), label);
        }
        if let (Some(provider), Some(label)) = (&self.serper, serper_label) {
            chain = chain.then(provider.clone(), label);
        }
        chain
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Attractions,
    Restaurants,
    Transportation,
    Hotels,
}

pub struct SearchTool {
    kind: SearchKind,
    chain: SearchChain,
}

impl SearchTool {
    pub fn new(kind: SearchKind, chain: SearchChain) -> Self {
        Self { kind, chain }
    }

    fn query(&self, args: &ToolArgs) -> anyhow::Result<String> {
        let city = args.str("city")?;
        Ok(match self.kind {
            SearchKind::Attractions => format!("top attractions activities things to do in {city}"),
            SearchKind::Restaurants => format!("best restaurants food places to eat in {city}"),
            SearchKind::Transportation => {
                format!("transportation options getting around {city} public transport taxi uber")
            }
            SearchKind::Hotels => format!(
                "{} hotels accommodation {city} price per night booking availability",
                args.str("budget_range")?
            ),
        })
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        match self.kind {
            SearchKind::Attractions => "search_attractions",
            SearchKind::Restaurants => "search_restaurants",
            SearchKind::Transportation => "search_transportation",
            SearchKind::Hotels => "search_hotels",
        }
    }

    fn description(&self) -> &str {
        match self.kind {
            SearchKind::Attractions => "Search for top attractions in a city using real-time data",
            SearchKind::Restaurants => "Search for restaurants in a city using real-time data",
            SearchKind::Transportation => {
                "Search for transportation options in a city using real-time data"
            }
            SearchKind::Hotels => {
                "Search for hotels in a city within a budget range using real-time data"
            }
        }
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        let mut params = vec![ParamSpec::string("city", "Name of the city")];
        if self.kind == SearchKind::Hotels {
            params.push(
                ParamSpec::string("budget_range", "Budget range, e.g. budget, mid-range, luxury")
                    .with_default("mid-range"),
            );
        }
        params
    }

    async fn execute(&self, args: ToolArgs) -> anyhow::Result<String> {
        let query = self.query(&args)?;
        Ok(self.chain.search(&query).await)
    }
}
