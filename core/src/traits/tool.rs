use crate::error::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Integer,
}

impl ParamKind {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
        }
    }
}

/// One named, typed tool parameter. A parameter without a default is required.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    pub default: Option<Value>,
}

impl ParamSpec {
    fn new(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            default: None,
        }
    }

    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamKind::String, description)
    }

    pub fn number(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamKind::Number, description)
    }

    pub fn integer(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamKind::Integer, description)
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Arguments that passed schema validation, with defaults filled in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    /// Parses the model's argument text and checks it against `params`.
    /// The error is a short reason meant for the model.
    pub fn bind(params: &[ParamSpec], raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        let value: Value = if raw.is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(raw).map_err(|e| format!("arguments are not valid JSON: {e}"))?
        };

        let mut supplied = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => return Err(format!("expected a JSON object, got {other}")),
        };

        let mut bound = Map::new();
        for param in params {
            match supplied.remove(param.name).filter(|v| !v.is_null()) {
                Some(value) if param.kind.accepts(&value) => {
                    bound.insert(param.name.to_string(), value);
                }
                Some(value) => {
                    return Err(format!(
                        "parameter '{}' must be of type {}, got {}",
                        param.name,
                        param.kind.as_str(),
                        value
                    ));
                }
                None => match &param.default {
                    Some(default) => {
                        bound.insert(param.name.to_string(), default.clone());
                    }
                    None => return Err(format!("missing required parameter '{}'", param.name)),
                },
            }
        }

        Ok(Self(bound))
    }

    #[cfg(test)]
    pub(crate) fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn str(&self, key: &str) -> anyhow::Result<&str> {
        self.0
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("Missing '{}' parameter", key))
    }

    pub fn f64(&self, key: &str) -> anyhow::Result<f64> {
        self.0
            .get(key)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| anyhow::anyhow!("Missing '{}' parameter", key))
    }

    pub fn i64(&self, key: &str) -> anyhow::Result<i64> {
        self.0
            .get(key)
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
            .ok_or_else(|| anyhow::anyhow!("Missing '{}' parameter", key))
    }
}

/// Catalog entry sent to the model backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters_schema: Value,
}

impl ToolSpec {
    pub fn new(name: &str, description: &str, params: &[ParamSpec]) -> Self {
        let mut properties = Map::new();
        for param in params {
            let mut property = json!({
                "type": param.kind.as_str(),
                "description": param.description,
            });
            if let Some(default) = &param.default {
                property["default"] = default.clone();
            }
            properties.insert(param.name.to_string(), property);
        }

        let required: Vec<&str> = params
            .iter()
            .filter(|p| p.is_required())
            .map(|p| p.name)
            .collect();

        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters_schema: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }
}

/// Outcome of one tool call, correlated to the request by `call_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub call_id: String,
    pub outcome: Result<String, ToolError>,
}

impl ToolResult {
    pub fn success(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            outcome: Ok(output.into()),
        }
    }

    pub fn error(call_id: impl Into<String>, error: ToolError) -> Self {
        Self {
            call_id: call_id.into(),
            outcome: Err(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }

    /// The text the model sees in the tool-result message.
    pub fn observation(&self) -> String {
        match &self.outcome {
            Ok(output) => output.clone(),
            Err(e) => format!("Error: {e}"),
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters(&self) -> Vec<ParamSpec>;

    async fn execute(&self, args: ToolArgs) -> anyhow::Result<String>;

    fn spec(&self) -> ToolSpec {
        ToolSpec::new(self.name(), self.description(), &self.parameters())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast_params() -> Vec<ParamSpec> {
        vec![
            ParamSpec::string("city", "Name of the city"),
            ParamSpec::integer("days", "Number of days").with_default(5),
        ]
    }

    #[test]
    fn bind_fills_defaults() {
        let args = ToolArgs::bind(&forecast_params(), r#"{"city": "Venice"}"#).unwrap();
        assert_eq!(args.str("city").unwrap(), "Venice");
        assert_eq!(args.i64("days").unwrap(), 5);
    }

    #[test]
    fn bind_rejects_missing_required() {
        let err = ToolArgs::bind(&forecast_params(), r#"{"days": 3}"#).unwrap_err();
        assert!(err.contains("missing required parameter 'city'"));
    }

    #[test]
    fn bind_rejects_wrong_kind() {
        let err = ToolArgs::bind(&forecast_params(), r#"{"city": 42}"#).unwrap_err();
        assert!(err.contains("'city' must be of type string"));

        let err = ToolArgs::bind(&forecast_params(), r#"{"city": "Rome", "days": 2.5}"#)
            .unwrap_err();
        assert!(err.contains("'days' must be of type integer"));
    }

    #[test]
    fn bind_accepts_whole_float_for_integer() {
        let args = ToolArgs::bind(&forecast_params(), r#"{"city": "Rome", "days": 3.0}"#).unwrap();
        assert_eq!(args.i64("days").unwrap(), 3);
    }

    #[test]
    fn bind_treats_empty_and_null_as_no_arguments() {
        let params = vec![ParamSpec::string("budget_range", "Budget").with_default("mid-range")];
        assert!(ToolArgs::bind(&params, "").is_ok());
        assert!(ToolArgs::bind(&params, "null").is_ok());
        assert!(ToolArgs::bind(&params, "[1, 2]").is_err());
        assert!(ToolArgs::bind(&params, "{not json").is_err());
    }

    #[test]
    fn spec_lists_required_parameters_only() {
        let spec = ToolSpec::new("get_weather_forecast", "Forecast", &forecast_params());
        assert_eq!(spec.parameters_schema["required"], json!(["city"]));
        assert_eq!(
            spec.parameters_schema["properties"]["days"]["default"],
            json!(5)
        );
    }

    #[test]
    fn observation_renders_errors() {
        let result = ToolResult::error("call_1", ToolError::UnknownTool("fly".into()));
        assert!(result.is_error());
        assert_eq!(result.observation(), "Error: unknown tool 'fly'");
    }
}
