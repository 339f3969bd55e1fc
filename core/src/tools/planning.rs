use crate::traits::{ParamSpec, Tool, ToolArgs};
use async_trait::async_trait;

const DAILY_PLAN_ATTRACTION_CHARS: usize = 400;

/// Sections of the final document, in order.
pub const PLAN_SECTIONS: [&str; 9] = [
    "🌍 Destination and Duration",
    "🌤️ Weather Forecast Summary",
    "🏙️ Top Attractions",
    "🍽️ Recommended Restaurants",
    "🚗 Transportation Tips",
    "🛏️ Hotel Info and Estimated Cost",
    "📅 Full Day-wise Itinerary",
    "💰 Total Trip Expense and Currency Conversion",
    "✨ Final Trip Summary",
];

pub struct DailyPlanTool;

#[async_trait]
impl Tool for DailyPlanTool {
    fn name(&self) -> &str {
        "create_daily_plan"
    }

    fn description(&self) -> &str {
        "Create a daily plan for one day of the trip"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::string("city", "Destination city"),
            ParamSpec::integer("day_number", "Day of the trip, starting at 1"),
            ParamSpec::string("attractions", "Attractions to visit that day"),
            ParamSpec::string("weather", "Expected weather that day"),
        ]
    }

    async fn execute(&self, args: ToolArgs) -> anyhow::Result<String> {
        let attractions = args.str("attractions")?;
        let shortened: String = attractions
            .chars()
            .take(DAILY_PLAN_ATTRACTION_CHARS)
            .collect();

        Ok(format!(
            "Day {} in {}:\nWeather: {}\nRecommended activities: {}...\nTips: Plan indoor activities if weather is poor.",
            args.i64("day_number")?,
            args.str("city")?,
            args.str("weather")?,
            shortened
        ))
    }
}

/// Hands the model the outline it should compile gathered data into.
pub struct CompleteTravelPlanTool;

#[async_trait]
impl Tool for CompleteTravelPlanTool {
    fn name(&self) -> &str {
        "complete_travel_plan"
    }

    fn description(&self) -> &str {
        "Returns the outline for compiling all gathered data into a single, complete travel plan"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::string("city", "Destination city"),
            ParamSpec::integer("days", "Duration of the trip in days"),
        ]
    }

    async fn execute(&self, args: ToolArgs) -> anyhow::Result<String> {
        let sections: Vec<String> = PLAN_SECTIONS
            .iter()
            .enumerate()
            .map(|(i, section)| format!("{}. {}", i + 1, section))
            .collect();

        Ok(format!(
            "Assemble a complete travel plan for a {}-day trip to {}. Include these sections in order:\n{}\n\nEnsure everything is well-formatted, friendly, and easy to follow.",
            args.i64("days")?,
            args.str("city")?,
            sections.join("\n")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn daily_plan_truncates_attractions() {
        let long = "a".repeat(1000);
        let out = DailyPlanTool
            .execute(ToolArgs::from_value(json!({
                "city": "Venice",
                "day_number": 2,
                "attractions": long,
                "weather": "sunny",
            })))
            .await
            .unwrap();

        assert!(out.starts_with("Day 2 in Venice:\nWeather: sunny\n"));
        let activities = out
            .lines()
            .find(|l| l.starts_with("Recommended activities: "))
            .unwrap();
        assert_eq!(activities.len(), "Recommended activities: ".len() + 400 + 3);
    }

    #[tokio::test]
    async fn complete_plan_lists_sections_in_order() {
        let out = CompleteTravelPlanTool
            .execute(ToolArgs::from_value(json!({"city": "Venice", "days": 5})))
            .await
            .unwrap();

        assert!(out.starts_with("Assemble a complete travel plan for a 5-day trip to Venice."));
        assert!(out.contains("1. 🌍 Destination and Duration"));
        assert!(out.contains("9. ✨ Final Trip Summary"));
        let weather = out.find("Weather Forecast").unwrap();
        let itinerary = out.find("Day-wise Itinerary").unwrap();
        assert!(weather < itinerary);
    }
}
