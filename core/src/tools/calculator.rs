use crate::tools::{format_amount, round2};
use crate::traits::{ParamSpec, Tool, ToolArgs};
use async_trait::async_trait;

/// Budget arithmetic exposed to the model so it never has to do sums in its
/// head. Every result is rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcOp {
    Add,
    Multiply,
    EstimateHotelCost,
    TotalCost,
    DailyBudget,
}

impl CalcOp {
    pub const ALL: [CalcOp; 5] = [
        Self::Add,
        Self::Multiply,
        Self::EstimateHotelCost,
        Self::TotalCost,
        Self::DailyBudget,
    ];
}

pub struct CalculatorTool {
    op: CalcOp,
}

impl CalculatorTool {
    pub fn new(op: CalcOp) -> Self {
        Self { op }
    }

    fn compute(&self, args: &ToolArgs) -> anyhow::Result<f64> {
        let value = match self.op {
            CalcOp::Add => args.f64("a")? + args.f64("b")?,
            CalcOp::Multiply => args.f64("a")? * args.f64("b")?,
            CalcOp::EstimateHotelCost => {
                args.f64("price_per_night")? * args.i64("total_days")? as f64
            }
            CalcOp::TotalCost => {
                args.f64("hotel_cost")? + args.f64("activity_cost")? + args.f64("transport_cost")?
            }
            CalcOp::DailyBudget => {
                let days = args.i64("days")?;
                if days <= 0 {
                    anyhow::bail!("Days must be greater than zero.");
                }
                args.f64("total_cost")? / days as f64
            }
        };
        Ok(round2(value))
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        match self.op {
            CalcOp::Add => "add",
            CalcOp::Multiply => "multiply",
            CalcOp::EstimateHotelCost => "estimate_hotel_cost",
            CalcOp::TotalCost => "calculate_total_cost",
            CalcOp::DailyBudget => "calculate_daily_budget",
        }
    }

    fn description(&self) -> &str {
        match self.op {
            CalcOp::Add => "Add two numbers",
            CalcOp::Multiply => "Multiply two numbers",
            CalcOp::EstimateHotelCost => "Calculate total hotel cost from a nightly price",
            CalcOp::TotalCost => {
                "Calculate the total cost of the trip from hotel, activity and transport costs"
            }
            CalcOp::DailyBudget => "Calculate daily budget based on total cost and number of days",
        }
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        match self.op {
            CalcOp::Add | CalcOp::Multiply => vec![
                ParamSpec::number("a", "First number"),
                ParamSpec::number("b", "Second number"),
            ],
            CalcOp::EstimateHotelCost => vec![
                ParamSpec::number("price_per_night", "Hotel price per night"),
                ParamSpec::integer("total_days", "Number of nights"),
            ],
            CalcOp::TotalCost => vec![
                ParamSpec::number("hotel_cost", "Total hotel cost"),
                ParamSpec::number("activity_cost", "Total activity/entertainment cost"),
                ParamSpec::number("transport_cost", "Total transportation cost"),
            ],
            CalcOp::DailyBudget => vec![
                ParamSpec::number("total_cost", "Total expense for the trip"),
                ParamSpec::integer("days", "Total number of travel days"),
            ],
        }
    }

    async fn execute(&self, args: ToolArgs) -> anyhow::Result<String> {
        self.compute(&args).map(format_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn run(op: CalcOp, args: serde_json::Value) -> anyhow::Result<String> {
        CalculatorTool::new(op)
            .execute(ToolArgs::from_value(args))
            .await
    }

    #[tokio::test]
    async fn multiply_rounds_to_cents() {
        assert_eq!(run(CalcOp::Multiply, json!({"a": 4, "b": 25})).await.unwrap(), "100");
        assert_eq!(
            run(CalcOp::Multiply, json!({"a": 1.236, "b": 2})).await.unwrap(),
            "2.47"
        );
    }

    #[tokio::test]
    async fn add_avoids_float_noise() {
        assert_eq!(run(CalcOp::Add, json!({"a": 0.1, "b": 0.2})).await.unwrap(), "0.3");
    }

    #[tokio::test]
    async fn hotel_cost_for_five_nights() {
        let out = run(
            CalcOp::EstimateHotelCost,
            json!({"price_per_night": 100, "total_days": 5}),
        )
        .await
        .unwrap();
        assert_eq!(out, "500");
    }

    #[tokio::test]
    async fn total_cost_sums_three_parts() {
        let out = run(
            CalcOp::TotalCost,
            json!({"hotel_cost": 500, "activity_cost": 120.5, "transport_cost": 60.25}),
        )
        .await
        .unwrap();
        assert_eq!(out, "680.75");
    }

    #[tokio::test]
    async fn daily_budget_rejects_zero_days() {
        let err = run(CalcOp::DailyBudget, json!({"total_cost": 100, "days": 0}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("greater than zero"));

        let out = run(CalcOp::DailyBudget, json!({"total_cost": 100, "days": 3}))
            .await
            .unwrap();
        assert_eq!(out, "33.33");
    }
}
