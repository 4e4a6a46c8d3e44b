//! Canned weather reports for a couple of well-known places.

use crate::tool::{Tool, ToolArgument};
use async_trait::async_trait;
use concierge_core::AppResult;

const NAPA_REPORT: &str =
    "The weather in Napa Valley is sunny with a temperature of 75°F. Perfect for a vineyard tour!";
const LONDON_REPORT: &str =
    "It's a bit cloudy in London with a light drizzle. The temperature is 60°F.";

/// Report the weather for `location`; Napa wins over London when both match.
pub fn weather_report(location: &str) -> String {
    let lower = location.to_lowercase();
    if lower.contains("napa") {
        NAPA_REPORT.to_string()
    } else if lower.contains("london") {
        LONDON_REPORT.to_string()
    } else {
        format!(
            "Could not find weather data for {}. Please specify a more well-known location.",
            location
        )
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WeatherTool;

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Fetches the current weather for a given location."
    }

    fn argument(&self) -> ToolArgument {
        ToolArgument {
            name: "location",
            description: "City or region to report on, e.g. \"Napa Valley\"",
        }
    }

    async fn call(&self, input: &str) -> AppResult<String> {
        Ok(weather_report(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_napa_any_case() {
        assert_eq!(weather_report("Napa Valley"), NAPA_REPORT);
        assert_eq!(weather_report("NAPA"), NAPA_REPORT);
        assert_eq!(weather_report("downtown napa, CA"), NAPA_REPORT);
    }

    #[test]
    fn test_london() {
        assert_eq!(weather_report("London, UK"), LONDON_REPORT);
        assert_eq!(weather_report("east LONDON"), LONDON_REPORT);
    }

    #[test]
    fn test_napa_checked_before_london() {
        assert_eq!(weather_report("London to Napa"), NAPA_REPORT);
    }

    #[test]
    fn test_unknown_location_echoes_input() {
        assert_eq!(
            weather_report("Mendoza"),
            "Could not find weather data for Mendoza. Please specify a more well-known location."
        );
    }

    #[tokio::test]
    async fn test_tool_call() {
        let tool = WeatherTool;
        assert_eq!(tool.name(), "get_weather");
        assert_eq!(tool.call("Napa").await.unwrap(), NAPA_REPORT);
    }
}
