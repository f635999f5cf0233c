//! Temperature unit selection and conversion

use serde::{Deserialize, Serialize};

/// Display unit for temperatures. Data is always stored in Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Convert a Celsius reading into this unit
    #[must_use]
    pub fn convert(self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    /// The other unit
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Celsius => Self::Fahrenheit,
            Self::Fahrenheit => Self::Celsius,
        }
    }

    /// Format a Celsius reading rounded to whole degrees, e.g. `21°C`
    #[must_use]
    pub fn format(self, celsius: f64) -> String {
        let rounded = self.convert(celsius).round();
        // -0.4 rounds to -0, which would print as "-0"
        let rounded = if rounded == 0.0 { 0.0 } else { rounded };
        format!("{}{}", rounded, self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 32.0)]
    #[case(100.0, 212.0)]
    #[case(-40.0, -40.0)]
    #[case(37.0, 98.6)]
    fn test_fahrenheit_conversion(#[case] celsius: f64, #[case] expected: f64) {
        let converted = TemperatureUnit::Fahrenheit.convert(celsius);
        assert!((converted - expected).abs() < 1e-9, "{converted} != {expected}");
    }

    #[rstest]
    #[case(0.0)]
    #[case(21.4)]
    #[case(-12.75)]
    fn test_celsius_is_identity(#[case] celsius: f64) {
        assert_eq!(TemperatureUnit::Celsius.convert(celsius), celsius);
    }

    #[test]
    fn test_toggle_round_trips() {
        assert_eq!(TemperatureUnit::Celsius.toggled(), TemperatureUnit::Fahrenheit);
        assert_eq!(TemperatureUnit::Fahrenheit.toggled(), TemperatureUnit::Celsius);
    }

    #[test]
    fn test_format_rounds_to_whole_degrees() {
        assert_eq!(TemperatureUnit::Celsius.format(21.6), "22°C");
        assert_eq!(TemperatureUnit::Fahrenheit.format(0.0), "32°F");
        assert_eq!(TemperatureUnit::Celsius.format(-3.2), "-3°C");
        assert_eq!(TemperatureUnit::Celsius.format(-0.4), "0°C");
    }
}
