//! Text formatting for the metric cards.

use crate::display::DisplayTarget;
use crate::status::ModelStatus;

/// Format a value with one decimal place.
///
/// Exact halves round away from zero (`0.25` gives `0.3`); everything else
/// rounds to the nearest representable tenth.
pub fn to_fixed_one(mut value: f64) -> String {
    // Negative zero prints without a sign.
    if value == 0.0 {
        value = 0.0;
    }
    if !value.is_finite() {
        return value.to_string();
    }

    // n + 0.25 and n + 0.75 are the only exactly representable ties.
    let is_tie = (value * 4.0).fract() == 0.0 && (value * 2.0).fract() != 0.0;
    if is_tie {
        let tenths = (value * 10.0).round();
        return format!("{:.1}", tenths / 10.0);
    }

    format!("{:.1}", value)
}

/// `87.456` -> `87.5%`
pub fn percent(value: f64) -> String {
    format!("{}%", to_fixed_one(value))
}

/// `3.14159` -> `3.1ms`
pub fn millis(value: f64) -> String {
    format!("{}ms", to_fixed_one(value))
}

/// `12345` -> `12,345`
pub fn grouped(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Formatted text for one card, or `None` when the status lacks its value.
pub fn format_target(target: DisplayTarget, status: &ModelStatus) -> Option<String> {
    match target {
        DisplayTarget::ModelAccuracy => status.accuracy.map(percent),
        DisplayTarget::TrainingSamples => status.training_samples.map(grouped),
        DisplayTarget::AvgFuelSavings => status.avg_fuel_savings.map(percent),
        DisplayTarget::PredictionTime => status.prediction_time_ms.map(millis),
    }
}

/// Text for every card the status has a value for, in render order.
pub fn render(status: &ModelStatus) -> Vec<(DisplayTarget, String)> {
    DisplayTarget::ALL
        .into_iter()
        .filter_map(|target| format_target(target, status).map(|text| (target, text)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_fixed_one() {
        assert_eq!(to_fixed_one(87.456), "87.5");
        assert_eq!(to_fixed_one(92.33), "92.3");
        assert_eq!(to_fixed_one(14.0), "14.0");
        assert_eq!(to_fixed_one(0.0), "0.0");
        assert_eq!(to_fixed_one(-0.0), "0.0");
        assert_eq!(percent(-0.0), "0.0%");
        assert_eq!(to_fixed_one(-3.14159), "-3.1");
    }

    #[test]
    fn test_to_fixed_one_ties_round_away_from_zero() {
        assert_eq!(to_fixed_one(0.25), "0.3");
        assert_eq!(to_fixed_one(1.75), "1.8");
        assert_eq!(to_fixed_one(-0.25), "-0.3");
        assert_eq!(to_fixed_one(98.5), "98.5");
    }

    #[test]
    fn test_percent_and_millis() {
        assert_eq!(percent(87.456), "87.5%");
        assert_eq!(percent(14.0), "14.0%");
        assert_eq!(millis(3.14159), "3.1ms");
        assert_eq!(millis(8.0), "8.0ms");
    }

    #[test]
    fn test_grouped() {
        assert_eq!(grouped(0), "0");
        assert_eq!(grouped(999), "999");
        assert_eq!(grouped(1000), "1,000");
        assert_eq!(grouped(12345), "12,345");
        assert_eq!(grouped(500000), "500,000");
        assert_eq!(grouped(847392), "847,392");
        assert_eq!(grouped(-1234567), "-1,234,567");
        assert_eq!(grouped(i64::MIN), "-9,223,372,036,854,775,808");
    }

    #[test]
    fn test_render_skips_missing_values() {
        let status = ModelStatus {
            accuracy: Some(92.33),
            prediction_time_ms: Some(8.0),
            ..Default::default()
        };

        assert_eq!(
            render(&status),
            vec![
                (DisplayTarget::ModelAccuracy, "92.3%".to_string()),
                (DisplayTarget::PredictionTime, "8.0ms".to_string()),
            ]
        );
    }
}
