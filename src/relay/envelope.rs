use std::time::Duration;

use serde::Serialize;

/// Success body shared by both endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    pub model: String,
    /// Echoed exactly as the caller sent it.
    #[serde(rename = "modelProvider")]
    pub model_provider: String,
    pub result: String,
    pub time_taken: String,
}

/// `"1.23 seconds"`.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.2} seconds", elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn elapsed_has_two_decimals() {
        assert_eq!(format_elapsed(Duration::ZERO), "0.00 seconds");
        assert_eq!(format_elapsed(Duration::from_millis(1234)), "1.23 seconds");
        assert_eq!(format_elapsed(Duration::from_secs(61)), "61.00 seconds");
    }

    #[test]
    fn serializes_with_wire_names() {
        let envelope = Envelope {
            model: "gemini-2.0-flash".into(),
            model_provider: "Gemini".into(),
            result: "x".into(),
            time_taken: "0.10 seconds".into(),
        };
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "model": "gemini-2.0-flash",
                "modelProvider": "Gemini",
                "result": "x",
                "time_taken": "0.10 seconds"
            })
        );
    }
}
