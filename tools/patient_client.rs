//! Test Patient Client
//!
//! Generates patient records and posts them to a running service for manual
//! and smoke testing.

use healthai_guardian::types::patient::PatientRecord;
use healthai_guardian::types::prediction::PredictionResponse;
use rand::Rng;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

/// Patient record generator for testing
struct PatientGenerator {
    rng: rand::rngs::ThreadRng,
}

impl PatientGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Generate a patient with unremarkable vitals
    fn generate_typical(&mut self) -> PatientRecord {
        PatientRecord {
            age: self.rng.gen_range(29..60) as f64,
            sex: self.rng.gen_range(0..=1),
            cp: self.rng.gen_range(0..=1),
            trestbps: self.rng.gen_range(100..135) as f64,
            chol: self.rng.gen_range(150..240) as f64,
            fbs: 0,
            restecg: self.rng.gen_range(0..=1),
            thalach: self.rng.gen_range(140..200) as f64,
            exang: 0,
            oldpeak: (self.rng.gen_range(0.0..1.2_f64) * 10.0).round() / 10.0,
            slope: self.rng.gen_range(1..=2),
            ca: 0,
            thal: 2,
        }
    }

    /// Generate a patient with several risk indicators
    fn generate_at_risk(&mut self) -> PatientRecord {
        PatientRecord {
            age: self.rng.gen_range(55..78) as f64,
            sex: 1,
            cp: self.rng.gen_range(2..=3),
            trestbps: self.rng.gen_range(140..190) as f64,
            chol: self.rng.gen_range(240..400) as f64,
            fbs: self.rng.gen_range(0..=1),
            restecg: self.rng.gen_range(0..=2),
            thalach: self.rng.gen_range(90..140) as f64,
            exang: 1,
            oldpeak: (self.rng.gen_range(1.5..4.5_f64) * 10.0).round() / 10.0,
            slope: self.rng.gen_range(0..=1),
            ca: self.rng.gen_range(1..=3),
            thal: self.rng.gen_range(1..=3),
        }
    }

    /// Generate a payload the service must reject
    fn generate_invalid(&mut self) -> Value {
        let mut payload = json!(self.generate_typical());
        match self.rng.gen_range(0..3) {
            0 => payload["bmi"] = json!(27.5),
            1 => {
                if let Some(object) = payload.as_object_mut() {
                    object.remove("chol");
                }
            }
            _ => payload["age"] = json!("unknown"),
        }
        payload
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("patient_client=info".parse()?),
        )
        .init();

    info!("Starting Test Patient Client");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let base_url = args.get(1).map(|s| s.as_str()).unwrap_or("http://localhost:8000");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(20);
    let at_risk_rate = parse_rate("at_risk_rate", args.get(3), 0.3)?;
    let invalid_rate = parse_rate("invalid_rate", args.get(4), 0.1)?;
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        base_url = %base_url,
        count = count,
        at_risk_rate = at_risk_rate,
        invalid_rate = invalid_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = reqwest::Client::new();
    let liveness: Value = client.get(base_url).send().await?.json().await?;
    info!(response = %liveness, "Service is live");

    let predict_url = format!("{}/predict", base_url.trim_end_matches('/'));
    let mut generator = PatientGenerator::new();
    let mut rng = rand::thread_rng();

    let mut high_risk = 0;
    let mut low_risk = 0;
    let mut rejected = 0;
    let mut failed = 0;

    for i in 0..count {
        let payload = if rng.gen_bool(invalid_rate) {
            generator.generate_invalid()
        } else if rng.gen_bool(at_risk_rate) {
            json!(generator.generate_at_risk())
        } else {
            json!(generator.generate_typical())
        };

        let response = client.post(&predict_url).json(&payload).send().await?;
        let status = response.status();

        if status.is_success() {
            let prediction: PredictionResponse = response.json().await?;
            match prediction.risk_level.as_str() {
                "High Risk" => high_risk += 1,
                _ => low_risk += 1,
            }
            info!(
                request = i + 1,
                risk_level = %prediction.risk_level,
                risk_probability = prediction.risk_probability,
                "Prediction received"
            );
        } else if status.is_client_error() {
            rejected += 1;
            let body: Value = response.json().await.unwrap_or(Value::Null);
            info!(request = i + 1, status = %status, detail = %body["detail"], "Request rejected");
        } else {
            failed += 1;
            warn!(request = i + 1, status = %status, "Server error");
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} requests ({} high risk, {} low risk, {} rejected, {} failed)",
        count, high_risk, low_risk, rejected, failed
    );

    Ok(())
}

/// Parse an optional probability argument, rejecting values outside [0, 1].
fn parse_rate(name: &str, arg: Option<&String>, default: f64) -> anyhow::Result<f64> {
    let rate = match arg {
        Some(s) => s
            .parse::<f64>()
            .map_err(|_| anyhow::anyhow!("{name} must be a number, got {s:?}"))?,
        None => default,
    };
    if !(0.0..=1.0).contains(&rate) {
        anyhow::bail!("{name} must be between 0 and 1, got {rate}");
    }
    Ok(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("rate", None, 0.3).unwrap(), 0.3);
        assert_eq!(parse_rate("rate", Some(&"0.75".to_string()), 0.3).unwrap(), 0.75);
        assert!(parse_rate("rate", Some(&"1.5".to_string()), 0.3).is_err());
        assert!(parse_rate("rate", Some(&"-0.1".to_string()), 0.3).is_err());
        assert!(parse_rate("rate", Some(&"NaN".to_string()), 0.3).is_err());
        assert!(parse_rate("rate", Some(&"often".to_string()), 0.3).is_err());
    }
}
