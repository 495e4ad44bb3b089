//! Fake sensor readings and the demo's command handler.

use chrono::{SecondsFormat, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use relay_client::Command;

pub const WEATHER: [&str; 8] = [
    "snowing",
    "raining",
    "cloudy",
    "windy",
    "sunny",
    "partly cloudy",
    "hailing",
    "hurricane",
];

/// One random sample as a telemetry object.
pub fn sample<R: Rng>(rng: &mut R) -> serde_json::Value {
    let number: i32 = rng.gen_range(-100..=-1);
    let weather = WEATHER.choose(rng).copied().unwrap_or("sunny");
    serde_json::json!({
        "random_number_neg": number,
        "random_weather": weather,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// What the demo does with each relay command.
pub fn describe(command: &Command) -> String {
    match command.name.as_str() {
        "Command_A" | "Command_B" => format!(
            "Executing protocol for {} with parameters: {}",
            command.name, command.parameters
        ),
        other => format!("Command not recognized: {other}"),
    }
}

pub fn handle_command(command: Command) {
    tracing::info!(command = %command.name, parameters = %command.parameters, "command received");
    println!("{}", describe(&command));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sample_is_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let v = sample(&mut rng);
            let n = v["random_number_neg"].as_i64().unwrap();
            assert!((-100..=-1).contains(&n));
            assert!(WEATHER.contains(&v["random_weather"].as_str().unwrap()));
            assert!(v["timestamp"].as_str().unwrap().ends_with('Z'));
        }
    }

    #[test]
    fn known_and_unknown_commands() {
        let a = Command {
            name: "Command_A".into(),
            parameters: "on".into(),
        };
        assert_eq!(describe(&a), "Executing protocol for Command_A with parameters: on");
        let z = Command {
            name: "Reboot".into(),
            parameters: String::new(),
        };
        assert_eq!(describe(&z), "Command not recognized: Reboot");
    }
}
