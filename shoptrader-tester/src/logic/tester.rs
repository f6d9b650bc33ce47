use colored::Colorize;
use serde::{Deserialize, Serialize};
use shoptrader_game::Variant;
use std::time::{Duration, Instant};

use crate::logic::policy::Strategy;
use crate::logic::scenarios::Scenario;
use crate::logic::simulation::SimulationConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub variant: Variant,
    pub strategy: Strategy,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

/// What to play: every combination is run once per seed.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub variants: Vec<Variant>,
    pub strategy: Strategy,
    pub max_days: u32,
    pub iterations: usize,
}

pub struct LogicTester {
    verbose: bool,
}

impl LogicTester {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn run_scenario(
        &self,
        scenario: &Scenario,
        plan: &RunPlan,
        seeds: &[u64],
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &variant in &plan.variants {
            for &seed in seeds {
                if self.verbose {
                    println!(
                        "🧪 Testing scenario: {} (variant: {} strategy: {} seed: {})",
                        scenario.name.bright_white(),
                        variant,
                        plan.strategy,
                        seed
                    );
                }
                results.push(self.run_single_scenario(scenario, plan, variant, seed));
            }
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &Scenario,
        plan: &RunPlan,
        variant: Variant,
        seed: u64,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..plan.iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let config = SimulationConfig::new(variant, plan.strategy, iteration_seed)
                .with_max_days(plan.max_days);

            match (scenario.check)(&config) {
                Ok(summary) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    if self.verbose {
                        let progress = format!(
                            "days:{} balance:{} sold:{}/{}",
                            summary.stats.days_played,
                            summary.balance,
                            summary.sold_unique,
                            summary.sold_total
                        );
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) {progress}",
                            i + 1,
                            plan.iterations
                        );
                    }
                }
                Err(err) => {
                    let message = format!("{err:#}");
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            plan.iterations,
                            message.clone().red()
                        );
                    }
                    failures.push(format!(
                        "Iteration {} (variant {}, strategy {}, seed {}): {}",
                        i + 1,
                        variant,
                        plan.strategy.label(),
                        iteration_seed,
                        message
                    ));
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: format!("{} [{variant}]", scenario.name),
            variant,
            strategy: plan.strategy,
            seed,
            passed: failures.is_empty(),
            iterations_run: plan.iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            performance_data,
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::scenarios::get_scenario;

    fn plan(strategy: Strategy, iterations: usize) -> RunPlan {
        RunPlan {
            variants: vec![Variant::BookTrader],
            strategy,
            max_days: 3,
            iterations,
        }
    }

    #[test]
    fn smoke_passes_every_iteration() {
        let tester = LogicTester::new(false);
        let scenario = get_scenario("smoke").unwrap();
        let results = tester.run_scenario(scenario, &plan(Strategy::Random, 3), &[7, 8]);
        assert_eq!(results.len(), 2);
        for result in &results {
            assert!(result.passed, "{:?}", result.failures);
            assert_eq!(result.successful_iterations, 3);
            assert_eq!(result.performance_data.len(), 3);
        }
    }

    #[test]
    fn failures_are_reported_per_iteration() {
        // A three-day cap can never reach the unique-sales target.
        let tester = LogicTester::new(false);
        let scenario = get_scenario("victory").unwrap();
        let results = tester.run_scenario(scenario, &plan(Strategy::Greedy, 2), &[1]);
        let result = &results[0];
        assert!(!result.passed);
        assert_eq!(result.successful_iterations, 0);
        assert_eq!(result.failures.len(), 2);
        assert!(result.failures[0].contains("seed 1"));
        assert_eq!(result.average_duration, Duration::ZERO);
    }

    #[test]
    fn results_serialize_durations_as_millis() {
        let result = ScenarioResult {
            scenario_name: "smoke [book_trader]".to_string(),
            variant: Variant::BookTrader,
            strategy: Strategy::Greedy,
            seed: 1,
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_millis(12),
            performance_data: vec![Duration::from_millis(12)],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 12);
        assert_eq!(json["performance_data"][0], 12);
        assert_eq!(json["variant"], "book_trader");
        let back: ScenarioResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.average_duration, Duration::from_millis(12));
    }
}
