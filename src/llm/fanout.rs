//! Concurrent fan-out of one prompt to every panel member

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::llm::client::{ProviderClient, ProviderResult};
use crate::progress::ProgressObserver;

/// Ask every provider concurrently and wait for all of them.
///
/// The returned list is aligned with `providers`: entry `i` is the outcome of
/// `providers[i]`, whatever order the calls completed in. Individual failures,
/// timeouts and cancellation show up as `ProviderResult::Failure`.
pub async fn run_parallel(
    query: &str,
    providers: &[ProviderClient],
    cancel: &CancellationToken,
    progress: &dyn ProgressObserver,
) -> Vec<ProviderResult> {
    let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
    progress.started(&names);
    tracing::info!(providers = ?names, "fanning out query");

    let calls = providers.iter().enumerate().map(|(index, client)| async move {
        let result = client.invoke(query, cancel).await;
        progress.provider_finished(index, client.name(), result.is_success());
        result
    });

    let results = join_all(calls).await;

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    tracing::info!(succeeded, total = results.len(), "fan-out complete");
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::testing::*;
    use crate::progress::NoProgress;
    use std::sync::Mutex;
    use std::time::Duration;

    fn panel(scripts: Vec<(&str, Script, u64)>) -> Vec<ProviderClient> {
        scripts
            .into_iter()
            .map(|(name, script, delay_ms)| {
                scripted(
                    ScriptedProvider::new(name, script).with_delay(Duration::from_millis(delay_ms)),
                )
                .0
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_follow_provider_order_not_completion_order() {
        let providers = panel(vec![
            ("slow", Script::Answer("first"), 300),
            ("medium", Script::Answer("second"), 200),
            ("fast", Script::Answer("third"), 100),
        ]);

        let results = run_parallel("q", &providers, &CancellationToken::new(), &NoProgress).await;

        assert_eq!(
            results,
            vec![
                ProviderResult::Success("first".into()),
                ProviderResult::Success("second".into()),
                ProviderResult::Success("third".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_every_failure_subset_keeps_alignment() {
        for mask in 0u8..8 {
            let scripts = (0..3)
                .map(|i| {
                    let script = if mask & (1 << i) != 0 {
                        Script::Fail("down")
                    } else {
                        Script::Answer("ok")
                    };
                    (["a", "b", "c"][i], script, 0)
                })
                .collect();
            let providers = panel(scripts);

            let results =
                run_parallel("q", &providers, &CancellationToken::new(), &NoProgress).await;

            assert_eq!(results.len(), providers.len());
            for (i, result) in results.iter().enumerate() {
                assert_eq!(result.is_success(), mask & (1 << i) == 0, "mask {mask} index {i}");
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_run_concurrently() {
        let providers = panel(vec![
            ("a", Script::Answer("1"), 1000),
            ("b", Script::Answer("2"), 1000),
            ("c", Script::Answer("3"), 1000),
        ]);

        let started = tokio::time::Instant::now();
        run_parallel("q", &providers, &CancellationToken::new(), &NoProgress).await;

        assert!(started.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_resolves_in_flight_calls() {
        let providers = panel(vec![
            ("ok", Script::Answer("done"), 0),
            ("stuck", Script::Hang, 0),
        ]);
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let results = run_parallel("q", &providers, &token, &NoProgress).await;

        assert_eq!(results[0], ProviderResult::Success("done".into()));
        assert_eq!(results[1], ProviderResult::Failure("cancelled".into()));
    }

    struct Recorder(Mutex<Vec<String>>);

    impl ProgressObserver for Recorder {
        fn started(&self, providers: &[&str]) {
            self.0.lock().unwrap().push(format!("start {}", providers.len()));
        }

        fn provider_finished(&self, index: usize, _name: &str, success: bool) {
            self.0.lock().unwrap().push(format!("{index}:{success}"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_sees_completion_order() {
        let providers = panel(vec![
            ("slow", Script::Answer("x"), 200),
            ("fast", Script::Fail("nope"), 10),
        ]);
        let recorder = Recorder(Mutex::new(Vec::new()));

        run_parallel("q", &providers, &CancellationToken::new(), &recorder).await;

        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec!["start 2", "1:false", "0:true"]
        );
    }
}
