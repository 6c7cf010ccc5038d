//! Resolution orchestrator
//!
//! One `resolve` call walks a strictly linear cascade: validate, consult
//! the local TAC registry, try each configured provider in priority order,
//! and finally synthesize. Only validation failures surface to the caller;
//! every provider failure is absorbed and logged, and the synthesizer
//! guarantees an answer for any checksum-valid identifier.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use phoneid_core::{synthesize, Imei, ResolutionResult, ResolutionSource, TacRegistry};

use crate::config::LookupConfig;
use crate::provider::{ProviderAdapter, ProviderError};

/// The resolution engine entry point
///
/// Holds only read-only state; one `Resolver` serves any number of
/// concurrent `resolve` calls.
pub struct Resolver {
    registry: TacRegistry,
    providers: Vec<(Box<dyn ProviderAdapter>, Duration)>,
    /// Wall-clock budget for the whole provider phase
    deadline: Option<Duration>,
}

impl Resolver {
    pub fn new(
        registry: TacRegistry,
        providers: Vec<(Box<dyn ProviderAdapter>, Duration)>,
        deadline: Option<Duration>,
    ) -> Self {
        Self {
            registry,
            providers,
            deadline,
        }
    }

    /// Build a resolver from lookup configuration
    pub fn from_config(registry: TacRegistry, config: &LookupConfig) -> Self {
        let timeouts = config.timeouts_ms();
        let providers = config
            .adapters()
            .into_iter()
            .zip(timeouts.into_iter().map(Duration::from_millis))
            .collect();
        Self::new(
            registry,
            providers,
            config.deadline_ms.map(Duration::from_millis),
        )
    }

    /// Resolve a raw identifier to a device profile
    ///
    /// Never fails for a well-formed identifier: when every source is
    /// silent the answer is synthesized and tagged as such. A rejected
    /// identifier never causes a provider request.
    pub async fn resolve(&self, raw: &str) -> ResolutionResult {
        // VALIDATING
        let imei = match Imei::parse(raw) {
            Ok(imei) => imei,
            Err(e) => {
                debug!(imei = %phoneid_core::mask(raw), reason = %e, "Identifier rejected");
                return ResolutionResult::rejected(e.to_string());
            }
        };

        // REGISTRY_LOOKUP
        if let Some(entry) = self.registry.lookup(&imei) {
            debug!(imei = %imei, tac = imei.tac(), model = %entry.model, "Registry hit");
            return ResolutionResult::resolved(ResolutionSource::Registry, entry.descriptor());
        }

        // PROVIDER_QUERY
        if let Some(result) = self.query_providers(&imei).await {
            return result;
        }

        // SIMULATION_FALLBACK
        debug!(imei = %imei, "All sources silent, synthesizing profile");
        ResolutionResult::resolved(ResolutionSource::Synthetic, synthesize(&imei))
    }

    /// Try each provider in priority order; `Some` on the first success
    async fn query_providers(&self, imei: &Imei) -> Option<ResolutionResult> {
        let started = Instant::now();

        for (adapter, timeout) in &self.providers {
            if !adapter.is_configured() {
                debug!(provider = adapter.name(), "Provider not configured, skipping");
                continue;
            }

            let effective = match self.deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_sub(started.elapsed());
                    if remaining.is_zero() {
                        debug!(
                            imei = %imei,
                            "Resolution deadline spent, skipping remaining providers"
                        );
                        return None;
                    }
                    (*timeout).min(remaining)
                }
                None => *timeout,
            };

            // The adapter is expected to honor the timeout itself; the
            // outer bound keeps a misbehaving one from stalling the
            // cascade anyway.
            let outcome = match tokio::time::timeout(effective, adapter.query(imei, effective))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(ProviderError::Transport(format!(
                    "timed out after {}ms",
                    effective.as_millis()
                ))),
            };

            match outcome {
                Ok(response) => {
                    debug!(
                        provider = adapter.name(),
                        imei = %imei,
                        "Resolved via provider"
                    );
                    return Some(ResolutionResult::resolved(
                        ResolutionSource::Provider(adapter.name().to_string()),
                        response.descriptor(),
                    ));
                }
                Err(e) => {
                    debug!(
                        provider = adapter.name(),
                        imei = %imei,
                        error = %e,
                        "Provider failed, trying next"
                    );
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderResponse;
    use async_trait::async_trait;
    use phoneid_core::imei::with_check_digit;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// What a scripted provider should do when queried
    #[derive(Clone)]
    enum Script {
        Succeed(&'static str),
        FailLogical,
        FailTransport,
        Hang,
    }

    struct ScriptedProvider {
        name: &'static str,
        script: Script,
        configured: bool,
        calls: Arc<AtomicUsize>,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl ProviderAdapter for ScriptedProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn query(
            &self,
            _imei: &Imei,
            _timeout: Duration,
        ) -> Result<ProviderResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.order.lock().unwrap().push(self.name);
            match &self.script {
                Script::Succeed(model) => Ok(ProviderResponse {
                    brand: Some("Apple".to_string()),
                    model: Some(model.to_string()),
                    ..Default::default()
                }),
                Script::FailLogical => {
                    Err(ProviderError::Logical("IMEI not found".to_string()))
                }
                Script::FailTransport => {
                    Err(ProviderError::Transport("connection refused".to_string()))
                }
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    unreachable!("hung provider must be cut off by the timeout")
                }
            }
        }
    }

    struct Fleet {
        calls: Arc<AtomicUsize>,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Fleet {
        fn new() -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                order: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn provider(
            &self,
            name: &'static str,
            script: Script,
        ) -> (Box<dyn ProviderAdapter>, Duration) {
            (
                Box::new(ScriptedProvider {
                    name,
                    script,
                    configured: true,
                    calls: self.calls.clone(),
                    order: self.order.clone(),
                }),
                Duration::from_millis(100),
            )
        }

        fn unconfigured(&self, name: &'static str) -> (Box<dyn ProviderAdapter>, Duration) {
            (
                Box::new(ScriptedProvider {
                    name,
                    script: Script::FailTransport,
                    configured: false,
                    calls: self.calls.clone(),
                    order: self.order.clone(),
                }),
                Duration::from_millis(100),
            )
        }

        fn order(&self) -> Vec<&'static str> {
            self.order.lock().unwrap().clone()
        }
    }

    fn registry() -> TacRegistry {
        TacRegistry::from_toml(
            r#"
[[entry]]
tac = "01194800"
brand = "Apple"
model = "iPhone 5s"
storage = ["16 GB", "32 GB"]
os = "iOS"
"#,
        )
        .unwrap()
    }

    /// Checksum-valid identifier with a TAC the test registry knows
    fn registry_imei() -> String {
        with_check_digit("01194800123456")
    }

    /// Checksum-valid identifier with a TAC nothing knows
    fn unknown_imei() -> String {
        with_check_digit("99999998000001")
    }

    #[tokio::test]
    async fn test_rejected_id_never_reaches_providers() {
        let fleet = Fleet::new();
        let resolver = Resolver::new(
            registry(),
            vec![fleet.provider("ifree", Script::Succeed("iPhone 12"))],
            None,
        );

        for raw in [
            "111111111111111",
            "123456789012345",
            "01194800123456",
            "011948001234560",
            "not-an-imei-at!",
        ] {
            let result = resolver.resolve(raw).await;
            assert!(!result.success);
            assert_eq!(result.source, ResolutionSource::Rejected);
            assert!(result.descriptor.is_none());
            assert!(result.error_reason.is_some());
        }
        assert_eq!(fleet.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejection_reasons_are_specific() {
        let resolver = Resolver::new(registry(), Vec::new(), None);

        let identical = resolver.resolve("111111111111111").await;
        assert!(identical.error_reason.unwrap().contains("identical"));

        let placeholder = resolver.resolve("123456789012345").await;
        assert!(placeholder.error_reason.unwrap().contains("placeholder"));

        let short = resolver.resolve("01194800123456").await;
        assert!(short.error_reason.unwrap().contains("length"));
    }

    #[tokio::test]
    async fn test_registry_hit_short_circuits_providers() {
        let fleet = Fleet::new();
        let resolver = Resolver::new(
            registry(),
            vec![fleet.provider("ifree", Script::Succeed("wrong"))],
            None,
        );

        let result = resolver.resolve(&registry_imei()).await;
        assert!(result.success);
        assert_eq!(result.source, ResolutionSource::Registry);
        let descriptor = result.descriptor.unwrap();
        assert_eq!(descriptor.manufacturer, "Apple");
        assert_eq!(descriptor.model, "iPhone 5s");
        assert_eq!(fleet.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_priority_order_and_first_success_wins() {
        let fleet = Fleet::new();
        let resolver = Resolver::new(
            registry(),
            vec![
                fleet.provider("ifree", Script::FailLogical),
                fleet.provider("imeidata", Script::Succeed("iPhone 12 Pro")),
                fleet.provider("dhru", Script::Succeed("should not run")),
            ],
            None,
        );

        let result = resolver.resolve(&unknown_imei()).await;
        assert_eq!(
            result.source,
            ResolutionSource::Provider("imeidata".to_string())
        );
        assert_eq!(result.descriptor.unwrap().model, "iPhone 12 Pro");
        assert_eq!(fleet.order(), vec!["ifree", "imeidata"]);
    }

    #[tokio::test]
    async fn test_unconfigured_provider_skipped() {
        let fleet = Fleet::new();
        let resolver = Resolver::new(
            registry(),
            vec![
                fleet.unconfigured("ifree"),
                fleet.provider("dhru", Script::Succeed("Galaxy S21")),
            ],
            None,
        );

        let result = resolver.resolve(&unknown_imei()).await;
        assert_eq!(result.source, ResolutionSource::Provider("dhru".to_string()));
        assert_eq!(fleet.order(), vec!["dhru"]);
    }

    #[tokio::test]
    async fn test_all_providers_fail_falls_to_synthesis() {
        let fleet = Fleet::new();
        let resolver = Resolver::new(
            registry(),
            vec![
                fleet.provider("ifree", Script::FailTransport),
                fleet.provider("imeidata", Script::FailLogical),
            ],
            None,
        );

        let raw = unknown_imei();
        let first = resolver.resolve(&raw).await;
        assert!(first.success);
        assert_eq!(first.source, ResolutionSource::Synthetic);

        // Synthesis is deterministic: a second resolution of the same
        // identifier yields an identical descriptor.
        let second = resolver.resolve(&raw).await;
        assert_eq!(first.descriptor, second.descriptor);
        assert_eq!(fleet.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_provider_cut_off_by_timeout() {
        let fleet = Fleet::new();
        let resolver = Resolver::new(
            registry(),
            vec![
                fleet.provider("ifree", Script::Hang),
                fleet.provider("imeidata", Script::Succeed("Pixel 7")),
            ],
            None,
        );

        let result = resolver.resolve(&unknown_imei()).await;
        assert_eq!(
            result.source,
            ResolutionSource::Provider("imeidata".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_skips_remaining_providers() {
        let fleet = Fleet::new();
        let resolver = Resolver::new(
            registry(),
            vec![
                // Hangs until the 100ms per-provider timeout, spending the
                // whole 80ms deadline
                fleet.provider("ifree", Script::Hang),
                fleet.provider("imeidata", Script::Succeed("never reached")),
            ],
            Some(Duration::from_millis(80)),
        );

        let result = resolver.resolve(&unknown_imei()).await;
        assert_eq!(result.source, ResolutionSource::Synthetic);
        assert_eq!(fleet.order(), vec!["ifree"]);
    }

    #[tokio::test]
    async fn test_no_providers_configured_synthesizes() {
        let resolver = Resolver::new(registry(), Vec::new(), None);
        let result = resolver.resolve(&unknown_imei()).await;
        assert!(result.success);
        assert_eq!(result.source, ResolutionSource::Synthetic);
        let descriptor = result.descriptor.unwrap();
        assert!(!descriptor.manufacturer.is_empty());
    }
}
