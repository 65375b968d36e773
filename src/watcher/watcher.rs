//! The long-lived Service watch loop
//!
//! Maintains one streaming watch over Service resources in all
//! namespaces and runs each received event through the
//! classify → rate-limit → dispatch chain. Per-event dispatch failures
//! are logged and absorbed; stream-level failures are returned to the
//! supervisor, which owns the restart policy.

use crate::error::{LbwatchError, Result};
use crate::github::WorkflowDispatcher;
use crate::watcher::{classify, Decision, RateLimiter};
use futures::{StreamExt, TryStreamExt};
use k8s_openapi::api::core::v1::Service;
use kube::api::{Api, WatchEvent, WatchParams};
use kube::config::KubeConfigOptions;
use kube::{Client, Config};
use std::time::Instant;
use tracing::{debug, error, info};

/// Watches Service resources and dispatches workflows for qualifying
/// LoadBalancer events.
///
/// The loop is a single task: pulling the next event suspends until the
/// previous one's filter/rate-limit/dispatch chain completes, which is the
/// natural backpressure mechanism. A slow dispatch delays subsequent
/// events instead of piling up concurrent calls.
pub struct ServiceWatcher<D> {
    dispatcher: D,
    limiter: RateLimiter,
}

impl<D: WorkflowDispatcher> ServiceWatcher<D> {
    /// Creates a watcher from a dispatcher and a configured rate limiter.
    pub fn new(dispatcher: D, limiter: RateLimiter) -> Self {
        Self {
            dispatcher,
            limiter,
        }
    }

    /// Connects to the cluster and consumes the watch stream until it
    /// terminates.
    ///
    /// Returns `Err` when the subscription cannot be established or the
    /// stream fails, and `Ok(())` when the stream ends cleanly; the
    /// supervisor restarts the loop in both cases. This method never
    /// retries internally.
    pub async fn run(&self) -> Result<()> {
        let client = connect().await?;
        let api: Api<Service> = Api::all(client);

        let stream = api
            .watch(&WatchParams::default(), "0")
            .await
            .map_err(|e| LbwatchError::Subscription(e.to_string()))?;
        let mut stream = stream.boxed();

        info!("Starting to watch LoadBalancer services");

        while let Some(event) = stream
            .try_next()
            .await
            .map_err(|e| LbwatchError::Subscription(e.to_string()))?
        {
            self.handle_event(event).await?;
        }

        Ok(())
    }

    /// Processes a single watch event.
    ///
    /// Server-side error events fail the subscription; everything else is
    /// classified, rate-limited, and dispatched. Dispatch failures are
    /// logged with full detail and absorbed — the trigger state is
    /// untouched, so the next qualifying event retries.
    pub(crate) async fn handle_event(&self, event: WatchEvent<Service>) -> Result<()> {
        if let WatchEvent::Error(err) = &event {
            return Err(LbwatchError::Subscription(format!("watch error event: {}", err)).into());
        }

        let Some(change) = classify(&event) else {
            debug!("Ignoring event for non-LoadBalancer service");
            return Ok(());
        };

        let key = change.key();
        info!(
            event_kind = %change.kind,
            service = %key,
            "LoadBalancer service event"
        );

        match self.limiter.check(Instant::now(), &key) {
            Decision::Debounced { remaining } => {
                info!(
                    service = %key,
                    remaining_secs = remaining.as_secs(),
                    "Dispatch suppressed by cooldown window"
                );
            }
            Decision::Permit => match self.dispatcher.dispatch(&change).await {
                Ok(()) => {
                    self.limiter.record_success(Instant::now(), &key);
                    info!(
                        event_kind = %change.kind,
                        service = %key,
                        "Successfully triggered workflow"
                    );
                }
                Err(e) => {
                    error!(
                        error = %e,
                        event_kind = %change.kind,
                        service = %key,
                        "Workflow dispatch failed; will retry on the next qualifying event"
                    );
                }
            },
        }

        Ok(())
    }
}

/// Builds a Kubernetes client, preferring in-cluster configuration and
/// falling back to the local kubeconfig.
async fn connect() -> Result<Client> {
    let config = match Config::incluster() {
        Ok(config) => {
            debug!("Using in-cluster Kubernetes configuration");
            config
        }
        Err(e) => {
            debug!(
                error = %e,
                "In-cluster configuration unavailable; falling back to kubeconfig"
            );
            Config::from_kubeconfig(&KubeConfigOptions::default())
                .await
                .map_err(|e| {
                    LbwatchError::Subscription(format!("failed to load kubeconfig: {}", e))
                })?
        }
    };

    let client = Client::try_from(config)
        .map_err(|e| LbwatchError::Subscription(format!("failed to build client: {}", e)))?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::DispatchError;
    use crate::watcher::TriggerScope;
    use async_trait::async_trait;
    use k8s_openapi::api::core::v1::ServiceSpec;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use kube::core::ErrorResponse;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Records dispatched service keys; optionally fails every call.
    struct FakeDispatcher {
        calls: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl WorkflowDispatcher for FakeDispatcher {
        async fn dispatch(
            &self,
            event: &crate::watcher::ServiceChangeEvent,
        ) -> std::result::Result<(), DispatchError> {
            self.calls.lock().unwrap().push(event.key());
            if self.fail {
                Err(DispatchError::Api {
                    status: 500,
                    body: "boom".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn watcher(
        fail: bool,
        scope: TriggerScope,
    ) -> (ServiceWatcher<FakeDispatcher>, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = FakeDispatcher {
            calls: Arc::clone(&calls),
            fail,
        };
        let limiter = RateLimiter::new(Duration::from_secs(180), scope);
        (ServiceWatcher::new(dispatcher, limiter), calls)
    }

    fn lb_event(namespace: &str, name: &str) -> WatchEvent<Service> {
        WatchEvent::Added(Service {
            metadata: ObjectMeta {
                namespace: Some(namespace.to_string()),
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                type_: Some("LoadBalancer".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_qualifying_event_dispatches_once_per_window() {
        let (watcher, calls) = watcher(false, TriggerScope::Global);

        watcher.handle_event(lb_event("default", "web")).await.unwrap();
        watcher.handle_event(lb_event("default", "web")).await.unwrap();

        // The second event falls inside the cooldown window.
        assert_eq!(calls.lock().unwrap().as_slice(), ["default/web"]);
    }

    #[tokio::test]
    async fn test_global_scope_suppresses_other_services() {
        let (watcher, calls) = watcher(false, TriggerScope::Global);

        watcher.handle_event(lb_event("default", "web")).await.unwrap();
        watcher.handle_event(lb_event("prod", "api")).await.unwrap();

        assert_eq!(calls.lock().unwrap().as_slice(), ["default/web"]);
    }

    #[tokio::test]
    async fn test_per_resource_scope_dispatches_per_service() {
        let (watcher, calls) = watcher(false, TriggerScope::PerResource);

        watcher.handle_event(lb_event("default", "web")).await.unwrap();
        watcher.handle_event(lb_event("prod", "api")).await.unwrap();

        assert_eq!(
            calls.lock().unwrap().as_slice(),
            ["default/web", "prod/api"]
        );
    }

    #[tokio::test]
    async fn test_failed_dispatch_leaves_state_untouched() {
        let (watcher, calls) = watcher(true, TriggerScope::Global);

        watcher.handle_event(lb_event("default", "web")).await.unwrap();
        watcher.handle_event(lb_event("default", "web")).await.unwrap();

        // No success was recorded, so both events attempt a dispatch.
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_non_load_balancer_event_is_ignored() {
        let (watcher, calls) = watcher(false, TriggerScope::Global);

        let event = WatchEvent::Added(Service {
            metadata: ObjectMeta {
                namespace: Some("default".to_string()),
                name: Some("internal".to_string()),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                type_: Some("ClusterIP".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        });
        watcher.handle_event(event).await.unwrap();

        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_watch_error_event_fails_the_subscription() {
        let (watcher, calls) = watcher(false, TriggerScope::Global);

        let event: WatchEvent<Service> = WatchEvent::Error(ErrorResponse {
            status: "Failure".to_string(),
            message: "too old resource version".to_string(),
            reason: "Expired".to_string(),
            code: 410,
        });

        let result = watcher.handle_event(event).await;
        assert!(result.is_err());
        assert!(calls.lock().unwrap().is_empty());
    }
}
