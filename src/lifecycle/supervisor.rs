//! Connection lifecycle supervisor.
//!
//! # Responsibilities
//! - Connect the link, retrying forever at a fixed delay
//! - Run the read pump and the ingress listener against each link
//! - End a cycle on pump exit or shutdown, then drain in order:
//!   listener, link, pump
//!
//! # State Transitions
//! ```text
//! Idle → Connecting: loop entry
//! Connecting → Connecting: connect failed, retry delay elapsed
//! Connecting → Terminated: connect failed with shutdown pending
//! Connecting → Running: link up, pump and listener started
//! Running → Draining: shutdown, or pump exited
//! Draining → Idle: pump exited (reconnect)
//! Draining → Terminated: shutdown
//! ```

use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{sleep, timeout};
use tracing::Instrument;

use crate::config::BridgeConfig;
use crate::http::{IngressError, IngressServer, IngressState};
use crate::lifecycle::pump::{PumpExit, ReadPump};
use crate::lifecycle::shutdown::ShutdownListener;
use crate::link::{Link, LinkOptions};
use crate::observability::Observer;
use crate::resilience::RetryPolicy;

/// Supervisor state, published on a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Connecting,
    Running,
    Draining,
    Terminated,
}

/// Counters reported when the supervisor terminates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorStats {
    pub connect_attempts: u64,
    pub connect_failures: u64,
    /// Cycles that reached `Running`.
    pub cycles: u64,
}

/// Why a running cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleEnd {
    Shutdown,
    Pump(PumpExit),
    ListenFailed,
}

type IngressHandle = JoinHandle<Result<(), IngressError>>;

/// The outer control loop of the bridge.
pub struct ConnectionSupervisor {
    config: Arc<BridgeConfig>,
    policy: RetryPolicy,
    observer: Arc<dyn Observer>,
    shutdown: ShutdownListener,
    state_tx: watch::Sender<SupervisorState>,
    stats: SupervisorStats,
}

impl ConnectionSupervisor {
    /// The configuration must already be validated.
    pub fn new(config: BridgeConfig, observer: Arc<dyn Observer>, shutdown: ShutdownListener) -> Self {
        let policy = RetryPolicy::from_config(&config);
        let (state_tx, _) = watch::channel(SupervisorState::Idle);
        Self {
            config: Arc::new(config),
            policy,
            observer,
            shutdown,
            state_tx,
            stats: SupervisorStats::default(),
        }
    }

    /// Watch state transitions.
    pub fn state(&self) -> watch::Receiver<SupervisorState> {
        self.state_tx.subscribe()
    }

    fn set_state(&self, state: SupervisorState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            tracing::debug!(from = ?previous, to = ?state, "Supervisor state changed");
        }
    }

    /// Run until shutdown is requested.
    pub async fn run(mut self) -> SupervisorStats {
        tracing::info!(
            url = %self.config.target.url,
            bind_address = %self.config.listener.bind_address(),
            connect_timeout_ms = self.policy.connect_timeout.as_millis() as u64,
            retry_delay_ms = self.policy.delay.as_millis() as u64,
            "Supervisor starting"
        );

        loop {
            self.set_state(SupervisorState::Idle);
            if self.shutdown.is_triggered() {
                break;
            }

            self.set_state(SupervisorState::Connecting);
            let link = match self.connect().await {
                Some(link) => link,
                None => {
                    if self.wait_retry_delay().await {
                        continue;
                    }
                    break;
                }
            };

            // Shutdown arrived during the handshake: never bring the cycle up.
            if self.shutdown.is_triggered() {
                link.close("").await;
                break;
            }

            self.stats.cycles += 1;
            let span = tracing::info_span!("cycle", n = self.stats.cycles);
            let end = self.run_cycle(link).instrument(span).await;

            match end {
                CycleEnd::Shutdown => break,
                CycleEnd::Pump(_) => continue,
                CycleEnd::ListenFailed => {
                    if !self.wait_retry_delay().await {
                        break;
                    }
                }
            }
        }

        self.set_state(SupervisorState::Terminated);
        tracing::info!(
            connect_attempts = self.stats.connect_attempts,
            connect_failures = self.stats.connect_failures,
            cycles = self.stats.cycles,
            "Supervisor stopped"
        );
        self.stats
    }

    async fn connect(&mut self) -> Option<Link> {
        self.stats.connect_attempts += 1;
        let url = &self.config.target.url;

        match Link::connect(
            url,
            self.policy.connect_timeout,
            LinkOptions::from(&self.config.timeouts),
        )
        .await
        {
            Ok(link) => {
                tracing::info!(url = %url, attempt = self.stats.connect_attempts, "Websocket connected");
                Some(link)
            }
            Err(e) => {
                self.stats.connect_failures += 1;
                tracing::error!(
                    error = %e,
                    attempt = self.stats.connect_attempts,
                    retry_in_ms = self.policy.delay.as_millis() as u64,
                    "Websocket not connected"
                );
                None
            }
        }
    }

    /// Sleep the retry delay. Returns `false` if shutdown is (or becomes) pending.
    async fn wait_retry_delay(&mut self) -> bool {
        if self.shutdown.is_triggered() {
            return false;
        }
        tokio::select! {
            _ = sleep(self.policy.delay) => true,
            _ = self.shutdown.recv() => false,
        }
    }

    async fn run_cycle(&mut self, link: Link) -> CycleEnd {
        let link = Arc::new(link);

        let mut pump = ReadPump::new(link.clone(), self.observer.clone(), self.policy.delay).spawn();
        let mut pump_finished = false;

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let state = IngressState::new(link.clone(), self.observer.clone());
        let mut ingress: Option<IngressHandle> =
            match IngressServer::bind(&self.config.listener, &self.config.timeouts, state).await {
                Ok(server) => Some(tokio::spawn(server.serve(async move {
                    let _ = stop_rx.await;
                }))),
                Err(e) => {
                    tracing::error!(error = %e, "Server Listen");
                    None
                }
            };

        self.set_state(SupervisorState::Running);

        let restart_on_listen_failure = self.config.retry.restart_on_listen_failure;
        let end = if ingress.is_none() && restart_on_listen_failure {
            CycleEnd::ListenFailed
        } else {
            loop {
                tokio::select! {
                    _ = self.shutdown.recv() => {
                        tracing::info!("Shutdown requested, draining");
                        break CycleEnd::Shutdown;
                    }
                    exit = &mut pump => {
                        pump_finished = true;
                        break CycleEnd::Pump(pump_exit(exit));
                    }
                    result = join_ingress(&mut ingress) => {
                        ingress = None;
                        log_ingress_exit(result);
                        if restart_on_listen_failure {
                            break CycleEnd::ListenFailed;
                        }
                    }
                }
            }
        };

        self.set_state(SupervisorState::Draining);
        self.drain(link, pump, pump_finished, ingress, stop_tx).await;
        end
    }

    async fn drain(
        &self,
        link: Arc<Link>,
        pump: JoinHandle<PumpExit>,
        pump_finished: bool,
        ingress: Option<IngressHandle>,
        stop_tx: oneshot::Sender<()>,
    ) {
        if let Some(mut handle) = ingress {
            let _ = stop_tx.send(());
            match timeout(self.config.timeouts.drain(), &mut handle).await {
                Ok(result) => log_ingress_exit(result),
                Err(_) => {
                    tracing::warn!(
                        timeout_ms = self.config.timeouts.drain_ms,
                        "HTTP server did not stop in time, aborting"
                    );
                    handle.abort();
                    let _ = handle.await;
                }
            }
        }

        link.close("").await;

        if !pump_finished {
            pump.abort();
            let _ = pump.await;
        }
    }
}

fn pump_exit(result: Result<PumpExit, JoinError>) -> PumpExit {
    result.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Read pump crashed");
        PumpExit::Failed
    })
}

async fn join_ingress(
    handle: &mut Option<IngressHandle>,
) -> Result<Result<(), IngressError>, JoinError> {
    match handle {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

fn log_ingress_exit(result: Result<Result<(), IngressError>, JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "Server Listen"),
        Err(e) if e.is_cancelled() => {}
        Err(e) => tracing::error!(error = %e, "HTTP server task crashed"),
    }
}
