use std::collections::BTreeMap;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use reqwest::StatusCode;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};
use tracing::{info, warn};

use loadgen_common::config::LoadgenConfig;
use loadgen_common::{LoadgenError, Result};
use loadgen_core::{rng_from_seed, ErrorScenario, KindSampler, RequestKind};

use crate::client::ApiClient;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindTally {
    pub sent: u64,
    pub ok: u64,
    pub non_success: u64,
    pub transport_errors: u64,
}

impl KindTally {
    fn absorb(&mut self, other: &KindTally) {
        self.sent += other.sent;
        self.ok += other.ok;
        self.non_success += other.non_success;
        self.transport_errors += other.transport_errors;
    }
}

/// Tallies owned by a single worker, handed back through its join handle.
#[derive(Debug, Clone, Default)]
pub struct WorkerReport {
    pub worker: usize,
    pub tallies: [KindTally; 4],
    pub interrupted: bool,
}

impl WorkerReport {
    fn new(worker: usize) -> Self { Self { worker, ..Default::default() } }

    fn record(&mut self, kind: RequestKind, outcome: &reqwest::Result<StatusCode>) {
        let tally = &mut self.tallies[kind.index()];
        tally.sent += 1;
        match outcome {
            Ok(status) if status.is_success() => tally.ok += 1,
            Ok(_) => tally.non_success += 1,
            Err(_) => tally.transport_errors += 1,
        }
    }

    pub fn sent(&self) -> u64 { self.tallies.iter().map(|t| t.sent).sum() }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: &'static str,
    pub status: Option<u16>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub workers: usize,
    pub elapsed_secs: f64,
    pub interrupted: bool,
    pub error_scenarios: Vec<ScenarioReport>,
    pub by_kind: BTreeMap<&'static str, KindTally>,
}

impl RunSummary {
    fn absorb(&mut self, report: &WorkerReport) {
        self.workers += 1;
        self.interrupted |= report.interrupted;
        for kind in RequestKind::ALL {
            self.by_kind.entry(kind.as_str()).or_default().absorb(&report.tallies[kind.index()]);
        }
    }

    pub fn kind(&self, kind: RequestKind) -> KindTally {
        self.by_kind.get(kind.as_str()).copied().unwrap_or_default()
    }

    pub fn total_sent(&self) -> u64 { self.by_kind.values().map(|t| t.sent).sum() }

    pub fn total_ok(&self) -> u64 { self.by_kind.values().map(|t| t.ok).sum() }

    pub fn total_failed(&self) -> u64 {
        self.by_kind.values().map(|t| t.non_success + t.transport_errors).sum()
    }
}

/// Runs the health check, the error scenarios, then `workers` independent
/// load loops until the configured duration elapses or shutdown is signalled.
pub struct LoadDriver {
    config: LoadgenConfig,
    client: ApiClient,
}

impl LoadDriver {
    pub fn new(config: LoadgenConfig) -> Result<Self> {
        config.validate()?;
        let client = ApiClient::new(config.base_url())?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &LoadgenConfig { &self.config }

    pub fn client(&self) -> &ApiClient { &self.client }

    /// One-shot reachability check; anything but 200 aborts the run.
    pub async fn check_health(&self) -> Result<()> {
        match self.client.health().await {
            Ok(StatusCode::OK) => {
                info!(target: "driver", base = %self.client.base(), "API is running and healthy");
                Ok(())
            }
            Ok(status) => Err(LoadgenError::Unhealthy { status: status.as_u16() }),
            Err(e) => Err(LoadgenError::Unreachable(e.to_string())),
        }
    }

    async fn fire_error_scenario(&self, scenario: ErrorScenario) -> ScenarioReport {
        match self.client.send_scenario(scenario).await {
            Ok(status) => {
                info!(target: "driver", scenario = scenario.name(), status = status.as_u16(), "error scenario answered");
                ScenarioReport { scenario: scenario.name(), status: Some(status.as_u16()), error: None }
            }
            Err(e) => {
                warn!(target: "driver", scenario = scenario.name(), error = %e, "error scenario failed");
                ScenarioReport { scenario: scenario.name(), status: None, error: Some(e.to_string()) }
            }
        }
    }

    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<RunSummary> {
        let started = Instant::now();
        let interrupted = |error_scenarios: Vec<ScenarioReport>| {
            info!(target: "driver", "stopped before workers started");
            RunSummary {
                interrupted: true,
                error_scenarios,
                elapsed_secs: started.elapsed().as_secs_f64(),
                ..Default::default()
            }
        };

        tokio::select! {
            res = self.check_health() => res?,
            _ = stop_requested(&mut shutdown) => return Ok(interrupted(Vec::new())),
        }

        info!(target: "driver", "generating error scenarios");
        let mut error_scenarios = Vec::with_capacity(ErrorScenario::ALL.len());
        for scenario in ErrorScenario::ALL {
            tokio::select! {
                report = self.fire_error_scenario(scenario) => error_scenarios.push(report),
                _ = stop_requested(&mut shutdown) => return Ok(interrupted(error_scenarios)),
            }
        }

        let deadline = Instant::now().checked_add(self.config.duration()).ok_or_else(|| {
            LoadgenError::Config(format!("duration_secs {} is out of range", self.config.duration_secs))
        })?;
        info!(
            target: "driver",
            workers = self.config.workers,
            duration_secs = self.config.duration_secs,
            "starting workers"
        );

        let mut handles = Vec::with_capacity(self.config.workers);
        for id in 0..self.config.workers {
            let worker = Worker {
                id,
                client: self.client.clone(),
                rng: rng_from_seed(self.config.seed.map(|s| s.wrapping_add(id as u64))),
                delay_ms: (self.config.min_delay_ms, self.config.max_delay_ms),
                deadline,
            };
            handles.push(tokio::spawn(worker.run(shutdown.clone())));
        }

        let load_started = Instant::now();
        let mut summary = RunSummary { error_scenarios, ..Default::default() };
        for handle in handles {
            match handle.await {
                Ok(report) => summary.absorb(&report),
                Err(e) => warn!(target: "driver", error = %e, "worker task did not complete"),
            }
        }
        summary.elapsed_secs = load_started.elapsed().as_secs_f64();
        info!(
            target: "driver",
            sent = summary.total_sent(),
            ok = summary.total_ok(),
            failed = summary.total_failed(),
            interrupted = summary.interrupted,
            elapsed_secs = summary.elapsed_secs,
            "load generation completed"
        );
        Ok(summary)
    }
}

struct Worker {
    id: usize,
    client: ApiClient,
    rng: StdRng,
    delay_ms: (u64, u64),
    deadline: Instant,
}

impl Worker {
    async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> WorkerReport {
        info!(target: "driver", worker = self.id, "worker started");
        let sampler = KindSampler::new();
        let mut report = WorkerReport::new(self.id);

        while Instant::now() < self.deadline {
            let kind = sampler.sample(&mut self.rng);
            let req = self.client.build(kind, &mut self.rng);
            let outcome = tokio::select! {
                res = req.send() => res.map(|r| r.status()),
                _ = stop_requested(&mut shutdown) => { report.interrupted = true; break; }
            };
            match &outcome {
                Ok(status) if status.is_success() => {}
                Ok(status) => warn!(
                    target: "driver",
                    worker = self.id,
                    kind = %kind,
                    status = status.as_u16(),
                    "request returned non-success status"
                ),
                Err(e) => warn!(target: "driver", worker = self.id, kind = %kind, error = %e, "request failed"),
            }
            report.record(kind, &outcome);

            let (lo, hi) = self.delay_ms;
            let pause = Duration::from_millis(self.rng.gen_range(lo..=hi));
            let wake = Instant::now().checked_add(pause).map_or(self.deadline, |t| t.min(self.deadline));
            tokio::select! {
                _ = sleep_until(wake) => {}
                _ = stop_requested(&mut shutdown) => { report.interrupted = true; break; }
            }
        }

        info!(target: "driver", worker = self.id, sent = report.sent(), "worker finished");
        report
    }
}

/// Resolves once shutdown flips to `true`; never resolves if the sender is gone.
async fn stop_requested(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}
