//! Daily trigger for the audit.

use chrono::{DateTime, Local, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use sharesweep_common::{Error, Result};

/// Local wall-clock time at which the audit runs each day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySchedule {
    pub hour: u32,
    pub minute: u32,
}

impl Default for DailySchedule {
    fn default() -> Self {
        Self {
            hour: 12,
            minute: 0,
        }
    }
}

impl DailySchedule {
    /// Create a schedule.
    ///
    /// # Errors
    /// - Hour above 23 or minute above 59
    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        let schedule = Self { hour, minute };
        schedule.time()?;
        Ok(schedule)
    }

    /// The firing time of day.
    pub fn time(&self) -> Result<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).ok_or_else(|| {
            Error::Config(format!(
                "Invalid schedule time {:02}:{:02}",
                self.hour, self.minute
            ))
        })
    }

    /// First firing instant strictly after `now`, in `now`'s time zone.
    ///
    /// A day on which the firing time does not exist locally (skipped by
    /// a DST change) is passed over.
    pub fn next_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<DateTime<Tz>> {
        let time = self.time()?;
        let mut date = now.date_naive();

        for _ in 0..3 {
            let candidate = now
                .timezone()
                .from_local_datetime(&date.and_time(time))
                .earliest();
            if let Some(candidate) = candidate {
                if candidate > *now {
                    return Ok(candidate);
                }
            }
            date = date
                .succ_opt()
                .ok_or_else(|| Error::Config("Schedule date out of range".to_string()))?;
        }

        Err(Error::Config(format!(
            "No firing time found for {:02}:{:02}",
            self.hour, self.minute
        )))
    }
}

/// Requests accepted by a running scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerRequest {
    /// Run the audit now, outside the daily cadence.
    RunNow,
    /// Stop the scheduler.
    Shutdown,
}

/// Handle used to control a running [`DailyScheduler`].
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    request_tx: mpsc::Sender<SchedulerRequest>,
}

impl SchedulerHandle {
    /// Request an immediate run.
    pub async fn run_now(&self) -> Result<()> {
        self.send(SchedulerRequest::RunNow).await
    }

    /// Stop the scheduler after any in-flight run.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(SchedulerRequest::Shutdown).await
    }

    async fn send(&self, request: SchedulerRequest) -> Result<()> {
        self.request_tx
            .send(request)
            .await
            .map_err(|_| Error::Config("Scheduler not running".to_string()))
    }
}

/// Invokes a job once a day at a fixed local time.
///
/// Runs are awaited one at a time, so they never overlap.
pub struct DailyScheduler {
    schedule: DailySchedule,
    request_rx: mpsc::Receiver<SchedulerRequest>,
}

impl DailyScheduler {
    /// Create a scheduler and the handle that controls it.
    pub fn new(schedule: DailySchedule) -> (Self, SchedulerHandle) {
        let (request_tx, request_rx) = mpsc::channel(8);
        (
            Self {
                schedule,
                request_rx,
            },
            SchedulerHandle { request_tx },
        )
    }

    /// Run until shutdown is requested or every handle is dropped.
    ///
    /// # Errors
    /// - The schedule is invalid
    pub async fn run<F, Fut>(mut self, mut job: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        info!(
            "Scheduler started, auditing daily at {:02}:{:02}",
            self.schedule.hour, self.schedule.minute
        );

        loop {
            let now = Local::now();
            let next = self.schedule.next_after(&now)?;
            let wait = (next.clone() - now).to_std().unwrap_or_default();
            info!("Next audit at {}", next.format("%Y-%m-%d %H:%M %Z"));

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    debug!("Daily trigger fired");
                    job().await;
                }
                request = self.request_rx.recv() => match request {
                    Some(SchedulerRequest::RunNow) => {
                        debug!("Manual run requested");
                        job().await;
                    }
                    Some(SchedulerRequest::Shutdown) => {
                        info!("Scheduler shutting down");
                        break;
                    }
                    None => {
                        warn!("All scheduler handles dropped, stopping");
                        break;
                    }
                },
            }
        }

        Ok(())
    }
}
