use crate::config::Settings;
use crate::runner;
use anyhow::{bail, Result};
use chrono::{DateTime, Datelike, Local, NaiveTime, TimeZone, Weekday};
use std::time::Duration;

/// Next Monday-Friday occurrence of `at`, strictly after `now`.
pub fn next_trigger(now: DateTime<Local>, at: NaiveTime) -> Option<DateTime<Local>> {
    let mut day = now.date_naive();
    if now.time() >= at {
        day = day.succ_opt()?;
    }

    while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
        day = day.succ_opt()?;
    }

    Local.from_local_datetime(&day.and_time(at)).earliest()
}

/// Sleep until the next weekday trigger, run, repeat. A failed run is logged
/// and the loop keeps going; the next trigger is always computed fresh.
pub async fn run_forever(settings: &Settings) -> Result<()> {
    loop {
        let Some(next) = next_trigger(Local::now(), settings.schedule_time) else {
            bail!("could not compute the next trigger time");
        };

        tracing::info!(
            "next backup run scheduled for {}",
            next.format("%Y-%m-%d %H:%M:%S")
        );

        let wait = (next - Local::now()).to_std().unwrap_or(Duration::ZERO);
        tokio::time::sleep(wait).await;

        if let Err(err) = runner::execute_run(settings).await {
            tracing::error!("backup run failed: {:#}", err);
        }
    }
}
