use anyhow::{bail, Result};
use chrono::NaiveTime;
use std::env;

const REQUIRED_VARS: [&str; 6] = [
    "CLIENT_ID",
    "CLIENT_SECRET",
    "WORKSPACE",
    "S3_BUCKET",
    "DATABASE_URL",
    "DISCORD_WEBHOOK_URL",
];

const DEFAULT_SCHEDULE: &str = "02:00";

/// Process configuration. Validated for presence before a run starts, so a
/// misconfigured deployment aborts before contacting any external service.
#[derive(Debug, Clone)]
pub struct Settings {
    pub client_id: String,
    pub client_secret: String,
    pub workspace: String,
    pub s3_bucket: String,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub database_url: String,
    pub discord_webhook_url: String,
    pub dashboard_url: Option<String>,
    pub pool_size: usize,
    pub schedule_time: NaiveTime,
    pub autoexecute: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|name| lookup(name).map(|v| v.is_empty()).unwrap_or(true))
            .collect();

        if !missing.is_empty() {
            bail!(
                "missing required environment variables: {}",
                missing.join(", ")
            );
        }

        let required =
            |name: &str| lookup(name).unwrap_or_default();

        let pool_size = match lookup("THREAD_POOL_SIZE") {
            Some(value) => value.parse().unwrap_or_else(|_| {
                tracing::warn!("THREAD_POOL_SIZE must be an integer, using default 1");
                1
            }),
            None => 1,
        };

        let schedule_raw =
            lookup("SCHEDULE_TIME").unwrap_or_else(|| DEFAULT_SCHEDULE.to_string());
        let schedule_time = NaiveTime::parse_from_str(&schedule_raw, "%H:%M").unwrap_or_else(|_| {
            tracing::warn!(
                "SCHEDULE_TIME {} is not HH:MM, using default {}",
                schedule_raw,
                DEFAULT_SCHEDULE
            );
            NaiveTime::parse_from_str(DEFAULT_SCHEDULE, "%H:%M").unwrap_or_default()
        });

        let autoexecute = lookup("AUTOEXECUTE")
            .map(|value| truthy(&value))
            .unwrap_or(false);

        Ok(Self {
            client_id: required("CLIENT_ID"),
            client_secret: required("CLIENT_SECRET"),
            workspace: required("WORKSPACE"),
            s3_bucket: required("S3_BUCKET"),
            s3_region: lookup("S3_REGION"),
            s3_endpoint: lookup("S3_ENDPOINT"),
            database_url: required("DATABASE_URL"),
            discord_webhook_url: required("DISCORD_WEBHOOK_URL"),
            dashboard_url: lookup("GRAFANA_DASHBOARD_URL"),
            pool_size,
            schedule_time,
            autoexecute,
        })
    }
}

fn truthy(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "true" | "1" | "t" | "yes" | "y"
    )
}
