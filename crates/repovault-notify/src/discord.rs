use crate::{Error, Result};
use repovault_core::RunSummary;
use reqwest::Client;
use serde::Serialize;

const EMBED_COLOR: u32 = 0x03b2f8;

/// Posts the run report to a Discord webhook as a single embed.
pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
    dashboard_url: Option<String>,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String, dashboard_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            webhook_url,
            dashboard_url,
        }
    }

    pub async fn send_report(&self, summary: &RunSummary) -> Result<()> {
        let payload = build_payload(summary, self.dashboard_url.as_deref());

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Rejected(response.status().as_u16()));
        }

        tracing::info!("run report delivered to Discord");

        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload {
    embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
struct Embed {
    title: String,
    color: u32,
    fields: Vec<EmbedField>,
}

#[derive(Debug, Serialize)]
struct EmbedField {
    name: String,
    value: String,
    inline: bool,
}

fn build_payload(summary: &RunSummary, dashboard_url: Option<&str>) -> WebhookPayload {
    let mut fields = vec![
        EmbedField {
            name: "Date".to_string(),
            value: summary.started_at.format("%Y-%m-%d").to_string(),
            inline: true,
        },
        EmbedField {
            name: "Time".to_string(),
            value: summary.started_at.format("%H-%M-%S").to_string(),
            inline: true,
        },
        EmbedField {
            name: "Total Time".to_string(),
            value: format_elapsed(summary),
            inline: true,
        },
        EmbedField {
            name: "Detail".to_string(),
            value: format!("```{}```", counts_table(summary)),
            inline: false,
        },
    ];

    if let Some(url) = dashboard_url {
        fields.push(EmbedField {
            name: "Report".to_string(),
            value: format!("[View dashboard]({})", url),
            inline: false,
        });
    }

    WebhookPayload {
        embeds: vec![Embed {
            title: "RepoVault - Backup Report".to_string(),
            color: EMBED_COLOR,
            fields,
        }],
    }
}

/// Elapsed wall-clock as `H:MM:SS`, subsecond precision dropped.
fn format_elapsed(summary: &RunSummary) -> String {
    let secs = summary.elapsed().num_seconds().max(0);
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn counts_table(summary: &RunSummary) -> String {
    let rows = [
        ("Completed", summary.successful),
        ("Failed", summary.failed),
        ("Total", summary.total_repos),
    ];

    let mut table = format!("{:<9} | {:>5}\n", "Status", "Count");
    table.push_str("----------+------\n");
    for (label, count) in rows {
        table.push_str(&format!("{:<9} | {:>5}\n", label, count));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn summary() -> RunSummary {
        RunSummary {
            started_at: Utc.with_ymd_and_hms(2024, 11, 20, 2, 0, 0).unwrap(),
            finished_at: Utc.with_ymd_and_hms(2024, 11, 20, 3, 5, 42).unwrap(),
            total_repos: 15,
            successful: 12,
            failed: 3,
        }
    }

    #[test]
    fn test_elapsed_drops_subseconds() {
        assert_eq!(format_elapsed(&summary()), "1:05:42");
    }

    #[test]
    fn test_counts_table_lines_up() {
        let table = counts_table(&summary());
        assert!(table.contains("Completed |    12"));
        assert!(table.contains("Failed    |     3"));
        assert!(table.contains("Total     |    15"));
    }

    #[test]
    fn test_payload_includes_dashboard_link_when_configured() {
        let with = build_payload(&summary(), Some("https://grafana.example/d/backups"));
        let without = build_payload(&summary(), None);

        assert_eq!(with.embeds[0].fields.len(), 5);
        assert_eq!(without.embeds[0].fields.len(), 4);
        assert!(with.embeds[0].fields[4]
            .value
            .contains("https://grafana.example/d/backups"));
    }

    #[tokio::test]
    async fn test_send_report_posts_embed() {
        let mut server = mockito::Server::new_async().await;
        let hook = server
            .mock("POST", "/webhook")
            .match_header("content-type", "application/json")
            .with_status(204)
            .create_async()
            .await;

        let notifier =
            DiscordNotifier::new(format!("{}/webhook", server.url()), None);
        notifier.send_report(&summary()).await.unwrap();

        hook.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejection_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _hook = server
            .mock("POST", "/webhook")
            .with_status(400)
            .create_async()
            .await;

        let notifier =
            DiscordNotifier::new(format!("{}/webhook", server.url()), None);
        let err = notifier.send_report(&summary()).await.unwrap_err();

        assert!(matches!(err, Error::Rejected(400)));
    }
}
