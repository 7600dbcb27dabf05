use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::krs::{analyze_odpis, AnalysisResult, Krs, RegistrySource};
use crate::notify::{render_email, Envelope, Notifier};
use crate::state::WatchState;

/// Per-KRS line of the run summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub krs: Krs,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kapital: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunOutcome {
    fn failed(krs: &Krs, error: &anyhow::Error) -> Self {
        RunOutcome {
            krs: krs.clone(),
            ok: false,
            last: None,
            changed: None,
            kapital: None,
            name: None,
            error: Some(error.to_string()),
        }
    }
}

/// Pretty JSON summary of a run, printed to stdout by the CLI.
pub fn summary_json(outcomes: &[RunOutcome]) -> Result<String> {
    Ok(serde_json::to_string_pretty(outcomes)?)
}

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub from: String,
    pub recipients: Vec<String>,
    pub send_only_on_change: bool,
}

/// One pass over the watched KRS numbers.
pub struct Watcher<'a> {
    source: &'a dyn RegistrySource,
    notifier: &'a dyn Notifier,
    options: WatchOptions,
}

impl<'a> Watcher<'a> {
    pub fn new(
        source: &'a dyn RegistrySource,
        notifier: &'a dyn Notifier,
        options: WatchOptions,
    ) -> Self {
        Self {
            source,
            notifier,
            options,
        }
    }

    /// Processes every identifier in order, folding results into `state`.
    ///
    /// A failure for one KRS is recorded in its outcome and never stops the
    /// batch. State only advances once the notification (if any) went out.
    pub async fn run(&self, identifiers: &[Krs], state: &mut WatchState) -> Vec<RunOutcome> {
        let mut outcomes = Vec::with_capacity(identifiers.len());
        for krs in identifiers {
            let outcome = match self.process(krs, state).await {
                Ok(outcome) => {
                    log::info!(
                        "KRS {}: entry {:?}, changed: {:?}",
                        krs,
                        outcome.last,
                        outcome.changed
                    );
                    outcome
                }
                Err(e) => {
                    log::error!("KRS {}: {}", krs, e);
                    RunOutcome::failed(krs, &e)
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn process(&self, krs: &Krs, state: &mut WatchState) -> Result<RunOutcome> {
        let record = self.source.fetch(krs).await?;
        let analysis = analyze_odpis(&record);
        if !analysis.ok {
            return Err(anyhow!(analysis
                .error
                .unwrap_or_else(|| "Analiza nie powiodła się".to_string())));
        }
        let last = analysis
            .last
            .ok_or_else(|| anyhow!("Analysis returned no entry number"))?;

        let previous = state.last_seen(krs);
        let changed = state.is_changed(krs, last);

        if changed || !self.options.send_only_on_change {
            self.notify(krs, &analysis, previous).await?;
        }
        state.record(krs, last);

        Ok(RunOutcome {
            krs: krs.clone(),
            ok: true,
            last: Some(last),
            changed: Some(changed),
            kapital: Some(analysis.kapital.is_some()),
            name: Some(analysis.name).filter(|n| !n.is_empty()),
            error: None,
        })
    }

    async fn notify(&self, krs: &Krs, analysis: &AnalysisResult, previous: Option<u64>) -> Result<()> {
        let message = render_email(krs, analysis, previous, &self.source.registry_url(krs));
        let envelope = Envelope {
            from: self.options.from.clone(),
            to: self.options.recipients.clone(),
            message,
        };
        self.notifier.send(&envelope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeRegistry {
        records: HashMap<String, Value>,
    }

    #[async_trait]
    impl RegistrySource for FakeRegistry {
        async fn fetch(&self, krs: &Krs) -> Result<Value> {
            self.records
                .get(krs.as_str())
                .cloned()
                .ok_or_else(|| anyhow!("HTTP request failed with status: 404 Not Found"))
        }

        fn registry_url(&self, krs: &Krs) -> String {
            format!("https://registry.test/{}", krs)
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Envelope>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, envelope: &Envelope) -> Result<()> {
            if self.fail {
                return Err(anyhow!("relay down"));
            }
            self.sent.lock().unwrap().push(envelope.clone());
            Ok(())
        }
    }

    fn odpis(last: u64) -> Value {
        json!({
            "odpis": {
                "naglowekP": {"wpis": [{"numerWpisu": 1}, {"numerWpisu": last}]},
                "dane": {"dzial1": {"danePodmiotu": {"nazwa": "ACME SA", "nrWpisuWprow": last.to_string()}}}
            }
        })
    }

    fn krs(raw: &str) -> Krs {
        Krs::new(raw).unwrap()
    }

    fn options(send_only_on_change: bool) -> WatchOptions {
        WatchOptions {
            from: "w@example.com".to_string(),
            recipients: vec!["r@example.com".to_string()],
            send_only_on_change,
        }
    }

    fn registry() -> FakeRegistry {
        FakeRegistry {
            records: HashMap::from([
                ("0000000001".to_string(), odpis(5)),
                ("0000000002".to_string(), json!({"odpis": {"dane": {}}})),
            ]),
        }
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_batch() {
        let registry = registry();
        let notifier = RecordingNotifier::default();
        let watcher = Watcher::new(&registry, &notifier, options(true));
        let mut state = WatchState::default();

        let outcomes = watcher
            .run(&[krs("3"), krs("2"), krs("1")], &mut state)
            .await;

        assert_eq!(outcomes.len(), 3);
        assert!(!outcomes[0].ok);
        assert!(outcomes[0].error.as_deref().unwrap().contains("404"));
        assert!(!outcomes[1].ok);
        assert_eq!(outcomes[1].error.as_deref(), Some("Brak sekcji odpis.naglowekP.wpis"));
        assert!(outcomes[2].ok);
        assert_eq!(outcomes[2].last, Some(5));
        assert_eq!(outcomes[2].changed, Some(true));
        assert_eq!(outcomes[2].name.as_deref(), Some("ACME SA"));
        assert_eq!(state.last_seen(&krs("1")), Some(5));
        assert_eq!(state.len(), 1);

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message.subject, "KRS 0000000001 – nowy wpis 5 – ACME SA");
        assert!(sent[0].message.text.contains("https://registry.test/0000000001"));
    }

    #[tokio::test]
    async fn test_second_run_reports_no_change() {
        let registry = registry();
        let notifier = RecordingNotifier::default();
        let watcher = Watcher::new(&registry, &notifier, options(true));
        let mut state = WatchState::default();

        watcher.run(&[krs("1")], &mut state).await;
        let outcomes = watcher.run(&[krs("1")], &mut state).await;

        assert_eq!(outcomes[0].changed, Some(false));
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_always_send_when_not_change_only() {
        let registry = registry();
        let notifier = RecordingNotifier::default();
        let watcher = Watcher::new(&registry, &notifier, options(false));
        let mut state = WatchState::default();
        state.record(&krs("1"), 5);

        let outcomes = watcher.run(&[krs("1")], &mut state).await;

        assert_eq!(outcomes[0].changed, Some(false));
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].message.text.contains("Poprzedni wpis: 5"));
    }

    #[tokio::test]
    async fn test_failed_notification_keeps_state() {
        let registry = registry();
        let notifier = RecordingNotifier {
            fail: true,
            ..Default::default()
        };
        let watcher = Watcher::new(&registry, &notifier, options(true));
        let mut state = WatchState::default();

        let outcomes = watcher.run(&[krs("1")], &mut state).await;

        assert!(!outcomes[0].ok);
        assert_eq!(outcomes[0].error.as_deref(), Some("relay down"));
        assert!(state.is_empty());
    }

    #[test]
    fn test_outcome_json() {
        let failed = RunOutcome::failed(&krs("7"), &anyhow!("boom"));
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"krs": "0000000007", "ok": false, "error": "boom"})
        );
    }

    #[tokio::test]
    async fn test_summary_json_lists_every_outcome() {
        let registry = registry();
        let notifier = RecordingNotifier::default();
        let watcher = Watcher::new(&registry, &notifier, options(true));
        let mut state = WatchState::default();
        let outcomes = watcher.run(&[krs("1"), krs("3")], &mut state).await;

        let summary: Value = serde_json::from_str(&summary_json(&outcomes).unwrap()).unwrap();
        assert_eq!(summary[0]["krs"], "0000000001");
        assert_eq!(summary[0]["ok"], true);
        assert_eq!(summary[0]["last"], 5);
        assert_eq!(summary[1]["krs"], "0000000003");
        assert_eq!(summary[1]["ok"], false);
        assert!(summary[1].get("last").is_none());
        assert_eq!(summary_json(&[]).unwrap(), "[]");
    }
}
