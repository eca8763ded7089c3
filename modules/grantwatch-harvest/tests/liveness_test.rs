use grantwatch_harvest::liveness::{filter_live, Verdict};
use grantwatch_harvest::testing::{record, FixedProber};

#[tokio::test]
async fn dead_link_excludes_record() {
    let mut r = record("Seed Grant", "Agency X");
    r.application_url = Some("https://apply.example.com/gone".to_string());

    let prober = FixedProber::new().with_verdict("https://apply.example.com/gone", Verdict::Dead);
    let (live, dead) = filter_live(vec![r], &prober).await;

    assert!(live.is_empty());
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].name, "Seed Grant");
    assert_eq!(dead[0].provider, "Agency X");
    assert_eq!(dead[0].url, "https://apply.example.com/gone");
    assert_eq!(dead[0].reason, "not found");
}

#[tokio::test]
async fn indeterminate_verdict_keeps_record() {
    // Timeouts, DNS failures, and refused connections all surface as
    // Indeterminate; none of them may exclude a record.
    let mut r = record("Slow Grant", "Agency X");
    r.application_url = Some("https://slow.example.com/".to_string());

    let prober = FixedProber::new().with_verdict("https://slow.example.com/", Verdict::Indeterminate);
    let (live, dead) = filter_live(vec![r], &prober).await;

    assert_eq!(live.len(), 1);
    assert!(dead.is_empty());
}

#[tokio::test]
async fn record_without_url_is_kept() {
    let mut r = record("Urlless Grant", "Agency X");
    r.application_url = None;
    r.source_url = String::new();

    // Prober would report Dead for everything, but it is never consulted.
    let prober = FixedProber::new();
    let (live, dead) = filter_live(vec![r], &prober).await;

    assert_eq!(live.len(), 1);
    assert!(dead.is_empty());
}

#[tokio::test]
async fn application_url_probed_over_source_url() {
    let mut r = record("Seed Grant", "Agency X");
    r.application_url = Some("https://apply.example.com/".to_string());
    r.source_url = "https://portal.example.com/".to_string();

    // Only the source URL is marked dead; the application link wins.
    let prober = FixedProber::new().with_verdict("https://portal.example.com/", Verdict::Dead);
    let (live, dead) = filter_live(vec![r], &prober).await;

    assert_eq!(live.len(), 1);
    assert!(dead.is_empty());
}

#[tokio::test]
async fn kept_records_preserve_input_order() {
    let names = ["A", "B", "C", "D", "E"];
    let records: Vec<_> = names
        .iter()
        .map(|name| {
            let mut r = record(name, "P");
            r.application_url = Some(format!("https://example.com/{name}"));
            r
        })
        .collect();

    let prober = FixedProber::new().with_verdict("https://example.com/C", Verdict::Dead);
    let (live, dead) = filter_live(records, &prober).await;

    let kept: Vec<_> = live.into_iter().map(|r| r.name).collect();
    assert_eq!(kept, vec!["A", "B", "D", "E"]);
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].name, "C");
}
