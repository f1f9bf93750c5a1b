use symptom_tracker::dedup::merge_records;
use symptom_tracker::parser::RecordParser;
use symptom_tracker::store::{RecordStore, EMPTY_EXPORT_MESSAGE};
use tempfile::TempDir;

mod common;

fn store_in(dir: &TempDir) -> RecordStore {
    RecordStore::new(dir.path().join("nested").join("records.json"))
}

#[tokio::test]
async fn test_append_deduplicates_by_date_and_time() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = store_in(&dir);
    let parser = RecordParser::new();

    let first = parser.parse(&common::declining_diary(3)).records;
    let outcome = store.append(first).await?;
    assert_eq!(outcome.added, 6);
    assert_eq!(outcome.duplicates, 0);

    // overlapping export: days 1-4, with day 1 re-entered differently
    let mut second = parser.parse(&common::declining_diary(4)).records;
    second[0].anxiety = Some(1.0);
    let outcome = store.append(second).await?;
    assert_eq!(outcome.added, 2);
    assert_eq!(outcome.duplicates, 6);

    let stored = store.load().await?;
    assert_eq!(stored.len(), 8);
    // first writer wins
    assert_ne!(stored[0].anxiety, Some(1.0));
    Ok(())
}

#[tokio::test]
async fn test_append_sorts_chronologically() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = store_in(&dir);
    let parser = RecordParser::new();

    store
        .append(parser.parse(&common::v1_line("05/01/2024", "08:00", "RANO", "3", "3")).records)
        .await?;
    store
        .append(
            parser
                .parse(&format!(
                    "{}\n{}",
                    common::v1_line("04/01/2024", "21:00", "WIECZÓR", "3", "3"),
                    common::v1_line("04/01/2024", "9:00", "RANO", "3", "3"),
                ))
                .records,
        )
        .await?;

    let stored = store.load().await?;
    let keys: Vec<String> = stored.iter().map(|r| r.dedup_key()).collect();
    assert_eq!(keys, vec!["04/01/2024_9:00", "04/01/2024_21:00", "05/01/2024_08:00"]);
    Ok(())
}

#[test]
fn test_merge_without_timestamps_falls_back_to_strings() {
    let parser = RecordParser::new();
    let mut records = parser
        .parse(&format!(
            "{}\n{}",
            common::v1_line("02/01/2024", "08:00", "RANO", "3", "3"),
            common::v1_line("01/01/2024", "08:00", "RANO", "3", "3"),
        ))
        .records;
    for record in &mut records {
        record.timestamp = None;
    }

    let outcome = merge_records(Vec::new(), records);
    assert_eq!(outcome.records[0].date, "01/01/2024");
    assert_eq!(outcome.records[1].date, "02/01/2024");
}

#[tokio::test]
async fn test_load_missing_and_clear() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = store_in(&dir);

    assert!(store.load().await?.is_empty());
    store.clear().await?;

    store
        .append(RecordParser::new().parse(&common::declining_diary(1)).records)
        .await?;
    assert!(store.path().exists());

    store.clear().await?;
    assert!(!store.path().exists());
    assert!(store.load().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_replace_overwrites() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = store_in(&dir);
    let parser = RecordParser::new();

    store.append(parser.parse(&common::declining_diary(5)).records).await?;
    let outcome = store.replace(parser.parse(&common::declining_diary(2)).records).await?;

    assert_eq!(outcome.added, 4);
    assert_eq!(store.load().await?.len(), 4);
    Ok(())
}

#[tokio::test]
async fn test_export_and_summary() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = store_in(&dir);

    assert_eq!(store.export_csv().await?, EMPTY_EXPORT_MESSAGE);
    assert_eq!(store.summary().await?.count, 0);

    store
        .append(RecordParser::new().parse(&common::declining_diary(3)).records)
        .await?;

    let csv = store.export_csv().await?;
    assert_eq!(csv.lines().count(), 7);
    assert!(csv.starts_with(common::HEADER_V1));

    let summary = store.summary().await?;
    assert_eq!(summary.count, 6);
    assert_eq!(summary.days, 3);
    assert_eq!(summary.avg_per_day, 2.0);
    Ok(())
}
