use deixis_frame_record::FrameRecord;
use deixis_signal::{extract_from_path, extract_from_str, summarize, Summary};

fn records() -> Vec<FrameRecord> {
    [0.1f32, 0.3, 0.6, 0.9]
        .iter()
        .enumerate()
        .map(|(i, &p)| FrameRecord::for_clip(i, 15, p, [0.0, -0.5, 0.866]))
        .collect()
}

#[test]
fn emitted_records_summarize_like_the_source_values() {
    let log = records()
        .iter()
        .map(FrameRecord::to_log_line)
        .collect::<Vec<_>>()
        .join("\n");

    let values = extract_from_str(&log);
    assert_eq!(values.len(), 4);

    let Summary::NonEmpty(stats) = summarize(&values) else {
        panic!("expected data");
    };
    assert!((stats.mean - 0.475).abs() < 1e-4);
    let counts: Vec<usize> = stats.crossings.iter().map(|c| c.count).collect();
    assert_eq!(counts, vec![3, 2, 1]);
}

#[test]
fn partial_log_from_interrupted_run_is_usable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deepoint_log.txt");

    let mut log = String::from("Using temporal length tlength=15\n\n=== Running ===\n\n");
    for record in records().iter().take(3) {
        log.push_str(&record.to_log_line());
        log.push('\n');
    }
    // Process killed mid-write.
    log.push_str("[frame   18] prob_poin");
    std::fs::write(&path, log).unwrap();

    let values = extract_from_path(&path).unwrap();
    assert_eq!(values, vec![0.1, 0.3, 0.6]);
}
