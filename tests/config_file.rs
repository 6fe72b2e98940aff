use camino::Utf8PathBuf;
use padplace::config::EngineConfig;
use padplace::editor::BoardSession;
use padplace::model::BoardObject;

#[test]
fn settings_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().join("padplace.json")).unwrap();

    let config = EngineConfig {
        max_undo_steps: 2,
        quick_prefix_table: vec!["P".into(), "Q".into()],
        ..Default::default()
    };
    config.save(&path).unwrap();
    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);

    let session = BoardSession::new(loaded);
    for pin in ["1", "2", "3"] {
        session.add(BoardObject::new("U1", pin, 0.0, 0.0)).unwrap();
    }
    assert_eq!(session.undo_depth(), 2);
}

#[test]
fn malformed_settings_name_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().join("broken.json")).unwrap();
    std::fs::write(&path, "{ \"max_undo_steps\": ").unwrap();
    let err = EngineConfig::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("broken.json"));
}
