use gaze_dwell::dwell::DwellTotals;
use gaze_dwell::store::{self, ResultStore, TIMESTAMP_FORMAT};
use rusqlite::Connection;
use tempfile::NamedTempFile;

#[test]
fn each_save_appends_one_row() {
    let tf = NamedTempFile::new().unwrap();
    let path = tf.path().to_path_buf();

    let first = DwellTotals { eyes: 2.5, nose: 1.0, mouth: 0.0 };
    let second = DwellTotals { eyes: 0.0, nose: 0.0, mouth: 4.25 };
    store::save_gaze_data(&path, &first).unwrap();
    store::save_gaze_data(&path, &second).unwrap();

    let conn = Connection::open(&path).unwrap();
    let mut stmt = conn
        .prepare("SELECT timestamp, eyes, nose, mouth FROM gaze_results ORDER BY id")
        .unwrap();
    let rows: Vec<(String, f64, f64, f64)> = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].1, rows[0].2, rows[0].3), (2.5, 1.0, 0.0));
    assert_eq!((rows[1].1, rows[1].2, rows[1].3), (0.0, 0.0, 4.25));
    for (ts, ..) in &rows {
        assert!(chrono::NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).is_ok(), "bad timestamp {}", ts);
    }
}

#[test]
fn reopening_keeps_existing_rows() {
    let tf = NamedTempFile::new().unwrap();
    {
        let mut store = ResultStore::open(tf.path()).unwrap();
        store.append(&DwellTotals::default()).unwrap();
    }
    let mut store = ResultStore::open(tf.path()).unwrap();
    let rec = store.append(&DwellTotals { eyes: 1.0, nose: 1.0, mouth: 1.0 }).unwrap();
    assert_eq!(rec.id, 2);
}

#[test]
fn table_has_expected_columns() {
    let tf = NamedTempFile::new().unwrap();
    ResultStore::open(tf.path()).unwrap();

    let conn = Connection::open(tf.path()).unwrap();
    let mut stmt = conn.prepare("PRAGMA table_info(gaze_results)").unwrap();
    let cols: Vec<(String, String)> = stmt
        .query_map([], |r| Ok((r.get(1)?, r.get(2)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let expected = [("id", "INTEGER"), ("timestamp", "TEXT"), ("eyes", "REAL"), ("nose", "REAL"), ("mouth", "REAL")];
    assert_eq!(cols.len(), expected.len());
    for ((name, ty), (en, et)) in cols.iter().zip(expected.iter()) {
        assert_eq!(name, en);
        assert_eq!(ty, et);
    }
}
