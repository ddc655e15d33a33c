use moviematch::db::{FileStore, KeyValueStore};
use moviematch::models::MovieSelection;
use tokio_test::{assert_err, assert_ok};

#[test]
fn test_values_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();

    FileStore::open(dir.path())
        .unwrap()
        .set("watchlist", r#"["Heat"]"#)
        .unwrap();

    let reopened = FileStore::open(dir.path()).unwrap();
    assert_eq!(reopened.get("watchlist").unwrap().as_deref(), Some(r#"["Heat"]"#));
    assert!(dir.path().join("watchlist.json").exists());
}

#[test]
fn test_open_creates_nested_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("data").join("session");

    let store = FileStore::open(&nested).unwrap();
    assert!(nested.is_dir());
    assert_eq!(store.get("selectedMovies").unwrap(), None);
}

#[test]
fn test_remove_then_get() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();

    assert_ok!(store.set("favorites", "[]"));
    assert_ok!(store.remove("favorites"));
    assert_ok!(store.remove("favorites"));
    assert_eq!(store.get("favorites").unwrap(), None);
}

#[test]
fn test_rejects_keys_that_escape_the_directory() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();

    assert_err!(store.set("../watchlist", "[]"));
    assert_err!(store.get(".hidden"));
    assert_err!(store.set("", "[]"));
}

#[test]
fn test_selection_round_trip_through_session_dir() {
    let dir = tempfile::tempdir().unwrap();
    let selection = MovieSelection::from_inputs(["Heat", " Alien ", "", "Brazil"]).unwrap();

    selection.save(&FileStore::open(dir.path()).unwrap()).unwrap();

    let loaded = MovieSelection::load(&FileStore::open(dir.path()).unwrap());
    assert_eq!(loaded.titles(), ["Heat", "Alien", "Brazil"]);
}
