use anyhow::Result;
use rust_sqlite_orm::{
    drop_table, record, ColumnKind, Db, Error, MapError, SqliteConfig, SqliteDb, Value,
};
use tempfile::NamedTempFile;

#[derive(Debug, Default, Clone, PartialEq)]
struct User {
    name: String,
    age: i64,
    height: f64,
}

record!(User => "user" { name: String, age: i64, height: f64 });

#[derive(Debug, Default, Clone, PartialEq)]
struct Everything {
    id: i64,
    label: String,
    score: f64,
    enabled: bool,
}

record!(Everything => "everything" { id: i64, label: String, score: f64, enabled: bool });

#[derive(Debug, Default, PartialEq)]
struct Partial {
    name: String,
    missing: i64,
}

record!(Partial { name: String, missing: i64 });

// Helper function to create a temporary file-based database
fn create_temp_db() -> Result<(SqliteDb, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let path = temp_file.path().to_str().unwrap().to_string();
    let db = SqliteDb::open(path)?;
    Ok((db, temp_file))
}

fn user_table(db: &SqliteDb) -> Result<()> {
    drop_table("user").with_db(db).exec()?;
    db.exec(
        "CREATE TABLE USER (NAME VARCHAR(255), AGE INT(20), HEIGHT float64)",
        &[],
    )?;
    db.exec(
        "INSERT INTO USER (NAME, AGE, HEIGHT) VALUES (?,?,?), (?,?,?)",
        &[
            "liucx".into(),
            "30".into(),
            "168.1".into(),
            "wangli".into(),
            "18".into(),
            "168.2".into(),
        ],
    )?;
    Ok(())
}

fn liucx() -> User {
    User {
        name: "liucx".into(),
        age: 30,
        height: 168.1,
    }
}

fn wangli() -> User {
    User {
        name: "wangli".into(),
        age: 18,
        height: 168.2,
    }
}

#[test]
fn test_user_table_scenario() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    user_table(&db)?;

    let mut user = User::default();
    db.query_row_into(&mut user, "SELECT * FROM USER LIMIT 1", &[])?;
    assert_eq!(user, liucx());

    let mut users: Vec<User> = Vec::new();
    db.query_into(&mut users, "SELECT * FROM USER", &[])?;
    assert_eq!(users, vec![liucx(), wangli()]);

    db.close()?;
    Ok(())
}

#[test]
fn test_exec_reports_ids_and_counts() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    db.create_table::<User>()?;

    let res = db.exec(
        "INSERT INTO USER (NAME, AGE, HEIGHT) VALUES (?, ?, ?)",
        &["a".into(), 1.into(), 1.5.into()],
    )?;
    assert_eq!(res.last_insert_id, 1);
    assert_eq!(res.rows_affected, 1);

    db.exec(
        "INSERT INTO USER (NAME, AGE, HEIGHT) VALUES (?, ?, ?)",
        &["b".into(), 2.into(), 2.5.into()],
    )?;
    let res = db.exec("UPDATE USER SET AGE = AGE + 1", &[])?;
    assert_eq!(res.rows_affected, 2);
    Ok(())
}

#[test]
fn test_round_trip_every_kind() -> Result<()> {
    let db = SqliteDb::open(":memory:")?;
    db.create_table::<Everything>()?;

    let rows = [
        Everything {
            id: i64::MIN,
            label: "first".into(),
            score: -0.25,
            enabled: true,
        },
        Everything {
            id: 42,
            label: String::new(),
            score: 1e10,
            enabled: false,
        },
    ];
    for row in &rows {
        db.exec(
            "INSERT INTO EVERYTHING (ID, LABEL, SCORE, ENABLED) VALUES (?, ?, ?, ?)",
            &[
                row.id.into(),
                row.label.clone().into(),
                row.score.into(),
                row.enabled.into(),
            ],
        )?;
    }

    for row in &rows {
        let found: Everything =
            db.query_row("SELECT * FROM EVERYTHING WHERE ID = ?", &[row.id.into()])?;
        assert_eq!(&found, row);
    }
    Ok(())
}

#[test]
fn test_single_record_requires_exactly_one_row() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    user_table(&db)?;

    let mut user = User {
        name: "untouched".into(),
        ..User::default()
    };

    let err = db
        .query_row_into(&mut user, "SELECT * FROM USER WHERE AGE > ?", &[100.into()])
        .unwrap_err();
    match err {
        Error::EmptyResult { statement, args } => {
            assert_eq!(statement, "SELECT * FROM USER WHERE AGE > ?");
            assert_eq!(args, vec![Value::Integer(100)]);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = db
        .query_row_into(&mut user, "SELECT * FROM USER", &[])
        .unwrap_err();
    assert!(matches!(err, Error::MultipleRows { .. }));
    assert_eq!(user.name, "untouched");
    Ok(())
}

#[test]
fn test_sequence_sizes() -> Result<()> {
    let db = SqliteDb::open(":memory:")?;
    db.create_table::<Everything>()?;

    let none: Vec<Everything> = db.query("SELECT * FROM EVERYTHING", &[])?;
    assert!(none.is_empty());

    db.exec_batch("BEGIN")?;
    for i in 0..1000i64 {
        db.exec(
            "INSERT INTO EVERYTHING (ID, LABEL, SCORE, ENABLED) VALUES (?, ?, ?, ?)",
            &[
                i.into(),
                format!("row-{i}").into(),
                (i as f64 / 2.0).into(),
                (i % 2 == 0).into(),
            ],
        )?;
    }
    db.exec_batch("COMMIT")?;

    let one: Vec<Everything> = db.query("SELECT * FROM EVERYTHING WHERE ID = 7", &[])?;
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].label, "row-7");

    let mut all = vec![Everything::default(); 3];
    db.list(&mut all, "SELECT * FROM EVERYTHING ORDER BY ID", &[])?;
    assert_eq!(all.len(), 1000);
    for (i, item) in all.iter().enumerate() {
        let i = i as i64;
        assert_eq!(item.id, i);
        assert_eq!(item.label, format!("row-{i}"));
        assert_eq!(item.score, i as f64 / 2.0);
        assert_eq!(item.enabled, i % 2 == 0);
    }
    Ok(())
}

#[test]
fn test_schema_drift_is_tolerated() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    user_table(&db)?;

    let partial: Partial = db.query_row("SELECT * FROM USER WHERE NAME = ?", &["wangli".into()])?;
    assert_eq!(
        partial,
        Partial {
            name: "wangli".into(),
            missing: 0,
        }
    );
    Ok(())
}

#[test]
fn test_kind_mismatch_fails_the_query() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    user_table(&db)?;

    let err = db
        .query::<User>("SELECT NAME AS AGE FROM USER", &[])
        .unwrap_err();
    match err.map_error() {
        Some(MapError::FieldTypeMismatch {
            field,
            field_kind,
            column_kind,
            ..
        }) => {
            assert_eq!(*field, "age");
            assert_eq!(*field_kind, ColumnKind::Integer);
            assert_eq!(*column_kind, ColumnKind::Text);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[test]
fn test_failed_sequence_query_keeps_destination() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    user_table(&db)?;

    let mut users = vec![User {
        name: "keep".into(),
        age: 9,
        height: 0.0,
    }];
    let err = db
        .query_into(&mut users, "SELECT NAME AS AGE FROM USER", &[])
        .unwrap_err();
    assert!(matches!(err, Error::Mapping { .. }));
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "keep");
    assert_eq!(users[0].age, 9);
    Ok(())
}

#[test]
fn test_unsupported_column_type_fails_the_query() -> Result<()> {
    let db = SqliteDb::open(":memory:")?;
    db.exec_batch("CREATE TABLE blobs (data BLOB); INSERT INTO blobs VALUES (x'01');")?;

    let err = db.query::<User>("SELECT * FROM blobs", &[]).unwrap_err();
    match err {
        Error::Mapping {
            statement,
            source: MapError::UnsupportedColumnType { column, type_name },
            ..
        } => {
            assert_eq!(statement, "SELECT * FROM blobs");
            assert_eq!(column, "data");
            assert_eq!(type_name, "BLOB");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[test]
fn test_null_value_fails_the_row_scan() -> Result<()> {
    let db = SqliteDb::open(":memory:")?;
    db.create_table::<User>()?;
    db.exec("INSERT INTO USER (NAME) VALUES (?)", &["nobody".into()])?;

    let err = db.query::<User>("SELECT * FROM USER", &[]).unwrap_err();
    assert!(matches!(err.map_error(), Some(MapError::RowScan { .. })));
    Ok(())
}

#[test]
fn test_drop_table_is_idempotent() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    drop_table("never_created").with_db(&db).exec()?;
    db.drop_table::<User>()?;

    db.create_table::<User>()?;
    db.drop_table::<User>()?;
    db.drop_table::<User>()?;
    assert!(db.show_tables()?.is_empty());
    Ok(())
}

#[test]
fn test_show_tables() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    user_table(&db)?;
    db.exec("CREATE TABLE Account (NAME VARCHAR(255), AGE INT(20))", &[])?;

    let tables = db.show_tables()?;
    let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["USER", "Account"]);
    assert!(tables.iter().all(|t| t.r#type == "table" && t.rootpage > 0));
    assert!(tables[0].sql.starts_with("CREATE TABLE USER"));
    Ok(())
}

#[test]
fn test_exec_error_carries_statement_and_args() -> Result<()> {
    let db = SqliteDb::open(":memory:")?;
    let err = db
        .exec("INSERT INTO missing VALUES (?)", &["x".into()])
        .unwrap_err();
    match err {
        Error::Exec { statement, args, .. } => {
            assert_eq!(statement, "INSERT INTO missing VALUES (?)");
            assert_eq!(args, vec![Value::Text("x".into())]);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = db.query::<User>("SELECT * FROM missing", &[]).unwrap_err();
    assert!(matches!(err, Error::Query { .. }));
    Ok(())
}

#[test]
fn test_open_failure_is_a_connection_error() {
    let err = SqliteDb::open("/nonexistent-dir/deeper/orm.db").unwrap_err();
    match err {
        Error::Connection { path, .. } => assert_eq!(path, "/nonexistent-dir/deeper/orm.db"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_data_survives_reopen_and_read_only_rejects_writes() -> Result<()> {
    let (db, file) = create_temp_db()?;
    user_table(&db)?;
    db.close()?;

    let path = file.path().to_str().unwrap();
    let config = SqliteConfig::new(path)
        .with_read_only(true)
        .with_busy_timeout_ms(100);
    let db = SqliteDb::open_with(&config)?;
    let users: Vec<User> = db.query("SELECT * FROM USER", &[])?;
    assert_eq!(users, vec![liucx(), wangli()]);

    let err = db.exec("DELETE FROM USER", &[]).unwrap_err();
    assert!(matches!(err, Error::Exec { .. }));
    Ok(())
}
