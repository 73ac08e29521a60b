//! End-to-end runs of the question pipeline with a scripted model.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use cognidb::services::database::drivers::sqlite::SqliteDriver;
use cognidb::services::database::{
    BackendType, ConnectionConfig, ConnectionParams, DatabaseDriver, Query, QueryResult, Row,
    Value,
};
use cognidb::services::generator::{CompletionRequest, TextGenerator};
use cognidb::{CogniDb, CogniDbConfig, CogniError, ConfigOverrides, ErrorKind};

struct ScriptedModel {
    replies: Mutex<VecDeque<cognidb::Result<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    fn replying(replies: Vec<cognidb::Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn with(reply: &str) -> Arc<Self> {
        Self::replying(vec![Ok(reply.to_string())])
    }
}

#[async_trait]
impl TextGenerator for ScriptedModel {
    async fn complete(&self, request: &CompletionRequest) -> cognidb::Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CogniError::Generation("model out of replies".to_string())))
    }
}

async fn users_database(model: Arc<ScriptedModel>) -> CogniDb {
    let mut driver = SqliteDriver::new(ConnectionConfig::new(
        "pipeline".to_string(),
        BackendType::Sqlite,
        ConnectionParams::in_memory(),
    ));
    driver.connect().await.unwrap();
    driver
        .execute_query(&Query::Sql(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL); \
             INSERT INTO users (id, name) VALUES (1, 'ada'); \
             INSERT INTO users (id, name) VALUES (2, 'linus');"
                .to_string(),
        ))
        .await
        .unwrap();

    CogniDb::with_driver(Box::new(driver), model).await.unwrap()
}

#[test]
fn test_show_me_all_users() {
    smol::block_on(async {
        let model = ScriptedModel::with("SELECT * FROM users");
        let db = users_database(model.clone()).await;

        let envelope = db.query("show me all users").await;

        assert!(envelope.success, "{:?}", envelope.error);
        assert_eq!(envelope.sql_query.as_deref(), Some("SELECT * FROM users;"));
        assert_eq!(
            envelope.results,
            Some(QueryResult::Rows(vec![
                Row::from_values(vec![Value::Int64(1), Value::Text("ada".to_string())]),
                Row::from_values(vec![Value::Int64(2), Value::Text("linus".to_string())]),
            ]))
        );

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt.contains(r#"{"users":["id","name"]}"#));
        assert!(requests[0].prompt.contains("show me all users"));
        assert_eq!(requests[0].max_tokens, 1500);
    });
}

#[test]
fn test_multi_statement_answer_is_nested() {
    smol::block_on(async {
        let db = users_database(ScriptedModel::with(
            "SELECT COUNT(*) FROM users; SELECT MAX(id) FROM users;",
        ))
        .await;

        let outcome = db.run("how many users and the highest id").await.unwrap();
        assert_eq!(
            outcome.results,
            QueryResult::RowSets(vec![
                vec![Row::from_values(vec![Value::Int64(2)])],
                vec![Row::from_values(vec![Value::Int64(2)])],
            ])
        );
    });
}

#[test]
fn test_chatty_completion_falls_back_to_listing_tables() {
    smol::block_on(async {
        let db = users_database(ScriptedModel::with("Here you go: SELECT * FROM users")).await;

        let outcome = db.run("list everything").await.unwrap();
        assert!(outcome.fell_back);
        assert_eq!(
            outcome.query_text,
            "SELECT name FROM sqlite_master WHERE type = 'table';"
        );
        assert_eq!(
            outcome.results,
            QueryResult::Rows(vec![Row::from_values(vec![Value::Text(
                "users".to_string()
            )])])
        );
    });
}

#[test]
fn test_failures_keep_their_kind_until_the_envelope() {
    smol::block_on(async {
        let db = users_database(ScriptedModel::replying(vec![
            Err(CogniError::Generation("rate limited".to_string())),
            Ok("SELECT * FROM users WHERE;".to_string()),
            Ok("DELETE FROM accounts;".to_string()),
        ]))
        .await;

        let generation = db.run("a").await.unwrap_err();
        assert_eq!(generation.kind(), ErrorKind::Generation);

        let validation = db.run("b").await.unwrap_err();
        assert_eq!(validation.kind(), ErrorKind::Validation);

        let envelope = db.query("c").await;
        assert!(!envelope.success);
        assert_eq!(envelope.error_kind, Some(ErrorKind::QueryExecution));
        assert!(envelope.error.unwrap().contains("DELETE FROM accounts"));
    });
}

#[test]
fn test_writes_commit_through_the_pipeline() {
    smol::block_on(async {
        let db = users_database(ScriptedModel::replying(vec![
            Ok("INSERT INTO users (id, name) VALUES (3, 'grace')".to_string()),
            Ok("SELECT name FROM users WHERE id = 3;".to_string()),
        ]))
        .await;

        let inserted = db.query("add grace").await;
        assert!(inserted.success);
        assert_eq!(
            serde_json::to_value(&inserted).unwrap(),
            json!({
                "success": true,
                "sql_query": "INSERT INTO users (id, name) VALUES (3, 'grace');",
                "results": [],
            })
        );

        let read = db.run("who is user 3").await.unwrap();
        assert_eq!(
            read.results,
            QueryResult::Rows(vec![Row::from_values(vec![Value::Text(
                "grace".to_string()
            )])])
        );
    });
}

#[test]
fn test_missing_credentials_fail_before_connecting() {
    let env: HashMap<&str, &str> = HashMap::from([("DB_TYPE", "postgres"), ("HOST", "db.invalid")]);
    let err = CogniDbConfig::resolve(ConfigOverrides::default(), |var| {
        env.get(var).map(|v| v.to_string())
    })
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    for var in ["DATABASE", "USER", "PASSWORD", "OPENAI_API_KEY"] {
        assert!(err.to_string().contains(var), "{err}");
    }
}

#[test]
fn test_connect_reports_unreachable_server() {
    smol::block_on(async {
        let overrides = ConfigOverrides {
            backend: Some("postgres".to_string()),
            host: Some("127.0.0.1".to_string()),
            port: Some(1),
            database: Some("shop".to_string()),
            user: Some("app".to_string()),
            password: Some("secret".to_string()),
            api_key: Some("sk-test".to_string()),
            ssl_mode: Some("disable".to_string()),
            ..ConfigOverrides::default()
        };
        let config = CogniDbConfig::resolve(overrides, |_| None).unwrap();

        let err = CogniDb::connect(&config).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
    });
}

#[cfg(feature = "rocksdb")]
#[test]
fn test_key_value_backend_runs_operation_descriptors() {
    use cognidb::services::database::drivers::rocksdb::RocksDriver;
    use cognidb::services::database::WriteSummary;

    smol::block_on(async {
        let dir = tempfile::TempDir::new().unwrap();
        let mut driver = RocksDriver::new(ConnectionConfig::new(
            "kv".to_string(),
            BackendType::RocksDb,
            ConnectionParams::file(dir.path().join("kv"), false),
        ));
        driver.connect().await.unwrap();

        let model = ScriptedModel::replying(vec![
            Ok(r#"{"table": "users", "operation": "put_item", "key": "u1", "item": {"name": "ada"}}"#
                .to_string()),
            Ok("```json\n{\"table\": \"users\", \"operation\": \"get_item\", \"key\": \"u1\"}\n```"
                .to_string()),
            Ok(r#"{"table": "users", "operation": "truncate"}"#.to_string()),
        ]);
        let db = CogniDb::with_driver(Box::new(driver), model).await.unwrap();

        let written = db.run("remember ada as u1").await.unwrap();
        assert_eq!(written.results, QueryResult::Written(WriteSummary::inserted("u1")));

        let read = db.run("who is u1").await.unwrap();
        assert_eq!(read.results, QueryResult::Document(Some(json!({"name": "ada"}))));

        let err = db.run("wipe users").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    });
}
