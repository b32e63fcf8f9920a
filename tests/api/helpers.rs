use mailchimp_mirror::configuration::get_configuration;
use mailchimp_mirror::configuration::DatabaseSettings;
use mailchimp_mirror::startup::get_connection_pool;
use mailchimp_mirror::startup::Application;
use mailchimp_mirror::telemetry::get_subscriber;
use mailchimp_mirror::telemetry::init_subscriber;
use once_cell::sync::Lazy;
use serde_json::json;
use serde_json::Value;
use sqlx::Connection;
use sqlx::Executor;
use sqlx::PgConnection;
use sqlx::PgPool;
use uuid::Uuid;
use wiremock::MockServer;

/// Init the tracing subscriber once for the whole test binary.
///
/// To opt in to verbose logging, use the env var `TEST_LOG`:
///
/// ```sh
///      TEST_LOG=true cargo test [test_name] | bunyan
/// ```
static TRACING: Lazy<()> = Lazy::new(|| {
    // the two sinks have different types, hence the duplicated arms
    match std::env::var("TEST_LOG") {
        Ok(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::stdout);
            init_subscriber(subscriber).unwrap();
        }
        Err(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::sink);
            init_subscriber(subscriber).unwrap();
        }
    };
});

/// MailChimp id given to every list created by `seed_list`
pub const REMOTE_LIST_ID: &str = "a1b2c3d4e5";

pub struct TestApp {
    pub addr: String,
    pub pool: PgPool,
    /// Stands in for the MailChimp API
    pub mailchimp_server: MockServer,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_list(
        &self,
        body: &Value,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}/lists", self.addr))
            .json(body)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn get_list(
        &self,
        list_id: &str,
    ) -> reqwest::Response {
        self.api_client
            .get(format!("{}/lists/{list_id}", self.addr))
            .send()
            .await
            .expect("execute request")
    }

    pub async fn patch_list(
        &self,
        list_id: &str,
        body: &Value,
    ) -> reqwest::Response {
        self.api_client
            .patch(format!("{}/lists/{list_id}", self.addr))
            .json(body)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn delete_list(
        &self,
        list_id: &str,
    ) -> reqwest::Response {
        self.api_client
            .delete(format!("{}/lists/{list_id}", self.addr))
            .send()
            .await
            .expect("execute request")
    }

    pub async fn post_member(
        &self,
        list_id: &str,
        body: &Value,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}/lists/{list_id}/members", self.addr))
            .json(body)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn get_member(
        &self,
        list_id: &str,
        member_id: &str,
    ) -> reqwest::Response {
        self.api_client
            .get(format!("{}/lists/{list_id}/members/{member_id}", self.addr))
            .send()
            .await
            .expect("execute request")
    }

    pub async fn patch_member(
        &self,
        list_id: &str,
        member_id: &str,
        body: &Value,
    ) -> reqwest::Response {
        self.api_client
            .patch(format!("{}/lists/{list_id}/members/{member_id}", self.addr))
            .json(body)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn delete_member(
        &self,
        list_id: &str,
        member_id: &str,
    ) -> reqwest::Response {
        self.api_client
            .delete(format!("{}/lists/{list_id}/members/{member_id}", self.addr))
            .send()
            .await
            .expect("execute request")
    }

    /// Write a list straight into the db (bypassing MailChimp), with
    /// `REMOTE_LIST_ID` as its MailChimp id. Returns the local id.
    pub async fn seed_list(&self) -> Uuid {
        let list_id = Uuid::new_v4();
        let body = list_body();
        sqlx::query(
            r#"
            INSERT INTO mail_chimp_lists (
                list_id, mail_chimp_id, name, permission_reminder, email_type_option,
                contact, campaign_defaults, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, now(), now())
            "#,
        )
        .bind(list_id)
        .bind(REMOTE_LIST_ID)
        .bind(body["name"].as_str())
        .bind(body["permission_reminder"].as_str())
        .bind(false)
        .bind(&body["contact"])
        .bind(&body["campaign_defaults"])
        .execute(&self.pool)
        .await
        .unwrap();
        list_id
    }

    /// Make every later INSERT/UPDATE of a member row fail. Existing rows are
    /// left alone (`NOT VALID`).
    pub async fn break_member_writes(&self) {
        self.pool
            .execute(
                "ALTER TABLE mail_chimp_list_members \
                 ADD CONSTRAINT reject_writes CHECK (false) NOT VALID",
            )
            .await
            .unwrap();
    }

    /// Make every later DELETE of a member row fail.
    pub async fn break_member_deletes(&self) {
        self.pool
            .execute(
                r#"
                CREATE FUNCTION reject_delete() RETURNS trigger AS $$
                BEGIN
                    RAISE EXCEPTION 'deletes are disabled';
                END;
                $$ LANGUAGE plpgsql
                "#,
            )
            .await
            .unwrap();
        self.pool
            .execute(
                "CREATE TRIGGER reject_delete BEFORE DELETE ON mail_chimp_list_members \
                 FOR EACH ROW EXECUTE FUNCTION reject_delete()",
            )
            .await
            .unwrap();
    }

    pub async fn member_count(&self) -> i64 {
        sqlx::query_scalar("SELECT count(*) FROM mail_chimp_list_members")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn list_count(&self) -> i64 {
        sqlx::query_scalar("SELECT count(*) FROM mail_chimp_lists")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

/// A list submission with every required field set
pub fn list_body() -> Value {
    json!({
        "name": "Newsletter",
        "contact": {
            "company": "Acme",
            "address1": "1 Main St",
            "city": "Sydney",
            "state": "NSW",
            "zip": "2000",
            "country": "AU",
        },
        "permission_reminder": "You signed up on our website",
        "campaign_defaults": {
            "from_name": "Acme",
            "from_email": "news@acme.com",
            "subject": "News",
            "language": "en",
        },
        "email_type_option": false,
    })
}

/// A member submission with only the required fields set
pub fn member_body() -> Value {
    json!({
        "email_address": "john@example.com",
        "status": "subscribed",
    })
}

/// Create a db with a randomised name and run all migrations on it, so that
/// every test gets its own empty tables.
async fn configure_database(cfg: &DatabaseSettings) -> PgPool {
    let mut conn = PgConnection::connect_with(&cfg.connection_without_db())
        .await
        .expect("postgres must be running; run scripts/init_db.sh");

    conn.execute(format!(r#"CREATE DATABASE "{}";"#, cfg.database_name).as_str())
        .await
        .unwrap();

    let pool = PgPool::connect_with(cfg.connection()).await.unwrap();
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("failed to migrate");
    pool
}

/// Spawn the server on a random port, against a fresh db and a mock MailChimp
/// server.
pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let mailchimp_server = MockServer::start().await;

    let cfg = {
        let mut rand_cfg = get_configuration().unwrap();
        rand_cfg.database.database_name = Uuid::new_v4().to_string();
        // port 0: the OS picks a free port
        rand_cfg.application.port = 0;
        rand_cfg.mailchimp.base_url = mailchimp_server.uri();
        rand_cfg
    };

    configure_database(&cfg.database).await;

    let app = Application::build(cfg.clone()).await.unwrap();
    let addr = format!("http://localhost:{}", app.get_port());

    let pool = get_connection_pool(&cfg.database);
    tokio::spawn(app.run_until_stopped());

    TestApp {
        addr,
        pool,
        mailchimp_server,
        api_client: reqwest::Client::new(),
    }
}
