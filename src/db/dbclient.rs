use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub struct DBClient {
    pool: PgPool,
}

impl DBClient {
    pub async fn new(db_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub fn conn(&self) -> &PgPool {
        &self.pool
    }
}
