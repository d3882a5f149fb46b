use async_trait::async_trait;

#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &str) -> anyhow::Result<String>;

    async fn verify(&self, password: &str, hashed: &str) -> anyhow::Result<bool>;
}

pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

#[async_trait]
impl PasswordHasher for BcryptHasher {
    async fn hash(&self, password: &str) -> anyhow::Result<String> {
        let password = password.to_owned();
        let cost = self.cost;

        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;

        Ok(hashed)
    }

    async fn verify(&self, password: &str, hashed: &str) -> anyhow::Result<bool> {
        let password = password.to_owned();
        let hashed = hashed.to_owned();

        let ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hashed)).await??;

        Ok(ok)
    }
}
