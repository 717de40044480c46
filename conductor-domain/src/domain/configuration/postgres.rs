use envconfig::Envconfig;
use std::fmt::{Display, Formatter};

#[derive(Envconfig, Clone)]
pub struct PostgresConfig {
    #[envconfig(from = "POSTGRES_USERNAME", default = "postgres")]
    pub postgres_username: String,
    #[envconfig(from = "POSTGRES_PASSWORD", default = "postgres")]
    pub postgres_password: String,
    #[envconfig(from = "POSTGRES_HOST", default = "localhost")]
    pub postgres_host: String,
    #[envconfig(from = "POSTGRES_PORT", default = "5432")]
    pub postgres_port: u16,
    #[envconfig(from = "POSTGRES_NAME", default = "conductor")]
    pub postgres_name: String,
    #[envconfig(from = "POSTGRES_SSL", default = "false")]
    pub postgres_ssl: bool,
    #[envconfig(from = "POSTGRES_POOL_SIZE", default = "5")]
    pub postgres_pool_size: u32,
    #[envconfig(from = "POSTGRES_TIMEOUT", default = "5000")]
    pub postgres_timeout: u64,
}

impl Display for PostgresConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "POSTGRES_USERNAME: {}", self.postgres_username)?;
        writeln!(f, "POSTGRES_PASSWORD: ****")?;
        writeln!(f, "POSTGRES_HOST: {}", self.postgres_host)?;
        writeln!(f, "POSTGRES_PORT: {}", self.postgres_port)?;
        writeln!(f, "POSTGRES_NAME: {}", self.postgres_name)?;
        writeln!(f, "POSTGRES_SSL: {}", self.postgres_ssl)?;
        writeln!(f, "POSTGRES_POOL_SIZE: {}", self.postgres_pool_size)?;
        writeln!(f, "POSTGRES_TIMEOUT: {}", self.postgres_timeout)
    }
}
