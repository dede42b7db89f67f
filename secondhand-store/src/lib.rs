pub mod app_config;
pub mod database;
pub mod offer_repo;
pub mod product_repo;
pub mod profile_repo;
pub mod redis_repo;

pub use database::DbClient;
pub use offer_repo::PgOfferRepository;
pub use product_repo::PgProductGate;
pub use profile_repo::PgProfileDirectory;
pub use redis_repo::RedisClient;
