pub mod app_config;
pub mod config;
pub mod product;
pub mod product_url;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use product::{PriceInfo, ProductRecord, RatingInfo, ReviewSummary, SellerInfo};
pub use product_url::{ProductUrl, StorefrontRules, UrlError};
