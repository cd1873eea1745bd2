pub mod account_service;
pub mod asset_service;
pub mod auth_service;
pub mod cost_basis;
pub mod currency_service;
pub mod history_service;
pub mod investment_service;
pub mod job_scheduler_service;
pub mod rate_service;
pub mod run_guard;
pub mod scraping_service;
pub mod transaction_service;
pub mod ttl_cache;
pub mod valuation_service;
