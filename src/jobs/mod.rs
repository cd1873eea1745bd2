//! Background jobs run by the job scheduler service.
//!
//! - `scrape_markets_job` - scrapes every market, refreshes exchange rates and
//!   reprices stored assets
//! - `daily_history_job` - records each asset's closing price for the day
//!
//! Both jobs are idempotent and can be re-run safely. Runs are tracked in
//! `job_runs`.

pub mod daily_history_job;
pub mod scrape_markets_job;
