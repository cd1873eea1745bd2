pub mod bigpara;
pub mod funds;
pub mod html;
pub mod scraper;
pub mod tcmb;
pub mod tradingview;
pub mod twilio;
