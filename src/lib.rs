pub mod backtest;
pub mod export;
pub mod fake_feed;
pub mod feed;
pub mod fixtures;
pub mod fpl_fetch;
pub mod historical;
pub mod http_cache;
pub mod http_client;
pub mod persist;
pub mod recommend;
pub mod scoring;
pub mod selection;
pub mod session;
pub mod state;
