pub mod background_jobs;
pub mod dispute_service;
pub mod error;
pub mod escrow_service;
pub mod market_service;
pub mod notification_service;
pub mod payment_provider;
