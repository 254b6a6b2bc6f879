pub mod error;
pub mod franchise_service;
pub mod investment_service;
pub mod penalty_engine;
pub mod property_service;
pub mod property_stats;
pub mod rpc_connection;
