pub mod franchises;
pub mod investments;
pub mod properties;
pub mod wallets;
