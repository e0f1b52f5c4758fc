pub mod jwks_service;
pub mod key_management_service;
pub mod key_store;
pub mod token_service;
