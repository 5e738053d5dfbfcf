//! `SeaORM` entities for the bankwire schema.

pub mod accounts;
pub mod transfer_requests;
pub mod transfers;
