//! Payment gateway adapters. Implement PaymentGatewayPort for Paymee and Flouci.

pub mod flouci;
pub mod paymee;

pub use flouci::FlouciAdapter;
pub use paymee::{PaymeeAdapter, PaymeeLinks};
