//! learnhub: e-learning platform backend with Hexagonal Architecture.
//!
//! Courses, enrollments and progress, assignments, announcements, live meetings,
//! notifications, book sales and Paymee/Flouci payments behind a JSON API.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
