// fixtures/collections/mod.rs
//
// Collection fixtures. Each one is a struct implementing TestCollection.

pub mod registrations;

pub use registrations::RegistrationsCollection;
