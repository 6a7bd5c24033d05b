//! Entity <-> model mappers

mod account;
