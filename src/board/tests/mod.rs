//! Heavier board test suites: perft, make/unmake round trips, draw rules
//! and randomized property tests.

mod draw;
mod make_unmake;
mod proptest;
