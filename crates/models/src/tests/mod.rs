/// Entity round-trips against a live database
pub mod entity_tests;
