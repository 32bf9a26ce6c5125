pub mod join_elision;
