mod common;
mod mongo_store_tests;
mod paste_store_tests;
