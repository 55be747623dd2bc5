mod cleanup_tests;
mod rotation_tests;
