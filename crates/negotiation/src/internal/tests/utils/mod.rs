pub mod env;
pub mod job;

#[allow(unused)]
pub fn enable_test_logging() {
    env_logger::builder().is_test(false).init()
}
