pub fn init_test_logging() {
    // Later calls fail once a subscriber is set
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
