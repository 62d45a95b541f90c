pub fn init() {
    let log_cnf = match common::logging::generate_config(&crate::CONFIG.logging, "miqat-server") {
        Ok(c) => c,
        Err(e) => panic!("building logging config failed. {e}"),
    };
    if let Err(e) = log4rs::init_config(log_cnf) {
        panic!("initializing logger failed. {e}");
    }
    log_panics::init();
}
