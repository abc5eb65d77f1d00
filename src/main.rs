use std::io;
use std::process;

use luna_builder::executor::RealCommandExecutor;
use luna_builder::{BuildOptions, cli, init_logging, privilege, run};
use tracing::error;

fn main() {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            let code = cli::parse_error_exit_code(&e);
            let _ = e.print();
            process::exit(code);
        }
    };

    if let Err(e) = init_logging(args.log_level, args.verbose) {
        eprintln!("{:#}", e);
        process::exit(1);
    }

    let opts = BuildOptions {
        program: std::env::args()
            .next()
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string()),
        euid: privilege::current_euid(),
        check_deps: args.check_deps,
    };
    let executor = RealCommandExecutor::new(args.verbose);

    if let Err(e) = run(&args, &opts, &executor, io::stdout().lock()) {
        error!("{:#}", e);
        process::exit(1);
    }
}
