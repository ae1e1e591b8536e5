use gopeed_shell_core::init_logging;

mod app;
mod commands;

fn main() {
    let app = app::build_cli();
    let matches = app.get_matches();

    // Quiet unless asked, so a forwarding launch prints nothing
    let verbose = matches.get_flag("verbose");
    init_logging(!verbose);

    let code = match commands::run_command(&matches) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            commands::EXIT_FAILURE
        }
    };

    std::process::exit(code);
}
