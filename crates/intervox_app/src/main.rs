mod cli;
mod effects;
mod logging;
mod persistence;
mod runner;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match cli::parse(&args) {
        Ok(invocation) => invocation,
        Err(message) => {
            eprintln!("{message}");
            eprintln!();
            eprintln!("{}", cli::USAGE);
            std::process::exit(2);
        }
    };

    logging::initialize(invocation.log_destination);

    let exit_code = match invocation.command {
        cli::Command::History => runner::print_history(),
        command => runner::run(command, &invocation.base_url),
    };
    std::process::exit(exit_code);
}
