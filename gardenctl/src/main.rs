mod cli;
mod config;
mod ext;
mod garden;
mod kubeconfig;
mod session;
mod target;
mod ui;

use self::cli::Cli;

fn main() {
    match Cli::default().run() {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}
