use gift_draw::cli::run_cli;
use gift_draw::Roster;

fn main() {
    std::process::exit(run_cli(Roster::adult));
}
