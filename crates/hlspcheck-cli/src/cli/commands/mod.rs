use super::args::*;

pub mod check;
pub mod dictionaries;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Check(args) => check::cmd_check(args),
        Command::Dictionaries(args) => dictionaries::run(args),
    }
}
