use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let topic = config::resolve_topic(global)?;
    output::print_output(topic.destination(), global.quiet);
    Ok(())
}
