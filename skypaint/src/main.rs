#![warn(clippy::pedantic)]

mod cli;
pub mod settings;
pub mod thumbnail;

#[cfg(feature = "dhat_heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use anyhow::Result as AnyResult;

fn main() -> AnyResult<()> {
    let has_term = std::io::IsTerminal::is_terminal(&std::io::stdin());
    // Log to a terminal, if available. Else, log to "log.out" in the working directory.
    if has_term {
        env_logger::builder()
            .filter_level(log::LevelFilter::Info)
            .parse_default_env()
            .init();
    } else {
        let _ = simple_logging::log_to_file("log.out", log::LevelFilter::Debug);
    }
    #[cfg(feature = "dhat_heap")]
    let _profiler = {
        log::trace!("Installed dhat");
        dhat::Profiler::new_heap()
    };

    let args = <cli::Cli as clap::Parser>::parse();
    let (settings, _) = settings::Settings::load();
    // Leave a filled-in file for the user to edit, but never clobber a broken one.
    if settings::Settings::path().is_some_and(|path| !path.exists()) {
        if let Err(e) = settings.save() {
            log::warn!("Failed to save default settings:\n{e:?}");
        }
    }

    cli::run(args, &settings)
}
