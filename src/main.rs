use std::sync::Arc;

mod console;

use daynote::application::App;
use daynote::config::DaynoteConfig;
use daynote::gateway::{Gateway, HttpGateway, MemoryGateway};
use daynote::runtime::Runtime;

enum LaunchMode {
    Console,
    PrintTables,
    TestIntegration,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up logging to the systemd user journal (`journalctl --user -t daynote -f`).
    // Wrapper filters: daynote crate at info/debug (per config or --debug), everything else at warn.
    {
        struct FilteredJournal {
            inner: systemd_journal_logger::JournalLog,
        }

        impl log::Log for FilteredJournal {
            fn enabled(&self, metadata: &log::Metadata) -> bool {
                if metadata.target().starts_with("daynote") {
                    let max = if daynote::debug_logging() { log::LevelFilter::Debug } else { log::LevelFilter::Info };
                    metadata.level() <= max
                } else {
                    metadata.level() <= log::LevelFilter::Warn
                }
            }
            fn log(&self, record: &log::Record) {
                if self.enabled(record.metadata()) {
                    self.inner.log(record);
                }
            }
            fn flush(&self) {
                self.inner.flush();
            }
        }

        match systemd_journal_logger::JournalLog::new() {
            Ok(journal) => {
                let journal = journal.with_syslog_identifier("daynote".to_string());
                log::set_boxed_logger(Box::new(FilteredJournal { inner: journal }))?;
                // Global max must be Debug so daynote debug logs can pass through when toggled
                log::set_max_level(log::LevelFilter::Debug);
            }
            Err(e) => eprintln!("journal unavailable, logging disabled: {}", e),
        }
    }

    // After the logger, so a bad config file is reported.
    let mut config = DaynoteConfig::load();

    // Parse CLI flags
    let launch_mode = {
        let args: Vec<String> = std::env::args().collect();
        if args.iter().any(|a| a == "--offline") {
            config.offline = true;
        }
        if args.iter().any(|a| a == "--debug") {
            config.debug_logging = true;
        }
        if args.iter().any(|a| a == "--print-tables") {
            LaunchMode::PrintTables
        } else if args.iter().any(|a| a == "--test-integration") {
            LaunchMode::TestIntegration
        } else {
            LaunchMode::Console
        }
    };
    daynote::set_debug_logging(config.debug_logging);

    let gateway: Arc<dyn Gateway> = if config.offline {
        log::info!("Running offline against the in-memory backend");
        Arc::new(MemoryGateway::for_local_today())
    } else {
        let http = HttpGateway::new(&config.backend_url)?;
        log::info!("Using backend at {}", http.base_url());
        Arc::new(http)
    };

    match launch_mode {
        LaunchMode::PrintTables => {
            gateway.init().await?;
            gateway.print_all_tables().await?;
            println!("tables written to the backend log");
        }
        LaunchMode::TestIntegration => {
            gateway.init().await?;
            println!("{}", gateway.test_integration().await?);
        }
        LaunchMode::Console => {
            let (app, init) = App::new(gateway);
            console::run(Runtime::new(app, init)).await?;
        }
    }

    Ok(())
}
