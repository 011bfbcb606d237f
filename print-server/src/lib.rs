//! Print Server - kitchen ticket printing for the ordering platform
//!
//! Orders replicated from the ordering platform are split into kitchen
//! stations, rendered as ESC/POS tickets and sent to every active
//! auto-print kitchen printer. Each send is recorded as a print job;
//! failed jobs are retried in the background up to a fixed ceiling.
//!
//! # Module layout
//!
//! ```text
//! print-server/src/
//! ├── core/          # config, state, server, background tasks
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # embedded redb storage
//! ├── printing/      # stations, renderer, dispatcher, retry, worker
//! └── utils/         # logger, validation
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod printing;
pub mod utils;

pub use core::{Config, Server, ServerState};
pub use db::Storage;
pub use printing::{PrintService, RetryCoordinator};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env`, create the working directory, start logging
pub fn setup_environment() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;
    init_logger_with_file(
        &config.log_level,
        config.is_production(),
        config.log_dir.as_deref(),
    )?;
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    ____       _       __
   / __ \_____(_)___  / /_
  / /_/ / ___/ / __ \/ __/
 / ____/ /  / / / / / /_
/_/   /_/  /_/_/ /_/\__/   server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
