//! Macros for error/warning printing before the logger is running

/// Expand to an error message
#[macro_export]
macro_rules! pmdock_error {
    ($($err:tt)*) => ({
        use colored::Colorize;
        eprintln!("{}: {}", "[pmdock error]".red().bold(), format!($($err)*));
    })
}

/// Expand to a fatal message and exit with a failure status
#[macro_export]
macro_rules! pmdock_fatal {
    ($($err:tt)*) => ({
        use colored::Colorize;
        eprintln!("{}: {}", "[pmdock fatal]".yellow().bold(), format!($($err)*));
        std::process::exit(1);
    })
}
