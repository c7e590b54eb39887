//! Server startup utilities.

use tracing::info;

/// Prints the startup banner.
pub fn print_banner() {
    info!(
        r#"
    ____  _            ___              ____  _            __
   / __ \(_)___  ___  / (_)___  ___     / __ \(_)___  ___  / /
  / /_/ / / __ \/ _ \/ / / __ \/ _ \   / /_/ / / __ \/ _ \/ /
 / ____/ / /_/ /  __/ / / / / /  __/  / ____/ / /_/ /  __/ /
/_/   /_/ .___/\___/_/_/_/ /_/\___/  /_/   /_/ .___/\___/_/
       /_/                                  /_/

                     Rust Edition
    "#
    );
}

/// Prints server startup information.
pub fn print_startup_info(host: &str, port: u16) {
    let separator = "=".repeat(60);
    info!("{}", separator);
    info!("REST API:  http://{}:{}", host, port);
    info!("Health:    http://{}:{}/health", host, port);
    info!("API Docs:  http://{}:{}/swagger-ui", host, port);
    info!("{}", separator);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_banner_does_not_panic() {
        let _ = tracing_subscriber::fmt::try_init();
        print_banner();
    }

    #[test]
    fn test_print_startup_info_does_not_panic() {
        let _ = tracing_subscriber::fmt::try_init();
        print_startup_info("0.0.0.0", 8080);
    }

    #[test]
    fn test_print_startup_info_custom_host_and_port() {
        let _ = tracing_subscriber::fmt::try_init();
        print_startup_info("127.0.0.1", 3000);
    }
}
