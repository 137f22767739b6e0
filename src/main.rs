use std::env;

const DEFAULT_PORT: u16 = 8080;

#[tokio::main]
async fn main() {
    let mut args = env::args().skip(1);
    if args.next().as_deref() != Some("serve") {
        eprintln!("Usage: pension serve [port]");
        std::process::exit(2);
    }

    let port = match args.next() {
        None => DEFAULT_PORT,
        Some(raw) => match raw.parse::<u16>() {
            Ok(port) => port,
            Err(_) => {
                eprintln!("Invalid port '{raw}'; expected a number between 0 and 65535");
                std::process::exit(2);
            }
        },
    };

    if let Err(e) = pension::api::run_http_server(port).await {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}
