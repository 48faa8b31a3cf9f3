use clap::Parser;

use librarian_engine::config::CliArgs;
use librarian_engine::server::LibrarianServer;
use librarian_engine::transport::NdjsonTransport;

fn main() {
	let args = CliArgs::parse();

	tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
		)
		.init();

	let transport = NdjsonTransport::stdout();
	let mut server = LibrarianServer::new(transport, args.similar_limit);

	if let Some(sources) = args.sources() {
		if let Err(e) = server.load_catalog(&sources) {
			tracing::error!("Failed to load catalog: {}", e);
			std::process::exit(1);
		}
	}

	tracing::info!("librarian-engine ready");

	if let Err(e) = server.run() {
		tracing::error!("Server error: {}", e);
		std::process::exit(1);
	}
}
