use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = riposte_api::Args::parse();
	riposte_api::run(args).await
}
