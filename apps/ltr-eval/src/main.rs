use clap::Parser;

use ltr_eval::Args;

fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	ltr_eval::run(args)
}
